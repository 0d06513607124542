//! Capability traits the engine needs from the host page.
//!
//! The engine never walks page structure itself. The detail view only has to
//! produce a label, and the edit view only has to expose an option list.

use tokio::sync::mpsc::UnboundedReceiver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    /// Visible text.
    pub text: String,
    /// Raw value, e.g. `"string:17"`.
    pub value: String,
}

impl SelectOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

/// Notifications the engine emits after changing a control's value, so the
/// host page's own bindings see a user-like interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    Input,
    Change,
    Blur,
}

/// Signals a control delivers to its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Structural or attribute change anywhere in the control's subtree.
    Mutated,
    /// The user picked an option.
    UserChanged,
}

/// Detail-view label producer.
pub trait AddressLabelSource {
    /// Trimmed text of the order's displayed address, or `None` if it is not
    /// rendered yet.
    fn extract_address_label(&self) -> Option<String>;
}

/// Edit-view option-list control.
///
/// Methods take `&self`: implementations are handles onto a live element.
pub trait OptionListControl {
    fn options(&self) -> Vec<SelectOption>;
    fn selected_index(&self) -> Option<usize>;
    /// Raw value of the selected option; empty when nothing is selected.
    fn value(&self) -> String;
    fn set_value(&self, value: &str);
    fn dispatch(&self, notification: Notification);
    /// Attaches a mutation watcher and user-change listener. Dropping the
    /// receiver detaches both.
    fn subscribe(&self) -> UnboundedReceiver<ControlSignal>;
}

/// Finds the edit view's control by its data-binding marker.
pub trait ControlLocator {
    type Control: OptionListControl + Send + 'static;

    fn locate(&self, marker: &str) -> Option<Self::Control>;
}

/// Everything the patch needs from a page, across both views.
pub trait Page: AddressLabelSource + ControlLocator + Clone + Send + Sync + 'static {}

impl<T> Page for T where T: AddressLabelSource + ControlLocator + Clone + Send + Sync + 'static {}

/// A non-default value is present: non-empty and different from the first
/// option's value.
#[must_use]
pub fn has_value<C: OptionListControl + ?Sized>(control: &C) -> bool {
    let value = control.value();
    if value.is_empty() {
        return false;
    }
    control
        .options()
        .first()
        .is_none_or(|first| first.value != value)
}

/// The control still shows its initial, unselected option.
#[must_use]
pub fn is_default_state<C: OptionListControl + ?Sized>(control: &C) -> bool {
    control.selected_index() == Some(0) || !has_value(control)
}
