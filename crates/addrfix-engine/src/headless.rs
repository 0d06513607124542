//! In-process page model implementing the capability traits.
//!
//! Used by the operator CLI and the tests to drive the engine without a
//! browser. Handles are cheap clones over shared state, like DOM nodes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::page::{
    AddressLabelSource, ControlLocator, ControlSignal, Notification, OptionListControl,
    SelectOption,
};

#[derive(Debug, Default)]
struct SelectState {
    options: Vec<SelectOption>,
    selected: Option<usize>,
    notifications: Vec<Notification>,
    value_writes: usize,
    subscribers: Vec<UnboundedSender<ControlSignal>>,
}

impl SelectState {
    fn broadcast(&mut self, signal: ControlSignal) {
        self.subscribers.retain(|tx| tx.send(signal).is_ok());
    }
}

/// A `<select>`-like element.
#[derive(Debug, Clone, Default)]
pub struct SelectElement {
    inner: Arc<Mutex<SelectState>>,
}

impl SelectElement {
    /// An element listing `options` with the first one selected.
    #[must_use]
    pub fn new(options: Vec<SelectOption>) -> Self {
        let element = Self::default();
        {
            let mut state = element.state();
            state.selected = if options.is_empty() { None } else { Some(0) };
            state.options = options;
        }
        element
    }

    /// Convenience constructor: a blank default option followed by one
    /// option per text, valued `string:<position>`.
    #[must_use]
    pub fn with_texts<S: AsRef<str>>(texts: &[S]) -> Self {
        Self::new(options_from_texts(texts))
    }

    fn state(&self) -> MutexGuard<'_, SelectState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Host re-render: replaces the option list and resets the selection.
    pub fn set_options(&self, options: Vec<SelectOption>) {
        let mut state = self.state();
        state.selected = if options.is_empty() { None } else { Some(0) };
        state.options = options;
        state.broadcast(ControlSignal::Mutated);
    }

    /// Host-side selection that is not a user action (e.g. the page
    /// restoring its own model). Emits nothing.
    pub fn preselect(&self, index: usize) {
        let mut state = self.state();
        if index < state.options.len() {
            state.selected = Some(index);
        }
    }

    /// A user picking option `index`.
    pub fn user_select(&self, index: usize) {
        let mut state = self.state();
        if index < state.options.len() {
            state.selected = Some(index);
            state.broadcast(ControlSignal::UserChanged);
        }
    }

    /// An attribute change on the element, e.g. a class toggled by the host.
    pub fn touch(&self) {
        self.state().broadcast(ControlSignal::Mutated);
    }

    /// Notifications dispatched on this element, oldest first.
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().notifications.clone()
    }

    /// Number of programmatic value assignments.
    #[must_use]
    pub fn value_writes(&self) -> usize {
        self.state().value_writes
    }

    /// Subscribers whose receiver is still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.state()
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    #[must_use]
    pub fn selected_text(&self) -> Option<String> {
        let state = self.state();
        state
            .selected
            .and_then(|i| state.options.get(i))
            .map(|option| option.text.clone())
    }
}

impl OptionListControl for SelectElement {
    fn options(&self) -> Vec<SelectOption> {
        self.state().options.clone()
    }

    fn selected_index(&self) -> Option<usize> {
        self.state().selected
    }

    fn value(&self) -> String {
        let state = self.state();
        state
            .selected
            .and_then(|i| state.options.get(i))
            .map(|option| option.value.clone())
            .unwrap_or_default()
    }

    fn set_value(&self, value: &str) {
        let mut state = self.state();
        state.value_writes += 1;
        state.selected = state.options.iter().position(|o| o.value == value);
    }

    fn dispatch(&self, notification: Notification) {
        self.state().notifications.push(notification);
    }

    fn subscribe(&self) -> UnboundedReceiver<ControlSignal> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state().subscribers.push(tx);
        rx
    }
}

/// Builds `[blank, texts...]` with values `string:<position>`.
#[must_use]
pub fn options_from_texts<S: AsRef<str>>(texts: &[S]) -> Vec<SelectOption> {
    std::iter::once(SelectOption::new("", ""))
        .chain(
            texts
                .iter()
                .enumerate()
                .map(|(i, text)| SelectOption::new(text.as_ref(), format!("string:{}", i + 1))),
        )
        .collect()
}

#[derive(Debug, Default)]
struct PageState {
    address_label: Option<String>,
    controls: HashMap<String, SelectElement>,
    label_reads: usize,
    lookups: usize,
}

/// A page holding an optional detail-view address label and any number of
/// controls keyed by data-binding marker.
#[derive(Debug, Clone, Default)]
pub struct HeadlessPage {
    inner: Arc<Mutex<PageState>>,
}

impl HeadlessPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, PageState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_address_label(&self, label: Option<&str>) {
        self.state().address_label = label.map(str::to_string);
    }

    pub fn mount(&self, marker: &str, element: SelectElement) {
        self.state().controls.insert(marker.to_string(), element);
    }

    pub fn unmount(&self, marker: &str) {
        self.state().controls.remove(marker);
    }

    #[must_use]
    pub fn element(&self, marker: &str) -> Option<SelectElement> {
        self.state().controls.get(marker).cloned()
    }

    /// How many times the engine read the address label.
    #[must_use]
    pub fn label_reads(&self) -> usize {
        self.state().label_reads
    }

    /// How many times the engine looked for a control.
    #[must_use]
    pub fn lookups(&self) -> usize {
        self.state().lookups
    }
}

impl AddressLabelSource for HeadlessPage {
    fn extract_address_label(&self) -> Option<String> {
        let mut state = self.state();
        state.label_reads += 1;
        state
            .address_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
    }
}

impl ControlLocator for HeadlessPage {
    type Control = SelectElement;

    fn locate(&self, marker: &str) -> Option<SelectElement> {
        let mut state = self.state();
        state.lookups += 1;
        state.controls.get(marker).cloned()
    }
}
