//! Address capture and restoration for the order editor.
//!
//! The detail view's address label is captured into a
//! [`addrfix_store::PersistenceStore`]; when the same order is opened for
//! editing, a [`Reconciler`] state machine brings the freshly rendered
//! address control back to that label, backing off as soon as the user
//! makes a choice of their own.

pub mod capture;
pub mod driver;
pub mod error;
pub mod headless;
pub mod matcher;
pub mod navigation;
pub mod page;
pub mod patch;
pub mod reconcile;
pub mod route;
pub mod timers;

pub use capture::Capturer;
pub use driver::drive;
pub use error::EngineError;
pub use headless::{options_from_texts, HeadlessPage, SelectElement};
pub use matcher::{find_match, normalize};
pub use navigation::NavigationTracker;
pub use page::{
    AddressLabelSource, ControlLocator, ControlSignal, Notification, OptionListControl, Page,
    SelectOption,
};
pub use patch::{dispatch, PageOutcome, Patch};
pub use reconcile::{
    Directive, LoopReport, LoopState, ReconcileEvent, ReconcileSettings, Reconciler, TimerKind,
};
pub use route::Route;
