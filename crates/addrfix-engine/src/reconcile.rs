//! The reconciliation state machine.
//!
//! One [`Reconciler`] exists per edit-page view that has a stored record. It
//! is driven purely by [`ReconcileEvent`]s and answers with [`Directive`]s
//! telling its host which timers to arm or cancel and whether to keep a
//! subscription on the control. The host (see [`crate::driver`]) owns the
//! clock; the machine owns the decisions.
//!
//! ```text
//! Searching ──found, has value──▶ Skipped
//!     │  └────never found───────▶ ControlMissing
//!     ▼
//!   Ready ──▶ Observing ──match──────────▶ Applied
//!                 ├────user change──────▶ UserOverridden
//!                 └────budget/timeout───▶ Expired
//! ```
//!
//! Every transition into a terminal state cancels all armed timers and drops
//! the control subscription, so a finished machine is always quiescent.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use addrfix_core::{AppConfig, OrderId, StoreRecord, Timings};
use addrfix_store::PersistenceStore;
use chrono::Utc;

use crate::matcher::find_match;
use crate::page::{
    has_value, is_default_state, ControlLocator, ControlSignal, Notification, OptionListControl,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerKind {
    /// Scheduled control lookup while searching.
    Discovery,
    /// Debounced apply attempt after a mutation.
    Debounce,
    /// Periodic apply attempt.
    Retry,
    /// Hard stop for the observing phase.
    Safety,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileEvent {
    Timer(TimerKind),
    Mutation,
    UserChange,
}

impl From<ControlSignal> for ReconcileEvent {
    fn from(signal: ControlSignal) -> Self {
        match signal {
            ControlSignal::Mutated => Self::Mutation,
            ControlSignal::UserChanged => Self::UserChange,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Schedule { timer: TimerKind, after: Duration },
    Cancel(TimerKind),
    /// Subscribe to the control's signals.
    Watch,
    /// Drop the control subscription.
    Unwatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Searching,
    Ready,
    Observing,
    /// The control already held a real selection when found.
    Skipped,
    /// The control never appeared during discovery.
    ControlMissing,
    /// The stored label was applied to option `index`.
    Applied { index: usize },
    UserOverridden,
    Expired,
}

impl LoopState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Searching | Self::Ready | Self::Observing)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Searching => write!(f, "searching"),
            Self::Ready => write!(f, "ready"),
            Self::Observing => write!(f, "observing"),
            Self::Skipped => write!(f, "skipped"),
            Self::ControlMissing => write!(f, "control-missing"),
            Self::Applied { index } => write!(f, "applied(option {index})"),
            Self::UserOverridden => write!(f, "user-overridden"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// Final state of a loop plus how many retry ticks it consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub order_id: OrderId,
    pub state: LoopState,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub control_marker: String,
    /// Stripped from a raw option value to derive the store id.
    pub value_prefix: String,
    pub timings: Timings,
}

impl ReconcileSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            control_marker: config.control_marker.clone(),
            value_prefix: config.value_prefix.clone(),
            timings: config.timings.clone(),
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

pub struct Reconciler<L: ControlLocator> {
    record: StoreRecord,
    store: Arc<PersistenceStore>,
    locator: L,
    settings: ReconcileSettings,
    control: Option<L::Control>,
    state: LoopState,
    lookups: usize,
    attempts: u32,
    armed: BTreeSet<TimerKind>,
    watching: bool,
}

impl<L: ControlLocator> fmt::Debug for Reconciler<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("order_id", &self.record.order_id)
            .field("state", &self.state)
            .field("attempts", &self.attempts)
            .field("armed", &self.armed)
            .field("watching", &self.watching)
            .finish_non_exhaustive()
    }
}

impl<L: ControlLocator> Reconciler<L> {
    pub fn new(
        record: StoreRecord,
        store: Arc<PersistenceStore>,
        locator: L,
        settings: ReconcileSettings,
    ) -> Self {
        Self {
            record,
            store,
            locator,
            settings,
            control: None,
            state: LoopState::Searching,
            lookups: 0,
            attempts: 0,
            armed: BTreeSet::new(),
            watching: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn order_id(&self) -> &OrderId {
        &self.record.order_id
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// No timer armed and no subscription held.
    #[must_use]
    pub fn is_quiescent(&self) -> bool {
        self.armed.is_empty() && !self.watching
    }

    #[must_use]
    pub fn control(&self) -> Option<&L::Control> {
        self.control.as_ref()
    }

    #[must_use]
    pub fn report(&self) -> LoopReport {
        LoopReport {
            order_id: self.record.order_id.clone(),
            state: self.state,
            attempts: self.attempts,
        }
    }

    /// Runs the immediate lookup.
    pub fn start(&mut self) -> Vec<Directive> {
        let mut out = Vec::new();
        if self.state == LoopState::Searching && self.lookups == 0 {
            self.probe(&mut out);
        }
        out
    }

    pub fn handle(&mut self, event: ReconcileEvent) -> Vec<Directive> {
        let mut out = Vec::new();
        if self.is_finished() {
            return out;
        }
        if let ReconcileEvent::Timer(kind) = event {
            // The host has already consumed this deadline.
            self.armed.remove(&kind);
        }

        match (self.state, event) {
            (LoopState::Searching, ReconcileEvent::Timer(TimerKind::Discovery)) => {
                self.probe(&mut out);
            }
            (LoopState::Observing, ReconcileEvent::Timer(TimerKind::Retry)) => {
                self.tick(&mut out);
            }
            (LoopState::Observing, ReconcileEvent::Timer(TimerKind::Debounce)) => {
                if let Some(index) = self.pending_match() {
                    self.apply(index, &mut out);
                }
            }
            (LoopState::Observing, ReconcileEvent::Timer(TimerKind::Safety)) => {
                tracing::debug!(
                    order_id = %self.record.order_id,
                    attempts = self.attempts,
                    "observation timeout reached"
                );
                self.finish(LoopState::Expired, &mut out);
            }
            (LoopState::Observing, ReconcileEvent::Mutation) => {
                if self.control_is_default() {
                    self.schedule(TimerKind::Debounce, self.settings.timings.debounce, &mut out);
                }
            }
            (LoopState::Observing, ReconcileEvent::UserChange) => {
                self.user_override(&mut out);
            }
            (state, event) => {
                tracing::trace!(%state, ?event, "event ignored");
            }
        }
        out
    }

    fn probe(&mut self, out: &mut Vec<Directive>) {
        let found = self
            .locator
            .locate(&self.settings.control_marker)
            .filter(|control| !control.options().is_empty());
        let lookup = self.lookups;
        self.lookups += 1;

        if let Some(control) = found {
            self.found(control, out);
            return;
        }

        let offsets = self.settings.timings.discovery_offsets;
        match lookup {
            0 => self.schedule(TimerKind::Discovery, offsets[0], out),
            1 => self.schedule(
                TimerKind::Discovery,
                offsets[1].saturating_sub(offsets[0]),
                out,
            ),
            _ => {
                tracing::debug!(
                    order_id = %self.record.order_id,
                    marker = %self.settings.control_marker,
                    "address control never appeared"
                );
                self.finish(LoopState::ControlMissing, out);
            }
        }
    }

    fn found(&mut self, control: L::Control, out: &mut Vec<Directive>) {
        if has_value(&control) {
            tracing::info!(
                order_id = %self.record.order_id,
                "address control already has a selection; leaving it alone"
            );
            self.finish(LoopState::Skipped, out);
            return;
        }

        self.control = Some(control);
        self.state = LoopState::Ready;
        tracing::debug!(order_id = %self.record.order_id, "address control ready");

        self.state = LoopState::Observing;
        self.watching = true;
        out.push(Directive::Watch);
        self.schedule(
            TimerKind::Safety,
            self.settings.timings.observe_timeout,
            out,
        );
        self.tick(out);
    }

    fn tick(&mut self, out: &mut Vec<Directive>) {
        self.attempts += 1;
        if let Some(index) = self.pending_match() {
            self.apply(index, out);
            return;
        }
        if self.attempts >= self.settings.timings.max_attempts {
            tracing::info!(
                order_id = %self.record.order_id,
                attempts = self.attempts,
                label = %self.record.store_label,
                "no matching address option; giving up"
            );
            self.finish(LoopState::Expired, out);
        } else {
            self.schedule(TimerKind::Retry, self.settings.timings.retry_interval, out);
        }
    }

    fn control_is_default(&self) -> bool {
        self.control.as_ref().is_some_and(is_default_state)
    }

    /// The option to apply, if the control is still default and one matches.
    fn pending_match(&self) -> Option<usize> {
        let control = self.control.as_ref()?;
        if !is_default_state(control) {
            return None;
        }
        find_match(&control.options(), &self.record.store_label)
    }

    fn apply(&mut self, index: usize, out: &mut Vec<Directive>) {
        let Some(control) = self.control.as_ref() else {
            return;
        };
        let Some(option) = control.options().into_iter().nth(index) else {
            return;
        };
        control.set_value(&option.value);
        for notification in [Notification::Input, Notification::Change, Notification::Blur] {
            control.dispatch(notification);
        }
        self.store.remove(&self.record.order_id);
        tracing::info!(
            order_id = %self.record.order_id,
            label = %option.text.trim(),
            attempts = self.attempts,
            "stored address applied"
        );
        self.finish(LoopState::Applied { index }, out);
    }

    fn user_override(&mut self, out: &mut Vec<Directive>) {
        if let Some(control) = self.control.as_ref() {
            let value = control.value();
            let label = control
                .selected_index()
                .and_then(|i| control.options().into_iter().nth(i))
                .map(|option| option.text.trim().to_string())
                .unwrap_or_default();

            if value.is_empty() || label.is_empty() {
                tracing::info!(
                    order_id = %self.record.order_id,
                    "user selection has no address; automated attempts stopped"
                );
            } else {
                let store_id = value
                    .strip_prefix(self.settings.value_prefix.as_str())
                    .unwrap_or(&value);
                let record = StoreRecord::confirmed(
                    self.record.order_id.clone(),
                    store_id,
                    label,
                    Utc::now(),
                );
                self.store.set(&record);
                tracing::info!(
                    order_id = %self.record.order_id,
                    store_id = %store_id,
                    label = %record.store_label,
                    "user chose an address; automated attempts stopped"
                );
            }
        }
        self.finish(LoopState::UserOverridden, out);
    }

    fn schedule(&mut self, timer: TimerKind, after: Duration, out: &mut Vec<Directive>) {
        self.armed.insert(timer);
        out.push(Directive::Schedule { timer, after });
    }

    fn finish(&mut self, state: LoopState, out: &mut Vec<Directive>) {
        self.state = state;
        out.extend(std::mem::take(&mut self.armed).into_iter().map(Directive::Cancel));
        if std::mem::take(&mut self.watching) {
            out.push(Directive::Unwatch);
        }
    }
}
