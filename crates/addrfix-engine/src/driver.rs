//! Runs a [`Reconciler`] on tokio timers and control signals.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::Instrument;

use crate::page::{ControlLocator, ControlSignal, OptionListControl};
use crate::reconcile::{Directive, LoopReport, ReconcileEvent, Reconciler};
use crate::timers::TimerQueue;

/// Drives `machine` to a terminal state and reports it.
///
/// Timer expiries and control signals are fed in one at a time on the
/// calling task. When the machine finishes, every timer and the control
/// subscription are released before this returns.
pub async fn drive<L: ControlLocator>(mut machine: Reconciler<L>) -> LoopReport {
    let span = tracing::info_span!("reconcile", order_id = %machine.order_id());
    async move {
        let mut timers = TimerQueue::default();
        let mut signals: Option<UnboundedReceiver<ControlSignal>> = None;

        let directives = machine.start();
        apply_directives(&machine, directives, &mut timers, &mut signals);

        while !machine.is_finished() {
            let event = tokio::select! {
                Some(kind) = timers.wait_next(), if !timers.is_empty() => {
                    Some(ReconcileEvent::Timer(kind))
                }
                signal = next_signal(&mut signals), if signals.is_some() => {
                    signal.map(ReconcileEvent::from)
                }
                else => {
                    tracing::warn!(state = %machine.state(), "reconciler stalled with nothing pending");
                    break;
                }
            };

            let Some(event) = event else {
                // The control went away; only timers can move the machine now.
                signals = None;
                continue;
            };

            let directives = machine.handle(event);
            apply_directives(&machine, directives, &mut timers, &mut signals);
        }

        let report = machine.report();
        tracing::debug!(state = %report.state, attempts = report.attempts, "reconcile loop finished");
        report
    }
    .instrument(span)
    .await
}

fn apply_directives<L: ControlLocator>(
    machine: &Reconciler<L>,
    directives: Vec<Directive>,
    timers: &mut TimerQueue,
    signals: &mut Option<UnboundedReceiver<ControlSignal>>,
) {
    for directive in directives {
        match directive {
            Directive::Schedule { timer, after } => timers.schedule(timer, after),
            Directive::Cancel(timer) => timers.cancel(timer),
            Directive::Watch => *signals = machine.control().map(OptionListControl::subscribe),
            Directive::Unwatch => *signals = None,
        }
    }
}

async fn next_signal(
    signals: &mut Option<UnboundedReceiver<ControlSignal>>,
) -> Option<ControlSignal> {
    match signals {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
