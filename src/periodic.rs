//! Periodic callback driver shared by the executor and the producer roles.
//!
//! Each callback runs on a tokio interval and is raced against the shared
//! shutdown signal. A callback that returns an error or panics is reported to
//! the observer and the loop keeps its schedule; only shutdown, an explicit
//! [`Step::Stop`] or aborting the task ends it. Callbacks are synchronous, so
//! an abort can only land between ticks, never inside a locked section.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

use crate::error::{BoardError, Result};
use crate::observer::BoardObserver;
use crate::shutdown::ShutdownSignal;

/// What the loop should do after a callback returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Continue,
    Stop,
}

#[derive(Debug, Clone)]
pub(crate) struct PeriodicContext {
    pub role: String,
    pub operation: &'static str,
    pub period: Duration,
    pub shutdown: ShutdownSignal,
    pub observer: Arc<dyn BoardObserver>,
}

/// Run `callback` every `ctx.period` (first run one period from now) until
/// shutdown or until it asks to stop.
pub(crate) async fn run_periodic<F>(ctx: PeriodicContext, mut callback: F)
where
    F: FnMut() -> Result<Step>,
{
    debug!(
        role = %ctx.role,
        operation = ctx.operation,
        period_ms = ctx.period.as_millis() as u64,
        "Periodic loop started"
    );

    let mut interval = time::interval_at(Instant::now() + ctx.period, ctx.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while !ctx.shutdown.is_set() {
        tokio::select! {
            _ = interval.tick() => {}
            _ = ctx.shutdown.wait() => break,
        }

        match panic::catch_unwind(AssertUnwindSafe(&mut callback)) {
            Ok(Ok(Step::Continue)) => {}
            Ok(Ok(Step::Stop)) => break,
            Ok(Err(err)) => {
                let failure = BoardError::callback_failed(&ctx.role, ctx.operation, err);
                ctx.observer.callback_failed(&failure);
            }
            Err(payload) => {
                let failure = BoardError::callback_failed(
                    &ctx.role,
                    ctx.operation,
                    panic_message(payload.as_ref()),
                );
                ctx.observer.callback_failed(&failure);
            }
        }
    }

    debug!(role = %ctx.role, operation = ctx.operation, "Periodic loop ended");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
