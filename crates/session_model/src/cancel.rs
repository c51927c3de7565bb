use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::GatewayError;

/// Shared cancellation flag tied to the lifetime of the page that started
/// the work.
pub type CancelSignal = Arc<AtomicBool>;

const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[must_use]
pub fn is_cancelled(cancel: Option<&CancelSignal>) -> bool {
    cancel.is_some_and(|token| token.load(Ordering::Acquire))
}

/// Awaits `future`, giving up with [`GatewayError::Cancelled`] as soon as
/// the signal is raised.
pub async fn await_or_cancel<F>(
    future: F,
    cancel: Option<&CancelSignal>,
) -> Result<F::Output, GatewayError>
where
    F: Future,
{
    if cancel.is_none() {
        return Ok(future.await);
    }

    let mut future = Box::pin(future);

    loop {
        if is_cancelled(cancel) {
            return Err(GatewayError::Cancelled);
        }

        if let Ok(output) = tokio::time::timeout(CANCEL_POLL_INTERVAL, &mut future).await {
            if is_cancelled(cancel) {
                return Err(GatewayError::Cancelled);
            }
            return Ok(output);
        }
    }
}

/// Fixed poll delay that aborts early on cancellation.
pub async fn sleep_or_cancel(
    delay: Duration,
    cancel: Option<&CancelSignal>,
) -> Result<(), GatewayError> {
    await_or_cancel(tokio::time::sleep(delay), cancel).await
}
