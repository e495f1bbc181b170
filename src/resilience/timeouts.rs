//! Per-attempt deadline enforcement.
//!
//! # Responsibilities
//! - Race one attempt against its deadline
//! - Signal the attempt's cancellation token when the deadline wins
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from operation errors

use crate::resilience::error::CallError;
use crate::resilience::operation::Operation;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run a single attempt of `op` under `deadline`.
pub async fn run_with_deadline<O>(op: &O, deadline: Duration) -> Result<O::Output, CallError<O::Error>>
where
    O: Operation + ?Sized,
{
    let cancel = CancellationToken::new();

    match tokio::time::timeout(deadline, op.run(cancel.clone())).await {
        Ok(result) => result.map_err(CallError::Operation),
        Err(_) => {
            cancel.cancel();
            Err(CallError::Timeout(deadline))
        }
    }
}
