//! Data bridge — connects [`LogSession`] streams to TUI actions.
//!
//! Runs as a background task: connects the session, then forwards every
//! normalized event and connection-state transition as an [`Action`]
//! through the TUI's action channel.

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use hc3log_core::LogSession;

use crate::action::Action;

/// Connect the session and forward its streams into the action channel.
///
/// A failed connect reports the error and returns; the user can trigger
/// another attempt with the reconnect key. Shuts down cleanly on
/// cancellation.
pub async fn spawn_data_bridge(
    session: LogSession,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut state = session.state();
    let mut events = session.events();

    let handle = match session.connect().await {
        Ok(handle) => handle,
        Err(e) => {
            warn!(error = %e, "failed to connect to controller");
            let _ = action_tx.send(Action::StreamError(e.to_string()));
            return;
        }
    };

    // Forward the state we may have missed while connecting.
    let _ = action_tx.send(Action::StreamState(*state.borrow_and_update()));

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            result = events.recv() => {
                match result {
                    Ok(record) => {
                        let _ = action_tx.send(Action::EventIngested(record));
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "event stream lagged, events dropped");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            Ok(()) = state.changed() => {
                let _ = action_tx.send(Action::StreamState(*state.borrow_and_update()));
            }
        }
    }

    session.disconnect(handle).await;
    debug!("data bridge shut down");
}
