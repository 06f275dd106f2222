// ── Streaming session ──
//
// Owns the connection lifecycle and the long-poll loop. State changes go
// out through a watch channel, normalized events through a broadcast
// channel; the view layer subscribes to both and owns the store itself.
//
// Connections are generation-tagged: `connect()` hands back a
// [`StreamHandle`] scoped to that one connection, so tearing an old
// connection down after a replacement has started leaves the replacement
// untouched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use hc3log_api::{Hc3Client, TransportConfig, detail_path};

use crate::config::ConnectionConfig;
use crate::error::CoreError;
use crate::model::EventRecord;
use crate::normalize::normalize;
use crate::ordered_json;

const EVENT_CHANNEL_SIZE: usize = 256;

/// Connection lifecycle. `Lost` is terminal for a stream; reconnecting
/// goes through `connect()` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Streaming,
    Lost,
}

/// A connection to one controller plus its background long-poll task.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct LogSession {
    inner: Arc<SessionInner>,
}

/// One established connection's poll task. Cancelling through the handle
/// only affects the connection it came from, so a teardown racing a
/// replacement `connect()` cannot kill the replacement's stream.
pub struct StreamHandle {
    generation: u64,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct SessionInner {
    config: ConnectionConfig,
    connection_state: watch::Sender<ConnectionState>,
    event_tx: broadcast::Sender<Arc<EventRecord>>,
    client: Mutex<Option<Arc<Hc3Client>>>,
    cancel: CancellationToken,
    /// Bumped at the start of every `connect()`; stale handles and poll
    /// tasks compare against it before touching shared state.
    generation: AtomicU64,
}

impl LogSession {
    /// Create a session from configuration. Does not connect;
    /// call [`connect()`](Self::connect).
    pub fn new(config: ConnectionConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Idle);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_SIZE);
        Self {
            inner: Arc::new(SessionInner {
                config,
                connection_state,
                event_tx,
                client: Mutex::new(None),
                cancel: CancellationToken::new(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    /// Validate credentials, probe the controller, and start streaming.
    ///
    /// A failed probe reports the error and leaves the session idle so
    /// the user can fix the configuration and retry. The returned handle
    /// belongs to this connection alone; pass it to
    /// [`disconnect()`](Self::disconnect) to tear the stream down.
    pub async fn connect(&self) -> Result<StreamHandle, CoreError> {
        self.inner.config.validate()?;

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        let cancel = self.inner.cancel.child_token();

        let base_url = match self.inner.config.base_url() {
            Ok(url) => url,
            Err(e) => {
                self.reset_if_current(generation);
                return Err(e);
            }
        };
        let transport = TransportConfig {
            timeout: self.inner.config.timeout,
            ..TransportConfig::default()
        };
        let client = match Hc3Client::new(
            base_url.clone(),
            self.inner.config.username.clone(),
            self.inner.config.password.clone(),
            &transport,
        ) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                self.reset_if_current(generation);
                return Err(e.into());
            }
        };

        // Probe with cursor 0; the result itself is discarded and the
        // stream starts over from 0 once the loop is running.
        if let Err(e) = client.refresh_states(0, None).await {
            self.reset_if_current(generation);
            warn!(url = %base_url, error = %e, "connection probe failed");
            return Err(e.into());
        }
        info!(url = %base_url, generation, "connected, starting event stream");

        // A connection superseded while probing still streams briefly;
        // it must not overwrite its replacement's shared state.
        if generation == self.inner.generation.load(Ordering::SeqCst) {
            *self.inner.client.lock().await = Some(Arc::clone(&client));
            self.inner
                .connection_state
                .send_replace(ConnectionState::Streaming);
        }

        let task = tokio::spawn(poll_task(
            client,
            generation,
            Arc::clone(&self.inner),
            cancel.clone(),
        ));
        Ok(StreamHandle {
            generation,
            cancel,
            task,
        })
    }

    /// Stop the connection behind `handle`. The in-flight long-poll is
    /// abandoned rather than awaited; its result is discarded by the
    /// cancelled task. A handle superseded by a newer `connect()` only
    /// stops its own task and leaves the shared state alone.
    pub async fn disconnect(&self, handle: StreamHandle) {
        handle.cancel.cancel();
        let _ = handle.task.await;
        if handle.generation == self.inner.generation.load(Ordering::SeqCst) {
            *self.inner.client.lock().await = None;
            self.inner
                .connection_state
                .send_replace(ConnectionState::Idle);
        }
        debug!(generation = handle.generation, "disconnected");
    }

    fn reset_if_current(&self, generation: u64) {
        if generation == self.inner.generation.load(Ordering::SeqCst) {
            self.inner
                .connection_state
                .send_replace(ConnectionState::Idle);
        }
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to the normalized event stream.
    pub fn events(&self) -> broadcast::Receiver<Arc<EventRecord>> {
        self.inner.event_tx.subscribe()
    }

    /// Fetch the full resource behind an event, rendered as ordered
    /// pretty JSON for the detail view.
    pub async fn fetch_details(&self, event_type: &str, id: &str) -> Result<String, CoreError> {
        let Some(path) = detail_path(event_type, id) else {
            return Err(CoreError::NoDetails {
                event_type: event_type.to_owned(),
            });
        };
        let client = {
            let guard = self.inner.client.lock().await;
            guard.clone().ok_or(CoreError::Disconnected)?
        };
        let value = client.lookup(&path).await?;
        Ok(ordered_json::to_pretty_ordered(&value))
    }
}

/// The long-poll loop. Exactly one request is in flight at a time; the
/// next is issued immediately after the previous resolves, relying on the
/// server-side hold for pacing. Any failure flips the state to `Lost` and
/// ends the task; there is no automatic retry. A task superseded by a
/// newer connection stops itself without touching shared state.
async fn poll_task(
    client: Arc<Hc3Client>,
    generation: u64,
    inner: Arc<SessionInner>,
    cancel: CancellationToken,
) {
    let hold_secs = inner.config.hold_secs;
    let mut cursor: u64 = 0;
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(generation, "poll task cancelled");
                break;
            }
            result = client.refresh_states(cursor, Some(hold_secs)) => {
                let current = inner.generation.load(Ordering::SeqCst);
                match result {
                    Ok(response) => {
                        if generation != current {
                            debug!(generation, current, "superseded poll task stopping");
                            break;
                        }
                        cursor = advance_cursor(cursor, response.last);
                        for raw in response.events.unwrap_or_default() {
                            let row = normalize(&raw);
                            let record = Arc::new(EventRecord { raw, row });
                            // Send errors only mean no subscriber right now.
                            let _ = inner.event_tx.send(record);
                        }
                    }
                    Err(e) => {
                        warn!(generation, error = %e, "long-poll failed, stream lost");
                        if generation == current {
                            inner.connection_state.send_replace(ConnectionState::Lost);
                        }
                        break;
                    }
                }
            }
        }
    }
}

/// Cursor policy: advance only on a present, strictly greater value.
/// A missing or regressed cursor from the server leaves ours unchanged.
fn advance_cursor(current: u64, reported: Option<u64>) -> u64 {
    match reported {
        Some(last) if last > current => last,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_never_regresses() {
        let mut cursor = 0;
        cursor = advance_cursor(cursor, Some(10));
        assert_eq!(cursor, 10);
        cursor = advance_cursor(cursor, Some(7));
        assert_eq!(cursor, 10);
    }

    #[test]
    fn missing_cursor_leaves_current_unchanged() {
        assert_eq!(advance_cursor(42, None), 42);
        assert_eq!(advance_cursor(42, Some(42)), 42);
    }

    #[test]
    fn connect_with_missing_credentials_fails_fast() {
        let session = LogSession::new(ConnectionConfig::default());
        let result = tokio_test::block_on(session.connect());
        assert!(matches!(result, Err(CoreError::Config { .. })));
        assert_eq!(*session.state().borrow(), ConnectionState::Idle);
    }
}
