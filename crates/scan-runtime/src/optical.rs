//! # Optical Scan Sessions
//!
//! Camera-based continuous decoding, one live session per video surface.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Optical Session Lifecycle                          │
//! │                                                                         │
//! │   start(surface)                                                        │
//! │       │                                                                 │
//! │       ├── live session on surface? ──► stop it, await its task          │
//! │       │                                                                 │
//! │       ├── CameraBackend::open(surface)                                  │
//! │       │       │                                                         │
//! │       │       ├── Err ──► status = Failed, return Err (no retry)        │
//! │       │       ▼                                                         │
//! │       │   spawn decode task ──────────────────────────────┐             │
//! │       ▼                                                   │             │
//! │   OpticalSessionHandle ◄──── mpsc<ScanEvent> ◄──── normalize(decoded)   │
//! │       │                                                   │             │
//! │   stop(handle)                                            │             │
//! │       ├── live = false (no more events observable)        │             │
//! │       ├── cancel (oneshot) ──────────────────────────────►│ select!     │
//! │       └── await task ◄──── DecodeStream::release() ◄──────┘             │
//! │                                                                         │
//! │   Device lost mid-stream: task sets status = Failed, releases, exits.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sessions are continuous: one successful decode does not end them. The
//! caller decides when to stop (the POS screen stops after a cart-add).

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use titan_scan_core::{NormalizedCode, ScanEvent};

use crate::error::RuntimeResult;

// =============================================================================
// Device Capability
// =============================================================================

/// Identifies the element a camera preview renders into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSurface(String);

impl VideoSurface {
    pub fn new(id: impl Into<String>) -> Self {
        VideoSurface(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opens a camera on a surface and starts decoding.
///
/// Permission, busy-device and init failures are returned from `open`.
#[async_trait]
pub trait CameraBackend: Send + Sync {
    async fn open(&self, surface: &VideoSurface) -> RuntimeResult<Box<dyn DecodeStream>>;
}

/// A running decoder.
#[async_trait]
pub trait DecodeStream: Send {
    /// Waits for the next decoded text.
    ///
    /// ## Returns
    /// * `Ok(Some(text))` - a barcode was decoded
    /// * `Ok(None)` - the device closed the stream
    /// * `Err(_)` - the device failed
    async fn next_decode(&mut self) -> RuntimeResult<Option<String>>;

    /// Releases the camera. Called exactly once when the session ends.
    async fn release(&mut self);
}

// =============================================================================
// Session Status
// =============================================================================

/// Per-surface camera status shown next to the start button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum SessionStatus {
    /// Never started on this surface.
    Idle,
    Running,
    /// Stopped by the caller or the device closed the stream.
    Stopped,
    /// Failed to start, or the device failed mid-stream.
    Failed(String),
}

impl SessionStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, SessionStatus::Failed(_))
    }
}

// =============================================================================
// Session Handle
// =============================================================================

/// Caller-owned handle to one optical session.
///
/// Dropping the handle does not stop the camera; pass it to
/// [`OpticalScanner::stop`].
#[derive(Debug)]
pub struct OpticalSessionHandle {
    id: Uuid,
    surface: VideoSurface,
    rx: mpsc::Receiver<ScanEvent>,
    live: Arc<AtomicBool>,
}

impl OpticalSessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn surface(&self) -> &VideoSurface {
        &self.surface
    }

    /// True until the session is stopped, replaced or fails.
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Waits for the next normalized camera scan.
    ///
    /// Returns `None` once the session is no longer live; buffered decodes
    /// from a stopped session are never yielded.
    pub async fn next_scan(&mut self) -> Option<ScanEvent> {
        if !self.is_live() {
            return None;
        }
        let event = self.rx.recv().await?;
        self.is_live().then_some(event)
    }
}

// =============================================================================
// Scanner
// =============================================================================

struct LiveSession {
    id: Uuid,
    cancel_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
    live: Arc<AtomicBool>,
    status_rx: watch::Receiver<SessionStatus>,
}

/// Owns the camera sessions of every surface.
///
/// ## Example
/// ```rust,ignore
/// let mut scanner = OpticalScanner::new(Arc::new(backend), 16);
/// let mut handle = scanner.start(VideoSurface::new("pos-preview")).await?;
/// while let Some(event) = handle.next_scan().await {
///     // dispatch event
/// }
/// scanner.stop(&handle).await;
/// ```
pub struct OpticalScanner {
    backend: Arc<dyn CameraBackend>,
    event_buffer: usize,
    sessions: HashMap<VideoSurface, LiveSession>,
    /// Final status of surfaces without a live session.
    history: HashMap<VideoSurface, SessionStatus>,
}

impl OpticalScanner {
    pub fn new(backend: Arc<dyn CameraBackend>, event_buffer: usize) -> Self {
        OpticalScanner {
            backend,
            event_buffer: event_buffer.max(1),
            sessions: HashMap::new(),
            history: HashMap::new(),
        }
    }

    /// Starts continuous decoding on `surface`, stopping any session already
    /// live there.
    pub async fn start(&mut self, surface: VideoSurface) -> RuntimeResult<OpticalSessionHandle> {
        if self.stop_surface(&surface).await {
            debug!(surface = %surface, "Replaced previous optical session");
        }

        let stream = match self.backend.open(&surface).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!(surface = %surface, error = %e, "Failed to start camera");
                self.history
                    .insert(surface, SessionStatus::Failed(e.to_string()));
                return Err(e);
            }
        };

        let id = Uuid::new_v4();
        let live = Arc::new(AtomicBool::new(true));
        let (event_tx, event_rx) = mpsc::channel(self.event_buffer);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (status_tx, status_rx) = watch::channel(SessionStatus::Running);

        let join = tokio::spawn(run_decode_loop(
            id,
            stream,
            event_tx,
            cancel_rx,
            live.clone(),
            status_tx,
        ));

        self.history.remove(&surface);
        self.sessions.insert(
            surface.clone(),
            LiveSession {
                id,
                cancel_tx,
                join,
                live: live.clone(),
                status_rx,
            },
        );

        info!(session_id = %id, surface = %surface, "Optical session started");

        Ok(OpticalSessionHandle {
            id,
            surface,
            rx: event_rx,
            live,
        })
    }

    /// Stops the session behind `handle`. Idempotent; a handle whose session
    /// was already replaced only loses its liveness.
    pub async fn stop(&mut self, handle: &OpticalSessionHandle) {
        handle.live.store(false, Ordering::SeqCst);

        let owns_surface = self
            .sessions
            .get(&handle.surface)
            .is_some_and(|s| s.id == handle.id);
        if owns_surface {
            self.stop_surface(&handle.surface).await;
        }
    }

    /// Stops whatever session is live on `surface`. Returns true if one was.
    ///
    /// Returns only after the device has been released.
    pub async fn stop_surface(&mut self, surface: &VideoSurface) -> bool {
        let Some(session) = self.sessions.remove(surface) else {
            return false;
        };

        let LiveSession {
            id,
            cancel_tx,
            join,
            live,
            status_rx,
        } = session;

        live.store(false, Ordering::SeqCst);
        // The task may already have exited on its own.
        let _ = cancel_tx.send(());
        if let Err(e) = join.await {
            warn!(session_id = %id, error = %e, "Decode task panicked");
        }

        let final_status = match &*status_rx.borrow() {
            SessionStatus::Failed(reason) => SessionStatus::Failed(reason.clone()),
            _ => SessionStatus::Stopped,
        };
        self.history.insert(surface.clone(), final_status);

        info!(session_id = %id, surface = %surface, "Optical session stopped");
        true
    }

    /// Stops every session. Used at teardown.
    pub async fn stop_all(&mut self) {
        let surfaces: Vec<VideoSurface> = self.sessions.keys().cloned().collect();
        for surface in surfaces {
            self.stop_surface(&surface).await;
        }
    }

    /// Current status for a surface.
    pub fn status(&self, surface: &VideoSurface) -> SessionStatus {
        if let Some(session) = self.sessions.get(surface) {
            return session.status_rx.borrow().clone();
        }
        self.history
            .get(surface)
            .cloned()
            .unwrap_or(SessionStatus::Idle)
    }

    pub fn is_live(&self, surface: &VideoSurface) -> bool {
        self.sessions
            .get(surface)
            .is_some_and(|s| s.live.load(Ordering::SeqCst))
    }

    /// Number of sessions still decoding.
    pub fn live_sessions(&self) -> usize {
        self.sessions
            .values()
            .filter(|s| s.live.load(Ordering::SeqCst))
            .count()
    }
}

// =============================================================================
// Decode Loop
// =============================================================================

async fn run_decode_loop(
    id: Uuid,
    mut stream: Box<dyn DecodeStream>,
    event_tx: mpsc::Sender<ScanEvent>,
    mut cancel_rx: oneshot::Receiver<()>,
    live: Arc<AtomicBool>,
    status_tx: watch::Sender<SessionStatus>,
) {
    loop {
        tokio::select! {
            biased;

            _ = &mut cancel_rx => {
                debug!(session_id = %id, "Decode loop cancelled");
                break;
            }

            decoded = stream.next_decode() => match decoded {
                Ok(Some(text)) => {
                    let code = NormalizedCode::from_raw(text.trim());
                    if code.is_empty() {
                        continue;
                    }
                    debug!(session_id = %id, code = %code, "Camera decoded code");

                    tokio::select! {
                        biased;
                        _ = &mut cancel_rx => break,
                        sent = event_tx.send(ScanEvent::camera(code, Utc::now())) => {
                            if sent.is_err() {
                                debug!(session_id = %id, "Session handle dropped");
                                break;
                            }
                        }
                    }
                }
                Ok(None) => {
                    info!(session_id = %id, "Decode stream closed by device");
                    let _ = status_tx.send(SessionStatus::Stopped);
                    break;
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Camera failed mid-stream");
                    let _ = status_tx.send(SessionStatus::Failed(e.to_string()));
                    break;
                }
            }
        }
    }

    live.store(false, Ordering::SeqCst);
    stream.release().await;
    drop(event_tx);
}
