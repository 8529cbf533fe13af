//! # Keyed Input Capture
//!
//! Reconstructs scanner bursts out of the shared keyboard stream.
//!
//! A keyboard-wedge scanner has no device API of its own: it "types" its
//! payload followed by Enter, on the same channel as the human operator. The
//! only thing separating the two is speed.
//!
//! ## Burst State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    on_key(key, at)                                      │
//! │                                                                         │
//! │  at - last_event > burst_threshold (50ms)?                             │
//! │       │                                                                 │
//! │       └── YES: buffer.clear()       (human pause, or stale fragment)   │
//! │                                                                         │
//! │  last_event = at                                                        │
//! │                                                                         │
//! │  match key:                                                             │
//! │    [0-9A-Za-z] ──► buffer.push(c)              → Buffered              │
//! │    Enter       ──► buffer empty?                                       │
//! │                      YES → EmptyTerminator                             │
//! │                      NO  → normalize(buffer), clear → Completed(code)  │
//! │    anything else ─► untouched                  → Ignored               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys other than alphanumerics and Enter are ignored rather than resetting
//! the buffer: scanners that emit uppercase letters interleave Shift presses
//! inside the burst.
//!
//! ## Listener Ownership
//! Only one listener may exist for the whole application. [`CaptureSession`]
//! owns it and registers/tears it down as consumers declare interest, so two
//! screens in `usb` mode never double-buffer the same keystrokes.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::code::{is_code_char, NormalizedCode};
use crate::types::{Consumer, ConsumerMode};

/// Default gap that separates two bursts.
pub const DEFAULT_BURST_THRESHOLD: Duration = Duration::from_millis(50);

// =============================================================================
// Key
// =============================================================================

/// A key press as seen by the capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A printable character.
    Char(char),
    /// The Enter/Return key.
    Enter,
    /// Any other key (modifiers, arrows, function keys).
    Other,
}

impl Key {
    /// Maps a DOM-style key name ("a", "Enter", "Shift") to a [`Key`].
    pub fn from_name(name: &str) -> Self {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ if name == "Enter" => Key::Enter,
            _ => Key::Other,
        }
    }
}

/// What a single key press did to the capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Character appended to the current burst.
    Buffered,
    /// Enter closed a non-empty burst.
    Completed(NormalizedCode),
    /// Enter arrived with nothing buffered.
    EmptyTerminator,
    /// Key passed through to the page.
    Ignored,
}

// =============================================================================
// Capture State
// =============================================================================

/// Buffer plus the timestamp of the last key event.
#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    pub buffer: String,
    pub last_event: Option<Instant>,
}

// =============================================================================
// KeyedInputCapture
// =============================================================================

/// The burst reconstruction state machine.
///
/// Timestamps are supplied by the caller so the capture stays free of clock
/// reads and can be driven deterministically in tests.
///
/// ## Example
/// ```rust
/// use std::time::{Duration, Instant};
/// use titan_scan_core::capture::{CaptureOutcome, Key, KeyedInputCapture};
///
/// let mut capture = KeyedInputCapture::default();
/// let t0 = Instant::now();
/// let ms = Duration::from_millis;
///
/// for (i, c) in "ABCdef1234".chars().enumerate() {
///     capture.on_key(Key::Char(c), t0 + ms(i as u64 * 5));
/// }
/// let outcome = capture.on_key(Key::Enter, t0 + ms(50));
/// assert!(matches!(outcome, CaptureOutcome::Completed(code) if code.as_str() == "ABC-def-1234"));
/// ```
#[derive(Debug, Clone)]
pub struct KeyedInputCapture {
    state: CaptureState,
    burst_threshold: Duration,
}

impl Default for KeyedInputCapture {
    fn default() -> Self {
        Self::new(DEFAULT_BURST_THRESHOLD)
    }
}

impl KeyedInputCapture {
    pub fn new(burst_threshold: Duration) -> Self {
        KeyedInputCapture {
            state: CaptureState::default(),
            burst_threshold,
        }
    }

    pub fn burst_threshold(&self) -> Duration {
        self.burst_threshold
    }

    /// Current (incomplete) burst.
    pub fn buffer(&self) -> &str {
        &self.state.buffer
    }

    /// Feeds one key press.
    pub fn on_key(&mut self, key: Key, at: Instant) -> CaptureOutcome {
        if let Some(last) = self.state.last_event {
            // Out-of-order timestamps saturate to zero and count as same burst.
            if at.saturating_duration_since(last) > self.burst_threshold
                && !self.state.buffer.is_empty()
            {
                debug!(discarded = %self.state.buffer, "Burst gap exceeded, clearing buffer");
                self.state.buffer.clear();
            }
        }
        self.state.last_event = Some(at);

        match key {
            Key::Char(c) if is_code_char(c) => {
                self.state.buffer.push(c);
                CaptureOutcome::Buffered
            }
            Key::Enter => {
                if self.state.buffer.is_empty() {
                    return CaptureOutcome::EmptyTerminator;
                }
                let raw = std::mem::take(&mut self.state.buffer);
                let code = NormalizedCode::from_raw(&raw);
                debug!(raw = %raw, code = %code, "Burst completed");
                CaptureOutcome::Completed(code)
            }
            Key::Char(_) | Key::Other => CaptureOutcome::Ignored,
        }
    }

    /// Drops any partial burst.
    pub fn reset(&mut self) {
        self.state = CaptureState::default();
    }
}

// =============================================================================
// CaptureSession
// =============================================================================

/// Owner of the single application-wide keyboard listener.
///
/// Consumers declare their mode; the listener exists exactly while at least
/// one consumer is in `usb` mode.
///
/// ```text
/// declare(Search, Usb)     {}        → {Search}          register listener
/// declare(StockIn, Usb)    {Search}  → {Search, StockIn} (already live)
/// declare(Search, Manual)  ...       → {StockIn}         (still live)
/// declare(StockIn, Camera) {StockIn} → {}                tear down
/// ```
#[derive(Debug)]
pub struct CaptureSession {
    interested: BTreeSet<Consumer>,
    listener: Option<KeyedInputCapture>,
    burst_threshold: Duration,
    registrations: u64,
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(DEFAULT_BURST_THRESHOLD)
    }
}

impl CaptureSession {
    pub fn new(burst_threshold: Duration) -> Self {
        CaptureSession {
            interested: BTreeSet::new(),
            listener: None,
            burst_threshold,
            registrations: 0,
        }
    }

    /// Records a consumer's mode and registers or tears down the listener.
    pub fn declare(&mut self, consumer: Consumer, mode: ConsumerMode) {
        if mode.needs_keyboard() {
            self.interested.insert(consumer);
        } else {
            self.interested.remove(&consumer);
        }
        self.sync_listener();
    }

    /// Withdraws a consumer entirely (screen teardown).
    pub fn release(&mut self, consumer: Consumer) {
        self.interested.remove(&consumer);
        self.sync_listener();
    }

    fn sync_listener(&mut self) {
        match (self.interested.is_empty(), self.listener.is_some()) {
            (false, false) => {
                self.listener = Some(KeyedInputCapture::new(self.burst_threshold));
                self.registrations += 1;
                info!(consumers = ?self.interested, "Keyboard listener registered");
            }
            (true, true) => {
                self.listener = None;
                info!("Keyboard listener torn down");
            }
            _ => {}
        }
    }

    /// Whether the listener is currently registered.
    pub fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// How many times the listener has been registered since creation.
    pub fn registrations(&self) -> u64 {
        self.registrations
    }

    /// Consumers currently in `usb` mode.
    pub fn interested(&self) -> impl Iterator<Item = Consumer> + '_ {
        self.interested.iter().copied()
    }

    /// Feeds a key press to the listener; ignored when nobody is listening.
    pub fn on_key(&mut self, key: Key, at: Instant) -> CaptureOutcome {
        match self.listener.as_mut() {
            Some(capture) => capture.on_key(key, at),
            None => CaptureOutcome::Ignored,
        }
    }
}
