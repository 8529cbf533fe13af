//! # Terminal Input
//!
//! Reads key presses on a dedicated thread and timestamps them the moment
//! they are read, so burst detection sees real inter-key gaps.
//!
//! ```text
//! ┌──────────────────────────────┐          ┌───────────────────────────┐
//! │  INPUT THREAD                │          │  TOKIO MAIN               │
//! │  event::poll(100ms)          │          │                           │
//! │  event::read() ──► map_key ──┼─ mpsc ──►│  ScanPipeline::on_key     │
//! │  Instant::now()              │          │                           │
//! └──────────────────────────────┘          └───────────────────────────┘
//! ```

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use titan_scan_core::Key;

/// Poll timeout; bounds how long `stop()` waits.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// What a key press means to the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleInput {
    /// Goes to the scan pipeline.
    Key(Key),
    Commit,
    Reset,
    Quit,
}

/// Maps a crossterm key event. Releases are dropped.
pub fn map_key(event: KeyEvent) -> Option<ConsoleInput> {
    if event.kind == KeyEventKind::Release {
        return None;
    }

    let input = match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => ConsoleInput::Quit,
        KeyCode::Esc => ConsoleInput::Quit,
        KeyCode::F(2) => ConsoleInput::Commit,
        KeyCode::F(5) => ConsoleInput::Reset,
        KeyCode::Char(c) => ConsoleInput::Key(Key::Char(c)),
        KeyCode::Enter => ConsoleInput::Key(Key::Enter),
        _ => ConsoleInput::Key(Key::Other),
    };
    Some(input)
}

// =============================================================================
// Raw Mode
// =============================================================================

/// Restores cooked mode on drop, including on early return.
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "Failed to restore terminal mode");
        }
    }
}

// =============================================================================
// Input Thread
// =============================================================================

pub struct InputThread {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl InputThread {
    pub fn spawn(tx: UnboundedSender<(ConsoleInput, Instant)>) -> io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();

        let handle = thread::Builder::new()
            .name("scan-input".to_string())
            .spawn(move || run_loop(flag, tx))?;

        Ok(InputThread {
            handle: Some(handle),
            running,
        })
    }

    /// Stops the thread and waits for it (at most one poll timeout).
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for InputThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(running: Arc<AtomicBool>, tx: UnboundedSender<(ConsoleInput, Instant)>) {
    while running.load(Ordering::SeqCst) {
        match event::poll(SHUTDOWN_POLL) {
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) => {
                    let at = Instant::now();
                    let Some(input) = map_key(key) else {
                        continue;
                    };
                    if tx.send((input, at)).is_err() || input == ConsoleInput::Quit {
                        break;
                    }
                }
                Ok(_) => {}
                Err(e) => debug!(error = %e, "Terminal read error"),
            },
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "Terminal poll failed");
                let _ = tx.send((ConsoleInput::Quit, Instant::now()));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_scanner_keys() {
        assert_eq!(
            map_key(press(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(ConsoleInput::Key(Key::Char('A')))
        );
        assert_eq!(
            map_key(press(KeyCode::Enter, KeyModifiers::NONE)),
            Some(ConsoleInput::Key(Key::Enter))
        );
        assert_eq!(
            map_key(press(KeyCode::Tab, KeyModifiers::NONE)),
            Some(ConsoleInput::Key(Key::Other))
        );
    }

    #[test]
    fn test_control_keys() {
        assert_eq!(
            map_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(ConsoleInput::Quit)
        );
        assert_eq!(map_key(press(KeyCode::Esc, KeyModifiers::NONE)), Some(ConsoleInput::Quit));
        assert_eq!(map_key(press(KeyCode::F(2), KeyModifiers::NONE)), Some(ConsoleInput::Commit));
        assert_eq!(map_key(press(KeyCode::F(5), KeyModifiers::NONE)), Some(ConsoleInput::Reset));
    }

    #[test]
    fn test_release_is_dropped() {
        let mut event = press(KeyCode::Char('a'), KeyModifiers::NONE);
        event.kind = KeyEventKind::Release;
        assert_eq!(map_key(event), None);
    }
}
