//! Tracing setup for a terminal in raw mode.
//!
//! Raw mode turns off output post-processing, so a bare `\n` moves down a
//! line without returning to column 0. Log lines go through [`CrlfWriter`]
//! to stay readable while scanning.

use std::io::{self, Write};

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes tracing on stderr. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,titan_scan=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .with_writer(|| CrlfWriter::new(io::stderr()))
        .init();
}

/// Rewrites every `\n` as `\r\n`.
pub struct CrlfWriter<W: Write> {
    inner: W,
}

impl<W: Write> CrlfWriter<W> {
    pub fn new(inner: W) -> Self {
        CrlfWriter { inner }
    }
}

impl<W: Write> Write for CrlfWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut start = 0;
        for (i, byte) in buf.iter().enumerate() {
            if *byte == b'\n' {
                self.inner.write_all(&buf[start..i])?;
                self.inner.write_all(b"\r\n")?;
                start = i + 1;
            }
        }
        self.inner.write_all(&buf[start..])?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
