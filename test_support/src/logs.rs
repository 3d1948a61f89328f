//! Log capture for tests that check what the generator reports.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Level;
use tracing_subscriber::fmt;

#[derive(Clone, Default)]
struct BufferWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl Write for BufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber at `level` installed and return what it logged.
///
/// # Examples
///
/// ```
/// use test_support::capture_logs;
/// use tracing::Level;
///
/// let output = capture_logs(Level::WARN, || tracing::warn!("careful"));
/// assert!(output.contains("careful"));
/// ```
pub fn capture_logs<F>(level: Level, f: F) -> String
where
    F: FnOnce(),
{
    let writer = BufferWriter::default();
    let buf = Arc::clone(&writer.buf);
    let subscriber = fmt()
        .with_max_level(level)
        .without_time()
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buf.lock().unwrap_or_else(PoisonError::into_inner).clone();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn events_below_the_level_are_dropped() {
        let output = capture_logs(Level::WARN, || {
            tracing::debug!("quiet");
            tracing::warn!("loud");
        });
        assert!(output.contains("loud"));
        assert!(!output.contains("quiet"));
    }
}
