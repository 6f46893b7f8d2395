// 📝 Logging - env_logger setup with an optional in-memory sink
//
// While the review UI owns the terminal, log records are piped into a
// LogBuffer and written out once the terminal is restored.

use env_logger::{Builder, Env, Target};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Shared, cloneable buffer that collects formatted log output
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffered output so far
    pub fn contents(&self) -> String {
        self.inner
            .lock()
            .map(|buf| String::from_utf8_lossy(&buf).into_owned())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().map(|buf| buf.is_empty()).unwrap_or(true)
    }

    /// Write the buffered output to `out` and clear the buffer
    pub fn flush_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let drained = {
            let mut buf = self.inner.lock().map_err(|_| poisoned())?;
            std::mem::take(&mut *buf)
        };
        out.write_all(&drained)?;
        out.flush()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.inner.lock().map_err(|_| poisoned())?;
        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "log buffer lock poisoned")
}

/// Install the global logger. `default_level` applies unless RUST_LOG is set;
/// with a `sink`, records go to the buffer instead of stderr.
pub fn init(default_level: &str, sink: Option<LogBuffer>) -> Result<(), log::SetLoggerError> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_level));

    builder.format(|buf, record| {
        writeln!(
            buf,
            "{}:{}:{}: {}",
            buf.timestamp(),
            record.level(),
            record.target(),
            record.args()
        )
    });

    if let Some(sink) = sink {
        builder.target(Target::Pipe(Box::new(sink)));
    }

    builder.try_init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_collects_and_flushes() {
        let buffer = LogBuffer::new();
        let mut writer = buffer.clone();
        writer.write_all(b"first line\n").unwrap();
        writer.write_all(b"second line\n").unwrap();

        assert_eq!(buffer.contents(), "first line\nsecond line\n");

        let mut out = Vec::new();
        buffer.flush_to(&mut out).unwrap();
        assert_eq!(out, b"first line\nsecond line\n");
        assert!(buffer.is_empty());
    }
}
