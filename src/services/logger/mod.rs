use std::io::{self, Write};

use tracing_subscriber::fmt::MakeWriter;

/// A `io::Write` implementation that writes logs to stdout unless logging is disabled
#[derive(Debug, Clone, Copy)]
pub struct StdoutWriter {
    skip_log: bool,
}

impl io::Write for StdoutWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.skip_log {
            io::stdout().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.skip_log {
            return Ok(());
        }

        io::stdout().flush()
    }
}

/// A naive logger that can be switched off entirely from the configuration
#[derive(Debug, Clone, Copy)]
pub struct SecretLog {
    enabled: bool,
}

impl SecretLog {
    pub fn new(enabled: bool) -> Self {
        SecretLog { enabled }
    }
}

/// impl from `tracing_subscriber::fmt::MakeWriter`
impl<'a> MakeWriter<'a> for SecretLog {
    type Writer = StdoutWriter;

    fn make_writer(&'a self) -> Self::Writer {
        StdoutWriter {
            skip_log: !self.enabled,
        }
    }
}
