//! Output sink for `print`

use std::io::Write;

/// Receives one rendered line per `print` call
pub trait OutputSink {
    fn write_line(&mut self, line: &str);
}

/// Writes to the process's standard output
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", line) {
            log::warn!("failed to write program output: {}", e);
        }
    }
}

/// Keeps every line in memory
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CaptureSink {
    pub lines: Vec<String>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for CaptureSink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}
