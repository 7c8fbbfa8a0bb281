//! Async stream line readers (non-UTF8-safe).
//!
//! OpenOCD and the USB stacks below it can emit non-UTF8 bytes on
//! stdout/stderr. Using `BufReader::lines()` would terminate the reader task on
//! invalid UTF-8, so lines are read as bytes and decoded lossily. Only complete
//! lines are delivered; a trailing fragment is flushed at EOF.

use std::fmt;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        })
    }
}

/// Strip a trailing `\n` or `\r\n`.
fn trim_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

/// Read `stream` line by line and hand each line to `on_line`.
pub fn spawn_line_reader<F>(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    kind: StreamKind,
    on_line: F,
) -> JoinHandle<()>
where
    F: Fn(StreamKind, String) + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    trim_line_ending(&mut buf);
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    trace!(pid = %pid, stream = %kind, "{line}");
                    on_line(kind, line);
                }
                Err(e) => {
                    debug!(pid = %pid, stream = %kind, error = %e, "line reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(pid = %pid, stream = %kind, "line reader task exiting");
    })
}
