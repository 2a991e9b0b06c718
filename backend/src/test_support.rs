//! Test utilities for the synthgen crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests or
//! when the `test-support` feature is enabled.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::logging::ContextJsonFormat;

/// In-memory sink collecting the JSON lines written by [`ContextJsonFormat`].
///
/// # Examples
/// ```
/// use synthgen::test_support::CapturedLogs;
///
/// let logs = CapturedLogs::default();
/// tracing::subscriber::with_default(logs.subscriber(), || tracing::info!("hello"));
/// assert_eq!(logs.records()[0]["message"], "hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Subscriber writing every event, at any level, into this sink.
    #[must_use]
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + use<> {
        tracing_subscriber::fmt()
            .with_max_level(LevelFilter::TRACE)
            .event_format(ContextJsonFormat)
            .with_writer(self.clone())
            .finish()
    }

    /// Parsed records in emission order; lines that are not JSON are skipped.
    #[must_use]
    pub fn records(&self) -> Vec<Value> {
        let buffer = self.lock();
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Records whose `message` equals `message`.
    #[must_use]
    pub fn records_with_message(&self, message: &str) -> Vec<Value> {
        self.records()
            .into_iter()
            .filter(|record| record["message"] == message)
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Writer handed out by [`CapturedLogs`] for each event.
#[derive(Debug)]
pub struct CapturedLogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedLogWriter {
            buffer: Arc::clone(&self.buffer),
        }
    }
}
