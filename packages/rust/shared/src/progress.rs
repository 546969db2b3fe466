//! Observability collaborator for long-running tasks.
//!
//! Sinks are fire-and-forget: nothing in the workflow ever reads a value back.

use std::fmt;

/// Coarse task status reported to a [`ProgressSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Running,
    Retrying,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Retrying => "retrying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress and telemetry callback injected into every operation.
pub trait ProgressSink: Send + Sync {
    /// Fraction of the task completed, in `0.0..=1.0`.
    fn set_progress(&self, fraction: f64);
    /// Current task status.
    fn set_status(&self, status: TaskStatus);
    /// A failure message (already safe to show).
    fn record_error(&self, message: &str);
    /// A named numeric metric such as a token counter.
    fn record_metric(&self, name: &str, value: f64);
}

/// No-op sink for headless/test usage.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn set_progress(&self, _fraction: f64) {}
    fn set_status(&self, _status: TaskStatus) {}
    fn record_error(&self, _message: &str) {}
    fn record_metric(&self, _name: &str, _value: f64) {}
}

/// Sink that forwards every event to `tracing`.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn set_progress(&self, fraction: f64) {
        tracing::debug!(fraction, "progress");
    }

    fn set_status(&self, status: TaskStatus) {
        tracing::info!(%status, "task status");
    }

    fn record_error(&self, message: &str) {
        tracing::warn!(error = message, "task error");
    }

    fn record_metric(&self, name: &str, value: f64) {
        tracing::info!(metric = name, value, "metric");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn tracing_progress_logs_every_event() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let sink: &dyn ProgressSink = &TracingProgress;
            sink.set_status(TaskStatus::Retrying);
            sink.set_progress(0.5);
            sink.record_error("network error: timed out");
            sink.record_metric("total_tokens", 300.0);
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("status=retrying"), "{output}");
        assert!(output.contains("fraction=0.5"), "{output}");
        assert!(output.contains("WARN"), "{output}");
        assert!(output.contains("network error: timed out"), "{output}");
        assert!(output.contains("metric="), "{output}");
        assert!(output.contains("total_tokens"), "{output}");
    }
}
