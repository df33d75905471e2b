//! # LogWriter: events as tracing records
//!
//! A minimal subscriber that forwards incoming [`Event`]s to `tracing`, one record
//! per event, under the `pollvisor::events` target.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  pollvisor::events: service started service="mailer"
//! DEBUG pollvisor::events: worker count changed service="mailer" workers=1
//! ERROR pollvisor::events: task error service="mailer" label="task_failed" reason="smtp timeout"
//! WARN  pollvisor::events: exit timeout hit service="mailer" workers=2 timeout_ms=5000
//! INFO  pollvisor::events: service completed service="mailer"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "pollvisor::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("unknown");
        match e.kind {
            EventKind::WorkerCountChanged => {
                tracing::debug!(target: TARGET, service, workers = e.workers, "worker count changed");
            }
            EventKind::TaskError => {
                tracing::error!(
                    target: TARGET,
                    service,
                    label = e.label,
                    reason = e.reason.as_deref(),
                    "task error"
                );
            }
            EventKind::ServiceStarted => {
                tracing::info!(target: TARGET, service, "service started");
            }
            EventKind::StopRequested => {
                tracing::info!(target: TARGET, service, workers = e.workers, "stop requested");
            }
            EventKind::ExitTimeoutHit => {
                tracing::warn!(
                    target: TARGET,
                    service,
                    workers = e.workers,
                    timeout_ms = e.timeout_ms,
                    "exit timeout hit"
                );
            }
            EventKind::ServiceCompleted => {
                tracing::info!(target: TARGET, service, "service completed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    target: TARGET,
                    subscriber = service,
                    reason = e.reason.as_deref(),
                    "subscriber overflow"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(
                    target: TARGET,
                    subscriber = service,
                    info = e.reason.as_deref().unwrap_or("unknown"),
                    "subscriber panicked"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().expect("capture lock").clone();
            String::from_utf8(bytes)
                .expect("utf8 output")
                .lines()
                .map(str::to_owned)
                .collect()
        }
    }

    async fn render(events: &[Event]) -> Vec<String> {
        let captured = Captured::default();
        let sink = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .without_time()
            .with_writer(move || sink.clone())
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let writer = LogWriter::new();
        for ev in events {
            writer.on_event(ev).await;
        }
        captured.lines()
    }

    fn line_with<'a>(lines: &'a [String], message: &str) -> &'a str {
        lines
            .iter()
            .find(|l| l.contains(message))
            .unwrap_or_else(|| panic!("no record for {message:?} in {lines:#?}"))
    }

    #[tokio::test]
    async fn test_task_error_is_an_error_record() {
        let lines = render(&[Event::new(EventKind::TaskError)
            .with_service("mailer")
            .with_label("task_failed")
            .with_reason("smtp timeout")])
        .await;

        let line = line_with(&lines, "task error");
        assert!(line.trim_start().starts_with("ERROR"), "{line}");
        assert!(line.contains(TARGET), "{line}");
        assert!(line.contains(r#"service="mailer""#), "{line}");
        assert!(line.contains("smtp timeout"), "{line}");
    }

    #[tokio::test]
    async fn test_exit_timeout_is_a_warning_with_timeout() {
        let lines = render(&[Event::new(EventKind::ExitTimeoutHit)
            .with_service("mailer")
            .with_workers(2)
            .with_timeout(Duration::from_secs(5))])
        .await;

        let line = line_with(&lines, "exit timeout hit");
        assert!(line.trim_start().starts_with("WARN"), "{line}");
        assert!(line.contains("workers=2"), "{line}");
        assert!(line.contains("timeout_ms=5000"), "{line}");
    }

    #[tokio::test]
    async fn test_every_kind_renders_one_record() {
        let events = [
            Event::new(EventKind::WorkerCountChanged).with_service("svc").with_workers(1),
            Event::new(EventKind::TaskError).with_service("svc").with_reason("boom"),
            Event::new(EventKind::ServiceStarted).with_service("svc"),
            Event::new(EventKind::StopRequested).with_service("svc").with_workers(0),
            Event::new(EventKind::ExitTimeoutHit).with_service("svc"),
            Event::new(EventKind::ServiceCompleted).with_service("svc"),
            Event::subscriber_overflow("audit", "full"),
            Event::subscriber_panicked("audit", "oops".into()),
        ];
        let lines = render(&events).await;
        assert_eq!(lines.len(), events.len(), "{lines:#?}");
        assert!(line_with(&lines, "worker count changed").trim_start().starts_with("DEBUG"));
        assert!(line_with(&lines, "service started").trim_start().starts_with("INFO"));
        assert_eq!(LogWriter::new().name(), "log-writer");
    }
}
