//! Outbound interaction channel.
//!
//! Extensions that collect user input report it back to the host through an
//! [`InteractionChannel`] passed into every `render` call. The host decides
//! what a report means (usually: resume the conversation with it).
//!
//! ```ignore
//! let channel: Arc<dyn InteractionChannel> = Arc::new(FnChannel::new(|report| {
//!     host.resume(report);
//! }));
//! registry.dispatch(&trace, &mut container, &channel);
//! ```

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::info;

/// A structured message sent back to the host after user input.
///
/// Serializes as `{"type": "complete", "payload": {"selectedOption": "..."}}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InteractionReport {
    /// The user completed a choice.
    Complete {
        #[serde(rename = "selectedOption")]
        selected_option: String,
    },
}

impl InteractionReport {
    pub fn complete(selected_option: impl Into<String>) -> Self {
        Self::Complete {
            selected_option: selected_option.into(),
        }
    }
}

/// Host callback surface for interaction reports.
///
/// Delivery is fire-and-forget: implementations must not fail back into the
/// extension, and reports are never retried.
pub trait InteractionChannel: Send + Sync {
    fn interact(&self, report: InteractionReport);
}

/// Discards every report.
pub struct NoopChannel;

impl InteractionChannel for NoopChannel {
    fn interact(&self, _report: InteractionReport) {}
}

/// A channel backed by a closure.
///
/// # Example
///
/// ```
/// use chatext::channel::{FnChannel, InteractionChannel, InteractionReport};
///
/// let channel = FnChannel::new(|report| println!("{report:?}"));
/// channel.interact(InteractionReport::complete("Yes"));
/// ```
pub struct FnChannel<F>(F)
where
    F: Fn(InteractionReport) + Send + Sync;

impl<F> FnChannel<F>
where
    F: Fn(InteractionReport) + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> InteractionChannel for FnChannel<F>
where
    F: Fn(InteractionReport) + Send + Sync,
{
    fn interact(&self, report: InteractionReport) {
        (self.0)(report)
    }
}

/// Collects reports in memory for later inspection.
///
/// Cloning shares the underlying buffer.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    reports: Arc<Mutex<Vec<InteractionReport>>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every report received so far, in order.
    pub fn reports(&self) -> Vec<InteractionReport> {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Remove and return every report received so far.
    pub fn take(&self) -> Vec<InteractionReport> {
        let mut reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *reports)
    }

    pub fn len(&self) -> usize {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InteractionChannel for RecordingChannel {
    fn interact(&self, report: InteractionReport) {
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(report);
    }
}

/// Logs each report at INFO level, then forwards it to an inner channel.
pub struct LoggingChannel<C: InteractionChannel> {
    inner: C,
}

impl<C: InteractionChannel> LoggingChannel<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }
}

impl<C: InteractionChannel> InteractionChannel for LoggingChannel<C> {
    fn interact(&self, report: InteractionReport) {
        match &report {
            InteractionReport::Complete { selected_option } => {
                info!("Interaction complete: selectedOption={selected_option:?}");
            }
        }
        self.inner.interact(report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_wire_format() {
        let report = InteractionReport::complete("No");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "complete", "payload": {"selectedOption": "No"}})
        );

        let back: InteractionReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn recording_channel_shares_buffer_across_clones() {
        let channel = RecordingChannel::new();
        let clone = channel.clone();
        clone.interact(InteractionReport::complete("A"));
        assert_eq!(channel.len(), 1);
        assert_eq!(channel.take(), vec![InteractionReport::complete("A")]);
        assert!(clone.is_empty());
    }

    #[test]
    fn recording_channel_survives_poisoned_lock() {
        let recorder = RecordingChannel::new();
        let shared = recorder.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.reports.lock().unwrap();
            panic!("host callback died holding the lock");
        })
        .join();
        assert!(recorder.reports.is_poisoned());

        recorder.interact(InteractionReport::complete("Yes"));
        assert_eq!(recorder.len(), 1);
        assert_eq!(recorder.take(), vec![InteractionReport::complete("Yes")]);
        assert!(recorder.is_empty());
    }

    #[test]
    fn fn_channel_forwards_reports() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let channel = FnChannel::new(move |r| sink.lock().unwrap().push(r));
        channel.interact(InteractionReport::complete("B"));
        assert_eq!(*seen.lock().unwrap(), vec![InteractionReport::complete("B")]);
    }

    #[test]
    fn logging_channel_forwards_to_inner() {
        let recorder = RecordingChannel::new();
        let channel = LoggingChannel::new(recorder.clone());
        channel.interact(InteractionReport::complete("C"));
        assert_eq!(recorder.reports(), vec![InteractionReport::complete("C")]);
    }

    #[test]
    fn noop_channel_accepts_reports() {
        NoopChannel.interact(InteractionReport::complete("ignored"));
    }
}
