//! Progress and notification plumbing between the update worker and the foreground
//!
//! The orchestrator only ever talks to a [`ProgressSink`] and a [`Notifier`].
//! When it runs on a background task it is handed a [`ChannelReporter`], which
//! turns every call into an [`UpdateEvent`] on an unbounded channel. The
//! foreground drains that channel with [`pump_events`] and forwards each event
//! to the real display. The worker dropping its sender is the signal that the
//! stream has ended.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Completion state of the current step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Progress {
    /// Fraction complete, between 0.0 and 1.0
    Fraction(f64),

    /// Work is under way but its size is unknown
    Indeterminate,
}

/// Receives status text and completion updates
pub trait ProgressSink: Send + Sync {
    /// Human readable description of the current step
    fn on_status(&self, text: &str);

    /// Completion of the current step
    fn on_progress(&self, progress: Progress);
}

/// Importance of a user notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Fire-and-forget user notices
pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, message: &str, severity: Severity);
}

/// Message sent from the worker to the foreground
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    Status(String),
    Progress(Progress),
    Notice {
        title: String,
        message: String,
        severity: Severity,
    },
}

/// Worker-side sink and notifier that forwards everything over a channel
#[derive(Debug, Clone)]
pub struct ChannelReporter {
    sender: UnboundedSender<UpdateEvent>,
}

impl ChannelReporter {
    /// Create a reporter and the receiver the foreground should drain
    pub fn channel() -> (Self, UnboundedReceiver<UpdateEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: UpdateEvent) {
        // The foreground may already be gone during shutdown; nothing to do then.
        let _ = self.sender.send(event);
    }
}

impl ProgressSink for ChannelReporter {
    fn on_status(&self, text: &str) {
        self.send(UpdateEvent::Status(text.to_string()));
    }

    fn on_progress(&self, progress: Progress) {
        self.send(UpdateEvent::Progress(progress));
    }
}

impl Notifier for ChannelReporter {
    fn notify(&self, title: &str, message: &str, severity: Severity) {
        self.send(UpdateEvent::Notice {
            title: title.to_string(),
            message: message.to_string(),
            severity,
        });
    }
}

/// Forward events to the foreground display until every sender is dropped
///
/// Returns the number of events forwarded.
pub async fn pump_events(
    mut receiver: UnboundedReceiver<UpdateEvent>,
    sink: &dyn ProgressSink,
    notifier: &dyn Notifier,
) -> usize {
    let mut forwarded = 0;

    while let Some(event) = receiver.recv().await {
        match event {
            UpdateEvent::Status(text) => sink.on_status(&text),
            UpdateEvent::Progress(progress) => sink.on_progress(progress),
            UpdateEvent::Notice {
                title,
                message,
                severity,
            } => notifier.notify(&title, &message, severity),
        }
        forwarded += 1;
    }

    forwarded
}
