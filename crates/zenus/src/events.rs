//! Requests and notifications the core sends to the host view.
//!
//! The view owns rendering; the core only tells it what happened. Events
//! travel over an unbounded tokio channel created by
//! [`crate::notebook::Notebook::new`]. Sending never fails from the core's
//! point of view: if the view dropped its receiver, events are discarded.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::model::{BlockId, SaveStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ViewEvent {
    /// Show a block's content full-screen. Markdown rendering is the view's job.
    PreviewOpen { title: String, content: String },
    PreviewClose,
    /// Select and scroll to `target`, reached through a `[[title]]` reference.
    NavigationRequest { title: String, target: BlockId },
    SaveStatusChanged { status: SaveStatus },
}

#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ViewEvent>,
}

impl EventSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: ViewEvent) {
        let _ = self.tx.send(event);
    }
}
