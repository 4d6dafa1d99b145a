//! Toast notifications. Independent of every other component.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::clock::Clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    pub fn icon(self) -> &'static str {
        match self {
            ToastKind::Success => "✅",
            ToastKind::Error => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub message: String,
}

pub struct NotificationCenter {
    clock: Arc<dyn Clock>,
    hide_after: Duration,
    next_id: AtomicU64,
    current: watch::Sender<Option<Toast>>,
    posted: broadcast::Sender<Toast>,
}

impl NotificationCenter {
    pub fn new(clock: Arc<dyn Clock>, hide_after: Duration) -> Self {
        let (current, _) = watch::channel(None);
        let (posted, _) = broadcast::channel(64);
        Self {
            clock,
            hide_after,
            next_id: AtomicU64::new(1),
            current,
            posted,
        }
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Success, title, message, self.hide_after)
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.show(ToastKind::Error, title, message, self.hide_after)
    }

    /// Replaces whatever toast is showing and hides the new one after
    /// `visible_for`, unless another toast replaced it first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(
        &self,
        kind: ToastKind,
        title: impl Into<String>,
        message: impl Into<String>,
        visible_for: Duration,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut title = title.into();
        if title.is_empty() {
            title = match kind {
                ToastKind::Success => "Success".to_string(),
                ToastKind::Error => "Error".to_string(),
            };
        }
        let toast = Toast {
            id,
            kind,
            title,
            message: message.into(),
        };
        debug!(toast_id = id, kind = ?toast.kind, title = %toast.title, "toast shown");

        let _ = self.posted.send(toast.clone());
        self.current.send_replace(Some(toast));

        let current = self.current.clone();
        let sleep = self.clock.sleep(visible_for);
        tokio::spawn(async move {
            sleep.await;
            current.send_if_modified(|shown| match shown {
                Some(toast) if toast.id == id => {
                    *shown = None;
                    true
                }
                _ => false,
            });
        });

        id
    }

    pub fn dismiss(&self) {
        self.current.send_if_modified(|shown| shown.take().is_some());
    }

    pub fn current(&self) -> Option<Toast> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Toast>> {
        self.current.subscribe()
    }

    /// Every toast ever posted, in order, including ones replaced before
    /// anybody looked at the current slot.
    pub fn subscribe_posted(&self) -> broadcast::Receiver<Toast> {
        self.posted.subscribe()
    }
}
