//! In-process notice bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`NoticeBus`] decouples the code that commits a state change (job
//! handlers, the chat session handler) from the fan-out dispatcher that
//! reaches the delivery channels. Publishing never blocks and never fails;
//! delivery problems belong entirely to the subscriber side.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use toonhub_core::types::DbId;

// ---------------------------------------------------------------------------
// Notice
// ---------------------------------------------------------------------------

/// The kind of a notice, persisted as its upper-case string form and carried
/// as the `type` field of bridge-channel envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeKind {
    /// A job was assigned to an employee.
    NewJob,
    /// An employee submitted a finished file.
    JobComplete,
    /// The employer sent a job back for revision.
    RevisionRequest,
    /// The employer attached an extra file to a job.
    FileAdded,
    /// A chat message arrived for the recipient.
    ChatMessage,
}

impl NoticeKind {
    /// The wire/storage string form.
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeKind::NewJob => "NEW_JOB",
            NoticeKind::JobComplete => "JOB_COMPLETE",
            NoticeKind::RevisionRequest => "REVISION_REQUEST",
            NoticeKind::FileAdded => "FILE_ADDED",
            NoticeKind::ChatMessage => "CHAT_MESSAGE",
        }
    }
}

/// Which way the notice travels, used to pick the Telegram channel: the
/// employee's personal notify chat or the employer's report chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoticeDirection {
    ToEmployee,
    ToEmployer,
}

/// A logical event addressed to one recipient, to be fanned out across the
/// bridge socket, mobile push, and Telegram.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub direction: NoticeDirection,
    /// The recipient's user id.
    pub target_user_id: DbId,
    pub title: String,
    pub body: String,
    /// Set for job-related notices.
    pub job_id: Option<DbId>,
    /// Set for chat notices.
    pub room_id: Option<DbId>,
}

impl Notice {
    /// A job notice addressed to `target_user_id`.
    pub fn job(
        kind: NoticeKind,
        direction: NoticeDirection,
        target_user_id: DbId,
        title: impl Into<String>,
        body: impl Into<String>,
        job_id: DbId,
    ) -> Self {
        Self {
            kind,
            direction,
            target_user_id,
            title: title.into(),
            body: body.into(),
            job_id: Some(job_id),
            room_id: None,
        }
    }

    /// A chat notice addressed to `target_user_id`.
    pub fn chat(
        direction: NoticeDirection,
        target_user_id: DbId,
        title: impl Into<String>,
        body: impl Into<String>,
        room_id: DbId,
    ) -> Self {
        Self {
            kind: NoticeKind::ChatMessage,
            direction,
            target_user_id,
            title: title.into(),
            body: body.into(),
            job_id: None,
            room_id: Some(room_id),
        }
    }

    /// The envelope pushed over the bridge socket.
    pub fn envelope(&self) -> serde_json::Value {
        let mut envelope = serde_json::json!({
            "type": self.kind.as_str(),
            "title": self.title,
            "body": self.body,
        });
        if let Some(job_id) = self.job_id {
            envelope["job_id"] = job_id.into();
        }
        if let Some(room_id) = self.room_id {
            envelope["room_id"] = room_id.into();
        }
        envelope
    }
}

// ---------------------------------------------------------------------------
// NoticeBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`Notice`]s.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published notice. Shared via `Arc<NoticeBus>`.
pub struct NoticeBus {
    sender: broadcast::Sender<Notice>,
}

impl NoticeBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed notices are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish a notice to all current subscribers.
    ///
    /// If there are no active subscribers the notice is silently dropped;
    /// delivery is best-effort by design.
    pub fn publish(&self, notice: Notice) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(notice);
    }

    /// Subscribe to all notices published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }
}

impl Default for NoticeBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = NoticeBus::default();
        let mut rx = bus.subscribe();

        bus.publish(Notice::job(
            NoticeKind::NewJob,
            NoticeDirection::ToEmployee,
            7,
            "New job",
            "Episode 5 of Tower of Dawn",
            42,
        ));

        let received = rx.recv().await.expect("should receive the notice");
        assert_eq!(received.kind, NoticeKind::NewJob);
        assert_eq!(received.target_user_id, 7);
        assert_eq!(received.job_id, Some(42));
        assert_eq!(received.room_id, None);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_notice() {
        let bus = NoticeBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Notice::chat(NoticeDirection::ToEmployer, 1, "t", "b", 9));

        assert_eq!(rx1.recv().await.unwrap().room_id, Some(9));
        assert_eq!(rx2.recv().await.unwrap().room_id, Some(9));
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = NoticeBus::default();
        bus.publish(Notice::chat(NoticeDirection::ToEmployee, 1, "t", "b", 1));
    }

    #[test]
    fn envelope_carries_kind_and_context_id() {
        let notice = Notice::job(
            NoticeKind::RevisionRequest,
            NoticeDirection::ToEmployee,
            3,
            "Revision needed",
            "Fix episode 2",
            11,
        );
        let envelope = notice.envelope();
        assert_eq!(envelope["type"], "REVISION_REQUEST");
        assert_eq!(envelope["job_id"], 11);
        assert!(envelope.get("room_id").is_none());

        let chat = Notice::chat(NoticeDirection::ToEmployer, 3, "t", "b", 4).envelope();
        assert_eq!(chat["type"], "CHAT_MESSAGE");
        assert_eq!(chat["room_id"], 4);
    }
}
