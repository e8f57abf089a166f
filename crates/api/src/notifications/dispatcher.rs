//! Notice-to-channel fan-out engine.
//!
//! [`NoticeDispatcher`] subscribes to the notice bus and delivers each
//! notice to its recipient over three channels: the live bridge socket,
//! batched mobile push, and Telegram. The channels are independent -- a
//! failure in one is logged with enough context to diagnose and never
//! touches the others, and the state change that triggered the notice is
//! already committed by the time the dispatcher sees it. There is no retry
//! queue; delivery is fire-and-forget.
//!
//! Telegram messages additionally consult the recipient's last-notice mark:
//! when the same kind arrives back-to-back the repeated header is dropped
//! and only the body is sent. The mark is keyed per recipient and is
//! persisted only after a successful send, so a failed delivery leaves the
//! next message with its full header.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::broadcast;
use toonhub_db::repositories::{DeviceRepo, EmployeeRepo, NotificationMarkRepo, UserRepo};
use toonhub_db::DbPool;
use toonhub_events::delivery::push::PushGateway;
use toonhub_events::delivery::telegram::TelegramGateway;
use toonhub_events::{Bot, Notice, NoticeDirection, NoticeKind};

use crate::ws::UserHub;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Fans notices out to the three delivery channels.
pub struct NoticeDispatcher {
    pool: DbPool,
    user_hub: Arc<UserHub>,
    push: Arc<dyn PushGateway>,
    telegram: Arc<dyn TelegramGateway>,
}

impl NoticeDispatcher {
    pub fn new(
        pool: DbPool,
        user_hub: Arc<UserHub>,
        push: Arc<dyn PushGateway>,
        telegram: Arc<dyn TelegramGateway>,
    ) -> Self {
        Self {
            pool,
            user_hub,
            push,
            telegram,
        }
    }

    /// Run the main fan-out loop.
    ///
    /// Subscribes to the notice bus via `receiver` and processes each
    /// notice. The loop exits when the channel is closed (i.e. the
    /// [`NoticeBus`](toonhub_events::NoticeBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<Notice>) {
        loop {
            match receiver.recv().await {
                Ok(notice) => self.dispatch(&notice).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notice dispatcher lagged, notices were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Notice bus closed, dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Deliver one notice across all channels, isolating failures.
    pub async fn dispatch(&self, notice: &Notice) {
        // 1. Live bridge sockets. No open session is fine.
        let sessions = self
            .user_hub
            .send_to_user(notice.target_user_id, &notice.envelope())
            .await;
        tracing::debug!(
            target = notice.target_user_id,
            kind = notice.kind.as_str(),
            sessions,
            "Bridge delivery"
        );

        // 2. Mobile push: one batched call per notice, not per device.
        if let Err(e) = self.deliver_push(notice).await {
            tracing::warn!(
                target = notice.target_user_id,
                kind = notice.kind.as_str(),
                error = %e,
                "Push delivery failed"
            );
        }

        // 3. Telegram, with per-recipient header dedup.
        if let Err(e) = self.deliver_telegram(notice).await {
            tracing::warn!(
                target = notice.target_user_id,
                kind = notice.kind.as_str(),
                error = %e,
                "Telegram delivery failed"
            );
        }
    }

    async fn deliver_push(&self, notice: &Notice) -> Result<(), BoxError> {
        let tokens = DeviceRepo::active_tokens(&self.pool, notice.target_user_id).await?;
        if tokens.is_empty() {
            return Ok(());
        }

        let mut data = HashMap::new();
        data.insert("type".to_string(), notice.kind.as_str().to_string());
        if let Some(job_id) = notice.job_id {
            data.insert("job_id".to_string(), job_id.to_string());
        }
        if let Some(room_id) = notice.room_id {
            data.insert("room_id".to_string(), room_id.to_string());
        }

        self.push
            .send_batch(&tokens, &notice.title, &notice.body, &data)
            .await?;
        Ok(())
    }

    async fn deliver_telegram(&self, notice: &Notice) -> Result<(), BoxError> {
        // Employer->employee traffic goes to the employee's personal notify
        // chat; employee->employer traffic to the employer's report chat.
        let (chat_id, bot) = match notice.direction {
            NoticeDirection::ToEmployee => {
                let chat_id = EmployeeRepo::find_by_user_id(&self.pool, notice.target_user_id)
                    .await?
                    .and_then(|e| e.telegram_chat_id);
                (chat_id, Bot::Notify)
            }
            NoticeDirection::ToEmployer => {
                let chat_id = UserRepo::report_chat_id(&self.pool, notice.target_user_id).await?;
                (chat_id, Bot::Report)
            }
        };

        // No linked chat: nothing to do.
        let Some(chat_id) = chat_id else {
            return Ok(());
        };

        let last_kind = NotificationMarkRepo::last_kind(&self.pool, notice.target_user_id).await?;
        let text = compose_telegram_text(
            &notice.title,
            &notice.body,
            notice.kind,
            last_kind.as_deref(),
        );

        self.telegram.send(&chat_id, &text, bot).await?;

        // Mark only after the send went through; a failed delivery must not
        // abbreviate the next message's header.
        NotificationMarkRepo::set_last_kind(&self.pool, notice.target_user_id, notice.kind.as_str())
            .await?;
        Ok(())
    }
}

/// Compose the Telegram message body.
///
/// When the recipient's immediately preceding notice was of the same kind,
/// the repeated header is dropped and only the body is sent; otherwise the
/// full `*title* body` form is used.
fn compose_telegram_text(
    title: &str,
    body: &str,
    kind: NoticeKind,
    last_kind: Option<&str>,
) -> String {
    if last_kind == Some(kind.as_str()) {
        body.to_string()
    } else {
        format!("*{title}* {body}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_notice_gets_the_full_header() {
        let text = compose_telegram_text("New job!", "Episode 5", NoticeKind::NewJob, None);
        assert_eq!(text, "*New job!* Episode 5");
    }

    #[test]
    fn repeat_of_same_kind_drops_the_header() {
        let text = compose_telegram_text(
            "Revision needed",
            "Fix episode 2",
            NoticeKind::RevisionRequest,
            Some("REVISION_REQUEST"),
        );
        assert_eq!(text, "Fix episode 2");
    }

    #[test]
    fn different_preceding_kind_keeps_the_header() {
        let text = compose_telegram_text(
            "Revision needed",
            "Fix episode 2",
            NoticeKind::RevisionRequest,
            Some("NEW_JOB"),
        );
        assert_eq!(text, "*Revision needed* Fix episode 2");
    }
}
