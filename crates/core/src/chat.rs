//! Chat message vocabulary.
//!
//! The wire protocol and the `chat_messages.message_type` column both carry
//! a loosely-typed string; this module pins it to a closed set at the
//! application boundary. Unknown tags are rejected on ingress and ignored by
//! the session handler rather than propagated.

use crate::types::DbId;

/// A persistable chat message type.
///
/// `delete` is deliberately absent: it exists only as an inbound wire frame
/// and an outbound broadcast event, never as a stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Text,
    Image,
    File,
    /// Synthetic message summarizing a job, inserted when a participant
    /// opens the conversation "about" a specific job.
    Context,
}

impl MessageType {
    /// The string stored in `chat_messages.message_type`.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::File => "file",
            MessageType::Context => "context",
        }
    }

    /// Parse an inbound tag. Returns `None` for unknown tags so callers can
    /// drop the frame without tearing the session down.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            "image" => Some(MessageType::Image),
            "file" => Some(MessageType::File),
            "context" => Some(MessageType::Context),
            _ => None,
        }
    }

    /// Whether the message content is a blob-store key that must be cleaned
    /// up when the room is deleted.
    pub fn is_attachment(self) -> bool {
        matches!(self, MessageType::Image | MessageType::File)
    }
}

/// Build the content of a `context` message for a job.
///
/// The format is parsed by clients to render a tappable job card:
/// `CONTEXT:<comic title> (Ep <episode>)::<job id>`.
pub fn context_content(comic_title: &str, episode_number: i32, job_id: DbId) -> String {
    format!("CONTEXT:{comic_title} (Ep {episode_number})::{job_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_round_trip() {
        for t in [
            MessageType::Text,
            MessageType::Image,
            MessageType::File,
            MessageType::Context,
        ] {
            assert_eq!(MessageType::parse(t.as_str()), Some(t));
        }
    }

    #[test]
    fn unknown_and_non_persistable_tags_are_none() {
        assert_eq!(MessageType::parse("delete"), None);
        assert_eq!(MessageType::parse("sticker"), None);
        assert_eq!(MessageType::parse(""), None);
    }

    #[test]
    fn only_image_and_file_are_attachments() {
        assert!(MessageType::Image.is_attachment());
        assert!(MessageType::File.is_attachment());
        assert!(!MessageType::Text.is_attachment());
        assert!(!MessageType::Context.is_attachment());
    }

    #[test]
    fn context_content_embeds_title_episode_and_job_id() {
        let content = context_content("Tower of Dawn", 12, 77);
        assert_eq!(content, "CONTEXT:Tower of Dawn (Ep 12)::77");
    }
}
