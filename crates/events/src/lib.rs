//! Toonhub notice bus and delivery infrastructure.
//!
//! Building blocks for the notification fan-out path:
//!
//! - [`NoticeBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`Notice`] — the canonical outbound notice envelope.
//! - [`delivery`] — external delivery gateways (mobile push, Telegram).

pub mod bus;
pub mod delivery;

pub use bus::{Notice, NoticeBus, NoticeDirection, NoticeKind};
pub use delivery::push::{PushConfig, PushGateway, PushSender};
pub use delivery::telegram::{Bot, TelegramConfig, TelegramGateway, TelegramSender};
