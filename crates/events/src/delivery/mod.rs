//! External delivery gateways for outbound notices.
//!
//! This module provides the mobile-push and Telegram senders used by the
//! notification dispatcher to reach recipients outside the app.

pub mod push;
pub mod telegram;
