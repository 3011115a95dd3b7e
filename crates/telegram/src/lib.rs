//! Telegram Bot API integration: a typed client behind the
//! [`TelegramApi`] trait, and the availability-poll bridge that couples
//! services to their external polls.

pub mod availability;
pub mod client;
pub mod types;

pub use client::{BotApi, MockTelegramApi, TelegramApi};
