//! Canonical domain types for the directory data layer.

pub mod bot;
pub mod server;
pub mod status;

pub use bot::{Bot, BotCommand, BotDetails};
pub use server::{Protocol, Server};
pub use status::{BotStatus, ServerStatus};
