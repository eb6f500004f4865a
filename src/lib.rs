//! Radmin Bot Library
//!
//! A Telegram bot that routes slash commands to registered handlers.
//!
//! This crate provides the core functionality for:
//! - Declaring commands and collecting them into a per-bot registry
//! - Gating privileged commands behind an admin allow-list
//! - Dispatching inbound messages to command handlers
//! - Long-polling the Telegram Bot API for updates
//! - Reporting host status

pub mod bot;
pub mod commands;
pub mod config;
pub mod poller;
pub mod system;
pub mod telegram;

pub use bot::Bot;
