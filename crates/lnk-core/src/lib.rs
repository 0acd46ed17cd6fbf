//! Core domain + application logic for the link-shortening chat bot.
//!
//! This crate is framework-agnostic. The chat platform, the shortening API and
//! the metadata probe live behind ports (traits) implemented in adapter crates.

pub mod alias;
pub mod bot;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod filename;
pub mod formatting;
pub mod links;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod security;
pub mod shorten;

pub use errors::{Error, Result};
