//! share-paste: paste text, get a short link.
//!
//! A small pastebin. Shares are addressed by random slugs, grouped by a
//! cookie-identified session, and optionally gated by a plaintext password.

pub mod config;
pub mod ids;
pub mod logging;
pub mod server;
pub mod session;
pub mod share_service;
pub mod storage;
