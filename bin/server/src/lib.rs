//! tablebot HTTP server.
//!
//! Serves the chat endpoint backed by one dialogue engine per session,
//! plus a weather lookup and a health probe.

pub mod api;
pub mod config;
pub mod error;
pub mod session;

#[cfg(test)]
mod testing;
