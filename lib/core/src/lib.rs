//! Core types and utilities shared by the tablebot crates.
//!
//! This crate provides the `Result` alias used for rootcause-based error
//! propagation and the strongly-typed identifiers for chat sessions and
//! the turns within them.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ParseIdError, SessionId, TurnId};
