//! Error handling foundation for tablebot.
//!
//! Only the `Result` alias lives here. Each crate defines its own domain
//! error enums and reports them through rootcause, so a failure carries
//! the context of the layer that produced it.

use rootcause::Report;

/// A Result type alias using rootcause's Report for error handling.
pub type Result<T, C = ()> = std::result::Result<T, Report<C>>;
