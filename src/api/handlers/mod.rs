//! HTTP request handlers.
//!
//! - [`images`]: the `/image` upload relay
//! - [`chat`]: the `/chat` question relay
//!
//! Handlers return [`crate::errors::Error`] which converts to the appropriate
//! status code and `{"error": ...}` JSON body.

pub mod chat;
pub mod images;
