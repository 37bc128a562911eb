//! # Scribe Shared
//!
//! Wire types shared by the server and anything that talks to it:
//! the HTML form payloads and the problem-details error body.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
