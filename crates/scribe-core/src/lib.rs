//! # Scribe Core
//!
//! The domain layer of the Scribe blog.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod service;

pub use error::DomainError;
pub use policy::can_modify;
pub use service::BlogService;
