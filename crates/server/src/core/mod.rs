//! Core Service Layer
//!
//! Shared infrastructure for the handlers: errors, form extraction and the
//! router.

pub mod error;
pub mod form;
pub mod router;

pub use error::{Error, Result};
pub use form::FormFields;
pub use router::router;
