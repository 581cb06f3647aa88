//! Common types and utilities for the wallet account platform
//!
//! This library contains shared types, utilities, and abstractions used by
//! the account service and its collaborators. It provides a unified approach
//! to error handling, database access, and domain models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod db;

/// Re-export important types
pub use error::{Error, ErrorKind, Result, ErrorExt};
pub use decimal::*;
