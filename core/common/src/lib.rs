//! Common types shared across VaultFS modules.
//!
//! This module provides the error taxonomy and path types used by every
//! other crate in the workspace, ensuring consistency and type safety.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{AccessMode, VaultPath, VaultRoot};
