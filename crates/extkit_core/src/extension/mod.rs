//! Extension manifest contracts.
//!
//! This module defines the declarative description of an extension bundle and
//! the catalog it is loaded from. Applying a manifest lives in `executor`.

pub mod catalog;
pub mod manifest;
