//! Data models for the roster sync backend.
//!
//! Field names serialize in camelCase so that snapshots written by the web
//! client and by this backend are interchangeable.

mod employee;
mod manifest;
mod package;

pub use employee::*;
pub use manifest::*;
pub use package::*;
