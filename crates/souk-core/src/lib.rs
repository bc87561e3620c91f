//! souk Core Library
//!
//! Shared domain types for souk.
//!
//! # Modules
//!
//! - [`role`] - The marketplace role enum and role-name matching rules

pub mod role;

pub use role::{ParseRoleError, Role};
