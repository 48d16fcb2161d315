//! # cfy-core
//!
//! Core types and error types for the Compifly session core.
//!
//! This crate provides the types shared across all Compifly crates:
//! - `Identity`, the principal returned by a credential provider
//! - `ProfileDocument`, the application profile keyed by identity uid
//! - `SessionState` and its payload-free `SessionStatus` state machine
//! - `Route`, the navigation targets the app knows about
//! - Cross-cutting error types

pub mod errors;
pub mod identity;
pub mod profile;
pub mod route;
pub mod session;

pub use errors::CoreError;
pub use identity::{Identity, ProviderKind};
pub use profile::ProfileDocument;
pub use route::Route;
pub use session::{SessionState, SessionStatus};
