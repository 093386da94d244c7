//! # rig-core
//!
//! Core types and error types for scanrig.
//!
//! This crate provides the foundational types shared across all scanrig crates:
//! - Entity structs for the analysis model (targets, profiles, issues, measures)
//! - Build/session outcomes captured from external processes
//! - Server version parsing and capability facts used to gate expectations
//! - The scan session state enum with its allowed transitions
//! - Project key validation
//! - Cross-cutting error types

pub mod capability;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod identity;
pub mod version;

pub use capability::{Feature, ScannerInfo, ServerCapability};
pub use errors::CoreError;
pub use identity::ProjectKey;
pub use version::ServerVersion;
