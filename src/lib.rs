// Pages Client - multi-identity page client with local/remote reconciliation

// Core types and primitives
pub mod core;

// Page schema system: field definitions, validators and the registry
pub mod ent_schema;

// Schema Definitions - one schema per page type
pub mod schemas;

// Entities - pages and their sub-resources
pub mod entities;

// Infrastructure - remote client, snapshot cache, storage and collaborator traits
pub mod infrastructure;

// Services - reconciliation engine, sub-resource stores, controllers
pub mod services;

// Common utilities
pub mod app_state;
pub mod config;
pub mod error;

// In-memory doubles shared by unit and integration tests
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

// Re-exports for convenience
pub use crate::core::{PageId, PageType};
pub use error::{AppError, AppResult, RemoteError, RemoteErrorKind};
pub use services::{EditOutcome, IdentitySwitcher, MergedView, PageController, SubResourceStore};
