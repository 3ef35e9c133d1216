//! Shared types, errors, and configuration for Ledgerline.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes and cent rounding on `Decimal`
//! - Typed IDs for type-safe entity references
//! - Limit/offset pagination for list operations
//! - The stable error classification surfaced to callers
//! - Configuration management
//! - SMTP email transport

pub mod config;
pub mod email;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use email::{EmailError, EmailService};
pub use error::{AppError, AppResult};
