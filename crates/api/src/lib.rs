//! # Laudo API
//!
//! Shared services and wire types for the Laudo report intake API.
//!
//! Contains:
//! - Request and response bodies with `utoipa` schemas (`reports`, `health`)
//! - The `ReportIntake` service that validates and stores submissions
//! - Authentication utilities (token and user identity checks)
//!
//! Used by the `laudo-run` REST binary for common functionality; nothing in
//! this crate depends on a specific HTTP framework.

pub mod auth;
pub mod health;
pub mod reports;

pub use health::{HealthRes, HealthService};
pub use reports::{
    CreateReportReq, CreateReportRes, ErrorRes, IntakeError, IssueRes, ListTemplatesRes,
    ReportIntake, StoredReport,
};
