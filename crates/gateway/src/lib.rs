//! HTTP gateway for the skills catalog.
//!
//! Exposes repository submission, skill listing, repository tree browsing,
//! skill archive download, and the metadata backfill trigger.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod submission;

pub use {
    error::ApiError,
    server::{build_app, run},
    state::AppState,
    submission::{SubmitError, submit_repository},
};
