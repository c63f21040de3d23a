//! HTTP request extractors with improved error handling.
//!
//! - [`Multipart`]: `axum` multipart form extraction with JSON error responses
//! - [`WorkflowUpload`]: the `file` + `pipeline_json` form of a workflow run

mod multipart;
mod workflow_upload;

pub use crate::extract::multipart::Multipart;
pub use crate::extract::workflow_upload::{FILE_FIELD, PIPELINE_FIELD, WorkflowUpload};
