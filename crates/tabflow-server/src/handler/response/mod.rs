//! Response bodies returned by the handlers.

mod error_response;
mod monitors;
mod workflows;

pub use error_response::ErrorResponse;
pub use monitors::HealthResponse;
pub use workflows::{NodeTypesResponse, RunWorkflowResponse};
