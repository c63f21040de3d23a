use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// HTTP error response representation.
///
/// Every error the server returns is serialized through this one shape. Run
/// failures additionally name the node that aborted the run.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier
    pub name: Cow<'a, str>,
    /// User-friendly error message safe for client display
    pub message: Cow<'a, str>,
    /// The request part the error relates to (optional, set by handler)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Cow<'a, str>>,
    /// Additional detail for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
    /// ID of the node that aborted the run (run failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failing_node_id: Option<Cow<'a, str>>,
    /// Step type of the node that aborted the run (run failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Cow<'a, str>>,
    /// HTTP status code (not serialized in JSON)
    #[serde(skip)]
    pub status: StatusCode,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const PAYLOAD_TOO_LARGE: Self = Self::new(
        "payload_too_large",
        "The uploaded content exceeds the allowed size",
        StatusCode::PAYLOAD_TOO_LARGE,
    );
    pub const UNPROCESSABLE_ENTITY: Self = Self::new(
        "workflow_failed",
        "The workflow failed while running",
        StatusCode::UNPROCESSABLE_ENTITY,
    );
    // 5xx Server Errors
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "The service is not accepting new workflow runs",
        StatusCode::SERVICE_UNAVAILABLE,
    );
    pub const GATEWAY_TIMEOUT: Self = Self::new(
        "gateway_timeout",
        "The request took too long to process",
        StatusCode::GATEWAY_TIMEOUT,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            resource: None,
            context: None,
            failing_node_id: None,
            node_type: None,
            status,
        }
    }

    /// Creates a new error response with custom resource.
    /// If a resource already exists, it merges them with a separator.
    pub fn with_resource(mut self, resource: impl Into<Cow<'a, str>>) -> Self {
        let new_resource = resource.into();
        self.resource = Some(match self.resource {
            Some(existing) => Cow::Owned(format!("{}/{}", existing, new_resource)),
            None => new_resource,
        });
        self
    }

    /// Creates a new error response with custom message.
    /// Appends the new message to the existing message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        let new_message = message.into();
        self.message = Cow::Owned(format!("{}: {}", self.message, new_message));
        self
    }

    /// Attaches context to the error response.
    /// If context already exists, it merges them with a separator.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }

    /// Names the node that aborted the run.
    pub fn with_failing_node(
        mut self,
        node_id: impl Into<Cow<'a, str>>,
        node_type: impl Into<Cow<'a, str>>,
    ) -> Self {
        self.failing_node_id = Some(node_id.into());
        self.node_type = Some(node_type.into());
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_response_merging_resource() {
        let response = ErrorResponse::BAD_REQUEST
            .with_resource("workflow")
            .with_resource("pipeline_json");

        assert_eq!(response.resource.as_deref(), Some("workflow/pipeline_json"));
    }

    #[test]
    fn error_response_merging_message() {
        let response = ErrorResponse::BAD_REQUEST.with_message("Missing uploaded file");

        assert_eq!(
            &response.message,
            "The request could not be processed due to invalid data: Missing uploaded file"
        );
    }

    #[test]
    fn error_response_merging_context() {
        let response = ErrorResponse::INTERNAL_SERVER_ERROR
            .with_context("Worker thread panicked")
            .with_context("Run aborted");

        assert_eq!(
            response.context.as_deref(),
            Some("Worker thread panicked; Run aborted")
        );
    }

    #[test]
    fn error_response_serialization() {
        let response = ErrorResponse::UNPROCESSABLE_ENTITY
            .with_message("node b (double) failed: boom")
            .with_failing_node("b", "double");

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["name"], "workflow_failed");
        assert_eq!(json["failing_node_id"], "b");
        assert_eq!(json["node_type"], "double");
        assert!(json.get("resource").is_none());
        assert!(json.get("status").is_none());
    }
}
