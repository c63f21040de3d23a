//! Extraction of a workflow run request from a multipart form.

use axum::extract::{FromRequest, Request};
use tabflow_runtime::definition::WorkflowDefinition;
use tabflow_runtime::node::Payload;

use crate::extract::Multipart;
use crate::handler::{Error, ErrorKind};

/// Form field carrying the uploaded file.
pub const FILE_FIELD: &str = "file";

/// Form field carrying the workflow definition as JSON text.
pub const PIPELINE_FIELD: &str = "pipeline_json";

/// Tracing target for upload extraction.
const TRACING_TARGET: &str = "tabflow_server::extract::workflow_upload";

/// A workflow definition together with the file it runs over.
///
/// Read from a `multipart/form-data` body with a `file` field (the payload;
/// its file name and content type are kept) and a `pipeline_json` field.
/// Other fields are ignored.
#[derive(Debug, Clone)]
pub struct WorkflowUpload {
    /// The parsed workflow definition.
    pub definition: WorkflowDefinition,
    /// The uploaded file.
    pub payload: Payload,
}

impl<S> FromRequest<S> for WorkflowUpload
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut payload = None;
        let mut pipeline = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some(FILE_FIELD) => {
                    let file_name = field.file_name().map(str::to_owned);
                    let content_type = field.content_type().map(str::to_owned);
                    let bytes = field.bytes().await?;

                    let mut file = Payload::new(bytes);
                    if let Some(file_name) = file_name {
                        file = file.with_name(file_name);
                    }
                    if let Some(content_type) = content_type {
                        file = file.with_content_type(content_type);
                    }
                    payload = Some(file);
                }
                Some(PIPELINE_FIELD) => {
                    pipeline = Some(field.text().await?);
                }
                other => {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        field = other.unwrap_or("<unnamed>"),
                        "Skipping unexpected form field"
                    );
                }
            }
        }

        let payload = payload.ok_or_else(|| {
            ErrorKind::BadRequest
                .with_message("Missing uploaded file")
                .with_resource(FILE_FIELD)
        })?;

        let pipeline = pipeline.ok_or_else(|| {
            ErrorKind::BadRequest
                .with_message("Missing workflow definition")
                .with_resource(PIPELINE_FIELD)
        })?;

        let definition = WorkflowDefinition::from_json(&pipeline).map_err(|err| {
            ErrorKind::BadRequest
                .with_message("Invalid workflow definition")
                .with_context(err.to_string())
                .with_resource(PIPELINE_FIELD)
        })?;

        tracing::debug!(
            target: TRACING_TARGET,
            file = payload.name.as_deref().unwrap_or("<unnamed>"),
            bytes = payload.len(),
            nodes = definition.nodes.len(),
            edges = definition.edges.len(),
            "Workflow upload extracted"
        );

        Ok(Self {
            definition,
            payload,
        })
    }
}
