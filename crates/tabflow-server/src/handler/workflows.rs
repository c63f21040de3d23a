//! Workflow execution and step discovery handlers.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::{get, post};
use tabflow_runtime::registry::NodeRegistry;

use crate::extract::WorkflowUpload;
use crate::handler::Result;
use crate::handler::response::{NodeTypesResponse, RunWorkflowResponse};
use crate::service::{ServiceState, WorkflowRunner};

/// Tracing target for workflow operations.
const TRACING_TARGET: &str = "tabflow_server::handler::workflows";

/// Runs an uploaded workflow over an uploaded file.
#[tracing::instrument(skip_all, fields(nodes = upload.definition.nodes.len()))]
async fn run_workflow(
    State(runner): State<WorkflowRunner>,
    upload: WorkflowUpload,
) -> Result<Json<RunWorkflowResponse>> {
    let WorkflowUpload {
        definition,
        payload,
    } = upload;

    tracing::debug!(
        target: TRACING_TARGET,
        file = payload.name.as_deref().unwrap_or("<unnamed>"),
        edges = definition.edges.len(),
        "Running workflow"
    );

    let outcome = runner.run(definition, payload).await?;

    tracing::info!(
        target: TRACING_TARGET,
        terminal = %outcome.terminal(),
        completed = outcome.order().len(),
        "Workflow run succeeded"
    );

    Ok(Json(outcome.into()))
}

/// Lists the step types workflows may use.
#[tracing::instrument(skip_all)]
async fn list_node_types(
    State(registry): State<Arc<NodeRegistry>>,
) -> Json<NodeTypesResponse> {
    tracing::debug!(
        target: TRACING_TARGET,
        node_types = registry.len(),
        "Listing node types"
    );

    Json(NodeTypesResponse::from(registry.as_ref()))
}

/// Returns a [`Router`] with all workflow routes.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/workflow/run", post(run_workflow))
        .route("/workflow/run/", post(run_workflow))
        .route("/workflow/nodes", get(list_node_types))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::{Value, json};

    use super::*;
    use crate::extract::{FILE_FIELD, PIPELINE_FIELD};
    use crate::handler::test::{create_test_server, create_test_server_with_state};
    use crate::service::ServiceConfig;

    const SALES_CSV: &str = "\
city,product,amount
Berlin,apple,10
Paris,pear,
Berlin,apple,10
Berlin,plum,7
Rome,apple,3
";

    fn form(csv: &'static str, pipeline: Value) -> MultipartForm {
        MultipartForm::new()
            .add_part(
                FILE_FIELD,
                Part::bytes(csv.as_bytes())
                    .file_name("sales.csv")
                    .mime_type("text/csv"),
            )
            .add_text(PIPELINE_FIELD, pipeline.to_string())
    }

    fn analysis_pipeline() -> Value {
        json!({
            "nodes": [
                { "id": "load", "type": "load_csv" },
                { "id": "clean", "type": "clean_data" },
                {
                    "id": "filter",
                    "type": "filter_rows",
                    "config": { "column": "city", "operator": "eq", "value": "Berlin" }
                },
                { "id": "stats", "type": "analyze_data" }
            ],
            "edges": [
                { "source": "load", "target": "clean" },
                { "source": "clean", "target": "filter" },
                { "source": "filter", "target": "stats" }
            ]
        })
    }

    #[tokio::test]
    async fn runs_builtin_analysis_pipeline() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server
            .post("/workflow/run")
            .multipart(form(SALES_CSV, analysis_pipeline()))
            .await;
        response.assert_status_ok();

        let body = response.json::<RunWorkflowResponse>();
        assert!(body.success);
        assert_eq!(body.terminal.as_str(), "stats");
        assert_eq!(
            body.order.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
            ["load", "clean", "filter", "stats"]
        );

        let summary = &body.result;
        assert_eq!(summary["row_count"], json!(2));
        assert_eq!(summary["column_count"], json!(3));
        assert_eq!(summary["duplicate_rows"], json!(0));
        assert_eq!(summary["columns"]["amount"]["mean"], json!(8.5));
        assert_eq!(summary["columns"]["amount"]["min"], json!(7));
        assert_eq!(summary["columns"]["amount"]["max"], json!(10));
        Ok(())
    }

    #[tokio::test]
    async fn accepts_editor_export_on_trailing_slash_route() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = json!({
            "nodes": [
                { "id": "dndnode_0", "type": "custom", "data": { "node_type": "load_csv" } },
                {
                    "id": "dndnode_1",
                    "type": "custom",
                    "data": { "node_type": "select_columns", "config": { "columns": ["product"] } }
                }
            ],
            "edges": [
                { "id": "e0-1", "source": "dndnode_0", "target": "dndnode_1" }
            ]
        });

        let response = server
            .post("/workflow/run/")
            .multipart(form(SALES_CSV, pipeline))
            .await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        assert_eq!(body["terminal"], "dndnode_1");
        assert_eq!(body["result"][0], json!({ "product": "apple" }));
        Ok(())
    }

    #[tokio::test]
    async fn closed_runner_refuses_new_runs() -> anyhow::Result<()> {
        let state = ServiceState::from_config(&ServiceConfig::default())?;
        state.runner().close();
        let server = create_test_server_with_state(state)?;

        let response = server
            .post("/workflow/run")
            .multipart(form(SALES_CSV, analysis_pipeline()))
            .await;
        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);

        let body = response.json::<Value>();
        assert_eq!(body["name"], "service_unavailable");
        Ok(())
    }

    #[tokio::test]
    async fn node_failure_names_the_node() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = json!({
            "nodes": [
                { "id": "load", "type": "load_csv" },
                { "id": "pick", "type": "select_columns", "config": { "columns": ["town"] } }
            ],
            "edges": [{ "source": "load", "target": "pick" }]
        });

        let response = server
            .post("/workflow/run")
            .multipart(form(SALES_CSV, pipeline))
            .await;
        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let body = response.json::<Value>();
        assert_eq!(body["name"], "workflow_failed");
        assert_eq!(body["failing_node_id"], "pick");
        assert_eq!(body["node_type"], "select_columns");
        assert!(body["message"].as_str().unwrap().contains("town"));
        Ok(())
    }

    #[tokio::test]
    async fn unknown_node_type_is_a_bad_request() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let pipeline = json!({
            "nodes": [{ "id": "a", "type": "pivot_table" }],
            "edges": []
        });

        let response = server
            .post("/workflow/run")
            .multipart(form(SALES_CSV, pipeline))
            .await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("pivot_table"));
        assert!(message.contains("load_csv"));
        assert!(body.get("failing_node_id").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_a_bad_request() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let form = MultipartForm::new().add_text(PIPELINE_FIELD, analysis_pipeline().to_string());

        let response = server.post("/workflow/run").multipart(form).await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        assert_eq!(body["resource"], FILE_FIELD);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_pipeline_is_a_bad_request() -> anyhow::Result<()> {
        let server = create_test_server()?;
        let form = MultipartForm::new()
            .add_part(FILE_FIELD, Part::bytes(SALES_CSV.as_bytes()).file_name("sales.csv"))
            .add_text(PIPELINE_FIELD, "{ not json");

        let response = server.post("/workflow/run").multipart(form).await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        assert_eq!(body["resource"], PIPELINE_FIELD);
        Ok(())
    }

    #[tokio::test]
    async fn lists_builtin_node_types() -> anyhow::Result<()> {
        let server = create_test_server()?;

        let response = server.get("/workflow/nodes").await;
        response.assert_status_ok();

        let body = response.json::<Value>();
        let types: Vec<_> = body["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|node| node["type"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(
            types,
            [
                "analyze_data",
                "clean_data",
                "concat_rows",
                "filter_rows",
                "load_csv",
                "select_columns",
                "write_csv"
            ]
        );
        Ok(())
    }
}
