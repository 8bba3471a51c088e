// HTTP surface: thin axum glue over the cache and the analysis pipeline.

use crate::analyzer;
use crate::cache::DatasetCache;
use crate::loader;
use crate::model::{AnalyzeError, AnalyzeResponse, UploadError};
use axum::Router;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

const UPLOAD_LIMIT_BYTES: usize = 20 * 1024 * 1024;
const SPREADSHEET_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DatasetCache>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/upload", post(upload))
        .route("/api/analyze", post(analyze))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    query: String,
}

async fn analyze(State(state): State<AppState>, Json(request): Json<AnalyzeRequest>) -> Response {
    if request.query.trim().is_empty() {
        return analyze_error(AnalyzeError::MissingQuery);
    }

    let Some(table) = state.cache.get().await else {
        return analyze_error(AnalyzeError::NoData);
    };

    match analyzer::run_analysis(&table, &request.query) {
        Ok(analysis) => Json(AnalyzeResponse {
            summary: analysis.summaries,
            chart_data: analysis.chart_data,
            table_data: analysis.table_data,
        })
        .into_response(),
        Err(err) => analyze_error(err),
    }
}

fn analyze_error(err: AnalyzeError) -> Response {
    let status = match err {
        AnalyzeError::NoData => StatusCode::INTERNAL_SERVER_ERROR,
        AnalyzeError::MissingQuery | AnalyzeError::NoMatch(_) => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "summary": err.to_string() }))).into_response()
}

async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, Vec<u8>)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("file") {
                    continue;
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => file = Some((filename, bytes.to_vec())),
                    Err(err) => {
                        warn!("Failed to read upload body: {err}");
                        return upload_error(UploadError::MissingFile);
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                warn!("Malformed multipart request: {err}");
                return upload_error(UploadError::MissingFile);
            }
        }
    }

    let Some((filename, bytes)) = file else {
        return upload_error(UploadError::MissingFile);
    };

    if !SPREADSHEET_EXTENSIONS
        .iter()
        .any(|ext| filename.ends_with(ext))
    {
        return upload_error(UploadError::InvalidFormat);
    }

    match loader::load_from_bytes(&bytes) {
        Ok(table) => {
            info!("Uploaded dataset '{}': {} rows", filename, table.rows.len());
            state.cache.replace(table).await;
            Json(json!({ "message": "File uploaded successfully." })).into_response()
        }
        Err(err) => {
            // The previously cached table stays visible.
            warn!("Failed to parse uploaded workbook: {err}");
            upload_error(UploadError::Parse(err))
        }
    }
}

fn upload_error(err: UploadError) -> Response {
    let status = match err {
        UploadError::Parse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        UploadError::MissingFile | UploadError::InvalidFormat => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}

async fn health(State(state): State<AppState>) -> Response {
    let loaded_at = state.cache.loaded_at().await;
    Json(json!({
        "status": "ok",
        "datasetLoaded": loaded_at.is_some(),
        "loadedAt": loaded_at.map(|t| t.to_rfc3339()),
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, Table};
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        AppState {
            cache: Arc::new(DatasetCache::new()),
        }
    }

    async fn loaded_state() -> AppState {
        let state = test_state();
        let table = Table {
            columns: vec![
                "final_location".into(),
                "year".into(),
                "demand".into(),
                "rate".into(),
            ],
            rows: vec![
                vec![
                    Cell::Text("pune".into()),
                    Cell::Number(2021.0),
                    Cell::Number(10.0),
                    Cell::Number(1000.0),
                ],
                vec![
                    Cell::Text("pune".into()),
                    Cell::Number(2022.0),
                    Cell::Number(12.0),
                    Cell::Number(1100.0),
                ],
            ],
        };
        state.cache.replace(table).await;
        state
    }

    fn analyze_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Hand-built multipart body with a single file field.
    fn multipart_request(filename: &str, content: &[u8]) -> Request<Body> {
        let boundary = "----TestBoundary1234567890";
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn analyze_rejects_missing_query() {
        let app = router(test_state());
        let response = app
            .oneshot(analyze_request(r#"{"query": ""}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["summary"], "Missing query.");
    }

    #[tokio::test]
    async fn analyze_without_dataset_is_a_server_error() {
        let app = router(test_state());
        let response = app
            .oneshot(analyze_request(r#"{"query": "tell me about pune"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["summary"], "No data available.");
    }

    #[tokio::test]
    async fn analyze_returns_all_three_artifacts() {
        let app = router(loaded_state().await);
        let response = app
            .oneshot(analyze_request(r#"{"query": "tell me about pune"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["summary"][0]["location"], "Pune");
        assert_eq!(json["chartData"][0]["year"], 2021);
        assert_eq!(json["chartData"][0]["Pune"], 10);
        assert_eq!(json["chartData"][0]["Pune_price"], 1000.0);
        assert_eq!(json["tableData"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn analyze_rejects_unknown_location() {
        let app = router(loaded_state().await);
        let response = app
            .oneshot(analyze_request(r#"{"query": "tell me about atlantis"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upload_requires_a_file() {
        let app = router(test_state());
        let boundary = "----TestBoundary1234567890";
        let request = Request::builder()
            .method("POST")
            .uri("/api/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(format!("--{boundary}--\r\n")))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No file provided.");
    }

    #[tokio::test]
    async fn upload_rejects_unknown_extensions() {
        let app = router(test_state());
        let response = app
            .oneshot(multipart_request("data.csv", b"a,b\n1,2"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid file format.");
    }

    #[tokio::test]
    async fn upload_parse_failure_keeps_cache_intact() {
        let state = loaded_state().await;
        let app = router(state.clone());
        let response = app
            .oneshot(multipart_request("data.xlsx", b"garbage"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"], "Failed to process file.");
        assert!(state.cache.get().await.is_some());
    }

    #[tokio::test]
    async fn health_reports_dataset_state() {
        let app = router(loaded_state().await);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["datasetLoaded"], true);
    }
}
