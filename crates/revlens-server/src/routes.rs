use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{Method, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use revlens_core::{ErrorKind, ReviewError, ReviewOrchestrator};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub const ANALYZE_PATH: &str = "/api/analyze-review";
pub const REVIEWS_PATH: &str = "/api/reviews";
pub const HEALTH_PATH: &str = "/api/health";
pub const SERVICE_NAME: &str = "Product Review Analyzer API";

const CORS_MAX_AGE: Duration = Duration::from_secs(3600);

type AppState = Arc<ReviewOrchestrator>;

/// Router with all API routes, CORS and request tracing.
pub fn build_router(orchestrator: Arc<ReviewOrchestrator>) -> Router {
    let trace_layer = TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
        tracing::info_span!(
            "http.request",
            method = %request.method(),
            path = %request.uri().path(),
        )
    });

    Router::new()
        .route(ANALYZE_PATH, post(analyze_review))
        .route(REVIEWS_PATH, get(list_reviews))
        .route(HEALTH_PATH, get(health))
        .fallback(not_found)
        .layer(cors_layer())
        .layer(trace_layer)
        .with_state(orchestrator)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(CORS_MAX_AGE)
}

#[derive(Serialize)]
struct Success<T> {
    status: &'static str,
    data: T,
}

impl<T> Success<T> {
    fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    status: &'static str,
    error: String,
}

/// An error response: `{"status":"error","error":...}` with a mapped status.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        let status = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Analysis | ErrorKind::Extraction | ErrorKind::Persistence => {
                error!(kind = err.kind().as_str(), error = %err, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status: "error",
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    review_text: Option<String>,
}

async fn analyze_review(
    State(orchestrator): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected analyze request body");
        ApiError::bad_request("Invalid JSON body")
    })?;
    let review_text = request
        .review_text
        .ok_or_else(|| ApiError::bad_request("review_text is required"))?;

    let record = orchestrator.analyze_review(&review_text).await?;
    Ok((StatusCode::CREATED, Json(Success::new(record))))
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<String>,
    limit: Option<String>,
}

async fn list_reviews(
    State(orchestrator): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = orchestrator
        .list_reviews_from_params(query.page.as_deref(), query.limit.as_deref())
        .await?;
    Ok(Json(Success::new(page)))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

async fn not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        message: "Not found".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use http_body_util::BodyExt;
    use revlens_core::{
        KeyPointExtractor, KeyPoints, ReviewDraft, ReviewRecord, ReviewStore, Sentiment,
        SentimentClassifier, SentimentScore, StageSchedule,
    };
    use revlens_store::MemoryStore;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct FixedClassifier;

    #[async_trait]
    impl SentimentClassifier for FixedClassifier {
        async fn analyze(&self, _text: &str) -> Result<SentimentScore, ReviewError> {
            SentimentScore::new(Sentiment::Positive, 0.9876)
        }
    }

    struct FailingClassifier;

    #[async_trait]
    impl SentimentClassifier for FailingClassifier {
        async fn analyze(&self, _text: &str) -> Result<SentimentScore, ReviewError> {
            Err(ReviewError::analysis("model unavailable"))
        }
    }

    #[derive(Default)]
    struct CountingExtractor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl KeyPointExtractor for CountingExtractor {
        async fn extract(&self, _text: &str) -> Result<KeyPoints, ReviewError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(KeyPoints::new(vec!["Fast delivery".into(), "Good build".into()]).unwrap())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl KeyPointExtractor for FailingExtractor {
        async fn extract(&self, _text: &str) -> Result<KeyPoints, ReviewError> {
            Err(ReviewError::extraction("quota exceeded"))
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl ReviewStore for BrokenStore {
        async fn create(&self, _draft: ReviewDraft) -> Result<ReviewRecord, ReviewError> {
            Err(ReviewError::persistence("disk full"))
        }

        async fn count(&self) -> Result<u64, ReviewError> {
            Err(ReviewError::persistence("disk full"))
        }

        async fn list(&self, _offset: u64, _limit: u32) -> Result<Vec<ReviewRecord>, ReviewError> {
            Err(ReviewError::persistence("disk full"))
        }

        async fn page(
            &self,
            _offset: u64,
            _limit: u32,
        ) -> Result<(u64, Vec<ReviewRecord>), ReviewError> {
            Err(ReviewError::persistence("disk full"))
        }
    }

    fn router_with(
        classifier: Arc<dyn SentimentClassifier>,
        extractor: Arc<dyn KeyPointExtractor>,
        store: Arc<dyn ReviewStore>,
    ) -> Router {
        let orchestrator = ReviewOrchestrator::new(classifier, extractor, store)
            .with_schedule(StageSchedule::Sequential);
        build_router(Arc::new(orchestrator))
    }

    fn app() -> (Router, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let router = router_with(
            Arc::new(FixedClassifier),
            Arc::new(CountingExtractor::default()),
            store.clone(),
        );
        (router, store)
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(ANALYZE_PATH)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap();
        (status, value)
    }

    #[tokio::test]
    async fn health_reports_service() {
        let (router, _) = app();
        let (status, body) = send(router, get_req(HEALTH_PATH)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "healthy", "service": "Product Review Analyzer API"})
        );
    }

    #[tokio::test]
    async fn analyze_returns_created_record() {
        let (router, store) = app();
        let (status, body) =
            send(router, post_json(r#"{"review_text": "  Pengiriman cepat, barang bagus  "}"#)).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["status"], "success");
        let data = &body["data"];
        assert_eq!(data["id"], 1);
        assert_eq!(data["review_text"], "Pengiriman cepat, barang bagus");
        assert_eq!(data["sentiment"], "positive");
        assert_eq!(data["confidence_score"], 0.9876);
        assert_eq!(data["key_points"], r#"["Fast delivery","Good build"]"#);
        assert!(data["created_at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_review_is_bad_request() {
        let (router, store) = app();
        let (status, body) = send(router, post_json(r#"{"review_text": "   "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["error"], "review_text is required and cannot be empty");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_field_is_bad_request() {
        let (router, _) = app();
        let (status, body) = send(router, post_json(r#"{"text": "hello"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "review_text is required");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let (router, _) = app();
        let (status, body) = send(router, post_json("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn classifier_failure_is_server_error_without_extraction() {
        let extractor = Arc::new(CountingExtractor::default());
        let store = Arc::new(MemoryStore::new());
        let router = router_with(Arc::new(FailingClassifier), extractor.clone(), store.clone());

        let (status, body) = send(router, post_json(r#"{"review_text": "ok"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Sentiment analysis failed: model unavailable");
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn extraction_failure_is_server_error() {
        let store = Arc::new(MemoryStore::new());
        let router = router_with(Arc::new(FixedClassifier), Arc::new(FailingExtractor), store.clone());

        let (status, body) = send(router, post_json(r#"{"review_text": "ok"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Key points extraction failed: quota exceeded");
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_server_error() {
        let router = router_with(
            Arc::new(FixedClassifier),
            Arc::new(CountingExtractor::default()),
            Arc::new(BrokenStore),
        );
        let (status, body) = send(router.clone(), post_json(r#"{"review_text": "ok"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error: disk full");

        let (status, _) = send(router, get_req(REVIEWS_PATH)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn list_defaults_on_empty_store() {
        let (router, _) = app();
        let (status, body) = send(router, get_req(REVIEWS_PATH)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "data": {"reviews": [], "total": 0, "page": 1, "limit": 10, "total_pages": 0}
            })
        );
    }

    #[tokio::test]
    async fn list_pages_newest_first() {
        let (router, _) = app();
        for i in 0..3 {
            let body = format!(r#"{{"review_text": "review {i}"}}"#);
            let (status, _) = send(router.clone(), post_json(&body)).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(router, get_req("/api/reviews?page=1&limit=2")).await;
        assert_eq!(status, StatusCode::OK);
        let data = &body["data"];
        assert_eq!(data["total"], 3);
        assert_eq!(data["total_pages"], 2);
        let texts: Vec<&str> = data["reviews"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["review_text"].as_str().unwrap())
            .collect();
        assert_eq!(texts, ["review 2", "review 1"]);
    }

    #[tokio::test]
    async fn out_of_range_params_reset() {
        let (router, _) = app();
        let (status, body) = send(router, get_req("/api/reviews?page=0&limit=500")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["page"], 1);
        assert_eq!(body["data"]["limit"], 10);
    }

    #[tokio::test]
    async fn non_integer_params_are_bad_request() {
        let (router, _) = app();
        let (status, body) = send(router, get_req("/api/reviews?page=abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid page or limit parameter");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found_envelope() {
        let (router, _) = app();
        let (status, body) = send(router, get_req("/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn cors_preflight_answered() {
        let (router, _) = app();
        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri(ANALYZE_PATH)
                    .header(header::ORIGIN, "http://localhost:5173")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "3600");

        let methods = headers[header::ACCESS_CONTROL_ALLOW_METHODS].to_str().unwrap();
        for m in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(m), "missing {m} in {methods}");
        }
        let allowed = headers[header::ACCESS_CONTROL_ALLOW_HEADERS]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        assert!(allowed.contains("content-type") && allowed.contains("authorization"));
    }

    #[tokio::test]
    async fn simple_request_carries_cors_origin() {
        let (router, _) = app();
        let response = router
            .oneshot(
                Request::builder()
                    .uri(HEALTH_PATH)
                    .header(header::ORIGIN, "http://example.test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
