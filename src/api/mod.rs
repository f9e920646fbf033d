//! HTTP API
//!
//! axum routes for uploading PDFs, chatting with them and removing them.

pub mod errors;
pub mod handlers;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::Services;

pub use errors::{ApiError, ErrorBody};

/// Room for multipart boundaries and headers on top of the file itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

const CORS_MAX_AGE_SECS: u64 = 86400;

pub fn router(services: Arc<Services>) -> Router {
    let body_limit = services.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route("/upload", post(handlers::upload))
        .route("/chat", post(handlers::chat))
        .route("/documents/{id}", delete(handlers::delete_document))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(CORS_MAX_AGE_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{EmbeddingError, FeatureExtractionResponse, GenerationError};
    use crate::testing::{single_page_pdf, FailingIndex, FakeGenerator, HashingExtractor, ScriptedExtractor};
    use crate::vector::{IndexSpec, MemoryIndex, StoreSettings, VectorIndex, EMBEDDING_DIMENSION};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const BOUNDARY: &str = "pdfrag-test-boundary";
    const MAX_UPLOAD: usize = 10 * 1024 * 1024;

    fn services_with(
        extractor: Arc<dyn crate::inference::FeatureExtractor>,
        generator: Arc<FakeGenerator>,
        index: Arc<dyn VectorIndex>,
        max_upload: usize,
    ) -> Arc<Services> {
        Arc::new(Services::new(
            extractor,
            generator,
            index,
            StoreSettings::new(IndexSpec::new("pdf-chat")),
            max_upload,
        ))
    }

    fn test_services(generator: Arc<FakeGenerator>) -> (Arc<Services>, Arc<MemoryIndex>) {
        let index = Arc::new(MemoryIndex::new(EMBEDDING_DIMENSION).with_index("pdf-chat"));
        (services_with(Arc::new(HashingExtractor), generator, index.clone(), MAX_UPLOAD), index)
    }

    fn multipart_request(file_name: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
             Content-Type: {content_type}\r\n\r\n"
        ).into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    fn chat_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let response = router(services)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_upload_then_chat() {
        let generator = Arc::new(FakeGenerator::replying("Answer: It says hello world (Page 1)."));
        let (services, index) = test_services(generator.clone());
        let app = router(services);

        let pdf = single_page_pdf("Hello world. This is page 1 testing.");
        let response = app.clone().oneshot(multipart_request("hello.pdf", "application/pdf", &pdf)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let document = json_body(response).await;
        assert_eq!(document["chunkCount"], 1);
        assert_eq!(document["pageCount"], 1);
        assert_eq!(document["name"], "hello.pdf");
        let id = document["id"].as_str().unwrap().to_string();
        assert_eq!(index.record_count(&id), 1);

        let body = json!({ "message": "What does the document say?", "documentId": id }).to_string();
        let response = app.oneshot(chat_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let chat = json_body(response).await;
        assert_eq!(chat["message"], "It says hello world (Page 1).");
        assert_eq!(chat["citations"][0]["pageNumber"], 1);
        assert!(chat["citations"][0]["text"].as_str().unwrap().starts_with("Hello world."));
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let response = router(services)
            .oneshot(multipart_request("notes.txt", "text/plain", b"plain text"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Only PDF files are allowed");
    }

    #[tokio::test]
    async fn test_upload_without_file_field() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nvalue\r\n--{BOUNDARY}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();

        let response = router(services).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    fn small_limit_services() -> Arc<Services> {
        let index = Arc::new(MemoryIndex::new(EMBEDDING_DIMENSION).with_index("pdf-chat"));
        services_with(Arc::new(HashingExtractor), Arc::new(FakeGenerator::replying("")), index, 1024)
    }

    #[tokio::test]
    async fn test_upload_just_over_limit() {
        let response = router(small_limit_services())
            .oneshot(multipart_request("big.pdf", "application/pdf", &[b'x'; 1025]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "File size exceeds 1024 bytes");
    }

    #[tokio::test]
    async fn test_upload_over_body_limit() {
        let bytes = vec![b'x'; 1024 + MULTIPART_OVERHEAD_BYTES + 1];
        let response = router(small_limit_services())
            .oneshot(multipart_request("huge.pdf", "application/pdf", &bytes))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "File size exceeds 1024 bytes");
    }

    #[tokio::test]
    async fn test_upload_rejects_corrupt_pdf() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let response = router(services)
            .oneshot(multipart_request("broken.pdf", "application/pdf", b"not really a pdf"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "PDF parsing failed");
    }

    #[tokio::test]
    async fn test_upload_quota_error_is_402() {
        let extractor = Arc::new(ScriptedExtractor::new(vec![
            Err(EmbeddingError::QuotaExceeded("insufficient_quota".into())),
            Ok(FeatureExtractionResponse::Flat(vec![0.0; EMBEDDING_DIMENSION])),
        ]));
        let index = Arc::new(MemoryIndex::new(EMBEDDING_DIMENSION).with_index("pdf-chat"));
        let services = services_with(extractor, Arc::new(FakeGenerator::replying("")), index, MAX_UPLOAD);

        let pdf = single_page_pdf("Hello world. This is page 1 testing.");
        let response = router(services)
            .oneshot(multipart_request("hello.pdf", "application/pdf", &pdf))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
    }

    #[tokio::test]
    async fn test_chat_missing_fields() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let app = router(services);

        for body in [r#"{"message":"hi"}"#, r#"{"documentId":"abc"}"#, r#"{"message":"","documentId":"abc"}"#] {
            let response = app.clone().oneshot(chat_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", body);
            assert_eq!(json_body(response).await["error"], "Missing required fields");
        }
    }

    #[tokio::test]
    async fn test_chat_malformed_json() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let response = router(services).oneshot(chat_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_chat_unknown_document_uses_fallback() {
        let generator = Arc::new(FakeGenerator::replying("unused"));
        let (services, _) = test_services(generator.clone());

        let body = json!({ "message": "Anything?", "documentId": "missing" }).to_string();
        let response = router(services).oneshot(chat_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let chat = json_body(response).await;
        assert_eq!(chat["message"], crate::documents::assistant::NO_CONTEXT_MESSAGE);
        assert_eq!(chat["citations"], json!([]));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_chat_model_loading_is_503() {
        let generator = Arc::new(FakeGenerator::failing(GenerationError::ModelLoading));
        let (services, _) = test_services(generator);
        services.store.upsert("doc", &[crate::documents::Chunk {
            text: "Loaded content.".into(),
            page_number: 1,
            chunk_index: 0,
        }]).await.unwrap();

        let body = json!({ "message": "content?", "documentId": "doc" }).to_string();
        let response = router(services).oneshot(chat_request(&body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["error"], "The AI model is currently loading");
    }

    #[tokio::test]
    async fn test_delete_document() {
        let (services, index) = test_services(Arc::new(FakeGenerator::replying("")));
        services.store.upsert("doc", &[crate::documents::Chunk {
            text: "Temporary.".into(),
            page_number: 1,
            chunk_index: 0,
        }]).await.unwrap();

        let request = Request::builder().method("DELETE").uri("/documents/doc").body(Body::empty()).unwrap();
        let response = router(services).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(index.record_count("doc"), 0);
    }

    #[tokio::test]
    async fn test_delete_document_when_index_fails() {
        let memory = Arc::new(MemoryIndex::new(EMBEDDING_DIMENSION).with_index("pdf-chat"));
        let index = Arc::new(FailingIndex::new(memory.clone()).failing_delete());
        let services = services_with(Arc::new(HashingExtractor), Arc::new(FakeGenerator::replying("")), index, MAX_UPLOAD);
        services.store.upsert("doc", &[crate::documents::Chunk {
            text: "Survives the failed delete.".into(),
            page_number: 1,
            chunk_index: 0,
        }]).await.unwrap();

        let request = Request::builder().method("DELETE").uri("/documents/doc").body(Body::empty()).unwrap();
        let response = router(services).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(memory.record_count("doc"), 1);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (services, _) = test_services(Arc::new(FakeGenerator::replying("")));
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/chat")
            .header("origin", "http://localhost:5173")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();

        let response = router(services).oneshot(request).await.unwrap();

        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["access-control-max-age"], "86400");
    }
}
