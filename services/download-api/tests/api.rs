use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use download_api::{router, AppState};
use rbperf_core::config::ServerSettings;
use rbperf_core::headers::CLIENT_LIBRARY_LATENCY;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(upstream: &MockServer) -> Router {
    let settings = ServerSettings {
        upstream_base_url: upstream.uri(),
        ..ServerSettings::default()
    };
    let state = AppState::from_settings(&settings).unwrap();
    router(state, &settings)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn mount_object(upstream: &MockServer, bucket: &str, object: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/{bucket}/{object}")))
        .and(query_param("alt", "media"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(50))
                .set_body_bytes(body),
        )
        .mount(upstream)
        .await;
}

#[tokio::test]
async fn test_index_banner_is_not_cacheable() {
    let upstream = MockServer::start().await;
    let response = app(&upstream).oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"RBF API");
}

#[tokio::test]
async fn test_download_reports_upstream_latency() {
    let upstream = MockServer::start().await;
    let contents = vec![b'x'; 8192];
    mount_object(&upstream, "gcsrbpa-us-west1", "2mib.txt", contents.clone()).await;

    let response = app(&upstream)
        .oneshot(get("/download/gcsrbpa-us-west1/2mib.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    let latency: f64 = headers[CLIENT_LIBRARY_LATENCY].to_str().unwrap().parse().unwrap();
    assert!(latency >= 50.0, "latency {latency}");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"2mib.txt\""
    );
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body.len(), contents.len());
}

#[tokio::test]
async fn test_stream_passes_body_through() {
    let upstream = MockServer::start().await;
    mount_object(&upstream, "gcsrbpa-us-east1", "64mib.txt", b"streamed bytes".to_vec()).await;

    let response = app(&upstream)
        .oneshot(get("/stream/gcsrbpa-us-east1/64mib.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CLIENT_LIBRARY_LATENCY).is_none());
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"streamed bytes");
}

#[tokio::test]
async fn test_upstream_status_maps_to_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;

    let response = app(&upstream)
        .oneshot(get("/download/gcsrbpa-us-west1/missing.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], "UPSTREAM_STATUS");
    assert_eq!(json["error"]["upstream_status"], 404);
}

#[tokio::test]
async fn test_unreachable_upstream_maps_to_bad_gateway() {
    let settings = ServerSettings {
        upstream_base_url: "http://127.0.0.1:1".to_string(),
        ..ServerSettings::default()
    };
    let app = router(AppState::from_settings(&settings).unwrap(), &settings);

    let response = app
        .oneshot(get("/download/gcsrbpa-us-west1/2mib.txt"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], "UPSTREAM_UNAVAILABLE");
}

#[tokio::test]
async fn test_cors_exposes_latency_header_to_allowed_origin() {
    let upstream = MockServer::start().await;
    mount_object(&upstream, "gcsrbpa-us-west1", "2mib.txt", vec![b'x'; 16]).await;

    let request = Request::builder()
        .uri("/download/gcsrbpa-us-west1/2mib.txt")
        .header(header::ORIGIN, "http://localhost:8080")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();

    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:8080"
    );
    assert_eq!(
        headers[header::ACCESS_CONTROL_EXPOSE_HEADERS],
        CLIENT_LIBRARY_LATENCY
    );
}

#[tokio::test]
async fn test_download_is_compressed_when_accepted() {
    let upstream = MockServer::start().await;
    mount_object(&upstream, "gcsrbpa-us-west1", "2mib.txt", vec![b'x'; 4096]).await;

    let request = Request::builder()
        .uri("/download/gcsrbpa-us-west1/2mib.txt")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let response = app(&upstream).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
    assert!(response.headers().contains_key(CLIENT_LIBRARY_LATENCY));
}
