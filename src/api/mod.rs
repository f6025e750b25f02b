// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::{DefaultBodyLimit, FromRequest},
    http::Request,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    attachments::MAX_ATTACHMENT_BYTES,
    auth::Role,
    error::{ApiError, ErrorBody, ErrorKind},
    ledger::{AxisRange, RunningPoint, Totals},
    models::{
        AuthResponse, DeleteEntryResponse, EntryResponse, LoginRequest, RegisterRequest,
        SummaryResponse, UserResponse,
    },
    state::AppState,
    storage::EntryKind,
};

pub mod auth;
pub mod entries;
pub mod health;
pub mod uploads;

/// Request body cap: the attachment ceiling plus room for the text fields.
pub const MAX_BODY_BYTES: usize = MAX_ATTACHMENT_BYTES + 1024 * 1024;

/// JSON body whose rejections are reported as `invalid_input`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route(
            "/entries",
            get(entries::list_entries).post(entries::create_entry),
        )
        .route("/entries/summary", get(entries::summary))
        .route(
            "/entries/{entry_id}",
            get(entries::get_entry)
                .put(entries::update_entry)
                .delete(entries::delete_entry),
        )
        .route("/uploads/{name}", get(uploads::get_upload))
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id
        )
    });

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register,
        auth::login,
        auth::me,
        entries::list_entries,
        entries::get_entry,
        entries::create_entry,
        entries::update_entry,
        entries::delete_entry,
        entries::summary,
        uploads::get_upload,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            UserResponse,
            AuthResponse,
            EntryResponse,
            DeleteEntryResponse,
            SummaryResponse,
            RunningPoint,
            AxisRange,
            Totals,
            EntryKind,
            Role,
            ErrorBody,
            ErrorKind
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and sessions"),
        (name = "Entries", description = "Community ledger entries"),
        (name = "Uploads", description = "Entry attachments"),
        (name = "Health", description = "Service health")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::to_bytes,
        http::{header, Method, StatusCode},
    };
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    const BOUNDARY: &str = "ledger-test-boundary";

    fn test_app() -> (Router, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let state = AppState::for_tests(dir.path()).expect("state");
        (router(state), dir)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn fetch_raw(app: &Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, bytes.to_vec())
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    }

    fn multipart(
        method: Method,
        uri: &str,
        token: &str,
        fields: &[(&str, &str)],
        photo: Option<(&str, &str, &[u8])>,
    ) -> Request<Body> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((file_name, content_type, bytes)) = photo {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"photo\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn register(app: &Router, email: &str, role: &str) -> String {
        let (status, body) = send(
            app,
            json_request(
                Method::POST,
                "/auth/register",
                json!({"name": "Member", "email": email, "password": "secret123", "role": role}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create(app: &Router, token: &str, fields: &[(&str, &str)]) -> Value {
        let (status, body) = send(app, multipart(Method::POST, "/entries", token, fields, None)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    #[tokio::test]
    async fn health_reports_writable_data_dir() {
        let (app, _dir) = test_app();
        let (status, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["data_dir"], "ok");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let (app, _dir) = test_app();
        let response = app
            .oneshot(Request::get("/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn register_then_duplicate_in_any_casing() {
        let (app, _dir) = test_app();
        register(&app, "warga@example.com", "resident").await;

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/register",
                json!({"name": "Other", "email": "WARGA@Example.com", "password": "secret123"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error_code"], "duplicate_identity");
    }

    #[tokio::test]
    async fn malformed_and_unknown_json_is_invalid_input() {
        let (app, _dir) = test_app();
        let request = Request::post("/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_input");

        let (status, body) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/register",
                json!({"name": "a", "email": "a@b.co", "password": "secret123", "is_admin": true}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_input");
    }

    #[tokio::test]
    async fn login_failures_share_kind_and_message() {
        let (app, _dir) = test_app();
        register(&app, "warga@example.com", "resident").await;

        let wrong_password = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                json!({"email": "warga@example.com", "password": "nope-nope"}),
            ),
        )
        .await;
        let unknown_email = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                json!({"email": "ghost@example.com", "password": "secret123"}),
            ),
        )
        .await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password, unknown_email);
    }

    #[tokio::test]
    async fn me_requires_token_and_hides_verifier() {
        let (app, _dir) = test_app();
        let (status, body) = send(&app, Request::get("/auth/me").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "unauthenticated");

        let token = register(&app, "warga@example.com", "resident").await;
        let (status, body) = send(&app, authed(Method::GET, "/auth/me", &token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "warga@example.com");
        assert_eq!(body["role"], "resident");
        assert!(body.get("password_verifier").is_none());
    }

    #[tokio::test]
    async fn missing_token_is_401_and_wrong_role_is_403() {
        let (app, _dir) = test_app();
        let resident = register(&app, "warga@example.com", "resident").await;
        let steward = register(&app, "bendahara@example.com", "steward").await;

        let (status, _) = send(&app, Request::get("/entries").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&app, authed(Method::GET, "/entries", "garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, authed(Method::GET, "/entries", &resident)).await;
        assert_eq!(status, StatusCode::OK);

        let fields = [("name", "Iuran"), ("amount", "100")];
        let (status, body) =
            send(&app, multipart(Method::POST, "/entries", &resident, &fields, None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_code"], "forbidden");

        let created = create(&app, &steward, &fields).await;
        let uri = format!("/entries/{}", created["id"].as_str().unwrap());

        let (status, _) =
            send(&app, multipart(Method::PUT, &uri, &resident, &[("amount", "1")], None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(&app, authed(Method::DELETE, &uri, &resident)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, body) = send(&app, authed(Method::GET, &uri, &resident)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["amount"], "100");
    }

    #[tokio::test]
    async fn create_validates_fields() {
        let (app, _dir) = test_app();
        let steward = register(&app, "bendahara@example.com", "steward").await;

        let (status, body) = send(
            &app,
            multipart(Method::POST, "/entries", &steward, &[("name", "x"), ("amount", "lots")], None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_input");

        let (status, _) = send(
            &app,
            multipart(
                Method::POST,
                "/entries",
                &steward,
                &[("name", "x"), ("amount", "1"), ("owner_id", "someone")],
                None,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let created = create(&app, &steward, &[("name", "x"), ("amount", "1"), ("kind", "gift")]).await;
        assert_eq!(created["kind"], "income");
        assert_eq!(created["owner_name"], "Member");
    }

    #[tokio::test]
    async fn attachment_replace_and_delete_lifecycle() {
        let (app, _dir) = test_app();
        let steward = register(&app, "bendahara@example.com", "steward").await;

        let (status, created) = send(
            &app,
            multipart(
                Method::POST,
                "/entries",
                &steward,
                &[("name", "Sapu"), ("amount", "25000"), ("kind", "expense")],
                Some(("nota.png", "image/png", &b"old-receipt"[..])),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let entry_uri = format!("/entries/{}", created["id"].as_str().unwrap());
        let old_url = created["attachment_url"].as_str().unwrap().to_string();

        let (status, content_type, bytes) = fetch_raw(&app, &old_url).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("image/png"));
        assert_eq!(bytes, &b"old-receipt"[..]);

        // Rejected replacement leaves the old attachment in place.
        let (status, body) = send(
            &app,
            multipart(
                Method::PUT,
                &entry_uri,
                &steward,
                &[],
                Some(("nota.txt", "text/plain", &b"nope"[..])),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(body["error_code"], "attachment_error");
        assert_eq!(fetch_raw(&app, &old_url).await.0, StatusCode::OK);

        let (status, updated) = send(
            &app,
            multipart(
                Method::PUT,
                &entry_uri,
                &steward,
                &[("description", "replaced")],
                Some(("nota.pdf", "application/pdf", &b"%PDF-new"[..])),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "Sapu");
        assert_eq!(updated["description"], "replaced");
        let new_url = updated["attachment_url"].as_str().unwrap().to_string();
        assert_ne!(new_url, old_url);
        assert_eq!(fetch_raw(&app, &old_url).await.0, StatusCode::NOT_FOUND);
        assert_eq!(fetch_raw(&app, &new_url).await.1.as_deref(), Some("application/pdf"));

        let (status, body) = send(&app, authed(Method::DELETE, &entry_uri, &steward)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], created["id"]);
        assert_eq!(fetch_raw(&app, &new_url).await.0, StatusCode::NOT_FOUND);

        let (status, body) = send(&app, authed(Method::GET, &entry_uri, &steward)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error_code"], "not_found");
    }

    #[tokio::test]
    async fn oversized_attachment_is_413() {
        let (app, _dir) = test_app();
        let steward = register(&app, "bendahara@example.com", "steward").await;
        let oversized = vec![0u8; MAX_ATTACHMENT_BYTES + 1];

        let (status, body) = send(
            &app,
            multipart(
                Method::POST,
                "/entries",
                &steward,
                &[("name", "Big"), ("amount", "1")],
                Some(("big.pdf", "application/pdf", oversized.as_slice())),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error_code"], "attachment_error");

        let (_, listed) = send(&app, authed(Method::GET, "/entries", &steward)).await;
        assert_eq!(listed.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn summary_runs_oldest_first() {
        let (app, _dir) = test_app();
        let steward = register(&app, "bendahara@example.com", "steward").await;

        for (name, amount, kind) in [("a", "100", "income"), ("b", "30", "expense"), ("c", "50", "income")] {
            create(&app, &steward, &[("name", name), ("amount", amount), ("kind", kind)]).await;
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let (_, listed) = send(&app, authed(Method::GET, "/entries", &steward)).await;
        assert_eq!(listed[0]["name"], "c");

        let (status, summary) = send(&app, authed(Method::GET, "/entries/summary", &steward)).await;
        assert_eq!(status, StatusCode::OK);
        let balances: Vec<&str> = summary["series"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["running_balance"].as_str().unwrap())
            .collect();
        assert_eq!(balances, vec!["100", "70", "120"]);
        assert_eq!(summary["totals"]["total_income"], "150");
        assert_eq!(summary["totals"]["entry_count"], 3);
    }

    #[tokio::test]
    async fn upload_names_cannot_escape() {
        let (app, _dir) = test_app();
        let (status, _, _) = fetch_raw(&app, "/uploads/..%2Fusers%2Fx.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn openapi_documents_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
        assert!(json["paths"]["/entries/{entry_id}"].is_object());
    }
}
