//! A fully wired application over a fresh database, with Google's JWKS
//! endpoint played by a mock server.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use super::support::{CLIENT_ID, INSTITUTION_DOMAIN, jwks_body};
use crate::{
    AppState, build_app,
    config::PortalConfig,
    db::tests::harness::RepoTestContext,
    models::{Account, Role},
};

const TOKEN_SECRET: &str = "test-secret-0123456789abcdef0123456789";

fn test_config(jwks_url: &str) -> PortalConfig {
    PortalConfig::from_str(&format!(
        r#"
        [database]
        type = "sqlite"
        path = ":memory:"

        [auth]
        institution_domain = "{INSTITUTION_DOMAIN}"

        [auth.google]
        client_id = "{CLIENT_ID}"
        jwks_url = "{jwks_url}"

        [auth.tokens]
        secret = "{TOKEN_SECRET}"
        "#
    ))
    .expect("test config is valid")
}

/// A wired application plus handles for seeding data.
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub ctx: RepoTestContext,
    pub jwks: MockServer,
}

impl TestApp {
    /// Application whose JWKS endpoint serves the test key.
    pub async fn new() -> Self {
        Self::with_jwks_response(ResponseTemplate::new(200).set_body_json(jwks_body())).await
    }

    pub async fn with_jwks_response(response: ResponseTemplate) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let jwks = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth2/v3/certs"))
            .respond_with(response)
            .mount(&jwks)
            .await;

        let ctx = RepoTestContext::new().await;
        let config = test_config(&format!("{}/oauth2/v3/certs", jwks.uri()));
        let state = AppState::new(config, ctx.db.clone()).expect("http client builds");
        let app = build_app(state.clone());

        Self {
            app,
            state,
            ctx,
            jwks,
        }
    }

    /// Seed an account directly and return it with a valid access token.
    pub async fn signed_in(&self, role: Role) -> (Account, String) {
        let account = self.ctx.account(role).await;
        let tokens = self
            .state
            .tokens
            .issue_pair(account.id)
            .expect("tokens issue");
        (account, tokens.access)
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        self.send_with_headers(method, uri, token, body, &[]).await
    }

    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("body serializes"))),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self.app.clone().oneshot(request).await.expect("infallible");
        let status = response.status();
        let request_id = response
            .headers()
            .get("X-Request-Id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Response {
            status,
            json,
            request_id,
        }
    }
}

/// Status, parsed JSON body and echoed request ID of a test request.
pub struct Response {
    pub status: StatusCode,
    pub json: Value,
    pub request_id: Option<String>,
}
