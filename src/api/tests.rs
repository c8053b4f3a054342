//! Router-level tests: the full axum app over the in-memory store.

use super::app;
use crate::{
    api::handlers::auth::{AuthConfig, AuthState},
    store::MemoryStore,
};
use anyhow::{Result, anyhow};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Method, Request, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE},
    },
    response::Response,
};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn test_app() -> Result<Router> {
    let auth = AuthState::new(AuthConfig::new(SecretString::from(
        "router-test-secret".to_string(),
    )))?;
    Ok(app(Arc::new(MemoryStore::new()), Arc::new(auth)))
}

async fn send(app: &Router, request: Request<Body>) -> Result<Response> {
    Ok(app.clone().oneshot(request).await?)
}

async fn body_json(response: Response) -> Result<Value> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: &Value) -> Result<Request<Body>> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::from(body.to_string()))?)
}

fn bare_request(method: Method, uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    Ok(builder.body(Body::empty())?)
}

fn login_request(username: &str, password: &str) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method(Method::POST)
        .uri("/login")
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("username={username}&password={password}")))?)
}

/// Register `admin` and return a fresh bearer token.
async fn admin_token(app: &Router) -> Result<String> {
    let response = send(
        app,
        json_request(
            Method::POST,
            "/register",
            None,
            &json!({ "username": "admin", "password": "secret1" }),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(app, login_request("admin", "secret1")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await?;
    body["access_token"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("missing access_token"))
}

fn acme() -> Value {
    json!({
        "nome": "Acme",
        "cnpj": "12345678000195",
        "cidade": "São Paulo",
        "ramo_atuacao": "Tecnologia",
        "telefone": "+55 11 4000-0000",
        "email_contato": "a@acme.com"
    })
}

#[tokio::test]
async fn register_returns_public_view() -> Result<()> {
    let app = test_app()?;
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/register",
            None,
            &json!({ "username": "admin", "password": "secret1" }),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await?;
    assert_eq!(body, json!({ "id": 1, "username": "admin" }));
    Ok(())
}

#[tokio::test]
async fn second_registration_conflicts() -> Result<()> {
    let app = test_app()?;
    admin_token(&app).await?;
    let response = send(
        &app,
        json_request(
            Method::POST,
            "/register",
            None,
            &json!({ "username": "admin", "password": "other-pass" }),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn invalid_registration_is_422() -> Result<()> {
    let app = test_app()?;
    for body in [
        json!({ "username": "ab", "password": "secret1" }),
        json!({ "username": "admin", "password": "123" }),
        json!({ "username": "admin" }),
    ] {
        let response = send(&app, json_request(Method::POST, "/register", None, &body)?).await?;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{body}");
    }
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_401_with_challenge() -> Result<()> {
    let app = test_app()?;
    admin_token(&app).await?;
    let response = send(&app, login_request("admin", "wrong-pass")?).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(WWW_AUTHENTICATE));
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_token() -> Result<()> {
    let app = test_app()?;
    let cases = [
        bare_request(Method::GET, "/empresas/", None)?,
        bare_request(Method::GET, "/empresas", None)?,
        bare_request(Method::GET, "/empresas/1", None)?,
        bare_request(Method::DELETE, "/empresas/1", None)?,
        json_request(Method::POST, "/empresas/", None, &acme())?,
        json_request(Method::PUT, "/empresas/1", None, &json!({ "nome": "Nova" }))?,
        bare_request(Method::GET, "/empresas/", Some("not-a-token"))?,
    ];
    for request in cases {
        let response = send(&app, request).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await?;
        assert_eq!(body["detail"], "Could not validate credentials");
    }
    Ok(())
}

#[tokio::test]
async fn gate_runs_before_body_validation() -> Result<()> {
    let app = test_app()?;
    let response = send(
        &app,
        json_request(Method::POST, "/empresas/", None, &json!({ "nome": "x" }))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn company_lifecycle() -> Result<()> {
    let app = test_app()?;
    let token = admin_token(&app).await?;

    let response = send(&app, json_request(Method::POST, "/empresas/", Some(&token), &acme())?).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await?;
    assert_eq!(created["id"], 1);
    assert_eq!(created["cnpj"], "12345678000195");
    assert!(created["data_cadastro"].is_string());

    let response = send(&app, json_request(Method::POST, "/empresas/", Some(&token), &acme())?).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, bare_request(Method::GET, "/empresas/1", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["nome"], "Acme");

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/empresas/1",
            Some(&token),
            &json!({ "telefone": "+55 11 5000-0000" }),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await?;
    assert_eq!(updated["telefone"], "+55 11 5000-0000");
    assert_eq!(updated["nome"], "Acme");
    assert_eq!(updated["data_cadastro"], created["data_cadastro"]);

    let response = send(&app, bare_request(Method::DELETE, "/empresas/1", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, bare_request(Method::GET, "/empresas/1", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, bare_request(Method::DELETE, "/empresas/1", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn update_keeps_cnpj_immutable() -> Result<()> {
    let app = test_app()?;
    let token = admin_token(&app).await?;
    send(&app, json_request(Method::POST, "/empresas/", Some(&token), &acme())?).await?;

    let response = send(
        &app,
        json_request(
            Method::PUT,
            "/empresas/1",
            Some(&token),
            &json!({ "nome": "Acme Nova", "cnpj": "98765432000110" }),
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await?;
    assert_eq!(updated["nome"], "Acme Nova");
    assert_eq!(updated["cnpj"], "12345678000195");
    Ok(())
}

#[tokio::test]
async fn empty_update_checks_existence_first() -> Result<()> {
    let app = test_app()?;
    let token = admin_token(&app).await?;

    let response = send(
        &app,
        json_request(Method::PUT, "/empresas/999", Some(&token), &json!({}))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    send(&app, json_request(Method::POST, "/empresas/", Some(&token), &acme())?).await?;
    let response = send(
        &app,
        json_request(Method::PUT, "/empresas/1", Some(&token), &json!({}))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await?["nome"], "Acme");
    Ok(())
}

#[tokio::test]
async fn list_filters_and_paginates() -> Result<()> {
    let app = test_app()?;
    let token = admin_token(&app).await?;
    let companies = [
        ("Acme", "12345678000195", "São Paulo", "a@acme.com"),
        ("Beta", "98765432000110", "Rio de Janeiro", "b@beta.com"),
        ("Acme Sul", "11111111000111", "Porto Alegre", "c@acme.com"),
    ];
    for (nome, cnpj, cidade, email) in companies {
        let body = json!({
            "nome": nome,
            "cnpj": cnpj,
            "cidade": cidade,
            "ramo_atuacao": "Tecnologia",
            "telefone": "1",
            "email_contato": email
        });
        let response = send(&app, json_request(Method::POST, "/empresas/", Some(&token), &body)?).await?;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = send(&app, bare_request(Method::GET, "/empresas/?nome=ACME", Some(&token))?).await?;
    let found = body_json(response).await?;
    assert_eq!(found.as_array().map(Vec::len), Some(2));

    let response = send(
        &app,
        bare_request(Method::GET, "/empresas/?skip=1&limit=1", Some(&token))?,
    )
    .await?;
    let page = body_json(response).await?;
    assert_eq!(page[0]["nome"], "Beta");
    assert_eq!(page.as_array().map(Vec::len), Some(1));

    let response = send(&app, bare_request(Method::GET, "/empresas?limit=-1", Some(&token))?).await?;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    Ok(())
}

#[tokio::test]
async fn root_health_and_docs_are_public() -> Result<()> {
    let app = test_app()?;

    let response = send(&app, bare_request(Method::GET, "/", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await?["message"].is_string());

    let response = send(&app, bare_request(Method::GET, "/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = send(&app, bare_request(Method::OPTIONS, "/health", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, bare_request(Method::GET, "/api-docs/openapi.json", None)?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let doc = body_json(response).await?;
    assert!(doc["paths"]["/empresas/{id}"].is_object());
    Ok(())
}
