mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_reports_degraded_database() -> Result<()> {
    let backend = common::backend().await?;

    let res = reqwest::get(backend.url("/health")).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["status"], "degraded");
    Ok(())
}

#[tokio::test]
async fn root_describes_the_api() -> Result<()> {
    let backend = common::backend().await?;
    let res = reqwest::get(backend.url("/")).await?;

    assert_eq!(res.status(), StatusCode::OK);
    let _body = res.json::<Value>().await?;
    Ok(())
}

#[tokio::test]
async fn protected_route_without_cookie_is_unauthorized() -> Result<()> {
    let backend = common::backend().await?;

    for route in ["getAllEvents", "getAllStaff", "getEquipmentUse/2024-06-01", "getAllEntreprises"] {
        let reply = backend.get(route).await?;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED, "{}", route);
        assert_eq!(reply.body["success"], false);
        assert_eq!(reply.body["message"], "Missing token");
    }
    Ok(())
}

#[tokio::test]
async fn forged_cookie_is_forbidden() -> Result<()> {
    let backend = common::backend().await?;

    let reply = backend
        .call(Method::GET, "getAllEvents", Some("token=not.a.jwt"), None)
        .await?;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn login_rejects_incomplete_body_before_touching_database() -> Result<()> {
    let backend = common::backend().await?;

    let reply = backend
        .call(Method::POST, "logIn", None, Some(json!({"email": "not-an-email"})))
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["success"], false);
    assert!(reply.body["errors"].is_object() || reply.body["errors"].is_array());
    Ok(())
}

#[tokio::test]
async fn sign_up_is_public_and_validated() -> Result<()> {
    let backend = common::backend().await?;

    let reply = backend
        .call(
            Method::POST,
            "signUp",
            None,
            Some(json!({"entreprise": "Acme", "nom": "Owner", "email": "owner@acme.test", "password": "short"})),
        )
        .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["errors"]["password"].is_string());
    Ok(())
}

#[tokio::test]
async fn logout_clears_session_cookie() -> Result<()> {
    let backend = common::backend().await?;

    let reply = backend.call(Method::POST, "logOut", None, None).await?;
    assert_eq!(reply.status, StatusCode::OK);

    let cookie = reply.set_cookie.unwrap_or_default();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("Max-Age=0"));
    Ok(())
}
