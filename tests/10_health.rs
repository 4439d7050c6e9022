mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn binary_serves_health_and_banner() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/health", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["store"], "memory");

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let _body = res.json::<Value>().await?;
    Ok(())
}

#[tokio::test]
async fn binary_round_trips_a_session() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/organizations", server.base_url))
        .json(&json!({ "name": "Smoke Org" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let org_id = res.json::<Value>().await?["data"]["id"].as_str().unwrap_or_default().to_string();

    let res = client
        .post(format!("{}/auth/signup", server.base_url))
        .json(&json!({
            "organizationId": org_id,
            "email": "smoke@example.com",
            "displayName": "Smoke",
            "password": common::PASSWORD,
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/auth/login", server.base_url))
        .json(&json!({ "email": "smoke@example.com", "password": common::PASSWORD }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let token = res.json::<Value>().await?["data"]["token"].as_str().unwrap_or_default().to_string();

    let res = client
        .get(format!("{}/auth/whoami", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["user"]["email"], "smoke@example.com");
    assert_eq!(body["data"]["user"]["role"], "Admin");
    Ok(())
}
