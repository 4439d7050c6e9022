mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, PASSWORD};

#[tokio::test]
async fn last_admin_can_be_demoted_only_after_another_is_promoted() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let (ada_id, ada) = app.member(&org, "ada@acme.test", "Ada").await;
    let (bob_id, bob) = app.member(&org, "bob@acme.test", "Bob").await;

    // Ada is the only admin
    let reply = app
        .put("/users/promote", &ada, json!({ "userId": ada_id, "role": "Member" }))
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    let reply = app.delete(&format!("/users/{}", ada_id), &ada).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    // Members cannot change roles
    let reply = app
        .put("/users/promote", &bob, json!({ "userId": bob_id, "role": "Admin" }))
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app
        .put("/users/promote", &ada, json!({ "userId": bob_id, "role": "Admin" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["role"], "Admin");

    // Now Ada may step down, and then Bob is the last admin again
    let reply = app
        .put("/users/promote", &ada, json!({ "userId": ada_id, "role": "Member" }))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["role"], "Member");

    let reply = app.delete(&format!("/users/{}", bob_id), &bob).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn email_is_unique_across_organizations() {
    let app = TestApp::new();
    let acme = app.create_organization("Acme").await;
    let globex = app.create_organization("Globex").await;
    app.member(&acme, "ada@acme.test", "Ada").await;

    let reply = app.signup(&globex, "ADA@acme.test", "Someone Else").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.error_code(), "CONFLICT");

    // Retrying with a fresh email succeeds
    let reply = app.signup(&globex, "ada@globex.test", "Someone Else").await;
    assert_eq!(reply.status, StatusCode::CREATED);
}

#[tokio::test]
async fn display_name_is_unique_within_an_organization_only() {
    let app = TestApp::new();
    let acme = app.create_organization("Acme").await;
    let globex = app.create_organization("Globex").await;
    app.member(&acme, "ada@acme.test", "Ada").await;

    let reply = app.signup(&acme, "ada2@acme.test", "Ada").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = app.signup(&globex, "ada@globex.test", "Ada").await;
    assert_eq!(reply.status, StatusCode::CREATED);
}

#[tokio::test]
async fn profile_update_changes_credentials() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let (_, ada) = app.member(&org, "ada@acme.test", "Ada").await;
    app.member(&org, "bob@acme.test", "Bob").await;

    let reply = app.put("/users", &ada, json!({ "displayName": "Bob" })).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);

    let reply = app
        .put(
            "/users",
            &ada,
            json!({ "email": "lovelace@acme.test", "password": "a much longer secret" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data()["email"], "lovelace@acme.test");

    let reply = app
        .call(
            axum::http::Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "lovelace@acme.test", "password": PASSWORD })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let reply = app
        .call(
            axum::http::Method::POST,
            "/auth/login",
            None,
            Some(json!({ "email": "lovelace@acme.test", "password": "a much longer secret" })),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_creates_users_and_members_cannot() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let (_, ada) = app.member(&org, "ada@acme.test", "Ada").await;

    let body = json!({
        "email": "carol@acme.test",
        "displayName": "Carol",
        "password": PASSWORD,
        "role": "Admin",
    });
    let reply = app.post("/users", &ada, body).await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.data()["role"], "Admin");

    let (_, bob) = app.member(&org, "bob@acme.test", "Bob").await;
    let body = json!({ "email": "dan@acme.test", "displayName": "Dan", "password": PASSWORD });
    let reply = app.post("/users", &bob, body).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.get("/users", &bob).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.data().as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn users_of_other_organizations_are_invisible() {
    let app = TestApp::new();
    let acme = app.create_organization("Acme").await;
    let globex = app.create_organization("Globex").await;
    let (_, ada) = app.member(&acme, "ada@acme.test", "Ada").await;
    let (hank_id, _) = app.member(&globex, "hank@globex.test", "Hank").await;

    let reply = app.get(&format!("/users/{}", hank_id), &ada).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app.delete(&format!("/users/{}", hank_id), &ada).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);

    let reply = app
        .put("/users/promote", &ada, json!({ "userId": hank_id, "role": "Member" }))
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_twice_is_not_found() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let (_, ada) = app.member(&org, "ada@acme.test", "Ada").await;
    let (bob_id, _) = app.member(&org, "bob@acme.test", "Bob").await;

    let reply = app.delete(&format!("/users/{}", bob_id), &ada).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.data().is_null());

    let reply = app.delete(&format!("/users/{}", bob_id), &ada).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn member_may_delete_only_themselves() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let (ada_id, _) = app.member(&org, "ada@acme.test", "Ada").await;
    let (bob_id, bob) = app.member(&org, "bob@acme.test", "Bob").await;

    let reply = app.delete(&format!("/users/{}", ada_id), &bob).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    let reply = app.delete(&format!("/users/{}", bob_id), &bob).await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_user_id_is_a_bad_request() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let (_, ada) = app.member(&org, "ada@acme.test", "Ada").await;

    let reply = app.get("/users/not-a-uuid", &ada).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
