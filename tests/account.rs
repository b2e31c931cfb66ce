#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use factrush::db::init_memory_db;
use factrush::orm::sessions;
use sea_orm::entity::*;
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_index() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);

    let req = test::TestRequest::get().uri("/").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_rt::test]
async fn test_register_validation() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);

    let cases = [
        (
            json!({ "email": "a@example.com", "password": "secret1", "confirm_password": "secret1" }),
            "Name is required.",
        ),
        (
            json!({ "name": "A", "email": "a@example.com", "password": "secret1", "confirm_password": "secret2" }),
            "Passwords do not match.",
        ),
        (
            json!({ "name": "A", "email": "a@example.com", "password": "abc", "confirm_password": "abc" }),
            "Password must be at least 6 characters.",
        ),
        (
            json!({ "name": "A", "email": "not-an-email", "password": "secret1", "confirm_password": "secret1" }),
            "Email must be a valid address.",
        ),
    ];

    for (body, message) in cases {
        let req = test::TestRequest::post()
            .uri("/auth/register")
            .set_json(body)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], message);
    }
}

#[actix_rt::test]
async fn test_register_duplicate_email() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);

    let res = test::call_service(
        &app,
        common::register_request("Ada", "ada@example.com").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password").is_none());

    let res = test::call_service(
        &app,
        common::register_request("Ada Again", "ADA@example.com").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], "This email is associated with another account.");
}

#[actix_rt::test]
async fn test_login_rejects_bad_credentials() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);
    sign_in!(app, "Ada", "ada@example.com");

    for (email, password) in [
        ("ada@example.com", "wrong password"),
        ("nobody@example.com", common::PASSWORD),
    ] {
        let res = test::call_service(&app, common::login_request(email, password).to_request()).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["message"], "Invalid email or password.");
    }
}

#[actix_rt::test]
async fn test_login_logout_round_trip() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);

    let req = test::TestRequest::get().uri("/auth/me").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let cookie = sign_in!(app, "Ada", "ada@example.com");
    assert_eq!(sessions::Entity::find().all(&db).await.unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .cookie(cookie.clone())
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["name"], "Ada");

    let req = test::TestRequest::post()
        .uri("/auth/logout")
        .cookie(cookie.clone())
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(sessions::Entity::find().all(&db).await.unwrap().len(), 0);

    // The old cookie no longer refers to a live session.
    let req = test::TestRequest::get()
        .uri("/auth/me")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn test_profile_and_password() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);
    let cookie = sign_in!(app, "Ada", "ada@example.com");
    sign_in!(app, "Grace", "grace@example.com");

    let req = test::TestRequest::patch()
        .uri("/auth/profile")
        .cookie(cookie.clone())
        .set_json(json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "occupation": " Mathematician ",
        }))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["name"], "Ada Lovelace");
    assert_eq!(profile["occupation"], "Mathematician");

    let req = test::TestRequest::patch()
        .uri("/auth/profile")
        .cookie(cookie.clone())
        .set_json(json!({ "name": "Ada", "email": "grace@example.com" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/auth/user/{}", profile["id"]))
        .cookie(cookie.clone())
        .to_request();
    let viewed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(viewed["name"], "Ada Lovelace");

    let req = test::TestRequest::post()
        .uri("/auth/password")
        .cookie(cookie.clone())
        .set_json(json!({ "current_password": "not it", "new_password": "newsecret" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/auth/password")
        .cookie(cookie)
        .set_json(json!({ "current_password": common::PASSWORD, "new_password": "newsecret" }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(
        &app,
        common::login_request("ada@example.com", "newsecret").to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/users").to_request();
    let users: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(users.as_array().unwrap().len(), 2);
}
