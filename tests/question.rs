#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use factrush::db::init_memory_db;
use factrush::orm::{answers, question_tags, questions, tags, votes};
use sea_orm::{entity::*, query::*};
use serde_json::{json, Value};

#[actix_rt::test]
async fn test_question_lifecycle() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);
    let author = sign_in!(app, "Author", "author@example.com");
    let other = sign_in!(app, "Other", "other@example.com");

    // Anonymous users may not ask.
    let req = test::TestRequest::post()
        .uri("/questions")
        .set_json(json!({ "title": "t", "description": "d" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/questions")
        .cookie(author.clone())
        .set_json(json!({ "title": "  ", "description": "d" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/questions")
        .cookie(author.clone())
        .set_json(json!({
            "title": "How do vaccines work?",
            "description": "Specifically mRNA ones.",
            "images": ["https://example.com/cell.png"],
            "tags": ["Biology", " biology", "Medicine", ""],
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let question: Value = test::read_body_json(res).await;
    assert_eq!(question["tags"], json!(["biology", "medicine"]));
    assert_eq!(question["images"], json!(["https://example.com/cell.png"]));
    let id = question["id"].as_i64().unwrap();

    // Viewing counts.
    for expected in 1..=2 {
        let req = test::TestRequest::get()
            .uri(&format!("/questions/{}", id))
            .to_request();
        let viewed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(viewed["views"], expected);
    }

    let req = test::TestRequest::get().uri("/questions/9999").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // Tag filter.
    let req = test::TestRequest::get().uri("/questions?tag=Medicine").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let req = test::TestRequest::get().uri("/questions?tag=physics").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert!(listed.as_array().unwrap().is_empty());

    let req = test::TestRequest::get().uri("/tags").to_request();
    let popular: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(popular.as_array().unwrap().len(), 2);

    // Only the author may edit.
    let req = test::TestRequest::patch()
        .uri(&format!("/questions/{}", id))
        .cookie(other.clone())
        .set_json(json!({ "title": "Hijacked" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/questions/{}", id))
        .cookie(author.clone())
        .set_json(json!({ "title": "How do mRNA vaccines work?", "tags": ["immunology"] }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["title"], "How do mRNA vaccines work?");
    assert_eq!(updated["description"], "Specifically mRNA ones.");
    assert_eq!(updated["tags"], json!(["immunology"]));

    let biology = tags::Entity::find()
        .filter(tags::Column::Name.eq("biology"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(biology.count, 0);

    let req = test::TestRequest::delete()
        .uri(&format!("/questions/{}", id))
        .cookie(other)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn test_delete_question_removes_votes() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);
    let author = sign_in!(app, "Author", "author@example.com");
    let voter = sign_in!(app, "Voter", "voter@example.com");

    let req = test::TestRequest::post()
        .uri("/questions")
        .cookie(author.clone())
        .set_json(json!({ "title": "Is Pluto a planet?", "description": "Still?", "tags": ["astronomy"] }))
        .to_request();
    let question: Value = test::call_and_read_body_json(&app, req).await;
    let id = question["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri("/answers")
        .cookie(voter.clone())
        .set_json(json!({
            "question_id": id,
            "text": "It is a dwarf planet.",
            "references": [{ "title": "IAU", "url": "https://www.iau.org/" }],
        }))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let answer: Value = test::read_body_json(res).await;
    assert_eq!(answer["references"][0]["title"], "IAU");

    for body in [json!({ "question_id": id }), json!({ "answer_id": answer["id"] })] {
        let req = test::TestRequest::post()
            .uri("/vote/up")
            .cookie(voter.clone())
            .set_json(body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }
    assert_eq!(votes::Entity::find().all(&db).await.unwrap().len(), 2);

    let req = test::TestRequest::delete()
        .uri(&format!("/questions/{}", id))
        .cookie(author)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    assert!(questions::Entity::find().one(&db).await.unwrap().is_none());
    assert!(answers::Entity::find().one(&db).await.unwrap().is_none());
    assert!(question_tags::Entity::find().one(&db).await.unwrap().is_none());
    assert!(votes::Entity::find().one(&db).await.unwrap().is_none());

    let astronomy = tags::Entity::find().one(&db).await.unwrap().unwrap();
    assert_eq!(astronomy.count, 0);
}

#[actix_rt::test]
async fn test_answer_ownership() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);
    let author = sign_in!(app, "Author", "author@example.com");
    let other = sign_in!(app, "Other", "other@example.com");

    let req = test::TestRequest::post()
        .uri("/answers")
        .cookie(author.clone())
        .set_json(json!({ "question_id": 42, "text": "Orphan." }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri("/questions")
        .cookie(author.clone())
        .set_json(json!({ "title": "Why is ice slippery?", "description": "Pressure melting?" }))
        .to_request();
    let question: Value = test::call_and_read_body_json(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/answers")
        .cookie(author.clone())
        .set_json(json!({ "question_id": question["id"], "text": "A thin liquid-like surface layer." }))
        .to_request();
    let answer: Value = test::call_and_read_body_json(&app, req).await;
    let path = format!("/answers/{}", answer["id"]);

    let req = test::TestRequest::patch()
        .uri(&path)
        .cookie(other.clone())
        .set_json(json!({ "text": "Mine now." }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&path)
        .cookie(author.clone())
        .set_json(json!({ "text": "" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&path)
        .cookie(author.clone())
        .set_json(json!({ "text": "Premelting at the surface." }))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["text"], "Premelting at the surface.");

    let req = test::TestRequest::delete()
        .uri(&path)
        .cookie(author)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/questions/{}/answers", question["id"]))
        .to_request();
    let answers: Value = test::call_and_read_body_json(&app, req).await;
    assert!(answers.as_array().unwrap().is_empty());
}

#[actix_rt::test]
async fn test_question_list_page_bounds() {
    let db = init_memory_db().await.unwrap();
    let app = test_app!(db);
    let author = sign_in!(app, "Author", "author@example.com");

    let req = test::TestRequest::post()
        .uri("/questions")
        .cookie(author)
        .set_json(json!({ "title": "What is dark matter?", "description": "Is it matter at all?" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::get().uri("/questions?page=0").to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/questions?page={}", usize::MAX))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let listed: Value = test::read_body_json(res).await;
    assert!(listed.as_array().unwrap().is_empty());
}
