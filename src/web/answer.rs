use crate::answer::{
    clean_references, create_answer, delete_answer, get_answers_for_question, update_answer,
    Reference,
};
use crate::middleware::ClientCtx;
use crate::orm::{answers, questions};
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse, Responder};
use sea_orm::{entity::*, DatabaseConnection};
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_answers)
        .service(create_answer_post)
        .service(update_answer_patch)
        .service(destroy_answer);
}

#[derive(Deserialize)]
pub struct NewAnswerFormData {
    pub question_id: i32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub references: Vec<Reference>,
}

#[derive(Deserialize)]
pub struct EditAnswerFormData {
    #[serde(default)]
    pub text: String,
    pub references: Option<Vec<Reference>>,
}

fn internal_error(context: &str, e: sea_orm::DbErr) -> Error {
    log::error!("{}: {}", context, e);
    error::ErrorInternalServerError("Couldn't process answer.")
}

/// Loads an answer the client is allowed to change.
async fn get_answer_for_author(
    client: &ClientCtx,
    db: &DatabaseConnection,
    id: i32,
) -> Result<answers::Model, Error> {
    if client.get_id().is_none() {
        return Err(error::ErrorUnauthorized("You must be logged in to do that."));
    }

    let answer = answers::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| internal_error("get_answer_for_author", e))?
        .ok_or_else(|| error::ErrorNotFound("Answer not found."))?;

    if !client.is_author(answer.user_id) {
        return Err(error::ErrorForbidden("You may only change your own answers."));
    }

    Ok(answer)
}

#[get("/questions/{question_id}/answers")]
async fn view_answers(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question_id = path.into_inner();

    questions::Entity::find_by_id(question_id)
        .one(db.get_ref())
        .await
        .map_err(|e| internal_error("view_answers", e))?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    let answers = get_answers_for_question(&db, question_id)
        .await
        .map_err(|e| internal_error("view_answers", e))?;

    Ok(HttpResponse::Ok().json(answers))
}

#[post("/answers")]
async fn create_answer_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewAnswerFormData>,
) -> Result<impl Responder, Error> {
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to answer."))?;

    let text = form.text.trim();
    if text.is_empty() {
        return Err(error::ErrorBadRequest("Answer text is required."));
    }

    questions::Entity::find_by_id(form.question_id)
        .one(db.get_ref())
        .await
        .map_err(|e| internal_error("create_answer_post", e))?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    let references = clean_references(&form.references);
    let answer = create_answer(&db, form.question_id, user_id, text, &references)
        .await
        .map_err(|e| internal_error("create_answer_post", e))?;

    log::debug!("User {} answered question {}", user_id, form.question_id);
    Ok(HttpResponse::Created().json(answer))
}

#[patch("/answers/{answer_id}")]
async fn update_answer_patch(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<EditAnswerFormData>,
) -> Result<impl Responder, Error> {
    let answer = get_answer_for_author(&client, &db, path.into_inner()).await?;

    let text = form.text.trim();
    if text.is_empty() {
        return Err(error::ErrorBadRequest("Answer text is required."));
    }

    let references = form.references.as_deref().map(clean_references);
    let answer = update_answer(&db, answer, text, references.as_deref())
        .await
        .map_err(|e| internal_error("update_answer_patch", e))?;

    Ok(HttpResponse::Ok().json(answer))
}

#[delete("/answers/{answer_id}")]
async fn destroy_answer(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let answer = get_answer_for_author(&client, &db, path.into_inner()).await?;

    delete_answer(&db, answer.id)
        .await
        .map_err(|e| internal_error("destroy_answer", e))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Answer deleted successfully" })))
}
