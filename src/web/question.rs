use crate::middleware::ClientCtx;
use crate::orm::questions;
use crate::question::{
    create_question, delete_question, get_questions_for_page, update_question, view_question,
    NewQuestion, QuestionChanges,
};
use crate::tag::normalize_tags;
use actix_web::{delete, error, get, patch, post, web, Error, HttpResponse, Responder};
use sea_orm::{entity::*, DatabaseConnection};
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_questions)
        .service(create_question_post)
        .service(view_question_by_id)
        .service(update_question_patch)
        .service(destroy_question);
}

#[derive(Deserialize)]
pub struct QuestionListQuery {
    pub tag: Option<String>,
    pub page: Option<usize>,
}

#[derive(Deserialize)]
pub struct NewQuestionFormData {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Deserialize)]
pub struct EditQuestionFormData {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Loads a question the client is allowed to change.
async fn get_question_for_author(
    client: &ClientCtx,
    db: &DatabaseConnection,
    id: i32,
) -> Result<questions::Model, Error> {
    if client.get_id().is_none() {
        return Err(error::ErrorUnauthorized("You must be logged in to do that."));
    }

    let question = questions::Entity::find_by_id(id)
        .one(db)
        .await
        .map_err(|e| {
            log::error!("get_question_for_author: {}", e);
            error::ErrorInternalServerError("Couldn't load question.")
        })?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    if !client.is_author(question.user_id) {
        return Err(error::ErrorForbidden("You may only change your own questions."));
    }

    Ok(question)
}

/// Rejects fields that were sent but are blank.
fn require_text<'a>(
    value: Option<&'a str>,
    message: &'static str,
) -> Result<Option<&'a str>, Error> {
    match value.map(str::trim) {
        Some("") => Err(error::ErrorBadRequest(message)),
        other => Ok(other),
    }
}

#[get("/questions")]
async fn view_questions(
    db: web::Data<DatabaseConnection>,
    query: web::Query<QuestionListQuery>,
) -> Result<impl Responder, Error> {
    let tag = query.tag.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let questions = get_questions_for_page(&db, tag, query.page.unwrap_or(1))
        .await
        .map_err(|e| {
            log::error!("view_questions: {}", e);
            error::ErrorInternalServerError("Couldn't load questions.")
        })?;

    Ok(HttpResponse::Ok().json(questions))
}

#[post("/questions")]
async fn create_question_post(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<NewQuestionFormData>,
) -> Result<impl Responder, Error> {
    let user_id = client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to ask a question."))?;

    let title = form.title.trim();
    let description = form.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(error::ErrorBadRequest("Title and description are required."));
    }

    let tags = normalize_tags(&form.tags);
    let question = create_question(
        &db,
        NewQuestion {
            user_id,
            title,
            description,
            images: &form.images,
            tags: &tags,
        },
    )
    .await
    .map_err(|e| {
        log::error!("create_question_post: {}", e);
        error::ErrorInternalServerError("Couldn't save question.")
    })?;

    log::debug!("User {} asked question {}", user_id, question.id);
    Ok(HttpResponse::Created().json(question))
}

#[get("/questions/{question_id}")]
async fn view_question_by_id(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = view_question(&db, path.into_inner())
        .await
        .map_err(|e| {
            log::error!("view_question_by_id: {}", e);
            error::ErrorInternalServerError("Couldn't load question.")
        })?
        .ok_or_else(|| error::ErrorNotFound("Question not found."))?;

    Ok(HttpResponse::Ok().json(question))
}

#[patch("/questions/{question_id}")]
async fn update_question_patch(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    form: web::Json<EditQuestionFormData>,
) -> Result<impl Responder, Error> {
    let question = get_question_for_author(&client, &db, path.into_inner()).await?;

    let tags = form.tags.as_deref().map(normalize_tags);
    let changes = QuestionChanges {
        title: require_text(form.title.as_deref(), "Title cannot be empty.")?,
        description: require_text(form.description.as_deref(), "Description cannot be empty.")?,
        images: form.images.as_deref(),
        tags: tags.as_deref(),
    };

    let question = update_question(&db, question, changes).await.map_err(|e| {
        log::error!("update_question_patch: {}", e);
        error::ErrorInternalServerError("Couldn't save question.")
    })?;

    Ok(HttpResponse::Ok().json(question))
}

#[delete("/questions/{question_id}")]
async fn destroy_question(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    let question = get_question_for_author(&client, &db, path.into_inner()).await?;

    delete_question(&db, question.id).await.map_err(|e| {
        log::error!("destroy_question: {}", e);
        error::ErrorInternalServerError("Couldn't delete question.")
    })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Question deleted successfully" })))
}
