use crate::middleware::ClientCtx;
use crate::orm::votes::Direction;
use crate::vote::{cast_downvote, cast_upvote, VoteError, VoteOutcome, VoteTarget};
use actix_web::{post, web, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(post_upvote).service(post_downvote);
}

#[derive(Debug, Deserialize)]
pub struct VoteFormData {
    pub question_id: Option<i32>,
    pub answer_id: Option<i32>,
}

#[post("/vote/up")]
async fn post_upvote(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<VoteFormData>,
) -> Result<impl Responder, VoteError> {
    vote(client, &db, &form, Direction::Upvote).await
}

#[post("/vote/down")]
async fn post_downvote(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<VoteFormData>,
) -> Result<impl Responder, VoteError> {
    vote(client, &db, &form, Direction::Downvote).await
}

async fn vote(
    client: ClientCtx,
    db: &DatabaseConnection,
    form: &VoteFormData,
    direction: Direction,
) -> Result<HttpResponse, VoteError> {
    let user_id = client.get_id().ok_or(VoteError::Unauthorized)?;
    let target = VoteTarget::from_ids(form.question_id, form.answer_id)?;

    let outcome = match direction {
        Direction::Upvote => cast_upvote(db, user_id, target).await?,
        Direction::Downvote => cast_downvote(db, user_id, target).await?,
    };
    let body = serde_json::json!({ "message": outcome.message(direction) });

    Ok(match outcome {
        VoteOutcome::Cast => HttpResponse::Created().json(body),
        VoteOutcome::AlreadyCast => HttpResponse::Ok().json(body),
    })
}
