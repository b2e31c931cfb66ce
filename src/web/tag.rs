use crate::tag::get_popular_tags;
use actix_web::{error, get, web, Error, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

const DEFAULT_TAG_LIMIT: u64 = 10;
const MAX_TAG_LIMIT: u64 = 100;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_tags);
}

#[derive(Deserialize)]
pub struct TagListQuery {
    pub limit: Option<u64>,
}

#[get("/tags")]
async fn view_tags(
    db: web::Data<DatabaseConnection>,
    query: web::Query<TagListQuery>,
) -> Result<impl Responder, Error> {
    let limit = query.limit.unwrap_or(DEFAULT_TAG_LIMIT).clamp(1, MAX_TAG_LIMIT);

    let tags = get_popular_tags(db.get_ref(), limit).await.map_err(|e| {
        log::error!("view_tags: {}", e);
        error::ErrorInternalServerError("Couldn't load tags.")
    })?;

    Ok(HttpResponse::Ok().json(tags))
}
