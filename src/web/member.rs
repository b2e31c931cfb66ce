use crate::user::get_user_list;
use actix_web::{error, get, web, Error, HttpResponse, Responder};
use sea_orm::DatabaseConnection;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(view_members);
}

#[get("/users")]
async fn view_members(db: web::Data<DatabaseConnection>) -> Result<impl Responder, Error> {
    let users = get_user_list(db.get_ref()).await.map_err(|e| {
        log::error!("view_members: {}", e);
        error::ErrorInternalServerError("Couldn't load users.")
    })?;

    Ok(HttpResponse::Ok().json(users))
}
