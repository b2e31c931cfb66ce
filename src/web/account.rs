use crate::account::{
    change_password, login, register, update_profile, AccountError, ProfileFormData,
    RegisterFormData,
};
use crate::middleware::ClientCtx;
use crate::session::{get_session_token, new_session, remove_session, SESSION_TOKEN};
use crate::user::get_profile_by_id;
use actix_session::Session;
use actix_web::{error, get, patch, post, web, Error, HttpResponse, Responder};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

pub(super) fn configure(conf: &mut web::ServiceConfig) {
    conf.service(post_register)
        .service(post_login)
        .service(post_logout)
        .service(view_me)
        .service(view_user)
        .service(update_account)
        .service(post_password);
}

#[derive(Deserialize)]
pub struct LoginFormData {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct PasswordFormData {
    #[serde(default, alias = "currentPassword")]
    current_password: String,
    #[serde(default, alias = "newPassword")]
    new_password: String,
}

fn require_login(client: &ClientCtx) -> Result<i32, Error> {
    client
        .get_id()
        .ok_or_else(|| error::ErrorUnauthorized("You must be logged in to do that."))
}

#[post("/auth/register")]
async fn post_register(
    db: web::Data<DatabaseConnection>,
    form: web::Json<RegisterFormData>,
) -> Result<impl Responder, Error> {
    let user = register(&db, form.into_inner()).await?;

    log::info!("Registered user {} ({})", user.id, user.name);
    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    })))
}

#[post("/auth/login")]
async fn post_login(
    db: web::Data<DatabaseConnection>,
    cookies: Session,
    form: web::Json<LoginFormData>,
) -> Result<impl Responder, Error> {
    let user = login(&db, &form.email, &form.password).await?;

    let uuid = new_session(&db, user.id).await.map_err(AccountError::from)?;
    cookies.renew();
    cookies
        .insert(SESSION_TOKEN, uuid.to_string())
        .map_err(|e| {
            log::error!("post_login: cookies.insert() {}", e);
            AccountError::Internal
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    })))
}

#[post("/auth/logout")]
async fn post_logout(
    db: web::Data<DatabaseConnection>,
    cookies: Session,
) -> Result<impl Responder, Error> {
    match get_session_token(&cookies) {
        Some(uuid) => {
            if let Err(e) = remove_session(&db, uuid).await {
                log::error!("post_logout: remove_session() {}", e);
            }
        }
        None => log::debug!("post_logout: missing token"),
    }

    cookies.purge();
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Logged out successfully" })))
}

#[get("/auth/me")]
async fn view_me(client: ClientCtx) -> Result<impl Responder, Error> {
    let id = require_login(&client)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": id,
        "name": client.get_name(),
    })))
}

#[get("/auth/user/{user_id}")]
async fn view_user(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<impl Responder, Error> {
    require_login(&client)?;

    let profile = get_profile_by_id(db.get_ref(), path.into_inner())
        .await
        .map_err(AccountError::from)?
        .ok_or(AccountError::NotFound)?;

    Ok(HttpResponse::Ok().json(profile))
}

#[patch("/auth/profile")]
async fn update_account(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<ProfileFormData>,
) -> Result<impl Responder, Error> {
    let id = require_login(&client)?;
    let profile = update_profile(&db, id, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[post("/auth/password")]
async fn post_password(
    client: ClientCtx,
    db: web::Data<DatabaseConnection>,
    form: web::Json<PasswordFormData>,
) -> Result<impl Responder, Error> {
    let id = require_login(&client)?;
    change_password(&db, id, &form.current_password, &form.new_password).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "Password updated successfully" })))
}
