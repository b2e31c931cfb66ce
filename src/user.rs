use crate::orm::users;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, FromQueryResult};
use serde::Serialize;

pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern must compile")
});

/// A mini struct for holding only what information we need about a client.
#[derive(Clone, Debug, FromQueryResult, Serialize)]
pub struct ClientUser {
    pub id: i32,
    pub name: String,
}

/// Public profile as shown to other members.
#[derive(Clone, Debug, FromQueryResult, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub bio: String,
    pub occupation: String,
    pub institution: String,
    pub class: String,
    pub image: String,
    pub streak: i32,
    pub created_at: chrono::NaiveDateTime,
}

/// Line item for the member list.
#[derive(Clone, Debug, FromQueryResult, Serialize)]
pub struct UserListItem {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub occupation: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Hashes a password into a PHC string with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))?
        .to_string())
}

/// Checks a password against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("verify_password: stored hash is unreadable: {}", e);
            false
        }
    }
}

pub async fn get_client_user_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<ClientUser>, DbErr> {
    users::Entity::find_by_id(id)
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Name)
        .into_model::<ClientUser>()
        .one(db)
        .await
}

pub async fn get_profile_by_id<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<Option<UserProfile>, DbErr> {
    users::Entity::find_by_id(id)
        .into_model::<UserProfile>()
        .one(db)
        .await
}

pub async fn get_user_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
}

/// Returns true if any account other than `except` uses this email.
pub async fn is_email_taken<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<i32>,
) -> Result<bool, DbErr> {
    let mut select = users::Entity::find().filter(users::Column::Email.eq(email));
    if let Some(id) = except {
        select = select.filter(users::Column::Id.ne(id));
    }
    Ok(select.one(db).await?.is_some())
}

pub async fn get_user_list<C: ConnectionTrait>(db: &C) -> Result<Vec<UserListItem>, DbErr> {
    users::Entity::find()
        .select_only()
        .column(users::Column::Id)
        .column(users::Column::Name)
        .column(users::Column::Image)
        .column(users::Column::Occupation)
        .order_by_desc(users::Column::CreatedAt)
        .order_by_desc(users::Column::Id)
        .into_model::<UserListItem>()
        .all(db)
        .await
}
