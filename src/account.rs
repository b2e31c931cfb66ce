use crate::orm::users;
use crate::user::{
    get_profile_by_id, get_user_by_email, hash_password, is_email_taken, is_valid_email,
    verify_password, UserProfile, MIN_PASSWORD_LENGTH,
};
use actix_web::{http::StatusCode, web, ResponseError};
use chrono::Utc;
use derive_more::Display;
use sea_orm::{entity::*, DatabaseConnection, DbErr};
use serde::Deserialize;

#[derive(Debug, Display)]
pub enum AccountError {
    #[display(fmt = "{}", _0)]
    Invalid(&'static str),
    #[display(fmt = "This email is associated with another account.")]
    EmailTaken,
    #[display(fmt = "Invalid email or password.")]
    BadCredentials,
    #[display(fmt = "Incorrect current password.")]
    IncorrectPassword,
    #[display(fmt = "User not found.")]
    NotFound,
    #[display(fmt = "Internal server error. Please try again.")]
    Internal,
}

impl std::error::Error for AccountError {}

impl From<DbErr> for AccountError {
    fn from(e: DbErr) -> Self {
        log::error!("account storage failure: {}", e);
        Self::Internal
    }
}

impl ResponseError for AccountError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Invalid(_) | Self::EmailTaken => StatusCode::BAD_REQUEST,
            Self::BadCredentials | Self::IncorrectPassword | Self::NotFound => {
                StatusCode::NOT_FOUND
            }
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterFormData {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileFormData {
    pub name: String,
    pub email: String,
    pub bio: Option<String>,
    pub occupation: Option<String>,
    pub institution: Option<String>,
    pub class: Option<String>,
    pub image: Option<String>,
}

/// Runs argon2 off the async executor.
async fn hash_in_pool(password: String) -> Result<String, AccountError> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| {
            log::error!("hash_in_pool: {}", e);
            AccountError::Internal
        })?
        .map_err(|e| {
            log::error!("hash_in_pool: {}", e);
            AccountError::Internal
        })
}

async fn verify_in_pool(password: String, hash: String) -> Result<bool, AccountError> {
    web::block(move || verify_password(&password, &hash))
        .await
        .map_err(|e| {
            log::error!("verify_in_pool: {}", e);
            AccountError::Internal
        })
}

fn validate_new_password(password: &str) -> Result<(), AccountError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AccountError::Invalid(
            "Password must be at least 6 characters.",
        ));
    }
    Ok(())
}

fn validate_registration(form: &RegisterFormData) -> Result<(), AccountError> {
    if form.name.trim().is_empty() {
        return Err(AccountError::Invalid("Name is required."));
    }
    if form.email.trim().is_empty() {
        return Err(AccountError::Invalid("Email is required."));
    }
    if form.password.is_empty() {
        return Err(AccountError::Invalid("Password is required."));
    }
    if form.confirm_password.is_empty() {
        return Err(AccountError::Invalid("Confirm password is required."));
    }
    if form.password != form.confirm_password {
        return Err(AccountError::Invalid("Passwords do not match."));
    }
    validate_new_password(&form.password)?;
    if !is_valid_email(form.email.trim()) {
        return Err(AccountError::Invalid("Email must be a valid address."));
    }
    Ok(())
}

pub async fn register(
    db: &DatabaseConnection,
    form: RegisterFormData,
) -> Result<users::Model, AccountError> {
    validate_registration(&form)?;

    let email = form.email.trim().to_lowercase();
    if is_email_taken(db, &email, None).await? {
        return Err(AccountError::EmailTaken);
    }

    let password = hash_in_pool(form.password).await?;
    let now = Utc::now().naive_utc();

    let id = users::Entity::insert(users::ActiveModel {
        name: Set(form.name.trim().to_owned()),
        email: Set(email),
        password: Set(password),
        bio: Set(String::new()),
        occupation: Set(String::new()),
        institution: Set(String::new()),
        class: Set(String::new()),
        image: Set(String::new()),
        streak: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .exec(db)
    .await?
    .last_insert_id;

    users::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or(AccountError::Internal)
}

/// Returns the user if the credentials match.
pub async fn login(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<users::Model, AccountError> {
    if email.trim().is_empty() {
        return Err(AccountError::Invalid("Email is required."));
    }
    if password.is_empty() {
        return Err(AccountError::Invalid("Password is required."));
    }

    let user = get_user_by_email(db, &email.trim().to_lowercase())
        .await?
        .ok_or(AccountError::BadCredentials)?;

    if !verify_in_pool(password.to_owned(), user.password.to_owned()).await? {
        return Err(AccountError::BadCredentials);
    }

    Ok(user)
}

pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i32,
    form: ProfileFormData,
) -> Result<UserProfile, AccountError> {
    let name = form.name.trim();
    let email = form.email.trim().to_lowercase();

    if name.is_empty() {
        return Err(AccountError::Invalid("Name is required."));
    }
    if email.is_empty() {
        return Err(AccountError::Invalid("Email is required."));
    }
    if !is_valid_email(&email) {
        return Err(AccountError::Invalid("Email must be a valid address."));
    }
    if is_email_taken(db, &email, Some(user_id)).await? {
        return Err(AccountError::EmailTaken);
    }

    let trimmed = |value: Option<String>| value.map(|v| v.trim().to_owned()).unwrap_or_default();

    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AccountError::NotFound)?;

    let mut active: users::ActiveModel = user.into();
    active.name = Set(name.to_owned());
    active.email = Set(email);
    active.bio = Set(trimmed(form.bio));
    active.occupation = Set(trimmed(form.occupation));
    active.institution = Set(trimmed(form.institution));
    active.class = Set(trimmed(form.class));
    active.image = Set(trimmed(form.image));
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await?;

    get_profile_by_id(db, user_id)
        .await?
        .ok_or(AccountError::NotFound)
}

pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i32,
    current_password: &str,
    new_password: &str,
) -> Result<(), AccountError> {
    let user = users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AccountError::NotFound)?;

    if !verify_in_pool(current_password.to_owned(), user.password.to_owned()).await? {
        return Err(AccountError::IncorrectPassword);
    }
    validate_new_password(new_password)?;

    let password = hash_in_pool(new_password.to_owned()).await?;

    let mut active: users::ActiveModel = user.into();
    active.password = Set(password);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, confirm: &str) -> RegisterFormData {
        RegisterFormData {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm.to_owned(),
        }
    }

    fn message(res: Result<(), AccountError>) -> String {
        res.unwrap_err().to_string()
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&form("Ada", "ada@example.com", "secret", "secret")).is_ok());
        assert_eq!(
            message(validate_registration(&form("", "ada@example.com", "secret", "secret"))),
            "Name is required."
        );
        assert_eq!(
            message(validate_registration(&form("Ada", "", "secret", "secret"))),
            "Email is required."
        );
        assert_eq!(
            message(validate_registration(&form("Ada", "ada@example.com", "", "secret"))),
            "Password is required."
        );
        assert_eq!(
            message(validate_registration(&form("Ada", "ada@example.com", "secret", ""))),
            "Confirm password is required."
        );
        assert_eq!(
            message(validate_registration(&form("Ada", "ada@example.com", "secret", "secreT"))),
            "Passwords do not match."
        );
        assert_eq!(
            message(validate_registration(&form("Ada", "ada@example.com", "short", "short"))),
            "Password must be at least 6 characters."
        );
        assert_eq!(
            message(validate_registration(&form("Ada", "ada-at-example", "secret", "secret"))),
            "Email must be a valid address."
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AccountError::Invalid("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AccountError::EmailTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AccountError::BadCredentials.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AccountError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
