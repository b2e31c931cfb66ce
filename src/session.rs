use crate::global::get_session_time;
use crate::orm::sessions;
use crate::user::{get_client_user_by_id, ClientUser};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, DbErr};
use uuid::Uuid;

/// Cookie key which holds the session token.
pub const SESSION_TOKEN: &str = "token";

/// Inserts a new login session for the user and returns its token.
pub async fn new_session(db: &DatabaseConnection, user_id: i32) -> Result<Uuid, DbErr> {
    let uuid = Uuid::new_v4();

    sessions::Entity::insert(sessions::ActiveModel {
        id: Set(uuid.to_string()),
        user_id: Set(user_id),
        expires_at: Set(Utc::now().naive_utc() + *get_session_time()),
    })
    .exec(db)
    .await?;

    Ok(uuid)
}

pub async fn remove_session(db: &DatabaseConnection, uuid: Uuid) -> Result<(), DbErr> {
    sessions::Entity::delete_many()
        .filter(sessions::Column::Id.eq(uuid.to_string()))
        .exec(db)
        .await?;
    Ok(())
}

/// Deletes every expired session. Returns the number removed.
pub async fn remove_expired_sessions(db: &DatabaseConnection) -> Result<u64, DbErr> {
    Ok(sessions::Entity::delete_many()
        .filter(sessions::Column::ExpiresAt.lte(Utc::now().naive_utc()))
        .exec(db)
        .await?
        .rows_affected)
}

/// Reads the session token from the cookie session.
pub fn get_session_token(cookies: &actix_session::Session) -> Option<Uuid> {
    match cookies.get::<String>(SESSION_TOKEN) {
        Ok(Some(token)) => match Uuid::parse_str(&token) {
            Ok(uuid) => Some(uuid),
            Err(e) => {
                log::warn!("get_session_token: parse_str() {}", e);
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::error!("get_session_token: cookies.get() {}", e);
            None
        }
    }
}

/// Resolves the cookie session to a user if it refers to a live session.
pub async fn authenticate_client_by_session(
    db: &DatabaseConnection,
    cookies: &actix_session::Session,
) -> Option<ClientUser> {
    let uuid = get_session_token(cookies)?;

    let session = match sessions::Entity::find_by_id(uuid.to_string()).one(db).await {
        Ok(Some(session)) => session,
        Ok(None) => return None,
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            return None;
        }
    };

    if session.expires_at <= Utc::now().naive_utc() {
        log::debug!("Session {} has expired.", uuid);
        return None;
    }

    match get_client_user_by_id(db, session.user_id).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("authenticate_client_by_session: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_db;
    use crate::orm::users;

    async fn insert_user(db: &DatabaseConnection) -> i32 {
        let now = Utc::now().naive_utc();
        users::Entity::insert(users::ActiveModel {
            name: Set("Ada".to_owned()),
            email: Set("ada@example.com".to_owned()),
            password: Set(String::new()),
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
        .await
        .unwrap()
        .last_insert_id
    }

    #[actix_rt::test]
    async fn test_remove_expired_sessions() {
        let db = init_memory_db().await.unwrap();
        let user_id = insert_user(&db).await;

        let live = new_session(&db, user_id).await.unwrap();
        sessions::Entity::insert(sessions::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id),
            expires_at: Set(Utc::now().naive_utc() - chrono::Duration::minutes(1)),
        })
        .exec(&db)
        .await
        .unwrap();

        assert_eq!(remove_expired_sessions(&db).await.unwrap(), 1);

        let remaining = sessions::Entity::find().all(&db).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, live.to_string());

        remove_session(&db, live).await.unwrap();
        assert!(sessions::Entity::find().one(&db).await.unwrap().is_none());
    }
}
