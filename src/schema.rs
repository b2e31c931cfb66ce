use crate::orm::{
    answer_references, answers, question_images, question_tags, questions, sessions, tags, users,
    votes,
};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, Schema, Statement};

/// Creates every table and index the application needs if they do not already exist.
///
/// Tables are created in foreign key order.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, sessions::Entity).await?;
    create_table(db, questions::Entity).await?;
    create_table(db, question_images::Entity).await?;
    create_table(db, tags::Entity).await?;
    create_table(db, question_tags::Entity).await?;
    create_table(db, answers::Entity).await?;
    create_table(db, answer_references::Entity).await?;
    create_table(db, votes::Entity).await?;

    let backend = db.get_database_backend();
    for index in INDEXES {
        db.execute(Statement::from_string(backend, index.to_sql()))
            .await?;
    }

    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = Schema::new(backend).create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// A secondary index created at startup.
struct IndexDef {
    name: &'static str,
    table: &'static str,
    columns: &'static [&'static str],
    unique: bool,
}

impl IndexDef {
    /// Postgres and SQLite both accept `IF NOT EXISTS`, so restarts are harmless.
    fn to_sql(&self) -> String {
        format!(
            "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            self.table,
            self.columns.join(", ")
        )
    }
}

/// The vote ledger holds one row per user per target. NULLs never collide in a
/// unique index, so each index only constrains its own kind of target.
const INDEXES: &[IndexDef] = &[
    IndexDef {
        name: "idx_votes_user_question",
        table: "votes",
        columns: &["user_id", "question_id"],
        unique: true,
    },
    IndexDef {
        name: "idx_votes_user_answer",
        table: "votes",
        columns: &["user_id", "answer_id"],
        unique: true,
    },
    IndexDef {
        name: "idx_question_tags_pair",
        table: "question_tags",
        columns: &["question_id", "tag_id"],
        unique: true,
    },
    IndexDef {
        name: "idx_answers_question",
        table: "answers",
        columns: &["question_id"],
        unique: false,
    },
];
