use crate::orm::{answer_references, answers};
use crate::vote::{ledger::delete_votes_for, VoteTarget};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A citation attached to an answer.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Reference {
    pub title: String,
    pub url: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerForTemplate {
    pub id: i32,
    pub question_id: i32,
    pub user_id: i32,
    pub text: String,
    pub references: Vec<Reference>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl AnswerForTemplate {
    fn from_model(model: answers::Model, references: Vec<Reference>) -> Self {
        Self {
            id: model.id,
            question_id: model.question_id,
            user_id: model.user_id,
            text: model.text,
            references,
            upvotes: model.upvotes,
            downvotes: model.downvotes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Drops references missing a title or url.
pub fn clean_references(references: &[Reference]) -> Vec<Reference> {
    references
        .iter()
        .map(|r| Reference {
            title: r.title.trim().to_owned(),
            url: r.url.trim().to_owned(),
        })
        .filter(|r| !r.title.is_empty() && !r.url.is_empty())
        .collect()
}

async fn insert_references<C: ConnectionTrait>(
    conn: &C,
    answer_id: i32,
    references: &[Reference],
) -> Result<(), DbErr> {
    for reference in references {
        answer_references::Entity::insert(answer_references::ActiveModel {
            answer_id: Set(answer_id),
            title: Set(reference.title.to_owned()),
            url: Set(reference.url.to_owned()),
            ..Default::default()
        })
        .exec(conn)
        .await?;
    }
    Ok(())
}

async fn get_references_for_answers<C: ConnectionTrait>(
    conn: &C,
    answer_ids: &[i32],
) -> Result<HashMap<i32, Vec<Reference>>, DbErr> {
    let mut map: HashMap<i32, Vec<Reference>> = HashMap::new();
    if answer_ids.is_empty() {
        return Ok(map);
    }

    for row in answer_references::Entity::find()
        .filter(answer_references::Column::AnswerId.is_in(answer_ids.to_vec()))
        .order_by_asc(answer_references::Column::Id)
        .all(conn)
        .await?
    {
        map.entry(row.answer_id).or_default().push(Reference {
            title: row.title,
            url: row.url,
        });
    }
    Ok(map)
}

async fn load_for_template<C: ConnectionTrait>(
    conn: &C,
    models: Vec<answers::Model>,
) -> Result<Vec<AnswerForTemplate>, DbErr> {
    let ids: Vec<i32> = models.iter().map(|a| a.id).collect();
    let mut references = get_references_for_answers(conn, &ids).await?;

    Ok(models
        .into_iter()
        .map(|a| {
            let id = a.id;
            AnswerForTemplate::from_model(a, references.remove(&id).unwrap_or_default())
        })
        .collect())
}

pub async fn get_answer_for_template<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<AnswerForTemplate>, DbErr> {
    match answers::Entity::find_by_id(id).one(conn).await? {
        Some(model) => Ok(load_for_template(conn, vec![model]).await?.pop()),
        None => Ok(None),
    }
}

/// Answers to a question, best score first and then oldest first.
pub async fn get_answers_for_question(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<Vec<AnswerForTemplate>, DbErr> {
    let models = answers::Entity::find()
        .filter(answers::Column::QuestionId.eq(question_id))
        .order_by_desc(Expr::cust("upvotes - downvotes"))
        .order_by_asc(answers::Column::CreatedAt)
        .order_by_asc(answers::Column::Id)
        .all(db)
        .await?;

    load_for_template(db, models).await
}

pub async fn create_answer(
    db: &DatabaseConnection,
    question_id: i32,
    user_id: i32,
    text: &str,
    references: &[Reference],
) -> Result<AnswerForTemplate, DbErr> {
    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;

    let id = answers::Entity::insert(answers::ActiveModel {
        question_id: Set(question_id),
        user_id: Set(user_id),
        text: Set(text.to_owned()),
        upvotes: Set(0),
        downvotes: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .exec(&txn)
    .await?
    .last_insert_id;

    insert_references(&txn, id, references).await?;
    txn.commit().await?;

    get_answer_for_template(db, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("answer {} vanished after insert", id)))
}

/// Replaces the answer's text, and its references when given.
pub async fn update_answer(
    db: &DatabaseConnection,
    answer: answers::Model,
    text: &str,
    references: Option<&[Reference]>,
) -> Result<AnswerForTemplate, DbErr> {
    let id = answer.id;
    let txn = db.begin().await?;

    let mut active: answers::ActiveModel = answer.into();
    active.text = Set(text.to_owned());
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&txn).await?;

    if let Some(references) = references {
        answer_references::Entity::delete_many()
            .filter(answer_references::Column::AnswerId.eq(id))
            .exec(&txn)
            .await?;
        insert_references(&txn, id, references).await?;
    }

    txn.commit().await?;

    get_answer_for_template(db, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("answer {} vanished after update", id)))
}

pub async fn delete_answer(db: &DatabaseConnection, id: i32) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    delete_votes_for(&txn, VoteTarget::Answer(id)).await?;
    answer_references::Entity::delete_many()
        .filter(answer_references::Column::AnswerId.eq(id))
        .exec(&txn)
        .await?;
    answers::Entity::delete_many()
        .filter(answers::Column::Id.eq(id))
        .exec(&txn)
        .await?;

    txn.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_references() {
        let refs = clean_references(&[
            Reference {
                title: " Feynman Lectures ".to_owned(),
                url: " https://www.feynmanlectures.caltech.edu/ ".to_owned(),
            },
            Reference {
                title: "".to_owned(),
                url: "https://example.com".to_owned(),
            },
            Reference {
                title: "No link".to_owned(),
                url: "   ".to_owned(),
            },
        ]);
        assert_eq!(
            refs,
            vec![Reference {
                title: "Feynman Lectures".to_owned(),
                url: "https://www.feynmanlectures.caltech.edu/".to_owned(),
            }]
        );
    }
}
