use crate::orm::{answer_references, answers, question_images, question_tags, questions, votes};
use crate::tag::{attach_tags, detach_tags, get_tag_by_name, get_tag_names_for_questions};
use crate::vote::{ledger::delete_votes_for, VoteTarget};
use chrono::Utc;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ConnectionTrait, DatabaseConnection, DbErr,
    PaginatorTrait, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;

pub const QUESTIONS_PER_PAGE: usize = 20;
/// Highest page number served. Keeps the row offset far from overflow.
pub const MAX_PAGE: usize = 100_000;

/// A question with its tags and images, as returned by the API.
#[derive(Clone, Debug, Serialize)]
pub struct QuestionForTemplate {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub views: i32,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl QuestionForTemplate {
    fn from_model(model: questions::Model, tags: Vec<String>, images: Vec<String>) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            description: model.description,
            images,
            tags,
            upvotes: model.upvotes,
            downvotes: model.downvotes,
            views: model.views,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Content accepted when asking a question.
pub struct NewQuestion<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub description: &'a str,
    pub images: &'a [String],
    pub tags: &'a [String],
}

/// Partial update; None leaves a field as it is.
#[derive(Default)]
pub struct QuestionChanges<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub images: Option<&'a [String]>,
    pub tags: Option<&'a [String]>,
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    question_id: i32,
    images: &[String],
) -> Result<(), DbErr> {
    for url in images.iter().map(|url| url.trim()).filter(|url| !url.is_empty()) {
        question_images::Entity::insert(question_images::ActiveModel {
            question_id: Set(question_id),
            url: Set(url.to_owned()),
            ..Default::default()
        })
        .exec(conn)
        .await?;
    }
    Ok(())
}

async fn get_images_for_questions<C: ConnectionTrait>(
    conn: &C,
    question_ids: &[i32],
) -> Result<HashMap<i32, Vec<String>>, DbErr> {
    let mut map: HashMap<i32, Vec<String>> = HashMap::new();
    if question_ids.is_empty() {
        return Ok(map);
    }

    for image in question_images::Entity::find()
        .filter(question_images::Column::QuestionId.is_in(question_ids.to_vec()))
        .order_by_asc(question_images::Column::Id)
        .all(conn)
        .await?
    {
        map.entry(image.question_id).or_default().push(image.url);
    }
    Ok(map)
}

/// Attaches tags and images to a page of question models.
async fn load_for_template<C: ConnectionTrait>(
    conn: &C,
    models: Vec<questions::Model>,
) -> Result<Vec<QuestionForTemplate>, DbErr> {
    let ids: Vec<i32> = models.iter().map(|q| q.id).collect();
    let mut tags = get_tag_names_for_questions(conn, &ids).await?;
    let mut images = get_images_for_questions(conn, &ids).await?;

    Ok(models
        .into_iter()
        .map(|q| {
            let id = q.id;
            QuestionForTemplate::from_model(
                q,
                tags.remove(&id).unwrap_or_default(),
                images.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}

/// Inserts a question with its images and tags. Tags must already be normalized.
pub async fn create_question(
    db: &DatabaseConnection,
    question: NewQuestion<'_>,
) -> Result<QuestionForTemplate, DbErr> {
    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;

    let id = questions::Entity::insert(questions::ActiveModel {
        user_id: Set(question.user_id),
        title: Set(question.title.to_owned()),
        description: Set(question.description.to_owned()),
        upvotes: Set(0),
        downvotes: Set(0),
        views: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    })
    .exec(&txn)
    .await?
    .last_insert_id;

    insert_images(&txn, id, question.images).await?;
    attach_tags(&txn, id, question.tags).await?;

    txn.commit().await?;

    get_question_for_template(db, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("question {} vanished after insert", id)))
}

pub async fn get_question_for_template<C: ConnectionTrait>(
    conn: &C,
    id: i32,
) -> Result<Option<QuestionForTemplate>, DbErr> {
    match questions::Entity::find_by_id(id).one(conn).await? {
        Some(model) => Ok(load_for_template(conn, vec![model]).await?.pop()),
        None => Ok(None),
    }
}

/// Counts a view and returns the question.
pub async fn view_question(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Option<QuestionForTemplate>, DbErr> {
    let res = questions::Entity::update_many()
        .col_expr(
            questions::Column::Views,
            Expr::col(questions::Column::Views).add(1),
        )
        .filter(questions::Column::Id.eq(id))
        .exec(db)
        .await?;

    if res.rows_affected == 0 {
        return Ok(None);
    }

    get_question_for_template(db, id).await
}

/// Newest questions first, optionally restricted to one tag. Pages start at 1;
/// numbers outside 1..=MAX_PAGE are clamped.
pub async fn get_questions_for_page(
    db: &DatabaseConnection,
    tag: Option<&str>,
    page: usize,
) -> Result<Vec<QuestionForTemplate>, DbErr> {
    let mut select = questions::Entity::find();

    if let Some(tag) = tag {
        match get_tag_by_name(db, tag).await? {
            Some(tag) => {
                select = select
                    .inner_join(question_tags::Entity)
                    .filter(question_tags::Column::TagId.eq(tag.id));
            }
            None => return Ok(Vec::new()),
        }
    }

    let models = select
        .order_by_desc(questions::Column::CreatedAt)
        .order_by_desc(questions::Column::Id)
        .paginate(db, QUESTIONS_PER_PAGE)
        .fetch_page(page.clamp(1, MAX_PAGE) - 1)
        .await?;

    load_for_template(db, models).await
}

pub async fn update_question(
    db: &DatabaseConnection,
    question: questions::Model,
    changes: QuestionChanges<'_>,
) -> Result<QuestionForTemplate, DbErr> {
    let id = question.id;
    let txn = db.begin().await?;

    let mut active: questions::ActiveModel = question.into();
    if let Some(title) = changes.title {
        active.title = Set(title.to_owned());
    }
    if let Some(description) = changes.description {
        active.description = Set(description.to_owned());
    }
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&txn).await?;

    if let Some(images) = changes.images {
        question_images::Entity::delete_many()
            .filter(question_images::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;
        insert_images(&txn, id, images).await?;
    }

    if let Some(tags) = changes.tags {
        detach_tags(&txn, id).await?;
        attach_tags(&txn, id, tags).await?;
    }

    txn.commit().await?;

    get_question_for_template(db, id)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("question {} vanished after update", id)))
}

/// Deletes a question and everything hanging off it.
pub async fn delete_question(db: &DatabaseConnection, id: i32) -> Result<(), DbErr> {
    let txn = db.begin().await?;

    let answer_ids: Vec<i32> = answers::Entity::find()
        .filter(answers::Column::QuestionId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    if !answer_ids.is_empty() {
        votes::Entity::delete_many()
            .filter(votes::Column::AnswerId.is_in(answer_ids.clone()))
            .exec(&txn)
            .await?;
        answer_references::Entity::delete_many()
            .filter(answer_references::Column::AnswerId.is_in(answer_ids))
            .exec(&txn)
            .await?;
        answers::Entity::delete_many()
            .filter(answers::Column::QuestionId.eq(id))
            .exec(&txn)
            .await?;
    }

    delete_votes_for(&txn, VoteTarget::Question(id)).await?;
    detach_tags(&txn, id).await?;
    question_images::Entity::delete_many()
        .filter(question_images::Column::QuestionId.eq(id))
        .exec(&txn)
        .await?;
    questions::Entity::delete_many()
        .filter(questions::Column::Id.eq(id))
        .exec(&txn)
        .await?;

    txn.commit().await
}
