use crate::orm::{question_tags, tags};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr, FromQueryResult};
use serde::Serialize;
use std::collections::HashMap;

pub const MAX_TAGS_PER_QUESTION: usize = 5;
pub const MAX_TAG_LENGTH: usize = 35;

/// Tag line item for listings.
#[derive(Clone, Debug, FromQueryResult, Serialize)]
pub struct TagForTemplate {
    pub id: i32,
    pub name: String,
    pub count: i32,
}

/// Trims, lowercases and deduplicates user supplied tags.
/// Empty and overlong tags are dropped and at most MAX_TAGS_PER_QUESTION are kept.
pub fn normalize_tags<S: AsRef<str>>(input: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_TAGS_PER_QUESTION);
    for tag in input {
        let tag = tag.as_ref().trim().to_lowercase();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LENGTH || out.contains(&tag) {
            continue;
        }
        out.push(tag);
        if out.len() == MAX_TAGS_PER_QUESTION {
            break;
        }
    }
    out
}

/// Returns the tag's id, creating the tag if needed.
async fn get_or_create_tag<C: ConnectionTrait>(conn: &C, name: &str) -> Result<i32, DbErr> {
    if let Some(tag) = tags::Entity::find()
        .filter(tags::Column::Name.eq(name))
        .one(conn)
        .await?
    {
        return Ok(tag.id);
    }

    Ok(tags::Entity::insert(tags::ActiveModel {
        name: Set(name.to_owned()),
        count: Set(0),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    })
    .exec(conn)
    .await?
    .last_insert_id)
}

/// Links normalized tags to a question and bumps each tag's count.
pub async fn attach_tags<C: ConnectionTrait>(
    conn: &C,
    question_id: i32,
    names: &[String],
) -> Result<(), DbErr> {
    for name in names {
        let tag_id = get_or_create_tag(conn, name).await?;

        question_tags::Entity::insert(question_tags::ActiveModel {
            question_id: Set(question_id),
            tag_id: Set(tag_id),
            ..Default::default()
        })
        .exec(conn)
        .await?;

        tags::Entity::update_many()
            .col_expr(tags::Column::Count, Expr::col(tags::Column::Count).add(1))
            .filter(tags::Column::Id.eq(tag_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

/// Unlinks every tag from a question and lowers each tag's count.
pub async fn detach_tags<C: ConnectionTrait>(conn: &C, question_id: i32) -> Result<(), DbErr> {
    let links = question_tags::Entity::find()
        .filter(question_tags::Column::QuestionId.eq(question_id))
        .all(conn)
        .await?;

    if links.is_empty() {
        return Ok(());
    }

    let tag_ids: Vec<i32> = links.iter().map(|link| link.tag_id).collect();

    question_tags::Entity::delete_many()
        .filter(question_tags::Column::QuestionId.eq(question_id))
        .exec(conn)
        .await?;

    tags::Entity::update_many()
        .col_expr(tags::Column::Count, Expr::col(tags::Column::Count).sub(1))
        .filter(tags::Column::Id.is_in(tag_ids))
        .filter(tags::Column::Count.gt(0))
        .exec(conn)
        .await?;

    Ok(())
}

/// Returns tag names keyed by question id.
pub async fn get_tag_names_for_questions<C: ConnectionTrait>(
    conn: &C,
    question_ids: &[i32],
) -> Result<HashMap<i32, Vec<String>>, DbErr> {
    #[derive(FromQueryResult)]
    struct QuestionTagName {
        question_id: i32,
        name: String,
    }

    let mut map: HashMap<i32, Vec<String>> = HashMap::new();
    if question_ids.is_empty() {
        return Ok(map);
    }

    let rows = question_tags::Entity::find()
        .select_only()
        .column(question_tags::Column::QuestionId)
        .column_as(tags::Column::Name, "name")
        .inner_join(tags::Entity)
        .filter(question_tags::Column::QuestionId.is_in(question_ids.to_vec()))
        .order_by_asc(question_tags::Column::Id)
        .into_model::<QuestionTagName>()
        .all(conn)
        .await?;

    for row in rows {
        map.entry(row.question_id).or_default().push(row.name);
    }
    Ok(map)
}

pub async fn get_tag_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> Result<Option<tags::Model>, DbErr> {
    tags::Entity::find()
        .filter(tags::Column::Name.eq(name.trim().to_lowercase()))
        .one(conn)
        .await
}

/// Most used tags first.
pub async fn get_popular_tags<C: ConnectionTrait>(
    conn: &C,
    limit: u64,
) -> Result<Vec<TagForTemplate>, DbErr> {
    tags::Entity::find()
        .select_only()
        .column(tags::Column::Id)
        .column(tags::Column::Name)
        .column(tags::Column::Count)
        .filter(tags::Column::Count.gt(0))
        .order_by_desc(tags::Column::Count)
        .order_by_asc(tags::Column::Name)
        .limit(limit)
        .into_model::<TagForTemplate>()
        .all(conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tags() {
        let tags = normalize_tags(&[" Physics", "physics", "", "  ", "Quantum Physics"]);
        assert_eq!(tags, vec!["physics".to_owned(), "quantum physics".to_owned()]);
    }

    #[test]
    fn test_normalize_tags_limits() {
        let long = "x".repeat(MAX_TAG_LENGTH + 1);
        let tags = normalize_tags(&["a", long.as_str(), "b", "c", "d", "e", "f"]);
        assert_eq!(tags.len(), MAX_TAGS_PER_QUESTION);
        assert_eq!(tags, vec!["a", "b", "c", "d", "e"]);
    }
}
