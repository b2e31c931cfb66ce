//! Access to the vote ledger: one row per user per target.

use super::VoteTarget;
use crate::orm::votes::{self, Direction};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::SimpleExpr, ConnectionTrait, DbErr};

fn target_column(target: VoteTarget) -> SimpleExpr {
    match target {
        VoteTarget::Question(id) => votes::Column::QuestionId.eq(id),
        VoteTarget::Answer(id) => votes::Column::AnswerId.eq(id),
    }
}

/// Returns the user's vote on the target, if any.
pub async fn find_vote<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    target: VoteTarget,
) -> Result<Option<votes::Model>, DbErr> {
    votes::Entity::find()
        .filter(votes::Column::UserId.eq(user_id))
        .filter(target_column(target))
        .one(conn)
        .await
}

/// Records a vote. The unique indexes reject a second row for the same user and target.
pub async fn insert_vote<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    target: VoteTarget,
    direction: Direction,
) -> Result<i32, DbErr> {
    let (question_id, answer_id) = match target {
        VoteTarget::Question(id) => (Some(id), None),
        VoteTarget::Answer(id) => (None, Some(id)),
    };

    Ok(votes::Entity::insert(votes::ActiveModel {
        user_id: Set(user_id),
        question_id: Set(question_id),
        answer_id: Set(answer_id),
        direction: Set(direction),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    })
    .exec(conn)
    .await?
    .last_insert_id)
}

pub async fn delete_vote<C: ConnectionTrait>(conn: &C, id: i32) -> Result<(), DbErr> {
    votes::Entity::delete_many()
        .filter(votes::Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Removes every vote on a target. Used when the target itself is deleted.
pub async fn delete_votes_for<C: ConnectionTrait>(
    conn: &C,
    target: VoteTarget,
) -> Result<u64, DbErr> {
    Ok(votes::Entity::delete_many()
        .filter(target_column(target))
        .exec(conn)
        .await?
        .rows_affected)
}

