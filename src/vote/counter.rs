//! Aggregate counters stored on questions and answers.
//!
//! Every change is a single `UPDATE ... SET col = col +/- 1` so concurrent
//! voters never lose each other's updates.

use super::VoteTarget;
use crate::orm::votes::Direction;
use crate::orm::{answers, questions};
use sea_orm::{entity::*, query::*, sea_query::Expr, ConnectionTrait, DbErr, PaginatorTrait};

pub async fn target_exists<C: ConnectionTrait>(conn: &C, target: VoteTarget) -> Result<bool, DbErr> {
    Ok(match target {
        VoteTarget::Question(id) => questions::Entity::find_by_id(id).count(conn).await? > 0,
        VoteTarget::Answer(id) => answers::Entity::find_by_id(id).count(conn).await? > 0,
    })
}

/// Adds one to the counter for `direction`. Returns false if no row matched.
pub async fn increment<C: ConnectionTrait>(
    conn: &C,
    target: VoteTarget,
    direction: Direction,
) -> Result<bool, DbErr> {
    let rows = match target {
        VoteTarget::Question(id) => {
            let col = question_column(direction);
            questions::Entity::update_many()
                .col_expr(col, Expr::col(col).add(1))
                .filter(questions::Column::Id.eq(id))
                .exec(conn)
                .await?
                .rows_affected
        }
        VoteTarget::Answer(id) => {
            let col = answer_column(direction);
            answers::Entity::update_many()
                .col_expr(col, Expr::col(col).add(1))
                .filter(answers::Column::Id.eq(id))
                .exec(conn)
                .await?
                .rows_affected
        }
    };
    Ok(rows > 0)
}

/// Subtracts one from the counter for `direction`, never going below zero.
/// Returns false if no row was changed.
pub async fn decrement<C: ConnectionTrait>(
    conn: &C,
    target: VoteTarget,
    direction: Direction,
) -> Result<bool, DbErr> {
    let rows = match target {
        VoteTarget::Question(id) => {
            let col = question_column(direction);
            questions::Entity::update_many()
                .col_expr(col, Expr::col(col).sub(1))
                .filter(questions::Column::Id.eq(id))
                .filter(col.gt(0))
                .exec(conn)
                .await?
                .rows_affected
        }
        VoteTarget::Answer(id) => {
            let col = answer_column(direction);
            answers::Entity::update_many()
                .col_expr(col, Expr::col(col).sub(1))
                .filter(answers::Column::Id.eq(id))
                .filter(col.gt(0))
                .exec(conn)
                .await?
                .rows_affected
        }
    };
    Ok(rows > 0)
}

fn question_column(direction: Direction) -> questions::Column {
    match direction {
        Direction::Upvote => questions::Column::Upvotes,
        Direction::Downvote => questions::Column::Downvotes,
    }
}

fn answer_column(direction: Direction) -> answers::Column {
    match direction {
        Direction::Upvote => answers::Column::Upvotes,
        Direction::Downvote => answers::Column::Downvotes,
    }
}
