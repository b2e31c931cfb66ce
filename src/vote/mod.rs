//! Vote reconciliation between the per-user vote ledger and the aggregate
//! counters stored on questions and answers.

pub mod counter;
pub mod ledger;

use crate::orm::votes::Direction;
use actix_web::{http::StatusCode, ResponseError};
use derive_more::Display;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

/// Something a user can vote on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VoteTarget {
    Question(i32),
    Answer(i32),
}

impl VoteTarget {
    /// Builds a target from a request where exactly one id must be given.
    pub fn from_ids(question_id: Option<i32>, answer_id: Option<i32>) -> Result<Self, VoteError> {
        match (question_id, answer_id) {
            (Some(id), None) if id > 0 => Ok(Self::Question(id)),
            (None, Some(id)) if id > 0 => Ok(Self::Answer(id)),
            _ => Err(VoteError::InvalidReference),
        }
    }
}

/// Successful results of casting a vote.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VoteOutcome {
    /// A new vote was recorded, replacing an opposite vote if there was one.
    Cast,
    /// The user already had this vote; nothing changed.
    AlreadyCast,
}

impl VoteOutcome {
    pub fn message(&self, direction: Direction) -> &'static str {
        match (self, direction) {
            (Self::Cast, Direction::Upvote) => "Upvoted successfully",
            (Self::Cast, Direction::Downvote) => "Downvoted successfully",
            (Self::AlreadyCast, Direction::Upvote) => "Already upvoted",
            (Self::AlreadyCast, Direction::Downvote) => "Already downvoted",
        }
    }
}

#[derive(Debug, Display)]
pub enum VoteError {
    #[display(fmt = "You must be logged in to vote.")]
    Unauthorized,
    #[display(fmt = "question_id or answer_id required")]
    InvalidReference,
    #[display(fmt = "Vote target not found.")]
    NotFound,
    #[display(fmt = "Server error")]
    Storage(DbErr),
}

impl std::error::Error for VoteError {}

impl From<DbErr> for VoteError {
    fn from(e: DbErr) -> Self {
        log::error!("vote storage failure: {}", e);
        Self::Storage(e)
    }
}

impl ResponseError for VoteError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidReference => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub async fn cast_upvote(
    db: &DatabaseConnection,
    user_id: i32,
    target: VoteTarget,
) -> Result<VoteOutcome, VoteError> {
    cast_vote(db, user_id, target, Direction::Upvote).await
}

pub async fn cast_downvote(
    db: &DatabaseConnection,
    user_id: i32,
    target: VoteTarget,
) -> Result<VoteOutcome, VoteError> {
    cast_vote(db, user_id, target, Direction::Downvote).await
}

/// Reconciles the ledger and the counters for one vote.
///
/// All reads and writes share one transaction. Returning early drops it, which
/// rolls back, so the ledger and counters only ever change together.
async fn cast_vote(
    db: &DatabaseConnection,
    user_id: i32,
    target: VoteTarget,
    direction: Direction,
) -> Result<VoteOutcome, VoteError> {
    let txn = db.begin().await?;

    if !counter::target_exists(&txn, target).await? {
        return Err(VoteError::NotFound);
    }

    if let Some(existing) = ledger::find_vote(&txn, user_id, target).await? {
        if existing.direction == direction {
            return Ok(VoteOutcome::AlreadyCast);
        }

        // Switching sides removes the old vote before the new one is recorded.
        ledger::delete_vote(&txn, existing.id).await?;
        if !counter::decrement(&txn, target, existing.direction).await? {
            log::warn!(
                "cast_vote: {:?} counter for {:?} was already zero",
                existing.direction,
                target
            );
        }
    }

    ledger::insert_vote(&txn, user_id, target, direction).await?;
    if !counter::increment(&txn, target, direction).await? {
        return Err(VoteError::NotFound);
    }

    txn.commit().await?;

    log::debug!("User {} cast {:?} on {:?}", user_id, direction, target);
    Ok(VoteOutcome::Cast)
}
