// Callboard
// Copyright (C) 2025 Callboard contributors

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use sea_orm::sea_query::Expr;
use sea_orm::*;

use super::entities::{prelude::*, *};
use callboard_common::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteToggle {
    pub added: bool,
    pub votes: i32,
}

/// Flip this voter's vote on a submission. The vote row and the counter move
/// in one transaction, and the counter moves relative to its stored value.
/// Under two concurrent identical taps the composite key lets only one
/// insert through; the loser's transaction fails without touching the count.
pub async fn toggle(
    voter_id: i64,
    submission_id: i32,
    db: &DatabaseConnection,
) -> Result<VoteToggle> {
    let txn = db.begin().await?;

    let added = match Vote::find_by_id((voter_id, submission_id)).one(&txn).await? {
        Some(existing) => {
            existing.delete(&txn).await?;
            Submission::update_many()
                .col_expr(
                    submission::Column::VoteCount,
                    Expr::col(submission::Column::VoteCount).sub(1),
                )
                .filter(submission::Column::Id.eq(submission_id))
                .exec(&txn)
                .await?;
            false
        }
        None => {
            let entry = vote::ActiveModel {
                voter_id: ActiveValue::Set(voter_id),
                submission_id: ActiveValue::Set(submission_id),
                ..Default::default()
            };
            entry.insert(&txn).await?;
            Submission::update_many()
                .col_expr(
                    submission::Column::VoteCount,
                    Expr::col(submission::Column::VoteCount).add(1),
                )
                .filter(submission::Column::Id.eq(submission_id))
                .exec(&txn)
                .await?;
            true
        }
    };

    let Some(fresh) = Submission::find_by_id(submission_id).one(&txn).await? else {
        return Err(DbErr::RecordNotFound(format!("submission {submission_id}")).into());
    };
    txn.commit().await?;

    Ok(VoteToggle {
        added,
        votes: fresh.vote_count,
    })
}

pub async fn exists(voter_id: i64, submission_id: i32, db: &DatabaseConnection) -> Result<bool> {
    Ok(Vote::find_by_id((voter_id, submission_id))
        .one(db)
        .await?
        .is_some())
}

pub async fn voters(
    submission_id: i32,
    limit: Option<u64>,
    offset: Option<u64>,
    db: &DatabaseConnection,
) -> Result<Vec<i64>> {
    let entries = Vote::find()
        .filter(vote::Column::SubmissionId.eq(submission_id))
        .order_by(vote::Column::CreatedAt, Order::Asc)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?;
    Ok(entries.into_iter().map(|e| e.voter_id).collect())
}

pub async fn count_for(submission_id: i32, db: &DatabaseConnection) -> Result<u64> {
    Ok(Vote::find()
        .filter(vote::Column::SubmissionId.eq(submission_id))
        .count(db)
        .await?)
}

pub async fn count(db: &DatabaseConnection) -> Result<u64> {
    Ok(Vote::find().count(db).await?)
}
