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

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;

use super::entities::{prelude::*, *};
use callboard_common::error::Result;

pub const DEFAULT_MANDATORY_MESSAGE: &str = "Please subscribe to the channel first.";
pub const DEFAULT_VOTE_EMOJI: &str = "❤️";

/// Insert a default row for this owner if none exists. The insert-or-ignore
/// happens in the database, not as a check-then-insert.
pub async fn ensure(owner_id: i64, db: &DatabaseConnection) -> Result<()> {
    let entry = settings::ActiveModel {
        owner_id: ActiveValue::Set(owner_id),
        ..Default::default()
    };
    Settings::insert(entry)
        .on_conflict(
            OnConflict::column(settings::Column::OwnerId)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

pub async fn get(owner_id: i64, db: &DatabaseConnection) -> Result<settings::Model> {
    ensure(owner_id, db).await?;
    let Some(entry) = Settings::find_by_id(owner_id).one(db).await? else {
        return Err(DbErr::RecordNotFound(format!("settings row for owner {owner_id}")).into());
    };
    Ok(entry)
}

pub async fn get_existing(
    owner_id: i64,
    db: &DatabaseConnection,
) -> Result<Option<settings::Model>> {
    Ok(Settings::find_by_id(owner_id).one(db).await?)
}

pub async fn set_mandatory_message(
    owner_id: i64,
    message: &str,
    db: &DatabaseConnection,
) -> Result<()> {
    Settings::update_many()
        .col_expr(
            settings::Column::MandatoryMessage,
            Expr::value(message.to_owned()),
        )
        .filter(settings::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn set_vote_emoji(owner_id: i64, emoji: &str, db: &DatabaseConnection) -> Result<()> {
    Settings::update_many()
        .col_expr(settings::Column::VoteEmoji, Expr::value(emoji.to_owned()))
        .filter(settings::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn set_channel(owner_id: i64, channel_id: i64, db: &DatabaseConnection) -> Result<()> {
    Settings::update_many()
        .col_expr(settings::Column::ChannelId, Expr::value(channel_id))
        .filter(settings::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Flip the notification flag in the database (`1 - notify_on_vote`) rather
/// than reading, negating and writing back.
pub async fn toggle_notify(owner_id: i64, db: &DatabaseConnection) -> Result<()> {
    Settings::update_many()
        .col_expr(
            settings::Column::NotifyOnVote,
            Expr::value(1).sub(Expr::col(settings::Column::NotifyOnVote)),
        )
        .filter(settings::Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn count(db: &DatabaseConnection) -> Result<u64> {
    Ok(Settings::find().count(db).await?)
}

#[cfg(test)]
mod test_settings {
    use super::*;
    use crate::utils::get_test_db;

    #[tokio::test]
    async fn it_should_create_a_default_row_once() {
        let db = get_test_db().await;

        ensure(7, &db).await.unwrap();
        ensure(7, &db).await.unwrap();

        assert_eq!(count(&db).await.unwrap(), 1);
        let entry = get(7, &db).await.unwrap();
        assert_eq!(entry.mandatory_message, DEFAULT_MANDATORY_MESSAGE);
        assert_eq!(entry.vote_emoji, DEFAULT_VOTE_EMOJI);
        assert_eq!(entry.channel_id, None);
        assert!(!entry.notify_on_vote);
    }

    #[tokio::test]
    async fn it_should_not_reset_fields_on_ensure() {
        let db = get_test_db().await;

        get(7, &db).await.unwrap();
        set_vote_emoji(7, "👍", &db).await.unwrap();
        ensure(7, &db).await.unwrap();

        let entry = get(7, &db).await.unwrap();
        assert_eq!(entry.vote_emoji, "👍");
    }

    #[tokio::test]
    async fn it_should_update_single_fields() {
        let db = get_test_db().await;

        get(7, &db).await.unwrap();
        set_mandatory_message(7, "Join us first.", &db).await.unwrap();
        set_channel(7, -1001234, &db).await.unwrap();

        let entry = get(7, &db).await.unwrap();
        assert_eq!(entry.mandatory_message, "Join us first.");
        assert_eq!(entry.channel_id, Some(-1001234));
        assert_eq!(entry.vote_emoji, DEFAULT_VOTE_EMOJI);
    }

    #[tokio::test]
    async fn it_should_flip_notifications_in_place() {
        let db = get_test_db().await;

        get(7, &db).await.unwrap();
        toggle_notify(7, &db).await.unwrap();
        assert!(get(7, &db).await.unwrap().notify_on_vote);

        toggle_notify(7, &db).await.unwrap();
        assert!(!get(7, &db).await.unwrap().notify_on_vote);
    }
}
