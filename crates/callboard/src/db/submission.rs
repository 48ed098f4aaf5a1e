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

use sea_orm::*;

use super::entities::{prelude::*, *};
use callboard_common::error::Result;

pub async fn create(
    owner_id: i64,
    text: &str,
    channel_id: i64,
    message_id: i32,
    db: &DatabaseConnection,
) -> Result<submission::Model> {
    let entry = submission::ActiveModel {
        owner_id: ActiveValue::Set(owner_id),
        text: ActiveValue::Set(text.to_owned()),
        channel_id: ActiveValue::Set(channel_id),
        message_id: ActiveValue::Set(message_id),
        vote_count: ActiveValue::Set(0),
        ..Default::default()
    };
    Ok(entry.insert(db).await?)
}

/// Resolve the submission a tapped control belongs to.
pub async fn get_by_published(
    channel_id: i64,
    message_id: i32,
    db: &DatabaseConnection,
) -> Result<Option<submission::Model>> {
    Ok(Submission::find()
        .filter(submission::Column::ChannelId.eq(channel_id))
        .filter(submission::Column::MessageId.eq(message_id))
        .one(db)
        .await?)
}

pub async fn get_by_id(id: i32, db: &DatabaseConnection) -> Result<Option<submission::Model>> {
    Ok(Submission::find_by_id(id).one(db).await?)
}

pub async fn list(
    owner_id: Option<i64>,
    limit: Option<u64>,
    offset: Option<u64>,
    db: &DatabaseConnection,
) -> Result<Vec<submission::Model>> {
    let mut query = Submission::find();
    if let Some(owner_id) = owner_id {
        query = query.filter(submission::Column::OwnerId.eq(owner_id));
    }
    Ok(query
        .order_by(submission::Column::Id, Order::Desc)
        .limit(limit)
        .offset(offset)
        .all(db)
        .await?)
}

pub async fn count(db: &DatabaseConnection) -> Result<u64> {
    Ok(Submission::find().count(db).await?)
}

#[cfg(test)]
mod test_submission {
    use super::*;
    use crate::utils::get_test_db;

    #[tokio::test]
    async fn it_should_resolve_by_published_copy() {
        let db = get_test_db().await;

        let created = create(7, "Hello", -100500, 42, &db).await.unwrap();
        assert_eq!(created.vote_count, 0);

        let found = get_by_published(-100500, 42, &db).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.text, "Hello");

        // Same message id in another channel is a different copy.
        assert!(get_by_published(-100501, 42, &db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn it_should_list_newest_first() {
        let db = get_test_db().await;

        create(7, "one", -100500, 1, &db).await.unwrap();
        create(7, "two", -100500, 2, &db).await.unwrap();
        create(8, "other", -100600, 1, &db).await.unwrap();

        let all = list(None, None, None, &db).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].text, "other");

        let owned = list(Some(7), None, None, &db).await.unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(owned[0].text, "two");

        let page = list(None, Some(1), Some(1), &db).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].text, "two");
    }
}
