use sea_orm::DatabaseConnection;
use std::sync::Arc;

use callboard_common::error::{CallboardError, Result};
use callboard_common::socket::StatsReport;

use crate::channels::{ChannelRef, Messenger};
use crate::db::{
    self,
    entities::{settings, submission},
};
use crate::session::SessionStore;

/// Everything a handler needs: the database, the transport, the per-user
/// sessions, the configured gate channel and the control-socket token.
#[derive(Clone)]
pub struct ApiState {
    pub db: DatabaseConnection,
    pub auth: String,
    pub messenger: Arc<dyn Messenger>,
    pub sessions: SessionStore,
    pub required_channel: ChannelRef,
}

pub async fn list_submissions(
    owner_id: Option<i64>,
    limit: Option<u64>,
    offset: Option<u64>,
    state: &ApiState,
) -> Result<Vec<submission::Model>> {
    db::submission::list(owner_id, limit, offset, &state.db).await
}

pub async fn read_submission(id: i32, state: &ApiState) -> Result<submission::Model> {
    db::submission::get_by_id(id, &state.db)
        .await?
        .ok_or_else(|| CallboardError::Api(format!("No submission with id {id}")))
}

pub async fn list_voters(
    id: i32,
    limit: Option<u64>,
    offset: Option<u64>,
    state: &ApiState,
) -> Result<Vec<i64>> {
    read_submission(id, state).await?;
    db::vote::voters(id, limit, offset, &state.db).await
}

pub async fn read_settings(owner_id: i64, state: &ApiState) -> Result<settings::Model> {
    db::settings::get_existing(owner_id, &state.db)
        .await?
        .ok_or_else(|| CallboardError::Api(format!("No settings for owner {owner_id}")))
}

pub async fn stats(state: &ApiState) -> Result<StatsReport> {
    Ok(StatsReport {
        owners: db::settings::count(&state.db).await?,
        submissions: db::submission::count(&state.db).await?,
        votes: db::vote::count(&state.db).await?,
    })
}

#[cfg(test)]
mod test_api {
    use super::*;
    use crate::utils::get_test_state;

    #[tokio::test]
    async fn it_should_report_stats() {
        let state = get_test_state().await;
        db::settings::get(7, &state.db).await.unwrap();
        let item = db::submission::create(7, "Hello", -100500, 1, &state.db)
            .await
            .unwrap();
        db::vote::toggle(100, item.id, &state.db).await.unwrap();
        db::vote::toggle(101, item.id, &state.db).await.unwrap();

        let report = stats(&state).await.unwrap();
        assert_eq!(report.owners, 1);
        assert_eq!(report.submissions, 1);
        assert_eq!(report.votes, 2);
    }

    #[tokio::test]
    async fn it_should_error_on_missing_rows() {
        let state = get_test_state().await;

        assert!(read_submission(1, &state).await.is_err());
        assert!(list_voters(1, None, None, &state).await.is_err());
        assert!(read_settings(7, &state).await.is_err());
    }

    #[tokio::test]
    async fn it_should_list_voters_for_a_submission() {
        let state = get_test_state().await;
        let item = db::submission::create(7, "Hello", -100500, 1, &state.db)
            .await
            .unwrap();
        db::vote::toggle(102, item.id, &state.db).await.unwrap();
        db::vote::toggle(100, item.id, &state.db).await.unwrap();

        let ids = list_voters(item.id, None, None, &state).await.unwrap();
        assert_eq!(ids.len(), 2);
    }
}
