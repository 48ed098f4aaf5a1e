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

use tracing::{debug, info, warn};

use crate::api::ApiState;
use crate::channels::{ChannelRef, Format};
use crate::db;
use crate::event::{Actor, Tap};
use crate::gate;
use crate::menu;
use callboard_common::error::Result;

/// A tap on the vote control under a published copy.
///
/// Resolve the submission, pass both gates, toggle, then tell everyone who
/// needs to know: the voter through the tap answer, the owner through an
/// optional notification, the channel through the re-rendered count.
pub async fn vote(state: &ApiState, actor: &Actor, tap: &Tap) -> Result<()> {
    let Some(message) = tap.message else {
        return state.messenger.answer_tap(&tap.id, None, false).await;
    };
    let Some(item) =
        db::submission::get_by_published(message.chat, message.message, &state.db).await?
    else {
        debug!(
            chat = message.chat,
            message = message.message,
            "vote tap on a message with no submission"
        );
        return state.messenger.answer_tap(&tap.id, None, false).await;
    };

    if !gate::is_member(state.messenger.as_ref(), &state.required_channel, actor.id).await {
        let text = format!("To vote, join {} first.", state.required_channel);
        return state.messenger.answer_tap(&tap.id, Some(&text), true).await;
    }
    // One settings read serves the whole tap: gate text, emoji and the
    // notification flag all come from the same snapshot.
    let entry = db::settings::get(item.owner_id, &state.db).await?;
    if !gate::is_member(
        state.messenger.as_ref(),
        &ChannelRef::Id(item.channel_id),
        actor.id,
    )
    .await
    {
        return state
            .messenger
            .answer_tap(&tap.id, Some(&entry.mandatory_message), true)
            .await;
    }

    let toggle = db::vote::toggle(actor.id, item.id, &state.db).await?;

    let ack = if toggle.added {
        format!("Vote recorded {}", entry.vote_emoji)
    } else {
        "Vote withdrawn".to_owned()
    };
    state
        .messenger
        .answer_tap(&tap.id, Some(&ack), false)
        .await?;

    if toggle.added && entry.notify_on_vote {
        let note = menu::vote_notification(&entry.vote_emoji, &item.text, actor, toggle.votes);
        if let Err(err) = state
            .messenger
            .send(item.owner_id, &note, Format::Html, None)
            .await
        {
            warn!(
                owner = item.owner_id,
                "could not deliver the vote notification: {err}"
            );
        }
    }

    state
        .messenger
        .edit_control(message, menu::vote_control(&entry.vote_emoji, toggle.votes))
        .await?;
    info!(
        user = actor.id,
        submission = item.id,
        votes = toggle.votes,
        added = toggle.added,
        "vote toggled"
    );
    Ok(())
}

#[cfg(test)]
mod test_vote_flow {
    use crate::channels::ChannelRef;
    use crate::db;
    use crate::event::CallbackAction;
    use crate::flows;
    use crate::utils::{actor, get_test_rig, tap_incoming};

    async fn published(state: &crate::api::ApiState) -> db::entities::submission::Model {
        db::settings::get(7, &state.db).await.unwrap();
        db::settings::set_channel(7, -100500, &state.db).await.unwrap();
        db::settings::set_vote_emoji(7, "👍", &state.db).await.unwrap();
        db::submission::create(7, "Hello", -100500, 900, &state.db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn it_should_toggle_a_vote_end_to_end() {
        let (state, messenger) = get_test_rig().await;
        let item = published(&state).await;
        let voter = actor(100);
        messenger.join(&state.required_channel, voter.id);
        messenger.join(&ChannelRef::Id(-100500), voter.id);

        let tap = tap_incoming(&voter, -100500, 900, CallbackAction::Vote);
        flows::handle(&state, tap).await.unwrap();

        let ack = messenger.acks().last().unwrap().clone();
        assert_eq!(ack.text.as_deref(), Some("Vote recorded 👍"));
        assert!(!ack.alert);
        let edit = messenger.control_edits().last().unwrap().clone();
        assert_eq!(edit.control.rows[0][0].label, "👍 1");

        let tap = tap_incoming(&voter, -100500, 900, CallbackAction::Vote);
        flows::handle(&state, tap).await.unwrap();

        let ack = messenger.acks().last().unwrap().clone();
        assert_eq!(ack.text.as_deref(), Some("Vote withdrawn"));
        let edit = messenger.control_edits().last().unwrap().clone();
        assert_eq!(edit.control.rows[0][0].label, "👍 0");

        let item = db::submission::get_by_id(item.id, &state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.vote_count, 0);
        assert_eq!(db::vote::count_for(item.id, &state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn it_should_alert_voters_outside_the_required_channel() {
        let (state, messenger) = get_test_rig().await;
        published(&state).await;
        let voter = actor(100);

        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();

        let ack = messenger.acks().last().unwrap().clone();
        assert_eq!(ack.text.as_deref(), Some("To vote, join @callboard first."));
        assert!(ack.alert);
        assert_eq!(db::vote::count(&state.db).await.unwrap(), 0);
        assert!(messenger.control_edits().is_empty());
    }

    #[tokio::test]
    async fn it_should_alert_with_the_owners_message_outside_the_submission_channel() {
        let (state, messenger) = get_test_rig().await;
        published(&state).await;
        db::settings::set_mandatory_message(7, "Members only, sorry", &state.db)
            .await
            .unwrap();
        let voter = actor(100);
        messenger.join(&state.required_channel, voter.id);

        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();

        let ack = messenger.acks().last().unwrap().clone();
        assert_eq!(ack.text.as_deref(), Some("Members only, sorry"));
        assert!(ack.alert);
        assert_eq!(db::vote::count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn it_should_silently_ack_taps_on_unknown_messages() {
        let (state, messenger) = get_test_rig().await;
        published(&state).await;
        let voter = actor(100);
        messenger.join(&state.required_channel, voter.id);
        messenger.join(&ChannelRef::Id(-100500), voter.id);

        flows::handle(&state, tap_incoming(&voter, -100500, 901, CallbackAction::Vote))
            .await
            .unwrap();

        let ack = messenger.acks().last().unwrap().clone();
        assert_eq!(ack.text, None);
        assert_eq!(db::vote::count(&state.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn it_should_notify_the_owner_once_per_new_vote() {
        let (state, messenger) = get_test_rig().await;
        let item = published(&state).await;
        db::settings::toggle_notify(7, &state.db).await.unwrap();
        let voter = actor(100);
        messenger.join(&state.required_channel, voter.id);
        messenger.join(&ChannelRef::Id(-100500), voter.id);

        let notifications = |messenger: &crate::utils::TestMessenger| {
            messenger
                .sent()
                .iter()
                .filter(|sent| sent.chat == 7 && sent.text.contains("New vote"))
                .count()
        };

        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();
        assert_eq!(notifications(&messenger), 1);
        let note = messenger.last_sent().unwrap();
        assert!(note.text.contains("Test User 100"));
        assert!(note.text.contains("<b>1</b>"));

        // Withdrawing is not news.
        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();
        assert_eq!(notifications(&messenger), 1);

        // Voting again is.
        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();
        assert_eq!(notifications(&messenger), 2);

        let item = db::submission::get_by_id(item.id, &state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.vote_count, 1);
    }

    #[tokio::test]
    async fn it_should_record_the_vote_even_when_the_notification_fails() {
        let (state, messenger) = get_test_rig().await;
        let item = published(&state).await;
        db::settings::toggle_notify(7, &state.db).await.unwrap();
        let voter = actor(100);
        messenger.join(&state.required_channel, voter.id);
        messenger.join(&ChannelRef::Id(-100500), voter.id);
        messenger.break_send();

        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();

        let item = db::submission::get_by_id(item.id, &state.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.vote_count, 1);
        let edit = messenger.control_edits().last().unwrap().clone();
        assert_eq!(edit.control.rows[0][0].label, "👍 1");
    }

    #[tokio::test]
    async fn it_should_render_the_emoji_of_the_moment() {
        let (state, messenger) = get_test_rig().await;
        published(&state).await;
        db::settings::set_vote_emoji(7, "🔥", &state.db).await.unwrap();
        let voter = actor(100);
        messenger.join(&state.required_channel, voter.id);
        messenger.join(&ChannelRef::Id(-100500), voter.id);

        flows::handle(&state, tap_incoming(&voter, -100500, 900, CallbackAction::Vote))
            .await
            .unwrap();

        let edit = messenger.control_edits().last().unwrap().clone();
        assert_eq!(edit.control.rows[0][0].label, "🔥 1");
        assert_eq!(
            messenger.acks().last().unwrap().text.as_deref(),
            Some("Vote recorded 🔥")
        );
    }
}
