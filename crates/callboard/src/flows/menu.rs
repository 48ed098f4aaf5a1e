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

use tracing::debug;

use crate::api::ApiState;
use crate::channels::Format;
use crate::db;
use crate::event::{Actor, Post, Tap};
use crate::gate;
use crate::menu;
use crate::session::SettingField;
use callboard_common::error::Result;

/// `/start`: the gate decides between the control menu and the join prompt.
pub async fn start(state: &ApiState, actor: &Actor, chat: i64) -> Result<()> {
    if !gate::is_member(state.messenger.as_ref(), &state.required_channel, actor.id).await {
        return send_subscription_prompt(state, chat).await;
    }
    send_menu(state, actor, chat).await
}

async fn send_menu(state: &ApiState, actor: &Actor, chat: i64) -> Result<()> {
    let entry = db::settings::get(actor.id, &state.db).await?;
    let (text, control) = menu::main_menu(&actor.full_name, &entry);
    state
        .messenger
        .send(chat, &text, Format::Html, Some(control))
        .await?;
    Ok(())
}

pub async fn send_subscription_prompt(state: &ApiState, chat: i64) -> Result<()> {
    let (text, control) = menu::subscription_prompt(&state.required_channel);
    state
        .messenger
        .send(chat, &text, Format::Plain, Some(control))
        .await?;
    Ok(())
}

/// "I've joined": re-check the gate, and on success swap the join prompt for
/// the menu.
pub async fn check_subscription(state: &ApiState, actor: &Actor, tap: &Tap) -> Result<()> {
    if !gate::is_member(state.messenger.as_ref(), &state.required_channel, actor.id).await {
        return state
            .messenger
            .answer_tap(
                &tap.id,
                Some("You're still not a member. Join first, then try again."),
                true,
            )
            .await;
    }
    state.messenger.answer_tap(&tap.id, None, false).await?;
    if let Some(message) = tap.message {
        if let Err(err) = state.messenger.delete_message(message).await {
            debug!(user = actor.id, "could not delete the join prompt: {err}");
        }
        send_menu(state, actor, message.chat).await?;
    }
    Ok(())
}

/// Arm the session so the user's next message lands in `field` instead of
/// being staged as content.
pub async fn prompt_setting(
    state: &ApiState,
    actor: &Actor,
    tap: &Tap,
    field: SettingField,
) -> Result<()> {
    state.sessions.set_action(actor.id, field);
    state.messenger.answer_tap(&tap.id, None, false).await?;
    if let Some(message) = tap.message {
        let (text, control) = menu::setting_prompt(field);
        state
            .messenger
            .edit_text(message, &text, Format::Plain, Some(control))
            .await?;
    }
    Ok(())
}

pub async fn toggle_notifications(state: &ApiState, actor: &Actor, tap: &Tap) -> Result<()> {
    db::settings::ensure(actor.id, &state.db).await?;
    db::settings::toggle_notify(actor.id, &state.db).await?;
    state.messenger.answer_tap(&tap.id, None, false).await?;
    if let Some(message) = tap.message {
        let entry = db::settings::get(actor.id, &state.db).await?;
        let (text, control) = menu::main_menu(&actor.full_name, &entry);
        state
            .messenger
            .edit_text(message, &text, Format::Html, Some(control))
            .await?;
    }
    Ok(())
}

/// Leave a setting prompt without input. The armed field is dropped.
pub async fn back(state: &ApiState, actor: &Actor, tap: &Tap) -> Result<()> {
    state.sessions.take_action(actor.id);
    state.messenger.answer_tap(&tap.id, None, false).await?;
    if let Some(message) = tap.message {
        let entry = db::settings::get(actor.id, &state.db).await?;
        let (text, control) = menu::main_menu(&actor.full_name, &entry);
        state
            .messenger
            .edit_text(message, &text, Format::Html, Some(control))
            .await?;
    }
    Ok(())
}

/// One message answers the armed prompt, valid or not. Invalid input gets a
/// notice instead of silently becoming a staged submission.
pub async fn apply_setting_input(
    state: &ApiState,
    actor: &Actor,
    chat: i64,
    field: SettingField,
    post: &Post,
) -> Result<()> {
    let text = post.text.as_deref().unwrap_or("").trim();
    db::settings::ensure(actor.id, &state.db).await?;
    let reply = match field {
        SettingField::MandatoryMessage => {
            if text.is_empty() {
                "⚠️ I couldn't use that input.".to_owned()
            } else {
                db::settings::set_mandatory_message(actor.id, text, &state.db).await?;
                "✅ Subscription message updated.".to_owned()
            }
        }
        SettingField::VoteEmoji => {
            if text.is_empty() {
                "⚠️ I couldn't use that input.".to_owned()
            } else {
                db::settings::set_vote_emoji(actor.id, text, &state.db).await?;
                "✅ Vote emoji updated.".to_owned()
            }
        }
        SettingField::Channel => {
            match post
                .forwarded_channel
                .or_else(|| text.parse::<i64>().ok())
            {
                Some(channel) => {
                    db::settings::set_channel(actor.id, channel, &state.db).await?;
                    format!("✅ Channel bound: {channel}.")
                }
                None => {
                    "⚠️ That doesn't look like a channel. Forward a post from your channel or send its numeric id."
                        .to_owned()
                }
            }
        }
    };
    state
        .messenger
        .send(chat, &reply, Format::Plain, None)
        .await?;
    Ok(())
}

#[cfg(test)]
mod test_menu_flow {
    use crate::db;
    use crate::event::CallbackAction;
    use crate::flows;
    use crate::utils::{actor, command_incoming, forward_incoming, get_test_rig, post_incoming, tap_incoming};

    #[tokio::test]
    async fn it_should_show_the_menu_to_members() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, command_incoming(&user, 7, "/start"))
            .await
            .unwrap();

        let sent = messenger.last_sent().unwrap();
        assert!(sent.text.contains("Hi Test User 7!"));
        assert!(sent.text.contains("not bound yet"));
        assert_eq!(sent.control.as_ref().unwrap().rows.len(), 4);
    }

    #[tokio::test]
    async fn it_should_prompt_unsubscribed_users_to_join() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);

        flows::handle(&state, command_incoming(&user, 7, "/start"))
            .await
            .unwrap();

        let sent = messenger.last_sent().unwrap();
        assert!(sent.text.contains("join our channel"));
        // No settings row appears until the user gets through.
        assert!(db::settings::get_existing(7, &state.db)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn it_should_unlock_the_menu_after_joining() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::CheckSubscription))
            .await
            .unwrap();
        let ack = messenger.acks().last().unwrap().clone();
        assert!(ack.text.unwrap().contains("still not a member"));
        assert!(ack.alert);

        messenger.join(&state.required_channel, user.id);
        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::CheckSubscription))
            .await
            .unwrap();

        assert_eq!(messenger.deletes().last().unwrap().message, 50);
        let sent = messenger.last_sent().unwrap();
        assert!(sent.text.contains("Your current setup"));
    }

    #[tokio::test]
    async fn it_should_consume_the_armed_setting_with_one_message() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::SetMessage))
            .await
            .unwrap();
        let edit = messenger.text_edits().last().unwrap().clone();
        assert!(edit.text.contains("Send the new subscription message."));

        flows::handle(&state, post_incoming(&user, 7, 1, "Members only, sorry"))
            .await
            .unwrap();
        let entry = db::settings::get(7, &state.db).await.unwrap();
        assert_eq!(entry.mandatory_message, "Members only, sorry");
        assert_eq!(
            messenger.last_sent().unwrap().text,
            "✅ Subscription message updated."
        );

        // The next message is content again.
        flows::handle(&state, post_incoming(&user, 7, 2, "Hello"))
            .await
            .unwrap();
        assert_eq!(
            messenger.last_sent().unwrap().text,
            "Publish this to your channel?"
        );
    }

    #[tokio::test]
    async fn it_should_bind_a_channel_from_a_forwarded_post() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::SetChannel))
            .await
            .unwrap();
        flows::handle(&state, forward_incoming(&user, 7, 1, -100999))
            .await
            .unwrap();

        let entry = db::settings::get(7, &state.db).await.unwrap();
        assert_eq!(entry.channel_id, Some(-100999));
        assert_eq!(
            messenger.last_sent().unwrap().text,
            "✅ Channel bound: -100999."
        );
    }

    #[tokio::test]
    async fn it_should_bind_a_channel_from_a_numeric_id() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::SetChannel))
            .await
            .unwrap();
        flows::handle(&state, post_incoming(&user, 7, 1, " -100123 "))
            .await
            .unwrap();

        let entry = db::settings::get(7, &state.db).await.unwrap();
        assert_eq!(entry.channel_id, Some(-100123));
    }

    #[tokio::test]
    async fn it_should_turn_away_junk_channel_input() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::SetChannel))
            .await
            .unwrap();
        flows::handle(&state, post_incoming(&user, 7, 1, "my channel"))
            .await
            .unwrap();

        let entry = db::settings::get(7, &state.db).await.unwrap();
        assert_eq!(entry.channel_id, None);
        assert!(messenger
            .last_sent()
            .unwrap()
            .text
            .contains("doesn't look like a channel"));

        // Bad input still disarmed the prompt.
        flows::handle(&state, post_incoming(&user, 7, 2, "Hello"))
            .await
            .unwrap();
        assert_eq!(
            messenger.last_sent().unwrap().text,
            "Publish this to your channel?"
        );
    }

    #[tokio::test]
    async fn it_should_flip_notifications_from_the_menu() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::ToggleNotifications))
            .await
            .unwrap();

        let entry = db::settings::get(7, &state.db).await.unwrap();
        assert!(entry.notify_on_vote);
        let edit = messenger.text_edits().last().unwrap().clone();
        assert!(edit.text.contains("• Vote notifications: on\n"));
        assert_eq!(edit.message.message, 50);
    }

    #[tokio::test]
    async fn it_should_disarm_the_prompt_on_back() {
        let (state, messenger) = get_test_rig().await;
        let user = actor(7);
        messenger.join(&state.required_channel, user.id);

        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::SetEmoji))
            .await
            .unwrap();
        flows::handle(&state, tap_incoming(&user, 7, 50, CallbackAction::Back))
            .await
            .unwrap();

        let edit = messenger.text_edits().last().unwrap().clone();
        assert!(edit.text.contains("Your current setup"));

        // The emoji prompt is gone: the next message is staged as content.
        flows::handle(&state, post_incoming(&user, 7, 1, "🔥"))
            .await
            .unwrap();
        let entry = db::settings::get(7, &state.db).await.unwrap();
        assert_eq!(entry.vote_emoji, "❤️");
        assert_eq!(
            messenger.last_sent().unwrap().text,
            "Publish this to your channel?"
        );
    }
}
