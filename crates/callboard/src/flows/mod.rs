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

pub mod menu;
pub mod publish;
pub mod vote;

use tracing::debug;

use crate::api::ApiState;
use crate::event::{Actor, CallbackAction, Command, Incoming, IncomingKind, Post, Tap};
use crate::gate;
use crate::session::SettingField;
use callboard_common::error::Result;

/// Route one boundary event to its workflow. Every update lands here in its
/// own task; an error ends that task only.
pub async fn handle(state: &ApiState, incoming: Incoming) -> Result<()> {
    match incoming.kind {
        IncomingKind::Command(Command::Start) => {
            menu::start(state, &incoming.actor, incoming.chat).await
        }
        IncomingKind::Command(Command::Unknown(name)) => {
            debug!(user = incoming.actor.id, command = %name, "ignoring unknown command");
            Ok(())
        }
        IncomingKind::Post(post) => handle_post(state, &incoming.actor, incoming.chat, post).await,
        IncomingKind::Tap(tap) => handle_tap(state, &incoming.actor, tap).await,
    }
}

/// Content in the private chat: gate, then either a pending settings input
/// or a new submission to stage.
async fn handle_post(state: &ApiState, actor: &Actor, chat: i64, post: Post) -> Result<()> {
    if !gate::is_member(state.messenger.as_ref(), &state.required_channel, actor.id).await {
        return menu::send_subscription_prompt(state, chat).await;
    }
    match state.sessions.take_action(actor.id) {
        Some(field) => menu::apply_setting_input(state, actor, chat, field, &post).await,
        None => publish::stage(state, actor, chat, post).await,
    }
}

async fn handle_tap(state: &ApiState, actor: &Actor, tap: Tap) -> Result<()> {
    let Some(action) = tap.action else {
        debug!(user = actor.id, "ignoring a tap with unknown data");
        // Still acknowledged, so the client stops its spinner.
        return state.messenger.answer_tap(&tap.id, None, false).await;
    };
    match action {
        CallbackAction::Vote => vote::vote(state, actor, &tap).await,
        CallbackAction::Confirm => publish::confirm(state, actor, &tap).await,
        CallbackAction::Reject => publish::reject(state, actor, &tap).await,
        CallbackAction::CheckSubscription => menu::check_subscription(state, actor, &tap).await,
        CallbackAction::SetMessage => {
            menu::prompt_setting(state, actor, &tap, SettingField::MandatoryMessage).await
        }
        CallbackAction::SetEmoji => {
            menu::prompt_setting(state, actor, &tap, SettingField::VoteEmoji).await
        }
        CallbackAction::SetChannel => {
            menu::prompt_setting(state, actor, &tap, SettingField::Channel).await
        }
        CallbackAction::ToggleNotifications => {
            menu::toggle_notifications(state, actor, &tap).await
        }
        CallbackAction::Back => menu::back(state, actor, &tap).await,
    }
}
