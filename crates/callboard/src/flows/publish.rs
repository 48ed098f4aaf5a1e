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

use tracing::{debug, info};

use crate::api::ApiState;
use crate::channels::Format;
use crate::db;
use crate::event::{Actor, Post, Tap};
use crate::menu;
use crate::session::PendingPost;
use callboard_common::error::Result;

/// Stage an incoming post and ask for confirmation. A newer post simply
/// replaces whatever was pending.
pub async fn stage(state: &ApiState, actor: &Actor, chat: i64, post: Post) -> Result<()> {
    state.sessions.stage_post(
        actor.id,
        PendingPost {
            chat,
            message: post.message,
            text: post.text.unwrap_or_default(),
        },
    );
    let (prompt, control) = menu::confirmation();
    state
        .messenger
        .send(chat, &prompt, Format::Plain, Some(control))
        .await?;
    debug!(user = actor.id, "staged a post for confirmation");
    Ok(())
}

pub async fn confirm(state: &ApiState, actor: &Actor, tap: &Tap) -> Result<()> {
    // The decision spends the pending post up front, no matter how the rest
    // goes.
    let Some(pending) = state.sessions.take_post(actor.id) else {
        return state
            .messenger
            .answer_tap(&tap.id, Some("Nothing awaiting confirmation."), false)
            .await;
    };
    state.messenger.answer_tap(&tap.id, None, false).await?;

    let entry = db::settings::get(actor.id, &state.db).await?;
    let Some(channel) = entry.channel_id else {
        if let Some(message) = tap.message {
            state
                .messenger
                .edit_text(
                    message,
                    "⚠️ You haven't bound a channel yet. Open /start to set one.",
                    Format::Plain,
                    None,
                )
                .await?;
        }
        return Ok(());
    };

    let control = menu::vote_control(&entry.vote_emoji, 0);
    let published = match state
        .messenger
        .copy_to_channel(channel, pending.chat, pending.message, control)
        .await
    {
        Ok(published) => published,
        Err(err) => {
            if let Some(message) = tap.message {
                let report = state
                    .messenger
                    .edit_text(
                        message,
                        "⚠️ Could not post to your channel. Is the bot an administrator there?",
                        Format::Plain,
                        None,
                    )
                    .await;
                if let Err(report) = report {
                    debug!(user = actor.id, "could not report the failed publish: {report}");
                }
            }
            return Err(err);
        }
    };

    db::submission::create(actor.id, &pending.text, channel, published, &state.db).await?;
    info!(
        user = actor.id,
        channel,
        message = published,
        "published a submission"
    );

    if let Some(message) = tap.message {
        state
            .messenger
            .edit_text(message, "✅ Published.", Format::Plain, None)
            .await?;
    }
    Ok(())
}

pub async fn reject(state: &ApiState, actor: &Actor, tap: &Tap) -> Result<()> {
    state.sessions.take_post(actor.id);
    state.messenger.answer_tap(&tap.id, None, false).await?;
    if let Some(message) = tap.message {
        state
            .messenger
            .edit_text(message, "Canceled.", Format::Plain, None)
            .await?;
    }
    debug!(user = actor.id, "rejected the pending post");
    Ok(())
}
