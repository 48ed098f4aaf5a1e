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

use async_trait::async_trait;
use futures::{pin_mut, StreamExt};
use teloxide::Bot;
use teloxide::payloads::setters::*;
use teloxide::requests::Requester;
use teloxide::types::{
    BotCommand, CallbackQuery, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message,
    MessageId, ParseMode, Recipient, UpdateKind, User, UserId,
};
use teloxide::update_listeners::{polling_default, AsUpdateStream};
use tracing::{error, info, warn};

use crate::api::ApiState;
use crate::channels::{
    ButtonAction, ChannelRef, Control, Format, Membership, MessageRef, Messenger,
};
use crate::event::{Actor, CallbackAction, Command, Incoming, IncomingKind, Post, Tap};
use crate::flows;
use callboard_common::error::{CallboardError, Result};

/// [`Messenger`] over the Telegram Bot API.
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> TelegramMessenger {
        TelegramMessenger { bot }
    }
}

fn transport_err(err: teloxide::RequestError) -> CallboardError {
    CallboardError::Telegram(err.to_string())
}

fn recipient(channel: &ChannelRef) -> Recipient {
    match channel {
        ChannelRef::Id(id) => Recipient::Id(ChatId(*id)),
        ChannelRef::Handle(handle) => Recipient::ChannelUsername(handle.clone()),
    }
}

fn keyboard(control: Control) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(control.rows.into_iter().map(|row| {
        row.into_iter()
            .map(|button| match button.action {
                ButtonAction::Callback(action) => {
                    InlineKeyboardButton::callback(button.label, action.as_data())
                }
                ButtonAction::Link(url) => InlineKeyboardButton::url(button.label, url),
            })
            .collect::<Vec<_>>()
    }))
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn membership(&self, channel: &ChannelRef, user: i64) -> Result<Membership> {
        let member = self
            .bot
            .get_chat_member(recipient(channel), UserId(user as u64))
            .await
            .map_err(transport_err)?;
        let kind = member.kind;
        // Restricted, left and banned all count as absent.
        Ok(if kind.is_owner() {
            Membership::Owner
        } else if kind.is_administrator() {
            Membership::Administrator
        } else if kind.is_member() {
            Membership::Member
        } else {
            Membership::Absent
        })
    }

    async fn copy_to_channel(
        &self,
        channel: i64,
        from_chat: i64,
        message: i32,
        control: Control,
    ) -> Result<i32> {
        let copied = self
            .bot
            .copy_message(ChatId(channel), ChatId(from_chat), MessageId(message))
            .reply_markup(keyboard(control))
            .await
            .map_err(transport_err)?;
        Ok(copied.0)
    }

    async fn send(
        &self,
        chat: i64,
        text: &str,
        format: Format,
        control: Option<Control>,
    ) -> Result<i32> {
        let mut request = self.bot.send_message(ChatId(chat), text);
        if let Format::Html = format {
            request = request.parse_mode(ParseMode::Html);
        }
        if let Some(control) = control {
            request = request.reply_markup(keyboard(control));
        }
        let sent = request.await.map_err(transport_err)?;
        Ok(sent.id.0)
    }

    async fn edit_control(&self, message: MessageRef, control: Control) -> Result<()> {
        self.bot
            .edit_message_reply_markup(ChatId(message.chat), MessageId(message.message))
            .reply_markup(keyboard(control))
            .await
            .map_err(transport_err)?;
        Ok(())
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        format: Format,
        control: Option<Control>,
    ) -> Result<()> {
        let mut request =
            self.bot
                .edit_message_text(ChatId(message.chat), MessageId(message.message), text);
        if let Format::Html = format {
            request = request.parse_mode(ParseMode::Html);
        }
        if let Some(control) = control {
            request = request.reply_markup(keyboard(control));
        }
        request.await.map_err(transport_err)?;
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        self.bot
            .delete_message(ChatId(message.chat), MessageId(message.message))
            .await
            .map_err(transport_err)?;
        Ok(())
    }

    async fn answer_tap(&self, tap_id: &str, text: Option<&str>, alert: bool) -> Result<()> {
        let mut request = self.bot.answer_callback_query(tap_id.to_owned());
        if let Some(text) = text {
            request = request.text(text);
        }
        if alert {
            request = request.show_alert(true);
        }
        request.await.map_err(transport_err)?;
        Ok(())
    }
}

fn map_actor(user: &User) -> Actor {
    Actor {
        id: user.id.0 as i64,
        full_name: user.full_name(),
        username: user.username.clone(),
        locale: user.language_code.clone(),
    }
}

/// Private-chat messages only; channel posts and group chatter have no
/// workflow here. A leading `/` makes it a command, anything else is
/// content (body or caption).
fn map_message(msg: &Message) -> Option<Incoming> {
    if !msg.chat.is_private() {
        return None;
    }
    let from = msg.from()?;
    if from.is_bot {
        return None;
    }
    let actor = map_actor(from);
    let chat = msg.chat.id.0;
    let text = msg.text().or_else(|| msg.caption()).map(str::to_owned);
    let kind = match text.as_deref() {
        Some(body) if body.starts_with('/') => IncomingKind::Command(Command::parse(body)),
        _ => IncomingKind::Post(Post {
            message: msg.id.0,
            text,
            forwarded_channel: msg
                .forward_from_chat()
                .filter(|chat| chat.is_channel())
                .map(|chat| chat.id.0),
        }),
    };
    Some(Incoming { actor, chat, kind })
}

fn map_callback(q: &CallbackQuery) -> Incoming {
    let actor = map_actor(&q.from);
    let message = q.message.as_ref().map(|m| MessageRef {
        chat: m.chat.id.0,
        message: m.id.0,
    });
    let chat = message.map(|m| m.chat).unwrap_or(actor.id);
    Incoming {
        actor,
        chat,
        kind: IncomingKind::Tap(Tap {
            id: q.id.clone(),
            action: q.data.as_deref().and_then(CallbackAction::from_data),
            message,
        }),
    }
}

/// Register the command menu, then stream updates until the listener ends.
/// Every mapped update runs in its own task; a failing flow logs and dies
/// alone.
pub async fn receive_updates(bot: Bot, state: ApiState) -> Result<()> {
    bot.set_my_commands(vec![BotCommand::new("start", "Show the control menu")])
        .await
        .map_err(transport_err)?;

    let me = bot.get_me().await.map_err(transport_err)?;
    info!(bot = me.username(), "listening for updates");

    let mut listener = polling_default(bot).await;
    let stream = listener.as_stream();
    pin_mut!(stream);

    while let Some(update) = stream.next().await {
        let update = match update {
            Ok(update) => update,
            Err(err) => {
                warn!("skipping a failed update: {err}");
                continue;
            }
        };
        let incoming = match &update.kind {
            UpdateKind::Message(msg) => map_message(msg),
            UpdateKind::CallbackQuery(q) => Some(map_callback(q)),
            _ => None,
        };
        if let Some(incoming) = incoming {
            let state = state.clone();
            tokio::spawn(async move {
                if let Err(err) = flows::handle(&state, incoming).await {
                    error!("update handler failed: {err}");
                }
            });
        }
    }
    Ok(())
}
