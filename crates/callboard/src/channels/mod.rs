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

pub mod telegram;

use async_trait::async_trait;
use std::fmt;
use url::Url;

use crate::event::CallbackAction;
use callboard_common::error::Result;

/// Address of a message on the transport: chat plus message id. Message ids
/// are only unique within their chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat: i64,
    pub message: i32,
}

/// A channel as the transport addresses it: numeric id or public handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Id(i64),
    Handle(String),
}

impl ChannelRef {
    /// Accepts `-1001234567890`, `@handle` or a bare handle.
    pub fn parse(s: &str) -> Option<ChannelRef> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if let Ok(id) = s.parse::<i64>() {
            return Some(ChannelRef::Id(id));
        }
        let handle = s.strip_prefix('@').unwrap_or(s);
        if handle.is_empty() || handle.contains(char::is_whitespace) {
            return None;
        }
        Some(ChannelRef::Handle(format!("@{handle}")))
    }

    /// Public join link, when the channel has a public handle.
    pub fn join_url(&self) -> Option<Url> {
        match self {
            ChannelRef::Id(_) => None,
            ChannelRef::Handle(handle) => {
                Url::parse(&format!("https://t.me/{}", handle.trim_start_matches('@'))).ok()
            }
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Id(id) => write!(f, "{id}"),
            ChannelRef::Handle(handle) => write!(f, "{handle}"),
        }
    }
}

/// Membership status as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Owner,
    Administrator,
    Member,
    Absent,
}

impl Membership {
    pub fn is_subscribed(&self) -> bool {
        !matches!(self, Membership::Absent)
    }
}

/// Inline control model; the adapter maps it to the wire keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub rows: Vec<Vec<Button>>,
}

impl Control {
    pub fn single(button: Button) -> Control {
        Control {
            rows: vec![vec![button]],
        }
    }

    pub fn rows(rows: Vec<Vec<Button>>) -> Control {
        Control { rows }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: ButtonAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    Callback(CallbackAction),
    Link(Url),
}

impl Button {
    pub fn callback(label: impl Into<String>, action: CallbackAction) -> Button {
        Button {
            label: label.into(),
            action: ButtonAction::Callback(action),
        }
    }

    pub fn link(label: impl Into<String>, url: Url) -> Button {
        Button {
            label: label.into(),
            action: ButtonAction::Link(url),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    Html,
}

/// The bot's view of the messaging network. The workflows only ever talk to
/// this trait; the Telegram adapter and the test double implement it.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn membership(&self, channel: &ChannelRef, user: i64) -> Result<Membership>;

    /// Copy a user's message into the channel with the vote control
    /// attached. Returns the published message id.
    async fn copy_to_channel(
        &self,
        channel: i64,
        from_chat: i64,
        message: i32,
        control: Control,
    ) -> Result<i32>;

    async fn send(
        &self,
        chat: i64,
        text: &str,
        format: Format,
        control: Option<Control>,
    ) -> Result<i32>;

    async fn edit_control(&self, message: MessageRef, control: Control) -> Result<()>;

    /// Replace a message's text and control in place.
    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        format: Format,
        control: Option<Control>,
    ) -> Result<()>;

    async fn delete_message(&self, message: MessageRef) -> Result<()>;

    /// Acknowledge a tap; with `alert` the text pops up instead of a toast.
    async fn answer_tap(&self, tap_id: &str, text: Option<&str>, alert: bool) -> Result<()>;
}
