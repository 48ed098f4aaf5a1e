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

//! Texts and inline controls. Settings and user text are interpolated into
//! HTML, so everything untrusted goes through [`escape_html`] first.

use crate::channels::{Button, ChannelRef, Control};
use crate::db::entities::settings;
use crate::event::{Actor, CallbackAction};
use crate::session::SettingField;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// The vote control under a published copy: one button, `"<emoji> <count>"`.
pub fn vote_control(emoji: &str, count: i32) -> Control {
    Control::single(Button::callback(
        format!("{emoji} {count}"),
        CallbackAction::Vote,
    ))
}

pub fn main_menu(name: &str, entry: &settings::Model) -> (String, Control) {
    let channel = match entry.channel_id {
        Some(id) => format!("<code>{id}</code>"),
        None => "not bound yet".to_owned(),
    };
    let notify = if entry.notify_on_vote { "on" } else { "off" };
    let text = format!(
        "Hi {}! 👋\n\nYour current setup:\n\
         • Vote emoji: {}\n\
         • Channel: {}\n\
         • Vote notifications: {}\n\
         • Subscription message: {}\n\n\
         What would you like to change?",
        escape_html(name),
        escape_html(&entry.vote_emoji),
        channel,
        notify,
        escape_html(&entry.mandatory_message),
    );

    let notify_label = if entry.notify_on_vote {
        "🔔 Vote notifications: on"
    } else {
        "🔕 Vote notifications: off"
    };
    let control = Control::rows(vec![
        vec![Button::callback(
            "✍️ Edit subscription message",
            CallbackAction::SetMessage,
        )],
        vec![Button::callback(
            "📢 Bind a channel",
            CallbackAction::SetChannel,
        )],
        vec![Button::callback(
            "😀 Change vote emoji",
            CallbackAction::SetEmoji,
        )],
        vec![Button::callback(
            notify_label,
            CallbackAction::ToggleNotifications,
        )],
    ]);
    (text, control)
}

pub fn confirmation() -> (String, Control) {
    let control = Control::rows(vec![vec![
        Button::callback("✅ Publish", CallbackAction::Confirm),
        Button::callback("❌ Cancel", CallbackAction::Reject),
    ]]);
    ("Publish this to your channel?".to_owned(), control)
}

/// Shown whenever the gate turns someone away from the private chat. The
/// join button only appears when the required channel has a public handle.
pub fn subscription_prompt(required: &ChannelRef) -> (String, Control) {
    let mut rows = Vec::new();
    if let Some(url) = required.join_url() {
        rows.push(vec![Button::link("📢 Join the channel", url)]);
    }
    rows.push(vec![Button::callback(
        "✅ I've joined",
        CallbackAction::CheckSubscription,
    )]);
    (
        "You need to join our channel before using the bot.".to_owned(),
        Control::rows(rows),
    )
}

pub fn setting_prompt(field: SettingField) -> (String, Control) {
    let text = match field {
        SettingField::MandatoryMessage => "Send the new subscription message.",
        SettingField::VoteEmoji => "Send the new vote emoji.",
        SettingField::Channel => {
            "Forward a post from your channel, or send its numeric id. \
             The bot must be an administrator there."
        }
    };
    let control = Control::single(Button::callback("◀️ Back", CallbackAction::Back));
    (text.to_owned(), control)
}

/// The owner's notification for a freshly recorded vote (never sent for a
/// withdrawal). HTML; everything user-controlled is escaped.
pub fn vote_notification(emoji: &str, text: &str, voter: &Actor, votes: i32) -> String {
    let handle = match &voter.username {
        Some(handle) => format!("@{}", escape_html(handle)),
        None => "none".to_owned(),
    };
    let locale = match &voter.locale {
        Some(locale) => escape_html(locale),
        None => "unknown".to_owned(),
    };
    format!(
        "🔔 <b>New vote {}</b>\n{}\n\n\
         👤 Name: {}\n\
         🆔 Id: <code>{}</code>\n\
         📛 Handle: {}\n\
         🌐 Locale: {}\n\
         📊 Total votes: <b>{}</b>",
        escape_html(emoji),
        escape_html(text),
        escape_html(&voter.full_name),
        voter.id,
        handle,
        locale,
        votes,
    )
}

#[cfg(test)]
mod test_menu {
    use super::*;
    use crate::channels::ButtonAction;

    fn entry() -> settings::Model {
        settings::Model {
            owner_id: 7,
            channel_id: None,
            mandatory_message: "Please subscribe to the channel first.".to_owned(),
            vote_emoji: "❤️".to_owned(),
            notify_on_vote: false,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn it_should_label_the_vote_control_with_emoji_and_count() {
        let control = vote_control("👍", 0);
        assert_eq!(control.rows[0][0].label, "👍 0");

        let control = vote_control("❤️", 12);
        assert_eq!(control.rows[0][0].label, "❤️ 12");
    }

    #[test]
    fn it_should_escape_owner_text_in_the_menu() {
        let mut entry = entry();
        entry.mandatory_message = "<b>join</b> & stay".to_owned();
        let (text, _) = main_menu("Ada <3", &entry);

        assert!(text.contains("Ada &lt;3"));
        assert!(text.contains("&lt;b&gt;join&lt;/b&gt; &amp; stay"));
        assert!(text.contains("not bound yet"));
    }

    #[test]
    fn it_should_only_link_public_channels() {
        let (_, with_link) = subscription_prompt(&ChannelRef::Handle("@callboard".to_owned()));
        assert_eq!(with_link.rows.len(), 2);
        assert!(matches!(
            with_link.rows[0][0].action,
            ButtonAction::Link(_)
        ));

        let (_, without) = subscription_prompt(&ChannelRef::Id(-100500));
        assert_eq!(without.rows.len(), 1);
        assert!(matches!(
            without.rows[0][0].action,
            ButtonAction::Callback(CallbackAction::CheckSubscription)
        ));
    }

    #[test]
    fn it_should_report_voter_details_in_the_notification() {
        let voter = Actor {
            id: 5551,
            full_name: "Grace <H>".to_owned(),
            username: None,
            locale: Some("en".to_owned()),
        };
        let text = vote_notification("👍", "Hello & welcome", &voter, 3);

        assert!(text.contains("<code>5551</code>"));
        assert!(text.contains("Grace &lt;H&gt;"));
        assert!(text.contains("Hello &amp; welcome"));
        assert!(text.contains("none"));
        assert!(text.contains("en"));
        assert!(text.contains("<b>3</b>"));
    }
}
