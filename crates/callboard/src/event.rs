use crate::channels::MessageRef;

/// Callback data carried by the inline controls. Parsed once at the
/// transport boundary; everything past it matches on the enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    Confirm,
    Reject,
    Vote,
    CheckSubscription,
    SetMessage,
    SetEmoji,
    SetChannel,
    ToggleNotifications,
    Back,
}

impl CallbackAction {
    pub fn as_data(&self) -> &'static str {
        match self {
            CallbackAction::Confirm => "confirm",
            CallbackAction::Reject => "reject",
            CallbackAction::Vote => "vote",
            CallbackAction::CheckSubscription => "check_sub",
            CallbackAction::SetMessage => "set_msg",
            CallbackAction::SetEmoji => "set_emoji",
            CallbackAction::SetChannel => "set_chan",
            CallbackAction::ToggleNotifications => "toggle_notif",
            CallbackAction::Back => "back",
        }
    }

    pub fn from_data(data: &str) -> Option<Self> {
        match data {
            "confirm" => Some(CallbackAction::Confirm),
            "reject" => Some(CallbackAction::Reject),
            "vote" => Some(CallbackAction::Vote),
            "check_sub" => Some(CallbackAction::CheckSubscription),
            "set_msg" => Some(CallbackAction::SetMessage),
            "set_emoji" => Some(CallbackAction::SetEmoji),
            "set_chan" => Some(CallbackAction::SetChannel),
            "toggle_notif" => Some(CallbackAction::ToggleNotifications),
            "back" => Some(CallbackAction::Back),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Unknown(String),
}

impl Command {
    /// `/start`, `/start@botname` and `/start payload` all count as start.
    pub fn parse(text: &str) -> Command {
        let word = text.split_whitespace().next().unwrap_or("");
        let name = word.split('@').next().unwrap_or("");
        match name {
            "/start" => Command::Start,
            _ => Command::Unknown(name.to_owned()),
        }
    }
}

/// Whoever produced the update, as far as the transport tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub full_name: String,
    pub username: Option<String>,
    pub locale: Option<String>,
}

/// A content message in the private chat. `text` is the body or caption
/// snapshot; `forwarded_channel` is set when the message was forwarded out
/// of a channel (used for channel binding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub message: i32,
    pub text: Option<String>,
    pub forwarded_channel: Option<i64>,
}

/// An inline-control tap. `message` addresses the message the control sits
/// on, when the transport still has it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tap {
    pub id: String,
    pub action: Option<CallbackAction>,
    pub message: Option<MessageRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingKind {
    Command(Command),
    Post(Post),
    Tap(Tap),
}

/// One update, already mapped out of the wire types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub actor: Actor,
    pub chat: i64,
    pub kind: IncomingKind,
}

#[cfg(test)]
mod test_event {
    use super::*;

    #[test]
    fn it_should_round_trip_callback_data() {
        for action in [
            CallbackAction::Confirm,
            CallbackAction::Reject,
            CallbackAction::Vote,
            CallbackAction::CheckSubscription,
            CallbackAction::SetMessage,
            CallbackAction::SetEmoji,
            CallbackAction::SetChannel,
            CallbackAction::ToggleNotifications,
            CallbackAction::Back,
        ] {
            assert_eq!(CallbackAction::from_data(action.as_data()), Some(action));
        }
        assert_eq!(CallbackAction::from_data("unvote"), None);
    }

    #[test]
    fn it_should_recognize_start_variants() {
        assert_eq!(Command::parse("/start"), Command::Start);
        assert_eq!(Command::parse("/start@callboard_bot"), Command::Start);
        assert_eq!(Command::parse("/start ref123"), Command::Start);
        assert_eq!(
            Command::parse("/help"),
            Command::Unknown("/help".to_owned())
        );
    }
}
