#[cfg(test)]
use crate::api::ApiState;
#[cfg(test)]
use crate::channels::{ChannelRef, Control, Format, Membership, MessageRef, Messenger};
#[cfg(test)]
use crate::db;
#[cfg(test)]
use crate::event::{Actor, CallbackAction, Command, Incoming, IncomingKind, Post, Tap};
#[cfg(test)]
use crate::session::SessionStore;
#[cfg(test)]
use crate::socket;
#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use axum::{routing::any, Router};
#[cfg(test)]
use axum_test::{TestServer, TestWebSocket};
#[cfg(test)]
use callboard_common::error::{CallboardError, Result};
#[cfg(test)]
use sea_orm::{Database, DatabaseConnection};
#[cfg(test)]
use sea_orm_migration::MigratorTrait;
#[cfg(test)]
use std::collections::HashSet;
#[cfg(test)]
use std::net::SocketAddr;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
#[cfg(test)]
use std::sync::{Arc, Mutex};

#[cfg(test)]
pub async fn get_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db::migration::Migrator::refresh(&db).await.unwrap();
    db
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Sent {
    pub chat: i64,
    pub text: String,
    pub format: Format,
    pub control: Option<Control>,
    pub message: i32,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Copied {
    pub channel: i64,
    pub from_chat: i64,
    pub message: i32,
    pub control: Control,
    pub published: i32,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct TextEdit {
    pub message: MessageRef,
    pub text: String,
    pub format: Format,
    pub control: Option<Control>,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ControlEdit {
    pub message: MessageRef,
    pub control: Control,
}

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct Ack {
    pub id: String,
    pub text: Option<String>,
    pub alert: bool,
}

/// In-memory [`Messenger`]: membership is a set, every call is recorded,
/// and each failure mode can be switched on per test.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestMessenger {
    members: Mutex<HashSet<(String, i64)>>,
    fail_membership: AtomicBool,
    fail_copy: AtomicBool,
    fail_send: AtomicBool,
    next_message: AtomicI32,
    sent: Mutex<Vec<Sent>>,
    copies: Mutex<Vec<Copied>>,
    text_edits: Mutex<Vec<TextEdit>>,
    control_edits: Mutex<Vec<ControlEdit>>,
    deletes: Mutex<Vec<MessageRef>>,
    acks: Mutex<Vec<Ack>>,
}

#[cfg(test)]
impl TestMessenger {
    pub fn new() -> TestMessenger {
        TestMessenger {
            // Seeded message ids never collide with a fresh counter.
            next_message: AtomicI32::new(1000),
            ..TestMessenger::default()
        }
    }

    pub fn join(&self, channel: &ChannelRef, user: i64) {
        self.members
            .lock()
            .unwrap()
            .insert((channel.to_string(), user));
    }

    pub fn break_membership(&self) {
        self.fail_membership.store(true, Ordering::SeqCst);
    }

    pub fn break_copy(&self) {
        self.fail_copy.store(true, Ordering::SeqCst);
    }

    pub fn break_send(&self) {
        self.fail_send.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Option<Sent> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn copies(&self) -> Vec<Copied> {
        self.copies.lock().unwrap().clone()
    }

    pub fn text_edits(&self) -> Vec<TextEdit> {
        self.text_edits.lock().unwrap().clone()
    }

    pub fn control_edits(&self) -> Vec<ControlEdit> {
        self.control_edits.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<MessageRef> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<Ack> {
        self.acks.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Messenger for TestMessenger {
    async fn membership(&self, channel: &ChannelRef, user: i64) -> Result<Membership> {
        if self.fail_membership.load(Ordering::SeqCst) {
            return Err(CallboardError::Telegram(
                "membership lookup refused".to_owned(),
            ));
        }
        let members = self.members.lock().unwrap();
        if members.contains(&(channel.to_string(), user)) {
            Ok(Membership::Member)
        } else {
            Ok(Membership::Absent)
        }
    }

    async fn copy_to_channel(
        &self,
        channel: i64,
        from_chat: i64,
        message: i32,
        control: Control,
    ) -> Result<i32> {
        if self.fail_copy.load(Ordering::SeqCst) {
            return Err(CallboardError::Telegram("copy refused".to_owned()));
        }
        let published = self.next_message.fetch_add(1, Ordering::SeqCst);
        self.copies.lock().unwrap().push(Copied {
            channel,
            from_chat,
            message,
            control,
            published,
        });
        Ok(published)
    }

    async fn send(
        &self,
        chat: i64,
        text: &str,
        format: Format,
        control: Option<Control>,
    ) -> Result<i32> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(CallboardError::Telegram("send refused".to_owned()));
        }
        let message = self.next_message.fetch_add(1, Ordering::SeqCst);
        self.sent.lock().unwrap().push(Sent {
            chat,
            text: text.to_owned(),
            format,
            control,
            message,
        });
        Ok(message)
    }

    async fn edit_control(&self, message: MessageRef, control: Control) -> Result<()> {
        self.control_edits
            .lock()
            .unwrap()
            .push(ControlEdit { message, control });
        Ok(())
    }

    async fn edit_text(
        &self,
        message: MessageRef,
        text: &str,
        format: Format,
        control: Option<Control>,
    ) -> Result<()> {
        self.text_edits.lock().unwrap().push(TextEdit {
            message,
            text: text.to_owned(),
            format,
            control,
        });
        Ok(())
    }

    async fn delete_message(&self, message: MessageRef) -> Result<()> {
        self.deletes.lock().unwrap().push(message);
        Ok(())
    }

    async fn answer_tap(&self, tap_id: &str, text: Option<&str>, alert: bool) -> Result<()> {
        self.acks.lock().unwrap().push(Ack {
            id: tap_id.to_owned(),
            text: text.map(str::to_owned),
            alert,
        });
        Ok(())
    }
}

#[cfg(test)]
pub async fn get_test_rig() -> (ApiState, Arc<TestMessenger>) {
    let db = get_test_db().await;
    let messenger = Arc::new(TestMessenger::new());
    let state = ApiState {
        db,
        auth: "test".into(),
        messenger: messenger.clone(),
        sessions: SessionStore::new(),
        required_channel: ChannelRef::Handle("@callboard".to_owned()),
    };
    (state, messenger)
}

#[cfg(test)]
pub async fn get_test_state() -> ApiState {
    get_test_rig().await.0
}

#[cfg(test)]
pub async fn get_test_socket() -> (TestWebSocket, ApiState) {
    let (state, _) = get_test_rig().await;

    let app = Router::new()
        .route("/ws", any(socket::handler))
        .with_state(state.clone());

    let server = TestServer::builder()
        .http_transport()
        .build(app.into_make_service_with_connect_info::<SocketAddr>())
        .unwrap();
    let socket = server.get_websocket("/ws").await.into_websocket().await;
    (socket, state)
}

#[cfg(test)]
static TAP_SEQ: AtomicU64 = AtomicU64::new(0);

#[cfg(test)]
pub fn actor(id: i64) -> Actor {
    Actor {
        id,
        full_name: format!("Test User {id}"),
        username: Some(format!("user{id}")),
        locale: Some("en".to_owned()),
    }
}

#[cfg(test)]
pub fn command_incoming(actor: &Actor, chat: i64, text: &str) -> Incoming {
    Incoming {
        actor: actor.clone(),
        chat,
        kind: IncomingKind::Command(Command::parse(text)),
    }
}

#[cfg(test)]
pub fn post_incoming(actor: &Actor, chat: i64, message: i32, text: &str) -> Incoming {
    Incoming {
        actor: actor.clone(),
        chat,
        kind: IncomingKind::Post(Post {
            message,
            text: Some(text.to_owned()),
            forwarded_channel: None,
        }),
    }
}

#[cfg(test)]
pub fn forward_incoming(actor: &Actor, chat: i64, message: i32, channel: i64) -> Incoming {
    Incoming {
        actor: actor.clone(),
        chat,
        kind: IncomingKind::Post(Post {
            message,
            text: None,
            forwarded_channel: Some(channel),
        }),
    }
}

#[cfg(test)]
pub fn tap_incoming(actor: &Actor, chat: i64, message: i32, action: CallbackAction) -> Incoming {
    Incoming {
        actor: actor.clone(),
        chat,
        kind: IncomingKind::Tap(Tap {
            id: format!("tap-{}", TAP_SEQ.fetch_add(1, Ordering::SeqCst)),
            action: Some(action),
            message: Some(MessageRef { chat, message }),
        }),
    }
}
