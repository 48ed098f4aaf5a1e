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

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Which settings field the user's next message applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    MandatoryMessage,
    VoteEmoji,
    Channel,
}

/// The most recent unconfirmed post; a newer one silently replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPost {
    pub chat: i64,
    pub message: i32,
    pub text: String,
}

#[derive(Debug, Default)]
struct Session {
    pending_post: Option<PendingPost>,
    pending_action: Option<SettingField>,
}

/// Per-user ephemeral state. One lock with short critical sections;
/// consuming reads clear the slot so a decision can act at most once.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<i64, Session>>>,
}

impl SessionStore {
    pub fn new() -> SessionStore {
        SessionStore::default()
    }

    pub fn stage_post(&self, user: i64, post: PendingPost) {
        self.lock().entry(user).or_default().pending_post = Some(post);
    }

    pub fn take_post(&self, user: i64) -> Option<PendingPost> {
        self.lock()
            .get_mut(&user)
            .and_then(|session| session.pending_post.take())
    }

    pub fn set_action(&self, user: i64, field: SettingField) {
        self.lock().entry(user).or_default().pending_action = Some(field);
    }

    pub fn take_action(&self, user: i64) -> Option<SettingField> {
        self.lock()
            .get_mut(&user)
            .and_then(|session| session.pending_action.take())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, Session>> {
        self.inner.lock().expect("session lock poisoned")
    }
}

#[cfg(test)]
mod test_session {
    use super::*;

    fn post(message: i32) -> PendingPost {
        PendingPost {
            chat: 7,
            message,
            text: format!("post {message}"),
        }
    }

    #[test]
    fn it_should_consume_a_post_once() {
        let sessions = SessionStore::new();
        sessions.stage_post(7, post(1));

        assert_eq!(sessions.take_post(7), Some(post(1)));
        assert_eq!(sessions.take_post(7), None);
    }

    #[test]
    fn it_should_replace_a_pending_post() {
        let sessions = SessionStore::new();
        sessions.stage_post(7, post(1));
        sessions.stage_post(7, post(2));

        assert_eq!(sessions.take_post(7), Some(post(2)));
        assert_eq!(sessions.take_post(7), None);
    }

    #[test]
    fn it_should_keep_slots_independent() {
        let sessions = SessionStore::new();
        sessions.stage_post(7, post(1));
        sessions.set_action(7, SettingField::VoteEmoji);

        assert_eq!(sessions.take_action(7), Some(SettingField::VoteEmoji));
        assert_eq!(sessions.take_action(7), None);
        assert_eq!(sessions.take_post(7), Some(post(1)));
    }

    #[test]
    fn it_should_keep_users_independent() {
        let sessions = SessionStore::new();
        sessions.stage_post(7, post(1));

        assert_eq!(sessions.take_post(8), None);
        assert_eq!(sessions.take_post(7), Some(post(1)));
    }
}
