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

use tracing::warn;

use crate::channels::{ChannelRef, Messenger};

/// True only when the transport reports the user as a current member,
/// administrator or owner of the channel. A failed lookup counts as not a
/// member: the gate fails closed.
pub async fn is_member(messenger: &dyn Messenger, channel: &ChannelRef, user: i64) -> bool {
    match messenger.membership(channel, user).await {
        Ok(status) => status.is_subscribed(),
        Err(err) => {
            warn!(%channel, user, "membership lookup failed, treating as absent: {err}");
            false
        }
    }
}
