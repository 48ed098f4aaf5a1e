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

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{ConnectInfo, State},
    response::IntoResponse,
};
use callboard_common::{
    error::{CallboardError, Result},
    socket::{Response, SocketMessage},
};
use serde::Serialize;
use std::net::SocketAddr;
use tracing::{debug, error};

use crate::api;
use crate::api::ApiState;

pub async fn handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<ApiState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

async fn handle_socket(mut socket: WebSocket, who: SocketAddr, state: ApiState) {
    while let Some(msg) = socket.recv().await {
        let msg = if let Ok(msg) = msg {
            match process_message(msg, who, &state).await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    debug!("Websocket closed");
                    return;
                }
                Err(err) => {
                    error!("Error parsing message from {who}: {}", err);
                    return;
                }
            }
        } else {
            error!("Client {who} abruptly disconnected");
            return;
        };

        if socket.send(msg).await.is_err() {
            error!("Client {who} abruptly disconnected");
            return;
        }
    }
}

fn wrap_error<S: Serialize>(response_type: &str, res: &S) -> Result<Option<Message>> {
    Ok(Some(Message::Text(
        serde_json::to_string(&SocketMessage::Error(Response {
            response_type: response_type.to_owned(),
            response: res,
        }))?
        .into(),
    )))
}

fn wrap_response<S: Serialize>(response_type: &str, res: &S) -> Result<Option<Message>> {
    Ok(Some(Message::Text(
        serde_json::to_string(&SocketMessage::Response(Response {
            response_type: response_type.to_owned(),
            response: res,
        }))?
        .into(),
    )))
}

async fn process_message(
    msg: Message,
    who: SocketAddr,
    state: &ApiState,
) -> Result<Option<Message>> {
    match msg {
        Message::Text(t) => {
            debug!(">>> {who} sent str: {t:?}");
            let contents: SocketMessage<String> = serde_json::from_slice(t.as_bytes())?;
            match contents {
                SocketMessage::ListSubmissions { owner_id, options } => {
                    if let Some(paginate) = options {
                        match api::list_submissions(
                            owner_id,
                            paginate.limit,
                            paginate.offset,
                            state,
                        )
                        .await
                        {
                            Ok(res) => wrap_response("ListSubmissions", &res),
                            Err(err) => wrap_error("ListSubmissions", &err.to_string()),
                        }
                    } else {
                        match api::list_submissions(owner_id, None, None, state).await {
                            Ok(res) => wrap_response("ListSubmissions", &res),
                            Err(err) => wrap_error("ListSubmissions", &err.to_string()),
                        }
                    }
                }
                SocketMessage::ReadSubmission { id } => {
                    match api::read_submission(id, state).await {
                        Ok(res) => wrap_response("ReadSubmission", &res),
                        Err(err) => wrap_error("ReadSubmission", &err.to_string()),
                    }
                }
                SocketMessage::ListVoters { id, options } => {
                    if let Some(paginate) = options {
                        match api::list_voters(id, paginate.limit, paginate.offset, state).await {
                            Ok(res) => wrap_response("ListVoters", &res),
                            Err(err) => wrap_error("ListVoters", &err.to_string()),
                        }
                    } else {
                        match api::list_voters(id, None, None, state).await {
                            Ok(res) => wrap_response("ListVoters", &res),
                            Err(err) => wrap_error("ListVoters", &err.to_string()),
                        }
                    }
                }
                SocketMessage::ReadSettings { owner_id } => {
                    match api::read_settings(owner_id, state).await {
                        Ok(res) => wrap_response("ReadSettings", &res),
                        Err(err) => wrap_error("ReadSettings", &err.to_string()),
                    }
                }
                SocketMessage::Stats => match api::stats(state).await {
                    Ok(res) => wrap_response("Stats", &res),
                    Err(err) => wrap_error("Stats", &err.to_string()),
                },
                _ => Ok(wrap_error(
                    "SocketMessage",
                    &"Invalid SocketMessage".to_owned(),
                )?),
            }
        }
        Message::Binary(d) => {
            debug!(">>> {} sent {} bytes: {:?}", who, d.len(), d);
            Ok(wrap_error(
                "BinaryFrame",
                &"Server doesn't accept binary frames".to_owned(),
            )?)
        }
        Message::Close(c) => {
            if let Some(cf) = c {
                debug!(
                    ">>> {} sent close with code {} and reason `{}`",
                    who, cf.code, cf.reason
                );
                match cf.code {
                    1000 => Ok(None), // 1000 is code for "Normal"
                    _ => Err(CallboardError::WebsocketClose),
                }
            } else {
                debug!(">>> {who} somehow sent close message without CloseFrame");
                Err(CallboardError::WebsocketClose)
            }
        }

        Message::Pong(v) => {
            debug!(">>> {who} sent pong with {v:?}");
            Ok(Some(Message::Text(
                serde_json::to_string("Pong received")?.into(),
            )))
        }
        Message::Ping(v) => {
            debug!(">>> {who} sent ping with {v:?}");
            Ok(Some(Message::Text(
                serde_json::to_string("Ping received")?.into(),
            )))
        }
    }
}
