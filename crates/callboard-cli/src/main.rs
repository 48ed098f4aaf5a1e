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

use anyhow::{Context, Result};
use callboard_common::socket::{Paginate, SocketMessage};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use futures_util::{Sink, SinkExt, StreamExt};
use http::HeaderValue;
use tokio_tungstenite::{
    connect_async,
    tungstenite::client::IntoClientRequest,
    tungstenite::protocol::{CloseFrame, Message, frame::coding::CloseCode},
};
use tracing::{debug, error};
use tracing_log::AsTrace;
use url::Url;

/// The Callboard CLI
#[derive(Debug, Parser)] // requires `derive` feature
#[command(version, about, long_about = None)]
struct Cli {
    /// API authentication token
    #[arg(short, long)]
    auth: String,

    /// IP address and port to connect to
    #[arg(short, long)]
    connect: String,

    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// list submissions, newest first
    #[command()]
    Submissions {
        /// Only this owner's submissions
        #[arg(short, long)]
        owner: Option<i64>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u64>,

        /// Rows to skip
        #[arg(long)]
        offset: Option<u64>,
    },

    /// give a description of a submission
    #[command(arg_required_else_help = true)]
    Describe {
        /// Submission ID
        #[arg(short, long)]
        id: i32,
    },

    /// list the voters of a submission
    #[command(arg_required_else_help = true)]
    Voters {
        /// Submission ID
        #[arg(short, long)]
        id: i32,

        /// Page size
        #[arg(short, long)]
        limit: Option<u64>,

        /// Rows to skip
        #[arg(long)]
        offset: Option<u64>,
    },

    /// read an owner's settings
    #[command(arg_required_else_help = true)]
    Settings {
        /// Owner ID
        #[arg(short, long)]
        owner: i64,
    },

    /// count owners, submissions and votes
    #[command()]
    Stats {},
}

fn paginate(limit: Option<u64>, offset: Option<u64>) -> Option<Paginate> {
    if limit.is_none() && offset.is_none() {
        None
    } else {
        Some(Paginate { limit, offset })
    }
}

async fn send<S>(sender: &mut S, req: &serde_json::Value) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Send + Sync + std::error::Error + 'static,
{
    sender
        .send(Message::Text(serde_json::to_string(req).unwrap().into()))
        .await
        .context("Failed to send!")
}

async fn hangup<S>(sender: &mut S) -> Result<()>
where
    S: Sink<Message> + Unpin,
    S::Error: Send + Sync + std::error::Error + 'static,
{
    sender
        .send(Message::Close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "Normal".into(),
        })))
        .await
        .context("Failed to send close message.")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.log_level_filter().as_trace())
        .init();
    let connect = args.connect;
    let auth = args.auth;

    let url = Url::parse(&format!("ws://{}/ws", connect)).unwrap();
    let mut request = url.into_client_request().unwrap();
    let headers = request.headers_mut();
    let auth_value = HeaderValue::from_str(&auth).unwrap();
    headers.insert("Authorization", auth_value);
    let ws_stream = match connect_async(request).await {
        Ok((stream, response)) => {
            debug!("Handshake for client has been completed");
            // This will be the HTTP response, same as with server this is the last moment we
            // can still access HTTP stuff.
            debug!("Server response was {response:?}");
            stream
        }
        Err(e) => {
            error!("WebSocket handshake for client failed with {e}!");
            return Ok(());
        }
    };

    let (mut sender, mut receiver) = ws_stream.split();
    match args.command {
        Commands::Submissions {
            owner,
            limit,
            offset,
        } => {
            let req = serde_json::to_value(SocketMessage::<String>::ListSubmissions {
                owner_id: owner,
                options: paginate(limit, offset),
            })?;
            debug!("Request: {:?}", req.to_string());

            send(&mut sender, &req).await?;
            hangup(&mut sender).await?;
        }
        Commands::Describe { id } => {
            let req = serde_json::to_value(SocketMessage::<String>::ReadSubmission { id })?;
            debug!("Request: {:?}", req.to_string());

            send(&mut sender, &req).await?;
            hangup(&mut sender).await?;
        }
        Commands::Voters { id, limit, offset } => {
            let req = serde_json::to_value(SocketMessage::<String>::ListVoters {
                id,
                options: paginate(limit, offset),
            })?;
            debug!("Request: {:?}", req.to_string());

            send(&mut sender, &req).await?;
            hangup(&mut sender).await?;
        }
        Commands::Settings { owner } => {
            let req = serde_json::to_value(SocketMessage::<String>::ReadSettings { owner_id: owner })?;
            debug!("Request: {:?}", req.to_string());

            send(&mut sender, &req).await?;
            hangup(&mut sender).await?;
        }
        Commands::Stats {} => {
            let req = serde_json::to_value(SocketMessage::<String>::Stats)?;
            debug!("Request: {:?}", req.to_string());

            send(&mut sender, &req).await?;
            hangup(&mut sender).await?;
        }
    }

    //receiver just prints whatever it gets
    tokio::spawn(async move {
        debug!("Receiving!");
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(t) => {
                    println!("{}", t.as_str())
                }
                _ => println!("Unrecognized message"),
            }
        }
    })
    .await
    .unwrap();
    Ok(())
}
