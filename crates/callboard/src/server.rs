use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::any,
    Router,
};
use clap::Args;
use clap_verbosity_flag::Verbosity;
use sea_orm::Database;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_log::AsTrace;

use crate::api::ApiState;
use crate::channels::telegram::{self, TelegramMessenger};
use crate::config::Config;
use crate::db;
use crate::session::SessionStore;
use crate::socket;
use callboard_common::error::CallboardError;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Verbosity
    #[command(flatten)]
    verbose: Verbosity,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

async fn authenticate(
    State(state): State<ApiState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok());

    match auth_header {
        Some(auth_header) if auth_header == state.auth => Ok(next.run(req).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

pub async fn init_run(args: RunArgs) -> Result<(), CallboardError> {
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.log_level_filter().as_trace())
        .init();

    let config = Config::load(args.config.as_deref())?;
    let token = config.token()?.to_owned();
    let required_channel = config.required_channel()?;
    let database = config.database()?;

    let uri = format!("sqlite://{}?mode=rwc", database.display());
    let db = Database::connect(&uri).await?;
    db::migration::migrate(&db).await?;

    let bot = teloxide::Bot::new(token);
    let state = ApiState {
        db,
        auth: config.auth.unwrap_or_default(),
        messenger: Arc::new(TelegramMessenger::new(bot.clone())),
        sessions: SessionStore::new(),
        required_channel,
    };

    println!("Callboard is running!");

    match config.bind {
        Some(bind) => {
            let updates = telegram::receive_updates(bot, state.clone());
            tokio::spawn(async move {
                if let Err(err) = updates.await {
                    error!("update stream ended: {err}");
                }
            });

            let app = Router::new()
                .route("/ws", any(socket::handler))
                .route_layer(middleware::from_fn_with_state(state.clone(), authenticate))
                .with_state(state);

            let addr: SocketAddr = bind
                .parse()
                .map_err(|_| CallboardError::Config(format!("invalid bind address {bind:?}")))?;
            info!("operator socket on {addr}");
            let listener = TcpListener::bind(addr).await?;
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await?;
            Ok(())
        }
        None => telegram::receive_updates(bot, state).await,
    }
}

pub async fn init_migrate(args: MigrateArgs) -> Result<(), CallboardError> {
    tracing_subscriber::fmt()
        .with_max_level(args.verbose.log_level_filter().as_trace())
        .init();

    let config = Config::load(args.config.as_deref())?;
    let database = config.database()?;

    let uri = format!("sqlite://{}?mode=rwc", database.display());
    let db = Database::connect(&uri).await?;
    db::migration::migrate(&db).await?;
    println!("Migrations applied to {}", database.display());
    Ok(())
}
