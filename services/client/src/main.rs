//! Command-line client for a video hosting server.
//!
//! Every invocation restores the persisted session first; commands that talk
//! to the server drop it again when the server no longer accepts the token.

mod output;

use std::time::Duration;

use anyhow::{Context, Result, bail};
use auth::{Action, HttpAuthTransport, Role, Session, SessionStore};
use clap::{Args, Parser, Subcommand};
use common::config::ClientConfig;
use common::error::{TransportError, TransportResult};
use common::storage::FileStore;
use common::telemetry::init_tracing;
use futures::StreamExt;
use media::{
    Change, Dashboard, HttpMediaTransport, QueryState, SocketIoChannel, SortKey, StatusFilter,
    SyncError, WatchEnd, refresh_every,
};
use tracing::{debug, info};
use uuid::Uuid;

type Sessions = SessionStore<HttpAuthTransport, FileStore>;

#[derive(Parser, Debug)]
#[command(name = "stream-client", version, about = "Browse and moderate a video library")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session.
    Login {
        username: String,
        #[arg(long, env = "STREAM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the session and revoke its refresh token.
    Logout,

    /// Create an account. Does not log in.
    Register {
        username: String,
        email: String,
        #[arg(long, env = "STREAM_PASSWORD", hide_env_values = true)]
        password: String,
        /// viewer, editor or admin
        #[arg(long, default_value = "viewer")]
        role: Role,
    },

    /// Show the current session.
    Whoami,

    /// List the videos visible to the current session.
    List(QueryArgs),

    /// List, then follow live status changes until Ctrl-C.
    Watch(WatchArgs),

    /// Delete a video.
    Delete { id: Uuid },

    /// Print the streaming address of a playable video.
    StreamUrl { id: Uuid },
}

#[derive(Args, Debug, Clone)]
struct QueryArgs {
    /// Case-insensitive text matched against title and description
    #[arg(long, short, default_value = "")]
    search: String,
    /// all, pending, processing, safe or flagged
    #[arg(long, default_value = "all")]
    status: StatusFilter,
    /// server, title or newest
    #[arg(long, default_value = "server")]
    sort: SortKey,
}

#[derive(Args, Debug, Clone)]
struct WatchArgs {
    #[command(flatten)]
    query: QueryArgs,
    /// Reload the full list every N seconds; 0 disables it
    #[arg(long, default_value_t = 0)]
    refresh_secs: u64,
}

impl From<QueryArgs> for QueryState {
    fn from(args: QueryArgs) -> Self {
        QueryState {
            search_text: args.search,
            status_filter: args.status,
            sort: args.sort,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = ClientConfig::from_env().context("Failed to load configuration")?;
    debug!("Using API at {}", config.api_base_url);

    let transport = HttpAuthTransport::new(&config.api_base_url, config.request_timeout())?;
    let mut sessions = SessionStore::new(transport, FileStore::open(&config.credentials_path));
    sessions.bootstrap();

    match cli.command {
        Command::Login { username, password } => {
            let session = sessions.login(&username, &password).await?;
            output::print_session(&session);
        }
        Command::Logout => {
            sessions.logout().await;
            println!("Logged out.");
        }
        Command::Register {
            username,
            email,
            password,
            role,
        } => {
            sessions.register(&username, &email, &password, role).await?;
            println!("Registered {} as {}. You can now log in.", username, role);
        }
        Command::Whoami => match sessions.session() {
            Some(session) => output::print_session(session),
            None => println!("Not logged in."),
        },
        Command::List(query) => list(&config, &mut sessions, query.into()).await?,
        Command::Watch(args) => watch(&config, &mut sessions, args).await?,
        Command::Delete { id } => delete(&config, &mut sessions, id).await?,
        Command::StreamUrl { id } => stream_url(&config, &mut sessions, id).await?,
    }

    Ok(())
}

fn require_session(sessions: &Sessions, action: Action) -> Result<Session> {
    let session = sessions
        .snapshot()
        .context("Not logged in. Run `stream-client login <username>` first.")?;
    if !session.can(action) {
        bail!("Role {} is not allowed to do that.", session.role());
    }
    Ok(session)
}

/// Drop the session when the server rejected its token
async fn expire_on_unauthorized<T>(sessions: &mut Sessions, result: TransportResult<T>) -> Result<T> {
    match result {
        Err(TransportError::Unauthorized) => {
            info!("Server rejected the session token, logging out");
            sessions.logout().await;
            bail!("Session expired. Please log in again.")
        }
        other => Ok(other?),
    }
}

async fn load_dashboard(
    config: &ClientConfig,
    sessions: &mut Sessions,
    session: &Session,
    query: QueryState,
) -> Result<Dashboard<HttpMediaTransport>> {
    let transport = HttpMediaTransport::new(&config.api_base_url, config.request_timeout())?;
    let mut dashboard = Dashboard::with_query(transport, query);
    let loaded = dashboard.load(session.access_token()).await;
    expire_on_unauthorized(sessions, loaded).await?;
    Ok(dashboard)
}

async fn list(config: &ClientConfig, sessions: &mut Sessions, query: QueryState) -> Result<()> {
    let session = require_session(sessions, Action::ViewLibrary)?;
    let dashboard = load_dashboard(config, sessions, &session, query).await?;

    if session.can(Action::ViewAllMedia) {
        println!("All uploads:");
    }
    output::print_library(&dashboard.visible());
    Ok(())
}

async fn watch(config: &ClientConfig, sessions: &mut Sessions, args: WatchArgs) -> Result<()> {
    let session = require_session(sessions, Action::ViewLibrary)?;
    let transport = HttpMediaTransport::new(&config.api_base_url, config.request_timeout())?;
    let mut dashboard = Dashboard::with_query(transport, args.query.into());
    let channel = SocketIoChannel::new(&config.live_base_url)?;

    let subscription = match dashboard.connect(session.access_token(), &channel).await {
        Ok(subscription) => subscription,
        Err(SyncError::Transport(e)) => expire_on_unauthorized(sessions, Err(e)).await?,
        Err(e) => return Err(e.into()),
    };
    output::print_library(&dashboard.visible());
    println!("Watching for status changes, press Ctrl-C to stop.");

    let refresh = match args.refresh_secs {
        0 => futures::stream::pending().boxed(),
        secs => refresh_every(Duration::from_secs(secs)).boxed(),
    };
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let end = dashboard
        .watch(
            session.access_token(),
            subscription,
            refresh,
            shutdown,
            |dashboard, change| match change {
                Change::Patched(event) => {
                    output::print_change(dashboard.collection().get(event.id), &event)
                }
                Change::Refreshed => output::print_refresh(dashboard.collection().len()),
            },
        )
        .await;

    match end {
        WatchEnd::Shutdown => {}
        WatchEnd::StreamEnded => println!("Live updates ended by the server."),
        WatchEnd::Unauthorized => {
            info!("Server rejected the session token, logging out");
            sessions.logout().await;
            bail!("Session expired. Please log in again.")
        }
    }
    Ok(())
}

async fn delete(config: &ClientConfig, sessions: &mut Sessions, id: Uuid) -> Result<()> {
    let session = require_session(sessions, Action::Delete)?;
    let mut dashboard = load_dashboard(config, sessions, &session, QueryState::default()).await?;

    let item = dashboard
        .collection()
        .get(id)
        .with_context(|| format!("No video with id {}", id))?;
    if !session.can_delete(&item.uploaded_by) {
        bail!("Only the uploader or an admin can delete \"{}\".", item.title);
    }

    let deleted = dashboard.delete(session.access_token(), id).await;
    if let Some(item) = expire_on_unauthorized(sessions, deleted).await? {
        println!("Deleted \"{}\".", item.title);
    }
    Ok(())
}

async fn stream_url(config: &ClientConfig, sessions: &mut Sessions, id: Uuid) -> Result<()> {
    let session = require_session(sessions, Action::ViewLibrary)?;
    let dashboard = load_dashboard(config, sessions, &session, QueryState::default()).await?;

    let Some(url) = dashboard.playback_url(session.access_token(), id) else {
        bail!("Video {} is not available for playback.", id);
    };
    println!("{}", url?);
    Ok(())
}
