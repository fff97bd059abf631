//! `haven` — SOS dispatch server and admin commands.
//!
//! Reads `haven.toml` (or the path given with `--config`), layered with
//! `HAVEN_*` environment variables, and opens the SQLite store.
//!
//! ```text
//! haven serve
//! haven user add alice alice@example.com
//! haven contact add 1 "Mum" --email mum@example.com --phone +15550001
//! haven alerts 1
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use haven_core::{
  contact::{DEFAULT_PRIORITY, NewTrustedContact},
  store::SafetyStore as _,
  user::UserId,
};
use haven_server::{ServerConfig, build_dispatcher, build_fanout, non_blank};
use haven_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "haven", author, version, about = "Haven SOS dispatch server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "haven.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Manage users.
  #[command(subcommand)]
  User(UserCommand),
  /// Manage trusted contacts.
  #[command(subcommand)]
  Contact(ContactCommand),
  /// Print a user's alerts as JSON, newest first.
  Alerts { user_id: UserId },
}

#[derive(Subcommand)]
enum UserCommand {
  Add { username: String, email: String },
}

#[derive(Subcommand)]
enum ContactCommand {
  Add {
    user_id:  UserId,
    name:     String,
    #[arg(long)]
    email:    Option<String>,
    #[arg(long)]
    phone:    Option<String>,
    /// Lower numbers are notified first.
    #[arg(long, default_value_t = DEFAULT_PRIORITY)]
    priority: i32,
    /// Store the contact with SOS notifications turned off.
    #[arg(long)]
    disabled: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let cfg = ServerConfig::load(&cli.config).context("failed to read configuration")?;

  let store_path = cfg.resolved_store_path();
  if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,

    Command::User(UserCommand::Add { username, email }) => {
      let user = store
        .add_user(username, email)
        .await
        .context("failed to add user")?;
      println!("{}", serde_json::to_string_pretty(&user)?);
      Ok(())
    }

    Command::Contact(ContactCommand::Add {
      user_id,
      name,
      email,
      phone,
      priority,
      disabled,
    }) => {
      let mut new = NewTrustedContact::new(user_id, name).with_priority(priority);
      if let Some(email) = non_blank(email) {
        new = new.with_email(email);
      }
      if let Some(phone) = non_blank(phone) {
        new = new.with_phone(phone);
      }
      if disabled {
        new = new.disabled();
      }
      let contact = store.add_contact(new).await.context("failed to add contact")?;
      if contact.is_unreachable() {
        tracing::warn!(contact_id = contact.id, "contact has neither email nor phone");
      }
      println!("{}", serde_json::to_string_pretty(&contact)?);
      Ok(())
    }

    Command::Alerts { user_id } => {
      store
        .get_user(user_id)
        .await?
        .with_context(|| format!("no user with id {user_id}"))?;
      let alerts = store.list_alerts(user_id).await?;
      println!("{}", serde_json::to_string_pretty(&alerts)?);
      Ok(())
    }
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let email = cfg
    .email
    .as_ref()
    .context("missing [email] configuration section")?;
  let fanout = build_fanout(&cfg, email).context("failed to configure email")?;
  let dispatcher = Arc::new(build_dispatcher(Arc::new(store), fanout));

  let app = haven_api::router(dispatcher).layer(TraceLayer::new_for_http());
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
