//! `subspace` — terminal UI for the Subspace subscription ledger.
//!
//! # Usage
//!
//! ```
//! subspace --url http://localhost:7455
//! subspace --url http://localhost:7455 --email alice@example.com --password secret
//! subspace --config ~/.config/subspace/config.toml
//! ```

mod app;
mod client;
mod ui;

use std::{io, time::Duration};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event},
  execute,
  terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
  },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
  name = "subspace",
  about = "Terminal UI for the Subspace subscription ledger"
)]
struct Args {
  /// Path to a TOML config file (url, email, password).
  #[arg(short, long, value_name = "FILE")]
  config: Option<std::path::PathBuf>,

  /// Base URL of the Subspace server (default: http://localhost:7455).
  #[arg(long, env = "SUBSPACE_URL")]
  url: Option<String>,

  /// Email to sign in with on startup.
  #[arg(long, env = "SUBSPACE_EMAIL")]
  email: Option<String>,

  /// Password for the startup sign-in (plaintext).
  #[arg(long, env = "SUBSPACE_PASSWORD")]
  password: Option<String>,
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:      String,
  #[serde(default)]
  email:    String,
  #[serde(default)]
  password: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  // Load config file if provided.
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| "http://localhost:7455".to_string());
  let email = args
    .email
    .or_else(|| (!file_cfg.email.is_empty()).then(|| file_cfg.email.clone()));
  let password = args.password.or_else(|| {
    (!file_cfg.password.is_empty()).then(|| file_cfg.password.clone())
  });

  let client = ApiClient::new(ApiConfig { base_url: url })?;
  let mut app = App::new(client);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  // Resolve the startup principal state before the first frame.
  app.resolve_startup(email.as_deref(), password.as_deref()).await;

  let run_result = run_event_loop(&mut terminal, &mut app).await;

  // Cancel the live subscription and restore the terminal regardless of
  // the result.
  app.shutdown();
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ───────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
) -> Result<()> {
  loop {
    // Apply any snapshots the live feed delivered since the last frame.
    app.drain_feed();

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    if let Some(evt) = maybe_event {
      match evt {
        Event::Key(key) => {
          let cont = app.handle_key(key).await?;
          if !cont {
            break;
          }
        }
        Event::Resize(_, _) => {
          // Terminal will redraw on next iteration.
        }
        _ => {}
      }
    }
  }

  Ok(())
}
