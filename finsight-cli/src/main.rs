use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use finsight_client::{ApiClient, AuthGateway, UploadController};
use finsight_core::{Dashboard, DashboardSource, Guarded, SelectedFile, SessionContext, SessionGuard, UploadOutcome, View};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod auth;
mod charts;
mod config;
mod state;

use auth::{prompt, prompt_secret, FileCredentialStore};
use config::{load_config, parse_source, Config, SourceKind};

const CHART_WIDTH: u16 = 72;
const FLOW_CHART_HEIGHT: u16 = 16;

#[derive(Parser, Debug)]
#[command(
    name = "finsight",
    version,
    about = "Upload bank statements and review income and expenses"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session credential
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account (does not sign you in)
    Register {
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored credential
    Logout,

    /// Show whether a session credential is present
    Status,

    /// Upload one statement file (PDF, CSV or XLSX)
    Upload {
        file: PathBuf,

        /// Show the refreshed dashboard after a successful upload
        #[arg(long)]
        dashboard: bool,
    },

    /// Summary figures and charts
    Dashboard {
        /// mock | remote (default from config.toml)
        #[arg(long)]
        source: Option<String>,
    },

    /// Manage ~/.finsight/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

struct App {
    config: Config,
    session: SessionContext,
    api: ApiClient,
}

impl App {
    fn load() -> Result<Self> {
        let config = load_config()?;
        let store = FileCredentialStore::open_default()?;
        let api = ApiClient::new(&config.api_config()).context("build HTTP client")?;
        Ok(Self {
            config,
            session: SessionContext::new(Arc::new(store)),
            api,
        })
    }

    fn auth_gateway(&self) -> AuthGateway {
        AuthGateway::new(self.api.clone(), self.session.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Login { email, password } => {
            let app = App::load()?;
            let email = value_or_prompt(email, "Email")?;
            let password = secret_or_prompt(password, "Password")?;

            match app.auth_gateway().login(&email, &password).await {
                Ok(outcome) => {
                    println!("Signed in.");
                    println!("Next: {} (finsight dashboard)", outcome.next);
                }
                Err(e) => {
                    tracing::debug!(error = ?e, "login failed");
                    bail!("{}", e.user_message());
                }
            }
        }

        Command::Register { email, password } => {
            let app = App::load()?;
            let email = value_or_prompt(email, "Email")?;
            let password = secret_or_prompt(password, "Password")?;

            match app.auth_gateway().register(&email, &password).await {
                Ok(outcome) => {
                    println!("Registration successful! Please login.");
                    println!("Next: {} (finsight login)", outcome.next);
                }
                Err(e) => {
                    tracing::debug!(error = ?e, "registration failed");
                    bail!("{}", e.user_message());
                }
            }
        }

        Command::Logout => {
            let app = App::load()?;
            if app.session.logout()? {
                println!("Logged out.");
            } else {
                println!("Not signed in.");
            }
            println!("Next: {} (finsight login)", View::Login);
        }

        Command::Status => {
            let app = App::load()?;
            match SessionGuard::new(View::Dashboard).mount(&app.session)? {
                Guarded::Authenticated { .. } => println!("authenticated ({})", app.api.base_url()),
                Guarded::Redirect(to) => println!("unauthenticated (redirect: {to})"),
            }
        }

        Command::Upload { file, dashboard } => {
            let app = App::load()?;
            upload(&app, file, dashboard).await?;
        }

        Command::Dashboard { source } => {
            let app = App::load()?;
            let raw = source.unwrap_or_else(|| app.config.dashboard.source.clone());
            let kind = parse_source(&raw)?;
            show_dashboard(&app, kind).await?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = load_config()?;
                let api = cfg.api_config();
                println!("config:   {}", state::config_path()?.display());
                println!("session:  {}", state::session_path()?.display());
                println!("base_url: {}", api.base_url);
                match api.request_timeout {
                    Some(t) => println!("timeout:  {}s", t.as_secs()),
                    None => println!("timeout:  none"),
                }
                println!("dashboard source: {}", cfg.dashboard.source);
            }
        },
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn value_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt(label),
    }
}

fn secret_or_prompt(value: Option<String>, label: &str) -> Result<String> {
    match value {
        Some(v) => Ok(v),
        None => prompt_secret(label),
    }
}

async fn upload(app: &App, file: PathBuf, show_after: bool) -> Result<()> {
    if !file.is_file() {
        bail!("file not found: {}", file.display());
    }
    let selected = SelectedFile::from_path(&file).with_context(|| format!("read {}", file.display()))?;

    let controller = UploadController::new(app.api.clone(), app.session.clone());
    let ticket = controller.select_file(selected)?;
    println!("Uploading {} ... (Ctrl-C to cancel)", file.display());

    let wait = ticket.wait();
    tokio::pin!(wait);
    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            controller.cancel();
            wait.await
        }
    };
    controller.acknowledge();

    match &outcome {
        UploadOutcome::Succeeded(receipt) => {
            println!("{}", outcome.user_message());
            if let Some(r) = receipt {
                if let Some(count) = r.count {
                    println!("Processed {count} transactions");
                }
                if let Some(id) = &r.upload_id {
                    println!("Upload id: {id}");
                }
            }
        }
        UploadOutcome::Failed(failure) => {
            tracing::debug!(%failure, "upload did not succeed");
            bail!("{}", outcome.user_message());
        }
    }

    if show_after {
        println!();
        show_dashboard(app, SourceKind::Remote).await?;
    }
    Ok(())
}

async fn show_dashboard(app: &App, kind: SourceKind) -> Result<()> {
    if let Guarded::Redirect(to) = SessionGuard::new(View::Dashboard).mount(&app.session)? {
        bail!("not signed in (redirect: {to}). Run: finsight login");
    }

    let txns = match kind {
        SourceKind::Mock => None,
        SourceKind::Remote => Some(
            app.api
                .transactions(&app.session)
                .await
                .context("fetch transactions")?,
        ),
    };
    let dashboard = match &txns {
        Some(txns) => Dashboard::compose(DashboardSource::Transactions(txns)),
        None => Dashboard::compose(DashboardSource::Mock),
    };

    println!("# Intelligence Dashboard\n");
    for line in charts::render_summary(&dashboard.summary) {
        println!("{line}");
    }
    println!();
    for line in charts::render_flow_chart(&dashboard.flow, CHART_WIDTH, FLOW_CHART_HEIGHT) {
        println!("{line}");
    }
    println!();
    for line in charts::render_category_chart(&dashboard.categories, CHART_WIDTH) {
        println!("{line}");
    }
    Ok(())
}
