//! Gateway Console - desktop admin console for an LLM proxy gateway.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use gateway_console as app;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use url::Url;

use app::client::ProxyClient;
use app::config::{AppConfig, ConfigLoadResult};
use app::session::cookie::resolve_cookie_header;
use app::state::ConsoleState;
use app::ui::{ConsoleApp, SetupApp, SetupWizard};

/// Desktop admin console for an LLM proxy gateway.
#[derive(Parser)]
#[command(name = "gateway-console", version)]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Config file path
    #[arg(long, conflicts_with = "dev")]
    config: Option<PathBuf>,

    /// Console location, e.g. "http://localhost:4000/ui/?userID=u-1&page=teams"
    #[arg(long)]
    url: Option<String>,

    /// Document cookie string, e.g. "token=eyJ..."
    #[arg(long)]
    cookie: Option<String>,

    /// File holding the document cookie string
    #[arg(long, conflicts_with = "cookie")]
    cookie_file: Option<PathBuf>,

    /// Write daily-rotated log files here instead of stderr
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Print the decoded session and current page as JSON, then exit
    #[arg(long)]
    whoami: bool,
}

/// Application launch mode.
enum LaunchMode {
    /// Normal operation with valid config.
    Normal(AppConfig),
    /// Setup wizard for first run or invalid config.
    Setup(SetupWizard, Option<String>),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_dir.as_deref());

    tracing::info!("Gateway Console starting...");

    let config_path = if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
        PathBuf::from("config.toml")
    } else {
        cli.config.clone().unwrap_or_else(AppConfig::default_path)
    };
    tracing::info!("Config path: {:?}", config_path);

    let launch_mode = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            LaunchMode::Normal(config)
        }
        ConfigLoadResult::Missing if cli.whoami => {
            tracing::info!("Config missing, using defaults");
            LaunchMode::Normal(AppConfig::default())
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, starting setup wizard");
            LaunchMode::Setup(SetupWizard::new(), None)
        }
        ConfigLoadResult::Invalid(e) if cli.whoami => {
            return Err(app::AppError::from(e)).context("cannot summarize without a valid config");
        }
        ConfigLoadResult::Invalid(e) => {
            tracing::warn!("Config invalid: {}", e);
            let wizard = AppConfig::read_unvalidated(&config_path)
                .map(SetupWizard::from_config)
                .unwrap_or_default();
            LaunchMode::Setup(wizard, Some(e.to_string()))
        }
    };

    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;

    match launch_mode {
        LaunchMode::Normal(config) if cli.whoami => run_whoami(&cli, config, rt),
        LaunchMode::Normal(config) => run_console(&cli, config, rt),
        LaunchMode::Setup(wizard, error) => run_setup_wizard(wizard, error, config_path, rt),
    }
}

/// Log to stderr, or to a daily file under `log_dir`.
fn init_logging(log_dir: Option<&std::path::Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "gateway-console.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

/// Where the console starts: `--url`, else the proxy's `/ui/` page.
fn console_location(cli: &Cli, config: &AppConfig) -> anyhow::Result<Url> {
    let location = cli.url.clone().unwrap_or_else(|| config.proxy.ui_url());
    Url::parse(&location).with_context(|| format!("invalid console URL: {location}"))
}

fn cookie_header(cli: &Cli, config: &AppConfig) -> anyhow::Result<Option<String>> {
    resolve_cookie_header(&config.session, cli.cookie.as_deref(), cli.cookie_file.as_deref())
        .context("failed to read session cookie")
}

/// Print the session summary as JSON.
fn run_whoami(cli: &Cli, config: AppConfig, rt: tokio::runtime::Runtime) -> anyhow::Result<()> {
    let location = console_location(cli, &config)?;
    let cookie = cookie_header(cli, &config)?;
    let client = Arc::new(ProxyClient::new(
        &config.proxy.base_url,
        Duration::from_secs(config.proxy.timeout_secs),
    )?);

    let proxy_settings = app::models::ProxySettings {
        base_url: config.proxy.base_url.clone(),
        logout_url: config.proxy.logout_url.clone(),
    };
    let mut state = ConsoleState::new(location, proxy_settings, config.proxy.auth_header_name.clone());
    state.bootstrap(cookie.as_deref(), &config.session.cookie_name);

    let summary = rt.block_on(app::headless::summarize(client, &mut state));
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Run the setup wizard.
fn run_setup_wizard(
    wizard: SetupWizard,
    initial_error: Option<String>,
    config_path: PathBuf,
    rt: tokio::runtime::Runtime,
) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Gateway Console - Setup")
            .with_inner_size([600.0, 500.0])
            .with_min_inner_size([500.0, 400.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "Gateway Console - Setup",
        options,
        Box::new(|_cc| Ok(Box::new(SetupApp::new(wizard, initial_error, config_path, rt)))),
    )
    .map_err(|e| anyhow::anyhow!("setup window failed: {e}"))
}

/// Run the main console.
fn run_console(cli: &Cli, config: AppConfig, rt: tokio::runtime::Runtime) -> anyhow::Result<()> {
    let location = console_location(cli, &config)?;
    let cookie = cookie_header(cli, &config)?;
    let console = ConsoleApp::new(config, rt, location, cookie)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Gateway Console")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Gateway Console",
        options,
        Box::new(|cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(console))
        }),
    )
    .map_err(|e| anyhow::anyhow!("console window failed: {e}"))
}
