use anyhow::Context;
use app::Console;
use clap::Parser;
use iced::Theme;
use log::info;
use pathocore::client::RegistryClient;
use pathocore::config::ConsoleConfig;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;

mod app;
mod charts;
mod editor_view;
mod feed;
mod headless;
mod panels;

#[derive(Parser)]
#[command(author, version, about = "Operator console for live pathology pipelines")]
struct Args {
    /// Load console settings from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Registry base URL, e.g. http://127.0.0.1:8000/api
    #[arg(long)]
    base_url: Option<String>,
    /// Metrics polling period in milliseconds
    #[arg(long)]
    poll_ms: Option<u64>,
    /// Print metric summaries to stdout instead of opening a window
    #[arg(long, default_value_t = false)]
    headless: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConsoleConfig::load(path)?,
        None => ConsoleConfig::default(),
    };
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(poll_ms) = args.poll_ms {
        config.poll_interval_ms = poll_ms;
    }

    let client = RegistryClient::new(&config.base_url, config.request_timeout())
        .with_context(|| format!("configuring registry client for {}", config.base_url))?;
    info!("using registry at {}", client.base_url());

    if args.headless {
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for headless polling")?;
        return runtime.block_on(headless::run(client, config));
    }

    iced::application(
        move || Console::boot(client.clone(), config.clone()),
        Console::update,
        Console::view,
    )
    .title(Console::title)
    .subscription(Console::subscription)
    .theme(application_theme)
    .run()?;
    Ok(())
}

fn application_theme(_: &Console) -> Theme {
    Theme::Dark
}
