use anyhow::Context;
use clap::Parser;
use gui_bridge::model::{self, RegistryModel};
use log::info;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::watch;
use workflow::config::SimConfig;
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Stand-in pipeline registry for the PathoAssist console")]
struct Args {
    /// Load a simulator config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Address to serve the registry API on
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Seed for synthetic metrics and test patterns
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let state = model::shared(RegistryModel::new(&config.pipeline));
    info!(
        "starting with pipeline {} at {} fps ({}x{})",
        model::read(&state).active().name,
        config.fps,
        config.width,
        config.height
    );

    let runtime = TokioBuilder::new_multi_thread()
        .enable_all()
        .build()
        .context("creating runtime for the registry")?;
    runtime.block_on(async move {
        let (frames_tx, frames_rx) = watch::channel(None);
        tokio::spawn(Runner::new(config.clone(), state.clone()).run(frames_tx));
        tokio::spawn(gui_bridge::bridge::serve(config.bind, state, frames_rx));
        signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
        info!("shutting down");
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
