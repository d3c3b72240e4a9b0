mod nmt_config;
mod nmt_controllers;
mod nmt_models;
mod nmt_search;
mod nmt_tickets;
mod nmt_views;

use anyhow::Context;
use nmt_config::{AppConfig, Command};
use nmt_controllers::NMTControllers;
use nmt_models::MetroNetwork;
use nmt_views::NMTViews;

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Set up panic hook for better error messages
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("\n{}", "═".repeat(70));
        eprintln!("❌ APPLICATION PANIC");
        eprintln!("{}", "═".repeat(70));
        eprintln!("\nThe application encountered an unexpected error:");
        eprintln!("{}", panic_info);
        eprintln!("\n💡 Troubleshooting:");
        eprintln!("  • Please restart the application");
        eprintln!("  • Check that the station data file is intact");
        eprintln!("\n{}", "═".repeat(70));
    }));

    ctrlc::set_handler(|| {
        eprintln!("\nKeyboard interruption detected");
        NMTViews::goodbye_message();
        std::process::exit(130);
    })
    .context("Failed to install Ctrl-C handler")?;

    let network = MetroNetwork::load(&config.data).with_context(|| {
        format!("Failed to load metro data from {}", config.data.display())
    })?;

    if network.is_empty() {
        anyhow::bail!("Metro data in {} holds no lines", config.data.display());
    }

    match &config.command {
        None => NMTControllers::run(&network, &config),
        Some(Command::Route { from, to }) => NMTControllers::run_route(&network, &config, from, to)?,
        Some(Command::Lines) => NMTViews::show_lines(&network),
    }

    Ok(())
}
