//! Mistakebook CLI - Command-line client for the mistake book backend.

use clap::Parser;
use mistakebook_cli::commands;
use mistakebook_cli::{Cli, Command, Config, Formatter};
use mistakebook_domain::PathChangeNotice;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("MISTAKEBOOK_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn run() -> mistakebook_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path).unwrap_or_else(|e| {
        warn!(path = %config_path.display(), error = %e, "ignoring unreadable config");
        Config::default()
    });

    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let notice = PathChangeNotice::for_location(&cli.command.pathname(), "");
    debug!(notice = %serde_json::to_string(&notice)?, "navigated");

    let api_url = cli.api_url.as_deref();
    match cli.command {
        Command::Profile(args) => {
            commands::execute_profile(args, &mut config, &formatter).await?;
        }
        Command::Analyze(args) => {
            commands::execute_analyze(args, &formatter).await?;
        }
        Command::Practice(args) => {
            commands::execute_practice(args, &formatter).await?;
        }
        Command::Upload(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_upload(args, &client, &formatter).await?;
        }
        Command::Detail(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_detail(args, &client, &formatter).await?;
        }
        Command::List(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_list(
                args,
                &client,
                &formatter,
                config.default_subject(),
                config.settings.page_size,
            )
            .await?;
        }
        Command::WeakPoints(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_weak_points(args, &client, &formatter, config.default_subject())
                .await?;
        }
        Command::ErrorType(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_error_type(args, &client, &formatter).await?;
        }
        Command::Delete(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_delete(args, &client, &formatter).await?;
        }
        Command::Export(args) => {
            let client = commands::connect(&config, api_url)?;
            commands::execute_export(args, &client, &formatter).await?;
        }
    }

    Ok(())
}
