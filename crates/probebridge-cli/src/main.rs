//! CLI entry point - the composition root.
//!
//! This is the ONLY place where infrastructure is wired together via
//! bootstrap. Command dispatch routes to handlers.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use probebridge_cli::handlers::run::RunArgs;
use probebridge_cli::{Cli, CliConfig, CliError, Commands, bootstrap, handlers};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = if cli.verbose {
        EnvFilter::new(default_level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err:#}");
        let code = err.downcast_ref::<CliError>().map_or(1, CliError::exit_code);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        // No command provided - show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    // Bootstrap the CLI context (composition root)
    let config = CliConfig::resolve(cli.workspace, cli.settings_file, cli.verbose)?;
    let ctx = bootstrap(config)?;

    match command {
        Commands::Run {
            executable,
            transport,
            port,
            extra_args,
        } => {
            let args = RunArgs {
                executable,
                transport,
                port,
                extra_args,
            };
            handlers::run::execute(&ctx, args).await?;
        }
        Commands::Config { port } => {
            handlers::config::execute(&ctx, port).await?;
        }
        Commands::Port => {
            handlers::port::execute()?;
        }
        Commands::Settings { command } => {
            handlers::settings::execute(&ctx, command).await?;
        }
    }

    Ok(())
}
