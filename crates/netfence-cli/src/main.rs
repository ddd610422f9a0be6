use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::GlobalOptions;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "netfence",
    version,
    about = "Cut programs off the network with Windows Firewall rules"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use this declared-items file instead of the configured one
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Init {
        #[arg(long)]
        path: Option<PathBuf>,
        #[arg(long)]
        force: bool,
    },
    /// Block all inbound and outbound traffic for an executable or every executable in a folder
    Block {
        #[arg(long)]
        folder: bool,
        path: String,
    },
    /// Remove the rules for a blocked item, by path or by its position in `list`
    Unblock {
        #[arg(long, short)]
        yes: bool,
        selection: String,
    },
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show firewall rules created by this tool (diagnostic only)
    Rules {
        #[arg(long)]
        all: bool,
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration and the state file location
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = GlobalOptions {
        config_path: cli.config,
        state_path: cli.state,
    };

    match cli.command {
        Commands::Init { path, force } => init_config(&options, path, force),
        Commands::Block { folder, path } => commands::block::execute(&options, &path, folder),
        Commands::Unblock { yes, selection } => {
            commands::unblock::execute(&options, &selection, yes)
        }
        Commands::List { json } => commands::list::execute(&options, json),
        Commands::Rules { all, json } => commands::rules::execute(&options, all, json),
        Commands::Config => commands::config::print_effective(&options),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn init_config(options: &GlobalOptions, path: Option<PathBuf>, force: bool) -> Result<()> {
    let paths = netfence_core::config::ConfigPaths::resolve()?;
    let config_path = path
        .or_else(|| options.config_path.clone())
        .unwrap_or(paths.config_path);
    if config_path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    let config = netfence_core::config::Config::default_config();
    config.save(&config_path)?;
    println!("Config written to {}", config_path.display());
    if let Some(note) = elevation_note(&config) {
        println!("{note}");
    }
    Ok(())
}

fn elevation_note(config: &netfence_core::config::Config) -> Option<&'static str> {
    if config.firewall.elevate_with.is_some() {
        return None;
    }
    Some(
        "Note: firewall changes need administrator rights. Run netfence from an elevated shell, \
         or set [firewall] elevate_with (for example \"gsudo\") in the config.",
    )
}
