use std::error::Error;
use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use check_rabbitmq_queues::{
    check_queues, icinga, safe_run, BrokerClient, Config, Report, ServiceState,
};

const PLUGIN_NAME: &str = "check_rabbitmq_queues";
const DEFAULT_CONFIG: &str = "/usr/local/etc/check_rabbitmq_queues.yml";

/// Check RabbitMQ queue depths against configured thresholds.
#[derive(Parser)]
#[command(name = PLUGIN_NAME, version, about)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG)]
    config: PathBuf,
}

fn main() {
    init_tracing();

    if let Err(error) = icinga::print_command_config_if_requested(PLUGIN_NAME, &Cli::command()) {
        eprintln!("cannot generate icinga command config: {error}");
        std::process::exit(ServiceState::Unknown.exit_code());
    }

    let cli = Cli::parse();
    safe_run(ServiceState::Unknown, || do_check(&cli)).print_and_exit()
}

/// Errors surfacing here are configuration-level: they abort before any
/// network activity and the plugin exits UNKNOWN with a one-line message.
fn do_check(cli: &Cli) -> Result<Report, Box<dyn Error>> {
    let config = Config::load(&cli.config)?;
    let client = BrokerClient::new(&config)?;
    Ok(check_queues(&config, &client))
}

/// Diagnostics go to stderr and stay silent unless RUST_LOG asks for
/// them; stdout belongs to the status line.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
