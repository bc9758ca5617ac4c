use clap::Parser;
use nac_server::{Config, DaemonControl, MemoryDirectory, NotificationBus, Services};
use std::process;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Network access control server: RADIUS VLAN assignment and captive-portal DNS
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "nac-server")]
struct Cli {
    /// Path to configuration file
    #[arg(value_name = "CONFIG", default_value = "config.json")]
    config_path: String,

    /// Validate configuration and exit (doesn't start the daemons)
    #[arg(short, long)]
    validate: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load or create configuration (without logging first)
    let config = match Config::from_file(&cli.config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing_subscriber::registry()
                .with(EnvFilter::new("info"))
                .with(tracing_subscriber::fmt::layer())
                .init();

            if cli.validate {
                eprintln!("Configuration validation failed!");
                eprintln!("   Error: {}", e);
                process::exit(1);
            }

            if std::path::Path::new(&cli.config_path).exists() {
                error!("Could not load config file {}: {}", cli.config_path, e);
                process::exit(1);
            }

            warn!("Could not load config file from: {}", cli.config_path);
            info!("Creating example configuration at: {}", cli.config_path);

            if let Err(e) = Config::example().to_file(&cli.config_path) {
                error!("Error creating example config: {}", e);
                process::exit(1);
            }

            info!("Please edit {} and restart the server", cli.config_path);
            process::exit(0);
        }
    };

    if cli.validate {
        println!("Configuration validated successfully!");
        println!();
        println!("Configuration summary:");
        println!(
            "  Authorization: {}:{}",
            config.radius_authorization.listen_address, config.radius_authorization.port
        );
        println!(
            "  Accounting: {}:{}",
            config.radius_accounting.listen_address, config.radius_accounting.port
        );
        println!(
            "  DNS: {}:{} -> {}",
            config.dns.listen_address, config.dns.port, config.dns.redirect_address
        );
        println!("  Disconnect port: {}", config.disconnect_port);
        println!("  Network groups: {}", config.network_groups.len());
        println!("  Networks: {}", config.networks.len());
        println!("  Log level: {}", config.log_level());
        process::exit(0);
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level())))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("NAC server v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config_path);

    let directory = match MemoryDirectory::from_config(&config) {
        Ok(directory) => Arc::new(directory),
        Err(e) => {
            error!("Invalid network configuration: {}", e);
            process::exit(1);
        }
    };

    let services = match Services::build(&config, directory, NotificationBus::default()) {
        Ok(services) => services,
        Err(e) => {
            error!("Failed to set up daemons: {}", e);
            process::exit(1);
        }
    };

    services.host.start_all();
    info!(daemons = ?services.host.names(), "Daemons started");
    info!("Press Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }

    info!("Shutting down");
    if !services.host.shutdown(config.stop_timeout()).await {
        warn!("Some daemons did not stop within {}s", config.stop_timeout_secs);
        process::exit(1);
    }
}
