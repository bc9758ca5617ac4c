//! Network Access Control Server
//!
//! This crate runs the daemons of a VLAN-based network access control
//! appliance on top of the `radius-proto` and `dns-proto` codecs.
//!
//! # Features
//!
//! - RADIUS authorization: devices are identified by MAC address and
//!   assigned a VLAN, with registration networks for unknown devices
//! - RADIUS accounting: session details kept on each device
//! - Disconnect-Requests to force re-authorization
//! - DNS redirection to the captive portal
//! - Supervised daemons that can be stopped, started and restarted by name
//! - JSON configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use nac_server::{Config, MemoryDirectory, NotificationBus, Services};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.json")?;
//!     let directory = Arc::new(MemoryDirectory::from_config(&config)?);
//!
//!     let services = Services::build(&config, directory, NotificationBus::default())?;
//!     services.host.start_all();
//!
//!     tokio::signal::ctrl_c().await?;
//!     services.host.shutdown(config.stop_timeout()).await;
//!     Ok(())
//! }
//! ```

pub mod accounting;
pub mod authorization;
pub mod config;
pub mod daemon;
pub mod directory;
pub mod disconnect;
pub mod dns;
pub mod error;
pub mod notify;
pub mod services;
pub mod udp;

pub use accounting::{AccountingHandler, AccountingOutcome, SessionTracker};
pub use authorization::{AuthorizationEngine, AuthorizationHandler, Decision, RejectReason};
pub use config::{Config, ConfigError};
pub use daemon::{
    Daemon, DaemonContext, DaemonControl, DaemonError, DaemonHost, DaemonState, EntryPoint,
};
pub use directory::{DeviceDirectory, DirectoryError, MemoryDirectory};
pub use disconnect::{DisconnectError, DisconnectTarget, Disconnector};
pub use dns::DnsRedirectHandler;
pub use error::ServerError;
pub use notify::{Notification, NotificationBus};
pub use services::{ListenerAddresses, Services, SetupError};
pub use udp::{DatagramHandler, UdpDaemon};
