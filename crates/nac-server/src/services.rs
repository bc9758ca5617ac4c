//! Wiring of the listeners into a daemon host

use crate::accounting::{AccountingHandler, SessionTracker};
use crate::authorization::{AuthorizationEngine, AuthorizationHandler};
use crate::config::{Config, ConfigError};
use crate::daemon::{DaemonError, DaemonHost};
use crate::directory::DeviceDirectory;
use crate::disconnect::Disconnector;
use crate::dns::DnsRedirectHandler;
use crate::notify::NotificationBus;
use crate::udp::UdpDaemon;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

pub const AUTHORIZATION_DAEMON: &str = "radius-authorization";
pub const ACCOUNTING_DAEMON: &str = "radius-accounting";
pub const DNS_DAEMON: &str = "dns-redirect";

#[derive(Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Daemon(#[from] DaemonError),
}

/// Bound addresses of the three listeners, `None` while stopped
#[derive(Debug, Clone)]
pub struct ListenerAddresses {
    pub authorization: watch::Receiver<Option<SocketAddr>>,
    pub accounting: watch::Receiver<Option<SocketAddr>>,
    pub dns: watch::Receiver<Option<SocketAddr>>,
}

/// Everything the process runs, ready to be started
pub struct Services {
    pub host: DaemonHost,
    pub directory: Arc<dyn DeviceDirectory>,
    pub notifications: NotificationBus,
    pub disconnector: Arc<Disconnector>,
    pub addresses: ListenerAddresses,
}

impl Services {
    /// Register the authorization, accounting and DNS daemons.
    ///
    /// Must be called inside a Tokio runtime. Nothing is started; call
    /// `host.start_all()`.
    pub fn build(
        config: &Config,
        directory: Arc<dyn DeviceDirectory>,
        notifications: NotificationBus,
    ) -> Result<Self, SetupError> {
        let authorization = UdpDaemon::new(
            config.radius_authorization.socket_addr()?,
            AuthorizationHandler::new(
                AuthorizationEngine::new(directory.clone(), notifications.clone()),
                config.radius_authorization.secret.clone(),
            ),
        );
        let accounting = UdpDaemon::new(
            config.radius_accounting.socket_addr()?,
            AccountingHandler::new(
                SessionTracker::new(directory.clone(), notifications.clone()),
                config.radius_accounting.secret.clone(),
            ),
        );
        let dns = UdpDaemon::new(
            config.dns.socket_addr()?,
            DnsRedirectHandler::new(config.dns.redirect_ipv4()?),
        );

        let addresses = ListenerAddresses {
            authorization: authorization.local_addr(),
            accounting: accounting.local_addr(),
            dns: dns.local_addr(),
        };

        let mut host = DaemonHost::new();
        host.register(AUTHORIZATION_DAEMON, authorization)?;
        host.register(ACCOUNTING_DAEMON, accounting)?;
        host.register(DNS_DAEMON, dns)?;

        let disconnector = Disconnector::new(
            config.radius_accounting.secret.clone(),
            directory.clone(),
            notifications.clone(),
        )
        .with_nas_port(config.disconnect_port);

        Ok(Self {
            host,
            directory,
            notifications,
            disconnector: Arc::new(disconnector),
            addresses,
        })
    }
}
