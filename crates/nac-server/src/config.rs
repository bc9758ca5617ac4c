use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn parse_socket_addr(address: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    let ip: IpAddr = address
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid IP address: {}", address)))?;
    Ok(SocketAddr::new(ip, port))
}

/// RADIUS authorization listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_authorization_port")]
    pub port: u16,
    /// Shared secret for Access-Request/Accept/Reject
    pub secret: String,
}

impl AuthorizationConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_socket_addr(&self.listen_address, self.port)
    }
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        AuthorizationConfig {
            listen_address: default_listen_address(),
            port: default_authorization_port(),
            secret: default_secret(),
        }
    }
}

/// RADIUS accounting listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountingConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_accounting_port")]
    pub port: u16,
    /// Shared secret for accounting, also used to sign Disconnect-Requests
    pub secret: String,
}

impl AccountingConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_socket_addr(&self.listen_address, self.port)
    }
}

impl Default for AccountingConfig {
    fn default() -> Self {
        AccountingConfig {
            listen_address: default_listen_address(),
            port: default_accounting_port(),
            secret: default_secret(),
        }
    }
}

/// DNS redirect listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    #[serde(default = "default_dns_port")]
    pub port: u16,
    /// Address handed out for every A query (the captive portal)
    pub redirect_address: String,
}

impl DnsConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        parse_socket_addr(&self.listen_address, self.port)
    }

    pub fn redirect_ipv4(&self) -> Result<Ipv4Addr, ConfigError> {
        self.redirect_address.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "Redirect address must be IPv4: {}",
                self.redirect_address
            ))
        })
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        DnsConfig {
            listen_address: default_listen_address(),
            port: default_dns_port(),
            redirect_address: "10.0.0.1".to_string(),
        }
    }
}

/// Network group seed entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkGroupConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Pool used for unauthorized or expired devices
    #[serde(default)]
    pub registration: bool,
    #[serde(default)]
    pub guest: bool,
    #[serde(default)]
    pub is_pool: bool,
}

/// Network seed entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Address range in CIDR notation
    pub network_address: String,
    pub gateway_address: String,
    pub vlan: u16,
    /// Maximum number of devices assigned at once
    pub capacity: u32,
    /// Name of the owning network group
    pub group: String,
}

impl NetworkConfig {
    pub fn parse_network(&self) -> Result<IpNetwork, ConfigError> {
        self.network_address.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "Network {} has invalid address range: {}",
                self.name, self.network_address
            ))
        })
    }

    pub fn parse_gateway(&self) -> Result<IpAddr, ConfigError> {
        self.gateway_address.parse().map_err(|_| {
            ConfigError::Invalid(format!(
                "Network {} has invalid gateway: {}",
                self.name, self.gateway_address
            ))
        })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub radius_authorization: AuthorizationConfig,

    #[serde(default)]
    pub radius_accounting: AccountingConfig,

    #[serde(default)]
    pub dns: DnsConfig,

    /// NAS port for Disconnect-Request datagrams (default: 3799)
    #[serde(default = "default_disconnect_port")]
    pub disconnect_port: u16,

    /// Default time a daemon gets to wind down on stop (default: 60)
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,

    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,

    /// Network groups loaded into the directory at startup
    #[serde(default)]
    pub network_groups: Vec<NetworkGroupConfig>,

    /// Networks loaded into the directory at startup
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}

fn default_authorization_port() -> u16 {
    1812
}

fn default_accounting_port() -> u16 {
    1813
}

fn default_dns_port() -> u16 {
    53
}

fn default_disconnect_port() -> u16 {
    3799
}

fn default_stop_timeout_secs() -> u64 {
    60
}

fn default_secret() -> String {
    "testing123".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            radius_authorization: AuthorizationConfig::default(),
            radius_accounting: AccountingConfig::default(),
            dns: DnsConfig::default(),
            disconnect_port: default_disconnect_port(),
            stop_timeout_secs: default_stop_timeout_secs(),
            log_level: None,
            network_groups: vec![],
            networks: vec![],
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let listeners = [
            ("radius_authorization", self.radius_authorization.socket_addr()?),
            ("radius_accounting", self.radius_accounting.socket_addr()?),
            ("dns", self.dns.socket_addr()?),
        ];
        for (section, addr) in listeners {
            if addr.port() == 0 {
                return Err(ConfigError::Invalid(format!("{}: port cannot be 0", section)));
            }
        }

        if self.radius_authorization.secret.is_empty() {
            return Err(ConfigError::Invalid(
                "radius_authorization: secret cannot be empty".to_string(),
            ));
        }
        if self.radius_accounting.secret.is_empty() {
            return Err(ConfigError::Invalid(
                "radius_accounting: secret cannot be empty".to_string(),
            ));
        }

        self.dns.redirect_ipv4()?;

        if self.disconnect_port == 0 {
            return Err(ConfigError::Invalid("Disconnect port cannot be 0".to_string()));
        }

        let mut group_names = HashSet::new();
        for group in &self.network_groups {
            if group.name.is_empty() {
                return Err(ConfigError::Invalid("Network group has empty name".to_string()));
            }
            if !group_names.insert(group.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Duplicate network group: {}",
                    group.name
                )));
            }
        }

        for network in &self.networks {
            network.parse_network()?;
            network.parse_gateway()?;
            if !(1..=4094).contains(&network.vlan) {
                return Err(ConfigError::Invalid(format!(
                    "Network {} has VLAN {} outside 1-4094",
                    network.name, network.vlan
                )));
            }
            if network.capacity == 0 {
                return Err(ConfigError::Invalid(format!(
                    "Network {} has zero capacity",
                    network.name
                )));
            }
            if !group_names.contains(network.group.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Network {} references unknown group {}",
                    network.name, network.group
                )));
            }
        }

        Ok(())
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        Config {
            radius_authorization: AuthorizationConfig {
                listen_address: "0.0.0.0".to_string(),
                port: 1812,
                secret: "authorization_secret".to_string(),
            },
            radius_accounting: AccountingConfig {
                listen_address: "0.0.0.0".to_string(),
                port: 1813,
                secret: "accounting_secret".to_string(),
            },
            dns: DnsConfig {
                listen_address: "0.0.0.0".to_string(),
                port: 53,
                redirect_address: "10.10.0.1".to_string(),
            },
            disconnect_port: 3799,
            stop_timeout_secs: 60,
            log_level: Some("info".to_string()),
            network_groups: vec![
                NetworkGroupConfig {
                    name: "Registration Networks".to_string(),
                    description: Some("Unregistered and expired devices".to_string()),
                    registration: true,
                    guest: false,
                    is_pool: true,
                },
                NetworkGroupConfig {
                    name: "Student / Guest Network Pool".to_string(),
                    description: None,
                    registration: false,
                    guest: true,
                    is_pool: true,
                },
            ],
            networks: vec![
                NetworkConfig {
                    name: "Registration".to_string(),
                    description: None,
                    network_address: "10.10.0.0/22".to_string(),
                    gateway_address: "10.10.0.1".to_string(),
                    vlan: 100,
                    capacity: 1000,
                    group: "Registration Networks".to_string(),
                },
                NetworkConfig {
                    name: "Guest".to_string(),
                    description: None,
                    network_address: "10.20.0.0/22".to_string(),
                    gateway_address: "10.20.0.1".to_string(),
                    vlan: 200,
                    capacity: 1000,
                    group: "Student / Guest Network Pool".to_string(),
                },
            ],
        }
    }
}
