//! 命令行配置

use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "kv-server", version, about = "In-memory key-value server speaking RESP")]
pub struct Config {
    /// Port to listen on.
    #[arg(long, default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to.
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Require clients to AUTH with this password before other commands.
    #[arg(long)]
    pub password: Option<String>,

    /// Close a connection after this many idle seconds.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub idle_timeout: u64,

    /// Period of the active expiration sweep, in milliseconds.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u64).range(1..))]
    pub expire_interval_ms: u64,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }

    pub fn expire_interval(&self) -> Duration {
        Duration::from_millis(self.expire_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: crate::DEFAULT_PORT,
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            password: None,
            idle_timeout: 60,
            expire_interval_ms: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_parser() {
        let parsed = Config::try_parse_from(["kv-server"]).unwrap();
        let default = Config::default();
        assert_eq!(parsed.listen_addr(), default.listen_addr());
        assert_eq!(parsed.password, None);
        assert_eq!(parsed.idle_timeout(), Duration::from_secs(60));
        assert_eq!(parsed.expire_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_flags() {
        let config = Config::try_parse_from([
            "kv-server",
            "--port",
            "7000",
            "--password",
            "secret",
            "--idle-timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(config.listen_addr().port(), 7000);
        assert_eq!(config.password.as_deref(), Some("secret"));
        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_flags() {
        assert!(Config::try_parse_from(["kv-server", "--port", "abc"]).is_err());
        assert!(Config::try_parse_from(["kv-server", "--idle-timeout", "0"]).is_err());
        assert!(Config::try_parse_from(["kv-server", "--unknown", "x"]).is_err());
    }
}
