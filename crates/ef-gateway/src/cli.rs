//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

use ef_core::GatewayConfig;

/// WebSocket event feed with static JSON endpoints, served over TLS
#[derive(Debug, Parser)]
#[command(name = "ef-gateway", version)]
pub struct Args {
    /// https service address (host:port)
    #[arg(long, value_name = "HOST:PORT")]
    pub addr: Option<String>,

    /// Configuration file (TOML); defaults to ./ef-gateway.toml when present
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Load configuration and apply the command-line overrides
    pub fn load_config(&self) -> ef_core::Result<GatewayConfig> {
        let mut config = GatewayConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    /// Flags win over file and environment settings
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(addr) = &self.addr {
            config.server.bind_addr = addr.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags() {
        let args = Args::try_parse_from(["ef-gateway"]).unwrap();
        assert!(args.addr.is_none());
        assert!(args.config.is_none());

        let mut config = GatewayConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.bind_addr, "localhost:443");
    }

    #[test]
    fn test_addr_overrides_config() {
        let args = Args::try_parse_from(["ef-gateway", "--addr", "0.0.0.0:8443"]).unwrap();

        let mut config = GatewayConfig::default();
        config.server.bind_addr = "127.0.0.1:9000".to_string();
        args.apply(&mut config);
        assert_eq!(config.server.bind_addr, "0.0.0.0:8443");
    }

    #[test]
    fn test_config_path() {
        let args = Args::try_parse_from(["ef-gateway", "-c", "conf/gw.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("conf/gw.toml")));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gw.toml");
        std::fs::write(&path, "[tls]\ncert_path = \"x/cert.pem\"\n").unwrap();

        let args = Args::try_parse_from([
            "ef-gateway",
            "--config",
            path.to_str().unwrap(),
            "--addr",
            "127.0.0.1:8443",
        ])
        .unwrap();

        let config = args.load_config().unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8443");
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(Args::try_parse_from(["ef-gateway", "--port", "1"]).is_err());
    }
}
