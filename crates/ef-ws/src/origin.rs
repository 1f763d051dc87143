//! Origin check for upgrade requests

use ef_core::WsConfig;

/// Which browser origins may open the feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept every origin
    #[default]
    AllowAny,
    /// Accept only the listed origins
    AllowList(Vec<String>),
}

impl OriginPolicy {
    pub fn from_config(config: &WsConfig) -> Self {
        match &config.allowed_origins {
            Some(origins) => Self::AllowList(origins.iter().map(|o| normalize(o)).collect()),
            None => Self::AllowAny,
        }
    }

    /// Check the request's `Origin` header value.
    ///
    /// Requests without an origin (non-browser clients) are always allowed.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (Self::AllowAny, _) | (_, None) => true,
            (Self::AllowList(allowed), Some(origin)) => {
                let origin = normalize(origin);
                allowed.iter().any(|a| *a == origin)
            }
        }
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}
