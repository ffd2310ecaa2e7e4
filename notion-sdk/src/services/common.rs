//! Common utilities for service clients

use std::fmt;

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: None,
        }
    }
}

impl UserAgent {
    /// User agent for a specific service client
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            extra: Some(service.into()),
            ..Self::default()
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_display() {
        let ua = UserAgent {
            app_name: "notion-sdk".to_string(),
            version: "1.2.3".to_string(),
            extra: Some("notion".to_string()),
        };
        assert_eq!(ua.to_string(), "notion-sdk/1.2.3 (notion)");

        let plain = UserAgent {
            extra: None,
            ..ua
        };
        assert_eq!(plain.to_string(), "notion-sdk/1.2.3");
    }
}
