use chrono::Local;
use std::fmt;

/// Facts about the host the client runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInfo {
    pub os: String,
    pub family: String,
    pub arch: String,
    pub hostname: Option<String>,
    pub client_version: String,
    /// RFC 3339 local time of collection
    pub timestamp: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        let hostname = ["HOSTNAME", "COMPUTERNAME"]
            .iter()
            .find_map(|var| std::env::var(var).ok())
            .filter(|name| !name.is_empty());

        Self {
            os: std::env::consts::OS.to_string(),
            family: std::env::consts::FAMILY.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            hostname,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Local::now().to_rfc3339(),
        }
    }

    /// Message body sent to the server
    pub fn to_message(&self) -> String {
        format!("System Info: {self}")
    }
}

impl fmt::Display for SystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{os: {}, family: {}, arch: {}, hostname: {}, client_version: {}, timestamp: {}}}",
            self.os,
            self.family,
            self.arch,
            self.hostname.as_deref().unwrap_or("unknown"),
            self.client_version,
            self.timestamp,
        )
    }
}
