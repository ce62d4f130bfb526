//! TOML configuration for the yocache daemon.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use yocache::{Codec, GzipCodec, RawCodec};

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// This node's addresses and data directory.
    pub node: NodeSection,
    /// Cluster membership.
    pub cluster: ClusterSection,
    /// Peer HTTP protocol settings.
    pub http: HttpSection,
    /// Cache groups served by this node.
    #[serde(rename = "group")]
    pub groups: Vec<GroupSection>,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Address the peer endpoint listens on.
    pub listen_addr: String,
    /// Base URL other nodes reach this one at. Derived from
    /// `listen_addr` if omitted.
    pub self_url: Option<String>,
    /// Directory the file loader reads values from, one subdirectory
    /// per group.
    pub data_dir: PathBuf,
}

impl Default for NodeSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".yocache"))
            .unwrap_or_else(|| PathBuf::from(".yocache"));
        Self {
            listen_addr: "0.0.0.0:4890".to_string(),
            self_url: None,
            data_dir,
        }
    }
}

/// `[cluster]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    /// Base URLs of every node in the cluster, this node included.
    pub peers: Vec<String>,
}

/// `[http]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpSection {
    /// URL prefix the peer endpoint serves under.
    pub base_path: String,
    /// Virtual points per peer on the consistent-hash ring.
    pub replicas: usize,
    /// Wire encoding for peer bodies: `"raw"` or `"gzip"`. Must match on
    /// every node.
    pub codec: String,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            base_path: yocache_http::DEFAULT_BASE_PATH.to_string(),
            replicas: 50,
            codec: "raw".to_string(),
        }
    }
}

/// One `[[group]]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GroupSection {
    /// Group name, unique per node and identical across the cluster.
    pub name: String,
    /// Local LRU byte budget. Supports suffixes like `"64MB"`.
    pub max_bytes: Option<String>,
    /// Entry lifetime, e.g. `"30s"`, `"10m"`. Absent = never expire.
    pub ttl: Option<String>,
    /// Fall back to the local loader when a peer fetch fails.
    pub peer_fallback: bool,
}

impl Default for GroupSection {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            max_bytes: None,
            ttl: None,
            peer_fallback: false,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Default group byte budget: 64 MB.
const DEFAULT_GROUP_BYTES: u64 = 64 * 1024 * 1024;

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective advertised URL: the configured one, or one derived from
    /// the listen address (with `0.0.0.0` rewritten to a loopback).
    pub fn self_url(&self) -> String {
        if let Some(url) = &self.node.self_url {
            return url.trim_end_matches('/').to_string();
        }
        let port = self
            .node
            .listen_addr
            .rsplit(':')
            .next()
            .unwrap_or("4890");
        format!("http://127.0.0.1:{port}")
    }

    /// Effective group sections: the configured ones, or a single
    /// `"default"` group.
    pub fn effective_groups(&self) -> Vec<GroupSection> {
        if self.groups.is_empty() {
            vec![GroupSection::default()]
        } else {
            self.groups
                .iter()
                .map(|g| GroupSection {
                    name: g.name.clone(),
                    max_bytes: g.max_bytes.clone(),
                    ttl: g.ttl.clone(),
                    peer_fallback: g.peer_fallback,
                })
                .collect()
        }
    }

    /// The configured wire codec.
    pub fn codec(&self) -> anyhow::Result<Arc<dyn Codec>> {
        match self.http.codec.as_str() {
            "raw" => Ok(Arc::new(RawCodec)),
            "gzip" => Ok(Arc::new(GzipCodec)),
            other => anyhow::bail!("unknown codec {other:?} (expected \"raw\" or \"gzip\")"),
        }
    }
}

impl GroupSection {
    /// Effective byte budget (config value or 64 MB).
    pub fn cache_bytes(&self) -> anyhow::Result<u64> {
        match &self.max_bytes {
            Some(s) => parse_size(s),
            None => Ok(DEFAULT_GROUP_BYTES),
        }
    }

    /// Effective TTL; `None` = entries never expire.
    pub fn ttl(&self) -> anyhow::Result<Option<Duration>> {
        self.ttl.as_deref().map(parse_duration).transpose()
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports `"64MB"`, `"1GB"`, `"512KB"`, and raw byte counts.
fn parse_size(s: &str) -> anyhow::Result<u64> {
    let s = s.trim();
    let (number, multiplier) = if let Some(num) = s.strip_suffix("GB") {
        (num, 1_073_741_824)
    } else if let Some(num) = s.strip_suffix("MB") {
        (num, 1_048_576)
    } else if let Some(num) = s.strip_suffix("KB") {
        (num, 1_024)
    } else {
        (s, 1)
    };

    let number: u64 = number
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid size {s:?}"))?;
    Ok(number * multiplier)
}

/// Parse a human-readable duration string.
///
/// Supports `"250ms"`, `"30s"`, `"10m"`, `"2h"`.
fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let s = s.trim();
    let (number, unit): (&str, fn(u64) -> Duration) = if let Some(num) = s.strip_suffix("ms") {
        (num, Duration::from_millis)
    } else if let Some(num) = s.strip_suffix('s') {
        (num, Duration::from_secs)
    } else if let Some(num) = s.strip_suffix('m') {
        (num, |n| Duration::from_secs(n * 60))
    } else if let Some(num) = s.strip_suffix('h') {
        (num, |n| Duration::from_secs(n * 3600))
    } else {
        anyhow::bail!("invalid duration {s:?} (expected a ms/s/m/h suffix)");
    };

    let number: u64 = number
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid duration {s:?}"))?;
    Ok(unit(number))
}
