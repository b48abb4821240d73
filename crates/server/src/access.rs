//! Client IP resolution and the submission allow-list.
use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Which client IPs may submit forms.
///
/// Entries match exactly, except entries ending in `.`, which match every
/// address starting with them (`"192.168.10."`). An empty list allows
/// everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpAllowList {
    entries: Vec<String>,
}

impl IpAllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| entry.as_ref().trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_allowed(&self, ip: &str) -> bool {
        if self.is_open() {
            return true;
        }
        let ip = normalize_ip(ip);
        self.entries.iter().any(|allowed| {
            ip == allowed || (allowed.ends_with('.') && ip.starts_with(allowed.as_str()))
        })
    }
}

/// Strips the IPv4-mapped IPv6 prefix so `::ffff:10.0.0.1` reads as `10.0.0.1`.
pub fn normalize_ip(ip: &str) -> &str {
    let ip = ip.trim();
    ip.strip_prefix("::ffff:").unwrap_or(ip)
}

/// The submitting client's address.
///
/// Priority:
/// 1. First `X-Forwarded-For` entry (requests through proxies)
/// 2. `X-Real-IP` (Nginx)
/// 3. The socket peer address
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .map(|ip| normalize_ip(ip).to_string())
        .or_else(|| peer.map(|addr| normalize_ip(&addr.ip().to_string()).to_string()))
}
