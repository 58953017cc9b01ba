use std::{
    io,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs},
};

use clap::ValueEnum;
use thiserror::Error;
use tracing::debug;

/// Address family filter applied to resolved candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Family {
    #[default]
    Any,
    V4,
    V6,
}

impl Family {
    pub fn admits(self, addr: &SocketAddr) -> bool {
        match self {
            Family::Any => true,
            Family::V4 => addr.is_ipv4(),
            Family::V6 => addr.is_ipv6(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SockType {
    #[default]
    Stream,
    Datagram,
}

/// Lookup hints, mirroring what a caller tells the system resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Hints {
    pub family: Family,
    pub socktype: SockType,
    /// Resolve addresses suitable for binding rather than connecting.
    pub passive: bool,
}

impl Hints {
    pub fn stream() -> Self {
        Self {
            socktype: SockType::Stream,
            ..Self::default()
        }
    }

    pub fn datagram() -> Self {
        Self {
            socktype: SockType::Datagram,
            ..Self::default()
        }
    }

    pub fn family(mut self, family: Family) -> Self {
        self.family = family;
        self
    }

    pub fn passive(mut self) -> Self {
        self.passive = true;
        self
    }
}

/// One candidate transport endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub addr: SocketAddr,
    pub socktype: SockType,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("service '{0}' is not a numeric port")]
    Service(String),
    #[error("failed to look up '{host}'")]
    Lookup {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("no {family:?} candidates for {host}:{port}")]
    NoCandidates {
        host: String,
        port: u16,
        family: Family,
    },
    #[error("resolver task failed: {0}")]
    Task(String),
}

/// Resolves `host` and `service` into an ordered, de-duplicated candidate list.
///
/// With no host, passive lookups yield the wildcard addresses (IPv6 first) and
/// active lookups yield loopback. Callers walk the list and use the first
/// candidate that works.
pub fn resolve(
    host: Option<&str>,
    service: &str,
    hints: Hints,
) -> Result<Vec<Endpoint>, ResolveError> {
    let port: u16 = service
        .trim()
        .parse()
        .map_err(|_| ResolveError::Service(service.to_string()))?;

    let addrs: Vec<SocketAddr> = match host {
        None if hints.passive => vec![
            SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
        ],
        None => vec![
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), port),
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port),
        ],
        Some(host) => match host.parse::<IpAddr>() {
            Ok(ip) => vec![SocketAddr::new(ip, port)],
            Err(_) => (host, port)
                .to_socket_addrs()
                .map_err(|source| ResolveError::Lookup {
                    host: host.to_string(),
                    source,
                })?
                .collect(),
        },
    };

    let mut endpoints: Vec<Endpoint> = Vec::with_capacity(addrs.len());
    for addr in addrs.into_iter().filter(|addr| hints.family.admits(addr)) {
        if endpoints.iter().all(|known| known.addr != addr) {
            endpoints.push(Endpoint {
                addr,
                socktype: hints.socktype,
            });
        }
    }

    if endpoints.is_empty() {
        return Err(ResolveError::NoCandidates {
            host: host.unwrap_or("*").to_string(),
            port,
            family: hints.family,
        });
    }

    debug!(host = host.unwrap_or("*"), port, count = endpoints.len(), "resolved candidates");
    Ok(endpoints)
}

/// Runs [`resolve`] on the blocking pool so async callers never stall a worker.
pub async fn resolve_async(
    host: Option<String>,
    service: String,
    hints: Hints,
) -> Result<Vec<Endpoint>, ResolveError> {
    tokio::task::spawn_blocking(move || resolve(host.as_deref(), &service, hints))
        .await
        .map_err(|err| ResolveError::Task(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passive_wildcard_lists_ipv6_then_ipv4() {
        let endpoints = resolve(None, "9034", Hints::stream().passive()).expect("resolve");
        let addrs: Vec<_> = endpoints.iter().map(|e| e.addr).collect();
        assert_eq!(
            addrs,
            vec![
                "[::]:9034".parse::<SocketAddr>().unwrap(),
                "0.0.0.0:9034".parse::<SocketAddr>().unwrap(),
            ]
        );
        assert!(endpoints.iter().all(|e| e.socktype == SockType::Stream));
    }

    #[test]
    fn family_filter_keeps_only_requested_family() {
        let endpoints =
            resolve(None, "4950", Hints::datagram().family(Family::V4).passive()).expect("resolve");
        assert_eq!(endpoints.len(), 1);
        assert_eq!(endpoints[0].addr, "0.0.0.0:4950".parse::<SocketAddr>().unwrap());
        assert_eq!(endpoints[0].socktype, SockType::Datagram);
    }

    #[test]
    fn active_lookup_without_host_is_loopback() {
        let endpoints = resolve(None, "3490", Hints::stream()).expect("resolve");
        assert!(endpoints.iter().all(|e| e.addr.ip().is_loopback()));
    }

    #[test]
    fn literal_of_wrong_family_has_no_candidates() {
        let err = resolve(Some("127.0.0.1"), "80", Hints::stream().family(Family::V6))
            .expect_err("v4 literal cannot satisfy v6");
        assert!(matches!(err, ResolveError::NoCandidates { port: 80, .. }));
    }

    #[test]
    fn named_service_is_rejected() {
        let err = resolve(None, "http", Hints::stream()).expect_err("not numeric");
        assert!(matches!(err, ResolveError::Service(service) if service == "http"));
    }

    #[tokio::test]
    async fn async_lookup_matches_sync_lookup() {
        let sync = resolve(Some("127.0.0.1"), "0", Hints::stream()).expect("sync");
        let async_result = resolve_async(Some("127.0.0.1".into()), "0".into(), Hints::stream())
            .await
            .expect("async");
        assert_eq!(sync, async_result);
    }
}
