//! Prints every address a hostname resolves to.

use std::fmt::Write;

use net_basics::{Endpoint, Family, Hints, ResolveError, display::ip_version, resolve_async};

/// Looks up `host` with no service and no family preference.
pub async fn lookup(host: &str, family: Family) -> Result<Vec<Endpoint>, ResolveError> {
    resolve_async(Some(host.to_string()), "0".to_string(), Hints::stream().family(family)).await
}

/// Formats a lookup result the way the program prints it.
pub fn render(host: &str, endpoints: &[Endpoint]) -> String {
    let mut out = format!("IP addresses for {host}:\n");
    for endpoint in endpoints {
        let _ = writeln!(out, " {}: {}", ip_version(&endpoint.addr), endpoint.addr.ip());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_labels_each_family() {
        let endpoints = [
            Endpoint {
                addr: "127.0.0.1:0".parse().unwrap(),
                socktype: net_basics::SockType::Stream,
            },
            Endpoint {
                addr: "[::1]:0".parse().unwrap(),
                socktype: net_basics::SockType::Stream,
            },
        ];
        assert_eq!(
            render("localhost", &endpoints),
            "IP addresses for localhost:\n IPv4: 127.0.0.1\n IPv6: ::1\n"
        );
    }
}
