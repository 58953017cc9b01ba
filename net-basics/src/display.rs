use std::net::{IpAddr, SocketAddr};

pub fn ip_version(addr: &SocketAddr) -> &'static str {
    match addr.ip() {
        IpAddr::V4(_) => "IPv4",
        IpAddr::V6(_) => "IPv6",
    }
}

/// Renders a peer's IP for log lines.
///
/// Dual-stack listeners see IPv4 clients as `::ffff:a.b.c.d`; those are shown
/// in their plain IPv4 form.
pub fn render_peer(addr: &SocketAddr) -> String {
    addr.ip().to_canonical().to_string()
}
