//! Client identity for rate-limit keys and audit records.
//!
//! `X-Forwarded-For` is only consulted when the socket peer is a configured
//! trusted proxy; otherwise any client could pick its own rate-limit key.
//! Proxies append on the right, so the list is read right to left and the
//! first hop that is not a trusted proxy is the client. Everything left of
//! that hop was written by the client and is ignored, as is `Client-IP`.

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderMap;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted_proxies: Vec<IpAddr>,
}

impl ClientIpResolver {
    pub fn new(trusted_proxies: Vec<IpAddr>) -> Self {
        Self { trusted_proxies }
    }

    pub fn resolve(&self, peer: SocketAddr, headers: &HeaderMap) -> IpAddr {
        let peer_ip = peer.ip();
        if !self.is_trusted(&peer_ip) {
            return peer_ip;
        }

        // Repeated headers count as one list, in arrival order.
        let hops: Vec<&str> = headers
            .get_all(X_FORWARDED_FOR)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .collect();

        let mut client = peer_ip;
        for hop in hops.iter().rev() {
            // An unparseable hop ends the trusted chain.
            let Ok(ip) = hop.parse::<IpAddr>() else {
                break;
            };
            client = ip;
            if !self.is_trusted(&ip) {
                break;
            }
        }
        client
    }

    fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted_proxies.contains(ip)
    }
}
