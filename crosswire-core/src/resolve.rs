//! Host and service resolution.
//!
//! Turns a host/service pair (or "any interface") into an ordered list of
//! endpoint descriptors in the platform's own preference order. Hostname
//! lookups go through the system resolver and may block the calling thread.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs};

use socket2::{Domain, Protocol, SockAddr, Type};

use crate::error::{NetError, Result};

/// Well-known service names accepted next to numeric ports. The system
/// services database is not consulted; this mirrors `/etc/services` for the
/// handful of names a TCP facade is realistically asked for.
const WELL_KNOWN_SERVICES: &[(&str, u16)] = &[
    ("echo", 7),
    ("ftp", 21),
    ("ssh", 22),
    ("telnet", 23),
    ("smtp", 25),
    ("domain", 53),
    ("http", 80),
    ("pop3", 110),
    ("imap", 143),
    ("https", 443),
    ("submission", 587),
];

/// A resolved endpoint descriptor: address family, socket type, protocol,
/// and the byte-level address. Produced here, consumed by value by exactly
/// one lifecycle call.
#[derive(Debug, Clone)]
pub struct Endpoint {
    domain: Domain,
    ty: Type,
    protocol: Protocol,
    addr: SockAddr,
}

impl Endpoint {
    /// Builds a TCP endpoint descriptor for a concrete socket address.
    #[must_use]
    pub fn tcp(addr: SocketAddr) -> Self {
        Self {
            domain: Domain::for_address(addr),
            ty: Type::STREAM,
            protocol: Protocol::TCP,
            addr: SockAddr::from(addr),
        }
    }

    /// Address family of this endpoint.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Socket type (always stream for TCP endpoints).
    #[must_use]
    pub fn socket_type(&self) -> Type {
        self.ty
    }

    /// Transport protocol.
    #[must_use]
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The raw platform address.
    #[must_use]
    pub fn sock_addr(&self) -> &SockAddr {
        &self.addr
    }

    /// The endpoint as a `SocketAddr`, if it is an IP address.
    #[must_use]
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.addr.as_socket()
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::tcp(addr)
    }
}

/// Parses a service specifier: a numeric port (including "0", which lets
/// the OS assign one at bind time) or a well-known name.
pub fn parse_service(service: &str) -> Result<u16> {
    if let Ok(port) = service.parse::<u16>() {
        return Ok(port);
    }
    WELL_KNOWN_SERVICES
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(service))
        .map(|&(_, port)| port)
        .ok_or_else(|| NetError::Resolution {
            spec: service.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "unknown service"),
        })
}

/// Resolves a host/service pair into candidate endpoints, ordered by the
/// platform resolver's preference. May block on DNS.
pub fn resolve(host: &str, service: &str) -> Result<Vec<Endpoint>> {
    let port = parse_service(service)?;
    let spec = || format!("{host}:{service}");

    if host.is_empty() {
        return Err(NetError::Resolution {
            spec: spec(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "empty host"),
        });
    }

    // A literal IP needs no lookup.
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(vec![Endpoint::tcp(SocketAddr::new(ip, port))]);
    }

    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| NetError::Resolution {
            spec: spec(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(NetError::Resolution {
            spec: spec(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses resolved"),
        });
    }

    tracing::trace!(host, service, candidates = addrs.len(), "resolved");
    Ok(addrs.into_iter().map(Endpoint::tcp).collect())
}

/// Resolves "all interfaces" endpoints for a listening socket. IPv4 first,
/// then IPv6; the lifecycle layer walks candidates in order.
pub fn resolve_passive(service: &str) -> Result<Vec<Endpoint>> {
    let port = parse_service(service)?;
    Ok(vec![
        Endpoint::tcp(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)),
        Endpoint::tcp(SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_service() {
        assert_eq!(parse_service("8080").unwrap(), 8080);
    }

    #[test]
    fn test_service_zero_is_accepted() {
        assert_eq!(parse_service("0").unwrap(), 0);
    }

    #[test]
    fn test_named_service() {
        assert_eq!(parse_service("http").unwrap(), 80);
        assert_eq!(parse_service("HTTPS").unwrap(), 443);
    }

    #[test]
    fn test_unknown_service() {
        let err = parse_service("no-such-service").unwrap_err();
        assert!(matches!(err, NetError::Resolution { .. }));
    }

    #[test]
    fn test_literal_address_skips_dns() {
        let endpoints = resolve("127.0.0.1", "5555").unwrap();
        assert_eq!(endpoints.len(), 1);
        assert_eq!(
            endpoints[0].socket_addr().unwrap(),
            "127.0.0.1:5555".parse().unwrap()
        );
    }

    #[test]
    fn test_literal_ipv6_address() {
        let endpoints = resolve("::1", "80").unwrap();
        assert_eq!(endpoints[0].domain(), Domain::IPV6);
    }

    #[test]
    fn test_empty_host_is_rejected() {
        assert!(matches!(
            resolve("", "80"),
            Err(NetError::Resolution { .. })
        ));
    }

    #[test]
    fn test_localhost_resolves() {
        let endpoints = resolve("localhost", "80").unwrap();
        assert!(!endpoints.is_empty());
        for ep in &endpoints {
            assert_eq!(ep.socket_addr().unwrap().port(), 80);
        }
    }

    #[test]
    fn test_passive_candidates_cover_both_families() {
        let endpoints = resolve_passive("0").unwrap();
        assert_eq!(endpoints.len(), 2);
        assert_eq!(endpoints[0].domain(), Domain::IPV4);
        assert_eq!(endpoints[1].domain(), Domain::IPV6);
    }
}
