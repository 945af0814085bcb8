//! Client address resolution
//!
//! The resolved address is only ever used as input to the identity hasher, so
//! it is returned in canonical textual form: the same client always produces
//! the same string regardless of how a proxy spelled it.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Placeholder used when no address can be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Resolve the client address of a request.
///
/// Behind `trusted_proxy_count` proxies the client is read from
/// `X-Forwarded-For`, then `X-Real-IP`. With no trusted proxies both headers
/// are client-controlled and only the socket peer address is used.
pub fn resolve_client_address(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trusted_proxy_count: usize,
) -> String {
    let from_proxy = if trusted_proxy_count == 0 {
        None
    } else {
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| client_from_forwarded_chain(v, trusted_proxy_count))
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .and_then(parse_ip)
            })
    };

    from_proxy
        .or_else(|| peer.map(|addr| addr.ip()))
        .map(|ip| canonical(ip).to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Pick the client out of `client, proxy1, proxy2, ...`.
///
/// Each trusted proxy appends the address that connected to it, so the
/// outermost one wrote the entry `trusted_proxy_count` places from the end.
/// Anything to the left of it came from the client and is ignored. A chain
/// shorter than the proxy count did not pass through all of our proxies.
fn client_from_forwarded_chain(chain: &str, trusted_proxy_count: usize) -> Option<IpAddr> {
    let hops: Vec<&str> = chain
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    let position = hops.len().checked_sub(trusted_proxy_count)?;
    hops.get(position).and_then(|hop| parse_ip(hop))
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    value.trim().parse::<IpAddr>().ok()
}

/// IPv4-mapped IPv6 addresses count as their IPv4 form.
fn canonical(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6
            .to_ipv4_mapped()
            .map(IpAddr::V4)
            .unwrap_or(IpAddr::V6(v6)),
        v4 => v4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        headers
    }

    #[test]
    fn test_chain_with_trusted_proxies() {
        assert_eq!(
            client_from_forwarded_chain("203.0.113.7", 1),
            Some("203.0.113.7".parse().unwrap())
        );
        assert_eq!(
            client_from_forwarded_chain("198.51.100.1, 203.0.113.7, 10.0.0.1", 2),
            Some("203.0.113.7".parse().unwrap())
        );
    }

    #[test]
    fn test_forged_leftmost_entries_are_ignored() {
        for forged in ["10.9.9.1", "10.9.9.2", "1.2.3.4, 5.6.7.8"] {
            let chain = format!("{}, 198.51.100.9", forged);
            assert_eq!(
                client_from_forwarded_chain(&chain, 1),
                Some("198.51.100.9".parse().unwrap())
            );
        }
    }

    #[test]
    fn test_short_chain_is_not_trusted() {
        assert_eq!(client_from_forwarded_chain("203.0.113.7", 2), None);
        assert_eq!(client_from_forwarded_chain(" , ", 1), None);
        assert_eq!(client_from_forwarded_chain("not-an-ip", 1), None);
    }

    #[test]
    fn test_precedence() {
        let peer = Some(SocketAddr::from(([192, 0, 2, 10], 4000)));

        let both = headers(&[("x-forwarded-for", "203.0.113.7"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(resolve_client_address(&both, peer, 1), "203.0.113.7");

        let real_only = headers(&[("x-real-ip", " 198.51.100.2 ")]);
        assert_eq!(resolve_client_address(&real_only, peer, 1), "198.51.100.2");

        let garbage = headers(&[("x-forwarded-for", "nonsense")]);
        assert_eq!(resolve_client_address(&garbage, peer, 1), "192.0.2.10");

        assert_eq!(resolve_client_address(&HeaderMap::new(), None, 1), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_headers_ignored_without_trusted_proxies() {
        let peer = Some(SocketAddr::from(([192, 0, 2, 10], 4000)));
        let spoofed = headers(&[("x-forwarded-for", "203.0.113.7"), ("x-real-ip", "198.51.100.2")]);

        assert_eq!(resolve_client_address(&spoofed, peer, 0), "192.0.2.10");
        assert_eq!(resolve_client_address(&spoofed, None, 0), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_mapped_ipv6_is_canonicalised() {
        let mapped = headers(&[("x-forwarded-for", "::ffff:203.0.113.7")]);
        assert_eq!(resolve_client_address(&mapped, None, 1), "203.0.113.7");

        let v6 = headers(&[("x-forwarded-for", "2001:db8::1")]);
        assert_eq!(resolve_client_address(&v6, None, 1), "2001:db8::1");
    }
}
