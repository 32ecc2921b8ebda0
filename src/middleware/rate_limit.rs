use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use governor::{clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::{net::SocketAddr, num::NonZeroU32};
use tracing::warn;

use crate::{errors::AppError, AppState};

pub type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub fn keyed_limiter(per_minute: u32) -> KeyedLimiter {
    let burst = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    RateLimiter::keyed(Quota::per_minute(burst))
}

/// Per-client token bucket for write endpoints. Reads pass straight through.
pub async fn write_rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS) {
        return Ok(next.run(request).await);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let client_ip = extract_client_ip(request.headers(), peer, state.config.trust_proxy_headers);

    if state.write_limiter.check_key(&client_ip).is_err() {
        warn!("Rate limit exceeded for {} on {}", client_ip, request.uri().path());
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

/// Rate-limit key for a request. Proxy headers are client-controlled unless a
/// trusted proxy rewrites them, so they are read only when `trust_proxy` is set.
fn extract_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    let peer_ip = || {
        peer.map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };
    if !trust_proxy {
        return peer_ip();
    }

    if let Some(forwarded_for) = headers.get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded_for.to_str() {
            // Take the first IP in the chain
            if let Some(first_ip) = forwarded_str.split(',').next() {
                let first_ip = first_ip.trim();
                if !first_ip.is_empty() {
                    return first_ip.to_string();
                }
            }
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP") {
        if let Ok(real_ip_str) = real_ip.to_str() {
            return real_ip_str.trim().to_string();
        }
    }

    if let Some(forwarded) = headers.get("Forwarded") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // RFC 7239
            for pair in forwarded_str.split(';') {
                if let Some((key, value)) = pair.split_once('=') {
                    if key.trim().eq_ignore_ascii_case("for") {
                        return value.trim().trim_matches('"').to_string();
                    }
                }
            }
        }
    }

    peer_ip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn limiter_rejects_after_quota() {
        let limiter = keyed_limiter(3);
        let key = "10.0.0.1".to_string();
        for _ in 0..3 {
            assert!(limiter.check_key(&key).is_ok());
        }
        assert!(limiter.check_key(&key).is_err());
        assert!(limiter.check_key(&"10.0.0.2".to_string()).is_ok());
    }

    #[test]
    fn client_ip_prefers_proxy_headers_when_trusted() {
        let peer: SocketAddr = "192.168.1.5:4000".parse().expect("addr");
        let mut headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers, Some(peer), true), "192.168.1.5");
        assert_eq!(extract_client_ip(&headers, None, true), "unknown");

        headers.insert("Forwarded", HeaderValue::from_static("for=\"203.0.113.7\";proto=https"));
        assert_eq!(extract_client_ip(&headers, Some(peer), true), "203.0.113.7");

        headers.insert("X-Real-IP", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(extract_client_ip(&headers, Some(peer), true), "198.51.100.2");

        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(extract_client_ip(&headers, Some(peer), true), "203.0.113.9");
    }

    #[test]
    fn spoofed_forwarded_for_is_ignored_by_default() {
        let peer: SocketAddr = "192.168.1.5:4000".parse().expect("addr");
        let limiter = keyed_limiter(2);

        for spoofed in ["1.1.1.1", "2.2.2.2", "3.3.3.3"] {
            let mut headers = HeaderMap::new();
            headers.insert("X-Forwarded-For", HeaderValue::from_static(spoofed));
            headers.insert("X-Real-IP", HeaderValue::from_static(spoofed));
            assert_eq!(extract_client_ip(&headers, Some(peer), false), "192.168.1.5");
        }

        let key = extract_client_ip(&HeaderMap::new(), Some(peer), false);
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_ok());
        assert!(limiter.check_key(&key).is_err());
    }
}
