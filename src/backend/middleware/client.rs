//! Source address of a request, used as half of the login rate-limit key.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::request::Parts,
};

/// Where the client address is taken from
///
/// `X-Forwarded-For` is client-controlled unless a proxy in front of the
/// server overwrites it, so it is only read under `ForwardedFor`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClientIpSource {
    #[default]
    PeerAddress,
    ForwardedFor,
}

impl ClientIpSource {
    pub fn from_trust(trust_proxy_headers: bool) -> Self {
        if trust_proxy_headers {
            Self::ForwardedFor
        } else {
            Self::PeerAddress
        }
    }
}

/// Client address per the state's [`ClientIpSource`]
///
/// Under `ForwardedFor` the first hop wins and the peer address is the
/// fallback. Without either, `"unknown"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIp(pub String);

fn first_forwarded_hop(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for ClientIp
where
    ClientIpSource: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if ClientIpSource::from_ref(state) == ClientIpSource::ForwardedFor {
            if let Some(ip) = first_forwarded_hop(parts) {
                return Ok(Self(ip));
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(peer.unwrap_or_else(|| "unknown".to_string())))
    }
}
