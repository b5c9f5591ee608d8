//! Client address and user agent.

use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use axum::http::{Extensions, HeaderMap};

use sessionhub_service::ClientInfo;

use crate::error::ApiError;
use crate::state::AppState;

/// Client address used for rate-limit keys and session records.
///
/// The socket peer is authoritative. `X-Forwarded-For` is consulted only
/// when the peer is one of `trusted_proxies`, and then the right-most hop
/// that is not itself a trusted proxy wins. Without a peer the address is
/// `"unknown"`.
pub fn client_ip(
    headers: &HeaderMap,
    extensions: &Extensions,
    trusted_proxies: &[IpAddr],
) -> String {
    let Some(peer) = extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return "unknown".to_string();
    };

    if !trusted_proxies.contains(&peer) {
        return peer.to_string();
    }

    forwarded_hops(headers)
        .into_iter()
        .rev()
        .find(|hop| !trusted_proxies.contains(hop))
        .unwrap_or(peer)
        .to_string()
}

fn forwarded_hops(headers: &HeaderMap) -> Vec<IpAddr> {
    headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|hop| hop.trim().parse().ok())
        .collect()
}

/// Request origin for handlers that record it.
#[derive(Debug, Clone)]
pub struct ClientMeta(pub ClientInfo);

impl FromRequestParts<AppState> for ClientMeta {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let ip = client_ip(
            &parts.headers,
            &parts.extensions,
            &state.config.server.trusted_proxies,
        );
        Ok(ClientMeta(ClientInfo::new(ip, user_agent)))
    }
}
