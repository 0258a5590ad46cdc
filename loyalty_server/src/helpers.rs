use std::{
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
};

use actix_web::HttpRequest;
use log::{debug, trace};

/// Get the remote IP address from the request. It uses 2 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The first address in the `X-Forwarded-For` header, iif `use_x_forwarded_for` is set to true in the
///    configuration.
/// 2. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.peer_addr().map(|a| a.ip());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr
    })
}

/// The key used to rate limit a request. Requests with no discernible address share a single bucket.
pub fn client_key(req: &HttpRequest, use_x_forwarded_for: bool) -> IpAddr {
    get_remote_ip(req, use_x_forwarded_for).unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}
