#![forbid(unsafe_code)]

//! DNS preflight with retry/backoff. The only timeout budget in the system
//! lives here; a terminal preflight failure marks the term failed without
//! touching its siblings.

use std::net::ToSocketAddrs;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub(crate) struct RetryPolicy {
    pub(crate) count: i64,
    pub(crate) sleep_seconds: f64,
    pub(crate) backoff: f64,
}

pub(crate) fn preflight_dns(host: &str, retry: &RetryPolicy) -> Result<(), String> {
    let mut last_error = String::new();
    let attempts = retry.count.max(1);
    for attempt in 1..=attempts {
        match (host, 443u16).to_socket_addrs() {
            Ok(mut addrs) => {
                if addrs.next().is_some() {
                    return Ok(());
                }
                last_error = format!("no addresses resolved for {host}");
            }
            Err(err) => last_error = err.to_string(),
        }
        if attempt < attempts {
            let sleep = retry.sleep_seconds * retry.backoff.powi((attempt - 1) as i32);
            if sleep > 0.0 {
                std::thread::sleep(Duration::from_secs_f64(sleep));
            }
        }
    }
    Err(format!("DNS preflight failed for {host}: {last_error}"))
}
