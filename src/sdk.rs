//! Helpers shared by the orchestrator and by test code: random identifiers
//! and free host ports.

use std::net::{Ipv4Addr, TcpListener};

use rand::Rng;

use crate::error::{Error, Result};

const ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 8;

/// Generate an 8-character lowercase alphanumeric identifier.
///
/// Safe to call from any thread; each call draws from the thread-local RNG.
pub fn generate_unique_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}

/// Find a TCP port that is currently free on the host.
///
/// The listener is released before returning, so the port is not reserved.
pub fn free_port() -> Result<u16> {
    let listener =
        TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0)).map_err(Error::PortAllocation)?;
    let port = listener.local_addr().map_err(Error::PortAllocation)?.port();
    Ok(port)
}
