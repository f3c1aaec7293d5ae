//! Sequential server: one client at a time on the calling thread.

use std::net::TcpListener;

use tracing::{info, warn};

use crate::connection::handle_client;

/// Serves clients one after another until the process is killed.
///
/// A client that connects while another is being served waits in the listen
/// backlog until the current one disconnects.
pub fn run(listener: TcpListener) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "server listening (vanilla)");
    }

    // Accept connections
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => handle_client(stream),
            Err(e) => warn!("failed to accept connection: {e}"),
        }
    }
}
