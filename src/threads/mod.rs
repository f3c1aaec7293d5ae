//! Thread-per-connection server.

use std::net::TcpListener;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{error, info, info_span, warn};

use crate::connection::handle_client;

/// Identifies a connection in the logs.
pub type ClientId = u64;

/// Hands out client ids. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct ClientIds {
    last: AtomicU64,
}

impl ClientIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically allocates the next id.
    pub fn next_id(&self) -> ClientId {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Accepts clients forever, serving each on its own thread.
pub fn run(listener: TcpListener) {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "server listening (threads)");
    }

    let ids = Arc::new(ClientIds::new());

    // Accept connections
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!("failed to accept connection: {e}");
                continue;
            }
        };

        let id = ids.next_id();
        let spawned = std::thread::Builder::new()
            .name(format!("client-{id}"))
            .spawn(move || {
                let _span = info_span!("client", id).entered();
                handle_client(stream);
            });

        if let Err(e) = spawned {
            error!(id, "failed to spawn worker: {e}");
        }
    }
}
