use std::io::{BufReader, Read, Write};
use std::net::TcpStream;

use tracing::{debug, info, warn};

use crate::eval::evaluate;
use crate::protocol::{self, Deserialize, ProtocolError, Request, Response, Serialize};

/// Why a session ended without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disconnect {
    /// The client sent the sentinel line.
    Quit,

    /// The client closed the socket between requests.
    PeerClosed,
}

/// Runs the request/response cycle until the client quits or goes away.
///
/// The sentinel is never answered. Any other request, well-formed or not,
/// gets exactly one response, in request order.
pub fn serve<R: Read, W: Write>(reader: &mut R, writer: &mut W) -> protocol::Result<Disconnect> {
    loop {
        let request = match Request::deserialize(reader) {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(Disconnect::PeerClosed),
            Err(e) => return Err(e),
        };

        if request.is_quit() {
            return Ok(Disconnect::Quit);
        }

        let response = Response::new(evaluate(&request.line));
        debug!(request = %request.line, response = %response.line, "evaluated");
        response.serialize(writer)?;
    }
}

/// Serves one accepted socket to completion and logs how it ended.
///
/// Failures stay local to this connection.
pub fn handle_client(stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    info!(%peer, "client connected");

    if let Err(e) = _handle_client(stream) {
        warn!(%peer, "client error: {e}");
    }
}

fn _handle_client(mut stream: TcpStream) -> protocol::Result<()> {
    stream.set_nodelay(true)?;
    let mut reader = BufReader::new(stream.try_clone()?);

    match serve(&mut reader, &mut stream)? {
        Disconnect::Quit => info!("client quit"),
        Disconnect::PeerClosed => info!("client disconnected"),
    }

    Ok(())
}
