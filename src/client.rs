use std::{
    io::{BufRead, BufReader, Write},
    net::{Shutdown, TcpStream},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use tracing::{debug, warn};

use crate::protocol::{
    self, Deserialize, ProtocolError, QUIT, Request, Response, Serialize, is_quit,
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

/// How long a request may go unanswered before the waiting notice is shown.
pub const WAIT_NOTICE_AFTER: Duration = Duration::from_secs(1);

pub const PROMPT: &str = "Enter: <number> <op> <number> (or Quit to quit)";
pub const WAITING: &str = "Waiting...";

#[derive(Clone, Debug)]
pub struct Config {
    /// The host name or IP address of the server.
    pub host: String,

    /// The port of the server.
    pub port: u16,

    /// How long to wait for a response before printing the waiting notice.
    pub wait_notice: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            wait_notice: WAIT_NOTICE_AFTER,
        }
    }
}

impl Config {
    /// Builds a config from optional command line values.
    ///
    /// A port that does not parse falls back to [`DEFAULT_PORT`] with a warning.
    pub fn from_args(host: Option<&str>, port: Option<&str>) -> Self {
        let mut cfg = Self::default();

        if let Some(host) = host {
            cfg.host = host.to_string();
        }

        if let Some(port) = port {
            match port.parse() {
                Ok(port) => cfg.port = port,
                Err(_) => warn!("invalid port {port:?}, using default {DEFAULT_PORT}"),
            }
        }

        cfg
    }

    /// Connects to the server and starts the response receiver.
    pub fn connect(self) -> protocol::Result<Client> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))?;
        stream.set_nodelay(true)?;

        let (tx, rx) = unbounded();
        let stream_clone = stream.try_clone()?;
        std::thread::spawn(move || _run_receiver(stream_clone, tx));

        Ok(Client {
            stream,
            responses: rx,
            wait_notice: self.wait_notice,
        })
    }
}

/// One connection to the server.
pub struct Client {
    /// Write half of the connection.
    stream: TcpStream,

    /// Responses decoded by the receiver thread, in arrival order.
    responses: Receiver<protocol::Result<Response>>,

    wait_notice: Duration,
}

impl Client {
    /// Sends one line verbatim as a single frame.
    pub fn send(&mut self, line: &str) -> protocol::Result<()> {
        Request::new(line).serialize(&mut self.stream)
    }

    /// Blocks until the next response arrives.
    ///
    /// If nothing has arrived after the configured delay, [`WAITING`] is
    /// written to `out` once and the wait goes on indefinitely.
    pub fn receive<W: Write>(&mut self, out: &mut W) -> protocol::Result<String> {
        let mut notified = false;

        loop {
            match self.responses.recv_timeout(self.wait_notice) {
                Ok(response) => return response.map(|response| response.line),
                Err(RecvTimeoutError::Timeout) => {
                    if !notified {
                        writeln!(out, "{WAITING}")?;
                        out.flush()?;
                        notified = true;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(ProtocolError::ConnectionClosed);
                }
            }
        }
    }

    /// Sends `line` and waits for its answer.
    ///
    /// The sentinel is sent without waiting, and yields `None`.
    pub fn exchange<W: Write>(
        &mut self,
        line: &str,
        out: &mut W,
    ) -> protocol::Result<Option<String>> {
        self.send(line)?;

        if is_quit(line) {
            debug!("sent sentinel, leaving");
            return Ok(None);
        }

        self.receive(out).map(Some)
    }

    /// Interactive loop: prompt, read a line from `input`, print the answer.
    ///
    /// Returns once the user types the sentinel. End of input counts as the
    /// sentinel so the server still sees a clean quit.
    /// Input that is not valid UTF-8 is decoded lossily rather than ending the
    /// session.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        out: &mut W,
    ) -> protocol::Result<()> {
        let mut buf = Vec::new();

        loop {
            writeln!(out, "{PROMPT}")?;
            out.flush()?;

            buf.clear();
            let line = match input.read_until(b'\n', &mut buf)? {
                0 => QUIT.to_string(),
                _ => decode_line(&buf),
            };

            match self.exchange(&line, out)? {
                Some(answer) => writeln!(out, "Answer = {answer}")?,
                None => return Ok(()),
            }
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        // Also wakes the receiver thread, which holds a clone of the socket.
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

/// One input line without its line ending.
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decodes responses until the connection fails and forwards them.
fn _run_receiver(stream: TcpStream, tx: Sender<protocol::Result<Response>>) {
    let mut reader = BufReader::new(stream);

    loop {
        let response = Response::deserialize(&mut reader);
        let failed = response.is_err();

        if tx.send(response).is_err() || failed {
            break;
        }
    }
}
