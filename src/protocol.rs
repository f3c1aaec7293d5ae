use std::io::{self, ErrorKind, Read, Write};

use thiserror::Error;

/// Size in bytes of the length prefix in front of every frame.
pub const PREFIX_SIZE: usize = 2;

/// Largest payload a single frame can carry.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// The line that ends a session.
pub const QUIT: &str = "Quit";

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer closed the connection before a full frame arrived.
    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("message of {0} bytes does not fit in a frame (max {MAX_FRAME_LEN})")]
    FrameTooLong(usize),

    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

pub trait Serialize<T> {
    fn serialize(self, bytes: &mut T) -> Result<()>;
}

pub trait Deserialize<T> {
    fn deserialize(bytes: &mut T) -> Result<Self>
    where
        Self: Sized;
}

/// Represents a client request: one line of text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub line: String,
}

impl Request {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// Whether this request is the session sentinel.
    pub fn is_quit(&self) -> bool {
        is_quit(&self.line)
    }
}

impl<T: Write> Serialize<T> for Request {
    fn serialize(self, bytes: &mut T) -> Result<()> {
        write_frame(bytes, &self.line)
    }
}

impl<T: Read> Deserialize<T> for Request {
    fn deserialize(bytes: &mut T) -> Result<Self> {
        let line = read_frame(bytes)?;
        Ok(Self { line })
    }
}

/// Represents a server response: the evaluated result or an error message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub line: String,
}

impl Response {
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }
}

impl<T: Write> Serialize<T> for Response {
    fn serialize(self, bytes: &mut T) -> Result<()> {
        write_frame(bytes, &self.line)
    }
}

impl<T: Read> Deserialize<T> for Response {
    fn deserialize(bytes: &mut T) -> Result<Self> {
        let line = read_frame(bytes)?;
        Ok(Self { line })
    }
}

/// Exact, ASCII case-insensitive match against [`QUIT`].
pub fn is_quit(line: &str) -> bool {
    line.eq_ignore_ascii_case(QUIT)
}

/// Writes `text` as a single frame.
///
/// The prefix and payload go out in one `write_all` so two writers sharing a
/// socket can never interleave halves of a frame.
pub fn write_frame<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    let payload = text.as_bytes();
    let len =
        u16::try_from(payload.len()).map_err(|_| ProtocolError::FrameTooLong(payload.len()))?;

    let mut frame = Vec::with_capacity(PREFIX_SIZE + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);

    writer.write_all(&frame).map_err(map_eof)?;
    writer.flush().map_err(map_eof)?;
    Ok(())
}

/// Blocks until one full frame has been read.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<String> {
    let mut len_bytes = [0u8; PREFIX_SIZE];
    reader.read_exact(&mut len_bytes).map_err(map_eof)?;

    let len = u16::from_be_bytes(len_bytes) as usize;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).map_err(map_eof)?;

    String::from_utf8(payload).map_err(|_| ProtocolError::InvalidUtf8)
}

fn map_eof(e: io::Error) -> ProtocolError {
    match e.kind() {
        ErrorKind::UnexpectedEof | ErrorKind::BrokenPipe => ProtocolError::ConnectionClosed,
        _ => ProtocolError::Io(e),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn frame_layout() {
        let mut buf = Vec::new();
        Request::new("1 + 2").serialize(&mut buf).unwrap();
        assert_eq!(buf, b"\x00\x051 + 2");
    }

    #[test]
    fn frames_are_read_one_at_a_time() {
        let mut buf = Vec::new();
        Response::new("3.0").serialize(&mut buf).unwrap();
        Response::new("Error: invalid number").serialize(&mut buf).unwrap();

        let mut cursor = Cursor::new(buf);
        assert_eq!(Response::deserialize(&mut cursor).unwrap().line, "3.0");
        assert_eq!(
            Response::deserialize(&mut cursor).unwrap().line,
            "Error: invalid number"
        );
        assert!(matches!(
            Response::deserialize(&mut cursor),
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[test]
    fn empty_and_multibyte_payloads() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "").unwrap();
        write_frame(&mut buf, "π × 2").unwrap();
        assert_eq!(&buf[..2], &[0, 0]);
        assert_eq!(&buf[2..4], &[0, "π × 2".len() as u8]);

        let mut cursor = Cursor::new(buf);
        assert_eq!(read_frame(&mut cursor).unwrap(), "");
        assert_eq!(read_frame(&mut cursor).unwrap(), "π × 2");
    }

    #[test]
    fn truncated_payload_is_connection_closed() {
        let mut cursor = Cursor::new(b"\x00\x0a1 +".to_vec());
        assert!(matches!(
            read_frame(&mut cursor),
            Err(ProtocolError::ConnectionClosed)
        ));

        let mut cursor = Cursor::new(vec![0u8]);
        assert!(matches!(
            read_frame(&mut cursor),
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[test]
    fn rejects_oversized_message() {
        let text = "x".repeat(MAX_FRAME_LEN + 1);
        let mut buf = Vec::new();
        assert!(matches!(
            write_frame(&mut buf, &text),
            Err(ProtocolError::FrameTooLong(n)) if n == MAX_FRAME_LEN + 1
        ));
        assert!(buf.is_empty());

        write_frame(&mut buf, &text[..MAX_FRAME_LEN]).unwrap();
        assert_eq!(buf.len(), PREFIX_SIZE + MAX_FRAME_LEN);
    }

    #[test]
    fn rejects_invalid_utf8() {
        let mut cursor = Cursor::new(vec![0, 2, 0xc3, 0x28]);
        assert!(matches!(
            read_frame(&mut cursor),
            Err(ProtocolError::InvalidUtf8)
        ));
    }

    #[test]
    fn quit_is_case_insensitive_and_exact() {
        for line in ["Quit", "quit", "QUIT", "qUiT"] {
            assert!(Request::new(line).is_quit(), "{line}");
        }
        for line in ["Quit ", " quit", "exit", "Quit now", ""] {
            assert!(!Request::new(line).is_quit(), "{line:?}");
        }
    }
}
