//! Input resolution: the optional byte source backing a `PUT` request.
use std::fs::File;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::debug;

use crate::errors::*;

/// File argument selecting standard input.
pub const STDIN_MARKER: &str = "-";

/// Seekable request body: piped standard input kept in memory, or a file.
#[derive(Debug)]
pub enum Payload {
    Memory(Cursor<Vec<u8>>),
    File(File),
}

impl Payload {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Payload::Memory(Cursor::new(bytes))
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).chain_err(|| format!("unable to open {}", path.display()))?;
        Ok(Payload::File(file))
    }

    /// Number of bytes to send, used as `content-length`.
    pub fn content_length(&self) -> Result<u64> {
        match self {
            Payload::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            Payload::File(file) => Ok(file.metadata()?.len()),
        }
    }
}

impl Read for Payload {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Payload::Memory(cursor) => cursor.read(buf),
            Payload::File(file) => file.read(buf),
        }
    }
}

impl Seek for Payload {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Payload::Memory(cursor) => cursor.seek(pos),
            Payload::File(file) => file.seek(pos),
        }
    }
}

/// Decide which byte source, if any, backs the request.
///
/// * a file path other than `-` is always opened, piped input is then ignored;
/// * `-` reads standard input, whether it is piped or not;
/// * no file reads standard input only when it is piped.
///
/// Standard input is read eagerly; when it turns out to be empty there is no
/// input at all and the request becomes a `GET`.
pub fn resolve_input<R: Read>(
    file: Option<&str>,
    stdin_piped: bool,
    stdin: R,
) -> Result<Option<Payload>> {
    match file.filter(|f| !f.is_empty()) {
        Some(STDIN_MARKER) => {
            if !stdin_piped {
                debug!("reading standard input from a terminal until end of file");
            }
            read_stdin(stdin)
        }
        Some(path) => {
            if stdin_piped {
                debug!(%path, "ignoring piped standard input in favour of file");
            }
            Payload::open(path).map(Some)
        }
        None if stdin_piped => read_stdin(stdin),
        None => Ok(None),
    }
}

fn read_stdin<R: Read>(mut stdin: R) -> Result<Option<Payload>> {
    let mut buf = Vec::new();
    stdin
        .read_to_end(&mut buf)
        .chain_err(|| "unable to read standard input")?;
    debug!(bytes = buf.len(), "read standard input");
    if buf.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Payload::from_bytes(buf)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn contents(payload: Option<Payload>) -> Result<Vec<u8>> {
        let mut payload = payload.chain_err(|| "expected a payload")?;
        let mut buf = Vec::new();
        payload.read_to_end(&mut buf)?;
        Ok(buf)
    }

    #[test]
    fn piped_input_without_file() -> Result<()> {
        let payload = resolve_input(None, true, &b"hello"[..])?;
        assert_eq!(b"hello".to_vec(), contents(payload)?);
        Ok(())
    }

    #[test]
    fn empty_pipe_means_no_input() -> Result<()> {
        assert!(resolve_input(None, true, &b""[..])?.is_none());
        assert!(resolve_input(Some(""), true, &b""[..])?.is_none());
        Ok(())
    }

    #[test]
    fn terminal_without_file_means_no_input() -> Result<()> {
        assert!(resolve_input(None, false, &b"ignored"[..])?.is_none());
        Ok(())
    }

    #[test]
    fn dash_reads_stdin() -> Result<()> {
        let payload = resolve_input(Some("-"), false, &b"data"[..])?;
        assert_eq!(b"data".to_vec(), contents(payload)?);
        Ok(())
    }

    #[test]
    fn file_wins_over_pipe() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(b"from file")?;
        let path = file.path().to_string_lossy().to_string();
        let payload = resolve_input(Some(path.as_str()), true, &b"from pipe"[..])?;
        assert_eq!(b"from file".to_vec(), contents(payload)?);
        Ok(())
    }

    #[test]
    fn empty_file_is_still_an_input() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        let path = file.path().to_string_lossy().to_string();
        let payload = resolve_input(Some(path.as_str()), false, io::empty())?
            .chain_err(|| "expected a payload")?;
        assert_eq!(0, payload.content_length()?);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = resolve_input(Some("/does/not/exist"), false, io::empty()).unwrap_err();
        assert!(err.to_string().contains("unable to open /does/not/exist"));
        let cause = err.iter().nth(1).map(|e| e.to_string()).unwrap_or_default();
        assert!(!cause.is_empty());
    }

    #[test]
    fn payload_is_seekable() -> Result<()> {
        let mut payload = Payload::from_bytes(b"abcdef".to_vec());
        assert_eq!(6, payload.content_length()?);
        payload.seek(SeekFrom::Start(3))?;
        let mut rest = String::new();
        payload.read_to_string(&mut rest)?;
        assert_eq!("def", rest);
        Ok(())
    }
}
