//! Streaming a reader into a write session.

use std::io::{self, Read, Write};

use crate::errors::{ReplaceError, Result};
use crate::session::WriteSession;
use crate::shutdown;

const BUF_SIZE: usize = 1024 * 1024; // 1 MiB chunks

/// Copy `reader` to EOF into `session`, checking the shutdown flag between
/// chunks. Returns the number of input bytes consumed.
///
/// The session is left open either way; the caller commits or drops it.
pub fn copy_into<R: Read + ?Sized>(reader: &mut R, session: &mut WriteSession) -> Result<u64> {
    let mut buf = vec![0u8; BUF_SIZE];
    let mut total: u64 = 0;
    loop {
        shutdown::check()?;
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => return Err(ReplaceError::Input { source }),
        };
        session.write_all(&buf[..n]).map_err(|source| ReplaceError::Write {
            staging: session.staging_path().to_path_buf(),
            source,
        })?;
        total += n as u64;
    }
}
