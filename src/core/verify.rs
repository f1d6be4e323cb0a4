//! Reads a pass back from disk and checks it against the pass's pattern.

use super::error::{Result, ShredError};
use super::method::{is_uniform, Pass};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Re-reads `len` bytes from offset 0 in `chunk_size` pieces.
///
/// Deterministic passes must read back byte-for-byte. Random passes cannot be
/// regenerated, so the only check is that the content is not entirely 0x00 or
/// entirely 0xFF. Read errors become `VerificationFailed`. `on_chunk` receives
/// the number of bytes checked so far.
pub fn verify_pass<R, F>(
    reader: &mut R,
    path: &Path,
    pass: Pass,
    len: u64,
    chunk_size: usize,
    mut on_chunk: F,
) -> Result<()>
where
    R: Read + Seek,
    F: FnMut(u64),
{
    let fail = |reason: String| ShredError::VerificationFailed {
        path: path.to_path_buf(),
        pass: pass.index,
        total: pass.total,
        reason,
    };

    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| fail(format!("seek failed: {}", e)))?;

    let expected = pass.pattern.expected_byte();
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut checked: u64 = 0;
    let mut all_zeros = true;
    let mut all_ones = true;

    while checked < len {
        let this_chunk = (len - checked).min(buf.len() as u64) as usize;
        let chunk = &mut buf[..this_chunk];
        reader
            .read_exact(chunk)
            .map_err(|e| fail(format!("read failed at offset {}: {}", checked, e)))?;

        match expected {
            Some(byte) => {
                if let Some(pos) = chunk.iter().position(|b| *b != byte) {
                    return Err(fail(format!(
                        "expected 0x{:02X} at offset {}, found 0x{:02X}",
                        byte,
                        checked + pos as u64,
                        chunk[pos]
                    )));
                }
            }
            None => {
                all_zeros = all_zeros && is_uniform(chunk, 0x00);
                all_ones = all_ones && is_uniform(chunk, 0xFF);
            }
        }

        checked += this_chunk as u64;
        on_chunk(checked);
    }

    if expected.is_none() && len > 0 {
        if all_zeros {
            return Err(fail("random pass left only 0x00 bytes".to_string()));
        }
        if all_ones {
            return Err(fail("random pass left only 0xFF bytes".to_string()));
        }
    }

    Ok(())
}
