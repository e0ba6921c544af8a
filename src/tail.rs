use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 4096;
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Return the last `count` non-empty lines of `path`, oldest first.
///
/// The file is read backward in fixed-size chunks, so only the tail is ever
/// loaded. A line longer than 64 KiB keeps only its last 64 KiB. A missing or
/// unreadable file yields an empty list.
pub fn tail_lines(path: &Path, count: usize) -> Vec<String> {
    if count == 0 {
        return Vec::new();
    }

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(action = "open", component = "log_tail", file_path = ?path, error = %e, "Log file not readable");
            return Vec::new();
        }
    };

    match read_tail(file, count) {
        Ok(lines) => lines,
        Err(e) => {
            warn!(action = "read", component = "log_tail", file_path = ?path, error = %e, "Failed to read log tail");
            Vec::new()
        }
    }
}

fn read_tail<R: Read + Seek>(mut reader: R, count: usize) -> io::Result<Vec<String>> {
    let mut pos = reader.seek(SeekFrom::End(0))?;
    let mut chunk = vec![0u8; CHUNK_SIZE];
    // Bytes of the line that started before the current chunk, at most
    // MAX_LINE_BYTES of its end.
    let mut carry: Vec<u8> = Vec::new();
    // Collected newest first.
    let mut lines: Vec<String> = Vec::with_capacity(count.min(1024));

    while pos > 0 && lines.len() < count {
        let read_size = pos.min(CHUNK_SIZE as u64) as usize;
        pos -= read_size as u64;
        reader.seek(SeekFrom::Start(pos))?;
        reader.read_exact(&mut chunk[..read_size])?;

        let mut end = read_size;
        while let Some(newline) = chunk[..end].iter().rposition(|b| *b == b'\n') {
            prepend_capped(&mut carry, &chunk[newline + 1..end]);
            push_line(&mut lines, &carry);
            carry.clear();
            end = newline;
            if lines.len() >= count {
                break;
            }
        }
        prepend_capped(&mut carry, &chunk[..end]);
    }

    if pos == 0 && lines.len() < count {
        push_line(&mut lines, &carry);
    }

    lines.reverse();
    Ok(lines)
}

/// Put `bytes` in front of the partial line. Once the line reaches
/// MAX_LINE_BYTES further bytes are dropped, so an oversized line keeps its end.
fn prepend_capped(carry: &mut Vec<u8>, bytes: &[u8]) {
    let room = MAX_LINE_BYTES.saturating_sub(carry.len());
    if room == 0 || bytes.is_empty() {
        return;
    }
    let kept = &bytes[bytes.len().saturating_sub(room)..];
    carry.splice(0..0, kept.iter().copied());
}

fn push_line(lines: &mut Vec<String>, raw: &[u8]) {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    let line = String::from_utf8_lossy(raw);
    if !line.trim().is_empty() {
        lines.push(line.into_owned());
    }
}
