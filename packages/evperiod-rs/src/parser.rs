//! Event text format.
//!
//! One event per line: `timestamp_ns polarity [pixel]`, separated by
//! whitespace or commas. Polarity `1`/`+1` is ON, `0`/`-1` is OFF. Pixel
//! defaults to 0. Blank lines and lines starting with `#` are skipped.

use memmap2::Mmap;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use crate::error::{EvPeriodError, Result};
use crate::types::{Event, PixelEvents};

/// Open a file and map it into memory (read-only)
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    if !path.exists() {
        return Err(EvPeriodError::FileNotFound(path.display().to_string()));
    }
    let file = File::open(path)?;
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}

/// Read and parse an event file
pub fn read_events_file(path: &Path) -> Result<Vec<PixelEvents>> {
    let mmap = mmap_file(path)?;
    log::debug!("Mapped {} ({} bytes)", path.display(), mmap.len());
    parse_events_from_bytes(&mmap)
}

/// Parse event text from a byte slice (e.g. mmap).
///
/// Events are grouped per pixel in file order; pixels are returned in
/// ascending index order. Malformed lines are an error.
pub fn parse_events_from_bytes(content: &[u8]) -> Result<Vec<PixelEvents>> {
    let mut pixels: BTreeMap<u32, Vec<Event>> = BTreeMap::new();
    let mut total = 0usize;

    for (line_no, line) in content.split(|&b| b == b'\n').enumerate() {
        let line = line.trim_ascii();
        if line.is_empty() || line[0] == b'#' {
            continue;
        }
        let (pixel, event) = parse_line(line).map_err(|msg| {
            log::warn!("Rejecting line {}: {}", line_no + 1, msg);
            EvPeriodError::ParseError(format!("line {}: {}", line_no + 1, msg))
        })?;
        pixels.entry(pixel).or_default().push(event);
        total += 1;
    }

    log::debug!("Parsed {} events across {} pixels", total, pixels.len());
    Ok(pixels
        .into_iter()
        .map(|(pixel, events)| PixelEvents::new(pixel, events))
        .collect())
}

/// Parse event text from a string
pub fn parse_events(content: &str) -> Result<Vec<PixelEvents>> {
    parse_events_from_bytes(content.as_bytes())
}

fn parse_line(line: &[u8]) -> std::result::Result<(u32, Event), String> {
    let text = std::str::from_utf8(line).map_err(|_| "not valid UTF-8".to_string())?;
    let mut fields = text
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|f| !f.is_empty());

    let timestamp = fields
        .next()
        .ok_or("missing timestamp")?
        .parse::<i64>()
        .map_err(|e| format!("invalid timestamp: {}", e))?;
    let polarity = match fields.next().ok_or("missing polarity")? {
        "1" | "+1" => true,
        "0" | "-1" => false,
        other => return Err(format!("invalid polarity '{}'", other)),
    };
    let pixel = match fields.next() {
        Some(p) => p
            .parse::<u32>()
            .map_err(|e| format!("invalid pixel index: {}", e))?,
        None => 0,
    };
    if fields.next().is_some() {
        return Err("too many fields".to_string());
    }
    Ok((pixel, Event::new(timestamp, polarity)))
}
