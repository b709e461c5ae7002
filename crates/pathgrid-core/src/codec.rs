//! Map files: a fixed binary layout for a [`GridModel`].
//!
//! ## Legacy layout
//!
//! This format has no header. Its size is fixed by the grid
//! dimensions the reader expects:
//!
//! ```text
//! for each of H×W cells, row-major:
//!   [cell: i32 LE]                       (0 = empty .. 6 = open)
//! [start.x: i32 LE] [start.y: i32 LE]    (-1, -1 when unset)
//! [end.x: i32 LE]   [end.y: i32 LE]      (-1, -1 when unset)
//! ```
//!
//! ## Versioned layout
//!
//! [`encode`] prefixes the same body with a header, so a file carries its own
//! dimensions:
//!
//! ```text
//! [magic: b"PGMP"] [version: u32 LE] [width: u32 LE] [height: u32 LE]
//! <legacy body>
//! ```
//!
//! [`decode`] accepts both. Decoding builds a fresh grid; nothing is written
//! anywhere until the whole input has been validated.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::cell::{Cell, Role};
use crate::error::MapFileError;
use crate::geom::{Point, Range};
use crate::grid::GridModel;

/// Magic bytes opening a versioned map file.
pub const MAGIC: [u8; 4] = *b"PGMP";
/// Current versioned format.
pub const VERSION: u32 = 1;

/// magic(4) + version(4) + width(4) + height(4) = 16
const HEADER_SIZE: usize = 16;
/// Bytes per cell record.
const RECORD_SIZE: usize = 4;
/// start(8) + end(8) = 16
const MARKERS_SIZE: usize = 16;
/// Stored coordinate of an unset marker.
const UNSET: Point = Point::new(-1, -1);

/// Byte length of a legacy file for a grid of `size`.
pub fn legacy_len(size: Point) -> usize {
    let cells = size.x.max(0) as usize * size.y.max(0) as usize;
    cells * RECORD_SIZE + MARKERS_SIZE
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode `grid` in the versioned layout.
pub fn encode(grid: &GridModel) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + legacy_len(grid.size()));
    // Writing into a Vec cannot fail.
    let _ = write_map(&mut buf, grid);
    buf
}

/// Encode `grid` in the headerless legacy layout.
pub fn encode_legacy(grid: &GridModel) -> Vec<u8> {
    let mut buf = Vec::with_capacity(legacy_len(grid.size()));
    let _ = write_body(&mut buf, grid);
    buf
}

/// Write `grid` in the versioned layout.
pub fn write_map<W: Write>(writer: &mut W, grid: &GridModel) -> io::Result<()> {
    writer.write_all(&MAGIC)?;
    writer.write_all(&VERSION.to_le_bytes())?;
    writer.write_all(&(grid.width() as u32).to_le_bytes())?;
    writer.write_all(&(grid.height() as u32).to_le_bytes())?;
    write_body(writer, grid)
}

fn write_body<W: Write>(writer: &mut W, grid: &GridModel) -> io::Result<()> {
    for cell in grid.cells() {
        writer.write_all(&cell.value().to_le_bytes())?;
    }
    for marker in [grid.start(), grid.end()] {
        let p = marker.unwrap_or(UNSET);
        writer.write_all(&p.x.to_le_bytes())?;
        writer.write_all(&p.y.to_le_bytes())?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a map file.
///
/// Input starting with [`MAGIC`] is read as the versioned layout. Anything
/// else must be a legacy file for a grid of `legacy_size`.
pub fn decode(bytes: &[u8], legacy_size: Point) -> Result<GridModel, MapFileError> {
    if bytes.len() >= HEADER_SIZE && bytes[..4] == MAGIC {
        let header: Vec<u32> = bytes[4..HEADER_SIZE]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        let (version, width, height) = (header[0], header[1], header[2]);
        if version != VERSION {
            return Err(MapFileError::UnsupportedVersion(version));
        }
        let size = match (i32::try_from(width), i32::try_from(height)) {
            (Ok(w), Ok(h)) if w.checked_mul(h).is_some() => Point::new(w, h),
            _ => return Err(MapFileError::Dimensions { width, height }),
        };
        return decode_body(size, &bytes[HEADER_SIZE..]);
    }
    log::debug!("reading headerless map as {}x{}", legacy_size.x, legacy_size.y);
    decode_body(legacy_size, bytes)
}

fn decode_body(size: Point, body: &[u8]) -> Result<GridModel, MapFileError> {
    let expected = legacy_len(size);
    if body.len() != expected {
        return Err(MapFileError::Length {
            expected,
            actual: body.len(),
        });
    }
    let bounds = Range::new(0, 0, size.x, size.y);
    let mut words = body
        .chunks_exact(RECORD_SIZE)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]));

    let cells = words
        .by_ref()
        .take(bounds.len())
        .enumerate()
        .map(|(index, value)| Cell::from_i32(value).ok_or(MapFileError::InvalidCell { index, value }))
        .collect::<Result<Vec<_>, _>>()?;

    let mut next_point = || match (words.next(), words.next()) {
        (Some(x), Some(y)) => Point::new(x, y),
        _ => UNSET,
    };
    let start = marker(Role::Start, next_point(), bounds, &cells)?;
    let end = marker(Role::End, next_point(), bounds, &cells)?;

    Ok(GridModel::from_raw(bounds, cells, start, end))
}

/// Validate a stored marker against the cell data.
fn marker(role: Role, pos: Point, bounds: Range, cells: &[Cell]) -> Result<Option<Point>, MapFileError> {
    let stored = if pos == UNSET {
        None
    } else if bounds.contains(pos) {
        Some(pos)
    } else {
        return Err(MapFileError::InvalidCoordinate { role, pos });
    };
    let mut marked = cells.iter().enumerate().filter(|(_, c)| **c == role.cell());
    let consistent = match (stored, marked.next(), marked.next()) {
        (None, None, _) => true,
        (Some(p), Some((i, _)), None) => i == (p.y * bounds.width() + p.x) as usize,
        _ => false,
    };
    if !consistent {
        return Err(MapFileError::InconsistentMarker { role });
    }
    Ok(stored)
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Write `grid` to `path` in the versioned layout.
pub fn save_map(path: impl AsRef<Path>, grid: &GridModel) -> Result<(), MapFileError> {
    let path = path.as_ref();
    fs::write(path, encode(grid))?;
    log::info!("saved {}x{} map to {}", grid.width(), grid.height(), path.display());
    Ok(())
}

/// Read and decode the map at `path`. See [`decode`].
pub fn load_map(path: impl AsRef<Path>, legacy_size: Point) -> Result<GridModel, MapFileError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let grid = decode(&bytes, legacy_size)?;
    log::info!("loaded {}x{} map from {}", grid.width(), grid.height(), path.display());
    Ok(grid)
}

/// Local wall-clock time used to name saved maps.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

/// Suggested file name for a map saved at `t`, e.g. `map_2025-03-07_09-05-01.bin`.
pub fn default_map_file_name(t: Timestamp) -> String {
    format!(
        "map_{:04}-{:02}-{:02}_{:02}-{:02}-{:02}.bin",
        t.year, t.month, t.day, t.hour, t.minute, t.second
    )
}
