//! Coordinate-offset probe.
//!
//! Survey coordinates in FPN files are routinely in the 1e8 range. The offset
//! is the component-wise minimum over the first valid `NODE` records and is
//! subtracted from every node during the main pass.

use std::io;
use std::path::Path;

use encoding_rs::Encoding;
use serde::Serialize;
use tracing::debug;

use crate::error::{FpnError, Result};
use crate::keyword::{Keyword, LineClass, classify};
use crate::lines::DecodedLines;
use crate::record::decode_node_line;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CoordinateOffset {
    pub offset: [f64; 3],
    /// Number of valid `NODE` records the minimum was taken over.
    pub sample_size: usize,
}

impl CoordinateOffset {
    pub fn apply(&self, x: f64, y: f64, z: f64) -> [f64; 3] {
        [x - self.offset[0], y - self.offset[1], z - self.offset[2]]
    }
}

/// Scan `path` for up to `limit` valid `NODE` records and return their
/// component-wise minimum, or the zero vector when none are found.
pub fn compute_coordinate_offset(
    path: impl AsRef<Path>,
    encoding: &'static Encoding,
    limit: usize,
) -> Result<CoordinateOffset> {
    let path = path.as_ref();
    let lines = DecodedLines::open(path, encoding)?;
    let offset = probe_coordinate_offset(lines, limit).map_err(|e| FpnError::io(path, e))?;
    debug!(
        path = %path.display(),
        offset = ?offset.offset,
        samples = offset.sample_size,
        "computed coordinate offset"
    );
    Ok(offset)
}

/// Same as [`compute_coordinate_offset`] over an already decoded line stream.
pub fn probe_coordinate_offset<I>(lines: I, limit: usize) -> io::Result<CoordinateOffset>
where
    I: IntoIterator<Item = io::Result<String>>,
{
    let mut min = [f64::INFINITY; 3];
    let mut sample_size = 0usize;

    for line in lines {
        if sample_size >= limit {
            break;
        }
        let line = line?;
        if classify(&line, false) != LineClass::Record(Keyword::Node) {
            continue;
        }
        let Ok(node) = decode_node_line(line.trim()) else {
            continue;
        };
        min[0] = min[0].min(node.x);
        min[1] = min[1].min(node.y);
        min[2] = min[2].min(node.z);
        sample_size += 1;
    }

    if sample_size == 0 {
        return Ok(CoordinateOffset::default());
    }
    Ok(CoordinateOffset {
        offset: min,
        sample_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lines(raw: &str) -> impl Iterator<Item = io::Result<String>> + '_ {
        raw.lines().map(|l| Ok(l.to_string()))
    }

    #[test]
    fn takes_componentwise_minimum() {
        let raw = "\
NODE , 1, 500.0, 20.0, -3.0
NODE , 2, 100.0, 80.0, 4.0
TETRA, 1, 1, 1, 2, 3, 4
NODE , 3, 300.0, 10.0, 9.0
";
        let offset = probe_coordinate_offset(lines(raw), 1000).unwrap();
        assert_eq!(offset.offset, [100.0, 10.0, -3.0]);
        assert_eq!(offset.sample_size, 3);
        assert_eq!(offset.apply(500.0, 20.0, -3.0), [400.0, 10.0, 0.0]);
    }

    #[test]
    fn invalid_node_lines_do_not_count_toward_the_window() {
        let raw = "\
NODE , abc, 1.0, 1.0, 1.0
NODE , 1, 50.0, 50.0, 50.0
NODE , 2, 10.0, 10.0, 10.0
";
        let offset = probe_coordinate_offset(lines(raw), 1).unwrap();
        assert_eq!(offset.offset, [50.0, 50.0, 50.0]);
        assert_eq!(offset.sample_size, 1);
    }

    #[test]
    fn no_nodes_gives_zero_offset() {
        let offset = probe_coordinate_offset(lines("MSET, 1, Soil\n"), 1000).unwrap();
        assert_eq!(offset.offset, [0.0; 3]);
        assert_eq!(offset.sample_size, 0);
    }

    #[test]
    fn nodes_past_the_window_are_ignored() {
        let mut raw = String::new();
        for i in 1..=1000 {
            raw.push_str(&format!("NODE , {i}, {}, 5.0, 5.0\n", 1000.0 + i as f64));
        }
        raw.push_str("NODE , 1001, -1.0, -1.0, -1.0\n");
        let offset = probe_coordinate_offset(lines(&raw), 1000).unwrap();
        assert_eq!(offset.offset, [1001.0, 5.0, 5.0]);
    }

    #[test]
    fn reads_from_file_with_detected_encoding() {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(b"\xEF\xBB\xBFNODE , 1, 7.0, 8.0, 9.0\n").unwrap();
        let offset = compute_coordinate_offset(file.path(), encoding_rs::UTF_8, 1000)
            .expect("probe should succeed");
        assert_eq!(offset.offset, [7.0, 8.0, 9.0]);
    }
}
