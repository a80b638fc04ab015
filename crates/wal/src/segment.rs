// SPDX-License-Identifier: MIT

//! On-disk segment files: newline-delimited JSON entries. A closed segment
//! is never appended to again; only the active segment grows.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

pub fn segment_path(dir: &Path, id: u64) -> PathBuf {
    dir.join(format!("segment-{id}.wal"))
}

/// Append-only handle onto one segment file. Idempotent to open: creating
/// over an existing segment (e.g. resuming an interrupted rotation) reopens
/// it for append rather than truncating it.
pub struct SegmentWriter {
    file: File,
    size: u64,
}

impl SegmentWriter {
    pub fn open(dir: &Path, id: u64) -> io::Result<Self> {
        let path = segment_path(dir, id);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let size = file.metadata()?.len();
        Ok(Self { file, size })
    }

    pub fn append_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.file, "{line}")?;
        self.file.sync_all()?;
        self.size += line.len() as u64 + 1;
        Ok(())
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Read every line of a segment as raw text, in file order. Missing
/// segment files (pruned or never created) read as empty.
pub fn read_segment_lines(dir: &Path, id: u64) -> io::Result<Vec<String>> {
    let path = segment_path(dir, id);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

pub fn remove_segment(dir: &Path, id: u64) -> io::Result<()> {
    let path = segment_path(dir, id);
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}
