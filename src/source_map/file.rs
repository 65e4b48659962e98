use super::Pos;
use crate::line_column::Location;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct SourceFile {
    name: PathBuf,
    base: u32,
    size: u32,
    // Byte offsets of line starts within the raw content; always starts
    // with zero. Line splicing does not shift positions, so the raw table
    // stays valid for every token the file produces.
    lines: Vec<u32>,
}

impl SourceFile {
    pub(super) fn new(name: PathBuf, base: u32, size: u32, content: &str) -> Self {
        let mut lines = vec![0];
        let bytes = content.as_bytes();
        for (index, byte) in bytes.iter().enumerate() {
            match byte {
                b'\n' => lines.push(index as u32 + 1),
                b'\r' if bytes.get(index + 1) != Some(&b'\n') => lines.push(index as u32 + 1),
                _ => (),
            }
        }

        Self {
            name,
            base,
            size,
            lines,
        }
    }

    pub fn name(&self) -> &Path {
        &self.name
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    // The EOF marker sits one past the last byte, hence the inclusive end.
    pub fn contains(&self, pos: Pos) -> bool {
        pos.0 >= self.base && pos.0 <= self.base + self.size
    }

    pub fn location(&self, pos: Pos) -> Location {
        debug_assert!(self.contains(pos));
        let offset = pos.0 - self.base;
        let line = self.lines.partition_point(|&start| start <= offset);
        Location::new(line, (offset - self.lines[line - 1] + 1) as usize)
    }
}
