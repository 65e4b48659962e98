mod file;

pub use file::SourceFile;

use crate::line_column::Location;
use append_only_vec::AppendOnlyVec;
use std::cell::Cell;
use std::path::PathBuf;

/// Global source position. Every file occupies a contiguous range of
/// positions starting at its base; zero means "no position".
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pos(pub u32);

impl Pos {
    pub const NONE: Pos = Pos(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn offset(self, amount: u32) -> Pos {
        Pos(self.0 + amount)
    }
}

// Shared position map. Files are only ever appended, so handing out `&self`
// everywhere is enough; concurrent mutation is the embedder's problem.
#[derive(Debug)]
pub struct SourceMap {
    files: AppendOnlyVec<SourceFile>,
    next_base: Cell<u32>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self {
            files: AppendOnlyVec::new(),
            next_base: Cell::new(1),
        }
    }

    // Reserves the position range [base, base+len] for the file; the extra
    // slot past the end is the position of its EOF marker.
    pub fn add(&self, name: PathBuf, content: &str) -> &SourceFile {
        let base = self.next_base.get();
        let size = u32::try_from(content.len()).expect("source file fits in the position space");
        self.next_base.set(base + size + 1);

        let index = self.files.push(SourceFile::new(name, base, size, content));
        &self.files[index]
    }

    pub fn file(&self, pos: Pos) -> Option<&SourceFile> {
        if pos.is_none() {
            return None;
        }

        (0..self.files.len())
            .map(|index| &self.files[index])
            .find(|file| file.contains(pos))
    }

    pub fn location(&self, pos: Pos) -> Option<(&SourceFile, Location)> {
        self.file(pos).map(|file| (file, file.location(pos)))
    }
}

impl Default for SourceMap {
    fn default() -> Self {
        Self::new()
    }
}
