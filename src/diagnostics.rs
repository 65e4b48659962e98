use crate::error::{ErrorKind, PreprocessorError};
use crate::source_map::{Pos, SourceMap};
use append_only_vec::AppendOnlyVec;

// Non-fatal problems accumulate here and are reported together once
// preprocessing finishes; pushing takes only a shared reference.
pub struct Diagnostics {
    collected: AppendOnlyVec<PreprocessorError>,
}

impl std::fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Diagnostics")
            .field("count", &self.collected.len())
            .finish()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            collected: AppendOnlyVec::new(),
        }
    }

    pub fn error(&self, pos: Pos, kind: ErrorKind) {
        self.collected.push(kind.at(pos));
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreprocessorError> {
        self.collected.iter()
    }

    pub fn show_all(&self, map: &SourceMap) -> String {
        let mut rendered = String::new();
        for diagnostic in self.iter() {
            diagnostic
                .show(&mut rendered, map)
                .expect("writing to a string cannot fail");
            rendered.push('\n');
        }
        rendered
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}
