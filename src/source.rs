use crate::interner::Name;
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// An input to the preprocessor. After the first tokenisation the encoded
/// chunk list is stored back through `cache`, so including the same source
/// again skips the lexer entirely.
pub trait Source {
    fn name(&self) -> &Path;

    fn size(&self) -> std::io::Result<u64>;

    fn open(&self) -> std::io::Result<Box<dyn Read>>;

    fn cached(&self) -> Option<Rc<Vec<Name>>>;

    fn cache(&self, chunks: Rc<Vec<Name>>);
}

/// Logically process-wide cache of tokenised files, keyed by path. Shared
/// by every `FileSource` a preprocessor hands out; single-threaded by the
/// concurrency model, hence the plain `Rc<RefCell>`.
#[derive(Debug, Default)]
pub struct SourceCache {
    files: RefCell<HashMap<PathBuf, Rc<Vec<Name>>>>,
}

impl SourceCache {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn get(&self, path: &Path) -> Option<Rc<Vec<Name>>> {
        self.files.borrow().get(path).cloned()
    }

    fn insert(&self, path: PathBuf, chunks: Rc<Vec<Name>>) {
        self.files.borrow_mut().insert(path, chunks);
    }
}

pub struct FileSource {
    path: PathBuf,
    cache: Rc<SourceCache>,
}

impl FileSource {
    pub fn new(path: PathBuf, cache: Rc<SourceCache>) -> Self {
        Self { path, cache }
    }
}

impl Source for FileSource {
    fn name(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> std::io::Result<u64> {
        Ok(std::fs::metadata(&self.path)?.len())
    }

    fn open(&self) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(std::fs::File::open(&self.path)?))
    }

    fn cached(&self) -> Option<Rc<Vec<Name>>> {
        self.cache.get(&self.path)
    }

    fn cache(&self, chunks: Rc<Vec<Name>>) {
        self.cache.insert(self.path.clone(), chunks);
    }
}

/// In-memory source for tests and predefined-macro injection; never cached.
pub struct StringSource {
    name: PathBuf,
    contents: String,
}

impl StringSource {
    pub fn new(name: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

impl Source for StringSource {
    fn name(&self) -> &Path {
        &self.name
    }

    fn size(&self) -> std::io::Result<u64> {
        Ok(self.contents.len() as u64)
    }

    fn open(&self) -> std::io::Result<Box<dyn Read>> {
        Ok(Box::new(std::io::Cursor::new(self.contents.clone())))
    }

    fn cached(&self) -> Option<Rc<Vec<Name>>> {
        None
    }

    fn cache(&self, _chunks: Rc<Vec<Name>>) {}
}
