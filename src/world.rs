use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::debug;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_kit::fonts::{FontSearcher, FontSlot, Fonts};

/// Font book + slots, searched once and shared by every opened document.
pub struct FontCache {
    book: LazyHash<FontBook>,
    fonts: Vec<FontSlot>,
}

impl FontCache {
    pub fn new() -> Self {
        let Fonts { book, fonts } = FontSearcher::new().include_system_fonts(true).search();
        debug!("fonts: {} faces available", fonts.len());
        Self {
            book: LazyHash::new(book),
            fonts,
        }
    }
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The Typst world for one document on disk.
///
/// The document's directory is the project root: imports, images and data
/// files resolve relative to it. Packages are not available.
pub struct DocumentWorld {
    library: LazyHash<Library>,
    fonts: Arc<FontCache>,
    root: PathBuf,
    main_id: FileId,
    sources: Mutex<HashMap<FileId, Source>>,
}

impl DocumentWorld {
    /// Create a world whose main file is `path`.
    ///
    /// Fails when the file cannot be read; the main source is loaded eagerly
    /// so a missing document is reported before compilation.
    pub fn new(path: &Path, fonts: Arc<FontCache>) -> FileResult<Self> {
        let absolute = path
            .canonicalize()
            .map_err(|e| FileError::from_io(e, path))?;
        let root = absolute
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let vpath = VirtualPath::within_root(&absolute, &root)
            .ok_or_else(|| FileError::NotFound(absolute.clone()))?;
        let main_id = FileId::new(None, vpath);

        let world = Self {
            library: LazyHash::new(Library::default()),
            fonts,
            root,
            main_id,
            sources: Mutex::new(HashMap::new()),
        };
        world.source(main_id)?;
        Ok(world)
    }

    fn resolve(&self, id: FileId) -> FileResult<PathBuf> {
        if id.package().is_some() {
            return Err(FileError::NotFound(
                id.vpath().as_rootless_path().to_path_buf(),
            ));
        }
        id.vpath()
            .resolve(&self.root)
            .ok_or(FileError::AccessDenied)
    }

    fn read(&self, id: FileId) -> FileResult<Vec<u8>> {
        let path = self.resolve(id)?;
        std::fs::read(&path).map_err(|e| FileError::from_io(e, &path))
    }
}

impl World for DocumentWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.fonts.book
    }

    fn main(&self) -> FileId {
        self.main_id
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        let mut sources = self.sources.lock().map_err(|_| FileError::Other(None))?;
        if let Some(source) = sources.get(&id) {
            return Ok(source.clone());
        }
        let bytes = self.read(id)?;
        let text = String::from_utf8(bytes).map_err(|_| FileError::InvalidUtf8)?;
        let source = Source::new(id, text);
        sources.insert(id, source.clone());
        Ok(source)
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        self.read(id).map(Bytes::new)
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.fonts.get(index)?.get()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        None
    }
}
