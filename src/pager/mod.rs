//! Paged, cache-backed on-disk storage for the B+-tree engine.
//!
//! A [`Pager`] owns two sequential page files — a key file and a value
//! file — plus a small text metadata sidecar holding four counters:
//! `num_entries`, `num_value_pages`, `num_key_pages`, `key_root`. Pages are
//! fixed 4096-byte buffers cached in an unbounded per-kind `HashMap`: bulk
//! builds touch the working set repeatedly and an LRU-bounded cache (the
//! historical design) thrashes under that access pattern, so this
//! implementation keeps every page resident for the lifetime of the store
//! instead (see DESIGN.md).

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::OpenMode;
use crate::error::{GraphError, Result};

pub const PAGE_SIZE: usize = 4096;

/// Selects which of the two page files an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Key,
    Value,
}

#[derive(Debug, Clone)]
struct Page {
    data: Vec<u8>,
    dirty: bool,
}

impl Page {
    fn zeroed() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE],
            dirty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Metadata {
    pub num_entries: u32,
    pub num_value_pages: u32,
    pub num_key_pages: u32,
    pub key_root: u32,
}

impl Metadata {
    fn parse(text: &str) -> Result<Self> {
        let mut parts = text.split_whitespace();
        let mut next = || -> Result<u32> {
            parts
                .next()
                .ok_or_else(|| GraphError::Corruption("metadata sidecar truncated".into()))?
                .parse::<u32>()
                .map_err(|e| GraphError::Corruption(format!("metadata sidecar malformed: {e}")))
        };
        Ok(Self {
            num_entries: next()?,
            num_value_pages: next()?,
            num_key_pages: next()?,
            key_root: next()?,
        })
    }

    fn render(&self) -> String {
        format!(
            "{} {} {} {}\n",
            self.num_entries, self.num_value_pages, self.num_key_pages, self.key_root
        )
    }
}

/// Owns the key-file, value-file, and metadata-sidecar handles for one
/// B+-tree store. One store instance per file triple; concurrent instances
/// on the same files are undefined behavior (see spec §5).
pub struct Pager {
    key_file: File,
    value_file: File,
    meta_path: PathBuf,
    mode: OpenMode,
    key_cache: HashMap<u32, Page>,
    value_cache: HashMap<u32, Page>,
    meta: Metadata,
    closed: bool,
}

impl Pager {
    /// Opens (or creates) a store at the given key/value/metadata paths.
    pub fn open(
        key_path: impl AsRef<Path>,
        value_path: impl AsRef<Path>,
        meta_path: impl AsRef<Path>,
        mode: OpenMode,
    ) -> Result<Self> {
        let key_path = key_path.as_ref();
        let value_path = value_path.as_ref();
        let meta_path = meta_path.as_ref().to_path_buf();

        let (key_file, value_file, meta) = match mode {
            OpenMode::CreateNew => {
                let key_file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(key_path)?;
                let value_file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(value_path)?;
                (key_file, value_file, Metadata::default())
            }
            OpenMode::ReadOnly | OpenMode::ReadWrite => {
                let key_file = OpenOptions::new()
                    .read(true)
                    .write(mode == OpenMode::ReadWrite)
                    .open(key_path)?;
                let value_file = OpenOptions::new()
                    .read(true)
                    .write(mode == OpenMode::ReadWrite)
                    .open(value_path)?;
                let text = std::fs::read_to_string(&meta_path)?;
                let meta = Metadata::parse(&text)?;
                (key_file, value_file, meta)
            }
        };

        debug!(?mode, num_entries = meta.num_entries, "pager opened");

        Ok(Self {
            key_file,
            value_file,
            meta_path,
            mode,
            key_cache: HashMap::new(),
            value_cache: HashMap::new(),
            meta,
            closed: false,
        })
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn meta(&self) -> Metadata {
        self.meta
    }

    pub fn num_key_pages(&self) -> u32 {
        self.meta.num_key_pages
    }

    pub fn num_value_pages(&self) -> u32 {
        self.meta.num_value_pages
    }

    pub fn num_entries(&self) -> u32 {
        self.meta.num_entries
    }

    pub fn key_root(&self) -> u32 {
        self.meta.key_root
    }

    pub fn set_key_root(&mut self, page_num: u32) {
        self.meta.key_root = page_num;
    }

    pub fn set_num_entries(&mut self, n: u32) {
        self.meta.num_entries = n;
    }

    fn page_count(&self, kind: PageKind) -> u32 {
        match kind {
            PageKind::Key => self.meta.num_key_pages,
            PageKind::Value => self.meta.num_value_pages,
        }
    }

    fn file_mut(&mut self, kind: PageKind) -> &mut File {
        match kind {
            PageKind::Key => &mut self.key_file,
            PageKind::Value => &mut self.value_file,
        }
    }

    fn cache_mut(&mut self, kind: PageKind) -> &mut HashMap<u32, Page> {
        match kind {
            PageKind::Key => &mut self.key_cache,
            PageKind::Value => &mut self.value_cache,
        }
    }

    fn ensure_cached(&mut self, kind: PageKind, page_num: u32) -> Result<()> {
        if page_num >= self.page_count(kind) {
            return Err(GraphError::OutOfBounds(format!(
                "page {page_num} exceeds {kind:?} page count {}",
                self.page_count(kind)
            )));
        }
        if self.cache_mut(kind).contains_key(&page_num) {
            return Ok(());
        }
        let mut buf = vec![0u8; PAGE_SIZE];
        {
            let file = self.file_mut(kind);
            file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
            file.read_exact(&mut buf)?;
        }
        self.cache_mut(kind).insert(
            page_num,
            Page {
                data: buf,
                dirty: false,
            },
        );
        Ok(())
    }

    /// Returns an immutable view of `page_num`, reading it from disk into
    /// the cache on first access.
    pub fn get_page(&mut self, kind: PageKind, page_num: u32) -> Result<&[u8]> {
        self.ensure_cached(kind, page_num)?;
        Ok(&self.cache_mut(kind).get(&page_num).unwrap().data)
    }

    /// Returns a mutable view of `page_num` and marks it dirty. Fails if
    /// the store is read-only.
    pub fn get_page_mut(&mut self, kind: PageKind, page_num: u32) -> Result<&mut [u8]> {
        if !self.mode.is_writable() {
            return Err(GraphError::InvalidState(
                "cannot write to a read-only store".into(),
            ));
        }
        self.ensure_cached(kind, page_num)?;
        let page = self.cache_mut(kind).get_mut(&page_num).unwrap();
        page.dirty = true;
        Ok(&mut page.data)
    }

    /// Explicitly marks `page_num` dirty without returning its buffer
    /// (useful after obtaining a buffer view separately).
    pub fn mark_dirty(&mut self, kind: PageKind, page_num: u32) -> Result<()> {
        if !self.mode.is_writable() {
            return Err(GraphError::InvalidState(
                "cannot write to a read-only store".into(),
            ));
        }
        self.ensure_cached(kind, page_num)?;
        self.cache_mut(kind).get_mut(&page_num).unwrap().dirty = true;
        Ok(())
    }

    /// Appends a new zeroed page and returns its page number. The page is
    /// not written to disk until [`Pager::flush_all`] runs.
    pub fn append_page(&mut self, kind: PageKind) -> Result<u32> {
        if !self.mode.is_writable() {
            return Err(GraphError::InvalidState(
                "cannot append to a read-only store".into(),
            ));
        }
        let page_num = self.page_count(kind);
        let mut page = Page::zeroed();
        page.dirty = true;
        self.cache_mut(kind).insert(page_num, page);
        match kind {
            PageKind::Key => self.meta.num_key_pages += 1,
            PageKind::Value => self.meta.num_value_pages += 1,
        }
        Ok(page_num)
    }

    /// Writes a single page back to disk immediately, clearing its dirty
    /// flag. Mostly useful for tests; [`Pager::flush_all`] is the normal path.
    pub fn write_page(&mut self, kind: PageKind, page_num: u32) -> Result<()> {
        if !self.mode.is_writable() {
            return Err(GraphError::InvalidState(
                "cannot write to a read-only store".into(),
            ));
        }
        let data = self
            .cache_mut(kind)
            .get(&page_num)
            .map(|p| p.data.clone())
            .ok_or_else(|| {
                GraphError::OutOfBounds(format!("page {page_num} not resident in cache"))
            })?;
        {
            let file = self.file_mut(kind);
            file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
            file.write_all(&data)?;
        }
        if let Some(page) = self.cache_mut(kind).get_mut(&page_num) {
            page.dirty = false;
        }
        Ok(())
    }

    /// Writes back every dirty page, rewrites the metadata sidecar with
    /// current counters, and flushes file handles. No-op on a read-only
    /// store beyond releasing cache buffers.
    pub fn flush_all(&mut self) -> Result<()> {
        if !self.mode.is_writable() {
            debug!("flush_all on read-only store: releasing cache only");
            self.key_cache.clear();
            self.value_cache.clear();
            return Ok(());
        }

        let dirty_key_pages: Vec<u32> = self
            .key_cache
            .iter()
            .filter(|(_, p)| p.dirty)
            .map(|(&n, _)| n)
            .collect();
        for page_num in dirty_key_pages {
            self.write_page(PageKind::Key, page_num)?;
        }
        let dirty_value_pages: Vec<u32> = self
            .value_cache
            .iter()
            .filter(|(_, p)| p.dirty)
            .map(|(&n, _)| n)
            .collect();
        for page_num in dirty_value_pages {
            self.write_page(PageKind::Value, page_num)?;
        }

        self.key_file.flush()?;
        self.value_file.flush()?;

        std::fs::write(&self.meta_path, self.meta.render())?;

        debug!(
            num_entries = self.meta.num_entries,
            num_key_pages = self.meta.num_key_pages,
            num_value_pages = self.meta.num_value_pages,
            "pager flushed"
        );
        Ok(())
    }

    /// Explicit close: flushes (if writable) and marks the store closed so
    /// `Drop` does not attempt a second flush.
    pub fn close(mut self) -> Result<()> {
        let result = self.flush_all();
        self.closed = true;
        result
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.flush_all() {
            warn!(error = %e, "pager flush on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn paths(dir: &Path) -> (PathBuf, PathBuf, PathBuf) {
        (
            dir.join("keys.db"),
            dir.join("values.db"),
            dir.join("meta.txt"),
        )
    }

    #[test]
    fn create_new_starts_at_zero() {
        let dir = tempdir().unwrap();
        let (k, v, m) = paths(dir.path());
        let pager = Pager::open(&k, &v, &m, OpenMode::CreateNew).unwrap();
        assert_eq!(pager.num_key_pages(), 0);
        assert_eq!(pager.num_value_pages(), 0);
    }

    #[test]
    fn append_write_reopen_roundtrip() {
        let dir = tempdir().unwrap();
        let (k, v, m) = paths(dir.path());
        {
            let mut pager = Pager::open(&k, &v, &m, OpenMode::CreateNew).unwrap();
            let page_num = pager.append_page(PageKind::Value).unwrap();
            let buf = pager.get_page_mut(PageKind::Value, page_num).unwrap();
            buf[0] = 42;
            pager.flush_all().unwrap();
        }
        {
            let mut pager = Pager::open(&k, &v, &m, OpenMode::ReadOnly).unwrap();
            assert_eq!(pager.num_value_pages(), 1);
            let buf = pager.get_page(PageKind::Value, 0).unwrap();
            assert_eq!(buf[0], 42);
        }
    }

    #[test]
    fn read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let (k, v, m) = paths(dir.path());
        {
            Pager::open(&k, &v, &m, OpenMode::CreateNew)
                .unwrap()
                .flush_all()
                .unwrap();
        }
        let mut pager = Pager::open(&k, &v, &m, OpenMode::ReadOnly).unwrap();
        assert!(pager.append_page(PageKind::Key).is_err());
    }

    #[test]
    fn out_of_bounds_page_fails() {
        let dir = tempdir().unwrap();
        let (k, v, m) = paths(dir.path());
        let mut pager = Pager::open(&k, &v, &m, OpenMode::CreateNew).unwrap();
        assert!(pager.get_page(PageKind::Key, 0).is_err());
    }

    #[test]
    fn missing_file_in_non_create_mode_fails() {
        let dir = tempdir().unwrap();
        let (k, v, m) = paths(dir.path());
        assert!(Pager::open(&k, &v, &m, OpenMode::ReadWrite).is_err());
    }
}
