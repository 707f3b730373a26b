//! Paged byte store for loaded ZSM streams.
//!
//! `PagedStore` keeps a loaded stream as an ordered sequence of fixed-size,
//! independently allocated pages. This mirrors targets whose address space
//! cannot map a whole file contiguously: the default layout is 16 pages of
//! 32 KiB, giving a 512 KiB ceiling. On unconstrained targets
//! [`PagedStore::load_single_page`] collapses everything into one page.
//!
//! Two access styles are offered:
//!
//! - absolute addressing ([`PagedStore::byte_at`], [`PagedStore::page_tail`],
//!   [`PagedStore::read_at`]) for header access and other non-sequential reads;
//! - a [`Cursor`] that is moved with [`PagedStore::seek`] and consumed with
//!   [`PagedStore::read_and_advance`], rolling over from one page to the next.
//!
//! # Examples
//!
//! ```
//! use zsmplay::store::{PagedStore, SeekOrigin, StoreConfig};
//!
//! let bytes: Vec<u8> = (0..10).collect();
//! let store = PagedStore::load_with_config(
//!     &bytes,
//!     StoreConfig { page_size: 4, max_pages: 16 },
//! )
//! .unwrap();
//! assert_eq!(store.page_count(), 3);
//!
//! let mut cursor = store.cursor();
//! store.seek(&mut cursor, 3, SeekOrigin::Set);
//! assert_eq!(store.read_and_advance(&mut cursor), Some(3));
//! // Rolled over into the second page
//! assert_eq!(store.read_and_advance(&mut cursor), Some(4));
//! assert_eq!(cursor.page(), 1);
//! ```

use crate::error::StoreError;

/// Default page capacity in bytes (2^15).
pub const DEFAULT_PAGE_SIZE: usize = 1 << 15;

/// Default maximum number of pages a store may own.
pub const DEFAULT_MAX_PAGES: usize = 16;

/// Page layout used when loading a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of every page in bytes. Need not be a power of two.
    pub page_size: usize,
    /// Upper bound on the number of pages; exceeding it fails the load.
    pub max_pages: usize,
}

impl StoreConfig {
    /// One page holding `len` bytes, for targets that can map the whole
    /// stream contiguously.
    pub fn single_page(len: usize) -> Self {
        Self {
            page_size: len.max(1),
            max_pages: 1,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Origin used by [`PagedStore::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekOrigin {
    /// Treat the offset as an absolute address.
    Set,
    /// Add the offset to the cursor's current absolute position.
    Current,
}

/// Sequential read position within a [`PagedStore`].
///
/// A cursor is bound to one page at a time. It stays a plain value so the
/// owner of the store decides who may move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    page: usize,
    offset: usize,
    end: usize,
    base: u64,
}

impl Cursor {
    /// Index of the page the cursor is bound to.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Offset of the next byte inside the bound page.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Absolute position of the next byte.
    pub fn position(&self) -> u64 {
        self.base + self.offset as u64
    }

    /// True when the cursor no longer points at a loaded byte.
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.end
    }
}

/// Immutable, paged copy of a loaded byte stream.
#[derive(Debug, Clone)]
pub struct PagedStore {
    pages: Vec<Box<[u8]>>,
    page_size: usize,
    len: usize,
}

impl PagedStore {
    /// Load `bytes` using the default layout (16 pages of 32 KiB).
    pub fn load(bytes: &[u8]) -> Result<Self, StoreError> {
        Self::load_with_config(bytes, StoreConfig::default())
    }

    /// Load `bytes` into a single page sized to fit the whole input.
    pub fn load_single_page(bytes: &[u8]) -> Result<Self, StoreError> {
        Self::load_with_config(bytes, StoreConfig::single_page(bytes.len()))
    }

    /// Load `bytes`, partitioning them into pages of `config.page_size`.
    ///
    /// The last page holds the remainder and may be shorter than the others.
    /// Fails with [`StoreError::OutOfPages`] when more than
    /// `config.max_pages` pages would be needed.
    pub fn load_with_config(bytes: &[u8], config: StoreConfig) -> Result<Self, StoreError> {
        if config.page_size == 0 {
            return Err(StoreError::InvalidPageSize(config.page_size));
        }
        if bytes.is_empty() {
            return Err(StoreError::Empty);
        }

        let needed = bytes.len().div_ceil(config.page_size);
        if needed > config.max_pages {
            return Err(StoreError::OutOfPages {
                needed,
                max: config.max_pages,
            });
        }

        let pages: Vec<Box<[u8]>> = bytes
            .chunks(config.page_size)
            .map(|chunk| chunk.to_vec().into_boxed_slice())
            .collect();

        log::debug!(
            "loaded {} bytes into {} page(s) of {} bytes",
            bytes.len(),
            pages.len(),
            config.page_size
        );

        Ok(Self {
            pages,
            page_size: config.page_size,
            len: bytes.len(),
        })
    }

    /// Total number of loaded bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Always false; a loaded store owns at least one byte.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Configured page capacity.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages owned by the store.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Borrow a whole page.
    pub fn page(&self, index: usize) -> Option<&[u8]> {
        self.pages.get(index).map(|p| &p[..])
    }

    fn locate(&self, offset: u64) -> (usize, usize) {
        let page_size = self.page_size as u64;
        ((offset / page_size) as usize, (offset % page_size) as usize)
    }

    /// Byte at absolute `offset`, or `None` past the end of the stream.
    pub fn byte_at(&self, offset: u32) -> Option<u8> {
        let (page, in_page) = self.locate(offset as u64);
        self.pages.get(page)?.get(in_page).copied()
    }

    /// Remainder of the page that contains absolute `offset`, starting there.
    ///
    /// This is the closest thing to a raw pointer into the store: the slice
    /// ends at the page boundary, not at the end of the stream.
    pub fn page_tail(&self, offset: u32) -> Option<&[u8]> {
        let (page, in_page) = self.locate(offset as u64);
        self.pages
            .get(page)?
            .get(in_page..)
            .filter(|tail| !tail.is_empty())
    }

    /// Copy bytes starting at absolute `offset` into `buf`, crossing page
    /// boundaries as needed. Returns the number of bytes copied.
    pub fn read_at(&self, offset: u32, buf: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < buf.len() {
            let Some(tail) = self.page_tail(offset.saturating_add(copied as u32)) else {
                break;
            };
            let n = tail.len().min(buf.len() - copied);
            buf[copied..copied + n].copy_from_slice(&tail[..n]);
            copied += n;
        }
        copied
    }

    /// A cursor positioned at absolute offset 0.
    pub fn cursor(&self) -> Cursor {
        let mut cursor = Cursor::default();
        self.bind(&mut cursor, 0, 0);
        cursor
    }

    /// Rebind `cursor` to `page`, with `offset` inside it.
    fn bind(&self, cursor: &mut Cursor, page: usize, offset: usize) {
        cursor.page = page;
        cursor.offset = offset;
        cursor.end = self.pages.get(page).map_or(0, |p| p.len());
        cursor.base = page as u64 * self.page_size as u64;
    }

    /// Move `cursor` by `offset` relative to `origin`.
    ///
    /// With [`SeekOrigin::Current`] a target before the start of the stream
    /// is mirrored: position `-n` becomes position `n`. It is not clamped.
    pub fn seek(&self, cursor: &mut Cursor, offset: i32, origin: SeekOrigin) {
        let target = match origin {
            SeekOrigin::Set => offset as u32 as u64,
            SeekOrigin::Current => {
                let position = cursor.position() as i64 + offset as i64;
                position.unsigned_abs()
            }
        };

        let (page, in_page) = self.locate(target);
        self.bind(cursor, page, in_page);
    }

    /// Read the byte under `cursor` and advance by one.
    ///
    /// When the byte read was the last one of its page the cursor rolls over
    /// to the start of the next page. Returns `None` once the cursor has run
    /// past the final page; well-formed streams end with an end-of-stream
    /// command before that happens.
    pub fn read_and_advance(&self, cursor: &mut Cursor) -> Option<u8> {
        let value = *self.pages.get(cursor.page)?.get(cursor.offset)?;

        if cursor.offset + 1 < cursor.end {
            cursor.offset += 1;
        } else {
            self.bind(cursor, cursor.page + 1, 0);
        }

        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paged(len: usize, page_size: usize) -> PagedStore {
        let bytes: Vec<u8> = (0..len).map(|i| i as u8).collect();
        PagedStore::load_with_config(
            &bytes,
            StoreConfig {
                page_size,
                max_pages: usize::MAX,
            },
        )
        .unwrap()
    }

    #[test]
    fn current_seek_mirrors_negative_target() {
        let store = paged(64, 8);
        let mut cursor = store.cursor();
        store.seek(&mut cursor, 3, SeekOrigin::Set);
        store.seek(&mut cursor, -10, SeekOrigin::Current);
        assert_eq!(cursor.position(), 7);
        assert_eq!(store.read_and_advance(&mut cursor), Some(7));
    }

    #[test]
    fn rollover_happens_on_last_byte_of_page() {
        let store = paged(16, 8);
        let mut cursor = store.cursor();
        store.seek(&mut cursor, 6, SeekOrigin::Set);
        store.read_and_advance(&mut cursor);
        assert_eq!((cursor.page(), cursor.offset()), (0, 7));
        store.read_and_advance(&mut cursor);
        assert_eq!((cursor.page(), cursor.offset()), (1, 0));
    }

    #[test]
    fn reading_past_final_page_is_none() {
        let store = paged(5, 4);
        let mut cursor = store.cursor();
        for expected in 0..5u8 {
            assert_eq!(store.read_and_advance(&mut cursor), Some(expected));
        }
        assert!(cursor.is_exhausted());
        assert_eq!(store.read_and_advance(&mut cursor), None);
    }

    #[test]
    fn set_seek_past_end_exhausts_cursor() {
        let store = paged(5, 4);
        let mut cursor = store.cursor();
        store.seek(&mut cursor, 100, SeekOrigin::Set);
        assert!(cursor.is_exhausted());
        assert_eq!(store.read_and_advance(&mut cursor), None);
    }
}
