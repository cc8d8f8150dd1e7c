// Byte views, cursors and writers for the binary dictionary format
//
// All integers are stored in the byte order of the machine that compiled the
// dictionary. Header endianness markers reject files from the other order.

use std::fmt;
use std::fs::File;
use std::ops::{Deref, Range};
use std::path::Path;
use std::sync::Arc;

use bytemuck::Pod;
use memmap2::Mmap;

use crate::DictError;

enum Backing {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Backing::Mapped(map) => map,
            Backing::Owned(bytes) => bytes,
        }
    }
}

/// Read-only window into dictionary bytes.
///
/// Cloning is cheap: every clone shares the same mapping or buffer, so
/// sections of one file can hand out sub-views that outlive the loader.
#[derive(Clone)]
pub struct ByteView {
    backing: Arc<Backing>,
    start: usize,
    end: usize,
}

impl ByteView {
    /// Wrap an owned buffer.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let end = bytes.len();
        ByteView {
            backing: Arc::new(Backing::Owned(bytes)),
            start: 0,
            end,
        }
    }

    /// Memory-map a file read-only.
    pub fn map_file(path: impl AsRef<Path>) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only; compiled dictionaries are replaced
        // by writing a new file, never modified in place.
        let map = unsafe { Mmap::map(&file)? };
        let end = map.len();
        Ok(ByteView {
            backing: Arc::new(Backing::Mapped(map)),
            start: 0,
            end,
        })
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.backing[self.start..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether the bytes come from a memory-mapped file.
    pub fn is_mapped(&self) -> bool {
        matches!(*self.backing, Backing::Mapped(_))
    }

    /// Sub-view of `range`, relative to this view.
    pub fn slice(&self, range: Range<usize>) -> Result<ByteView, DictError> {
        if range.start > range.end || range.end > self.len() {
            return Err(DictError::TooShort {
                expected: range.end,
                actual: self.len(),
            });
        }
        Ok(ByteView {
            backing: Arc::clone(&self.backing),
            start: self.start + range.start,
            end: self.start + range.end,
        })
    }

    /// Read one plain value at a byte offset, without alignment requirements.
    pub fn read_at<T: Pod>(&self, offset: usize) -> Result<T, DictError> {
        let size = size_of::<T>();
        let bytes = self
            .as_slice()
            .get(offset..offset + size)
            .ok_or(DictError::TooShort {
                expected: offset + size,
                actual: self.len(),
            })?;
        Ok(bytemuck::pod_read_unaligned(bytes))
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteView")
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Sequential reader over a [`ByteView`].
///
/// Sections of a dictionary file have no index; each structure is read in
/// the order it was written.
#[derive(Debug, Clone)]
pub struct Cursor {
    view: ByteView,
    pos: usize,
}

impl Cursor {
    pub fn new(view: ByteView) -> Self {
        Cursor { view, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.view.len() - self.pos
    }

    fn advance(&mut self, len: usize) -> Result<Range<usize>, DictError> {
        let end = self.pos.checked_add(len).ok_or(DictError::TooShort {
            expected: usize::MAX,
            actual: self.view.len(),
        })?;
        if end > self.view.len() {
            return Err(DictError::TooShort {
                expected: end,
                actual: self.view.len(),
            });
        }
        let range = self.pos..end;
        self.pos = end;
        Ok(range)
    }

    /// Read one plain value.
    pub fn read<T: Pod>(&mut self) -> Result<T, DictError> {
        let range = self.advance(size_of::<T>())?;
        Ok(bytemuck::pod_read_unaligned(&self.view.as_slice()[range]))
    }

    /// Read an `i32` element count, rejecting negative values.
    pub fn read_count(&mut self) -> Result<usize, DictError> {
        let count = self.read::<i32>()?;
        usize::try_from(count).map_err(|_| DictError::Corrupt(format!("negative count {count}")))
    }

    /// Copy `count` plain values out of the view.
    pub fn read_array<T: Pod>(&mut self, count: usize) -> Result<Vec<T>, DictError> {
        let len = count.checked_mul(size_of::<T>()).ok_or(DictError::TooShort {
            expected: usize::MAX,
            actual: self.view.len(),
        })?;
        let range = self.advance(len)?;
        Ok(self.view.as_slice()[range]
            .chunks_exact(size_of::<T>())
            .map(|chunk| bytemuck::pod_read_unaligned::<T>(chunk))
            .collect())
    }

    /// View the next `count` plain values in place.
    pub fn read_pod_array<T: Pod>(&mut self, count: usize) -> Result<PodArray<T>, DictError> {
        let len = count.checked_mul(size_of::<T>()).ok_or(DictError::TooShort {
            expected: usize::MAX,
            actual: self.view.len(),
        })?;
        Ok(PodArray {
            storage: PodStorage::Mapped(self.read_view(len)?),
        })
    }

    /// Borrow the next `len` bytes as a shared sub-view.
    pub fn read_view(&mut self, len: usize) -> Result<ByteView, DictError> {
        let range = self.advance(len)?;
        self.view.slice(range)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DictError> {
        self.advance(len).map(|_| ())
    }

    /// Skip the zero padding written by [`ByteWriter::pad_to`].
    pub fn skip_padding(&mut self, align: usize) -> Result<(), DictError> {
        self.skip(padding_for(self.pos, align))
    }
}

#[derive(Clone)]
enum PodStorage<T> {
    Owned(Vec<T>),
    Mapped(ByteView),
}

/// A run of plain values: owned when built, read in place when loaded.
#[derive(Clone)]
pub struct PodArray<T> {
    storage: PodStorage<T>,
}

impl<T: Pod> PodArray<T> {
    pub fn from_vec(values: Vec<T>) -> Self {
        PodArray {
            storage: PodStorage::Owned(values),
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            PodStorage::Owned(values) => values.len(),
            PodStorage::Mapped(view) => view.len() / size_of::<T>(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<T, DictError> {
        let len = self.len();
        if index >= len {
            return Err(DictError::IndexOutOfBounds { index, len });
        }
        match &self.storage {
            PodStorage::Owned(values) => Ok(values[index]),
            PodStorage::Mapped(view) => view.read_at(index * size_of::<T>()),
        }
    }

    /// Copy of the values in `range`.
    pub fn get_range(&self, range: Range<usize>) -> Result<Vec<T>, DictError> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(DictError::IndexOutOfBounds {
                index: range.end,
                len,
            });
        }
        match &self.storage {
            PodStorage::Owned(values) => Ok(values[range].to_vec()),
            PodStorage::Mapped(view) => {
                let size = size_of::<T>();
                Ok(view.as_slice()[range.start * size..range.end * size]
                    .chunks_exact(size)
                    .map(bytemuck::pod_read_unaligned::<T>)
                    .collect())
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<T, DictError>> + '_ {
        (0..self.len()).map(|index| self.get(index))
    }

    /// Whether the values are read from a dictionary view.
    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, PodStorage::Mapped(_))
    }
}

impl<T: Pod> fmt::Debug for PodArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PodArray")
            .field("len", &self.len())
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Growable output buffer for serializing dictionary sections.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn put<T: Pod>(&mut self, value: T) {
        self.buf.extend_from_slice(bytemuck::bytes_of(&value));
    }

    pub fn put_slice<T: Pod>(&mut self, values: &[T]) {
        self.buf.extend_from_slice(bytemuck::cast_slice(values));
    }

    pub fn put_array<T: Pod>(&mut self, values: &PodArray<T>) {
        match &values.storage {
            PodStorage::Owned(values) => self.put_slice(values),
            PodStorage::Mapped(view) => self.buf.extend_from_slice(view.as_slice()),
        }
    }

    /// Write an element count as `i32`.
    pub fn put_count(&mut self, count: usize) -> Result<(), DictError> {
        let count = i32::try_from(count)
            .map_err(|_| DictError::Corrupt(format!("count {count} exceeds the i32 range")))?;
        self.put(count);
        Ok(())
    }

    /// Append zero bytes up to the next multiple of `align`.
    pub fn pad_to(&mut self, align: usize) {
        let padding = padding_for(self.buf.len(), align);
        self.buf.resize(self.buf.len() + padding, 0);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Finish writing and expose the result as a readable view.
    pub fn into_view(self) -> ByteView {
        ByteView::from_vec(self.buf)
    }
}

fn padding_for(pos: usize, align: usize) -> usize {
    (align - pos % align) % align
}
