use crate::Core::error::{Error, Result};

/// Inline capacity used when a buffer type does not name one.
pub const DEFAULT_INLINE: usize = 64;

/// Byte sink the codec encodes into.
pub trait Writer {
    /// Append `bytes` at the end of the written region.
    fn write(&mut self, bytes: &[u8]) -> Result<()>;

    /// Make room for at least `additional` more bytes.
    fn reserve(&mut self, additional: usize) -> Result<()>;
}

/// A message that can travel through a queue.
///
/// The empty frame is reserved as the shutdown sentinel of a consumer loop.
pub trait Frame: Writer + Default + Send + 'static {
    fn as_bytes(&self) -> &[u8];

    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Writer for Vec<u8> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        Writer::reserve(self, bytes.len())?;
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        self.try_reserve(additional).map_err(|_| Error::Alloc {
            requested: self.len().saturating_add(additional),
        })
    }
}

impl Frame for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

#[derive(Clone)]
enum Storage<const N: usize> {
    Inline { bytes: [u8; N], len: usize },
    Heap(Vec<u8>),
}

/// Growable byte buffer that keeps up to `N` bytes inline.
///
/// The first write past `N` moves the contents to a heap allocation of
/// `max(needed, 2 * N)` bytes; later growth is exact. A promoted buffer
/// stays on the heap for the rest of its life.
#[derive(Clone)]
pub struct HybridBuffer<const N: usize = DEFAULT_INLINE> {
    storage: Storage<N>,
}

impl<const N: usize> HybridBuffer<N> {
    pub const INLINE_CAPACITY: usize = N;

    pub const fn new() -> Self {
        Self {
            storage: Storage::Inline { bytes: [0; N], len: 0 },
        }
    }

    /// Build a buffer holding a copy of `bytes`.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut buffer = Self::new();
        buffer.write(bytes)?;
        Ok(buffer)
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Inline { len, .. } => *len,
            Storage::Heap(heap) => heap.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes that can be held before the next allocation.
    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Inline { .. } => N,
            Storage::Heap(heap) => heap.capacity(),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self.storage, Storage::Inline { .. })
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Inline { bytes, len } => &bytes[..*len],
            Storage::Heap(heap) => heap,
        }
    }

    /// The finished message contents.
    pub fn finalize(&self) -> &[u8] {
        self.as_bytes()
    }

    /// Forget the contents but keep the current storage.
    pub fn clear(&mut self) {
        match &mut self.storage {
            Storage::Inline { len, .. } => *len = 0,
            Storage::Heap(heap) => heap.clear(),
        }
    }

    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let needed = self.required(data.len())?;
        if needed > self.capacity() {
            self.grow_to(needed)?;
        }
        match &mut self.storage {
            Storage::Inline { bytes, len } => {
                bytes[*len..needed].copy_from_slice(data);
                *len = needed;
            }
            Storage::Heap(heap) => heap.extend_from_slice(data),
        }
        Ok(())
    }

    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        let needed = self.required(additional)?;
        if needed > self.capacity() {
            self.grow_to(needed)?;
        }
        Ok(())
    }

    fn required(&self, additional: usize) -> Result<usize> {
        self.len().checked_add(additional).ok_or(Error::Alloc {
            requested: usize::MAX,
        })
    }

    fn grow_to(&mut self, needed: usize) -> Result<()> {
        let promoted = match &mut self.storage {
            Storage::Inline { bytes, len } => {
                let target = needed.max(2 * N);
                let mut heap = Vec::new();
                heap.try_reserve_exact(target)
                    .map_err(|_| Error::Alloc { requested: target })?;
                heap.extend_from_slice(&bytes[..*len]);
                Some(heap)
            }
            Storage::Heap(heap) => {
                let additional = needed - heap.len();
                heap.try_reserve_exact(additional)
                    .map_err(|_| Error::Alloc { requested: needed })?;
                None
            }
        };
        if let Some(heap) = promoted {
            self.storage = Storage::Heap(heap);
        }
        Ok(())
    }
}

impl<const N: usize> Default for HybridBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PartialEq for HybridBuffer<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for HybridBuffer<N> {}

impl<const N: usize> AsRef<[u8]> for HybridBuffer<N> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<const N: usize> Writer for HybridBuffer<N> {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        HybridBuffer::write(self, bytes)
    }

    fn reserve(&mut self, additional: usize) -> Result<()> {
        HybridBuffer::reserve(self, additional)
    }
}

impl<const N: usize> Frame for HybridBuffer<N> {
    fn as_bytes(&self) -> &[u8] {
        HybridBuffer::as_bytes(self)
    }
}
