use crate::Core::error::{Error, Result};

/// Cursor over a received byte span.
///
/// Every read is bounds-checked; running past the end yields
/// [`Error::Truncated`] and leaves the cursor where it was.
#[derive(Clone, Copy)]
pub struct MessageView<'a> {
    data: &'a [u8],
    cursor: usize,
}

impl<'a> MessageView<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }

    /// Take the next `n` bytes.
    pub fn read(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(Error::truncated(n, remaining));
        }
        let start = self.cursor;
        self.cursor += n;
        Ok(&self.data[start..self.cursor])
    }

    /// Take the next `N` bytes as an array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread bytes, without consuming them.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.cursor..]
    }
}
