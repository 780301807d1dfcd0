//! Outgoing request buffers.
//!
//! # Responsibilities
//! - Own the scratch bytes a builder formats the request head into
//! - Keep the ordered fragments that make up the wire message
//! - Write those fragments, in order, to a blocking or async sink
//!
//! # Design Decisions
//! - Payloads are borrowed, never copied; the borrow checker enforces that
//!   they outlive the buffer
//! - Scratch space is sized up front and writes past it are an error
//! - Not `Clone`: one owner per outgoing message

use std::io::{self, IoSlice, Write};
use std::ops::Range;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::error::RequestError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Fragment<'a> {
    /// Bytes inside the buffer's own scratch region.
    Scratch(Range<usize>),
    /// Bytes owned by the caller (usually the message payload).
    Borrowed(&'a [u8]),
}

/// A wire-ready request: owned scratch bytes plus an ordered fragment list.
#[derive(Debug)]
pub struct RequestData<'a> {
    mem: Box<[u8]>,
    used: usize,
    fragments: Vec<Fragment<'a>>,
}

impl<'a> RequestData<'a> {
    /// Create a buffer with `mem_size` bytes of scratch space.
    pub fn new(mem_size: usize) -> Self {
        Self {
            mem: vec![0u8; mem_size].into_boxed_slice(),
            used: 0,
            fragments: Vec::new(),
        }
    }

    /// Start writing into the unused tail of the scratch region.
    ///
    /// The written bytes become a fragment when the writer is committed.
    pub fn scratch(&mut self) -> ScratchWriter<'_, 'a> {
        let start = self.used;
        ScratchWriter {
            mem: &mut self.mem,
            used: &mut self.used,
            fragments: &mut self.fragments,
            start,
        }
    }

    /// Append a caller-owned fragment.
    pub fn add_fragment(&mut self, bytes: &'a [u8]) {
        self.fragments.push(Fragment::Borrowed(bytes));
    }

    /// Iterate over the fragments in wire order.
    pub fn parts(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.fragments.iter().map(move |fragment| match fragment {
            Fragment::Scratch(range) => &self.mem[range.clone()],
            Fragment::Borrowed(bytes) => *bytes,
        })
    }

    /// Fragments as `IoSlice`s for vectored writes.
    pub fn io_slices(&self) -> Vec<IoSlice<'_>> {
        self.parts().map(IoSlice::new).collect()
    }

    /// Number of fragments.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Total number of wire bytes.
    pub fn len(&self) -> usize {
        self.parts().map(<[u8]>::len).sum()
    }

    /// Whether the request has no wire bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the scratch region.
    pub fn scratch_capacity(&self) -> usize {
        self.mem.len()
    }

    /// Concatenate every fragment into one owned buffer.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for part in self.parts() {
            out.extend_from_slice(part);
        }
        out
    }

    /// Take the written part of the scratch region, dropping the fragment list.
    pub fn into_scratch(self) -> Vec<u8> {
        let mut bytes = self.mem.into_vec();
        bytes.truncate(self.used);
        bytes
    }

    /// Write every fragment, in order, to a blocking sink.
    pub fn send_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for part in self.parts() {
            out.write_all(part)?;
        }
        Ok(())
    }

    /// Write every fragment, in order, to an async sink.
    pub async fn send_to_async<W: AsyncWrite + Unpin + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        for part in self.parts() {
            out.write_all(part).await?;
        }
        Ok(())
    }
}

/// Bounds-checked cursor over the free scratch space of a [`RequestData`].
pub struct ScratchWriter<'b, 'a> {
    mem: &'b mut [u8],
    used: &'b mut usize,
    fragments: &'b mut Vec<Fragment<'a>>,
    start: usize,
}

impl ScratchWriter<'_, '_> {
    /// Append raw bytes.
    pub fn put(&mut self, bytes: &[u8]) -> Result<(), RequestError> {
        let end = *self.used + bytes.len();
        if end > self.mem.len() {
            return Err(RequestError::ScratchOverflow {
                needed: end,
                capacity: self.mem.len(),
            });
        }
        self.mem[*self.used..end].copy_from_slice(bytes);
        *self.used = end;
        Ok(())
    }

    /// Append a string.
    pub fn put_str(&mut self, s: &str) -> Result<(), RequestError> {
        self.put(s.as_bytes())
    }

    /// Append a decimal number.
    pub fn put_decimal(&mut self, value: usize) -> Result<(), RequestError> {
        self.put(value.to_string().as_bytes())
    }

    /// Bytes written by this writer so far.
    pub fn written(&self) -> usize {
        *self.used - self.start
    }

    /// Size of the whole scratch region.
    pub fn capacity(&self) -> usize {
        self.mem.len()
    }

    /// Turn everything written so far into a fragment.
    pub fn commit(self) {
        if *self.used > self.start {
            self.fragments.push(Fragment::Scratch(self.start..*self.used));
        }
    }
}

impl Write for ScratchWriter<'_, '_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put(buf)
            .map_err(|e| io::Error::new(io::ErrorKind::WriteZero, e))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_keep_append_order() {
        let payload = b"body".to_vec();
        let mut req = RequestData::new(16);
        let mut out = req.scratch();
        out.put_str("head:").unwrap();
        out.commit();
        req.add_fragment(&payload);
        let mut out = req.scratch();
        out.put_str(":tail").unwrap();
        out.commit();

        assert_eq!(req.fragment_count(), 3);
        assert_eq!(req.to_vec(), b"head:body:tail");
        assert_eq!(req.len(), 14);
    }

    #[test]
    fn borrowed_fragment_is_not_copied() {
        let payload = b"q=1".to_vec();
        let mut req = RequestData::new(0);
        req.add_fragment(&payload);
        let part = req.parts().next().unwrap();
        assert_eq!(part.as_ptr(), payload.as_ptr());
    }

    #[test]
    fn scratch_overflow_is_reported() {
        let mut req = RequestData::new(4);
        let mut out = req.scratch();
        out.put_str("abc").unwrap();
        assert_eq!(
            out.put_str("de"),
            Err(RequestError::ScratchOverflow { needed: 5, capacity: 4 })
        );
        assert_eq!(out.written(), 3);
    }

    #[test]
    fn empty_writer_adds_no_fragment() {
        let mut req = RequestData::new(8);
        req.scratch().commit();
        assert_eq!(req.fragment_count(), 0);
        assert!(req.is_empty());
    }

    #[test]
    fn send_to_writes_all_parts() {
        let payload = b"world".to_vec();
        let mut req = RequestData::new(8);
        let mut out = req.scratch();
        out.put_str("hello ").unwrap();
        out.commit();
        req.add_fragment(&payload);

        let mut sink = Vec::new();
        req.send_to(&mut sink).unwrap();
        assert_eq!(sink, b"hello world");
        assert_eq!(req.io_slices().len(), 2);
    }

    #[test]
    fn into_scratch_keeps_written_bytes() {
        let mut req = RequestData::new(32);
        let mut out = req.scratch();
        out.put_str("Content-Length: ").unwrap();
        out.put_decimal(42).unwrap();
        out.commit();
        assert_eq!(req.into_scratch(), b"Content-Length: 42");
    }

    #[tokio::test]
    async fn send_to_async_writes_all_parts() {
        let payload = b"payload".to_vec();
        let mut req = RequestData::new(8);
        let mut out = req.scratch();
        out.put_str("head ").unwrap();
        out.commit();
        req.add_fragment(&payload);

        let mut sink = Vec::new();
        req.send_to_async(&mut sink).await.unwrap();
        assert_eq!(sink, b"head payload");
    }
}
