use std::io::{self, Read};

/// Chunk size used when reading entry content from an [`io::Read`].
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// A lazy, finite sequence of byte chunks making up one entry's content.
///
/// Chunks are pulled left to right until `Ok(None)`. A source is consumed by
/// a single entry and never restarted. Empty chunks are permitted and
/// contribute nothing.
pub trait ChunkSource {
    /// Returns the next chunk, or `None` once the content is exhausted.
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>>;
}

impl<S: ChunkSource + ?Sized> ChunkSource for &mut S {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        (**self).next_chunk()
    }
}

/// The whole slice as a single chunk.
impl ChunkSource for &[u8] {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.is_empty() {
            return Ok(None);
        }

        Ok(Some(std::mem::take(self)))
    }
}

/// Adapts an [`io::Read`] into a [`ChunkSource`] with a reusable buffer.
///
/// ```rust
/// use zipstream::{ChunkReader, ChunkSource};
///
/// let mut chunks = ChunkReader::with_chunk_size(&b"hello world"[..], 4);
/// assert_eq!(chunks.next_chunk()?, Some(&b"hell"[..]));
/// assert_eq!(chunks.next_chunk()?, Some(&b"o wo"[..]));
/// assert_eq!(chunks.next_chunk()?, Some(&b"rld"[..]));
/// assert_eq!(chunks.next_chunk()?, None);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct ChunkReader<R> {
    reader: R,
    buf: Vec<u8>,
    done: bool,
}

impl<R> ChunkReader<R> {
    /// Reads `reader` in chunks of [`DEFAULT_CHUNK_SIZE`].
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Reads `reader` in chunks of at most `chunk_size` bytes (at least 1).
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        ChunkReader {
            reader,
            buf: vec![0u8; chunk_size.max(1)],
            done: false,
        }
    }

    /// Consumes the adapter and returns the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> ChunkSource for ChunkReader<R> {
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        if self.done {
            return Ok(None);
        }

        // Fill the buffer as far as the reader allows so that short reads
        // don't translate into tiny chunks.
        let mut filled = 0;
        while filled < self.buf.len() {
            match self.reader.read(&mut self.buf[filled..]) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        if filled == 0 {
            Ok(None)
        } else {
            Ok(Some(&self.buf[..filled]))
        }
    }
}

/// Adapts an iterator of fallible buffers into a [`ChunkSource`].
///
/// ```rust
/// use zipstream::{ChunkSource, IterChunks};
///
/// let parts = vec![Ok(b"ab".to_vec()), Ok(b"c".to_vec())];
/// let mut chunks = IterChunks::new(parts);
/// assert_eq!(chunks.next_chunk()?, Some(&b"ab"[..]));
/// assert_eq!(chunks.next_chunk()?, Some(&b"c"[..]));
/// assert_eq!(chunks.next_chunk()?, None);
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct IterChunks<I, B> {
    iter: I,
    current: Option<B>,
}

impl<I, B> IterChunks<I, B>
where
    I: Iterator<Item = io::Result<B>>,
{
    pub fn new<T>(iter: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        IterChunks {
            iter: iter.into_iter(),
            current: None,
        }
    }
}

impl<I, B> ChunkSource for IterChunks<I, B>
where
    I: Iterator<Item = io::Result<B>>,
    B: AsRef<[u8]>,
{
    fn next_chunk(&mut self) -> io::Result<Option<&[u8]>> {
        self.current = self.iter.next().transpose()?;
        Ok(self.current.as_ref().map(|x| x.as_ref()))
    }
}
