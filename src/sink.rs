use crate::{errors::ErrorKind, Error};
use std::io::{self, Write};

/// A position tracking writer that serializes little-endian integers.
///
/// Every byte accepted by the underlying writer advances [`position`], which
/// the archive writer uses as the current stream offset for all header
/// back-references. Once closed, every write fails with
/// [`ErrorKind::ClosedStream`] and nothing reaches the underlying writer.
///
/// [`position`]: ByteSink::position
#[derive(Debug)]
pub struct ByteSink<W> {
    writer: W,
    count: u64,
    closed: bool,
}

impl<W> ByteSink<W> {
    /// Wraps `writer`, reporting `start` as the initial position.
    pub fn new(writer: W, start: u64) -> Self {
        ByteSink {
            writer,
            count: start,
            closed: false,
        }
    }

    /// Returns the number of bytes written so far (plus the start offset).
    pub fn position(&self) -> u64 {
        self.count
    }

    /// Returns true once [`ByteSink::close`] has succeeded.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consumes the sink and returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ByteSink<W> {
    /// Appends raw bytes.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<(), Error> {
        if self.closed {
            return Err(Error::from(ErrorKind::ClosedStream));
        }

        self.write_all(buf).map_err(Error::io)
    }

    /// Writes the low `width` bytes of `value` in little-endian order.
    ///
    /// Bits above `width` are discarded, so `u64::MAX` yields the all-ones
    /// sentinel for any width.
    pub fn write_uint(&mut self, width: usize, value: u64) -> Result<(), Error> {
        debug_assert!(matches!(width, 1 | 2 | 4 | 8), "unsupported width {width}");
        let bytes = value.to_le_bytes();
        self.write_bytes(&bytes[..width.min(bytes.len())])
    }

    #[inline]
    pub fn write_u16(&mut self, value: u16) -> Result<(), Error> {
        self.write_bytes(&value.to_le_bytes())
    }

    #[inline]
    pub fn write_u32(&mut self, value: u32) -> Result<(), Error> {
        self.write_bytes(&value.to_le_bytes())
    }

    #[inline]
    pub fn write_u64(&mut self, value: u64) -> Result<(), Error> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Flushes the underlying writer and rejects all further writes.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::from(ErrorKind::ClosedStream));
        }

        self.writer.flush().map_err(Error::io)?;
        self.closed = true;
        Ok(())
    }
}

impl<W: Write> Write for ByteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "write to a closed archive",
            ));
        }

        let bytes_written = self.writer.write(buf)?;
        self.count += bytes_written as u64;
        Ok(bytes_written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
