use crate::{
    chunks::{ChunkReader, ChunkSource, DEFAULT_CHUNK_SIZE},
    crc::Crc32,
    errors::ErrorKind,
    path::ArchivePath,
    sink::ByteSink,
    time::{DosDateTime, UtcDateTime},
    Error,
};
use std::io::{Read, Write};

// Record signatures
const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014b50;
const END_OF_CENTRAL_DIR_SIGNATURE64: u32 = 0x06064b50;
const END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE: u32 = 0x07064b50;
const END_OF_CENTRAL_DIR_SIGNATURE: u32 = 0x06054b50;

// ZIP64 constants
const ZIP64_EXTRA_FIELD_ID: u16 = 0x0001;
const ZIP64_VERSION: u16 = 45; // 4.5, also used for "version made by" (host 0)
const ZIP64_EOCD_SIZE: u64 = 56;
const ZIP64_EXTRA_SIZES_LEN: u16 = 16; // uncompressed + compressed size
const ZIP64_EXTRA_OFFSET_LEN: u16 = 8;

// General purpose bit flags
const FLAG_DATA_DESCRIPTOR: u16 = 0x08; // bit 3: data descriptor present
const FLAG_UTF8_ENCODING: u16 = 0x800; // bit 11: UTF-8 encoding flag (EFS)
const ENTRY_FLAGS: u16 = FLAG_DATA_DESCRIPTOR | FLAG_UTF8_ENCODING;

const COMPRESSION_STORE: u16 = 0;

/// Written to fixed width fields whose real value lives in a ZIP64 record.
/// Truncation to the field width yields 0xFFFF / 0xFFFFFFFF.
const SENTINEL: u64 = u64::MAX;

const ZIP64_THRESHOLD_OFFSET: u64 = u32::MAX as u64;

/// Builds a [`ZipStreamWriter`].
///
/// ```rust
/// use zipstream::{time::UtcDateTime, ZipStreamWriterBuilder};
///
/// let pinned = UtcDateTime::from_components(2024, 1, 1, 0, 0, 0, 0).unwrap();
/// let mut archive = ZipStreamWriterBuilder::new()
///     .chunk_size(64 * 1024)
///     .default_modification_time(pinned)
///     .build(Vec::new());
/// archive.add_reader("hello.txt", &b"Hello, world!"[..], Default::default())?;
/// let output = archive.finish()?;
/// assert_eq!(&output[..4], b"PK\x03\x04");
/// # Ok::<(), zipstream::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ZipStreamWriterBuilder {
    count: u64,
    chunk_size: usize,
    default_modification_time: Option<UtcDateTime>,
}

impl ZipStreamWriterBuilder {
    /// Creates a new `ZipStreamWriterBuilder`.
    pub fn new() -> Self {
        ZipStreamWriterBuilder {
            count: 0,
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_modification_time: None,
        }
    }

    /// Starts the archive at stream offset `offset`.
    ///
    /// This is useful when the ZIP archive is appended to existing data, such
    /// as a self-extracting stub. All recorded offsets are absolute.
    pub fn at_offset(mut self, offset: u64) -> Self {
        self.count = offset;
        self
    }

    /// Sets how many bytes [`ZipStreamWriter::add_reader`] pulls per chunk.
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Timestamp for entries that don't set one. Without this, the system
    /// clock is read as each entry is added.
    pub fn default_modification_time(mut self, modification_time: UtcDateTime) -> Self {
        self.default_modification_time = Some(modification_time);
        self
    }

    /// Builds a `ZipStreamWriter` that writes to `writer`. Nothing is
    /// written yet.
    pub fn build<W>(&self, writer: W) -> ZipStreamWriter<W> {
        ZipStreamWriter {
            sink: ByteSink::new(writer, self.count),
            entries: Vec::new(),
            chunk_size: self.chunk_size,
            default_modification_time: self.default_modification_time,
            poisoned: false,
        }
    }
}

impl Default for ZipStreamWriterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Per entry options for [`ZipStreamWriter::add`].
///
/// The expectations are checked against the streamed content; they never
/// change what is written.
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    modification_time: Option<UtcDateTime>,
    expected_size: Option<u64>,
    expected_crc32: Option<u32>,
}

impl EntryOptions {
    /// Sets the modification time recorded for the entry.
    pub fn modification_time(mut self, modification_time: UtcDateTime) -> Self {
        self.modification_time = Some(modification_time);
        self
    }

    /// Fails the entry with [`ErrorKind::SizeMismatch`] unless the content is
    /// exactly `size` bytes. Streaming stops as soon as the content overruns.
    pub fn expected_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }

    /// Fails the entry with [`ErrorKind::ChecksumMismatch`] unless the
    /// content's CRC32 is `crc`.
    pub fn expected_crc32(mut self, crc: u32) -> Self {
        self.expected_crc32 = Some(crc);
        self
    }
}

/// A completed entry, as it will be recorded in the central directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: ArchivePath<'static>,
    modified: DosDateTime,
    header_offset: u64,
    size: u64,
    crc32: u32,
}

impl FileRecord {
    /// The in-archive name.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Stream offset of the entry's local file header.
    pub fn header_offset(&self) -> u64 {
        self.header_offset
    }

    /// Content size in bytes. Stored entries have equal compressed and
    /// uncompressed sizes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// CRC32 of the content.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// The recorded modification time.
    pub fn modification_time(&self) -> DosDateTime {
        self.modified
    }

    /// The packed MS-DOS time field.
    pub fn dos_time(&self) -> u16 {
        self.modified.into_parts().0
    }

    /// The packed MS-DOS date field.
    pub fn dos_date(&self) -> u16 {
        self.modified.into_parts().1
    }

    fn needs_zip64_offset(&self) -> bool {
        self.header_offset >= ZIP64_THRESHOLD_OFFSET
    }

    fn central_extra_data_len(&self) -> u16 {
        if self.needs_zip64_offset() {
            ZIP64_EXTRA_SIZES_LEN + ZIP64_EXTRA_OFFSET_LEN
        } else {
            ZIP64_EXTRA_SIZES_LEN
        }
    }
}

/// Streams a ZIP64 archive of stored (uncompressed) entries.
///
/// Entries are written in the order they are added. Each entry's content is
/// pulled chunk by chunk and written straight through, so neither the archive
/// nor any file is held in memory. Sizes and checksums follow the content in
/// a data descriptor; the central directory and ZIP64 trailer are written by
/// [`close`](ZipStreamWriter::close).
///
/// ```rust
/// use zipstream::{EntryOptions, ZipStreamWriter};
///
/// let mut archive = ZipStreamWriter::new(Vec::new());
/// archive.add("a.txt", &b"first"[..], EntryOptions::default())?;
/// archive.add_reader("b.txt", &b"second"[..], EntryOptions::default().expected_size(6))?;
/// archive.close()?;
/// assert!(archive.is_closed());
/// assert_eq!(archive.entries().len(), 2);
/// # Ok::<(), zipstream::Error>(())
/// ```
///
/// Any failure after bytes reached the sink leaves the output unusable. The
/// writer then rejects further calls with [`ErrorKind::Poisoned`].
#[derive(Debug)]
pub struct ZipStreamWriter<W> {
    sink: ByteSink<W>,
    entries: Vec<FileRecord>,
    chunk_size: usize,
    default_modification_time: Option<UtcDateTime>,
    poisoned: bool,
}

impl ZipStreamWriter<()> {
    /// Creates a `ZipStreamWriterBuilder` that starts writing at `offset`.
    pub fn at_offset(offset: u64) -> ZipStreamWriterBuilder {
        ZipStreamWriterBuilder::new().at_offset(offset)
    }
}

impl<W> ZipStreamWriter<W> {
    /// Creates a new `ZipStreamWriter` that writes to `writer`.
    pub fn new(writer: W) -> Self {
        ZipStreamWriterBuilder::new().build(writer)
    }

    /// Current stream offset: the start offset plus every byte written.
    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    /// The completed entries, in write order.
    pub fn entries(&self) -> &[FileRecord] {
        &self.entries
    }

    /// Returns true once the trailer has been written.
    pub fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    /// Gets a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Returns the underlying writer, whether or not the archive is complete.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    fn ensure_writable(&self) -> Result<(), Error> {
        if self.sink.is_closed() {
            return Err(Error::from(ErrorKind::ClosedStream));
        }

        if self.poisoned {
            return Err(Error::from(ErrorKind::Poisoned));
        }

        Ok(())
    }

    fn poison(&mut self, err: Error) -> Error {
        if !err.is_precondition() {
            self.poisoned = true;
        }
        err
    }
}

impl<W> ZipStreamWriter<W>
where
    W: Write,
{
    /// Adds a file whose content is pulled from `source` until exhausted.
    ///
    /// The modification time defaults to the builder's default, or the
    /// current time. On success, returns the completed record.
    pub fn add<S>(
        &mut self,
        path: &str,
        mut source: S,
        options: EntryOptions,
    ) -> Result<&FileRecord, Error>
    where
        S: ChunkSource,
    {
        self.ensure_writable()?;
        let path = ArchivePath::try_from(path)?.into_owned();

        let modified = options
            .modification_time
            .or(self.default_modification_time)
            .unwrap_or_else(UtcDateTime::now);

        let record = self
            .write_entry(path, DosDateTime::from(&modified), &mut source, &options)
            .map_err(|e| self.poison(e))?;

        log::debug!(
            "added {} at offset {} ({} bytes, crc 0x{:08x})",
            record.path,
            record.header_offset,
            record.size,
            record.crc32
        );

        self.entries.push(record);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Adds a file whose content is read from `reader` until EOF, in chunks
    /// of the configured size.
    pub fn add_reader<R>(
        &mut self,
        path: &str,
        reader: R,
        options: EntryOptions,
    ) -> Result<&FileRecord, Error>
    where
        R: Read,
    {
        let chunks = ChunkReader::with_chunk_size(reader, self.chunk_size);
        self.add(path, chunks, options)
    }

    fn write_entry(
        &mut self,
        path: ArchivePath<'static>,
        modified: DosDateTime,
        source: &mut dyn ChunkSource,
        options: &EntryOptions,
    ) -> Result<FileRecord, Error> {
        let header_offset = self.sink.position();
        self.write_local_header(&path, modified)?;

        let mut crc = Crc32::new();
        let mut size = 0u64;
        while let Some(chunk) = source.next_chunk().map_err(Error::content)? {
            let next_size = size + chunk.len() as u64;
            if let Some(expected) = options.expected_size {
                if next_size > expected {
                    return Err(Error::from(ErrorKind::SizeMismatch {
                        expected,
                        actual: next_size,
                    }));
                }
            }

            self.sink.write_bytes(chunk)?;
            crc.update(chunk);
            size = next_size;
        }

        if let Some(expected) = options.expected_size {
            if size != expected {
                return Err(Error::from(ErrorKind::SizeMismatch {
                    expected,
                    actual: size,
                }));
            }
        }

        if let Some(expected) = options.expected_crc32 {
            if crc.value() != expected {
                return Err(Error::from(ErrorKind::ChecksumMismatch {
                    expected,
                    actual: crc.value(),
                }));
            }
        }

        let record = FileRecord {
            path,
            modified,
            header_offset,
            size,
            crc32: crc.value(),
        };

        self.write_data_descriptor(&record)?;
        Ok(record)
    }

    /// Writes a local file header with a ZIP64 extra field whose sizes are
    /// left for the data descriptor.
    fn write_local_header(
        &mut self,
        path: &ArchivePath<'_>,
        modified: DosDateTime,
    ) -> Result<(), Error> {
        let (dos_time, dos_date) = modified.into_parts();
        log::trace!(
            "local header for {} at offset {}",
            path,
            self.sink.position()
        );

        let sink = &mut self.sink;
        sink.write_u32(LOCAL_FILE_HEADER_SIGNATURE)?;
        sink.write_u16(ZIP64_VERSION)?; // Version needed to extract
        sink.write_u16(ENTRY_FLAGS)?;
        sink.write_u16(COMPRESSION_STORE)?;
        sink.write_u16(dos_time)?;
        sink.write_u16(dos_date)?;
        sink.write_u32(0)?; // CRC-32, in the data descriptor
        sink.write_uint(4, SENTINEL)?; // Compressed size
        sink.write_uint(4, SENTINEL)?; // Uncompressed size
        sink.write_u16(path.len_u16())?;
        sink.write_u16(4 + ZIP64_EXTRA_SIZES_LEN)?; // Extra field length
        sink.write_bytes(path.as_bytes())?;

        // ZIP64 extended information, real sizes are in the data descriptor
        sink.write_u16(ZIP64_EXTRA_FIELD_ID)?;
        sink.write_u16(ZIP64_EXTRA_SIZES_LEN)?;
        sink.write_u64(0)?; // Uncompressed size
        sink.write_u64(0)?; // Compressed size
        Ok(())
    }

    fn write_data_descriptor(&mut self, record: &FileRecord) -> Result<(), Error> {
        log::trace!(
            "data descriptor for {} at offset {}",
            record.path,
            self.sink.position()
        );

        let sink = &mut self.sink;
        sink.write_u32(DATA_DESCRIPTOR_SIGNATURE)?;
        sink.write_u32(record.crc32)?;
        sink.write_u64(record.size)?; // Compressed size
        sink.write_u64(record.size)?; // Uncompressed size
        Ok(())
    }

    /// Writes the central directory and the ZIP64 end of central directory
    /// records, then flushes the underlying writer.
    ///
    /// The archive is readable only after this succeeds. Afterwards every
    /// `add` or `close` fails with [`ErrorKind::ClosedStream`] without
    /// writing anything.
    pub fn close(&mut self) -> Result<(), Error> {
        self.ensure_writable()?;
        self.write_trailer().map_err(|e| self.poison(e))
    }

    /// Closes the archive and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, Error> {
        self.close()?;
        Ok(self.sink.into_inner())
    }

    fn write_trailer(&mut self) -> Result<(), Error> {
        let central_directory_offset = self.sink.position();
        for file in &self.entries {
            write_central_header(&mut self.sink, file)?;
        }

        let central_directory_size = self.sink.position() - central_directory_offset;
        let total_entries = self.entries.len() as u64;
        log::debug!(
            "central directory: {} entries at offset {} ({} bytes)",
            total_entries,
            central_directory_offset,
            central_directory_size
        );

        let zip64_eocd_offset = self.sink.position();
        write_zip64_eocd(
            &mut self.sink,
            total_entries,
            central_directory_size,
            central_directory_offset,
        )?;
        write_zip64_eocd_locator(&mut self.sink, zip64_eocd_offset)?;
        write_eocd(&mut self.sink)?;

        self.sink.close()
    }
}

fn write_central_header<W>(sink: &mut ByteSink<W>, file: &FileRecord) -> Result<(), Error>
where
    W: Write,
{
    let (dos_time, dos_date) = file.modified.into_parts();
    let extra_data_len = file.central_extra_data_len();

    sink.write_u32(CENTRAL_HEADER_SIGNATURE)?;
    sink.write_u16(ZIP64_VERSION)?; // Version made by
    sink.write_u16(ZIP64_VERSION)?; // Version needed to extract
    sink.write_u16(ENTRY_FLAGS)?;
    sink.write_u16(COMPRESSION_STORE)?;
    sink.write_u16(dos_time)?;
    sink.write_u16(dos_date)?;
    sink.write_u32(file.crc32)?;
    sink.write_uint(4, SENTINEL)?; // Compressed size
    sink.write_uint(4, SENTINEL)?; // Uncompressed size
    sink.write_u16(file.path.len_u16())?;
    sink.write_u16(4 + extra_data_len)?; // Extra field length
    sink.write_u16(0)?; // File comment length
    sink.write_u16(0)?; // Disk number start
    sink.write_u16(0)?; // Internal file attributes
    sink.write_u32(0)?; // External file attributes

    // Local header offset, moved into the extra field past 32 bits
    if file.needs_zip64_offset() {
        sink.write_uint(4, SENTINEL)?;
    } else {
        sink.write_uint(4, file.header_offset)?;
    }

    sink.write_bytes(file.path.as_bytes())?;

    // ZIP64 extended information extra field
    sink.write_u16(ZIP64_EXTRA_FIELD_ID)?;
    sink.write_u16(extra_data_len)?;
    sink.write_u64(file.size)?; // Uncompressed size
    sink.write_u64(file.size)?; // Compressed size
    if file.needs_zip64_offset() {
        sink.write_u64(file.header_offset)?;
    }

    Ok(())
}

/// Writes the ZIP64 End of Central Directory Record
fn write_zip64_eocd<W>(
    sink: &mut ByteSink<W>,
    total_entries: u64,
    central_directory_size: u64,
    central_directory_offset: u64,
) -> Result<(), Error>
where
    W: Write,
{
    log::trace!("zip64 end of central directory at {}", sink.position());

    sink.write_u32(END_OF_CENTRAL_DIR_SIGNATURE64)?;

    // Size of the record excluding the signature and this field
    sink.write_u64(ZIP64_EOCD_SIZE - 12)?;

    sink.write_u16(ZIP64_VERSION)?; // Version made by
    sink.write_u16(ZIP64_VERSION)?; // Version needed to extract
    sink.write_u32(0)?; // Number of this disk
    sink.write_u32(0)?; // Disk with the start of the central directory
    sink.write_u64(total_entries)?; // Entries on this disk
    sink.write_u64(total_entries)?; // Total entries
    sink.write_u64(central_directory_size)?;
    sink.write_u64(central_directory_offset)?;
    Ok(())
}

/// Writes the ZIP64 End of Central Directory Locator
fn write_zip64_eocd_locator<W>(sink: &mut ByteSink<W>, zip64_eocd_offset: u64) -> Result<(), Error>
where
    W: Write,
{
    sink.write_u32(END_OF_CENTRAL_DIR_LOCATOR_SIGNATURE)?;
    sink.write_u32(0)?; // Disk with the ZIP64 end of central directory
    sink.write_u64(zip64_eocd_offset)?;
    sink.write_u32(1)?; // Total number of disks
    Ok(())
}

/// Writes the classic End of Central Directory Record with every field
/// pointing readers at the ZIP64 record.
fn write_eocd<W>(sink: &mut ByteSink<W>) -> Result<(), Error>
where
    W: Write,
{
    sink.write_u32(END_OF_CENTRAL_DIR_SIGNATURE)?;
    sink.write_uint(2, SENTINEL)?; // Number of this disk
    sink.write_uint(2, SENTINEL)?; // Disk with the start of the central directory
    sink.write_uint(2, SENTINEL)?; // Entries on this disk
    sink.write_uint(2, SENTINEL)?; // Total entries
    sink.write_uint(4, SENTINEL)?; // Central directory size
    sink.write_uint(4, SENTINEL)?; // Central directory offset
    sink.write_u16(0)?; // Comment length
    Ok(())
}
