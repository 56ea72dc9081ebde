#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![forbid(unsafe_code)]

mod chunks;
mod crc;
mod errors;
pub mod path;
mod sink;
pub mod time;
mod writer;

pub use chunks::{ChunkReader, ChunkSource, IterChunks, DEFAULT_CHUNK_SIZE};
pub use crc::{crc32, crc32_chunk, Crc32, CRC32_EMPTY};
pub use errors::{Error, ErrorKind};
pub use path::ArchivePath;
pub use sink::ByteSink;
pub use writer::*;
