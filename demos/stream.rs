use clap::Parser;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use zipstream::{time::UtcDateTime, EntryOptions, ZipStreamWriter, ZipStreamWriterBuilder};

/// Streams files into a stored ZIP64 archive.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output archive, or `-` for stdout
    #[arg(short, long, value_name = "FILE")]
    output: String,

    /// Bytes read per chunk
    #[arg(long, default_value_t = zipstream::DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Files to add, in order. Directories are not traversed.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let builder = ZipStreamWriterBuilder::new().chunk_size(cli.chunk_size);
    if cli.output == "-" {
        let stdout = io::stdout();
        let archive = builder.build(BufWriter::new(stdout.lock()));
        stream_files(archive, &cli.inputs)?;
    } else {
        let archive = builder.build(BufWriter::new(File::create(&cli.output)?));
        let (entries, bytes) = stream_files(archive, &cli.inputs)?;
        eprintln!("wrote {} ({} entries, {} bytes)", cli.output, entries, bytes);
    }

    Ok(())
}

fn stream_files<W: Write>(
    mut archive: ZipStreamWriter<W>,
    inputs: &[PathBuf],
) -> Result<(usize, u64), Box<dyn std::error::Error>> {
    for input in inputs {
        let metadata = fs::metadata(input)?;
        if !metadata.is_file() {
            log::warn!("skipping {}: not a regular file", input.display());
            continue;
        }

        let name = archive_name(input)?;
        let mut options = EntryOptions::default().expected_size(metadata.len());
        if let Ok(modified) = metadata.modified() {
            options = options.modification_time(UtcDateTime::from(modified));
        }

        let record = archive.add_reader(&name, File::open(input)?, options)?;
        eprintln!("  adding: {} ({} bytes)", record.path(), record.size());
    }

    archive.close()?;
    let entries = archive.entries().len();
    let bytes = archive.position();
    archive.into_inner().flush()?;
    Ok((entries, bytes))
}

/// The input's path with separators normalized to `/` and any root or
/// parent components dropped.
fn archive_name(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    use std::path::Component;

    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect::<Option<_>>()
        .ok_or_else(|| format!("{} is not valid UTF-8", path.display()))?;

    Ok(parts.join("/"))
}
