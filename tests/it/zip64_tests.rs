use crate::{layout, read_back};
use rstest::rstest;
use std::io::Cursor;
use zipstream::{EntryOptions, ZipStreamWriter};

#[rstest]
#[case(0)]
#[case(1)]
#[case(3)]
#[case(300)]
fn test_trailer_counts_entries(#[case] count: usize) {
    let mut archive = ZipStreamWriter::new(Vec::new());
    for i in 0..count {
        let content = format!("entry {i}");
        archive
            .add(&format!("{i}.txt"), content.as_bytes(), EntryOptions::default())
            .unwrap();
    }
    let cd_offset = archive.position();
    let data = archive.finish().unwrap();

    let trailer = layout::trailer(&data);
    assert_eq!(trailer.entries, count as u64);
    assert_eq!(trailer.central_directory_offset, cd_offset);
    assert_eq!(
        trailer.zip64_eocd_offset,
        trailer.central_directory_offset + trailer.central_directory_size
    );
    assert_eq!(layout::central_directory(&data).len(), count);

    let zip = zip::ZipArchive::new(Cursor::new(&data)).unwrap();
    assert_eq!(zip.len(), count);
}

#[test]
fn test_zip64_records_written_for_tiny_archives() {
    let mut archive = ZipStreamWriter::new(Vec::new());
    archive
        .add("tiny", &b"t"[..], EntryOptions::default())
        .unwrap();
    let data = archive.finish().unwrap();

    let central = &layout::central_directory(&data)[0];
    assert_eq!(central.uncompressed_size, 1);
    assert_eq!(central.compressed_size, 1);

    let trailer = layout::trailer(&data);
    let eocd = data.len() - 22;
    assert_eq!(layout::le_u32(&data, eocd - 20 + 8) as u64, trailer.zip64_eocd_offset);

    // Classic fields all defer to the ZIP64 record
    assert_eq!(layout::le_u16(&data, eocd + 8), u16::MAX);
    assert_eq!(layout::le_u16(&data, eocd + 10), u16::MAX);
    assert_eq!(layout::le_u32(&data, eocd + 12), u32::MAX);
    assert_eq!(layout::le_u32(&data, eocd + 16), u32::MAX);
}

#[test]
fn test_empty_archive_is_trailer_only() {
    let data = ZipStreamWriter::new(Vec::new()).finish().unwrap();
    assert_eq!(data.len(), 56 + 20 + 22);

    let trailer = layout::trailer(&data);
    assert_eq!(trailer.entries, 0);
    assert_eq!(trailer.central_directory_size, 0);
    assert_eq!(trailer.central_directory_offset, 0);
    assert_eq!(trailer.zip64_eocd_offset, 0);
    assert!(read_back(&data).is_empty());
}

#[test]
fn test_trailer_offsets_are_absolute() {
    let offset = 1 << 20;
    let mut archive = ZipStreamWriter::at_offset(offset).build(Vec::new());
    archive
        .add("a", &b"abc"[..], EntryOptions::default())
        .unwrap();
    let data = archive.finish().unwrap();

    // Pad so absolute offsets index into the buffer
    let mut padded = vec![0u8; offset as usize];
    padded.extend_from_slice(&data);

    let central = layout::central_directory(&padded);
    assert_eq!(central[0].header_offset, offset);
    let trailer = layout::trailer(&padded);
    assert_eq!(trailer.central_directory_offset, offset + 30 + 1 + 20 + 3 + 24);
}
