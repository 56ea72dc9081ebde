use crate::layout::{self, le_u16, le_u32, le_u64};
use rstest::rstest;
use zipstream::{
    time::{DosDateTime, UtcDateTime},
    EntryOptions, IterChunks, ZipStreamWriter,
};

fn build(files: &[(&str, &[u8])]) -> (Vec<u8>, Vec<zipstream::FileRecord>) {
    let mut archive = ZipStreamWriter::new(Vec::new());
    for (name, content) in files {
        archive.add(name, *content, EntryOptions::default()).unwrap();
    }
    let records = archive.entries().to_vec();
    (archive.finish().unwrap(), records)
}

#[test]
fn test_central_directory_matches_records() {
    let files: &[(&str, &[u8])] = &[
        ("a.txt", b"alpha"),
        ("b/c.txt", b""),
        ("d.bin", &[0u8; 1000]),
    ];
    let (data, records) = build(files);
    let central = layout::central_directory(&data);
    assert_eq!(central.len(), files.len());

    for ((entry, record), (name, content)) in central.iter().zip(&records).zip(files) {
        assert_eq!(entry.name, *name);
        assert_eq!(record.path(), *name);
        assert_eq!(entry.version_made_by, 45);
        assert_eq!(entry.version_needed, 45);
        assert_eq!(entry.flags, 0x0808);
        assert_eq!(entry.method, 0);
        assert_eq!(entry.external_attributes, 0);
        assert_eq!(entry.crc32, zipstream::crc32(content));
        assert_eq!(entry.crc32, record.crc32());
        assert_eq!(entry.uncompressed_size, content.len() as u64);
        assert_eq!(entry.compressed_size, content.len() as u64);
        assert_eq!(entry.header_offset, record.header_offset());
        assert_eq!(entry.dos_time, record.dos_time());
        assert_eq!(entry.dos_date, record.dos_date());
    }
}

#[test]
fn test_offsets_point_at_local_headers() {
    let files: &[(&str, &[u8])] = &[("one", b"1"), ("two", b"22"), ("three", b"333")];
    let (data, records) = build(files);

    let mut expected_offset = 0u64;
    for (record, (name, content)) in records.iter().zip(files) {
        assert_eq!(record.header_offset(), expected_offset);

        let at = record.header_offset() as usize;
        assert_eq!(le_u32(&data, at), layout::LOCAL_FILE_HEADER_SIGNATURE);
        assert_eq!(le_u32(&data, at + 14), 0, "crc placeholder");
        assert_eq!(le_u32(&data, at + 18), u32::MAX);
        assert_eq!(le_u32(&data, at + 22), u32::MAX);
        assert_eq!(le_u16(&data, at + 26) as usize, name.len());
        assert_eq!(le_u16(&data, at + 28), 20);
        assert_eq!(&data[at + 30..at + 30 + name.len()], name.as_bytes());

        let content_at = at + 30 + name.len() + 20;
        assert_eq!(&data[content_at..content_at + content.len()], *content);

        let descriptor = content_at + content.len();
        assert_eq!(le_u32(&data, descriptor), layout::DATA_DESCRIPTOR_SIGNATURE);
        assert_eq!(le_u32(&data, descriptor + 4), record.crc32());
        assert_eq!(le_u64(&data, descriptor + 8), content.len() as u64);
        assert_eq!(le_u64(&data, descriptor + 16), content.len() as u64);

        expected_offset = (descriptor + 24) as u64;
    }

    let trailer = layout::trailer(&data);
    assert_eq!(trailer.central_directory_offset, expected_offset);
}

#[test]
fn test_position_advances_with_every_entry() {
    let mut archive = ZipStreamWriter::new(Vec::new());
    assert_eq!(archive.position(), 0);

    let mut last = 0;
    for i in 0..10 {
        let before = archive.position();
        let content = vec![b'x'; i * 3];
        let record = archive
            .add(&format!("f{i}"), content.as_slice(), EntryOptions::default())
            .unwrap();
        assert_eq!(record.header_offset(), before);
        assert!(archive.position() > before);
        assert!(before >= last);
        last = archive.position();
    }

    assert_eq!(archive.get_ref().len() as u64, archive.position());
}

#[rstest]
#[case(2021, 6, 15, 13, 45, 30)]
#[case(1980, 1, 1, 0, 0, 0)]
#[case(2107, 12, 31, 23, 59, 58)]
#[case(2000, 2, 29, 12, 0, 10)]
fn test_dos_timestamp_round_trip(
    #[case] year: u16,
    #[case] month: u8,
    #[case] day: u8,
    #[case] hour: u8,
    #[case] minute: u8,
    #[case] second: u8,
) {
    let modified = UtcDateTime::from_components(year, month, day, hour, minute, second, 0).unwrap();
    let mut archive = ZipStreamWriter::new(Vec::new());
    archive
        .add(
            "stamped.txt",
            &b"time"[..],
            EntryOptions::default().modification_time(modified),
        )
        .unwrap();
    let data = archive.finish().unwrap();

    // Local header
    let local = DosDateTime::new(le_u16(&data, 10), le_u16(&data, 12));
    assert_eq!(local.to_datetime(), modified);

    // Central directory
    let central = &layout::central_directory(&data)[0];
    let decoded = DosDateTime::new(central.dos_time, central.dos_date).to_datetime();
    assert_eq!(decoded, modified);
}

#[test]
fn test_known_timestamp_bits() {
    let modified = UtcDateTime::from_components(2021, 6, 15, 13, 45, 31, 0).unwrap();
    let mut archive = ZipStreamWriter::new(Vec::new());
    let record = archive
        .add(
            "f",
            &b""[..],
            EntryOptions::default().modification_time(modified),
        )
        .unwrap();

    assert_eq!(record.dos_date(), (41 << 9) | (6 << 5) | 15);
    assert_eq!(record.dos_time(), (13 << 11) | (45 << 5) | 15);
    assert_eq!(record.modification_time().second(), 30);
}

#[test]
fn test_default_timestamp_is_now() {
    let before = UtcDateTime::now();
    let mut archive = ZipStreamWriter::new(Vec::new());
    let record = archive
        .add("now", &b""[..], EntryOptions::default())
        .unwrap()
        .clone();
    let after = UtcDateTime::now();

    let recorded = record.modification_time().to_datetime().to_unix();
    // 2 second resolution, truncated
    assert!(recorded >= before.to_unix() - 2);
    assert!(recorded <= after.to_unix());
}

#[test]
fn test_many_small_chunks_match_single_chunk() {
    let content: Vec<u8> = (0..10_000u32).map(|x| (x % 97) as u8).collect();

    let mut whole = ZipStreamWriter::new(Vec::new());
    let whole_record = whole
        .add("f", content.as_slice(), EntryOptions::default())
        .unwrap()
        .clone();

    let pieces = content
        .chunks(13)
        .map(|chunk| Ok::<_, std::io::Error>(chunk.to_vec()));
    let mut chunked = ZipStreamWriter::new(Vec::new());
    let chunked_record = chunked
        .add("f", IterChunks::new(pieces), EntryOptions::default())
        .unwrap()
        .clone();

    assert_eq!(whole_record.crc32(), chunked_record.crc32());
    assert_eq!(whole_record.size(), chunked_record.size());
    assert_eq!(whole.position(), chunked.position());
}
