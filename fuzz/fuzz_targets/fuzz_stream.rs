#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Read;
use zipstream::{EntryOptions, IterChunks, ZipStreamWriter};

// The first byte picks a chunk length and every 0xff byte splits entries.
fuzz_target!(|data: &[u8]| {
    let Some((&chunk_len, rest)) = data.split_first() else {
        return;
    };
    let chunk_len = usize::from(chunk_len).max(1);
    let files: Vec<&[u8]> = rest.split(|&b| b == 0xff).collect();

    let mut archive = ZipStreamWriter::new(Vec::new());
    for (i, content) in files.iter().enumerate() {
        let chunks = IterChunks::new(content.chunks(chunk_len).map(Ok));
        let options = EntryOptions::default()
            .expected_size(content.len() as u64)
            .expected_crc32(zipstream::crc32(content));
        archive.add(&format!("{i}"), chunks, options).unwrap();
    }
    let output = archive.finish().unwrap();

    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(output)).unwrap();
    assert_eq!(zip.len(), files.len());
    for (i, expected) in files.iter().enumerate() {
        let mut file = zip.by_index(i).unwrap();
        let mut actual = Vec::new();
        file.read_to_end(&mut actual).unwrap();
        assert_eq!(&actual, expected);
    }
});
