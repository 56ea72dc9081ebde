//! A minimal parser for the records the writer emits, used to check
//! structure byte for byte. It trusts the ZIP64 trailer and does no
//! validation beyond signatures.

pub const LOCAL_FILE_HEADER_SIGNATURE: u32 = 0x04034b50;
pub const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;
pub const CENTRAL_HEADER_SIGNATURE: u32 = 0x02014b50;
pub const ZIP64_EOCD_SIGNATURE: u32 = 0x06064b50;
pub const ZIP64_EOCD_LOCATOR_SIGNATURE: u32 = 0x07064b50;
pub const EOCD_SIGNATURE: u32 = 0x06054b50;

pub fn le_u16(d: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([d[at], d[at + 1]])
}

pub fn le_u32(d: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([d[at], d[at + 1], d[at + 2], d[at + 3]])
}

pub fn le_u64(d: &[u8], at: usize) -> u64 {
    u64::from_le_bytes(d[at..at + 8].try_into().unwrap())
}

#[derive(Debug)]
pub struct Trailer {
    pub zip64_eocd_offset: u64,
    pub entries: u64,
    pub central_directory_size: u64,
    pub central_directory_offset: u64,
}

#[derive(Debug)]
pub struct CentralEntry {
    pub version_made_by: u16,
    pub version_needed: u16,
    pub flags: u16,
    pub method: u16,
    pub dos_time: u16,
    pub dos_date: u16,
    pub crc32: u32,
    pub uncompressed_size: u64,
    pub compressed_size: u64,
    pub header_offset: u64,
    pub external_attributes: u32,
    pub name: String,
}

/// Reads the classic and ZIP64 end records from the tail of `data`.
pub fn trailer(data: &[u8]) -> Trailer {
    let eocd = data.len() - 22;
    assert_eq!(le_u32(data, eocd), EOCD_SIGNATURE);
    assert_eq!(&data[eocd + 4..eocd + 20], &[0xff; 16]);
    assert_eq!(le_u16(data, eocd + 20), 0);

    let locator = eocd - 20;
    assert_eq!(le_u32(data, locator), ZIP64_EOCD_LOCATOR_SIGNATURE);
    assert_eq!(le_u32(data, locator + 4), 0);
    assert_eq!(le_u32(data, locator + 16), 1);
    let zip64_eocd_offset = le_u64(data, locator + 8);

    let at = zip64_eocd_offset as usize;
    assert_eq!(le_u32(data, at), ZIP64_EOCD_SIGNATURE);
    assert_eq!(le_u64(data, at + 4), 44);
    assert_eq!(at + 56, locator);
    let entries = le_u64(data, at + 32);
    assert_eq!(le_u64(data, at + 24), entries);

    Trailer {
        zip64_eocd_offset,
        entries,
        central_directory_size: le_u64(data, at + 40),
        central_directory_offset: le_u64(data, at + 48),
    }
}

/// Parses every central directory header.
pub fn central_directory(data: &[u8]) -> Vec<CentralEntry> {
    let trailer = trailer(data);
    let mut at = trailer.central_directory_offset as usize;
    let mut out = Vec::new();
    for _ in 0..trailer.entries {
        assert_eq!(le_u32(data, at), CENTRAL_HEADER_SIGNATURE);
        let name_len = le_u16(data, at + 28) as usize;
        let extra_len = le_u16(data, at + 30) as usize;
        assert_eq!(le_u16(data, at + 32), 0, "comment length");

        let name = String::from_utf8(data[at + 46..at + 46 + name_len].to_vec()).unwrap();
        let extra = &data[at + 46 + name_len..at + 46 + name_len + extra_len];
        assert_eq!(le_u16(extra, 0), 0x0001);
        let extra_data_len = le_u16(extra, 2) as usize;
        assert_eq!(extra_data_len + 4, extra_len);

        let mut header_offset = u64::from(le_u32(data, at + 42));
        if header_offset == u64::from(u32::MAX) {
            header_offset = le_u64(extra, 20);
        }

        out.push(CentralEntry {
            version_made_by: le_u16(data, at + 4),
            version_needed: le_u16(data, at + 6),
            flags: le_u16(data, at + 8),
            method: le_u16(data, at + 10),
            dos_time: le_u16(data, at + 12),
            dos_date: le_u16(data, at + 14),
            crc32: le_u32(data, at + 16),
            uncompressed_size: le_u64(extra, 4),
            compressed_size: le_u64(extra, 12),
            header_offset,
            external_attributes: le_u32(data, at + 38),
            name,
        });

        at += 46 + name_len + extra_len;
    }

    assert_eq!(
        at as u64,
        trailer.central_directory_offset + trailer.central_directory_size
    );
    assert_eq!(at as u64, trailer.zip64_eocd_offset);
    out
}
