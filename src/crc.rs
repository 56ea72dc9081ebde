const fn gen_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let poly = 0xEDB88320; // Reflected IEEE polynomial used by ZIP

    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ poly;
            } else {
                crc >>= 1;
            }
            j += 1;
        }

        table[i] = crc;
        i += 1;
    }

    table
}

// Prefer static over const to cut test times in half
// ref: https://github.com/srijs/rust-crc32fast/commit/e61ce6a39bbe9da495198a4037292ec299e8970f
static CRC_TABLE: [u32; 256] = gen_crc_table();

/// The checksum of the empty byte sequence, and the seed for
/// [`crc32_chunk`].
pub const CRC32_EMPTY: u32 = 0;

/// Compute the CRC32 (IEEE) of a byte slice held entirely in memory.
///
/// For data that arrives in pieces, use [`crc32_chunk`] or [`Crc32`].
pub fn crc32(data: &[u8]) -> u32 {
    crc32_chunk(data, CRC32_EMPTY)
}

/// Continue a CRC32 computation over `data`.
///
/// `prev` is the checksum of everything consumed so far ([`CRC32_EMPTY`] on
/// the first call). Splitting the input at any boundary yields the same
/// result as hashing it in one go.
#[inline]
pub fn crc32_chunk(data: &[u8], prev: u32) -> u32 {
    let crc = data.iter().fold(!prev, |crc, &x| {
        (crc >> 8) ^ CRC_TABLE[((crc ^ u32::from(x)) & 0xFF) as usize]
    });

    !crc
}

/// Incremental CRC32 hasher for streamed content.
///
/// ```rust
/// let mut hasher = zipstream::Crc32::new();
/// hasher.update(b"hello ");
/// hasher.update(b"world");
/// assert_eq!(hasher.value(), zipstream::crc32(b"hello world"));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Crc32 {
    value: u32,
}

impl Crc32 {
    /// Creates a hasher with the checksum of the empty sequence.
    pub fn new() -> Self {
        Crc32 { value: CRC32_EMPTY }
    }

    /// Feeds the next chunk of data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        self.value = crc32_chunk(data, self.value);
    }

    /// Returns the checksum of all data fed so far.
    pub fn value(&self) -> u32 {
        self.value
    }
}
