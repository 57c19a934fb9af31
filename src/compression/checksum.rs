//! Adler32 and CRC32 checksums
//!
//! Adler32 provides the trailer of the Deflate wrapper; CRC32 is offered
//! alongside it through the same streaming interface.

/// Largest number of bytes summed before the Adler32 sums must be reduced
const ADLER_CHUNK: usize = 3800;
const ADLER_MODULUS: u32 = 65521;

/// Streaming checksum over byte slices
pub trait ChecksumChecker {
    /// Feeds more bytes and returns the checksum of everything seen so far
    fn update(&mut self, data: &[u8]) -> u32;

    /// Current checksum value
    fn value(&self) -> u32;

    /// Restores the initial state
    fn reset(&mut self);
}

/// Adler32 rolling checksum
#[derive(Debug, Clone)]
pub struct Adler32 {
    checksum: u32,
}

impl Adler32 {
    pub fn new() -> Self {
        Adler32 { checksum: 1 }
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Adler32::new()
    }
}

impl ChecksumChecker for Adler32 {
    fn update(&mut self, data: &[u8]) -> u32 {
        let mut s1 = self.checksum & 0xFFFF;
        let mut s2 = self.checksum >> 16;

        for chunk in data.chunks(ADLER_CHUNK) {
            for byte in chunk {
                s1 += *byte as u32;
                s2 += s1;
            }
            s1 %= ADLER_MODULUS;
            s2 %= ADLER_MODULUS;
        }

        self.checksum = (s2 << 16) | s1;
        self.checksum
    }

    fn value(&self) -> u32 {
        self.checksum
    }

    fn reset(&mut self) {
        self.checksum = 1;
    }
}

/// Reflected CRC-32 (polynomial 0xEDB88320)
#[derive(Debug, Clone)]
pub struct Crc32 {
    table: [u32; 256],
    register: u32,
}

impl Crc32 {
    const POLYNOMIAL: u32 = 0xEDB8_8320;

    pub fn new() -> Self {
        let mut table = [0u32; 256];
        for (i, slot) in table.iter_mut().enumerate() {
            let mut value = i as u32;
            for _ in 0..8 {
                value = if value & 1 == 1 {
                    (value >> 1) ^ Self::POLYNOMIAL
                } else {
                    value >> 1
                };
            }
            *slot = value;
        }

        Crc32 {
            table,
            register: 0xFFFF_FFFF,
        }
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Crc32::new()
    }
}

impl ChecksumChecker for Crc32 {
    fn update(&mut self, data: &[u8]) -> u32 {
        for byte in data {
            let index = ((self.register ^ *byte as u32) & 0xFF) as usize;
            self.register = (self.register >> 8) ^ self.table[index];
        }
        self.value()
    }

    fn value(&self) -> u32 {
        !self.register
    }

    fn reset(&mut self) {
        self.register = 0xFFFF_FFFF;
    }
}

/// One-shot Adler32 of a buffer
pub fn adler32(data: &[u8]) -> u32 {
    Adler32::new().update(data)
}

/// One-shot CRC32 of a buffer
pub fn crc32(data: &[u8]) -> u32 {
    Crc32::new().update(data)
}
