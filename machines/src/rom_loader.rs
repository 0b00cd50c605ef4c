//! ROM image loading for the C65/MEGA65 machines.
//!
//! A [`RomSet`] is a bag of named files read from a directory, an archive
//! unpacked by the caller, or byte slices in tests. A [`RomRegion`] says
//! where those files land inside a machine's ROM area and what their CRC32
//! should be.

use std::collections::HashMap;
use std::path::Path;

use log::warn;
use thiserror::Error;

/// Reflected CRC-32 (polynomial 0xEDB88320), as used by ZIP and MAME.
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
};

pub fn crc32(data: &[u8]) -> u32 {
    !data.iter().fold(!0u32, |crc, &byte| {
        CRC32_TABLE[((crc ^ byte as u32) & 0xFF) as usize] ^ (crc >> 8)
    })
}

#[derive(Debug, Error)]
pub enum RomLoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing ROM file: {0}")]
    MissingFile(String),

    #[error("ROM {file}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },

    #[error("ROM {file}: CRC32 expected 0x{expected:08X}, got 0x{actual:08X}")]
    ChecksumMismatch {
        file: String,
        expected: u32,
        actual: u32,
    },
}

/// Named ROM files.
#[derive(Debug, Default)]
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Every regular file directly inside `path`, keyed by file name.
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if let Some(name) = file_path.file_name() {
                files.insert(name.to_string_lossy().into_owned(), std::fs::read(&file_path)?);
            }
        }
        Ok(Self { files })
    }

    pub fn from_entries(entries: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            files: entries.into_iter().collect(),
        }
    }

    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        Self {
            files: entries
                .iter()
                .map(|(name, data)| (name.to_string(), data.to_vec()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }

    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.files.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// One file of a [`RomRegion`].
pub struct RomEntry {
    pub name: &'static str,
    pub size: usize,
    /// Byte offset inside the region.
    pub offset: usize,
    /// `None` accepts any content.
    pub crc32: Option<u32>,
}

pub struct RomRegion {
    pub size: usize,
    pub entries: &'static [RomEntry],
}

/// How strictly [`RomRegion`] checks the files it assembles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Check {
    Strict,
    SkipChecksums,
    /// Short images are zero-padded and skip the checksum.
    Lenient,
}

impl RomRegion {
    /// Assemble the region, checking sizes and checksums.
    pub fn load(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, Check::Strict)
    }

    pub fn load_skip_checksums(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, Check::SkipChecksums)
    }

    /// Like [`load`](Self::load), but a file shorter than its entry is
    /// accepted with a warning and zero-padded. Oversized files still fail.
    pub fn load_lenient(&self, rom_set: &RomSet) -> Result<Vec<u8>, RomLoadError> {
        self.assemble(rom_set, Check::Lenient)
    }

    fn assemble(&self, rom_set: &RomSet, check: Check) -> Result<Vec<u8>, RomLoadError> {
        let mut region = vec![0u8; self.size];

        for entry in self.entries {
            let data = rom_set.require(entry.name)?;
            let short = data.len() < entry.size;
            if data.len() > entry.size || (short && check != Check::Lenient) {
                return Err(RomLoadError::SizeMismatch {
                    file: entry.name.to_string(),
                    expected: entry.size,
                    actual: data.len(),
                });
            }
            if short {
                warn!(
                    "ROM {}: {} bytes, padding to {}",
                    entry.name,
                    data.len(),
                    entry.size
                );
            }

            let verify = check == Check::Strict || (check == Check::Lenient && !short);
            if verify && let Some(expected) = entry.crc32 {
                let actual = crc32(data);
                if actual != expected {
                    return Err(RomLoadError::ChecksumMismatch {
                        file: entry.name.to_string(),
                        expected,
                        actual,
                    });
                }
            }

            region[entry.offset..entry.offset + data.len()].copy_from_slice(data);
        }

        Ok(region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ONE_WORD: [RomEntry; 1] = [RomEntry {
        name: "test.rom",
        size: 4,
        offset: 0,
        crc32: None,
    }];

    static BAD_CRC: [RomEntry; 1] = [RomEntry {
        name: "test.rom",
        size: 4,
        offset: 0,
        crc32: Some(0xDEAD_BEEF),
    }];

    #[test]
    fn crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn require_reports_missing_file() {
        let rom_set = RomSet::from_slices(&[("a.rom", &[0x00])]);
        assert!(matches!(
            rom_set.require("b.rom"),
            Err(RomLoadError::MissingFile(name)) if name == "b.rom"
        ));
    }

    #[test]
    fn file_names_sorted() {
        let rom_set = RomSet::from_entries(vec![
            ("z.rom".to_string(), vec![]),
            ("a.rom".to_string(), vec![]),
        ]);
        assert_eq!(rom_set.file_names(), vec!["a.rom", "z.rom"]);
    }

    #[test]
    fn load_places_entries_at_offsets() {
        static ENTRIES: [RomEntry; 2] = [
            RomEntry {
                name: "lo.bin",
                size: 4,
                offset: 0,
                crc32: None,
            },
            RomEntry {
                name: "hi.bin",
                size: 4,
                offset: 8,
                crc32: None,
            },
        ];
        let region = RomRegion {
            size: 12,
            entries: &ENTRIES,
        };
        let rom_set = RomSet::from_slices(&[("lo.bin", &[0x11; 4]), ("hi.bin", &[0x22; 4])]);
        let image = region.load(&rom_set).unwrap();
        assert_eq!(&image[..4], &[0x11; 4]);
        assert_eq!(&image[4..8], &[0x00; 4]); // gap left zeroed
        assert_eq!(&image[8..], &[0x22; 4]);
    }

    #[test]
    fn load_validates_checksum() {
        let region = RomRegion {
            size: 4,
            entries: &BAD_CRC,
        };
        let rom_set = RomSet::from_slices(&[("test.rom", &[1, 2, 3, 4])]);
        assert!(matches!(
            region.load(&rom_set),
            Err(RomLoadError::ChecksumMismatch { .. })
        ));
        assert_eq!(region.load_skip_checksums(&rom_set).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn strict_load_rejects_short_file() {
        let region = RomRegion {
            size: 4,
            entries: &ONE_WORD,
        };
        let rom_set = RomSet::from_slices(&[("test.rom", &[1, 2])]);
        assert!(matches!(
            region.load(&rom_set),
            Err(RomLoadError::SizeMismatch {
                expected: 4,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn lenient_load_pads_short_file() {
        let region = RomRegion {
            size: 4,
            entries: &BAD_CRC,
        };
        let rom_set = RomSet::from_slices(&[("test.rom", &[1, 2])]);
        assert_eq!(region.load_lenient(&rom_set).unwrap(), vec![1, 2, 0, 0]);
    }

    #[test]
    fn lenient_load_rejects_oversized_file() {
        let region = RomRegion {
            size: 4,
            entries: &ONE_WORD,
        };
        let rom_set = RomSet::from_slices(&[("test.rom", &[0; 5])]);
        assert!(matches!(
            region.load_lenient(&rom_set),
            Err(RomLoadError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn from_directory_reads_files() {
        let dir = std::env::temp_dir().join("gs45_rom_loader_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("mega65.rom"), [0xAA, 0xBB]).unwrap();

        let rom_set = RomSet::from_directory(&dir).unwrap();
        assert_eq!(rom_set.get("mega65.rom"), Some(&[0xAA, 0xBB][..]));
        assert_eq!(rom_set.file_names(), vec!["mega65.rom"]); // subdirectories skipped

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
