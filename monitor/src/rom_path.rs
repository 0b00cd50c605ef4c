//! ROM path resolution: builds a [`RomSet`] from a ZIP archive, a directory
//! holding `{rom_name}.zip`, a directory of loose images, or one image file.

use gs45_machines::rom_loader::{RomLoadError, RomSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Resolve `path` for the machine whose archive stem is `rom_name`.
///
/// Resolution order:
/// 1. `*.zip` → every file in the archive.
/// 2. Directory containing `{rom_name}.zip` → that archive.
/// 3. Directory → its loose files via [`RomSet::from_directory`].
/// 4. Any other file → a one-entry set keyed by its file name.
pub fn load_rom_set(rom_name: &str, path: &Path) -> Result<RomSet, RomLoadError> {
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
    {
        return load_from_zip(path);
    }

    if path.is_dir() {
        let zip_path = path.join(format!("{rom_name}.zip"));
        if zip_path.exists() {
            return load_from_zip(&zip_path);
        }
        return RomSet::from_directory(path);
    }

    if path.is_file() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(RomSet::from_entries(vec![(name, std::fs::read(path)?)]));
    }

    Err(RomLoadError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("ROM path not found: {}", path.display()),
    )))
}

fn invalid_zip(e: zip::result::ZipError) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, format!("invalid ZIP: {e}"))
}

fn load_from_zip(path: &Path) -> Result<RomSet, RomLoadError> {
    let mut archive = zip::ZipArchive::new(BufReader::new(File::open(path)?)).map_err(invalid_zip)?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(invalid_zip)?;
        if entry.is_dir() {
            continue;
        }
        // Archives often nest images in a folder; match on the bare name.
        let name = entry
            .name()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data)?;
        entries.push((name, data));
    }

    Ok(RomSet::from_entries(entries))
}
