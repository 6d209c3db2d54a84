// Zip extraction for native libraries and resource bundles

use crate::error::Error;
use log::debug;
use std::fs;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Entries every native archive carries but nobody needs on the library path.
pub const NATIVE_EXCLUDES: &[&str] = &["META-INF/"];

/// Extract the archive at `archive` into `dest`, overwriting existing files.
/// Entries whose name starts with one of `excludes` are skipped.
pub fn extract_file(archive: &Path, dest: &Path, excludes: &[String]) -> Result<usize, Error> {
    let file = fs::File::open(archive).map_err(|e| Error::extraction(archive, e))?;
    extract_from(file, archive, dest, excludes)
}

/// Extract an in-memory archive; `origin` names it in errors.
pub fn extract_bytes(
    bytes: Vec<u8>,
    origin: &Path,
    dest: &Path,
    excludes: &[String],
) -> Result<usize, Error> {
    extract_from(Cursor::new(bytes), origin, dest, excludes)
}

fn extract_from<R: Read + Seek>(
    reader: R,
    origin: &Path,
    dest: &Path,
    excludes: &[String],
) -> Result<usize, Error> {
    let mut archive = zip::ZipArchive::new(reader).map_err(|e| Error::extraction(origin, e))?;
    fs::create_dir_all(dest).map_err(|e| Error::extraction(origin, e))?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| Error::extraction(origin, e))?;
        let name = entry.name().to_string();
        if excludes.iter().any(|prefix| name.starts_with(prefix.as_str())) {
            continue;
        }
        // Entries that would land outside `dest` are dropped.
        let Some(relative) = entry.enclosed_name() else {
            debug!("Skipping unsafe entry {} in {:?}", name, origin);
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| Error::extraction(origin, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::extraction(origin, e))?;
        }
        let mut out = fs::File::create(&target).map_err(|e| Error::extraction(origin, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| Error::extraction(origin, e))?;
        written += 1;
    }

    debug!("Extracted {} file(s) from {:?} into {:?}", written, origin, dest);
    Ok(written)
}

/// Build a stored zip from `(name, contents)` pairs. Test helper shared by the
/// download and task modules.
#[cfg(test)]
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::Write;
    use zip::CompressionMethod;
    use zip::write::{FileOptions, ZipWriter};

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::<()>::default().compression_method(CompressionMethod::Stored);
    for (name, contents) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}
