//! ZIP central-directory reader.
//!
//! Listing uses raw entry access so nothing is decompressed; member
//! contents are only read on request and always through a byte bound.

use std::io::{Cursor, Read};

use zip::ZipArchive;

use crate::error::EvidenceError;

/// One central-directory entry as declared by the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub size: u64,
    pub compressed_size: u64,
    pub is_dir: bool,
}

impl ArchiveEntry {
    /// Final path component.
    pub fn basename(&self) -> &str {
        self.name
            .trim_end_matches(['/', '\\'])
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveListing {
    pub entries: Vec<ArchiveEntry>,
    /// Length of the archive container in bytes.
    pub archive_len: u64,
}

impl ArchiveListing {
    pub fn total_uncompressed(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.size))
    }

    /// Declared uncompressed total over container length.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.archive_len == 0 {
            return None;
        }
        Some(self.total_uncompressed() as f64 / self.archive_len as f64)
    }

    pub fn files(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter().filter(|e| !e.is_dir)
    }
}

pub struct ArchiveReader<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    len: u64,
}

impl<'a> ArchiveReader<'a> {
    pub fn open(bytes: &'a [u8]) -> Result<Self, EvidenceError> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| EvidenceError::InvalidArchive(e.to_string()))?;
        Ok(Self {
            archive,
            len: bytes.len() as u64,
        })
    }

    /// Read every central-directory entry.
    ///
    /// Entries whose headers cannot be decoded are reported separately and
    /// left out of the listing.
    pub fn listing(&mut self) -> (ArchiveListing, Vec<EvidenceError>) {
        let mut entries = Vec::with_capacity(self.archive.len());
        let mut errors = Vec::new();

        for i in 0..self.archive.len() {
            match self.archive.by_index_raw(i) {
                Ok(file) => entries.push(ArchiveEntry {
                    name: file.name().to_string(),
                    size: file.size(),
                    compressed_size: file.compressed_size(),
                    is_dir: file.is_dir(),
                }),
                Err(e) => errors.push(EvidenceError::UnreadableMember {
                    name: format!("#{i}"),
                    reason: e.to_string(),
                }),
            }
        }

        (
            ArchiveListing {
                entries,
                archive_len: self.len,
            },
            errors,
        )
    }

    /// Decompress at most `limit` bytes of the named member.
    ///
    /// `Ok(None)` when no member has that name.
    pub fn read_named(&mut self, name: &str, limit: u64) -> Result<Option<Vec<u8>>, EvidenceError> {
        let file = match self.archive.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(unreadable(name, e)),
        };
        read_bounded(file, name, limit).map(Some)
    }

    /// Decompress at most `limit` bytes of every member whose name passes
    /// `select`, in central-directory order.
    ///
    /// Selection runs on the raw entry, so members that are not selected are
    /// never decompressed and cannot fail. Entries with undecodable headers
    /// are skipped here; `listing` reports them.
    pub fn read_matching(
        &mut self,
        limit: u64,
        select: impl Fn(&str) -> bool,
    ) -> (Vec<(String, Vec<u8>)>, Vec<EvidenceError>) {
        let mut out = Vec::new();
        let mut errors = Vec::new();

        for i in 0..self.archive.len() {
            let name = match self.archive.by_index_raw(i) {
                Ok(raw) if !raw.is_dir() && select(raw.name()) => raw.name().to_string(),
                _ => continue,
            };
            let file = match self.archive.by_index(i) {
                Ok(file) => file,
                Err(e) => {
                    errors.push(unreadable(&name, e));
                    continue;
                }
            };
            match read_bounded(file, &name, limit) {
                Ok(bytes) => out.push((name, bytes)),
                Err(e) => errors.push(e),
            }
        }

        (out, errors)
    }
}

fn read_bounded(file: zip::read::ZipFile<'_>, name: &str, limit: u64) -> Result<Vec<u8>, EvidenceError> {
    let mut buf = Vec::new();
    file.take(limit)
        .read_to_end(&mut buf)
        .map_err(|e| unreadable(name, e))?;
    Ok(buf)
}

fn unreadable(name: &str, e: impl std::fmt::Display) -> EvidenceError {
    EvidenceError::UnreadableMember {
        name: name.to_string(),
        reason: e.to_string(),
    }
}

/// Lowercase extension of a file name, if any.
pub fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}


#[cfg(test)]
mod tests {
    use super::test_support::mark_encrypted;
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;

    fn build_zip(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in files {
            if name.ends_with('/') {
                writer.add_directory(*name, FileOptions::default()).unwrap();
            } else {
                writer.start_file(*name, FileOptions::default()).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn lists_entries_without_reading_them() {
        let bytes = build_zip(&[("docs/", b""), ("docs/a.txt", b"hello"), ("run.EXE", b"MZ")]);
        let mut reader = ArchiveReader::open(&bytes).unwrap();
        let (listing, errors) = reader.listing();

        assert!(errors.is_empty());
        assert_eq!(listing.entries.len(), 3);
        assert!(listing.entries[0].is_dir);
        assert_eq!(listing.entries[1].size, 5);
        assert_eq!(extension_of(listing.entries[2].basename()).as_deref(), Some("exe"));
        assert_eq!(listing.files().count(), 2);
        assert_eq!(listing.archive_len, bytes.len() as u64);
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let err = ArchiveReader::open(b"definitely not a zip").err().unwrap();
        assert!(matches!(err, EvidenceError::InvalidArchive(_)));
    }

    #[test]
    fn reads_are_bounded() {
        let bytes = build_zip(&[("big.txt", &[b'a'; 4096])]);
        let mut reader = ArchiveReader::open(&bytes).unwrap();

        let data = reader.read_named("big.txt", 100).unwrap().unwrap();
        assert_eq!(data.len(), 100);
        assert!(reader.read_named("missing.txt", 100).unwrap().is_none());
    }

    #[test]
    fn read_matching_skips_directories_and_unselected() {
        let bytes = build_zip(&[("d/", b""), ("a.txt", b"A"), ("b.bin", b"B")]);
        let mut reader = ArchiveReader::open(&bytes).unwrap();

        let (members, errors) = reader.read_matching(10, |n| n.ends_with(".txt"));
        assert!(errors.is_empty());
        assert_eq!(members, vec![("a.txt".to_string(), b"A".to_vec())]);
    }

    #[test]
    fn unselected_undecodable_member_is_not_touched() {
        let bytes = mark_encrypted(
            build_zip(&[("a.txt", b"A"), ("assets/big.bin", b"secret")]),
            "assets/big.bin",
        );
        let mut reader = ArchiveReader::open(&bytes).unwrap();

        let (members, errors) = reader.read_matching(10, |n| n.ends_with(".txt"));
        assert!(errors.is_empty());
        assert_eq!(members.len(), 1);
    }

    #[test]
    fn selected_undecodable_member_is_reported_by_name() {
        let bytes = mark_encrypted(
            build_zip(&[("a.txt", b"A"), ("b.txt", b"B")]),
            "b.txt",
        );
        let mut reader = ArchiveReader::open(&bytes).unwrap();

        let (members, errors) = reader.read_matching(10, |_| true);
        assert_eq!(members, vec![("a.txt".to_string(), b"A".to_vec())]);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            EvidenceError::UnreadableMember { name, .. } if name == "b.txt"
        ));

        let (listing, listing_errors) = reader.listing();
        assert!(listing_errors.is_empty());
        assert_eq!(listing.entries.len(), 2);
    }

    #[test]
    fn ratio_uses_container_length() {
        let listing = ArchiveListing {
            entries: vec![ArchiveEntry {
                name: "x".into(),
                size: 2000,
                compressed_size: 1,
                is_dir: false,
            }],
            archive_len: 1,
        };
        assert_eq!(listing.compression_ratio(), Some(2000.0));
        assert_eq!(ArchiveListing::default().compression_ratio(), None);
    }

    #[test]
    fn basename_and_extension() {
        let e = ArchiveEntry {
            name: "a/b/.hidden".into(),
            size: 0,
            compressed_size: 0,
            is_dir: false,
        };
        assert_eq!(e.basename(), ".hidden");
        assert_eq!(extension_of(e.basename()), None);
        assert_eq!(extension_of("payload.tar.GZ").as_deref(), Some("gz"));
    }
}
