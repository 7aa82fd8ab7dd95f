use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content fingerprints of an artifact, lowercase hex.
///
/// Depends only on the bytes, never on file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHashes {
    pub md5: String,
    pub sha256: String,
}

pub fn fingerprint(bytes: &[u8]) -> FileHashes {
    let mut hasher = Sha256::new();
    hasher.update(bytes);

    FileHashes {
        md5: format!("{:x}", md5::compute(bytes)),
        sha256: hex::encode(hasher.finalize()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_well_known_digests() {
        let h = fingerprint(b"");
        assert_eq!(h.md5, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(
            h.sha256,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn different_inputs_produce_different_hashes() {
        assert_ne!(fingerprint(b"data-a"), fingerprint(b"data-b"));
    }
}
