use anyhow::{Context, Result};
use std::{fs, path::Path};

use super::ScanInput;

/// Read a file artifact from disk into a scan input.
///
/// Only the bytes and the file name are kept. Filesystem metadata
/// (timestamps, permissions, etc.) is ignored so that identical bytes
/// always yield identical verdicts.
pub fn read_artifact(path: &Path) -> Result<ScanInput> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read artifact: {}", path.display()))?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    Ok(ScanInput::File { bytes, filename })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    #[test]
    fn reads_bytes_and_file_name() {
        let mut file = Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.4").unwrap();
        file.flush().unwrap();

        let input = read_artifact(file.path()).expect("artifact read succeeds");

        let ScanInput::File { bytes, filename } = input else {
            panic!("expected a file input");
        };
        assert_eq!(bytes, b"%PDF-1.4");
        assert!(filename.unwrap().ends_with(".pdf"));
    }

    #[test]
    fn empty_file_is_read_as_empty_input() {
        let file = NamedTempFile::new().unwrap();
        let input = read_artifact(file.path()).unwrap();

        assert!(matches!(input, ScanInput::File { ref bytes, .. } if bytes.is_empty()));
    }

    #[test]
    fn missing_file_returns_error() {
        let err = read_artifact(Path::new("non_existent.zip")).unwrap_err();
        assert!(err.to_string().contains("non_existent.zip"));
    }
}
