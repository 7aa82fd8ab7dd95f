pub mod kind;
pub mod read;

pub use kind::ArtifactKind;

/// Caller-supplied scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanInput {
    File {
        bytes: Vec<u8>,
        filename: Option<String>,
    },
    Url(String),
    Email(String),
}

impl ScanInput {
    pub fn file(bytes: impl Into<Vec<u8>>, filename: Option<&str>) -> Self {
        ScanInput::File {
            bytes: bytes.into(),
            filename: filename.map(str::to_string),
        }
    }

    /// Resolve the artifact kind.
    ///
    /// Precedence for files: declared hint, then file name extension, then
    /// magic bytes. Anything unresolved falls back to `Generic`.
    pub fn detect_kind(&self, hint: Option<&str>) -> ArtifactKind {
        match self {
            ScanInput::Url(_) => ArtifactKind::Url,
            ScanInput::Email(_) => ArtifactKind::Email,
            ScanInput::File { bytes, filename } => hint
                .and_then(ArtifactKind::from_hint)
                .filter(|k| !matches!(k, ArtifactKind::Url | ArtifactKind::Email))
                .or_else(|| filename.as_deref().and_then(ArtifactKind::from_filename))
                .or_else(|| ArtifactKind::sniff(bytes))
                .unwrap_or(ArtifactKind::Generic),
        }
    }
}

/// The thing being scanned, owned by the coordinator for one scan.
///
/// Bytes are held in memory only and dropped with the descriptor.
#[derive(Debug)]
pub struct ArtifactDescriptor {
    kind: ArtifactKind,
    payload: Vec<u8>,
    filename: Option<String>,
}

impl ArtifactDescriptor {
    pub fn new(input: ScanInput, kind: ArtifactKind) -> Self {
        match input {
            ScanInput::File { bytes, filename } => Self {
                kind,
                payload: bytes,
                filename,
            },
            ScanInput::Url(target) | ScanInput::Email(target) => Self {
                kind,
                payload: target.trim().as_bytes().to_vec(),
                filename: None,
            },
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn len(&self) -> u64 {
        self.payload.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The URL or email address for target kinds.
    pub fn target(&self) -> Option<&str> {
        match self.kind {
            ArtifactKind::Url | ArtifactKind::Email => std::str::from_utf8(&self.payload).ok(),
            _ => None,
        }
    }
}
