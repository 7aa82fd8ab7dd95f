//! Evidence extraction.
//!
//! Responsibilities:
//! - Turn artifact bytes (or a target string) into structured evidence
//! - Bound every read by the configured limits
//! - Record per-extractor failures without aborting the others
//!
//! Non-responsibilities:
//! - Judging the evidence (inspectors)
//! - Deciding whether a failure ends the scan (coordinator)

pub mod apk_code;
pub mod archive;
pub mod endpoints;
pub mod hashes;
pub mod manifest;
pub mod pdf;
pub mod target;
pub mod text;

use std::collections::BTreeSet;

use crate::artifact::{ArtifactDescriptor, ArtifactKind};
use crate::config::RuleSet;
use crate::error::EvidenceError;
use crate::findings::Finding;

use apk_code::ApkCodeInfo;
use archive::{ArchiveListing, ArchiveReader};
use endpoints::EndpointSet;
use hashes::FileHashes;
use manifest::ManifestInfo;
use pdf::PdfMarkers;
use target::{EmailTarget, Target, UrlTarget};
use text::TextUnit;

/// Everything the extractors learned about one artifact.
///
/// Absent evidence is `None`/empty; inspectors skip the checks that need it.
#[derive(Debug, Clone, Default)]
pub struct Evidence {
    pub hashes: Option<FileHashes>,
    pub archive: Option<ArchiveListing>,
    pub manifest: Option<ManifestInfo>,
    pub apk_code: Option<ApkCodeInfo>,
    pub pdf: Option<PdfMarkers>,
    pub text: Vec<TextUnit>,
    pub endpoints: EndpointSet,
    pub target: Option<Target>,
    /// Non-fatal extractor failures, keyed by extractor name.
    pub errors: Vec<(&'static str, EvidenceError)>,
}

impl Evidence {
    /// Material extractor failures surfaced as findings.
    pub fn error_findings(&self) -> Vec<Finding> {
        self.errors
            .iter()
            .filter(|(_, e)| e.is_material())
            .map(|(name, e)| e.to_finding(&format!("extract::{name}")))
            .collect()
    }
}

/// Run the extractors relevant to the artifact kind.
///
/// `Err` means the bytes do not have the structure the kind requires
/// (not a ZIP, no PDF header, unparseable target).
pub fn gather(artifact: &ArtifactDescriptor, rules: &RuleSet) -> Result<Evidence, EvidenceError> {
    let mut ev = Evidence::default();
    let limits = &rules.limits;

    match artifact.kind() {
        ArtifactKind::Url => {
            let raw = artifact.target().unwrap_or_default();
            ev.target = Some(Target::Url(UrlTarget::parse(raw)?));
        }
        ArtifactKind::Email => {
            let raw = artifact.target().unwrap_or_default();
            ev.target = Some(Target::Email(EmailTarget::parse(raw)?));
        }
        ArtifactKind::Archive | ArtifactKind::Apk => {
            let bytes = artifact.bytes();
            let mut reader = ArchiveReader::open(bytes)?;
            ev.hashes = Some(hashes::fingerprint(bytes));

            let (listing, listing_errors) = reader.listing();
            ev.errors
                .extend(listing_errors.into_iter().map(|e| ("archive", e)));

            let small: BTreeSet<&str> = listing
                .files()
                .filter(|e| e.size <= limits.max_member_bytes)
                .map(|e| e.name.as_str())
                .collect();
            let (members, read_errors) =
                reader.read_matching(limits.max_member_bytes, |name| small.contains(name));
            ev.errors.extend(read_errors.into_iter().map(|e| ("archive", e)));

            if artifact.kind() == ArtifactKind::Apk {
                gather_apk(&mut reader, &members, &small, rules, &mut ev);
            }
            ev.text = members
                .into_iter()
                .filter(|(_, bytes)| text::is_probably_text(bytes))
                .map(|(name, bytes)| TextUnit::new(name, String::from_utf8_lossy(&bytes)))
                .collect();
            ev.archive = Some(listing);
        }
        ArtifactKind::Pdf => {
            let bytes = artifact.bytes();
            ev.pdf = Some(pdf::scan_pdf(bytes)?);
            ev.hashes = Some(hashes::fingerprint(bytes));
            ev.text = vec![TextUnit::document(bytes, limits.max_text_bytes)];
        }
        ArtifactKind::Generic => {
            let bytes = artifact.bytes();
            ev.hashes = Some(hashes::fingerprint(bytes));
            if !bytes.is_empty() {
                ev.text = vec![TextUnit::document(bytes, limits.max_text_bytes)];
            }
        }
    }

    ev.endpoints = endpoints::extract_endpoints(&ev.text);
    Ok(ev)
}

/// Manifest and DEX evidence for an APK.
///
/// `read` holds the members already decompressed by the archive pass and
/// `attempted` every name that pass tried. Attempted members are never read
/// twice, so a broken member is reported once.
fn gather_apk(
    reader: &mut ArchiveReader<'_>,
    read: &[(String, Vec<u8>)],
    attempted: &BTreeSet<&str>,
    rules: &RuleSet,
    ev: &mut Evidence,
) {
    let limit = rules.limits.max_text_bytes;

    let manifest_bytes = match read.iter().find(|(name, _)| name == manifest::MANIFEST_NAME) {
        Some((_, bytes)) => Some(Ok(Some(bytes.clone()))),
        None if attempted.contains(manifest::MANIFEST_NAME) => None,
        None => Some(reader.read_named(manifest::MANIFEST_NAME, limit)),
    };
    match manifest_bytes {
        Some(Ok(Some(bytes))) => match manifest::parse_manifest(&bytes) {
            Ok(info) => ev.manifest = Some(info),
            Err(e) => ev.errors.push(("manifest", e)),
        },
        Some(Ok(None)) => ev.errors.push(("manifest", EvidenceError::MissingManifest)),
        Some(Err(e)) => ev.errors.push(("manifest", e)),
        None => {}
    }

    let (large_dex, errors) = reader.read_matching(limit, |name| {
        apk_code::is_dex_member(name) && !attempted.contains(name)
    });
    ev.errors.extend(errors.into_iter().map(|e| ("apk_code", e)));

    let dex = read
        .iter()
        .filter(|(name, _)| apk_code::is_dex_member(name))
        .chain(large_dex.iter())
        .map(|(_, bytes)| bytes.as_slice());
    ev.apk_code = Some(apk_code::scan_dex(dex, rules));
}
