//! AndroidManifest reader.
//!
//! Handles both plain-text XML manifests and the compiled binary (AXML)
//! form. For AXML only the string pool is decoded: permission names are
//! recovered from it, element structure is not.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::EvidenceError;
use crate::util::deterministic::sort_unique;

pub const MANIFEST_NAME: &str = "AndroidManifest.xml";

static RE_PACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<manifest\b[^>]*?\bpackage\s*=\s*"([^"]+)""#).expect("valid package regex")
});
static RE_PERMISSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<uses-permission(?:-sdk-23)?\b[^>]*?\bandroid:name\s*=\s*"([^"]+)""#)
        .expect("valid permission regex")
});
static RE_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<(?:activity|activity-alias|service|receiver|provider)\b[^>]*?\bandroid:name\s*=\s*"([^"]+)""#)
        .expect("valid component regex")
});

const AXML_FILE_TYPE: u16 = 0x0003;
const STRING_POOL_TYPE: u16 = 0x0001;
const UTF8_FLAG: u32 = 0x100;

/// Facts recovered from an APK manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestInfo {
    pub package: Option<String>,
    /// Requested permissions, fully qualified as declared. Sorted, unique.
    pub permissions: Vec<String>,
    /// Declared activities, services, receivers and providers. Sorted, unique.
    pub components: Vec<String>,
}

pub fn parse_manifest(bytes: &[u8]) -> Result<ManifestInfo, EvidenceError> {
    if read_u16_le(bytes, 0) == Some(AXML_FILE_TYPE) {
        return parse_binary(bytes);
    }

    match std::str::from_utf8(bytes) {
        Ok(text) if text.contains("<manifest") => Ok(parse_text(text)),
        _ => Err(EvidenceError::MalformedManifest(
            "neither text XML nor binary AXML".into(),
        )),
    }
}

fn parse_text(text: &str) -> ManifestInfo {
    let capture = |re: &Regex| -> Vec<String> {
        re.captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .collect()
    };

    let mut info = ManifestInfo {
        package: RE_PACKAGE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        permissions: capture(&RE_PERMISSION),
        components: capture(&RE_COMPONENT),
    };
    sort_unique(&mut info.permissions);
    sort_unique(&mut info.components);
    info
}

fn parse_binary(bytes: &[u8]) -> Result<ManifestInfo, EvidenceError> {
    let strings = string_pool(bytes)?;

    let mut permissions: Vec<String> = strings
        .into_iter()
        .filter(|s| s.contains(".permission."))
        .collect();
    sort_unique(&mut permissions);

    Ok(ManifestInfo {
        package: None,
        permissions,
        components: Vec::new(),
    })
}

/// Decode the string pool chunk that follows the AXML file header.
fn string_pool(bytes: &[u8]) -> Result<Vec<String>, EvidenceError> {
    let malformed = |what: &str| EvidenceError::MalformedManifest(what.to_string());

    let base = 8usize;
    if read_u16_le(bytes, base) != Some(STRING_POOL_TYPE) {
        return Err(malformed("string pool chunk not found"));
    }
    let header_size = read_u16_le(bytes, base + 2).ok_or_else(|| malformed("truncated header"))? as usize;
    let chunk_size = read_u32_le(bytes, base + 4).ok_or_else(|| malformed("truncated header"))? as usize;
    let count = read_u32_le(bytes, base + 8).ok_or_else(|| malformed("truncated header"))? as usize;
    let flags = read_u32_le(bytes, base + 16).ok_or_else(|| malformed("truncated header"))?;
    let strings_start =
        read_u32_le(bytes, base + 20).ok_or_else(|| malformed("truncated header"))? as usize;

    let chunk_end = base.saturating_add(chunk_size).min(bytes.len());
    let offsets_at = base + header_size;
    let data_at = base + strings_start;
    let utf8 = flags & UTF8_FLAG != 0;

    // Each offset is four bytes; reject counts the chunk cannot hold.
    if count > chunk_end.saturating_sub(offsets_at) / 4 {
        return Err(malformed("string count exceeds chunk"));
    }

    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let Some(off) = read_u32_le(bytes, offsets_at + i * 4) else {
            break;
        };
        let at = data_at.saturating_add(off as usize);
        if at >= chunk_end {
            continue;
        }
        let decoded = if utf8 {
            decode_utf8(&bytes[..chunk_end], at)
        } else {
            decode_utf16(&bytes[..chunk_end], at)
        };
        if let Some(s) = decoded {
            out.push(s);
        }
    }
    Ok(out)
}

fn decode_utf8(data: &[u8], at: usize) -> Option<String> {
    // utf16 length, then utf8 length; each one or two bytes
    let (_, n) = varlen_u8(data, at)?;
    let (len, m) = varlen_u8(data, at + n)?;
    let start = at + n + m;
    let raw = data.get(start..start + len)?;
    Some(String::from_utf8_lossy(raw).into_owned())
}

fn decode_utf16(data: &[u8], at: usize) -> Option<String> {
    let first = read_u16_le(data, at)? as usize;
    let (len, start) = if first & 0x8000 != 0 {
        let second = read_u16_le(data, at + 2)? as usize;
        (((first & 0x7fff) << 16) | second, at + 4)
    } else {
        (first, at + 2)
    };
    let raw = data.get(start..start.checked_add(len.checked_mul(2)?)?)?;
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .collect();
    Some(String::from_utf16_lossy(&units))
}

fn varlen_u8(data: &[u8], at: usize) -> Option<(usize, usize)> {
    let first = *data.get(at)? as usize;
    if first & 0x80 != 0 {
        let second = *data.get(at + 1)? as usize;
        Some((((first & 0x7f) << 8) | second, 2))
    } else {
        Some((first, 1))
    }
}

fn read_u16_le(data: &[u8], off: usize) -> Option<u16> {
    data.get(off..off + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn read_u32_le(data: &[u8], off: usize) -> Option<u32> {
    data.get(off..off + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}
