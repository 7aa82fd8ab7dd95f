use std::io::{Cursor, Write};
use std::sync::Arc;

use vigil_core::artifact::read::read_artifact;
use vigil_core::artifact::{ArtifactDescriptor, ArtifactKind};
use vigil_core::extract::Evidence;
use vigil_core::extract::archive::{ArchiveEntry, ArchiveListing};
use vigil_core::inspect::{ExtensionInspector, Inspector, StructuralInspector};
use vigil_core::report::model::{ArtifactDetails, ToolInfo};
use vigil_core::reputation::{ReputationQuery, ReputationReport, StaticReputation};
use vigil_core::verdict::aggregate;
use vigil_core::{
    CancelToken, FindingKind, RiskLevel, RiskVerdict, RuleSet, ScanFailed, ScanInput, Scanner,
    Severity, ThreatConfig,
};
use zip::CompressionMethod;
use zip::write::FileOptions;

fn scanner() -> Scanner {
    Scanner::new(Arc::new(RuleSet::default()))
}

fn zip_of(files: &[(&str, &[u8])]) -> Vec<u8> {
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in files {
        writer.start_file(*name, options).expect("start zip entry");
        writer.write_all(data).expect("write zip entry");
    }
    writer.finish().expect("finish zip").into_inner()
}

fn scan_file(bytes: Vec<u8>, name: &str) -> RiskVerdict {
    scanner()
        .scan(ScanInput::file(bytes, Some(name)), None)
        .expect("scan should succeed")
}

fn count(verdict: &RiskVerdict, kind: &FindingKind) -> usize {
    verdict.findings().iter().filter(|f| f.kind() == kind).count()
}

fn has(verdict: &RiskVerdict, kind: &FindingKind, severity: Severity) -> bool {
    verdict
        .findings()
        .iter()
        .any(|f| f.kind() == kind && f.severity() == severity)
}

const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<manifest xmlns:android="http://schemas.android.com/apk/res/android" package="com.example.torch">
    <uses-permission android:name="android.permission.CAMERA" />
    <uses-permission android:name="android.permission.READ_SMS" />
    <uses-permission android:name="android.permission.SEND_SMS" />
    <uses-permission android:name="android.permission.INTERNET" />
    <application>
        <activity android:name=".MainActivity" />
    </application>
</manifest>
"#;

#[test]
fn archive_with_executable_is_critical() {
    let bytes = zip_of(&[
        ("readme.txt", b"Thanks for downloading."),
        ("payload.exe", b"plain bytes"),
    ]);

    let verdict = scan_file(bytes, "bundle.zip");

    assert_eq!(verdict.risk_level(), RiskLevel::Critical);
    assert_eq!(verdict.exit_code(), 3);
    assert!(has(&verdict, &FindingKind::DangerousExtension, Severity::Critical));
    assert!(
        verdict
            .recommendations()
            .iter()
            .any(|r| r == "Do not run executable files from this artifact")
    );
    assert_eq!(
        verdict.recommendations().last().map(String::as_str),
        Some("Treat this artifact as highly dangerous")
    );
}

#[test]
fn executable_in_extreme_ratio_archive() {
    let archive_len = 1_000u64;
    let evidence = Evidence {
        archive: Some(ArchiveListing {
            entries: vec![ArchiveEntry {
                name: "payload.exe".into(),
                size: archive_len * 2000,
                compressed_size: archive_len / 2,
                is_dir: false,
            }],
            archive_len,
        }),
        ..Evidence::default()
    };
    let artifact = ArtifactDescriptor::new(
        ScanInput::file(vec![b'P'; archive_len as usize], Some("bundle.zip")),
        ArtifactKind::Archive,
    );
    let rules = RuleSet::default();

    let mut findings = Vec::new();
    for inspector in [&ExtensionInspector as &dyn Inspector, &StructuralInspector] {
        findings.extend(
            inspector
                .inspect(&artifact, &evidence, &rules)
                .expect("inspector should succeed"),
        );
    }
    let verdict = aggregate(findings, &rules.weights);

    assert!(has(&verdict, &FindingKind::DangerousExtension, Severity::Critical));
    assert!(has(&verdict, &FindingKind::CompressionBomb, Severity::Critical));
    assert_eq!(verdict.risk_level(), RiskLevel::Critical);
}

#[test]
fn zero_filled_member_is_a_compression_bomb() {
    let zeros = vec![0u8; 200 * 1024];
    let bytes = zip_of(&[("zeros.bin", zeros.as_slice())]);

    let verdict = scan_file(bytes, "zeros.zip");

    assert!(has(&verdict, &FindingKind::CompressionBomb, Severity::High));
    assert_eq!(verdict.risk_level(), RiskLevel::High);
    assert_eq!(verdict.exit_code(), 2);
}

#[test]
fn four_keyword_hits_escalate_to_high() {
    let bytes = zip_of(&[(
        "install.txt",
        b"run powershell, then wget the stage, curl the config and start cmd.exe",
    )]);

    let verdict = scan_file(bytes, "tools.zip");

    assert_eq!(count(&verdict, &FindingKind::SuspiciousContent), 4);
    assert!(
        verdict
            .findings()
            .iter()
            .all(|f| f.severity() == Severity::Medium)
    );
    assert_eq!(verdict.risk_level(), RiskLevel::High);
}

#[test]
fn traversal_entry_is_critical() {
    let bytes = zip_of(&[("../../home/user/.bashrc", b"alias ls=rm")]);

    let verdict = scan_file(bytes, "update.zip");

    assert!(has(&verdict, &FindingKind::PathTraversal, Severity::Critical));
    assert!(has(&verdict, &FindingKind::HiddenFile, Severity::Low));
    assert_eq!(verdict.risk_level(), RiskLevel::Critical);
}

#[test]
fn invalid_archive_fails_the_scan() {
    let result = scanner().scan(
        ScanInput::file(b"definitely not a zip file".to_vec(), Some("broken.zip")),
        None,
    );

    assert!(matches!(result, Err(ScanFailed::InvalidFormat { .. })));
}

#[test]
fn clean_pdf_is_low_with_safe_recommendation() {
    let pdf = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n\
2 0 obj\n<< /Type /Pages /Kids [] /Count 0 >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n";

    let verdict = scan_file(pdf.to_vec(), "letter.pdf");

    assert!(verdict.findings().is_empty(), "{:?}", verdict.findings());
    assert_eq!(verdict.risk_level(), RiskLevel::Low);
    assert_eq!(verdict.risk_score(), 0);
    assert_eq!(
        verdict.recommendations(),
        ["No threats detected; the artifact appears safe".to_string()]
    );
}

#[test]
fn pdf_with_javascript_and_attachment() {
    let pdf = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog /OpenAction 3 0 R /Names << /EmbeddedFiles 4 0 R >> >>\nendobj\n\
3 0 obj\n<< /S /JavaScript /JS (app.alert('hi')) >>\nendobj\n\
4 0 obj\n<< /Type /Filespec /F (invoice.exe) /EmbeddedFile 5 0 R >>\nendobj\n%%EOF\n";

    let verdict = scan_file(pdf.to_vec(), "invoice.pdf");

    assert!(has(&verdict, &FindingKind::EmbeddedScript, Severity::High));
    assert!(has(&verdict, &FindingKind::EmbeddedFile, Severity::Medium));
    assert_eq!(verdict.risk_level(), RiskLevel::Critical);
}

#[test]
fn pdf_report_carries_document_structure() {
    let pdf = b"%PDF-1.6\n1 0 obj\n<< /Type /Catalog /Pages 2 0 R /AcroForm 5 0 R >>\nendobj\n\
3 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n\
4 0 obj\n<< /Type /Page /Parent 2 0 R >>\nendobj\n%%EOF\n";

    let report = scanner()
        .scan_report(ScanInput::file(pdf.to_vec(), Some("form.pdf")), None, tool())
        .expect("scan should succeed");

    assert_eq!(
        report.artifact.details,
        Some(ArtifactDetails::Pdf {
            version: Some("1.6".into()),
            page_count: 2,
            has_forms: true,
            has_open_action: false,
            has_javascript: false,
        })
    );
}

#[test]
fn pdf_without_header_fails_the_scan() {
    let result = scanner().scan(
        ScanInput::file(b"just some text pretending".to_vec(), None),
        Some("pdf"),
    );

    assert!(matches!(result, Err(ScanFailed::InvalidFormat { .. })));
}

#[test]
fn apk_permissions_and_code_markers() {
    let bytes = zip_of(&[
        ("AndroidManifest.xml", MANIFEST.as_bytes()),
        ("classes.dex", b"dex\n035\0Ldalvik/system/DexClassLoader;"),
    ]);

    let verdict = scan_file(bytes, "torch.apk");

    assert_eq!(count(&verdict, &FindingKind::DangerousPermission), 3);
    assert!(has(&verdict, &FindingKind::ExcessivePermissions, Severity::Medium));
    assert!(has(&verdict, &FindingKind::SuspiciousApi, Severity::Medium));
    assert_eq!(verdict.risk_level(), RiskLevel::Medium);
    assert!(
        verdict
            .recommendations()
            .iter()
            .any(|r| r == "Review requested permissions before installing")
    );
}

#[test]
fn apk_report_carries_package_and_components() {
    let bytes = zip_of(&[
        ("AndroidManifest.xml", MANIFEST.as_bytes()),
        ("classes.dex", b"dex\n035\0"),
    ]);

    let report = scanner()
        .scan_report(ScanInput::file(bytes, Some("torch.apk")), None, tool())
        .expect("scan should succeed");

    assert_eq!(
        report.artifact.details,
        Some(ArtifactDetails::Apk {
            package: Some("com.example.torch".into()),
            components: vec![".MainActivity".into()],
            permission_count: 4,
            dex_files: 1,
        })
    );
}

#[test]
fn apk_without_manifest_is_reported() {
    let bytes = zip_of(&[("classes.dex", b"dex\n035\0")]);

    let verdict = scan_file(bytes, "stripped.apk");

    assert!(has(&verdict, &FindingKind::MissingManifest, Severity::Medium));
    assert_eq!(verdict.risk_level(), RiskLevel::Medium);
}

#[test]
fn zip_without_apk_name_is_sniffed_as_apk() {
    let bytes = zip_of(&[("AndroidManifest.xml", MANIFEST.as_bytes())]);

    let report = scanner()
        .scan_report(ScanInput::file(bytes, None), None, tool())
        .expect("scan should succeed");

    assert_eq!(report.artifact.kind, ArtifactKind::Apk);
}

#[test]
fn known_bad_hash_from_config_is_critical() {
    let bytes = zip_of(&[("notes.txt", b"hello")]);
    let sha256 = vigil_core::extract::hashes::fingerprint(&bytes).sha256;

    let mut config = ThreatConfig::default();
    config.reputation.known_bad_sha256 = vec![sha256.to_uppercase()];
    let scanner = Scanner::new(Arc::new(RuleSet::compile(&config).expect("rules compile")));

    let verdict = scanner
        .scan(ScanInput::file(bytes, Some("notes.zip")), None)
        .expect("scan should succeed");

    assert!(has(&verdict, &FindingKind::KnownMalwareHash, Severity::Critical));
}

#[test]
fn email_in_breach_is_high() {
    let source = StaticReputation::new().with(
        ReputationQuery::Email("alice@example.com".into()),
        ReputationReport::listed("3 breaches"),
    );
    let scanner = scanner().with_reputation(Arc::new(source));

    let verdict = scanner
        .scan(ScanInput::Email("Alice@Example.com".into()), None)
        .expect("scan should succeed");

    assert!(has(&verdict, &FindingKind::BreachExposure, Severity::High));
    assert_eq!(verdict.risk_level(), RiskLevel::High);
    assert!(
        verdict
            .recommendations()
            .iter()
            .any(|r| r == "Enable two-factor authentication")
    );
}

#[test]
fn freshly_registered_domain_is_high() {
    let source = StaticReputation::new().with(
        ReputationQuery::Domain("shop.example.net".into()),
        ReputationReport {
            found: false,
            detail: None,
            domain_age_days: Some(5),
        },
    );
    let scanner = scanner().with_reputation(Arc::new(source));

    let verdict = scanner
        .scan(ScanInput::Url("https://shop.example.net/deals".into()), None)
        .expect("scan should succeed");

    assert!(has(
        &verdict,
        &FindingKind::RecentDomainRegistration,
        Severity::High
    ));
    assert_eq!(verdict.findings().len(), 1);
}

#[test]
fn url_without_reputation_source_uses_local_checks_only() {
    let verdict = scanner()
        .scan(ScanInput::Url("http://198.51.100.7/secure-login".into()), None)
        .expect("scan should succeed");

    assert!(has(&verdict, &FindingKind::InsecureTransport, Severity::Medium));
    assert!(has(&verdict, &FindingKind::PhishingPattern, Severity::High));
    assert_eq!(count(&verdict, &FindingKind::ReputationUnavailable), 0);
    assert_eq!(verdict.risk_level(), RiskLevel::High);
}

#[test]
fn cancelled_token_stops_the_scan() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = scanner().scan_with_cancel(
        ScanInput::file(zip_of(&[("a.txt", b"a")]), Some("a.zip")),
        None,
        &cancel,
    );

    assert_eq!(result, Err(ScanFailed::Cancelled));
}

#[test]
fn empty_zip_bytes_fail_the_scan() {
    let result = scanner().scan(ScanInput::file(Vec::new(), Some("empty.zip")), None);

    assert!(matches!(result, Err(ScanFailed::EmptyArtifact { .. })));
}

#[test]
fn identical_inputs_give_identical_reports() {
    let bytes = zip_of(&[
        ("docs/readme.txt", b"see https://bit.ly/x and 10.0.0.7"),
        (".hidden", b"x"),
    ]);

    let a = scanner()
        .scan_report(ScanInput::file(bytes.clone(), Some("a.zip")), None, tool())
        .expect("scan should succeed");
    let b = scanner()
        .scan_report(ScanInput::file(bytes, Some("a.zip")), None, tool())
        .expect("scan should succeed");

    assert_eq!(
        serde_json::to_string(&a).expect("serialize"),
        serde_json::to_string(&b).expect("serialize")
    );
}

#[test]
fn read_artifact_feeds_the_scanner() {
    let mut tmp = tempfile::Builder::new()
        .suffix(".zip")
        .tempfile()
        .expect("create temp file");
    tmp.write_all(&zip_of(&[("run.bat", b"echo hi")]))
        .expect("write zip");
    tmp.flush().expect("flush");

    let input = read_artifact(tmp.path()).expect("read artifact");
    let report = scanner()
        .scan_report(input, None, tool())
        .expect("scan should succeed");

    assert_eq!(report.artifact.kind, ArtifactKind::Archive);
    assert!(report.artifact.sha256.is_some());
    assert_eq!(report.exit_code(), 3);
}

fn tool() -> ToolInfo {
    ToolInfo {
        name: "vigil".into(),
        version: "0.1.0-test".into(),
        commit: None,
    }
}
