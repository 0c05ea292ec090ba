#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Registration and dispatch semantics of the check engine, exercised with
//! hand-built certificate data so every case is independent of the parser.

use std::thread;
use xlint_lib::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn oid(s: &str) -> Oid {
    s.parse().unwrap()
}

fn cert(cert_type: CertType, extensions: Vec<Extension>) -> CertificateData {
    CertificateData {
        version: 3,
        cert_type,
        subject: DistinguishedName::new([("CN", "www.example.com")]),
        extensions,
        ..Default::default()
    }
}

fn ext(dotted: &str) -> Extension {
    Extension::raw(oid(dotted), false, vec![0x05, 0x00])
}

fn messages(d: &Diagnostics) -> Vec<&str> {
    d.iter().map(|f| f.message.as_str()).collect()
}

/// A certificate check that reports its own name.
fn named(name: &'static str) -> impl Fn(&CertificateData) -> CheckResult + Send + Sync {
    move |_| {
        let mut d = Diagnostics::new();
        d.info(name);
        Ok(d)
    }
}

/// An extension check that reports its own name.
fn named_ext(
    name: &'static str,
) -> impl Fn(&Extension, &CertificateData) -> CheckResult + Send + Sync {
    move |_, _| {
        let mut d = Diagnostics::new();
        d.warning(name);
        Ok(d)
    }
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[test]
fn concurrent_registration_loses_nothing() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 50;

    let registry = Registry::new();
    thread::scope(|s| {
        for t in 0..THREADS {
            let registry = &registry;
            s.spawn(move || {
                for i in 0..PER_THREAD {
                    registry.register_certificate_check(format!("t{}-{}", t, i), None, |_| {
                        Ok(Diagnostics::new())
                    });
                    registry.register_extension_check(
                        format!("t{}-{}", t, i),
                        oid("1.2.3.4"),
                        None,
                        |_, _| Ok(Diagnostics::new()),
                    );
                }
            });
        }
    });

    assert_eq!(registry.certificate_check_count(), THREADS * PER_THREAD);
    assert_eq!(registry.extension_check_count(), THREADS * PER_THREAD);

    let engine = registry.build(LintOptions::default());
    let names = engine.certificate_checks().names();
    assert_eq!(names.len(), THREADS * PER_THREAD);

    // Within one registering thread, order is preserved.
    for t in 0..THREADS {
        let prefix = format!("t{}-", t);
        let own: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| n.starts_with(&prefix))
            .collect();
        let expected: Vec<String> = (0..PER_THREAD).map(|i| format!("t{}-{}", t, i)).collect();
        assert_eq!(own, expected);
    }
    assert_eq!(
        engine.extension_checks().for_oid(&oid("1.2.3.4")).count(),
        THREADS * PER_THREAD
    );
}

#[test]
fn duplicate_names_are_allowed() {
    let registry = Registry::new();
    registry.register_certificate_check("same", None, named("first"));
    registry.register_certificate_check("same", None, named("second"));
    let engine = registry.build(LintOptions::default());

    assert_eq!(engine.certificate_checks().names(), vec!["same", "same"]);
    let d = engine.run_certificate_checks(&cert(CertType::Dv, vec![]));
    assert_eq!(messages(&d), vec!["first", "second"]);
}

#[test]
fn empty_registry_builds_empty_engine() {
    let engine = Registry::new().build(LintOptions::default());
    assert!(engine.certificate_checks().is_empty());
    assert!(engine.extension_checks().is_empty());
    assert!(engine.lint(&cert(CertType::Dv, vec![])).is_empty());
}

// ---------------------------------------------------------------------------
// Whole-certificate checks
// ---------------------------------------------------------------------------

#[test]
fn findings_follow_registration_order() {
    let registry = Registry::new();
    registry.register_certificate_check("a", None, named("a"));
    registry.register_certificate_check("b", None, named("b"));
    registry.register_certificate_check("c", None, named("c"));
    let engine = registry.build(LintOptions::default());

    let d = engine.run_certificate_checks(&cert(CertType::Dv, vec![]));
    assert_eq!(messages(&d), vec!["a", "b", "c"]);
}

#[test]
fn filter_restricts_certificate_check() {
    let registry = Registry::new();
    registry.register_certificate_check("ov only", Some(Filter::new([CertType::Ov])), named("ov"));
    let engine = registry.build(LintOptions::default());

    assert!(engine
        .run_certificate_checks(&cert(CertType::Dv, vec![]))
        .is_empty());
    assert_eq!(
        messages(&engine.run_certificate_checks(&cert(CertType::Ov, vec![]))),
        vec!["ov"]
    );
}

#[test]
fn empty_filter_applies_to_every_type() {
    let registry = Registry::new();
    registry.register_certificate_check("any", Some(Filter::any()), named("any"));
    registry.register_certificate_check("none", None, named("none"));
    let engine = registry.build(LintOptions::default());

    for cert_type in [CertType::Dv, CertType::Ca, CertType::Ocsp, CertType::Unknown] {
        let d = engine.run_certificate_checks(&cert(cert_type, vec![]));
        assert_eq!(messages(&d), vec!["any", "none"], "type {}", cert_type);
    }
}

#[test]
fn failing_check_is_reported_and_others_still_run() {
    let registry = Registry::new();
    registry.register_certificate_check("broken", None, |_| {
        Err(XlintError::Malformed("truncated payload".into()))
    });
    registry.register_certificate_check("after", None, named("after"));
    let engine = registry.build(LintOptions::default());

    let d = engine.run_certificate_checks(&cert(CertType::Dv, vec![]));
    assert_eq!(d.len(), 2);
    assert_eq!(d.findings()[0].severity, Severity::Error);
    assert_eq!(
        d.findings()[0].message,
        "check \"broken\" failed: Malformed input: truncated payload"
    );
    assert_eq!(d.findings()[1].message, "after");
}

#[test]
fn panicking_check_is_contained() {
    let registry = Registry::new();
    registry.register_certificate_check("before", None, named("before"));
    registry.register_certificate_check("panicky", None, |_| panic!("boom"));
    registry.register_certificate_check("after", None, named("after"));
    let engine = registry.build(LintOptions::default());

    let d = engine.run_certificate_checks(&cert(CertType::Dv, vec![]));
    assert_eq!(
        messages(&d),
        vec!["before", "check \"panicky\" failed: boom", "after"]
    );
    assert!(d.has_errors());
}

// ---------------------------------------------------------------------------
// Extension dispatch
// ---------------------------------------------------------------------------

#[test]
fn unknown_extension_reported_once() {
    let engine = Registry::new().build(LintOptions::default());
    let c = cert(CertType::Dv, vec![]);

    let d = engine.dispatch_extension(&ext("1.2.3.4"), &c);
    assert_eq!(d.len(), 1);
    assert_eq!(d.findings()[0].severity, Severity::Error);
    assert_eq!(
        d.findings()[0].message,
        "Certificate contains unknown extension (1.2.3.4)"
    );
}

#[test]
fn private_enterprise_extension_not_reported() {
    let engine = Registry::new().build(LintOptions::default());
    let c = cert(CertType::Dv, vec![]);

    assert!(engine
        .dispatch_extension(&ext("1.3.6.1.4.1.9999.1"), &c)
        .is_empty());
    // The arc itself is not below the arc.
    assert_eq!(
        engine.dispatch_extension(&ext("1.3.6.1.4.1"), &c).len(),
        1
    );
    // A textual prefix is not an arc prefix.
    assert_eq!(
        engine.dispatch_extension(&ext("1.3.6.1.4.10.1"), &c).len(),
        1
    );
}

#[test]
fn registered_private_enterprise_check_still_runs() {
    let registry = Registry::new();
    registry.register_extension_check(
        "vendor",
        oid("1.3.6.1.4.1.9999.1"),
        None,
        named_ext("vendor"),
    );
    let engine = registry.build(LintOptions::default());

    let d = engine.dispatch_extension(&ext("1.3.6.1.4.1.9999.1"), &cert(CertType::Dv, vec![]));
    assert_eq!(messages(&d), vec!["vendor"]);
}

#[test]
fn checks_sharing_an_oid_all_run() {
    let registry = Registry::new();
    registry.register_extension_check("san one", oid("2.5.29.17"), None, named_ext("one"));
    registry.register_extension_check("other", oid("2.5.29.15"), None, named_ext("other"));
    registry.register_extension_check("san two", oid("2.5.29.17"), None, named_ext("two"));
    let engine = registry.build(LintOptions::default());

    let d = engine.dispatch_extension(&ext("2.5.29.17"), &cert(CertType::Dv, vec![]));
    assert_eq!(messages(&d), vec!["one", "two"]);
    assert!(engine.extension_checks().recognizes(&oid("2.5.29.17")));
}

#[test]
fn filtered_out_check_still_marks_extension_known() {
    let registry = Registry::new();
    registry.register_extension_check(
        "ev only",
        oid("1.2.3.4"),
        Some(Filter::new([CertType::Ev])),
        named_ext("ev"),
    );
    let engine = registry.build(LintOptions::default());

    // Excluded by the filter, but no unknown-extension finding either.
    assert!(engine
        .dispatch_extension(&ext("1.2.3.4"), &cert(CertType::Dv, vec![]))
        .is_empty());
    assert_eq!(
        messages(&engine.dispatch_extension(&ext("1.2.3.4"), &cert(CertType::Ev, vec![]))),
        vec!["ev"]
    );
}

#[test]
fn failing_extension_check_names_the_check() {
    let registry = Registry::new();
    registry.register_extension_check("decoder", oid("2.5.29.19"), None, |_, _| {
        Err(XlintError::Malformed("bad BIT STRING".into()))
    });
    registry.register_extension_check("sibling", oid("2.5.29.19"), None, named_ext("sibling"));
    let engine = registry.build(LintOptions::default());

    let d = engine.dispatch_extension(&ext("2.5.29.19"), &cert(CertType::Ca, vec![]));
    assert_eq!(
        messages(&d),
        vec![
            "check \"decoder\" failed: Malformed input: bad BIT STRING",
            "sibling"
        ]
    );
}

#[test]
fn extension_check_sees_extension_and_certificate() {
    let registry = Registry::new();
    registry.register_extension_check("inspect", oid("2.5.29.19"), None, |ext, cert| {
        let mut d = Diagnostics::new();
        d.info(format!("{} critical={} on {}", ext.oid, ext.critical, cert.cert_type));
        Ok(d)
    });
    let engine = registry.build(LintOptions::default());

    let e = Extension::raw(oid("2.5.29.19"), true, vec![]);
    let d = engine.dispatch_extension(&e, &cert(CertType::Ca, vec![]));
    assert_eq!(messages(&d), vec!["2.5.29.19 critical=true on CA"]);
}

// ---------------------------------------------------------------------------
// Whole lint pass
// ---------------------------------------------------------------------------

fn sample_registry() -> Registry {
    let registry = Registry::new();
    registry.register_certificate_check("c1", None, named("c1"));
    registry.register_certificate_check("c2", Some(Filter::new([CertType::Ev])), named("c2"));
    registry.register_certificate_check("c3", None, named("c3"));
    registry.register_extension_check("bc", oid("2.5.29.19"), None, named_ext("bc"));
    registry.register_extension_check("san a", oid("2.5.29.17"), None, named_ext("san a"));
    registry.register_extension_check("san b", oid("2.5.29.17"), None, named_ext("san b"));
    registry.register_extension_check("fail", oid("2.5.29.15"), None, |_, _| {
        Err(XlintError::Malformed("x".into()))
    });
    registry
}

fn sample_cert() -> CertificateData {
    cert(
        CertType::Dv,
        vec![
            ext("2.5.29.17"),
            ext("1.2.3.4"),
            ext("2.5.29.19"),
            ext("1.3.6.1.4.1.55555.1"),
            ext("2.5.29.15"),
        ],
    )
}

#[test]
fn lint_runs_certificate_pass_then_extensions_in_order() {
    let engine = sample_registry().build(LintOptions::default());
    let d = engine.lint(&sample_cert());
    assert_eq!(
        messages(&d),
        vec![
            "c1",
            "c3",
            "san a",
            "san b",
            "Certificate contains unknown extension (1.2.3.4)",
            "bc",
            "check \"fail\" failed: Malformed input: x",
        ]
    );
}

#[test]
fn lint_is_idempotent() {
    let engine = sample_registry().build(LintOptions::default());
    let c = sample_cert();
    assert_eq!(engine.lint(&c), engine.lint(&c));
}

#[test]
fn parallel_matches_sequential() {
    let sequential = sample_registry().build(LintOptions::default());
    let parallel = sample_registry().build(LintOptions { parallel: true });
    assert!(parallel.options().parallel);

    let c = sample_cert();
    for _ in 0..20 {
        assert_eq!(parallel.lint(&c), sequential.lint(&c));
    }
}

#[test]
fn engine_lints_concurrently() {
    let engine = sample_registry().build(LintOptions::default());
    let c = sample_cert();
    let expected = engine.lint(&c);

    thread::scope(|s| {
        let handles: Vec<_> = (0..4).map(|_| s.spawn(|| engine.lint(&c))).collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[test]
fn diagnostics_merge_preserves_order() {
    let mut a = Diagnostics::new();
    a.error("a1");
    a.info("a2");
    let mut b = Diagnostics::new();
    b.warning("b1");

    let merged: Diagnostics = vec![a.clone(), b.clone()].into_iter().collect();
    assert_eq!(messages(&merged), vec!["a1", "a2", "b1"]);
    assert_eq!(merged.max_severity(), Some(Severity::Error));
    assert!(merged.has_errors());

    let warnings_up = merged.at_least(Severity::Warning);
    assert_eq!(messages(&warnings_up), vec!["a1", "b1"]);
    assert!(!b.has_errors());
    assert_eq!(Diagnostics::new().max_severity(), None);
}

#[test]
fn diagnostics_serialize_as_list() {
    let mut d = Diagnostics::new();
    d.error("bad");
    let json = serde_json::to_value(&d).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{ "severity": "error", "message": "bad" }])
    );
    assert_eq!(d.to_string(), "error: bad\n");
}

#[test]
fn severities_are_ordered_info_warning_error() {
    assert!(Severity::Info < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
    let labels: Vec<String> = [Severity::Info, Severity::Warning, Severity::Error]
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(labels, ["info", "warning", "error"]);
    assert_eq!(serde_json::to_value(Severity::Warning).unwrap(), "warning");
}
