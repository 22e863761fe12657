//! End-to-end verification scenarios: plugin against IDE over in-memory
//! class pools.

mod common;

use common::{ide_with, plugin_with, verify, CountingResolver, EmptyFinder};

use plugin_verifier::classfile::flags::access_flags::*;
use plugin_verifier::classfile::InvokeKind;
use plugin_verifier::resolver::FixedResolver;
use plugin_verifier::testutil::{class, java_lang_object, method};
use plugin_verifier::{
    CancellationToken, IdeDescriptor, Problem, ProblemFilter, VerificationResult,
    VerifierParameters,
};

fn problems_of(result: &VerificationResult) -> &[Problem] {
    result
        .verdict()
        .map(|v| v.problems.as_slice())
        .unwrap_or_default()
}

#[test]
fn overriding_final_ide_method() {
    let ide = ide_with(vec![class("p/A")
        .method(method("m", "()V").add_access(ACC_FINAL))
        .build()]);
    let plugin = plugin_with(
        "sample",
        vec![class("q/B").extends("p/A").method(method("m", "()V")).build()],
    );
    let result = verify(ide, plugin, &VerifierParameters::default());

    match problems_of(&result) {
        [Problem::OverridingFinalMethod { method, location }] => {
            assert_eq!(method.owner, "p/A");
            assert_eq!(method.name, "m");
            assert_eq!(method.descriptor, "()V");
            assert_eq!(location.to_string(), "q/B.m()V");
        }
        other => panic!("expected one OverridingFinalMethod, got {other:?}"),
    }
}

#[test]
fn invokevirtual_on_host_static_method() {
    let ide = ide_with(vec![class("p/S")
        .method(method("s", "()V").add_access(ACC_STATIC))
        .build()]);
    let plugin = plugin_with(
        "sample",
        vec![class("q/P")
            .method(method("run", "()V").invoke(InvokeKind::Virtual, "p/S", "s", "()V"))
            .build()],
    );
    let result = verify(ide, plugin, &VerifierParameters::default());

    assert!(matches!(
        problems_of(&result),
        [Problem::InvokeVirtualOnStaticMethod { method, .. }]
            if method.owner == "p/S" && method.name == "s"
    ));
}

#[test]
fn missing_package_rolls_up() {
    let mut body = method("run", "()V");
    for i in 0..15 {
        body = body.invoke(
            InvokeKind::Virtual,
            &format!("removed/pkg/C{i}"),
            "m",
            "()V",
        );
    }
    let plugin = plugin_with("sample", vec![class("q/User").method(body).build()]);
    let result = verify(ide_with(vec![]), plugin, &VerifierParameters::default());

    match problems_of(&result) {
        [Problem::PackageNotFound { package, children }] => {
            assert_eq!(package, "removed/pkg");
            assert_eq!(children.len(), 15);
            assert!(children
                .iter()
                .all(|c| matches!(c, Problem::ClassNotFound { class, .. } if class.starts_with("removed/pkg/"))));
        }
        other => panic!("expected one PackageNotFound, got {other:?}"),
    }
}

#[test]
fn superinterface_became_class() {
    let ide = ide_with(vec![class("p/Iface").build()]);
    let plugin = plugin_with(
        "sample",
        vec![class("q/Impl").implements("p/Iface").build()],
    );
    let result = verify(ide, plugin, &VerifierParameters::default());

    match problems_of(&result) {
        [Problem::SuperInterfaceBecameClass { interface, location }] => {
            assert_eq!(interface, "p/Iface");
            assert_eq!(location.class_name(), "q/Impl");
        }
        other => panic!("expected SuperInterfaceBecameClass, got {other:?}"),
    }
}

#[test]
fn conflicting_defaults_without_override() {
    let ide = ide_with(vec![
        class("p/Left").interface().method(method("m", "()V")).build(),
        class("p/Right").interface().method(method("m", "()V")).build(),
    ]);
    let plugin = plugin_with(
        "sample",
        vec![class("q/C")
            .implements("p/Left")
            .implements("p/Right")
            .build()],
    );
    let result = verify(ide, plugin, &VerifierParameters::default());

    match problems_of(&result) {
        [Problem::MultipleDefaultImplementations { method, .. }] => {
            assert_eq!(method.owner, "q/C");
            assert_eq!(method.name, "m");
            assert_eq!(method.descriptor, "()V");
        }
        other => panic!("expected MultipleDefaultImplementations, got {other:?}"),
    }
}

#[test]
fn external_prefix_suppresses_class_not_found() {
    let plugin = plugin_with(
        "sample",
        vec![class("q/P")
            .method(
                method("run", "()V")
                    .invoke(InvokeKind::Virtual, "org/unknown/X", "m", "()V")
                    .invoke(InvokeKind::Virtual, "com/absent/Y", "m", "()V"),
            )
            .build()],
    );
    let params = VerifierParameters {
        external_class_prefixes: vec!["org/unknown/".to_string()],
        ..Default::default()
    };
    let result = verify(ide_with(vec![]), plugin, &params);

    match problems_of(&result) {
        [Problem::ClassNotFound { class, .. }] => assert_eq!(class, "com/absent/Y"),
        other => panic!("expected one ClassNotFound, got {other:?}"),
    }
}

#[test]
fn plugin_classes_shadow_ide_classes() {
    // The IDE's copy of p/Dup lacks the method; the plugin's copy has it.
    // Layering must pick the plugin copy and report nothing.
    let ide = ide_with(vec![class("p/Dup").build()]);
    let plugin = plugin_with(
        "sample",
        vec![
            class("p/Dup").method(method("m", "()V")).build(),
            class("q/P")
                .method(method("run", "()V").invoke(InvokeKind::Virtual, "p/Dup", "m", "()V"))
                .build(),
        ],
    );
    let result = verify(ide, plugin, &VerifierParameters::default());
    assert!(
        matches!(result, VerificationResult::Ok(_)),
        "expected Ok, got problems: {:?}",
        problems_of(&result)
    );
}

#[test]
fn identical_runs_produce_identical_output() {
    let build = || {
        let ide = ide_with(vec![class("p/S")
            .method(method("s", "()V").add_access(ACC_STATIC))
            .build()]);
        let plugin = plugin_with(
            "sample",
            vec![
                class("q/A")
                    .method(method("run", "()V").invoke(InvokeKind::Virtual, "gone/X", "m", "()V"))
                    .build(),
                class("q/B")
                    .method(method("run", "()V").invoke(InvokeKind::Virtual, "p/S", "s", "()V"))
                    .build(),
            ],
        );
        verify(ide, plugin, &VerifierParameters::default())
    };

    let first: Vec<String> = problems_of(&build())
        .iter()
        .map(|p| p.full_description())
        .collect();
    let second: Vec<String> = problems_of(&build())
        .iter()
        .map(|p| p.full_description())
        .collect();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
    // Classes are visited in sorted order: q/A before q/B.
    assert!(first[0].contains("gone/X"));
    assert!(first[1].contains("p/S.s"));
}

#[test]
fn duplicate_references_deduplicate_per_location() {
    let plugin = plugin_with(
        "sample",
        vec![class("q/P")
            .method(
                method("run", "()V")
                    .invoke(InvokeKind::Virtual, "gone/X", "m", "()V")
                    .invoke(InvokeKind::Virtual, "gone/X", "m", "()V"),
            )
            .method(method("other", "()V").invoke(InvokeKind::Virtual, "gone/X", "m", "()V"))
            .build()],
    );
    let result = verify(ide_with(vec![]), plugin, &VerifierParameters::default());
    // Same reference twice in run(): one problem. Different method: another.
    assert_eq!(problems_of(&result).len(), 2);
}

#[test]
fn problem_filter_moves_findings_to_ignored() {
    let plugin = plugin_with(
        "sample",
        vec![class("q/generated/P")
            .method(method("run", "()V").invoke(InvokeKind::Virtual, "gone/X", "m", "()V"))
            .build()],
    );
    let params = VerifierParameters {
        problem_filters: vec![ProblemFilter::PackagePrefix("q/generated".to_string())],
        ..Default::default()
    };
    let result = verify(ide_with(vec![]), plugin, &params);

    match &result {
        VerificationResult::Ok(verdict) => {
            assert!(verdict.problems.is_empty());
            assert_eq!(verdict.ignored_problems.len(), 1);
            assert!(verdict.ignored_problems[0].reason.contains("q/generated"));
        }
        other => panic!("expected Ok with ignored problems, got {:?}", problems_of(other)),
    }
}

#[test]
fn deprecated_usage_is_recorded_when_enabled() {
    let ide = ide_with(vec![class("p/Old")
        .deprecated()
        .method(method("m", "()V"))
        .build()]);
    let plugin = plugin_with(
        "sample",
        vec![class("q/P")
            .method(method("run", "()V").invoke(InvokeKind::Virtual, "p/Old", "m", "()V"))
            .build()],
    );
    let params = VerifierParameters {
        find_deprecated_api_usages: true,
        ..Default::default()
    };
    let result = verify(ide, plugin, &params);
    let verdict = result.verdict().expect("verdict");
    assert!(verdict.problems.is_empty());
    assert_eq!(verdict.usages.len(), 1);

    // Disabled by default.
    let ide = ide_with(vec![class("p/Old")
        .deprecated()
        .method(method("m", "()V"))
        .build()]);
    let plugin = plugin_with(
        "sample",
        vec![class("q/P")
            .method(method("run", "()V").invoke(InvokeKind::Virtual, "p/Old", "m", "()V"))
            .build()],
    );
    let result = verify(ide, plugin, &VerifierParameters::default());
    assert!(result.verdict().expect("verdict").usages.is_empty());
}

#[test]
fn cancelled_job_reports_no_partial_problems() {
    let plugin = plugin_with(
        "sample",
        vec![class("q/P")
            .method(method("run", "()V").invoke(InvokeKind::Virtual, "gone/X", "m", "()V"))
            .build()],
    );
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = plugin_verifier::run_verification(
        ide_with(vec![]),
        plugin,
        &mut EmptyFinder,
        &VerifierParameters::default(),
        &cancel,
    )
    .expect("job");
    assert!(matches!(result, VerificationResult::Cancelled));
    assert!(result.verdict().is_none());
}

#[test]
fn job_closes_its_resolvers_exactly_once() {
    let mut ide_pool = FixedResolver::new();
    ide_pool.add(java_lang_object());
    let (counting, closes) = CountingResolver::new(ide_pool);
    let ide = IdeDescriptor {
        version: "IU-231.1".to_string(),
        resolver: Box::new(counting),
        jdk: None,
    };
    let plugin = plugin_with("sample", vec![class("q/P").build()]);
    let result = verify(ide, plugin, &VerifierParameters::default());
    assert!(matches!(result, VerificationResult::Ok(_)));
    assert_eq!(closes.load(std::sync::atomic::Ordering::SeqCst), 1);
}
