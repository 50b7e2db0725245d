//! Integration tests for the multi-pass resolution driver.
//!
//! These exercise the full front-end: symbol tables (built in code or loaded
//! from JSON dumps), scanning, entry building, deferral, and the single
//! manifest write.

use vmbridge_manifest::{store, ActionEntry, ActionParamEntry, StateEntry};
use vmbridge_scan::prelude::*;

fn ty(text: &str) -> TypeUse {
    text.parse().unwrap()
}

fn fixture(name: &str) -> SymbolTable {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let text = std::fs::read_to_string(&path).unwrap();
    SymbolTable::from_json(&text).unwrap()
}

fn memory_driver() -> ResolutionDriver<MemorySink> {
    ResolutionDriver::new(ScanConfig::default(), MemorySink::default())
}

fn counter_vm() -> Declaration {
    Declaration::class("com.a.CounterViewModel")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("count", ty("kotlinx.coroutines.flow.StateFlow<Int>")),
            &[Marker::UiState],
        )
        .member(MemberSymbol::function("increment", vec![]), &[Marker::UiAction])
}

// ---------------------------------------------------------------------------
// Single-pass scenarios
// ---------------------------------------------------------------------------

#[test]
fn counter_view_model_produces_one_entry() {
    let table = SymbolTable::new().with(counter_vm());
    let mut driver = memory_driver();

    let outcome = driver.process(&table).unwrap();
    assert_eq!(outcome, PassOutcome::Written { pass: 1, entries: 1 });

    let manifest = &driver.sink().written[0];
    assert_eq!(manifest.view_models.len(), 1);
    let entry = &manifest.view_models[0];
    assert_eq!(entry.qualified_name, "com.a.CounterViewModel");
    assert_eq!(entry.simple_name, "CounterViewModel");
    assert_eq!(entry.state, Some(StateEntry::new("count", "Int")));
    assert_eq!(entry.actions, vec![ActionEntry::new("increment", vec![])]);
}

#[test]
fn invalid_entry_is_dropped_and_others_survive() {
    let table = SymbolTable::new()
        .with(counter_vm())
        .with(
            Declaration::class("com.a.BrokenViewModel")
                .marked(Marker::ViewModel)
                .member(MemberSymbol::property("a", ty("StateFlow<Int>")), &[Marker::UiState])
                .member(MemberSymbol::property("b", ty("StateFlow<Int>")), &[Marker::UiState]),
        );
    let mut driver = memory_driver();

    driver.process(&table).unwrap();

    let manifest = &driver.sink().written[0];
    let names: Vec<&str> = manifest
        .view_models
        .iter()
        .map(|e| e.qualified_name.as_str())
        .collect();
    assert_eq!(names, vec!["com.a.CounterViewModel"]);

    assert_eq!(driver.diagnostics().len(), 1);
    let diagnostic = &driver.diagnostics()[0];
    assert_eq!(diagnostic.code(), "MultipleStateMarkers");
    assert_eq!(diagnostic.symbol(), "com.a.BrokenViewModel");
}

#[test]
fn entries_are_sorted_by_qualified_name() {
    let table = SymbolTable::new()
        .with(Declaration::class("com.z.Last").marked(Marker::ViewModel))
        .with(Declaration::class("com.a.First").marked(Marker::ViewModel))
        .with(Declaration::class("com.m.Middle").marked(Marker::ViewModel));
    let mut driver = memory_driver();

    driver.process(&table).unwrap();

    let names: Vec<String> = driver.sink().written[0]
        .view_models
        .iter()
        .map(|e| e.qualified_name.clone())
        .collect();
    assert_eq!(names, vec!["com.a.First", "com.m.Middle", "com.z.Last"]);
}

// ---------------------------------------------------------------------------
// Multi-pass scenarios
// ---------------------------------------------------------------------------

#[test]
fn deferred_symbol_resolves_in_second_pass() {
    let a = Declaration::class("com.a.A")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("state", ty("StateFlow<com.a.GeneratedState>")),
            &[Marker::UiState],
        );
    let b = Declaration::class("com.a.B").marked(Marker::ViewModel);

    let round1 = SymbolTable::new().with(a.clone()).with(b.clone());
    let round2 = SymbolTable::new()
        .with(a)
        .with(Declaration::class("com.a.GeneratedState"));

    let mut driver = memory_driver();

    let first = driver.process(&round1).unwrap();
    assert_eq!(first, PassOutcome::Deferred { pass: 1, count: 1 });
    assert!(driver.sink().written.is_empty(), "nothing written while deferred");

    // B is not visible in round 2; its buffered entry from round 1 survives.
    let second = driver.process(&round2).unwrap();
    assert_eq!(second, PassOutcome::Written { pass: 2, entries: 2 });

    let manifest = &driver.sink().written[0];
    let names: Vec<&str> = manifest
        .view_models
        .iter()
        .map(|e| e.qualified_name.as_str())
        .collect();
    assert_eq!(names, vec!["com.a.A", "com.a.B"]);
    assert_eq!(
        manifest.view_models[0].state,
        Some(StateEntry::new("state", "GeneratedState"))
    );
}

#[test]
fn later_pass_overwrites_buffered_entry() {
    let waiting = Declaration::class("com.a.Waiting")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("state", ty("StateFlow<com.a.Later>")),
            &[Marker::UiState],
        );
    let v1 = Declaration::class("com.a.Vm").marked(Marker::ViewModel);
    let v2 = v1
        .clone()
        .member(MemberSymbol::function("refresh", vec![]), &[Marker::UiAction]);

    let mut driver = memory_driver();
    driver
        .process(&SymbolTable::new().with(waiting.clone()).with(v1))
        .unwrap();
    driver
        .process(
            &SymbolTable::new()
                .with(waiting)
                .with(v2)
                .with(Declaration::class("com.a.Later")),
        )
        .unwrap();

    let manifest = &driver.sink().written[0];
    let vm = manifest.entry("com.a.Vm").unwrap();
    assert_eq!(vm.actions, vec![ActionEntry::new("refresh", vec![])]);
}

#[test]
fn later_failure_drops_buffered_entry() {
    let waiting = Declaration::class("com.a.Waiting")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("state", ty("StateFlow<com.a.Later>")),
            &[Marker::UiState],
        );
    let valid = Declaration::class("com.a.Vm")
        .marked(Marker::ViewModel)
        .member(MemberSymbol::property("count", ty("StateFlow<Int>")), &[Marker::UiState]);
    let doubled = valid
        .clone()
        .member(MemberSymbol::property("other", ty("StateFlow<Int>")), &[Marker::UiState]);

    let mut driver = memory_driver();
    driver
        .process(&SymbolTable::new().with(waiting.clone()).with(valid))
        .unwrap();
    let outcome = driver
        .process(
            &SymbolTable::new()
                .with(waiting)
                .with(doubled)
                .with(Declaration::class("com.a.Later")),
        )
        .unwrap();

    assert_eq!(outcome, PassOutcome::Written { pass: 2, entries: 1 });
    let manifest = &driver.sink().written[0];
    assert!(manifest.entry("com.a.Vm").is_none());
    assert!(manifest.entry("com.a.Waiting").is_some());
    let codes: Vec<(&str, &str)> = driver
        .diagnostics()
        .iter()
        .map(|d| (d.symbol(), d.code()))
        .collect();
    assert_eq!(codes, vec![("com.a.Vm", "MultipleStateMarkers")]);
}

#[test]
fn deferred_symbol_missing_from_later_round_stays_deferred() {
    let a = Declaration::class("com.a.A")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("state", ty("StateFlow<com.a.Later>")),
            &[Marker::UiState],
        );
    let b = Declaration::class("com.a.B").marked(Marker::ViewModel);
    let c = Declaration::class("com.a.C").marked(Marker::ViewModel);

    let mut driver = memory_driver();
    assert_eq!(
        driver.process(&SymbolTable::new().with(a).with(b)).unwrap(),
        PassOutcome::Deferred { pass: 1, count: 1 }
    );

    // A is absent from round 2, so nothing settled it.
    let err = driver.process(&SymbolTable::new().with(c)).unwrap_err();
    assert!(matches!(
        err,
        DriverError::StalledResolution { pass: 2, ref symbols } if symbols == &["com.a.A"]
    ));
    assert!(driver.sink().written.is_empty());
    assert!(driver.finish().is_err());
}

#[test]
fn carried_deferral_resolves_when_symbol_returns() {
    let a = Declaration::class("com.a.A")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("state", ty("StateFlow<com.a.Later>")),
            &[Marker::UiState],
        );
    let waiting_b = Declaration::class("com.a.B")
        .marked(Marker::ViewModel)
        .member(
            MemberSymbol::property("state", ty("StateFlow<com.a.AlsoLater>")),
            &[Marker::UiState],
        );

    let mut driver = memory_driver();
    driver.process(&SymbolTable::new().with(a.clone())).unwrap();
    // A is absent but B is newly deferred, so the set changed.
    assert_eq!(
        driver.process(&SymbolTable::new().with(waiting_b.clone())).unwrap(),
        PassOutcome::Deferred { pass: 2, count: 2 }
    );
    let outcome = driver
        .process(
            &SymbolTable::new()
                .with(a)
                .with(waiting_b)
                .with(Declaration::class("com.a.Later"))
                .with(Declaration::class("com.a.AlsoLater")),
        )
        .unwrap();

    assert_eq!(outcome, PassOutcome::Written { pass: 3, entries: 2 });
}

#[test]
fn identical_deferred_set_stalls() {
    let table = SymbolTable::new().with(
        Declaration::class("com.a.Stuck")
            .marked(Marker::ViewModel)
            .member(
                MemberSymbol::property("state", ty("StateFlow<com.a.NeverGenerated>")),
                &[Marker::UiState],
            ),
    );
    let mut driver = memory_driver();

    assert_eq!(
        driver.process(&table).unwrap(),
        PassOutcome::Deferred { pass: 1, count: 1 }
    );
    let err = driver.process(&table).unwrap_err();
    match err {
        DriverError::StalledResolution { pass, symbols } => {
            assert_eq!(pass, 2);
            assert_eq!(symbols, vec!["com.a.Stuck".to_owned()]);
        }
        other => panic!("expected a stall, got {other:?}"),
    }
    assert!(driver.sink().written.is_empty());
}

#[test]
fn changing_deferred_set_does_not_stall() {
    let waiting_on = |qualified: &str, state: &str| {
        Declaration::class(qualified).marked(Marker::ViewModel).member(
            MemberSymbol::property("state", ty(&format!("StateFlow<{state}>"))),
            &[Marker::UiState],
        )
    };

    let round1 = SymbolTable::new()
        .with(waiting_on("com.a.A", "com.a.SA"))
        .with(waiting_on("com.a.B", "com.a.SB"));
    let round2 = round1.clone().with(Declaration::class("com.a.SA"));
    let round3 = round2.clone().with(Declaration::class("com.a.SB"));

    let mut driver = memory_driver();
    assert_eq!(
        driver.process(&round1).unwrap(),
        PassOutcome::Deferred { pass: 1, count: 2 }
    );
    assert_eq!(
        driver.process(&round2).unwrap(),
        PassOutcome::Deferred { pass: 2, count: 1 }
    );
    assert_eq!(
        driver.process(&round3).unwrap(),
        PassOutcome::Written { pass: 3, entries: 2 }
    );
}

#[test]
fn passes_after_write_are_no_ops() {
    let table = SymbolTable::new().with(counter_vm());
    let mut driver = memory_driver();

    driver.process(&table).unwrap();
    assert!(driver.is_done());
    for _ in 0..3 {
        assert_eq!(driver.process(&table).unwrap(), PassOutcome::AlreadyDone);
    }
    driver.finish().unwrap();

    assert_eq!(driver.pass_count(), 1);
    assert_eq!(driver.sink().written.len(), 1);
}

// ---------------------------------------------------------------------------
// finish()
// ---------------------------------------------------------------------------

#[test]
fn finish_without_passes_writes_empty_manifest() {
    let mut driver = memory_driver();
    driver.finish().unwrap();

    let written = &driver.sink().written;
    assert_eq!(written.len(), 1);
    assert!(written[0].is_empty());
}

#[test]
fn finish_with_pending_deferral_fails() {
    let table = SymbolTable::new().with(
        Declaration::class("com.a.Pending")
            .marked(Marker::ViewModel)
            .member(
                MemberSymbol::property("state", ty("StateFlow<com.a.Later>")),
                &[Marker::UiState],
            ),
    );
    let mut driver = memory_driver();
    driver.process(&table).unwrap();

    let err = driver.finish().unwrap_err();
    assert!(err.to_string().contains("com.a.Pending"), "{err}");
    assert!(driver.sink().written.is_empty());
}

// ---------------------------------------------------------------------------
// JSON dumps and file output
// ---------------------------------------------------------------------------

#[test]
fn fixture_rounds_write_manifest_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("build").join("swiftvm-manifest.json");
    let mut driver = ResolutionDriver::new(ScanConfig::default(), FileSink::new(&path));

    let first = driver.process(&fixture("round1.json")).unwrap();
    assert_eq!(first, PassOutcome::Deferred { pass: 1, count: 1 });
    assert!(!path.exists());

    let second = driver.process(&fixture("round2.json")).unwrap();
    assert_eq!(second, PassOutcome::Written { pass: 2, entries: 2 });
    driver.finish().unwrap();

    let manifest = store::read_manifest(&path).unwrap();
    assert_eq!(
        manifest.view_models[0].qualified_name,
        "com.example.counter.CounterViewModel"
    );
    assert_eq!(
        manifest.view_models[0].actions,
        vec![
            ActionEntry::new("increment", vec![]),
            ActionEntry::new("add", vec![ActionParamEntry::new("p0", "Int")]),
        ]
    );

    let login = manifest.entry("com.example.login.LoginViewModel").unwrap();
    assert_eq!(login.state, Some(StateEntry::new("uiState", "LoginState")));
    assert_eq!(
        login.actions,
        vec![ActionEntry::new(
            "onAction",
            vec![ActionParamEntry::new("action", "LoginAction")]
        )]
    );

    let digest = driver.sink().digest().unwrap();
    assert_eq!(digest, manifest.digest().unwrap());
}
