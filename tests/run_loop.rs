mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use common::{Case, MemoryStore, ScriptedDriver, BASE_URL};
use expediente_scanner::channel::{EventReporter, RunEvent};
use expediente_scanner::error::RunError;
use expediente_scanner::models::{KeywordSet, PortalLayout, RecordFields, RunSummary};
use expediente_scanner::orchestrator::{run_control, Orchestrator, RunSettings};
use expediente_scanner::services::SearchReset;
use expediente_scanner::workflow::RecordFlow;

const MATCH_CV: &str = "✅ ENVIO CV TM SIN ESCRITURA";
const NOT_FOUND: &str = "❌ No encontrado";
const ERROR: &str = "⚠️ Error - Reintentar";

fn orchestrator(
    store: Arc<MemoryStore>,
    batch_size: usize,
    fields: RecordFields,
    reporter: EventReporter,
) -> Orchestrator {
    let timeout = Duration::from_millis(200);
    let layout = PortalLayout::default();
    let flow = RecordFlow::new(
        layout.clone(),
        KeywordSet::builtin().unwrap(),
        timeout,
        Duration::ZERO,
    );
    let reset = SearchReset::new(layout, BASE_URL, timeout);
    Orchestrator::new(
        store,
        Arc::new(flow),
        Arc::new(reset),
        RunSettings {
            base_url: BASE_URL.to_string(),
            batch_size,
            fields,
        },
        reporter,
    )
}

#[tokio::test]
async fn test_resumes_and_flushes_in_batches() {
    let store = Arc::new(MemoryStore::with_rows(&[
        ("EXP001", ""),
        ("EXP002", "✅ ENVIO PH TM SIN ESCRITURA"),
        ("EXP003", ""),
    ]));
    let driver = ScriptedDriver::new()
        .with_case("EXP001", Case::body("ENVIO CV TM SIN ESCRITURA"))
        .with_case("EXP003", Case::body("sin novedades"));
    let reporter = EventReporter::new();
    let mut rx = reporter.subscribe();

    let (mut handle, control) = run_control();
    assert!(handle.confirm());
    let summary = orchestrator(store.clone(), 2, RecordFields::default(), reporter)
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(
        summary,
        RunSummary {
            processed: 2,
            succeeded: 1,
            errored: 0,
            skipped: 1,
            batches_flushed: 1,
        }
    );
    assert_eq!(
        store.saved_results(),
        vec![(0, MATCH_CV.to_string()), (2, NOT_FOUND.to_string())]
    );
    assert_eq!(driver.count("fill:EXP002"), 0);

    let events = common::drain(&mut rx);
    assert!(events.contains(&RunEvent::WaitingForConfirmation));
    assert!(events.contains(&RunEvent::Progress { current: 1, total: 3 }));
    assert!(events.contains(&RunEvent::Progress { current: 3, total: 3 }));
    assert_eq!(events.last(), Some(&RunEvent::Completed(summary)));
}

#[tokio::test]
async fn test_fully_resolved_sheet_does_nothing() {
    let store = Arc::new(MemoryStore::with_rows(&[
        ("EXP001", MATCH_CV),
        ("EXP002", NOT_FOUND),
    ]));
    let driver = ScriptedDriver::new();

    let (mut handle, control) = run_control();
    handle.confirm();
    let summary = orchestrator(store.clone(), 5, RecordFields::default(), EventReporter::new())
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.batches_flushed, 0);
    assert!(store.saved().is_empty());
    assert_eq!(driver.count("fill"), 0);
}

#[tokio::test]
async fn test_duplicate_and_blank_codes_are_skipped() {
    let store = Arc::new(MemoryStore::with_rows(&[
        ("EXP001", ""),
        ("  ", ""),
        ("EXP001", ""),
    ]));
    let driver =
        ScriptedDriver::new().with_case("EXP001", Case::body("ENVIO CV TM SIN ESCRITURA"));

    let (mut handle, control) = run_control();
    handle.confirm();
    let summary = orchestrator(store.clone(), 5, RecordFields::default(), EventReporter::new())
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(driver.count("fill:EXP001"), 1);
}

#[tokio::test]
async fn test_record_failures_do_not_abort_the_run() {
    let store = Arc::new(MemoryStore::with_rows(&[
        ("EXP001", ""),
        ("EXP002", ""),
        ("EXP003", ""),
    ]));
    // EXP001 没有结果也没有提示 → 超时；EXP003 打开详情时 panic
    let driver = ScriptedDriver::new()
        .with_case("EXP002", Case::body("ENVIO CV TM SIN ESCRITURA"))
        .with_case("EXP003", Case::body("ENVIO PH TM SIN ESCRITURA"))
        .panicking_on("EXP003");

    let (mut handle, control) = run_control();
    handle.confirm();
    let summary = orchestrator(store.clone(), 10, RecordFields::default(), EventReporter::new())
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.errored, 2);
    assert_eq!(
        store.saved_results(),
        vec![
            (0, ERROR.to_string()),
            (1, MATCH_CV.to_string()),
            (2, ERROR.to_string()),
        ]
    );
    // 每条记录之后都会复位
    assert_eq!(driver.count("reset"), 3);
}

#[tokio::test]
async fn test_stop_after_confirmation_still_flushes() {
    let store = Arc::new(MemoryStore::with_rows(&[
        ("EXP001", ""),
        ("EXP002", ""),
        ("EXP003", ""),
    ]));
    let (mut handle, control) = run_control();
    handle.confirm();
    let driver = ScriptedDriver::new()
        .with_case("EXP001", Case::body("ENVIO CV TM SIN ESCRITURA"))
        .with_case("EXP002", Case::body("nada"))
        .on_open("EXP001", move || handle.stop());

    let summary = orchestrator(store.clone(), 10, RecordFields::default(), EventReporter::new())
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.batches_flushed, 1);
    assert_eq!(store.saved_results(), vec![(0, MATCH_CV.to_string())]);
    assert_eq!(driver.count("fill:EXP002"), 0);
}

#[tokio::test]
async fn test_save_failures_leave_counters_alone() {
    let store = Arc::new(
        MemoryStore::with_rows(&[("EXP001", ""), ("EXP002", "")]).failing_saves(),
    );
    let driver =
        ScriptedDriver::new().with_case("EXP001", Case::body("ENVIO CV TM SIN ESCRITURA"));
    let reporter = EventReporter::new();
    let mut rx = reporter.subscribe();

    let (mut handle, control) = run_control();
    handle.confirm();
    let summary = orchestrator(store.clone(), 1, RecordFields::default(), reporter)
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.errored, 1);
    assert_eq!(summary.batches_flushed, 2);
    assert!(store.saved().is_empty());

    let save_errors = common::drain(&mut rx)
        .into_iter()
        .filter(|e| matches!(e, RunEvent::Log { message, .. } if message.contains("保存第")))
        .count();
    assert_eq!(save_errors, 2);
}

#[tokio::test]
async fn test_cancel_before_confirmation() {
    let store = Arc::new(MemoryStore::with_rows(&[("EXP001", "")]));
    let driver = ScriptedDriver::new();

    let (mut handle, control) = run_control();
    handle.stop();
    let result = orchestrator(store.clone(), 1, RecordFields::default(), EventReporter::new())
        .run(&driver, control)
        .await;

    assert!(matches!(result, Err(RunError::Cancelled)));
    assert_eq!(driver.count("fill"), 0);
    assert!(store.saved().is_empty());
}

#[tokio::test]
async fn test_unreachable_portal_is_a_session_error() {
    let store = Arc::new(MemoryStore::with_rows(&[("EXP001", "")]));
    let driver = ScriptedDriver::new().with_broken_navigation();

    let (mut handle, control) = run_control();
    handle.confirm();
    let result = orchestrator(store, 1, RecordFields::default(), EventReporter::new())
        .run(&driver, control)
        .await;

    assert!(matches!(result, Err(RunError::Session(_))));
}

#[tokio::test]
async fn test_retry_errors_reprocesses_error_rows() {
    let store = Arc::new(MemoryStore::with_rows(&[
        ("EXP001", ERROR),
        ("EXP002", NOT_FOUND),
    ]));
    let driver =
        ScriptedDriver::new().with_case("EXP001", Case::body("ENVIO CV TM SIN ESCRITURA"));
    let fields = RecordFields {
        retry_errors: true,
        ..RecordFields::default()
    };

    let (mut handle, control) = run_control();
    handle.confirm();
    let summary = orchestrator(store.clone(), 5, fields, EventReporter::new())
        .run(&driver, control)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(store.saved_results(), vec![(0, MATCH_CV.to_string())]);
}
