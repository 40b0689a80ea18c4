//! End-to-end tests: real worker processes (the demo binary) driven by a
//! supervisor in the test process.

use std::path::{Path, PathBuf};

use procvisor::{Config, EventKind, Runtime, RuntimeError, SignalSet, TaskError, TaskFn};

#[path = "../demos/tasks.rs"]
#[allow(dead_code)]
mod tasks;

fn config(crash_dir: &Path) -> Config {
    Config {
        worker_program: Some(PathBuf::from(env!("CARGO_BIN_EXE_procvisor-demo"))),
        crash_dir: crash_dir.to_path_buf(),
        ..Config::default()
    }
}

fn runtime(crash_dir: &Path) -> Runtime {
    Runtime::builder(config(crash_dir)).build()
}

#[tokio::test]
async fn clean_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut sup = rt.supervisor("echo-1", tasks::echo()).unwrap();
    sup.start().await.unwrap();
    assert!(sup.is_running());
    assert!(sup.pid().is_some());
    assert_eq!(rt.active().await, vec!["echo-1".to_string()]);

    sup.send_signal("ping").await.unwrap();
    sup.close().await.unwrap();

    assert!(rt.registry().is_empty().await);
    assert!(rt.reaper().is_empty());
}

#[tokio::test]
async fn task_error_surfaces_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut sup = rt.supervisor("boom-1", tasks::boom()).unwrap();
    let report_path = sup.crash_report().path().to_path_buf();
    sup.start().await.unwrap();
    sup.send_signal("detonate").await.unwrap();

    let err = sup.close().await.unwrap_err();
    let RuntimeError::WorkerFaulted { name, report } = &err else {
        panic!("expected a worker fault, got {err:?}");
    };
    assert_eq!(name, "boom-1");
    assert!(report.contains("kaboom"), "{report}");
    assert!(report.contains("tasks.rs:"), "{report}");
    assert!(err.to_string().contains("kaboom"));
    assert!(!err.is_coding_error());

    assert!(!report_path.exists());
    assert!(rt.registry().is_empty().await);
    assert!(rt.reaper().is_empty());
}

#[tokio::test]
async fn panic_surfaces_on_close() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut sup = rt.supervisor("panicky-1", tasks::panicky()).unwrap();
    sup.start().await.unwrap();
    sup.send_signal("explode").await.unwrap();

    match sup.close().await {
        Err(RuntimeError::WorkerFaulted { report, .. }) => {
            assert!(report.contains("kaboom from a panic"), "{report}");
        }
        other => panic!("expected a worker fault, got {other:?}"),
    }
}

#[tokio::test]
async fn signals_after_fault_are_logged_not_processed() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut sup = rt.supervisor("boom-2", tasks::boom()).unwrap();
    sup.start().await.unwrap();
    sup.send_signal("detonate").await.unwrap();
    sup.send_signal("detonate").await.unwrap();
    sup.send_signal("ping").await.unwrap();

    let Err(RuntimeError::WorkerFaulted { report, .. }) = sup.close().await else {
        panic!("expected a worker fault");
    };
    assert!(report.contains("Received signal [0001]: \"detonate\""), "{report}");
    assert!(report.contains("Received signal [0002]: \"ping\""), "{report}");
    assert!(report.contains("Received signal [0003]: \"Close\""), "{report}");
    assert!(!report.contains("already existed"), "second detonate must not rewrite the report");
}

#[tokio::test]
async fn duplicate_name_is_rejected_and_first_stays_usable() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut first = rt.supervisor("t1", tasks::echo()).unwrap();
    first.start().await.unwrap();

    let mut second = rt.supervisor("t1", tasks::echo()).unwrap();
    let err = second.start().await.unwrap_err();
    assert!(matches!(err, RuntimeError::DuplicateName { ref name } if name == "t1"));
    assert!(err.is_coding_error());
    assert!(!second.is_running());
    assert_eq!(rt.reaper().len(), 1);

    first.send_signal("ping").await.unwrap();
    first.close().await.unwrap();
    assert!(rt.registry().is_empty().await);
}

#[tokio::test]
async fn concurrent_same_name_starts_spawn_one_worker() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());
    let mut rx = rt.bus().subscribe();

    let mut a = rt.supervisor("t1", tasks::echo()).unwrap();
    let mut b = rt.supervisor("t1", tasks::echo()).unwrap();
    let (ra, rb) = tokio::join!(a.start(), b.start());

    let (winner, err) = match (ra, rb) {
        (Ok(()), Err(e)) => (a, e),
        (Err(e), Ok(())) => (b, e),
        other => panic!("expected exactly one start to succeed, got {other:?}"),
    };
    assert!(matches!(err, RuntimeError::DuplicateName { ref name } if name == "t1"));
    assert_eq!(rt.reaper().len(), 1);
    assert_eq!(rt.active().await, vec!["t1".to_string()]);

    winner.close().await.unwrap();
    assert!(rt.registry().is_empty().await);

    let mut spawned = 0;
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::WorkerSpawned {
            spawned += 1;
        }
    }
    assert_eq!(spawned, 1);
}

#[tokio::test]
async fn undeclared_signal_never_reaches_the_worker() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut sup = rt.supervisor("echo-2", tasks::echo()).unwrap();
    sup.start().await.unwrap();

    let err = sup.send_signal("detonate").await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownSignal { .. }));
    sup.close().await.unwrap();
}

#[tokio::test]
async fn second_start_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mut sup = rt.supervisor("echo-3", tasks::echo()).unwrap();
    sup.start().await.unwrap();
    let err = sup.start().await.unwrap_err();
    assert!(matches!(err, RuntimeError::AlreadyStarted { .. }));
    sup.close().await.unwrap();
}

#[tokio::test]
async fn unknown_kind_fails_the_handshake() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    let mystery = TaskFn::arc("mystery", SignalSet::empty(), |_sig| async {
        Ok::<_, TaskError>(())
    });
    let mut sup = rt.supervisor("mystery-1", mystery).unwrap();
    let err = sup.start().await.unwrap_err();
    assert!(matches!(err, RuntimeError::ChannelClosed), "{err:?}");

    assert!(rt.registry().is_empty().await);
    assert!(rt.reaper().is_empty());
}

#[tokio::test]
async fn sweep_kills_leaked_worker() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());
    let mut rx = rt.bus().subscribe();

    let mut sup = rt.supervisor("leak-1", tasks::echo()).unwrap();
    sup.start().await.unwrap();
    drop(sup);
    assert_eq!(rt.reaper().len(), 1);

    assert_eq!(rt.sweep().await, 1);
    assert!(rt.reaper().is_empty());

    let mut killed = false;
    while let Ok(ev) = rx.try_recv() {
        if ev.kind == EventKind::WorkerKilled {
            assert_eq!(ev.task.as_deref(), Some("leak-1"));
            killed = true;
        }
    }
    assert!(killed);
}

#[tokio::test]
async fn guard_kills_leaked_worker() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());

    {
        let _guard = rt.shutdown_guard();
        let mut sup = rt.supervisor("leak-2", tasks::echo()).unwrap();
        sup.start().await.unwrap();
        drop(sup);
        assert_eq!(rt.reaper().len(), 1);
    }
    assert!(rt.reaper().is_empty());
}

#[tokio::test]
async fn lifecycle_events_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let rt = runtime(dir.path());
    let mut rx = rt.bus().subscribe();

    let mut sup = rt.supervisor("echo-4", tasks::echo()).unwrap();
    sup.start().await.unwrap();
    sup.send_signal("ping").await.unwrap();
    sup.close().await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        assert_eq!(ev.task.as_deref(), Some("echo-4"));
        kinds.push(ev.kind);
    }
    assert_eq!(
        kinds,
        vec![
            EventKind::WorkerSpawned,
            EventKind::WorkerStarted,
            EventKind::SignalSent,
            EventKind::WorkerClosed,
        ]
    );
}
