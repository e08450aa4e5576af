// tests/startup_sequence.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use watchjob::context::{Context, Settings, Task, WatchTarget, Watcher};
use watchjob::fs::mock::MockFileSystem;
use watchjob::run_context;
use watchjob::sink::{LogSink, MemorySink};
use watchjob_test_utils::{init_tracing, RecordingRunner, RunEvent};

type TestResult = Result<(), Box<dyn Error>>;

async fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn watcher(name: &str, dir: &str, tasks: Vec<Task>) -> (Watcher, MemorySink) {
    let mem = MemorySink::new();
    let sink: Arc<dyn LogSink> = Arc::new(mem.clone());
    let w = Watcher::new(
        name,
        WatchTarget::directory(dir),
        Duration::from_millis(10),
        tasks,
        sink,
    );
    (w, mem)
}

#[tokio::test]
async fn init_tasks_finish_before_any_watcher_job_runs() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/proj/a.txt", b"one".to_vec());

    let (w, mem) = watcher("docs", "/proj", vec![Task::blocking("build docs")]);
    let ctx = Context::new(
        Settings::default(),
        vec![w],
        vec![Task::blocking("setup"), Task::detached("daemon")],
    );

    let runner = RecordingRunner::new().with_delay(Duration::from_millis(50));
    let handle = tokio::spawn(run_context(ctx, runner.clone(), Arc::new(fs.clone())));

    // Let the watcher record its baseline, then change the target.
    wait_until("init tasks", || runner.started().len() >= 2).await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    fs.add_file("/proj/a.txt", b"two".to_vec());

    wait_until("watcher task", || {
        runner.events().contains(&RunEvent::Finished("build docs".into()))
    })
    .await;
    handle.abort();

    assert_eq!(
        runner.events(),
        vec![
            RunEvent::Started("setup".into()),
            RunEvent::Finished("setup".into()),
            RunEvent::Spawned("daemon".into()),
            RunEvent::Started("build docs".into()),
            RunEvent::Finished("build docs".into()),
        ]
    );
    assert_eq!(
        mem.lines(),
        vec![
            "detected change: modified a.txt".to_string(),
            "execute: build docs".to_string(),
            "end: build docs".to_string(),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn a_broken_watcher_does_not_stop_the_others() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/good/a.txt", b"a".to_vec());

    let (broken, broken_mem) = watcher("broken", "/missing", vec![Task::blocking("never")]);
    let (good, good_mem) = watcher("good", "/good", vec![Task::blocking("rebuild")]);
    let ctx = Context::new(Settings::default(), vec![broken, good], vec![]);

    let runner = RecordingRunner::new();
    let handle = tokio::spawn(run_context(ctx, runner.clone(), Arc::new(fs.clone())));

    tokio::time::sleep(Duration::from_millis(100)).await;
    fs.add_file("/good/b.txt", b"b".to_vec());

    wait_until("good watcher task", || runner.started() == vec!["rebuild".to_string()]).await;
    handle.abort();

    assert!(broken_mem.lines().is_empty());
    assert_eq!(good_mem.lines()[0], "detected change: created b.txt");
    Ok(())
}

#[tokio::test]
async fn without_watchers_run_context_returns_after_init_tasks() -> TestResult {
    init_tracing();

    let ctx = Context::new(Settings::default(), vec![], vec![Task::blocking("only")]);
    let runner = RecordingRunner::new();

    watchjob_test_utils::with_timeout(run_context(
        ctx,
        runner.clone(),
        Arc::new(MockFileSystem::new()),
    ))
    .await?;

    assert_eq!(runner.started(), vec!["only".to_string()]);
    Ok(())
}
