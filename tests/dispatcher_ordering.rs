// tests/dispatcher_ordering.rs

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use watchjob::context::Task;
use watchjob::engine::{job_channel, Dispatcher, Job};
use watchjob::errors::WatchjobError;
use watchjob::sink::MemorySink;
use watchjob_test_utils::builders::memory_watcher;
use watchjob_test_utils::{init_tracing, with_timeout, RecordingRunner, RunEvent};

type TestResult = Result<(), Box<dyn Error>>;

fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn job_tasks_run_in_declared_order_one_after_another() -> TestResult {
    init_tracing();

    let (watcher, mem) = memory_watcher(
        "build",
        vec![
            Task::blocking("make clean"),
            Task::blocking("make"),
            Task::blocking("make test"),
        ],
    );

    let runner = RecordingRunner::new().with_delay(Duration::from_millis(20));
    let (tx, rx) = job_channel(4);
    tx.send(Job::new(watcher, "detected change: modified src/a.c")).await?;
    drop(tx);

    with_timeout(Dispatcher::new(rx, runner.clone()).run()).await?;

    assert_eq!(
        runner.events(),
        vec![
            RunEvent::Started("make clean".into()),
            RunEvent::Finished("make clean".into()),
            RunEvent::Started("make".into()),
            RunEvent::Finished("make".into()),
            RunEvent::Started("make test".into()),
            RunEvent::Finished("make test".into()),
        ]
    );

    assert_eq!(
        mem.lines(),
        lines(&[
            "detected change: modified src/a.c",
            "execute: make clean",
            "end: make clean",
            "execute: make",
            "end: make",
            "execute: make test",
            "end: make test",
        ])
    );
    Ok(())
}

#[tokio::test]
async fn detached_and_failing_tasks_do_not_stop_the_job() -> TestResult {
    init_tracing();

    let (watcher, mem) = memory_watcher(
        "serve",
        vec![
            Task::detached("server --port 8080"),
            Task::blocking("missing-tool"),
            Task::blocking(""),
            Task::blocking("echo ok"),
        ],
    );

    let runner = RecordingRunner::new().failing(&["missing-tool"]);
    let (tx, rx) = job_channel(1);
    tx.send(Job::new(watcher, "changed")).await?;
    drop(tx);

    with_timeout(Dispatcher::new(rx, runner.clone()).run()).await?;

    assert_eq!(
        runner.started(),
        lines(&["server --port 8080", "missing-tool", "", "echo ok"])
    );
    assert_eq!(
        mem.lines(),
        lines(&[
            "changed",
            "execute(nowait): server --port 8080",
            "end(nowait): server --port 8080",
            "execute: missing-tool",
            "An error occurred: failed to start `missing-tool`: simulated failure",
            "execute: ",
            "An error occurred: empty command",
            "execute: echo ok",
            "end: echo ok",
        ])
    );
    Ok(())
}

#[tokio::test]
async fn concurrent_watchers_get_whole_jobs_in_their_send_order() -> TestResult {
    init_tracing();

    let (first, first_mem) =
        memory_watcher("first", vec![Task::blocking("a1"), Task::blocking("a2")]);
    let (second, second_mem) =
        memory_watcher("second", vec![Task::blocking("b1"), Task::blocking("b2")]);

    let runner = RecordingRunner::new().with_delay(Duration::from_millis(5));
    let (tx, rx) = job_channel(1);
    let dispatcher = tokio::spawn(Dispatcher::new(rx, runner.clone()).run());

    // Both watchers enqueue at the same time; with capacity 1 their sends
    // interleave with the dispatcher draining the channel.
    let tx2 = tx.clone();
    let produce_first = async move {
        for i in 0..3 {
            tx.send(Job::new(Arc::clone(&first), format!("first changed {i}"))).await?;
        }
        Ok::<_, WatchjobError>(())
    };
    let produce_second = async move {
        for i in 0..3 {
            tx2.send(Job::new(Arc::clone(&second), format!("second changed {i}"))).await?;
        }
        Ok::<_, WatchjobError>(())
    };
    let (r1, r2) = tokio::join!(produce_first, produce_second);
    r1?;
    r2?;

    with_timeout(dispatcher).await??;

    // Every job ran as one uninterrupted unit.
    let unit = |a: &str, b: &str| {
        vec![
            RunEvent::Started(a.into()),
            RunEvent::Finished(a.into()),
            RunEvent::Started(b.into()),
            RunEvent::Finished(b.into()),
        ]
    };
    let events = runner.events();
    assert_eq!(events.len(), 24);
    let mut first_jobs = 0;
    let mut second_jobs = 0;
    for chunk in events.chunks(4) {
        if chunk == unit("a1", "a2").as_slice() {
            first_jobs += 1;
        } else if chunk == unit("b1", "b2").as_slice() {
            second_jobs += 1;
        } else {
            panic!("job was interleaved with another: {chunk:?}");
        }
    }
    assert_eq!((first_jobs, second_jobs), (3, 3));

    // Each watcher's jobs were handled in the order it sent them, and its
    // lines went through its own sink only.
    let messages = |mem: &MemorySink| -> Vec<String> {
        mem.lines()
            .into_iter()
            .filter(|l| l.contains("changed"))
            .collect()
    };
    assert_eq!(
        messages(&first_mem),
        lines(&["first changed 0", "first changed 1", "first changed 2"])
    );
    assert_eq!(
        messages(&second_mem),
        lines(&["second changed 0", "second changed 1", "second changed 2"])
    );
    assert!(first_mem.lines().iter().all(|l| !l.contains("b1")));
    assert_eq!(second_mem.lines().len(), 15);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn detached_sleep_does_not_delay_the_next_task_with_real_processes() -> TestResult {
    use watchjob::exec::ProcessRunner;
    use watchjob::types::OutputMode;

    init_tracing();

    let (watcher, mem) = memory_watcher(
        "w",
        vec![Task::detached("sleep 5"), Task::blocking("echo done")],
    );
    let (tx, rx) = job_channel(1);
    tx.send(Job::new(Arc::clone(&watcher), "changed")).await?;
    drop(tx);

    let dispatcher = Dispatcher::new(rx, ProcessRunner::new(OutputMode::Prefixed));
    timeout(Duration::from_secs(3), dispatcher.run())
        .await
        .expect("dispatcher must not wait for the detached sleep")?;

    assert_eq!(
        mem.lines(),
        lines(&[
            "changed",
            "execute(nowait): sleep 5",
            "end(nowait): sleep 5",
            "execute: echo done",
            "done",
            "end: echo done",
        ])
    );
    Ok(())
}
