// src/engine/channel.rs

//! Bounded multi-producer / single-consumer queue of [`Job`]s.
//!
//! Every watcher holds a [`JobSender`] clone; the dispatcher owns the only
//! [`JobReceiver`]. Sending waits while the queue is full, so a slow
//! dispatcher throttles watchers instead of jobs piling up or being dropped.

use tokio::sync::mpsc;

use crate::errors::{Error, Result};

use super::Job;

/// Create a job channel holding at most `capacity` jobs (minimum 1).
pub fn job_channel(capacity: usize) -> (JobSender, JobReceiver) {
    let capacity = capacity.max(1);
    let (tx, rx) = mpsc::channel::<Job>(capacity);
    (JobSender { tx, capacity }, JobReceiver { rx })
}

/// Producer half. Cheap to clone, one per watcher.
#[derive(Debug, Clone)]
pub struct JobSender {
    tx: mpsc::Sender<Job>,
    capacity: usize,
}

impl JobSender {
    /// Enqueue a job, waiting for room if the channel is full.
    ///
    /// Fails only if the dispatcher is gone.
    pub async fn send(&self, job: Job) -> Result<()> {
        self.tx
            .send(job)
            .await
            .map_err(|e| Error::msg(format!("job channel closed: {e}")))?;
        Ok(())
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of jobs currently buffered.
    pub fn queued(&self) -> usize {
        self.capacity - self.tx.capacity()
    }
}

/// Consumer half, owned by the dispatcher.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::Receiver<Job>,
}

impl JobReceiver {
    /// Next job in arrival order. `None` once every sender is dropped and the
    /// queue is empty.
    pub async fn recv(&mut self) -> Option<Job> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::context::{WatchTarget, Watcher};
    use crate::sink::MemorySink;

    fn watcher(name: &str) -> Arc<Watcher> {
        Arc::new(Watcher::new(
            name,
            WatchTarget::directory("."),
            Duration::from_millis(10),
            Vec::new(),
            Arc::new(MemorySink::new()),
        ))
    }

    #[tokio::test]
    async fn send_past_capacity_waits_for_a_recv() {
        let (tx, mut rx) = job_channel(2);
        let w = watcher("w");

        tx.send(Job::new(w.clone(), "1")).await.unwrap();
        tx.send(Job::new(w.clone(), "2")).await.unwrap();
        assert_eq!(tx.queued(), 2);

        // Third send must not complete while nobody receives.
        let blocked = {
            let tx = tx.clone();
            let w = w.clone();
            tokio::spawn(async move { tx.send(Job::new(w, "3")).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!blocked.is_finished());

        let first = rx.recv().await.unwrap();
        assert_eq!(first.message, "1");

        timeout(Duration::from_secs(1), blocked)
            .await
            .expect("send should complete once a slot frees up")
            .unwrap()
            .unwrap();

        let rest: Vec<String> = vec![
            rx.recv().await.unwrap().message,
            rx.recv().await.unwrap().message,
        ];
        assert_eq!(rest, vec!["2".to_string(), "3".to_string()]);
    }

    #[tokio::test]
    async fn jobs_from_several_senders_arrive_fifo() {
        let (tx, mut rx) = job_channel(8);
        let a = watcher("a");
        let b = watcher("b");

        tx.send(Job::new(a.clone(), "a1")).await.unwrap();
        tx.clone().send(Job::new(b.clone(), "b1")).await.unwrap();
        tx.send(Job::new(a, "a2")).await.unwrap();
        drop(tx);

        let mut seen = Vec::new();
        while let Some(job) = rx.recv().await {
            seen.push(format!("{}:{}", job.watcher.name(), job.message));
        }
        assert_eq!(seen, vec!["a:a1", "b:b1", "a:a2"]);
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped_to_one() {
        let (tx, _rx) = job_channel(0);
        assert_eq!(tx.capacity(), 1);
    }
}
