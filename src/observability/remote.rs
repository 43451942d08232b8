//! Remote log delivery.
//!
//! # Responsibilities
//! - Queue formatted lines coming from the logging layer (bounded by `limit`)
//! - Push queued lines to the remote address every `push_period`
//! - On root cancellation: stop accepting, drain, push once more, close the signal
//!
//! # Design Decisions
//! - Newline-delimited raw lines over TCP, one connection per push
//! - Overflow drops lines instead of blocking the caller that is logging
//! - Push failures are logged to the fallback logger and never stop the worker

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::instrument::WithSubscriber;
use tracing::Dispatch;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::RemoteConfig;
use crate::observability::signal::{signal_pair, SignalCloser, SignalHandle};

/// Upper bound for a single connect + write.
const PUSH_TIMEOUT: Duration = Duration::from_secs(10);

/// Start the delivery worker on the current Tokio runtime.
///
/// Returns the writer the logging layer should write into and a handle that
/// closes once the worker has flushed everything after `cancel` fired.
pub fn spawn_delivery(
    config: &RemoteConfig,
    cancel: CancellationToken,
    fallback: Dispatch,
) -> (RemoteWriter, SignalHandle) {
    let (tx, rx) = mpsc::channel(config.limit);
    let dropped = Arc::new(AtomicUsize::new(0));
    let (closer, stopped) = signal_pair();

    let worker = DeliveryWorker {
        address: config.address.clone(),
        push_period: config.push_period,
        rx,
        dropped: dropped.clone(),
    };
    tokio::spawn(worker.run(cancel, closer).with_subscriber(fallback));

    (RemoteWriter { tx, dropped }, stopped)
}

/// `MakeWriter` feeding the delivery queue. Each formatted event becomes one line.
#[derive(Clone, Debug)]
pub struct RemoteWriter {
    tx: mpsc::Sender<String>,
    dropped: Arc<AtomicUsize>,
}

impl RemoteWriter {
    fn enqueue(&self, line: String) {
        match self.tx.try_send(line) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            // worker has stopped accepting
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

impl<'a> MakeWriter<'a> for RemoteWriter {
    type Writer = RemoteLine;

    fn make_writer(&'a self) -> Self::Writer {
        RemoteLine {
            buf: Vec::new(),
            sink: self.clone(),
        }
    }
}

/// Buffers one formatted event and enqueues it on drop.
pub struct RemoteLine {
    buf: Vec<u8>,
    sink: RemoteWriter,
}

impl io::Write for RemoteLine {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RemoteLine {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        let line = text.trim_end_matches('\n');
        if !line.is_empty() {
            self.sink.enqueue(line.to_string());
        }
    }
}

struct DeliveryWorker {
    address: String,
    push_period: Duration,
    rx: mpsc::Receiver<String>,
    dropped: Arc<AtomicUsize>,
}

impl DeliveryWorker {
    async fn run(mut self, cancel: CancellationToken, closer: SignalCloser) {
        tracing::debug!(address = %self.address, "Remote log delivery started");

        let mut ticker = time::interval(self.push_period);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        let mut batch = Vec::new();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.collect(&mut batch);
                    self.push(&mut batch).await;
                }
            }
        }

        self.rx.close();
        self.collect(&mut batch);
        self.push(&mut batch).await;

        tracing::debug!(address = %self.address, "Remote log delivery stopped");
        closer.close();
    }

    fn collect(&mut self, batch: &mut Vec<String>) {
        while let Ok(line) = self.rx.try_recv() {
            batch.push(line);
        }
    }

    async fn push(&self, batch: &mut Vec<String>) {
        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            tracing::warn!(dropped, address = %self.address, "Remote log queue full, lines dropped");
        }
        if batch.is_empty() {
            return;
        }

        let mut payload = String::new();
        for line in batch.drain(..) {
            payload.push_str(&line);
            payload.push('\n');
        }

        match time::timeout(PUSH_TIMEOUT, send(&self.address, payload.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(address = %self.address, error = %e, "Failed to push logs");
            }
            Err(_) => {
                tracing::error!(address = %self.address, "Failed to push logs: timeout");
            }
        }
    }
}

async fn send(address: &str, payload: &[u8]) -> io::Result<()> {
    let mut stream = TcpStream::connect(address).await?;
    stream.write_all(payload).await?;
    stream.shutdown().await
}
