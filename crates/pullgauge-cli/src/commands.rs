use crate::args::Cli;
use crate::logging;
use crate::reader;
use anyhow::{Result, bail};
use pullgauge_parser::{ProcessingStats, QUEUE_CAPACITY, StatusEvent};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, SyncSender, channel, sync_channel};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::debug;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(&cli);
    debug!("parse: start");

    let stats = Arc::new(ProcessingStats::new());
    let (tx, rx) = sync_channel::<StatusEvent>(QUEUE_CAPACITY);

    let consumer = spawn_consumer(Arc::clone(&stats), rx)?;
    let ticker = spawn_ticker(cli.interval, tx.clone())?;

    let pump_result = reader::pump(io::stdin().lock(), &tx, &stats);

    // Closing the queue is the consumer's only stop signal: every sender
    // clone has to go, including the ticker's.
    if let Some(ticker) = ticker {
        ticker.stop();
    }
    drop(tx);

    if consumer.join().is_err() {
        bail!("stats consumer thread panicked");
    }

    pump_result?;

    // One last snapshot so truncated streams still end on a summary.
    stats.render();
    debug!("parse: end");

    Ok(())
}

fn spawn_consumer(
    stats: Arc<ProcessingStats>,
    queue: Receiver<StatusEvent>,
) -> Result<JoinHandle<()>> {
    let handle = std::thread::Builder::new()
        .name("stats-consumer".to_string())
        .spawn(move || stats.run(queue))?;

    Ok(handle)
}

struct TickerHandle {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

impl TickerHandle {
    fn stop(self) {
        drop(self.shutdown);
        let _ = self.handle.join();
    }
}

/// Secondary producer that enqueues a snapshot marker every `interval`
/// seconds, through the same queue as real events so ordering holds.
/// Returns `None` when the ticker is disabled.
fn spawn_ticker(interval: u64, queue: SyncSender<StatusEvent>) -> Result<Option<TickerHandle>> {
    if interval == 0 {
        return Ok(None);
    }

    let (shutdown_tx, shutdown_rx) = channel::<()>();
    let period = Duration::from_secs(interval);

    let handle = std::thread::Builder::new()
        .name("snapshot-ticker".to_string())
        .spawn(move || {
            loop {
                match shutdown_rx.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        if queue.send(StatusEvent::print_marker()).is_err() {
                            break;
                        }
                    }
                    // Shutdown sender dropped: input is done.
                    _ => break,
                }
            }
        })?;

    Ok(Some(TickerHandle {
        shutdown: shutdown_tx,
        handle,
    }))
}
