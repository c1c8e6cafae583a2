use anyhow::{Context, Result, anyhow};
use pullgauge_parser::{ProcessingStats, StatusEvent, StreamFormat};
use std::io::BufRead;
use std::sync::mpsc::SyncSender;

/// Banner docker prints at the start of a push, e.g.
/// "The push refers to repository [docker.io/library/app]".
const PUSH_BANNER_PREFIX: &str = "The push";

/// Lift one raw output line into a status event. Lines without the
/// `": "` delimiter carry no layer status and yield nothing.
pub fn parse_line(line: &str) -> Option<StatusEvent> {
    let (layer, status) = line.split_once(": ")?;
    Some(StatusEvent::new(layer, status))
}

/// Read the input stream to exhaustion, feeding recognized lines into the
/// queue and flipping the stats format when the push banner appears.
///
/// Blocks on a full queue (the consumer sets the pace). A read failure is
/// fatal to the caller; there is no retry.
pub fn pump<R: BufRead>(
    input: R,
    queue: &SyncSender<StatusEvent>,
    stats: &ProcessingStats,
) -> Result<()> {
    for line in input.lines() {
        let line = line.context("failed to read input stream")?;

        if let Some(event) = parse_line(&line) {
            queue
                .send(event)
                .map_err(|_| anyhow!("stats consumer stopped unexpectedly"))?;
        }

        if line.starts_with(PUSH_BANNER_PREFIX) {
            stats.set_format(StreamFormat::Push);
        }
    }

    Ok(())
}
