use std::io::Write;

use futures::{Stream, StreamExt};
use log::info;
use tonic::{Code, Status};

use crate::session::{SessionError, Step};
use crate::tick::Tick;

/// Prints each tick as `price---timestamp` until the stream runs dry.
///
/// A `Cancelled` status counts as a clean end. Returns the number of ticks
/// written.
pub async fn consume<S, W>(mut ticks: S, out: &mut W) -> Result<u64, SessionError>
where
    S: Stream<Item = Result<Tick, Status>> + Unpin,
    W: Write,
{
    let mut seen = 0u64;
    while let Some(item) = ticks.next().await {
        match item {
            Ok(tick) => {
                writeln!(out, "{tick}")?;
                seen += 1;
            }
            Err(status) if status.code() == Code::Cancelled => {
                info!("stream cancelled: {}", status.message());
                break;
            }
            Err(status) => return Err(SessionError::rpc(Step::Watch)(status)),
        }
    }
    out.flush()?;
    info!("disconnected after {seen} ticks");
    Ok(seen)
}
