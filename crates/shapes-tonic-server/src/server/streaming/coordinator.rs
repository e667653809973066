use crate::server::telemetry::increment_stream_items;
use core::time::Duration;
use futures::{Stream, StreamExt};
use shapes_tonic_core::Error;
use tokio::sync::mpsc;
use tonic::Status;

/// Sleeps between successive items, never before the first one.
#[derive(Debug)]
pub struct Pacer {
    delay: Duration,
    first: bool,
}

impl Pacer {
    pub const fn new(delay: Duration) -> Self {
        Self { delay, first: true }
    }

    pub async fn wait(&mut self) {
        if core::mem::take(&mut self.first) || self.delay.is_zero() {
            return;
        }
        tokio::time::sleep(self.delay).await;
    }
}

/// Maps every inbound item to one response and forwards it to the client.
///
/// This is the producer side of every server stream. It runs in a spawned
/// task and writes into `resp_tx`, whose receiver backs the gRPC response
/// stream.
///
/// # Behavior
///
/// - Exactly one response per inbound item, in inbound order.
/// - `delay` is slept between successive responses.
/// - An inbound error is forwarded to the client and ends the stream.
/// - A closed receiver (client cancelled or deadline hit) stops the producer
///   with [`Error::ChannelError`]; items already sent stay delivered.
pub async fn feed_responses<S, I, T, F>(
    mut inbound: S,
    mut respond: F,
    resp_tx: mpsc::Sender<Result<T, Status>>,
    delay: Duration,
    method: &'static str,
) -> shapes_tonic_core::Result<()>
where
    S: Stream<Item = Result<I, Status>> + Unpin,
    F: FnMut(I) -> T,
{
    let mut pacer = Pacer::new(delay);

    while let Some(item) = inbound.next().await {
        let response = match item {
            Ok(item) => respond(item),
            Err(status) => {
                tracing::warn!("Inbound stream failed: {status}");
                if resp_tx.send(Err(status.clone())).await.is_err() {
                    tracing::debug!("Client went away before the error was forwarded");
                }
                return Err(status.into());
            }
        };

        pacer.wait().await;
        if let Err(e) = resp_tx.send(Ok(response)).await {
            return Err(Error::ChannelError {
                context: format!("Failed to forward item: {e}"),
            });
        }
        increment_stream_items(method);
    }

    Ok(())
}
