//! Streaming bodies for the firehose and partial directives.

use std::convert::Infallible;
use std::io;
use std::time::Duration;

use axum::body::{Body, Bytes};
use futures_util::stream;
use tokio::sync::mpsc;

use crate::net::Hijacker;

/// First chunk of a firehose.
pub const FIREHOSE_PREAMBLE: &[u8] = b"On, ";

/// Repeated after the preamble until the client goes away.
pub const FIREHOSE_CHUNK: &[u8] = b"and on, and on, ";

/// Time given to the connection to write a response head before it is cut.
const HEAD_FLUSH_GRACE: Duration = Duration::from_millis(10);

/// An endless body, one chunk per `interval`.
///
/// The producer task stops on its own once the body is dropped, which
/// happens when the client disconnects.
pub fn firehose(interval: Duration) -> Body {
    let (tx, rx) = mpsc::channel::<Bytes>(1);

    tokio::spawn(async move {
        if tx.send(Bytes::from_static(FIREHOSE_PREAMBLE)).await.is_err() {
            return;
        }
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if tx.is_closed() || tx.send(Bytes::from_static(FIREHOSE_CHUNK)).await.is_err() {
                break;
            }
        }
        tracing::debug!("Firehose client went away");
    });

    Body::from_stream(stream::unfold(rx, |mut rx| async move {
        let chunk = rx.recv().await?;
        Some((Ok::<_, Infallible>(chunk), rx))
    }))
}

enum Partial {
    Head(Bytes, Hijacker),
    Cut(Hijacker),
    Done,
}

/// A body that sends `head` and then takes the connection down before the
/// response is complete.
pub fn partial(head: Bytes, hijacker: Hijacker) -> Body {
    Body::from_stream(stream::unfold(
        Partial::Head(head, hijacker),
        |state| async move {
            match state {
                Partial::Head(head, hijacker) => Some((Ok(head), Partial::Cut(hijacker))),
                Partial::Cut(hijacker) => {
                    // Give the connection a turn to flush the head first.
                    tokio::task::yield_now().await;
                    take_over(&hijacker);
                    let cut = io::Error::new(io::ErrorKind::ConnectionAborted, "response cut short");
                    Some((Err(cut), Partial::Done))
                }
                Partial::Done => None,
            }
        },
    ))
}

/// Cut the connection shortly after the response head is written.
///
/// For responses whose body the connection never polls (HEAD, 204, 304),
/// where [`partial`] would never get to act.
pub fn cut_after_head(hijacker: Hijacker) {
    tokio::spawn(async move {
        tokio::time::sleep(HEAD_FLUSH_GRACE).await;
        take_over(&hijacker);
    });
}

fn take_over(hijacker: &Hijacker) {
    if let Err(e) = hijacker.hijack() {
        tracing::debug!(
            connection_id = %hijacker.connection_id(),
            error = %e,
            "Hijack failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::connection::ConnectionId;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn firehose_repeats_after_the_preamble() {
        let mut body = firehose(Duration::from_millis(1)).into_data_stream();
        let mut seen = Vec::new();
        while seen.len() < FIREHOSE_PREAMBLE.len() + 3 * FIREHOSE_CHUNK.len() {
            let chunk = body.next().await.unwrap().unwrap();
            seen.extend_from_slice(&chunk);
        }
        assert!(seen.starts_with(b"On, and on, and on, and on, and on, "));
    }

    #[tokio::test]
    async fn partial_yields_head_then_fails() {
        let (hijacker, takeover) = Hijacker::pair(ConnectionId::new());
        let mut body = partial(Bytes::from_static(b"abc"), hijacker).into_data_stream();

        let first = body.next().await.unwrap().unwrap();
        assert_eq!(&first[..], b"abc");
        assert!(body.next().await.unwrap().is_err());
        assert!(takeover.await.is_ok());
    }

    #[tokio::test]
    async fn cut_after_head_needs_no_body_poll() {
        let (hijacker, takeover) = Hijacker::pair(ConnectionId::new());
        cut_after_head(hijacker);
        let fired = tokio::time::timeout(Duration::from_secs(1), takeover).await;
        assert!(matches!(fired, Ok(Ok(()))));
    }
}
