use std::io;
use std::time::Instant;

use axum::body::Body;
use bytes::Bytes;
use futures::StreamExt;
use reel_blob::{BlobId, ByteStream};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Streaming,
    Completed,
    Faulted,
}

/// One response body's worth of bytes from the store to a client.
///
/// The session owns the upstream read stream. Dropping the response body
/// (client went away, server shutting down) drops the session and with it
/// the store read, so nothing keeps draining an abandoned object.
pub struct StreamSession {
    label: &'static str,
    blob: BlobId,
    expected: u64,
    sent: u64,
    started: Instant,
    outcome: Outcome,
}

impl StreamSession {
    pub fn new(label: &'static str, blob: BlobId, expected: u64) -> Self {
        Self {
            label,
            blob,
            expected,
            sent: 0,
            started: Instant::now(),
            outcome: Outcome::Streaming,
        }
    }

    /// Turn the session into a response body that yields exactly
    /// `expected` bytes or fails.
    ///
    /// Extra upstream bytes are cut off; an upstream that ends early is an
    /// error, since `Content-Length` has already been promised.
    pub fn into_body(self, upstream: ByteStream) -> Body {
        let stream = async_stream::stream! {
            let mut session = self;
            let mut upstream = upstream;

            while session.sent < session.expected {
                match upstream.next().await {
                    Some(Ok(chunk)) => {
                        let remaining = session.expected - session.sent;
                        let chunk = if chunk.len() as u64 > remaining {
                            chunk.slice(..remaining as usize)
                        } else {
                            chunk
                        };
                        if chunk.is_empty() {
                            continue;
                        }
                        session.sent += chunk.len() as u64;
                        yield Ok::<Bytes, io::Error>(chunk);
                    }
                    Some(Err(err)) => {
                        session.fault(&err);
                        yield Err(err);
                        return;
                    }
                    None => {
                        let err = io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("store ended after {} of {} bytes", session.sent, session.expected),
                        );
                        session.fault(&err);
                        yield Err(err);
                        return;
                    }
                }
            }

            session.complete();
        };

        Body::from_stream(stream)
    }

    fn complete(&mut self) {
        self.outcome = Outcome::Completed;
        debug!(
            route = self.label,
            blob = %self.blob,
            bytes = self.sent,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "stream completed"
        );
    }

    fn fault(&mut self, err: &io::Error) {
        self.outcome = Outcome::Faulted;
        warn!(
            route = self.label,
            blob = %self.blob,
            sent = self.sent,
            expected = self.expected,
            error = %err,
            "store failed mid-stream; aborting response"
        );
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        if self.outcome == Outcome::Streaming {
            debug!(
                route = self.label,
                blob = %self.blob,
                sent = self.sent,
                expected = self.expected,
                "client disconnected"
            );
        }
    }
}
