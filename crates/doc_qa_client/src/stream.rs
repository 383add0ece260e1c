//! Response ingestion: raw body fragments in, decoded text out, in order.

use std::time::Duration;

use futures_util::{Stream, StreamExt};
use tracing::{debug, trace};

use crate::decode::{DecodeMode, Utf8StreamDecoder};
use crate::error::{describe, StreamError};

/// Stateless body reader. Each call to [`consume`](Self::consume) owns its own
/// decoder, so nothing carries over between turns.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamConsumer {
    mode: DecodeMode,
    idle_timeout: Option<Duration>,
}

impl StreamConsumer {
    pub fn new(mode: DecodeMode, idle_timeout: Option<Duration>) -> Self {
        Self { mode, idle_timeout }
    }

    /// Read `body` to the end, calling `on_text` with each decoded piece in
    /// arrival order.
    ///
    /// Text decoded before a failure has already been handed to `on_text`
    /// when the error is returned, including the valid prefix of a fragment
    /// that turned out to be malformed.
    pub async fn consume<S, B, E>(
        &self,
        body: S,
        mut on_text: impl FnMut(&str),
    ) -> Result<(), StreamError>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: std::error::Error,
    {
        futures_util::pin_mut!(body);
        let mut decoder = Utf8StreamDecoder::new(self.mode);
        let mut fragments = 0usize;
        let mut bytes = 0usize;

        loop {
            let next = match self.idle_timeout {
                Some(limit) => tokio::time::timeout(limit, body.next())
                    .await
                    .map_err(|_| StreamError::IdleTimeout(limit))?,
                None => body.next().await,
            };
            let Some(item) = next else { break };
            let fragment = item.map_err(|e| StreamError::Transport(describe(&e)))?;
            let fragment = fragment.as_ref();
            fragments += 1;
            bytes += fragment.len();
            trace!(len = fragment.len(), pending = decoder.pending(), "body fragment");

            let mut text = String::new();
            let decoded = decoder.decode(fragment, &mut text);
            if !text.is_empty() {
                on_text(&text);
            }
            decoded?;
        }

        let mut tail = String::new();
        let flushed = decoder.finish(&mut tail);
        if !tail.is_empty() {
            on_text(&tail);
        }
        flushed?;

        debug!(fragments, bytes, "response body finished");
        Ok(())
    }
}
