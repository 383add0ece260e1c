//! The single live turn and the observable view a frontend renders from.

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::batch::UploadBatch;
use crate::compose::{self, Payload};
use crate::config::Config;
use crate::decode::DecodeMode;
use crate::error::{InvalidTransition, SubmitError, TransportError};
use crate::stream::StreamConsumer;
use crate::transport::HttpTransport;
use crate::turn::{ConversationTurn, TurnStatus};

/// What a frontend should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing submitted yet.
    Empty,
    /// Last submission was refused; see [`ConversationView::notice`].
    Rejected,
    InProgress,
    Complete,
    Failed,
}

/// Snapshot published after every transition and every append.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationView {
    pub turn: Option<ConversationTurn>,
    /// Out-of-band validation message; set only when no turn exists.
    pub notice: Option<String>,
}

impl ConversationView {
    pub fn phase(&self) -> Phase {
        match (&self.turn, &self.notice) {
            (Some(turn), _) => match turn.status() {
                TurnStatus::Complete => Phase::Complete,
                TurnStatus::Failed => Phase::Failed,
                _ => Phase::InProgress,
            },
            (None, Some(_)) => Phase::Rejected,
            (None, None) => Phase::Empty,
        }
    }

    /// True once nothing more will change until the next submission.
    pub fn is_settled(&self) -> bool {
        matches!(
            self.phase(),
            Phase::Rejected | Phase::Complete | Phase::Failed
        )
    }

    fn is_busy(&self) -> bool {
        self.turn.as_ref().is_some_and(|t| !t.is_terminal())
    }
}

/// Owns the live turn. Frontends observe it through [`subscribe`](Self::subscribe).
pub struct ConversationState {
    transport: HttpTransport,
    consumer: StreamConsumer,
    view: watch::Sender<ConversationView>,
}

impl ConversationState {
    pub fn new(transport: HttpTransport, consumer: StreamConsumer) -> Self {
        let (view, _) = watch::channel(ConversationView::default());
        Self {
            transport,
            consumer,
            view,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let mode = if config.client.lossy_utf8 {
            DecodeMode::Lossy
        } else {
            DecodeMode::Strict
        };
        let consumer = StreamConsumer::new(mode, config.client.idle_timeout());
        Ok(Self::new(HttpTransport::new(config)?, consumer))
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> ConversationView {
        self.view.borrow().clone()
    }

    pub fn current_turn(&self) -> Option<ConversationTurn> {
        self.view.borrow().turn.clone()
    }

    /// Validate, send and stream one turn to its terminal state.
    ///
    /// Transport and stream failures end up in the turn (`Failed`), so `Ok`
    /// carries either terminal status. `Err` means no turn was started: the
    /// batch was invalid (the view then shows the notice and no turn) or a
    /// turn is still in flight (the view is left alone).
    pub async fn submit(&self, batch: &UploadBatch) -> Result<TurnStatus, SubmitError> {
        let composed = compose::compose(batch);

        let mut refused = None;
        self.view.send_if_modified(|view| {
            if view.is_busy() {
                refused = Some(SubmitError::Busy);
                return false;
            }
            *view = match &composed {
                Ok(_) => ConversationView {
                    turn: Some(ConversationTurn::new(batch)),
                    notice: None,
                },
                Err(e) => ConversationView {
                    turn: None,
                    notice: Some(e.to_string()),
                },
            };
            true
        });
        if let Some(err) = refused {
            warn!("submission refused: a turn is still in progress");
            return Err(err);
        }
        let payload = match composed {
            Ok(payload) => payload,
            Err(e) => {
                info!(error = ?e, "submission failed validation");
                return Err(e.into());
            }
        };

        info!(
            documents = batch.documents.len(),
            question_len = batch.question.len(),
            url = %self.transport.url(),
            "submitting question"
        );
        let mut guard = AbandonGuard {
            state: self,
            armed: true,
        };
        self.update(|t| t.begin_sending());

        let status = match self.exchange(payload).await {
            Ok(()) => {
                self.update(|t| t.complete());
                TurnStatus::Complete
            }
            Err(message) => {
                warn!(%message, "turn failed");
                self.update(|t| t.fail(message));
                TurnStatus::Failed
            }
        };
        guard.armed = false;
        info!(?status, "turn finished");
        Ok(status)
    }

    async fn exchange(&self, payload: Payload) -> Result<(), String> {
        let response = self
            .transport
            .dispatch(payload)
            .await
            .map_err(|e| e.to_string())?;
        self.update(|t| t.begin_streaming());

        self.consumer
            .consume(response.bytes_stream(), |text| {
                self.update(|t| t.append(text));
            })
            .await
            .map_err(|e| e.to_string())
    }

    /// Apply one mutation to the live turn and notify observers, atomically.
    fn update(&self, action: impl FnOnce(&mut ConversationTurn) -> Result<(), InvalidTransition>) {
        self.view.send_if_modified(|view| {
            let Some(turn) = view.turn.as_mut() else {
                return false;
            };
            match action(turn) {
                Ok(()) => true,
                Err(e) => {
                    debug!(error = %e, "turn update ignored");
                    false
                }
            }
        });
    }
}

/// Message left on a turn whose `submit` future was dropped mid-flight.
pub const ABANDONED_MESSAGE: &str = "request abandoned before the answer finished";

/// Fails the live turn if `submit` is dropped before reaching a terminal
/// state, so the slot is released and later submissions are not `Busy`.
struct AbandonGuard<'a> {
    state: &'a ConversationState,
    armed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("submit dropped while the turn was in flight");
            self.state.update(|t| t.fail(ABANDONED_MESSAGE));
        }
    }
}
