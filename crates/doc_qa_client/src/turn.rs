//! One question-and-answer exchange and its lifecycle.

use serde::Serialize;

use crate::batch::UploadBatch;
use crate::error::InvalidTransition;

/// `Idle → Sending → Streaming → {Complete | Failed}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    #[default]
    Idle,
    Sending,
    Streaming,
    Complete,
    Failed,
}

impl TurnStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnStatus::Complete | TurnStatus::Failed)
    }
}

/// The single live turn. Only [`ConversationState`](crate::ConversationState)
/// mutates it; once terminal every mutation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationTurn {
    pub question_text: String,
    pub document_names: Vec<String>,
    answer_text: String,
    status: TurnStatus,
    error_message: Option<String>,
}

impl ConversationTurn {
    /// Capture the batch's question and names. The turn owns copies, so later
    /// edits to `batch` do not reach it.
    pub fn new(batch: &UploadBatch) -> Self {
        Self {
            question_text: batch.question.clone(),
            document_names: batch.document_names(),
            answer_text: String::new(),
            status: TurnStatus::Idle,
            error_message: None,
        }
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn answer_text(&self) -> &str {
        &self.answer_text
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn expect(&self, allowed: &[TurnStatus], action: &'static str) -> Result<(), InvalidTransition> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self.status,
                action,
            })
        }
    }

    pub fn begin_sending(&mut self) -> Result<(), InvalidTransition> {
        self.expect(&[TurnStatus::Idle], "send")?;
        self.answer_text.clear();
        self.status = TurnStatus::Sending;
        Ok(())
    }

    pub fn begin_streaming(&mut self) -> Result<(), InvalidTransition> {
        self.expect(&[TurnStatus::Sending], "start streaming")?;
        self.status = TurnStatus::Streaming;
        Ok(())
    }

    /// Append decoded text. The only way `answer_text` grows.
    pub fn append(&mut self, text: &str) -> Result<(), InvalidTransition> {
        self.expect(&[TurnStatus::Streaming], "append to")?;
        self.answer_text.push_str(text);
        Ok(())
    }

    pub fn complete(&mut self) -> Result<(), InvalidTransition> {
        self.expect(&[TurnStatus::Streaming], "complete")?;
        self.status = TurnStatus::Complete;
        Ok(())
    }

    /// Fail the turn. Whatever was accumulated stays in `answer_text`.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), InvalidTransition> {
        self.expect(&[TurnStatus::Sending, TurnStatus::Streaming], "fail")?;
        self.status = TurnStatus::Failed;
        self.error_message = Some(message.into());
        Ok(())
    }
}
