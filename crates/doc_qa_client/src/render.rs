//! Terminal rendering: follow the view and print the answer as it grows.

use std::io::Write;

use tokio::sync::watch;

use crate::state::ConversationView;
use crate::turn::TurnStatus;

/// How the followed turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Complete,
    Failed(String),
    /// Submission refused with this notice; no turn was created.
    Rejected(String),
}

/// Write the turn to `out` until it settles.
///
/// Prints a header once the turn appears, then only the newly appended
/// suffix of the answer on each change. Observers may miss intermediate
/// snapshots; the answer is append-only, so the final output is the same.
pub async fn follow<W: Write>(
    mut rx: watch::Receiver<ConversationView>,
    out: &mut W,
) -> std::io::Result<RenderOutcome> {
    let mut printed = 0usize;
    let mut header = false;

    loop {
        let outcome = {
            let view = rx.borrow_and_update();
            match &view.turn {
                None => view.notice.clone().map(RenderOutcome::Rejected),
                Some(turn) => {
                    if !header {
                        writeln!(
                            out,
                            "You asked about \"{}\":",
                            turn.document_names.join(", ")
                        )?;
                        writeln!(out, "{}", turn.question_text)?;
                        writeln!(out)?;
                        header = true;
                    }
                    if let Some(new) = turn.answer_text().get(printed..) {
                        if !new.is_empty() {
                            out.write_all(new.as_bytes())?;
                            out.flush()?;
                            printed += new.len();
                        }
                    }
                    match turn.status() {
                        TurnStatus::Complete => Some(RenderOutcome::Complete),
                        TurnStatus::Failed => Some(RenderOutcome::Failed(
                            turn.error_message().unwrap_or("unknown error").to_string(),
                        )),
                        _ => None,
                    }
                }
            }
        };

        if let Some(outcome) = outcome {
            if printed > 0 {
                writeln!(out)?;
            }
            return Ok(outcome);
        }
        if rx.changed().await.is_err() {
            return Ok(RenderOutcome::Failed(
                "conversation closed before the answer finished".into(),
            ));
        }
    }
}
