//! Response classification
//!
//! Pure mapping from a [`ProbeOutcome`] to the gate decision. Precedence:
//!
//! 1. transport / TLS failure
//! 2. no response
//! 3. 200 with content
//! 4. 200 without content
//! 5. redirect (300-399)
//! 6. anything else
//!
//! Every branch that is not 3 or 5 locks.

use crate::decision::{GateDecision, ProbeOutcome};
use crate::error::GateError;

/// `Ok(())` when the outcome unlocks the gate, otherwise the reason it stays locked.
pub fn classify(outcome: &ProbeOutcome) -> Result<(), GateError> {
    let (status, content_length, body_len) = match outcome {
        ProbeOutcome::Failed(err) => return Err(err.clone()),
        ProbeOutcome::Response {
            status,
            content_length,
            body_len,
        } => (*status, *content_length, *body_len),
    };

    match status {
        200 if has_content(content_length, body_len) => Ok(()),
        200 => Err(GateError::EmptyContent { status }),
        300..=399 => Ok(()),
        _ => Err(GateError::ServerError { status }),
    }
}

pub fn decide(outcome: &ProbeOutcome) -> GateDecision {
    match classify(outcome) {
        Ok(()) => GateDecision::Unlocked,
        Err(err) => err.decision(),
    }
}

/// A declared zero length is an explicit "nothing here", even if bytes follow.
fn has_content(content_length: Option<u64>, body_len: usize) -> bool {
    content_length != Some(0) && body_len > 0
}
