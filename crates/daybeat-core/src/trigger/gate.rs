//! Single-flight admission for human prompts.
//!
//! At most one decision request is outstanding at any time. Requests
//! raised while one is outstanding are FIFO-queued, never dropped and
//! never force-resolved; their event keys were already marked processed
//! by the scan, so queueing cannot duplicate a prompt. Resolving the
//! current request promotes the head of the queue.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DecisionError;

use super::engine::EventKey;

/// A prompt awaiting a human answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRequest {
    /// Matches answers to requests; answering a stale id is rejected.
    pub id: Uuid,
    /// The boundary crossing that raised this request.
    pub key: EventKey,
    /// Entity name at the time the request was raised.
    pub entity_name: String,
    /// Question shown to the user.
    pub prompt: String,
    /// Scan instant at which the crossing was detected.
    pub detected_at: DateTime<Utc>,
}

/// Human answer to a decision request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAnswer {
    Confirm,
    Decline,
}

/// Where a submitted request landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Became the current request; surface it to the user.
    Surfaced,
    /// Parked behind the current request (0 = next up).
    Queued { position: usize },
}

/// The gate itself. `Default` starts idle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionGate {
    current: Option<DecisionRequest>,
    queue: VecDeque<DecisionRequest>,
}

impl DecisionGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request currently awaiting an answer, if any.
    pub fn current(&self) -> Option<&DecisionRequest> {
        self.current.as_ref()
    }

    /// Number of requests parked behind the current one.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// True when no request is current and nothing is queued.
    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    /// Admit a request: surface it if the gate is free, queue it behind
    /// the outstanding one otherwise.
    pub fn submit(&mut self, request: DecisionRequest) -> Admission {
        if self.current.is_none() {
            self.current = Some(request);
            Admission::Surfaced
        } else {
            self.queue.push_back(request);
            Admission::Queued {
                position: self.queue.len() - 1,
            }
        }
    }

    /// Resolve the current request by id, promoting the head of the
    /// queue. Returns the resolved request and the newly surfaced one.
    pub fn resolve(
        &mut self,
        id: Uuid,
    ) -> Result<(DecisionRequest, Option<&DecisionRequest>), DecisionError> {
        let current = self.current.take().ok_or(DecisionError::NoPendingDecision)?;
        if current.id != id {
            self.current = Some(current);
            return Err(DecisionError::RequestMismatch { submitted: id });
        }
        self.current = self.queue.pop_front();
        Ok((current, self.current.as_ref()))
    }

    /// Withdraw every request for `key`, current or queued. Used when the
    /// underlying entity is deleted while its prompt is in flight.
    /// Returns the number of requests withdrawn.
    pub fn retract(&mut self, key: EventKey) -> usize {
        let mut removed = 0;
        if self.current.as_ref().map(|r| r.key == key).unwrap_or(false) {
            self.current = None;
            removed += 1;
        }
        let before = self.queue.len();
        self.queue.retain(|r| r.key != key);
        removed += before - self.queue.len();
        if self.current.is_none() {
            self.current = self.queue.pop_front();
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::EntityKind;
    use super::*;

    fn request(id_seed: u64) -> DecisionRequest {
        DecisionRequest {
            id: Uuid::new_v4(),
            key: EventKey {
                kind: EntityKind::Activity,
                id: id_seed,
            },
            entity_name: format!("Activity {id_seed}"),
            prompt: format!("Activity \"Activity {id_seed}\" is starting now. Start?"),
            detected_at: Utc::now(),
        }
    }

    #[test]
    fn first_request_surfaces_rest_queue() {
        let mut gate = DecisionGate::new();
        assert!(gate.is_idle());

        assert_eq!(gate.submit(request(1)), Admission::Surfaced);
        assert_eq!(gate.submit(request(2)), Admission::Queued { position: 0 });
        assert_eq!(gate.submit(request(3)), Admission::Queued { position: 1 });

        assert_eq!(gate.current().unwrap().key.id, 1);
        assert_eq!(gate.queue_len(), 2);
    }

    #[test]
    fn resolve_promotes_fifo() {
        let mut gate = DecisionGate::new();
        gate.submit(request(1));
        gate.submit(request(2));
        gate.submit(request(3));

        let id = gate.current().unwrap().id;
        let (resolved, next) = gate.resolve(id).unwrap();
        assert_eq!(resolved.key.id, 1);
        assert_eq!(next.unwrap().key.id, 2);

        let id = gate.current().unwrap().id;
        let (resolved, next) = gate.resolve(id).unwrap();
        assert_eq!(resolved.key.id, 2);
        assert_eq!(next.unwrap().key.id, 3);

        let id = gate.current().unwrap().id;
        let (resolved, next) = gate.resolve(id).unwrap();
        assert_eq!(resolved.key.id, 3);
        assert!(next.is_none());
        assert!(gate.is_idle());
    }

    #[test]
    fn resolve_rejects_wrong_id() {
        let mut gate = DecisionGate::new();
        gate.submit(request(1));

        let stranger = Uuid::new_v4();
        let err = gate.resolve(stranger).unwrap_err();
        assert!(matches!(
            err,
            DecisionError::RequestMismatch { submitted } if submitted == stranger
        ));
        // Still outstanding after the failed attempt.
        assert_eq!(gate.current().unwrap().key.id, 1);
    }

    #[test]
    fn resolve_on_idle_gate_is_an_error() {
        let mut gate = DecisionGate::new();
        let err = gate.resolve(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, DecisionError::NoPendingDecision));
    }

    #[test]
    fn retract_current_promotes_next() {
        let mut gate = DecisionGate::new();
        gate.submit(request(1));
        gate.submit(request(2));

        let removed = gate.retract(EventKey {
            kind: EntityKind::Activity,
            id: 1,
        });
        assert_eq!(removed, 1);
        assert_eq!(gate.current().unwrap().key.id, 2);
        assert_eq!(gate.queue_len(), 0);
    }

    #[test]
    fn retract_clears_queued_duplicates_only() {
        let mut gate = DecisionGate::new();
        gate.submit(request(1));
        gate.submit(request(2));
        gate.submit(request(3));

        let removed = gate.retract(EventKey {
            kind: EntityKind::Activity,
            id: 2,
        });
        assert_eq!(removed, 1);
        assert_eq!(gate.current().unwrap().key.id, 1);
        assert_eq!(gate.queue_len(), 1);
    }
}
