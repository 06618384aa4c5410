mod engine;
mod gate;

pub use engine::{
    apply_decision, apply_stale, Disposition, EntityKind, EventKey, TriggerEngine, TriggerEvent,
};
pub use gate::{Admission, DecisionAnswer, DecisionGate, DecisionRequest};
