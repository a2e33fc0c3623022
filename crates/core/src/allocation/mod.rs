//! Allocation rules.
//!
//! Deterministic splitting of amounts across destination accounts, with
//! exact conservation of the input.

pub mod engine;
pub mod error;
pub mod types;

pub use engine::AllocationService;
pub use error::AllocationError;
pub use types::{
    AllocationDestination, AllocationMethod, AllocationRule, AllocationSlice, CreateRuleInput,
    UpdateRulePatch,
};
