//! Grants, aims and the aim-level view of budget spend.

pub mod allocation;
pub mod error;
pub mod service;
pub mod spend;
pub mod types;

#[cfg(test)]
mod allocation_props;

pub use allocation::SpendAllocation;
pub use error::GrantError;
pub use service::GrantService;
pub use spend::{AimSpendBreakdown, SubAimSpend, aim_actual_spend, aim_breakdown, category_funds_aim};
pub use types::{
    Activity, Aim, Grant, GrantPatch, GrantStatus, Kpi, Milestone, NewActivity, NewAim, NewGrant,
    NewSubAim, NewTask, SubAim, Task, TaskStatus, WorkStatus,
};
