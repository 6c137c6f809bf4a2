//! Grant domain types: grants, aims, sub-aims, activities and tasks.

use chrono::{DateTime, NaiveDate, Utc};
use grantwise_shared::types::{ActivityId, AimId, GrantId, SubAimId, TaskId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Funding status of a grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantStatus {
    /// Submitted, awaiting a funding decision.
    #[default]
    Pending,
    /// Funded and running.
    Active,
    /// Closed out.
    Completed,
    /// Not funded.
    Rejected,
}

impl GrantStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for GrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress status shared by aims, sub-aims and activities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkStatus {
    /// Not started.
    #[default]
    NotStarted,
    /// Under way.
    InProgress,
    /// Done.
    Completed,
    /// Behind schedule or over budget.
    AtRisk,
    /// Paused.
    OnHold,
}

impl WorkStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::AtRisk => "at-risk",
            Self::OnHold => "on-hold",
        }
    }
}

impl fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Key performance indicator tracked on an aim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kpi {
    /// Indicator name.
    pub name: String,
    /// Target value.
    pub target: Decimal,
    /// Current value.
    #[serde(default)]
    pub current: Decimal,
    /// Unit label (e.g. "participants").
    #[serde(default)]
    pub unit: String,
}

/// A dated checkpoint on an aim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Milestone title.
    pub title: String,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Whether it has been reached.
    #[serde(default)]
    pub completed: bool,
}

/// Leaf unit of work under a sub-aim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    /// Activity ID.
    pub id: ActivityId,
    /// Title.
    pub title: String,
    /// Budgeted amount.
    #[serde(default)]
    pub budget_amount: Decimal,
    /// Progress status.
    #[serde(default)]
    pub status: WorkStatus,
    /// Responsible person.
    #[serde(default)]
    pub owner: Option<String>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Linked task.
    #[serde(default)]
    pub linked_task_id: Option<TaskId>,
}

/// Second level of the aim hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubAim {
    /// Sub-aim ID.
    pub id: SubAimId,
    /// Display label (e.g. "1.1").
    pub number: String,
    /// Title.
    pub title: String,
    /// Budgeted amount; weights the proportional spend estimate.
    #[serde(default)]
    pub budget_allocation: Decimal,
    /// Completion percentage, 0 to 100.
    #[serde(default)]
    pub completion_percentage: u8,
    /// Progress status.
    #[serde(default)]
    pub status: WorkStatus,
    /// Activities in order.
    #[serde(default)]
    pub activities: Vec<Activity>,
}

/// A research aim of a grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aim {
    /// Aim ID.
    pub id: AimId,
    /// Display label (e.g. "Aim 1"); also the fallback key for category matching.
    pub number: String,
    /// Title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Progress status.
    #[serde(default)]
    pub status: WorkStatus,
    /// Budgeted amount.
    #[serde(default)]
    pub budget_allocation: Decimal,
    /// Completion percentage, 0 to 100.
    #[serde(default)]
    pub completion_percentage: u8,
    /// Sub-aims in order.
    #[serde(default)]
    pub sub_aims: Vec<SubAim>,
    /// Indicators.
    #[serde(default)]
    pub kpis: Vec<Kpi>,
    /// Milestones.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// A funded (or proposed) grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    /// Grant ID.
    pub id: GrantId,
    /// Title.
    pub title: String,
    /// Funder name.
    #[serde(default)]
    pub funding_agency: String,
    /// Awarded amount.
    #[serde(default)]
    pub amount: Decimal,
    /// Funding status.
    #[serde(default)]
    pub status: GrantStatus,
    /// Start date.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// End date.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Aims in order.
    #[serde(default)]
    pub aims: Vec<Aim>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Grant {
    /// Looks up an aim by id.
    #[must_use]
    pub fn aim(&self, id: AimId) -> Option<&Aim> {
        self.aims.iter().find(|a| a.id == id)
    }
}

impl Aim {
    /// Looks up a sub-aim by id.
    #[must_use]
    pub fn sub_aim(&self, id: SubAimId) -> Option<&SubAim> {
        self.sub_aims.iter().find(|s| s.id == id)
    }
}

/// Input for an activity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewActivity {
    /// Title.
    pub title: String,
    /// Budgeted amount.
    #[serde(default)]
    pub budget_amount: Decimal,
    /// Progress status.
    #[serde(default)]
    pub status: WorkStatus,
    /// Responsible person.
    #[serde(default)]
    pub owner: Option<String>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Linked task.
    #[serde(default)]
    pub linked_task_id: Option<TaskId>,
}

/// Input for a sub-aim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSubAim {
    /// Display label.
    pub number: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Budgeted amount.
    #[serde(default)]
    pub budget_allocation: Decimal,
    /// Completion percentage.
    #[serde(default)]
    pub completion_percentage: u8,
    /// Progress status.
    #[serde(default)]
    pub status: WorkStatus,
    /// Activities.
    #[serde(default)]
    pub activities: Vec<NewActivity>,
}

/// Input for an aim.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAim {
    /// Display label.
    pub number: String,
    /// Title.
    #[serde(default)]
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Progress status.
    #[serde(default)]
    pub status: WorkStatus,
    /// Budgeted amount.
    #[serde(default)]
    pub budget_allocation: Decimal,
    /// Completion percentage.
    #[serde(default)]
    pub completion_percentage: u8,
    /// Sub-aims.
    #[serde(default)]
    pub sub_aims: Vec<NewSubAim>,
    /// Indicators.
    #[serde(default)]
    pub kpis: Vec<Kpi>,
    /// Milestones.
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

/// Input for creating a grant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGrant {
    /// Title.
    pub title: String,
    /// Funder name.
    #[serde(default)]
    pub funding_agency: String,
    /// Awarded amount.
    #[serde(default)]
    pub amount: Decimal,
    /// Funding status.
    #[serde(default)]
    pub status: GrantStatus,
    /// Start date.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// End date.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    /// Aims.
    #[serde(default)]
    pub aims: Vec<NewAim>,
}

/// Partial grant update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrantPatch {
    /// New title.
    pub title: Option<String>,
    /// New funder name.
    pub funding_agency: Option<String>,
    /// New awarded amount.
    pub amount: Option<Decimal>,
    /// New status.
    pub status: Option<GrantStatus>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
    /// Replacement aim list. Existing ids are kept, new entries need fresh ids.
    pub aims: Option<Vec<Aim>>,
}

/// Task status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// Under way.
    InProgress,
    /// Finished.
    Done,
}

/// A to-do item, optionally linked to a grant and aim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task ID.
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Grant the task belongs to.
    #[serde(default)]
    pub grant_id: Option<GrantId>,
    /// Aim the task belongs to.
    #[serde(default)]
    pub aim_id: Option<AimId>,
    /// Status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Assignee.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTask {
    /// Title.
    pub title: String,
    /// Grant.
    #[serde(default)]
    pub grant_id: Option<GrantId>,
    /// Aim.
    #[serde(default)]
    pub aim_id: Option<AimId>,
    /// Status.
    #[serde(default)]
    pub status: TaskStatus,
    /// Assignee.
    #[serde(default)]
    pub assignee: Option<String>,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}
