//! Grant construction and validation.

use std::collections::HashSet;

use chrono::{NaiveDate, Utc};
use grantwise_shared::types::{ActivityId, AimId, GrantId, SubAimId};
use rust_decimal::Decimal;

use super::error::GrantError;
use super::types::{
    Activity, Aim, Grant, GrantPatch, NewActivity, NewAim, NewGrant, NewSubAim, SubAim,
};

/// Grant service for building and validating grants.
pub struct GrantService;

impl GrantService {
    /// Validates input and builds a grant with fresh ids at every level.
    ///
    /// # Errors
    ///
    /// Returns `GrantError` if any field is invalid.
    pub fn build(input: NewGrant) -> Result<Grant, GrantError> {
        let title = Self::validate_label(&input.title, "title")?;
        Self::validate_amount(input.amount)?;
        Self::validate_dates(input.start_date, input.end_date)?;

        let aims = input
            .aims
            .into_iter()
            .map(Self::build_aim)
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        Ok(Grant {
            id: GrantId::new(),
            title,
            funding_agency: input.funding_agency.trim().to_string(),
            amount: input.amount,
            status: input.status,
            start_date: input.start_date,
            end_date: input.end_date,
            aims,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a patch, validating the merged result before writing anything.
    ///
    /// # Errors
    ///
    /// Returns `GrantError` if the patched grant would be invalid; `grant` is
    /// left untouched in that case.
    pub fn apply_patch(grant: &mut Grant, patch: GrantPatch) -> Result<(), GrantError> {
        let title = patch
            .title
            .as_deref()
            .map(|t| Self::validate_label(t, "title"))
            .transpose()?;
        if let Some(amount) = patch.amount {
            Self::validate_amount(amount)?;
        }
        let start = patch.start_date.or(grant.start_date);
        let end = patch.end_date.or(grant.end_date);
        Self::validate_dates(start, end)?;
        if let Some(aims) = &patch.aims {
            Self::validate_aims(aims)?;
        }

        if let Some(title) = title {
            grant.title = title;
        }
        if let Some(agency) = patch.funding_agency {
            grant.funding_agency = agency.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            grant.amount = amount;
        }
        if let Some(status) = patch.status {
            grant.status = status;
        }
        grant.start_date = start;
        grant.end_date = end;
        if let Some(aims) = patch.aims {
            grant.aims = aims;
        }
        grant.updated_at = Utc::now();
        Ok(())
    }

    /// Validates a replacement aim list.
    pub fn validate_aims(aims: &[Aim]) -> Result<(), GrantError> {
        let mut seen = HashSet::new();
        for aim in aims {
            if !seen.insert(aim.id) {
                return Err(GrantError::DuplicateAim(aim.id));
            }
            Self::validate_label(&aim.number, "aim number")?;
            Self::validate_amount(aim.budget_allocation)?;
            Self::validate_completion(aim.completion_percentage)?;
            for sub_aim in &aim.sub_aims {
                Self::validate_label(&sub_aim.number, "sub-aim number")?;
                Self::validate_amount(sub_aim.budget_allocation)?;
                Self::validate_completion(sub_aim.completion_percentage)?;
                for activity in &sub_aim.activities {
                    Self::validate_label(&activity.title, "activity title")?;
                    Self::validate_amount(activity.budget_amount)?;
                }
            }
        }
        Ok(())
    }

    fn build_aim(input: NewAim) -> Result<Aim, GrantError> {
        let number = Self::validate_label(&input.number, "aim number")?;
        Self::validate_amount(input.budget_allocation)?;
        Self::validate_completion(input.completion_percentage)?;
        let sub_aims = input
            .sub_aims
            .into_iter()
            .map(Self::build_sub_aim)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Aim {
            id: AimId::new(),
            number,
            title: input.title.trim().to_string(),
            description: input.description,
            status: input.status,
            budget_allocation: input.budget_allocation,
            completion_percentage: input.completion_percentage,
            sub_aims,
            kpis: input.kpis,
            milestones: input.milestones,
        })
    }

    fn build_sub_aim(input: NewSubAim) -> Result<SubAim, GrantError> {
        let number = Self::validate_label(&input.number, "sub-aim number")?;
        Self::validate_amount(input.budget_allocation)?;
        Self::validate_completion(input.completion_percentage)?;
        let activities = input
            .activities
            .into_iter()
            .map(Self::build_activity)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SubAim {
            id: SubAimId::new(),
            number,
            title: input.title.trim().to_string(),
            budget_allocation: input.budget_allocation,
            completion_percentage: input.completion_percentage,
            status: input.status,
            activities,
        })
    }

    fn build_activity(input: NewActivity) -> Result<Activity, GrantError> {
        let title = Self::validate_label(&input.title, "activity title")?;
        Self::validate_amount(input.budget_amount)?;
        Ok(Activity {
            id: ActivityId::new(),
            title,
            budget_amount: input.budget_amount,
            status: input.status,
            owner: input.owner,
            due_date: input.due_date,
            linked_task_id: input.linked_task_id,
        })
    }

    fn validate_label(value: &str, field: &'static str) -> Result<String, GrantError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(GrantError::MissingField(field));
        }
        Ok(trimmed.to_string())
    }

    fn validate_amount(amount: Decimal) -> Result<(), GrantError> {
        if amount < Decimal::ZERO {
            return Err(GrantError::NegativeAmount(amount));
        }
        Ok(())
    }

    fn validate_completion(value: u8) -> Result<(), GrantError> {
        if value > 100 {
            return Err(GrantError::InvalidCompletion(value));
        }
        Ok(())
    }

    fn validate_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), GrantError> {
        if let (Some(start), Some(end)) = (start, end)
            && end < start
        {
            return Err(GrantError::InvalidDateRange { start, end });
        }
        Ok(())
    }
}
