//! Validation at the budget edit boundary.

use rust_decimal::Decimal;

use super::error::BudgetError;
use super::types::NewExpense;

/// Budget service for input validation.
///
/// Everything here runs before the tree is touched, so a rejected edit never
/// leaves a partial change behind.
pub struct BudgetService;

impl BudgetService {
    /// Validates a required label and returns it trimmed.
    ///
    /// # Errors
    ///
    /// Returns `BudgetError::MissingField` if the value is blank.
    pub fn validate_name(value: &str, field: &'static str) -> Result<String, BudgetError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(BudgetError::MissingField(field));
        }
        Ok(trimmed.to_string())
    }

    /// Validates an expense amount: present and strictly positive.
    pub fn validate_amount(amount: Option<Decimal>) -> Result<Decimal, BudgetError> {
        let amount = amount.ok_or(BudgetError::MissingAmount)?;
        if amount <= Decimal::ZERO {
            return Err(BudgetError::NonPositiveAmount(amount));
        }
        Ok(amount)
    }

    /// Validates an allocation or total: zero is allowed, negative is not.
    pub fn validate_allocation(allocated: Decimal) -> Result<(), BudgetError> {
        if allocated < Decimal::ZERO {
            return Err(BudgetError::NegativeAllocation(allocated));
        }
        Ok(())
    }

    /// Validates expense creation input, returning the trimmed description and amount.
    pub fn validate_new_expense(input: &NewExpense) -> Result<(String, Decimal), BudgetError> {
        let description = Self::validate_name(&input.description, "description")?;
        let amount = Self::validate_amount(input.amount)?;
        Ok((description, amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_blank_name_rejected() {
        assert!(matches!(
            BudgetService::validate_name("   ", "description"),
            Err(BudgetError::MissingField("description"))
        ));
    }

    #[test]
    fn test_name_trimmed() {
        assert_eq!(
            BudgetService::validate_name("  Travel ", "name").unwrap(),
            "Travel"
        );
    }

    #[test]
    fn test_missing_amount_rejected() {
        assert!(matches!(
            BudgetService::validate_amount(None),
            Err(BudgetError::MissingAmount)
        ));
    }

    #[test]
    fn test_zero_and_negative_amount_rejected() {
        assert!(matches!(
            BudgetService::validate_amount(Some(dec!(0))),
            Err(BudgetError::NonPositiveAmount(_))
        ));
        assert!(matches!(
            BudgetService::validate_amount(Some(dec!(-5))),
            Err(BudgetError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_zero_allocation_allowed() {
        assert!(BudgetService::validate_allocation(dec!(0)).is_ok());
        assert!(BudgetService::validate_allocation(dec!(-1)).is_err());
    }

    #[test]
    fn test_new_expense_validation() {
        let input = NewExpense {
            description: " Flights ".into(),
            amount: Some(dec!(420.50)),
            ..NewExpense::default()
        };
        let (description, amount) = BudgetService::validate_new_expense(&input).unwrap();
        assert_eq!(description, "Flights");
        assert_eq!(amount, dec!(420.50));
    }
}
