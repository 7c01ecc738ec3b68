//! Validation of user-submitted payment claims.

use common::{BookingId, Money};
use entity_store::NewPayment;

use crate::error::WorkflowError;

/// Longest accepted payment-network reference.
pub const MAX_REFERENCE_LEN: usize = 64;

/// A validated claim that the user paid out of band.
///
/// Construct through [`PaymentClaim::parse`]; a value of this type always
/// has a positive amount and a non-empty reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentClaim {
    amount: Money,
    reference: String,
    screenshot_url: Option<String>,
}

impl PaymentClaim {
    /// Validates raw claim input.
    ///
    /// The reference is trimmed. A blank screenshot URL is treated as absent.
    pub fn parse(
        amount: i64,
        reference: &str,
        screenshot_url: Option<String>,
    ) -> Result<Self, WorkflowError> {
        let amount = Money::from_minor(amount);
        if !amount.is_positive() {
            return Err(WorkflowError::Validation(format!(
                "payment amount must be positive, got {}",
                amount.minor()
            )));
        }

        let reference = reference.trim();
        if reference.is_empty() {
            return Err(WorkflowError::Validation(
                "payment reference is required".to_string(),
            ));
        }
        if reference.chars().count() > MAX_REFERENCE_LEN {
            return Err(WorkflowError::Validation(format!(
                "payment reference is longer than {MAX_REFERENCE_LEN} characters"
            )));
        }

        let screenshot_url = screenshot_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(Self {
            amount,
            reference: reference.to_string(),
            screenshot_url,
        })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn screenshot_url(&self) -> Option<&str> {
        self.screenshot_url.as_deref()
    }

    pub(crate) fn into_payment(self, booking_id: BookingId) -> NewPayment {
        NewPayment {
            booking_id,
            amount: self.amount,
            upi_reference: self.reference,
            screenshot_url: self.screenshot_url,
        }
    }
}
