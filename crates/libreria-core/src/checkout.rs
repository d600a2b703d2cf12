//! # Checkout State Machine
//!
//! The durable checkout wizard: explicit states, guard-checked transitions,
//! and shipping-form validation with field-level errors.
//!
//! ## State Diagram
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Checkout Lifecycle                                  │
//! │                                                                         │
//! │              submit_shipping                pay (approved)              │
//! │   ┌───────┐ ───────────────► ┌──────────────────┐ ───────► ┌─────────┐ │
//! │   │ Draft │                  │  PaymentPending  │          │Confirmed│ │
//! │   └───────┘ ◄─────────────── └──────────────────┘          └─────────┘ │
//! │       │         go_back            │      ▲                 (terminal) │
//! │       │                            │      │ pay (declined:             │
//! │       │ cancel                     │      │ stays for retry)           │
//! │       ▼                            ▼                                   │
//! │   ┌────────┐ ◄──────────────── cancel                                  │
//! │   │ Failed │                                                           │
//! │   └────────┘ (terminal)                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Transitions are strictly forward/backward; skipping a step is rejected
//! with `InvalidCheckoutState`. The session is a database row, so progress
//! survives restarts and stale requests are rejected by the guards rather
//! than corrupting state.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Checkout State
// =============================================================================

/// The state of a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CheckoutState {
    /// Collecting shipping information (first wizard step).
    Draft,
    /// Shipping accepted; selecting a payment method and attempting
    /// payment (second step). Declined payments stay here for retry.
    PaymentPending,
    /// Payment approved, order created, cart cleared. Terminal.
    Confirmed,
    /// Session cancelled or abandoned. Terminal.
    Failed,
}

/// An action attempted against a checkout session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutAction {
    SubmitShipping,
    GoBack,
    ApplyCoupon,
    Pay,
    Cancel,
}

impl fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CheckoutAction::SubmitShipping => "submit shipping",
            CheckoutAction::GoBack => "go back to shipping",
            CheckoutAction::ApplyCoupon => "apply a coupon",
            CheckoutAction::Pay => "attempt payment",
            CheckoutAction::Cancel => "cancel",
        };
        write!(f, "{name}")
    }
}

impl CheckoutState {
    /// Snake_case name as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            CheckoutState::Draft => "draft",
            CheckoutState::PaymentPending => "payment_pending",
            CheckoutState::Confirmed => "confirmed",
            CheckoutState::Failed => "failed",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, CheckoutState::Confirmed | CheckoutState::Failed)
    }

    /// Checks the action is allowed in this state; rejects out-of-order
    /// wizard requests.
    pub fn ensure(self, action: CheckoutAction) -> CoreResult<()> {
        let allowed = match action {
            CheckoutAction::SubmitShipping => matches!(self, CheckoutState::Draft),
            CheckoutAction::GoBack => matches!(self, CheckoutState::PaymentPending),
            CheckoutAction::ApplyCoupon => {
                matches!(self, CheckoutState::Draft | CheckoutState::PaymentPending)
            }
            CheckoutAction::Pay => matches!(self, CheckoutState::PaymentPending),
            CheckoutAction::Cancel => !self.is_terminal(),
        };

        if allowed {
            Ok(())
        } else {
            Err(CoreError::InvalidCheckoutState {
                state: self.as_str().to_string(),
                action: action.to_string(),
            })
        }
    }
}

impl Default for CheckoutState {
    fn default() -> Self {
        CheckoutState::Draft
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Shipping Info
// =============================================================================

/// The shipping form collected in the first wizard step.
///
/// All fields are required; validation reports every violation at once,
/// keyed by field name, so the storefront can mark each input inline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub name: String,
    pub surname: String,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub phone: String,
    pub email: String,
}

/// Field-level validation errors keyed by wire field name.
///
/// BTreeMap keeps the reporting order deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.0.insert(field.to_string(), "obligatorio".to_string());
        }
    }
}

impl ShippingInfo {
    /// Validates the form. Every empty field is reported; the email must
    /// additionally look like an address. On any error the caller must not
    /// advance the wizard.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        errors.require("name", &self.name);
        errors.require("surname", &self.surname);
        errors.require("street", &self.street);
        errors.require("city", &self.city);
        errors.require("postalCode", &self.postal_code);
        errors.require("phone", &self.phone);
        errors.require("email", &self.email);

        let email = self.email.trim();
        if !email.is_empty() && !is_plausible_email(email) {
            errors
                .0
                .insert("email".to_string(), "no es un email válido".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Minimal shape check: something before and after a single '@', with a
/// dot in the domain part. Real deliverability is the mail system's job.
fn is_plausible_email(value: &str) -> bool {
    let mut parts = value.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_shipping() -> ShippingInfo {
        ShippingInfo {
            name: "Ana".to_string(),
            surname: "García".to_string(),
            street: "Calle Mayor 12".to_string(),
            city: "Madrid".to_string(),
            postal_code: "28013".to_string(),
            phone: "+34 600 000 000".to_string(),
            email: "ana@example.com".to_string(),
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(CheckoutState::Draft.ensure(CheckoutAction::SubmitShipping).is_ok());
        assert!(CheckoutState::PaymentPending.ensure(CheckoutAction::Pay).is_ok());
        assert!(CheckoutState::PaymentPending.ensure(CheckoutAction::GoBack).is_ok());
    }

    #[test]
    fn test_no_skipping_steps() {
        // Paying straight from the shipping step is rejected
        let err = CheckoutState::Draft.ensure(CheckoutAction::Pay).unwrap_err();
        assert!(matches!(err, CoreError::InvalidCheckoutState { .. }));

        // Re-submitting shipping after it was accepted is rejected
        assert!(CheckoutState::PaymentPending
            .ensure(CheckoutAction::SubmitShipping)
            .is_err());
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for state in [CheckoutState::Confirmed, CheckoutState::Failed] {
            assert!(state.is_terminal());
            assert!(state.ensure(CheckoutAction::SubmitShipping).is_err());
            assert!(state.ensure(CheckoutAction::GoBack).is_err());
            assert!(state.ensure(CheckoutAction::ApplyCoupon).is_err());
            assert!(state.ensure(CheckoutAction::Pay).is_err());
            assert!(state.ensure(CheckoutAction::Cancel).is_err());
        }
    }

    #[test]
    fn test_cancel_from_either_step() {
        assert!(CheckoutState::Draft.ensure(CheckoutAction::Cancel).is_ok());
        assert!(CheckoutState::PaymentPending.ensure(CheckoutAction::Cancel).is_ok());
    }

    #[test]
    fn test_shipping_complete_form_passes() {
        assert!(complete_shipping().validate().is_ok());
    }

    #[test]
    fn test_shipping_missing_email_reported_by_field() {
        let mut info = complete_shipping();
        info.email = String::new();

        let errors = info.validate().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.0.get("email").unwrap(), "obligatorio");
    }

    #[test]
    fn test_shipping_reports_all_empty_fields_at_once() {
        let info = ShippingInfo::default();
        let errors = info.validate().unwrap_err();

        for field in [
            "name",
            "surname",
            "street",
            "city",
            "postalCode",
            "phone",
            "email",
        ] {
            assert!(errors.0.contains_key(field), "missing error for {field}");
        }
    }

    #[test]
    fn test_shipping_whitespace_is_empty() {
        let mut info = complete_shipping();
        info.city = "   ".to_string();

        let errors = info.validate().unwrap_err();
        assert!(errors.0.contains_key("city"));
    }

    #[test]
    fn test_shipping_malformed_email() {
        let mut info = complete_shipping();
        for bad in ["ana", "ana@", "@example.com", "ana@example", "ana@.com"] {
            info.email = bad.to_string();
            let errors = info.validate().unwrap_err();
            assert_eq!(
                errors.0.get("email").unwrap(),
                "no es un email válido",
                "expected rejection for {bad}"
            );
        }
    }

    #[test]
    fn test_state_round_trips_as_str() {
        assert_eq!(CheckoutState::PaymentPending.as_str(), "payment_pending");
        assert_eq!(CheckoutState::Draft.to_string(), "draft");
    }
}
