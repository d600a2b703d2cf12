//! # Simulated Payment Gateway
//!
//! The storefront's payment step has a binary outcome with a fixed latency.
//! No real processor is involved: the gateway sleeps for the configured
//! latency and either approves with a synthetic reference or declines.
//!
//! A declining gateway (`PAYMENT_DECLINE_ALL=true`, or
//! [`SimulatedGateway::declining`] in tests) exercises the retry path:
//! the checkout session stays in the payment step after a decline.

use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;
use uuid::Uuid;

use libreria_core::{Money, PaymentMethod};

/// Outcome of a charge attempt.
#[derive(Debug, Clone)]
pub enum PaymentOutcome {
    /// Charge approved; `reference` identifies it with the provider.
    Approved { reference: String },
    /// Charge declined.
    Declined { reason: String },
}

/// Simulated payment gateway with fixed latency and a binary outcome.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    latency: Duration,
    decline_all: bool,
}

impl SimulatedGateway {
    /// Creates a gateway with the given latency.
    pub fn new(latency: Duration, decline_all: bool) -> Self {
        SimulatedGateway {
            latency,
            decline_all,
        }
    }

    /// Zero-latency approving gateway, for tests.
    pub fn instant() -> Self {
        SimulatedGateway::new(Duration::ZERO, false)
    }

    /// Zero-latency declining gateway, for tests.
    pub fn declining() -> Self {
        SimulatedGateway::new(Duration::ZERO, true)
    }

    /// Attempts to charge `amount` with the given method.
    pub async fn charge(&self, amount: Money, method: PaymentMethod) -> PaymentOutcome {
        debug!(amount = %amount, ?method, "Simulating payment");

        sleep(self.latency).await;

        if self.decline_all {
            return PaymentOutcome::Declined {
                reason: "el proveedor de pagos rechazó la operación".to_string(),
            };
        }

        PaymentOutcome::Approved {
            reference: format!("SIM-{}", Uuid::new_v4().simple()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_instant_gateway_approves() {
        let gateway = SimulatedGateway::instant();
        let outcome = gateway
            .charge(Money::from_cents(1000), PaymentMethod::Card)
            .await;
        assert!(matches!(outcome, PaymentOutcome::Approved { .. }));
    }

    #[tokio::test]
    async fn test_declining_gateway_declines() {
        let gateway = SimulatedGateway::declining();
        let outcome = gateway
            .charge(Money::from_cents(1000), PaymentMethod::Wallet)
            .await;
        assert!(matches!(outcome, PaymentOutcome::Declined { .. }));
    }
}
