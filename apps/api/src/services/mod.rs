//! # Service Layer
//!
//! Orchestration between the pure core logic and the repositories. Each
//! service holds the shared database handle (and the payment gateway where
//! needed) and exposes the operations the handlers call.

pub mod cart_service;
pub mod checkout_service;
