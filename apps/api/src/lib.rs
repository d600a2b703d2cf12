//! # Librería API
//!
//! REST server for the online bookstore.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          API Layers                                     │
//! │                                                                         │
//! │  ┌──────────────────┐  ┌──────────────────┐  ┌───────────────────────┐  │
//! │  │  routes/         │  │  services/       │  │  libreria-db          │  │
//! │  │                  │  │                  │  │                       │  │
//! │  │ • /libros        │─►│ • CartService    │─►│ • repositories        │  │
//! │  │ • /carrito       │  │ • CheckoutService│  │ • migrations          │  │
//! │  │ • /checkout      │  │                  │  │ • SqlitePool          │  │
//! │  │ • /pedidos ...   │  │  (pricing rules  │  └───────────────────────┘  │
//! │  └──────────────────┘  │   come from      │                             │
//! │                        │   libreria-core) │  ┌───────────────────────┐  │
//! │  ┌──────────────────┐  └──────────────────┘  │  payment.rs           │  │
//! │  │  error.rs        │                        │  SimulatedGateway     │  │
//! │  │  ApiError → HTTP │                        │  (fixed latency,      │  │
//! │  └──────────────────┘                        │   binary outcome)     │  │
//! │                                              └───────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `PORT` - HTTP listen port (default: 8080)
//! - `DATABASE_PATH` - SQLite file path (default: ./libreria.db)
//! - `PAYMENT_LATENCY_MS` - simulated gateway latency (default: 1500)
//! - `PAYMENT_DECLINE_ALL` - make the gateway decline everything (default: false)
//! - `RUST_LOG` - tracing filter (default: info)

pub mod config;
pub mod error;
pub mod pagination;
pub mod payment;
pub mod routes;
pub mod services;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ErrorCode};
pub use state::AppState;
