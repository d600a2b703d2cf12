//! # libreria-db: Database Layer for Librería
//!
//! This crate provides database access for the bookstore backend.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Librería Data Flow                               │
//! │                                                                         │
//! │  REST handler (POST /carrito/items)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   libreria-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │    │   │
//! │  │   │   (pool.rs)   │    │   (book.rs,   │    │  (embedded)  │    │   │
//! │  │   │               │    │   cart.rs...) │    │              │    │   │
//! │  │   │ SqlitePool    │◄───│ BookRepo      │    │ 001_init.sql │    │   │
//! │  │   │ Connection    │    │ CartRepo      │    │              │    │   │
//! │  │   │ Management    │    │ OrderRepo ... │    │              │    │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (libreria.db)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (book, cart, order, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libreria_db::{Database, DbConfig};
//!
//! let config = DbConfig::new("path/to/libreria.db");
//! let db = Database::new(config).await?;
//!
//! let book = db.books().get_by_isbn("9788437604947").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::book::BookRepository;
pub use repository::cart::{CartIdentity, CartRepository, CartRow};
pub use repository::catalog::{AuthorRepository, CategoryRepository, PublisherRepository};
pub use repository::checkout::{CheckoutSession, CheckoutSessionRepository};
pub use repository::coupon::CouponRepository;
pub use repository::order::{CheckoutConfirmation, ConfirmCheckoutParams, OrderRepository};
