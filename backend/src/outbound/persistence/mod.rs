//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the store ports backed by PostgreSQL with the
//! PostGIS extension, via `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapters**: repository implementations only translate between
//!   Diesel rows and domain types.
//! - **Internal models**: row structs (`models.rs`) and the table DSL
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: every database failure is mapped onto the
//!   owning port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use linkup_backend::outbound::persistence::{DbPool, DieselLinkupRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/linkup")).await?;
//! let repo = DieselLinkupRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_linkup_repository;
mod models;
mod pool;
mod schema;

pub use diesel_linkup_repository::DieselLinkupRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
