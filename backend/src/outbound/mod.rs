//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL/PostGIS store using Diesel ORM
//! - **memory**: in-process store for local runs and tests
//! - **places**: HTTP place resolver
//! - **tokens**: bearer token verification
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod places;
pub mod tokens;
