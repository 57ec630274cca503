//! Database layer for Reconcile

mod connection;
mod migrations;
mod repository;
mod writers;

pub use connection::Database;
pub use repository::{ConflictRepository, LibSqlConflictRepository};
pub use writers::{validate_table_name, LibSqlTableWriter, TableWriter, WriterRegistry};
