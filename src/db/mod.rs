//! Database module for PostgreSQL connection and table appends

pub mod connection;
pub mod sql;
pub mod table_writer;

pub use connection::connect;
pub use table_writer::PgTableWriter;
