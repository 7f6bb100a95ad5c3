pub mod connection;
pub mod query;
pub mod schema;
pub mod seed;
pub mod sqlite;
