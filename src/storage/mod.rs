// Business store: schema migrations, the single-writer builder and read-only queries

pub mod builder;
pub mod migrations;
pub mod query;

pub use builder::{RunLineage, StoreBuilder, StoreStats};
pub use query::{BusinessQuery, StoreReader};
