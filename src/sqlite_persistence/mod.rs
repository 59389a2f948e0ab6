mod versioned_schema;

pub use versioned_schema::*;

/// Offset added to the schema version stored in `PRAGMA user_version`, so that
/// databases not created by this server (user_version 0) are rejected.
pub const BASE_DB_VERSION: usize = 77000;
