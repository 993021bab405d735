// history constants
pub const DEFAULT_COLLECTION_NAME: &str = "migrations";

// zero migration constants
pub const ZERO_VERSION: i64 = 0;
pub const ZERO_MIGRATION_NAME: &str = "-";

// lock constants
pub const LOCK_RESOURCE_PREFIX: &str = "$migrator_lock";
