pub mod audit;

pub use audit::SqliteAuditStore;
