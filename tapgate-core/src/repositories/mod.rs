// tapgate-core/src/repositories/mod.rs

pub mod sqlite;

pub use sqlite::access_log::SqliteAccessLogRepository;
pub use sqlite::nfc_key::SqliteNfcKeyRepository;
pub use sqlite::user::SqliteUserRepository;
