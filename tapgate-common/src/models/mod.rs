// tapgate-common/src/models/mod.rs

pub mod access_log;
pub mod nfc_key;
pub mod user;

pub use access_log::{AccessLogEntry, LogAction};
pub use nfc_key::{KeyStatus, NfcKey};
pub use user::User;
