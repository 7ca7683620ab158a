// tapgate-core/src/services/mod.rs

pub mod claim_service;
pub mod command_service;
pub mod key_admin_service;

pub use claim_service::{ClaimOutcome, ClaimService};
pub use command_service::CommandService;
pub use key_admin_service::KeyAdminService;
