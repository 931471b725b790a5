//! CLI command implementations.

mod config;
mod doctor;
mod generate;
mod init;
mod keys;
mod narrate;

pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::run_generate;
pub use init::run_init;
pub use keys::run_keys;
pub use narrate::run_narrate;
