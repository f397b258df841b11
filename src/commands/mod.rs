pub mod config;
pub mod general;
pub mod verification;

pub use config::{reload_config, verification_log};
pub use general::{help, ping};
pub use verification::{approve, deny, pending_reviews, reverify};
