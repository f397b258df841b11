pub mod config_manager;
pub mod guild_directory;
pub mod permission_checker;
pub mod verification_manager;

pub use config_manager::{
    create_shared_config_manager, ConfigAuthorization, ConfigManager, SharedConfigManager,
};
pub use guild_directory::create_shared_guild_directory;
pub use permission_checker::run_startup_permission_check;
pub use verification_manager::{create_shared_verification_manager, SharedVerificationManager};
