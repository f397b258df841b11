pub mod guild;
pub mod message;

pub use guild::{handle_guild_create, handle_member_add, handle_member_remove, handle_role_delete};
pub use message::handle_message;
