// directory

mod user_directory;

pub use user_directory::*;

// repo

mod conversation_repo;
mod friendship_repo;
mod membership_repo;
mod notification_repo;

pub use conversation_repo::*;
pub use friendship_repo::*;
pub use membership_repo::*;
pub use notification_repo::*;
