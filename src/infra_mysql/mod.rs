mod conversation_repo_mysql;
mod friendship_repo_mysql;
mod membership_repo_mysql;
mod notification_repo_mysql;
mod user_directory_mysql;

pub use conversation_repo_mysql::*;
pub use friendship_repo_mysql::*;
pub use membership_repo_mysql::*;
pub use notification_repo_mysql::*;
pub use user_directory_mysql::*;

mod util;
