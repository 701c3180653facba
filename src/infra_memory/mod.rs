//! Process-local stores backing the `memory` store backend and the tests.

mod conversation_repo_memory;
mod flaky_repo_fake;
mod friendship_repo_memory;
mod membership_repo_memory;
mod notification_repo_memory;
mod user_directory_memory;

pub use conversation_repo_memory::*;
pub use flaky_repo_fake::*;
pub use friendship_repo_memory::*;
pub use membership_repo_memory::*;
pub use notification_repo_memory::*;
pub use user_directory_memory::*;
