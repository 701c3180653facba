mod conversation;
mod event;
mod friend;
mod notification;
mod unit;
mod user;

pub use conversation::*;
pub use event::*;
pub use friend::*;
pub use notification::*;
pub use unit::*;
pub use user::*;
