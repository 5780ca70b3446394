//! Domain entities - Values that flow between the platform and the dispatcher

pub mod user;
pub mod message;

pub use user::User;
pub use message::{MessageEvent, Reply};
