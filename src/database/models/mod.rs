pub mod blog;
pub(crate) mod macros;
pub mod property;
pub mod user;

pub use blog::*;
pub use property::*;
pub use user::*;
