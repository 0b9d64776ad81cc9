pub mod blog;
pub mod property;
pub mod user;

pub use blog::BlogRepository;
pub use property::PropertyRepository;
pub use user::UserRepository;
