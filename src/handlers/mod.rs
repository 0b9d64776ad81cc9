pub mod blog;
pub mod health;
pub mod locations;
pub mod properties;
pub mod shared;
pub mod users;
