pub mod idea;
pub mod token;
pub mod user;
