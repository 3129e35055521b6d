pub mod prelude;

pub mod ideas;
pub mod ideas_tags;
pub mod tags;
pub mod tokens;
pub mod users;
