pub use super::ideas::Entity as Ideas;
pub use super::ideas_tags::Entity as IdeasTags;
pub use super::tags::Entity as Tags;
pub use super::tokens::Entity as Tokens;
pub use super::users::Entity as Users;
