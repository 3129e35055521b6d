pub mod validator;
pub use validator::{FieldErrors, Validator};

pub mod credentials;
pub use credentials::{CredentialError, CredentialHasher};

pub mod tokens;
pub use tokens::{TokenError, TokenIssuer};

pub mod mailer;
pub use mailer::{LogMailer, MailError, Mailer, MemoryMailer, OutboundEmail, SmtpMailer};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService};
pub use auth_service_impl::SeaOrmAuthService;

pub mod idea_service;
pub mod idea_service_impl;
pub use idea_service::{CreateIdea, IdeaError, IdeaService};
pub use idea_service_impl::SeaOrmIdeaService;
