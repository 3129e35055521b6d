//! CLI module - Command-line interface for projectideas
//!
//! Flags can also be supplied through the environment (or a `.env` file),
//! matching how the service is deployed.

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

/// Project Ideas - share project ideas tagged with what they need
#[derive(Parser, Debug)]
#[command(name = "projectideas")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Apply pending database migrations and exit
    Migrate,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

/// Settings that take precedence over the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Port to listen on
    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Database connection string
    #[arg(long, env = "DSN", global = true)]
    pub dsn: Option<String>,

    /// SMTP relay host; setting it enables outbound mail
    #[arg(long, env = "MAILER_HOST", global = true)]
    pub mailer_host: Option<String>,

    #[arg(long, env = "MAILER_PORT", global = true)]
    pub mailer_port: Option<u16>,

    #[arg(long, env = "MAILER_USERNAME", global = true)]
    pub mailer_username: Option<String>,

    #[arg(long, env = "MAILER_PASSWORD", global = true, hide_env_values = true)]
    pub mailer_password: Option<String>,

    #[arg(long, env = "MAILER_EMAIL_FROM", global = true)]
    pub mailer_email_from: Option<String>,
}

impl Overrides {
    pub fn apply(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(dsn) = &self.dsn {
            config.general.database_url.clone_from(dsn);
        }
        if let Some(host) = &self.mailer_host {
            config.mailer.host.clone_from(host);
            config.mailer.enabled = !host.is_empty();
        }
        if let Some(port) = self.mailer_port {
            config.mailer.port = port;
        }
        if let Some(username) = &self.mailer_username {
            config.mailer.username.clone_from(username);
        }
        if let Some(password) = &self.mailer_password {
            config.mailer.password.clone_from(password);
        }
        if let Some(from) = &self.mailer_email_from {
            config.mailer.email_from.clone_from(from);
        }
    }
}
