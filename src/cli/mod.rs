// CLI module for administrative operations requiring server access

pub mod grant_role;
pub mod migrate;

use clap::{Parser, Subcommand};

use crate::app_data::AppData;
use crate::types::internal::Role;

/// Ramen marketplace backend
#[derive(Parser, Debug)]
#[command(name = "ramen-backend")]
#[command(about = "Multi-tenant ramen marketplace REST backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run migrations and serve the HTTP API (default)
    Serve,

    /// Run pending database migrations and exit
    Migrate,

    /// Grant a role to an existing account, e.g. to bootstrap the first super admin
    GrantRole {
        /// Email of the account
        #[arg(long)]
        email: String,

        /// Role to grant: user, shop_owner or super_admin
        #[arg(long)]
        role: Role,
    },
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Serve)
    }
}

/// Execute an administrative command against an initialized AppData
///
/// `serve` and `migrate` are handled by `main` before AppData exists.
pub async fn execute_command(command: Commands, app_data: &AppData) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::GrantRole { email, role } => {
            grant_role::grant_role(app_data, &email, role).await?;
        }
        other => {
            tracing::debug!("{:?} is not an administrative command", other);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["ramen-backend"]);
        assert!(matches!(cli.command(), Commands::Serve));
    }

    #[test]
    fn test_parse_grant_role() {
        let cli = Cli::parse_from([
            "ramen-backend",
            "grant-role",
            "--email",
            "admin@example.com",
            "--role",
            "super_admin",
        ]);

        match cli.command() {
            Commands::GrantRole { email, role } => {
                assert_eq!(email, "admin@example.com");
                assert_eq!(role, Role::SuperAdmin);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = Cli::try_parse_from(["ramen-backend", "grant-role", "--email", "a@b.c", "--role", "emperor"]);
        assert!(result.is_err());
    }
}
