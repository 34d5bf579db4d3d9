pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "event-manager-api")]
#[command(about = "Event Manager API - multi-tenant event management backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the HTTP server (default when no command is given)")]
    Serve(commands::serve::ServeArgs),

    #[command(about = "Create an entreprise together with its first account")]
    CreateAccount(commands::account::CreateAccountArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        None => commands::serve::handle(commands::serve::ServeArgs::default()).await,
        Some(Commands::Serve(args)) => commands::serve::handle(args).await,
        Some(Commands::CreateAccount(args)) => commands::account::handle(args, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default() {
        let cli = Cli::try_parse_from(["event-manager-api"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Text);
    }

    #[test]
    fn serve_accepts_bind_and_port() {
        let cli = Cli::try_parse_from(["event-manager-api", "serve", "--bind", "127.0.0.1", "--port", "8080"]).unwrap();
        match cli.command {
            Some(Commands::Serve(args)) => {
                assert_eq!(args.bind.as_deref(), Some("127.0.0.1"));
                assert_eq!(args.port, Some(8080));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn create_account_defaults_to_super_admin() {
        let cli = Cli::try_parse_from([
            "event-manager-api",
            "--json",
            "create-account",
            "--entreprise",
            "Acme",
            "--nom",
            "Owner",
            "--email",
            "owner@acme.test",
            "--password",
            "long-enough",
        ])
        .unwrap();
        assert_eq!(OutputFormat::from_cli(&cli), OutputFormat::Json);
        match cli.command {
            Some(Commands::CreateAccount(args)) => assert_eq!(args.role, "super_admin"),
            _ => panic!("expected create-account"),
        }
    }

    #[test]
    fn create_account_requires_an_email() {
        assert!(Cli::try_parse_from(["event-manager-api", "create-account", "--entreprise", "Acme"]).is_err());
    }
}
