use anyhow::{anyhow, Context};
use clap::Args;
use serde_json::{json, Value};

use crate::auth::password::hash_password;
use crate::cli::OutputFormat;
use crate::config;
use crate::database::{Database, DatabaseManager, PgDatabase};
use crate::handlers::entreprise::create_tenant;
use crate::resources::accounts::{ACCOUNT_CREATE, PERMANENT};

#[derive(Args, Debug)]
pub struct CreateAccountArgs {
    #[arg(long, help = "Name of the new entreprise")]
    pub entreprise: String,

    #[arg(long, help = "Display name of the first account")]
    pub nom: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    #[arg(long, default_value = "super_admin")]
    pub role: String,
}

/// Bootstrap a tenant: one entreprise row and its first account, in one
/// transaction.
pub async fn handle(args: CreateAccountArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = json!({
        "nom": &args.nom,
        "email": &args.email,
        "password": &args.password,
        "role": &args.role,
        "type": PERMANENT,
    });
    let mut account = ACCOUNT_CREATE
        .validate(&body)
        .map_err(|e| anyhow!("{}: {:?}", e, e.field_errors))?;

    let config = config::config();
    let password = account.get("password").and_then(Value::as_str).unwrap_or_default().to_string();
    let hashed = hash_password(&password, config.security.bcrypt_cost).await?;
    account.insert("password", Value::from(hashed));

    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let db = PgDatabase::new(pool, &config.database);

    let mut tx = db.begin().await.context("failed to open transaction")?;
    let (entreprise_id, account_id) = match create_tenant(tx.as_mut(), &args.entreprise, account).await {
        Ok(ids) => {
            tx.commit().await?;
            ids
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            return Err(e.into());
        }
    };

    match output_format {
        OutputFormat::Json => {
            println!("{}", json!({"entreprise_id": entreprise_id, "account_id": account_id}));
        }
        OutputFormat::Text => {
            println!(
                "Created entreprise '{}' (ID {}) with account {} (ID {})",
                args.entreprise, entreprise_id, args.email, account_id
            );
        }
    }
    Ok(())
}
