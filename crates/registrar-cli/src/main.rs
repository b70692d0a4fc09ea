//! Registrar CLI - account administration
//!
//! Usage:
//!   registrar init-db
//!   registrar create-admin --email <email> --password <password>
//!   registrar unlock <id-or-email>
//!   registrar hash-password [password]    (or REGISTRAR_PASSWORD)
//!   registrar check-token <token>

use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use registrar_api::auth::{
    AccountRepository, AuthService, PasswordConfig, PasswordHasher, PgAccountRepository,
    ProvisionAdmin, TokenConfig, TokenIssuer,
};
use registrar_core::{normalize_email, AppConfig};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "registrar")]
#[command(about = "Registrar account administration")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the accounts table if it does not exist
    InitDb,
    /// Provision an administrator account
    CreateAdmin {
        #[arg(long)]
        email: String,
        /// Initial password; must be changed on first login
        #[arg(long, env = "REGISTRAR_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "System")]
        first_name: String,
        #[arg(long, default_value = "Administrator")]
        last_name: String,
        #[arg(long)]
        department: Option<String>,
    },
    /// Clear the lock on an account, by id or email
    Unlock { account: String },
    /// Print the Argon2id hash of a password with the configured parameters
    HashPassword {
        #[arg(env = "REGISTRAR_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Verify a session token and print its account id
    CheckToken { token: String },
}

async fn open_store(config: &AppConfig) -> anyhow::Result<PgAccountRepository> {
    let Some(url) = &config.database.url else {
        bail!("DATABASE_URL is required for this command");
    };
    let repo = PgAccountRepository::connect(url, config.database.max_connections)
        .await
        .context("connecting to PostgreSQL")?;
    repo.ensure_schema().await?;
    Ok(repo)
}

async fn resolve_account(repo: &PgAccountRepository, target: &str) -> anyhow::Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(target) {
        return Ok(id);
    }
    match repo.find_by_email(&normalize_email(target)).await? {
        Some(account) => Ok(account.id),
        None => bail!("no account with email {target}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,audit=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    config.validate()?;

    match cli.command {
        Commands::InitDb => {
            open_store(&config).await?;
            println!("accounts schema ready");
        }
        Commands::CreateAdmin {
            email,
            password,
            first_name,
            last_name,
            department,
        } => {
            let repo = open_store(&config).await?;
            let service = AuthService::from_config(Arc::new(repo), &config.auth)?;
            let admin = service
                .provision_admin(ProvisionAdmin {
                    email,
                    password,
                    first_name,
                    last_name,
                    department,
                })
                .await?;
            println!("Created admin {} ({})", admin.email, admin.id);
        }
        Commands::Unlock { account } => {
            let repo = open_store(&config).await?;
            let id = resolve_account(&repo, &account).await?;
            let service = AuthService::from_config(Arc::new(repo), &config.auth)?;
            let unlocked = service.unlock_account(id, None).await?;
            println!("Unlocked {} ({})", unlocked.email, unlocked.id);
        }
        Commands::HashPassword { password } => {
            let hasher = PasswordHasher::new(PasswordConfig::from(&config.auth))?;
            println!("{}", hasher.hash(&password)?);
        }
        Commands::CheckToken { token } => {
            let issuer = TokenIssuer::new(TokenConfig::from(&config.auth));
            match issuer.verify(&token) {
                Ok(id) => println!("valid token for account {id}"),
                Err(e) => bail!("token rejected: {e}"),
            }
        }
    }

    Ok(())
}
