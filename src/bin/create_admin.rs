//! Seeds the first admin account. Safe to run repeatedly.
use anyhow::{bail, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use rentora::{
    config::Config,
    database::init_postgres,
    user::{hash_password, NewUser, Role, User},
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Admin email, falls back to ADMIN_EMAIL
    #[arg(long)]
    email: Option<String>,

    /// Admin password, falls back to ADMIN_PASSWORD
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    let email = args
        .email
        .or_else(|| std::env::var("ADMIN_EMAIL").ok())
        .unwrap_or_else(|| "admin123@gmail.com".to_string())
        .trim()
        .to_lowercase();
    let password = args
        .password
        .or_else(|| std::env::var("ADMIN_PASSWORD").ok())
        .unwrap_or_else(|| "Admin123".to_string());

    let config = Config::load();
    let pool = init_postgres(&config).await;

    if User::find_by_email(&pool, &email).await?.is_some() {
        info!("Admin {email} already exists, nothing to do");
        return Ok(());
    }

    let timestamp = Utc::now().timestamp_millis().to_string();
    let suffix = &timestamp[timestamp.len().saturating_sub(6)..];
    let username = format!("admin{suffix}");

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => bail!("Failed to hash admin password: {e}"),
    };

    let admin = User::create(
        &pool,
        NewUser {
            first_name: "Super".to_string(),
            last_name: "Admin".to_string(),
            username,
            email,
            password_hash,
            gender: "other".to_string(),
            role: Role::Admin,
        },
    )
    .await?;

    info!("Admin created: {} ({})", admin.email, admin.username);

    Ok(())
}
