//! Offline inspection commands - totals and the account list.

use dossier::Dossier;
use dossier::account::{AccountStatus, AccountView};

use crate::backend::{backend_label, create_backend};
use crate::cli::BackendConfig;
use crate::output::{OutputFormat, print_table};

async fn open(config: &BackendConfig) -> Result<Dossier, Box<dyn std::error::Error>> {
    let backend = create_backend(config).await?;
    Ok(Dossier::open(backend)?)
}

/// Run the info command
pub async fn run_stats(
    config: &BackendConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let dossier = open(config).await?;
    let stats = dossier.user_stats().await?;
    let backend_str = backend_label(config);

    match format {
        OutputFormat::Human => {
            println!("Backend:     {backend_str}");
            println!(
                "Accounts:    {} ({} active, {} inactive, {} admin)",
                stats.accounts.total,
                stats.accounts.active,
                stats.accounts.inactive,
                stats.accounts.admins
            );
            println!("Profiles:    {}", stats.total_profiles);
            println!("Settings:    {}", stats.total_settings);
            println!("Files:       {}", stats.total_files);
        }
        OutputFormat::Json => {
            let mut value = serde_json::to_value(stats)?;
            value["backend"] = serde_json::Value::String(backend_str);
            println!("{}", serde_json::to_string(&value)?);
        }
    }

    Ok(())
}

/// Run the accounts command
pub async fn run_accounts(
    config: &BackendConfig,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let dossier = open(config).await?;
    let accounts = dossier.list_accounts().await?;

    match format {
        OutputFormat::Human => {
            let rows: Vec<Vec<String>> = accounts.iter().map(account_row).collect();
            print_table(
                &["ID", "EMAIL", "NAME", "ROLE", "STATUS", "CREATED"],
                &rows,
                "No accounts.",
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(&accounts)?);
        }
    }

    Ok(())
}

fn account_row(account: &AccountView) -> Vec<String> {
    let status = match account.status {
        AccountStatus::Active => "active",
        AccountStatus::Inactive => "inactive",
    };
    vec![
        account.id.clone(),
        account.email.clone(),
        account.name.clone(),
        account.role.as_str().to_string(),
        status.to_string(),
        account.created_at.format("%Y-%m-%d %H:%M").to_string(),
    ]
}
