//! Administrative sub-commands: users, tokens, buckets and grants.

use crate::{
    config::Command,
    models::permission::CapabilitySet,
    services::{registry_service::RegistryService, user_service::UserService},
};
use anyhow::{Context, Result, bail};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Run one admin command. `serve` and `migrate` are handled by `main`.
pub async fn run(command: Command, db: Arc<SqlitePool>) -> Result<()> {
    let users = UserService::new(db.clone());
    let registry = RegistryService::new(db);

    match command {
        Command::CreateUser { username } => {
            let user = users
                .create_user(&username)
                .await
                .with_context(|| format!("creating user `{}`", username))?;
            let token = users.issue_token(user.id).await?;
            tracing::info!("Created user {} (id {})", user.username, user.id);
            println!("{}", token);
        }
        Command::IssueToken { username } => {
            let Some(user) = users.find_by_username(&username).await? else {
                bail!("no user named `{}`", username);
            };
            println!("{}", users.issue_token(user.id).await?);
        }
        Command::DeactivateUser { username } => {
            let Some(user) = users.find_by_username(&username).await? else {
                bail!("no user named `{}`", username);
            };
            users.set_active(user.id, false).await?;
            tracing::info!("Deactivated user {}", user.username);
        }
        Command::CreateBucket {
            name,
            region,
            prefix,
        } => {
            let bucket = registry
                .create_bucket(&name, &region, prefix.as_deref())
                .await
                .with_context(|| format!("registering bucket `{}`", name))?;
            tracing::info!("Registered bucket {} in {}", bucket.name, bucket.region);
            println!("{}", bucket.id);
        }
        Command::Grant {
            username,
            bucket_id,
            view,
            upload,
            delete,
        } => {
            let Some(user) = users.find_by_username(&username).await? else {
                bail!("no user named `{}`", username);
            };
            let grant = registry
                .grant(
                    user.id,
                    bucket_id,
                    CapabilitySet {
                        view,
                        upload,
                        delete,
                    },
                )
                .await
                .with_context(|| format!("granting on bucket {}", bucket_id))?;
            println!("{}", grant.id);
        }
        Command::ListGrants { username } => {
            for g in registry.list_grants(username.as_deref()).await? {
                println!(
                    "{}\t{}\t{}:{}\tview={}\tupload={}\tdelete={}",
                    g.id, g.username, g.bucket_id, g.bucket_name, g.can_view, g.can_upload, g.can_delete
                );
            }
        }
        Command::Serve | Command::Migrate => bail!("serve and migrate are not admin commands"),
    }

    Ok(())
}
