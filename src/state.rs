use anyhow::Context;

use crate::{config::Config, prelude::*, schema};

pub struct AppState {
  pub db: DatabaseConnection,
  pub config: Config,
}

impl AppState {
  pub async fn new(config: Config) -> anyhow::Result<Self> {
    let db = Database::connect(&config.database_url)
      .await
      .with_context(|| format!("failed to open `{}`", config.database_url))?;

    schema::create_tables(&db).await.context("failed to create schema")?;

    Ok(Self { db, config })
  }
}
