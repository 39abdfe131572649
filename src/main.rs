mod config;
mod engine;
mod entity;
mod error;
mod plugins;
mod prelude;
mod schema;
mod state;
mod sv;

use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{
  config::Config,
  plugins::{App, cron, server},
  prelude::*,
  state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "ambassador=debug,tower_http=debug,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = Config::from_env()?;

  info!("Starting Ambassador Server v{}", env!("CARGO_PKG_VERSION"));

  let app_state = Arc::new(AppState::new(config).await?);

  App::new().register(server::Plugin).register(cron::Retry).run(app_state);

  tokio::signal::ctrl_c().await?;
  info!("Shutting down");

  Ok(())
}
