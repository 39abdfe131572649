mod handlers;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Router,
  routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, state::AppState};

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(app.config.rate_limit_per_second)
        .burst_size(app.config.rate_limit_burst)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], app.config.port));

    let router = routes(app)
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    info!("HTTP Server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, router).await.context("Server error")?;

    Ok(())
  }
}

pub fn routes(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/health", get(handlers::health))
    .route(
      "/api/users",
      post(handlers::create_user).get(handlers::list_users),
    )
    .route("/api/users/{id}", get(handlers::get_user))
    .route("/api/users/{id}/sponsor", put(handlers::set_sponsor))
    .route("/api/users/{id}/plan", put(handlers::set_plan))
    .route("/api/users/{id}/status", put(handlers::set_status))
    .route("/api/users/{id}/points", post(handlers::add_points))
    .route("/api/users/{id}/upline", get(handlers::upline))
    .route("/api/users/{id}/downline", get(handlers::downline))
    .route("/api/users/{id}/sales", get(handlers::user_sales))
    .route("/api/users/{id}/commissions", get(handlers::user_commissions))
    .route("/api/users/{id}/earnings", get(handlers::earnings))
    .route("/api/plans", post(handlers::create_plan).get(handlers::list_plans))
    .route("/api/plans/{code}", get(handlers::get_plan))
    .route("/api/plans/{code}/rates", put(handlers::update_rates))
    .route("/api/plans/{code}/active", put(handlers::set_plan_active))
    .route("/api/sales", post(handlers::create_sale))
    .route("/api/sales/{id}/complete", post(handlers::complete_sale))
    .route("/api/sales/{id}/cancel", post(handlers::cancel_sale))
    .route("/api/sales/{id}/attribute", post(handlers::attribute_sale))
    .route("/api/sales/{id}/commissions", get(handlers::sale_commissions))
    .route("/api/commissions/{id}/pay", post(handlers::pay_commission))
    .with_state(app)
}
