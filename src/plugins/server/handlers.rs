use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
  engine::LEVELS,
  entity::{UserStatus, commission, commission_plan, sale, user},
  prelude::*,
  state::AppState,
  sv::{
    self,
    attribution::{Recorded, SponsorChain},
    ledger::Earnings,
    plan::{NewPlan, Rates},
    sale::{Cancellation, Completion, NewSale},
    user::NewUser,
  },
};

type App = State<Arc<AppState>>;

#[derive(Serialize)]
pub struct Status {
  success: bool,
}

pub async fn health() -> Json<Status> {
  Json(Status { success: true })
}

pub async fn create_user(
  State(app): App,
  Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<user::Model>)> {
  let user = sv::User::new(&app.db).create(req).await?;
  Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(app): App) -> Result<Json<Vec<user::Model>>> {
  Ok(Json(sv::User::new(&app.db).all().await?))
}

pub async fn get_user(
  State(app): App,
  Path(id): Path<i64>,
) -> Result<Json<user::Model>> {
  Ok(Json(sv::User::new(&app.db).get(id).await?))
}

#[derive(Deserialize)]
pub struct SponsorReq {
  sponsor_id: Option<i64>,
}

pub async fn set_sponsor(
  State(app): App,
  Path(id): Path<i64>,
  Json(req): Json<SponsorReq>,
) -> Result<Json<user::Model>> {
  Ok(Json(sv::User::new(&app.db).set_sponsor(id, req.sponsor_id).await?))
}

#[derive(Deserialize)]
pub struct PlanReq {
  plan_code: Option<String>,
}

pub async fn set_plan(
  State(app): App,
  Path(id): Path<i64>,
  Json(req): Json<PlanReq>,
) -> Result<Json<user::Model>> {
  Ok(Json(sv::User::new(&app.db).set_plan(id, req.plan_code).await?))
}

#[derive(Deserialize)]
pub struct StatusReq {
  status: UserStatus,
}

pub async fn set_status(
  State(app): App,
  Path(id): Path<i64>,
  Json(req): Json<StatusReq>,
) -> Result<Json<user::Model>> {
  Ok(Json(sv::User::new(&app.db).set_status(id, req.status).await?))
}

#[derive(Deserialize)]
pub struct PointsReq {
  points: i64,
}

#[derive(Serialize)]
pub struct PointsView {
  user_id: i64,
  points: i64,
}

pub async fn add_points(
  State(app): App,
  Path(id): Path<i64>,
  Json(req): Json<PointsReq>,
) -> Result<Json<PointsView>> {
  let points = sv::User::new(&app.db).add_points(id, req.points).await?;
  Ok(Json(PointsView { user_id: id, points }))
}

pub async fn upline(
  State(app): App,
  Path(id): Path<i64>,
) -> Result<Json<SponsorChain>> {
  Ok(Json(sv::User::new(&app.db).sponsor_chain(id, LEVELS).await?))
}

pub async fn downline(
  State(app): App,
  Path(id): Path<i64>,
) -> Result<Json<Vec<user::Model>>> {
  let users = sv::User::new(&app.db);
  users.get(id).await?;
  Ok(Json(users.downline(id).await?))
}

pub async fn user_sales(
  State(app): App,
  Path(id): Path<i64>,
) -> Result<Json<Vec<sale::Model>>> {
  sv::User::new(&app.db).get(id).await?;
  Ok(Json(sv::Sale::new(&app.db).by_seller(id).await?))
}

#[derive(Deserialize)]
pub struct ListQuery {
  limit: Option<u64>,
}

pub async fn user_commissions(
  State(app): App,
  Path(id): Path<i64>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Vec<commission::Model>>> {
  sv::User::new(&app.db).get(id).await?;
  let limit = query.limit.unwrap_or(50).min(500);
  Ok(Json(sv::Ledger::new(&app.db).by_beneficiary(id, limit).await?))
}

#[derive(Serialize)]
pub struct EarningsView {
  #[serde(flatten)]
  earnings: Earnings,
  qualified: bool,
}

pub async fn earnings(
  State(app): App,
  Path(id): Path<i64>,
) -> Result<Json<EarningsView>> {
  let qualified = sv::Plan::new(&app.db).qualifies(id).await?;
  let earnings = sv::Ledger::new(&app.db).earnings(id).await?;
  Ok(Json(EarningsView { earnings, qualified }))
}

pub async fn create_plan(
  State(app): App,
  Json(req): Json<NewPlan>,
) -> Result<(StatusCode, Json<commission_plan::Model>)> {
  let plan = sv::Plan::new(&app.db).create(req).await?;
  Ok((StatusCode::CREATED, Json(plan)))
}

pub async fn list_plans(
  State(app): App,
) -> Result<Json<Vec<commission_plan::Model>>> {
  Ok(Json(sv::Plan::new(&app.db).all().await?))
}

pub async fn get_plan(
  State(app): App,
  Path(code): Path<String>,
) -> Result<Json<commission_plan::Model>> {
  Ok(Json(sv::Plan::new(&app.db).get(&code).await?))
}

pub async fn update_rates(
  State(app): App,
  Path(code): Path<String>,
  Json(rates): Json<Rates>,
) -> Result<Json<commission_plan::Model>> {
  Ok(Json(sv::Plan::new(&app.db).update_rates(&code, rates).await?))
}

#[derive(Deserialize)]
pub struct ActiveReq {
  is_active: bool,
}

pub async fn set_plan_active(
  State(app): App,
  Path(code): Path<String>,
  Json(req): Json<ActiveReq>,
) -> Result<Json<commission_plan::Model>> {
  Ok(Json(sv::Plan::new(&app.db).set_active(&code, req.is_active).await?))
}

pub async fn create_sale(
  State(app): App,
  Json(req): Json<NewSale>,
) -> Result<(StatusCode, Json<sale::Model>)> {
  let sale = sv::Sale::new(&app.db).record(req).await?;
  Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn complete_sale(
  State(app): App,
  Path(id): Path<i32>,
) -> Result<Json<Completion>> {
  Ok(Json(sv::Sale::new(&app.db).complete(id).await?))
}

pub async fn cancel_sale(
  State(app): App,
  Path(id): Path<i32>,
) -> Result<Json<Cancellation>> {
  Ok(Json(sv::Sale::new(&app.db).cancel(id).await?))
}

/// Manual retry for a completed sale left without commissions.
pub async fn attribute_sale(
  State(app): App,
  Path(id): Path<i32>,
) -> Result<Json<Recorded>> {
  Ok(Json(sv::Sale::new(&app.db).attribute(id).await?))
}

pub async fn sale_commissions(
  State(app): App,
  Path(id): Path<i32>,
) -> Result<Json<Vec<commission::Model>>> {
  sv::Sale::new(&app.db).get(id).await?;
  Ok(Json(sv::Ledger::new(&app.db).by_sale(id).await?))
}

pub async fn pay_commission(
  State(app): App,
  Path(id): Path<i32>,
) -> Result<Json<commission::Model>> {
  Ok(Json(sv::Ledger::new(&app.db).authorize_payment(id).await?))
}
