use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] DbErr),

  /// Non-positive amount or a sale that is not completed yet.
  #[error("invalid sale: {0}")]
  InvalidSale(String),
  #[error("no active commission plan for user {0}")]
  PlanNotFound(i64),
  #[error("invalid commission plan: {0}")]
  InvalidPlan(String),
  #[error("unknown commission plan `{0}`")]
  UnknownPlan(String),
  #[error("plan `{0}` is referenced by paid commissions")]
  PlanLocked(String),

  #[error("user not found")]
  UserNotFound,
  #[error("sale not found")]
  SaleNotFound,
  #[error("commission not found")]
  CommissionNotFound,

  #[error("cannot move from `{from}` to `{to}`")]
  InvalidTransition { from: String, to: String },
  #[error("invalid arguments: {0}")]
  InvalidArgs(String),
}

impl Error {
  pub fn transition(from: impl ToString, to: impl ToString) -> Self {
    Self::InvalidTransition { from: from.to_string(), to: to.to_string() }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::InvalidSale(_) | Error::InvalidPlan(_) | Error::InvalidArgs(_) => {
        StatusCode::BAD_REQUEST
      }
      Error::PlanNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
      Error::PlanLocked(_) | Error::InvalidTransition { .. } => {
        StatusCode::CONFLICT
      }
      Error::UserNotFound
      | Error::SaleNotFound
      | Error::CommissionNotFound
      | Error::UnknownPlan(_) => StatusCode::NOT_FOUND,
    }
  }
}

#[derive(Serialize)]
struct ErrorBody {
  success: bool,
  msg: String,
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!("request failed: {self}");
    }
    (status, Json(ErrorBody { success: false, msg: self.to_string() }))
      .into_response()
  }
}
