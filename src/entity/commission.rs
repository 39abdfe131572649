use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{sale, user};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "paid")]
  Paid,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

impl CommissionStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      CommissionStatus::Pending => "pending",
      CommissionStatus::Paid => "paid",
      CommissionStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for CommissionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commissions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(indexed)]
  pub source_sale_id: i32,
  #[sea_orm(indexed)]
  pub beneficiary_id: i64,
  /// 0 is the seller's own sale, 1..=5 the upline depth.
  pub level: i32,
  pub plan_code: String,
  pub rate_bp: i32,
  pub amount_cents: i64,
  pub status: CommissionStatus,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "sale::Entity",
    from = "Column::SourceSaleId",
    to = "sale::Column::Id"
  )]
  Sale,
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::BeneficiaryId",
    to = "user::Column::Id"
  )]
  Beneficiary,
}

impl Related<sale::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sale.def()
  }
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Beneficiary.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
