use std::fmt;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
  #[sea_orm(string_value = "pending")]
  #[default]
  Pending,
  #[sea_orm(string_value = "completed")]
  Completed,
  #[sea_orm(string_value = "cancelled")]
  Cancelled,
}

impl SaleStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      SaleStatus::Pending => "pending",
      SaleStatus::Completed => "completed",
      SaleStatus::Cancelled => "cancelled",
    }
  }

  pub fn can_become(self, next: SaleStatus) -> bool {
    use SaleStatus::*;
    matches!(
      (self, next),
      (Pending, Completed) | (Pending, Cancelled) | (Completed, Cancelled)
    )
  }
}

impl fmt::Display for SaleStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  #[sea_orm(indexed)]
  pub seller_id: i64,
  pub amount_cents: i64,
  pub product_ref: String,
  pub status: SaleStatus,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "user::Entity",
    from = "Column::SellerId",
    to = "user::Column::Id"
  )]
  Seller,
}

impl Related<user::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Seller.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
