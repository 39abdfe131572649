use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::{commission, sale};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
  #[sea_orm(string_value = "active")]
  #[default]
  Active,
  #[sea_orm(string_value = "suspended")]
  Suspended,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: i64,
  /// Immediate upline. `None` for roots of the sponsor forest.
  #[sea_orm(indexed)]
  pub sponsor_id: Option<i64>,
  pub plan_code: Option<String>,
  pub status: UserStatus,
  pub points: i64,
  pub reg_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "sale::Entity")]
  Sales,
  #[sea_orm(has_many = "commission::Entity")]
  Commissions,
}

impl Related<sale::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sales.def()
  }
}

impl Related<commission::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Commissions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
