use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sale;

/// One row per attributed sale. The primary key is what makes
/// attribution happen at most once per sale.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attributions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub sale_id: i32,
  pub records: i32,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "sale::Entity",
    from = "Column::SaleId",
    to = "sale::Column::Id"
  )]
  Sale,
}

impl Related<sale::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Sale.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
