use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::engine::{LEVELS, Plan, Rate, RateTable};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "commission_plans")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub code: String,
  pub direct_sale_bp: i32,
  pub level1_bp: i32,
  pub level2_bp: i32,
  pub level3_bp: i32,
  pub level4_bp: i32,
  pub level5_bp: i32,
  pub min_points: i64,
  pub min_sales: i32,
  pub is_active: bool,
  pub created_at: DateTime,
  pub updated_at: DateTime,
}

impl Model {
  /// Validated rate table; rejects rows edited into an invalid state.
  pub fn rates(&self) -> crate::error::Result<RateTable> {
    let levels: [i32; LEVELS] = [
      self.level1_bp,
      self.level2_bp,
      self.level3_bp,
      self.level4_bp,
      self.level5_bp,
    ];

    let mut table = RateTable {
      direct_sale: Rate::from_db(self.direct_sale_bp)?,
      levels: [Rate::ZERO; LEVELS],
    };
    for (slot, bp) in table.levels.iter_mut().zip(levels) {
      *slot = Rate::from_db(bp)?;
    }
    Ok(table)
  }

  pub fn to_plan(&self) -> crate::error::Result<Plan> {
    Ok(Plan { code: self.code.clone(), rates: self.rates()? })
  }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
