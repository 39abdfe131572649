use serde::Deserialize;

use crate::{
  engine::{self, LEVELS, Rate, RateTable},
  entity::{CommissionStatus, SaleStatus, commission, commission_plan, sale},
  prelude::*,
  sv,
};

pub struct Plan<'a> {
  db: &'a DatabaseConnection,
}

/// Rates as submitted by an admin. Absent fields are zero.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Rates {
  pub direct_sale_bp: u32,
  pub level1_bp: u32,
  pub level2_bp: u32,
  pub level3_bp: u32,
  pub level4_bp: u32,
  pub level5_bp: u32,
}

impl Rates {
  pub fn table(&self) -> Result<RateTable> {
    let levels = [
      self.level1_bp,
      self.level2_bp,
      self.level3_bp,
      self.level4_bp,
      self.level5_bp,
    ];

    let mut table = RateTable {
      direct_sale: Rate::from_bp(self.direct_sale_bp)?,
      levels: [Rate::ZERO; LEVELS],
    };
    for (slot, bp) in table.levels.iter_mut().zip(levels) {
      *slot = Rate::from_bp(bp)?;
    }
    Ok(table)
  }
}

fn default_active() -> bool {
  true
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
  pub code: String,
  #[serde(flatten)]
  pub rates: Rates,
  #[serde(default)]
  pub min_points: i64,
  #[serde(default)]
  pub min_sales: i32,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

impl<'a> Plan<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, new: NewPlan) -> Result<commission_plan::Model> {
    let code = new.code.trim().to_string();
    if code.is_empty() {
      return Err(Error::InvalidPlan("plan code is empty".into()));
    }
    if new.min_points < 0 || new.min_sales < 0 {
      return Err(Error::InvalidPlan("thresholds must be non-negative".into()));
    }
    if self.by_code(&code).await?.is_some() {
      return Err(Error::InvalidArgs(format!("plan `{code}` already exists")));
    }

    let table = new.rates.table()?;
    if table.total_bp() > Rate::MAX_BP {
      warn!("plan `{}` pays out {}bp in total", code, table.total_bp());
    }

    let now = Utc::now().naive_utc();
    let mut plan = commission_plan::ActiveModel {
      code: Set(code),
      min_points: Set(new.min_points),
      min_sales: Set(new.min_sales),
      is_active: Set(new.is_active),
      created_at: Set(now),
      updated_at: Set(now),
      ..Default::default()
    };
    set_rates(&mut plan, &table);

    Ok(plan.insert(self.db).await?)
  }

  pub async fn by_code(
    &self,
    code: &str,
  ) -> Result<Option<commission_plan::Model>> {
    Ok(commission_plan::Entity::find_by_id(code).one(self.db).await?)
  }

  pub async fn get(&self, code: &str) -> Result<commission_plan::Model> {
    self
      .by_code(code)
      .await?
      .ok_or_else(|| Error::UnknownPlan(code.to_string()))
  }

  pub async fn all(&self) -> Result<Vec<commission_plan::Model>> {
    Ok(
      commission_plan::Entity::find()
        .order_by_asc(commission_plan::Column::Code)
        .all(self.db)
        .await?,
    )
  }

  pub async fn set_active(
    &self,
    code: &str,
    is_active: bool,
  ) -> Result<commission_plan::Model> {
    let plan = self.get(code).await?;

    Ok(
      commission_plan::ActiveModel {
        is_active: Set(is_active),
        updated_at: Set(Utc::now().naive_utc()),
        ..plan.into()
      }
      .update(self.db)
      .await?,
    )
  }

  /// Replaces the rates of `code`. Paid commissions pin the plan, so
  /// this fails once any of them references it.
  pub async fn update_rates(
    &self,
    code: &str,
    rates: Rates,
  ) -> Result<commission_plan::Model> {
    let plan = self.get(code).await?;
    let table = rates.table()?;

    let paid = commission::Entity::find()
      .filter(commission::Column::PlanCode.eq(code))
      .filter(commission::Column::Status.eq(CommissionStatus::Paid))
      .count(self.db)
      .await?;
    if paid > 0 {
      return Err(Error::PlanLocked(code.to_string()));
    }

    let mut active: commission_plan::ActiveModel = plan.into();
    set_rates(&mut active, &table);
    active.updated_at = Set(Utc::now().naive_utc());

    info!("plan `{}` rates updated", code);
    Ok(active.update(self.db).await?)
  }

  /// The plan commissions on `user_id`'s sales are computed with: the
  /// assigned plan, if it exists and is active.
  pub async fn active_plan(
    &self,
    user_id: i64,
  ) -> Result<Option<engine::Plan>> {
    let user = sv::User::new(self.db).get(user_id).await?;

    let Some(code) = user.plan_code else {
      return Ok(None);
    };

    match self.by_code(&code).await? {
      Some(plan) if plan.is_active => Ok(Some(plan.to_plan()?)),
      Some(_) => {
        debug!("plan `{}` of user {} is inactive", code, user_id);
        Ok(None)
      }
      None => Ok(None),
    }
  }

  /// Whether `user_id` meets the point and sales thresholds of their plan.
  pub async fn qualifies(&self, user_id: i64) -> Result<bool> {
    let user = sv::User::new(self.db).get(user_id).await?;

    let Some(plan) = user.plan_code.as_deref() else {
      return Ok(false);
    };
    let Some(plan) = self.by_code(plan).await? else {
      return Ok(false);
    };

    let sales = sale::Entity::find()
      .filter(sale::Column::SellerId.eq(user_id))
      .filter(sale::Column::Status.eq(SaleStatus::Completed))
      .count(self.db)
      .await?;

    Ok(
      user.points >= plan.min_points
        && sales as i64 >= i64::from(plan.min_sales),
    )
  }
}

fn set_rates(plan: &mut commission_plan::ActiveModel, table: &RateTable) {
  let bp = |rate: Rate| Set(rate.bp() as i32);

  plan.direct_sale_bp = bp(table.direct_sale);
  plan.level1_bp = bp(table.levels[0]);
  plan.level2_bp = bp(table.levels[1]);
  plan.level3_bp = bp(table.levels[2]);
  plan.level4_bp = bp(table.levels[3]);
  plan.level5_bp = bp(table.levels[4]);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  fn new_plan(code: &str) -> NewPlan {
    NewPlan {
      code: code.into(),
      rates: Rates {
        direct_sale_bp: 1000,
        level1_bp: 500,
        level2_bp: 300,
        ..Default::default()
      },
      min_points: 100,
      min_sales: 1,
      is_active: true,
    }
  }

  #[tokio::test]
  async fn test_create_and_load_rates() {
    let db = test_db::setup().await;
    let plans = Plan::new(&db);

    let plan = plans.create(new_plan("basic")).await.unwrap();
    let table = plan.rates().unwrap();

    assert_eq!(table.direct_sale.bp(), 1000);
    assert_eq!(table.level(1).bp(), 500);
    assert_eq!(table.level(2).bp(), 300);
    assert_eq!(table.level(3), Rate::ZERO);

    let result = plans.create(new_plan("basic")).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));
  }

  #[tokio::test]
  async fn test_invalid_rates_rejected() {
    let db = test_db::setup().await;
    let plans = Plan::new(&db);

    let mut plan = new_plan("greedy");
    plan.rates.level3_bp = 10_001;
    assert!(matches!(plans.create(plan).await, Err(Error::InvalidPlan(_))));

    let mut plan = new_plan(" ");
    plan.rates = Rates::default();
    assert!(matches!(plans.create(plan).await, Err(Error::InvalidPlan(_))));
  }

  #[test]
  fn test_partial_payload_defaults_to_zero() {
    let plan: NewPlan =
      json::from_str(r#"{"code": "lite", "direct_sale_bp": 800}"#).unwrap();

    let table = plan.rates.table().unwrap();
    assert_eq!(table.direct_sale.bp(), 800);
    assert_eq!(table.levels, [Rate::ZERO; LEVELS]);
    assert!(plan.is_active);
    assert_eq!(plan.min_sales, 0);
  }

  #[tokio::test]
  async fn test_active_plan_resolution() {
    let db = test_db::setup().await;
    let plans = Plan::new(&db);
    plans.create(new_plan("basic")).await.unwrap();

    test_db::user(&db, 1, None).await;
    assert_eq!(plans.active_plan(1).await.unwrap(), None);

    sv::User::new(&db).set_plan(1, Some("basic".into())).await.unwrap();
    let plan = plans.active_plan(1).await.unwrap().unwrap();
    assert_eq!(plan.code, "basic");
    assert_eq!(plan.rates.level(1).bp(), 500);

    plans.set_active("basic", false).await.unwrap();
    assert_eq!(plans.active_plan(1).await.unwrap(), None);

    assert!(matches!(plans.active_plan(9).await, Err(Error::UserNotFound)));
  }

  #[tokio::test]
  async fn test_rates_locked_after_payment() {
    let db = test_db::setup().await;
    let plans = Plan::new(&db);
    plans.create(new_plan("basic")).await.unwrap();

    let rates = Rates { direct_sale_bp: 1200, ..Default::default() };
    let plan = plans.update_rates("basic", rates).await.unwrap();
    assert_eq!(plan.direct_sale_bp, 1200);

    test_db::member(&db, 1, None, "basic").await;
    let sale = test_db::completed_sale(&db, 1, 10_000).await;
    let records = test_db::attribute(&db, &sale).await;
    sv::Ledger::new(&db).authorize_payment(records[0].id).await.unwrap();

    let result = plans.update_rates("basic", rates).await;
    assert!(matches!(result, Err(Error::PlanLocked(_))));

    // activation is not a rate change
    assert!(plans.set_active("basic", false).await.is_ok());
  }

  #[tokio::test]
  async fn test_qualification_thresholds() {
    let db = test_db::setup().await;
    let plans = Plan::new(&db);
    plans.create(new_plan("basic")).await.unwrap();
    test_db::member(&db, 1, None, "basic").await;

    assert!(!plans.qualifies(1).await.unwrap());

    sv::User::new(&db).add_points(1, 100).await.unwrap();
    assert!(!plans.qualifies(1).await.unwrap());

    test_db::completed_sale(&db, 1, 2_500).await;
    assert!(plans.qualifies(1).await.unwrap());
  }

  #[tokio::test]
  async fn test_negative_sales_threshold_is_met() {
    use sea_orm::sea_query::Expr;

    let db = test_db::setup().await;
    let plans = Plan::new(&db);
    plans.create(new_plan("basic")).await.unwrap();
    test_db::member(&db, 1, None, "basic").await;
    sv::User::new(&db).add_points(1, 100).await.unwrap();

    commission_plan::Entity::update_many()
      .col_expr(commission_plan::Column::MinSales, Expr::value(-1))
      .filter(commission_plan::Column::Code.eq("basic"))
      .exec(&db)
      .await
      .unwrap();

    assert!(plans.qualifies(1).await.unwrap());
  }
}
