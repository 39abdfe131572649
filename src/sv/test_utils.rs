//! Shared test utilities for database setup

#[cfg(test)]
pub mod test_db {
  use sea_orm::{Database, DatabaseConnection, sea_query::Expr};

  use crate::{
    entity::*,
    prelude::*,
    schema,
    sv::{
      self,
      attribution::{DbAttributor, Recorded},
    },
  };

  /// Creates an in-memory SQLite database with all required tables
  pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    schema::create_tables(&db).await.unwrap();
    db
  }

  pub async fn plan(
    db: &DatabaseConnection,
    code: &str,
    direct_sale_bp: i32,
    levels: [i32; 5],
  ) -> commission_plan::Model {
    let now = Utc::now().naive_utc();
    commission_plan::ActiveModel {
      code: Set(code.into()),
      direct_sale_bp: Set(direct_sale_bp),
      level1_bp: Set(levels[0]),
      level2_bp: Set(levels[1]),
      level3_bp: Set(levels[2]),
      level4_bp: Set(levels[3]),
      level5_bp: Set(levels[4]),
      min_points: Set(0),
      min_sales: Set(0),
      is_active: Set(true),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
  }

  async fn insert_user(
    db: &DatabaseConnection,
    id: i64,
    sponsor_id: Option<i64>,
    plan_code: Option<&str>,
  ) -> user::Model {
    user::ActiveModel {
      id: Set(id),
      sponsor_id: Set(sponsor_id),
      plan_code: Set(plan_code.map(Into::into)),
      status: Set(UserStatus::Active),
      points: Set(0),
      reg_date: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
    .unwrap()
  }

  /// User without a plan.
  pub async fn user(
    db: &DatabaseConnection,
    id: i64,
    sponsor_id: Option<i64>,
  ) -> user::Model {
    insert_user(db, id, sponsor_id, None).await
  }

  /// User on `plan_code`. The plan must exist.
  pub async fn member(
    db: &DatabaseConnection,
    id: i64,
    sponsor_id: Option<i64>,
    plan_code: &str,
  ) -> user::Model {
    if commission_plan::Entity::find_by_id(plan_code)
      .one(db)
      .await
      .unwrap()
      .is_none()
    {
      plan(db, plan_code, 1000, [500, 300, 0, 0, 0]).await;
    }
    insert_user(db, id, sponsor_id, Some(plan_code)).await
  }

  /// Rewrites a sponsor link without any checks, like a manual DB edit.
  pub async fn force_sponsor(
    db: &DatabaseConnection,
    id: i64,
    sponsor_id: Option<i64>,
  ) {
    user::Entity::update_many()
      .col_expr(user::Column::SponsorId, Expr::value(sponsor_id))
      .filter(user::Column::Id.eq(id))
      .exec(db)
      .await
      .unwrap();
  }

  pub async fn completed_sale(
    db: &DatabaseConnection,
    seller_id: i64,
    amount_cents: i64,
  ) -> sale::Model {
    let now = Utc::now().naive_utc();
    sale::ActiveModel {
      id: NotSet,
      seller_id: Set(seller_id),
      amount_cents: Set(amount_cents),
      product_ref: Set("starter-kit".into()),
      status: Set(SaleStatus::Completed),
      created_at: Set(now),
      updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
  }

  pub async fn attribute(
    db: &DatabaseConnection,
    sale: &sale::Model,
  ) -> Vec<commission::Model> {
    match DbAttributor::for_db(db).attribute(sale).await.unwrap() {
      Recorded::Created(records) => records,
      Recorded::Duplicate => {
        sv::Ledger::new(db).by_sale(sale.id).await.unwrap()
      }
    }
  }
}
