use sea_orm::{SqlErr, sea_query::Expr};
use serde::Serialize;

use crate::{
  engine::CommissionDraft,
  entity::{CommissionStatus, SaleStatus, attribution, commission, sale},
  prelude::*,
  sv::attribution::Recorded,
};

pub struct Ledger<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Earnings {
  pub pending_cents: i64,
  pub paid_cents: i64,
  pub cancelled_cents: i64,
  pub records: i64,
}

impl<'a> Ledger<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Stores the drafts of one sale. A sale that already has an
  /// attribution is left untouched and reported as [`Recorded::Duplicate`].
  ///
  /// The sale status is read again inside the transaction, so drafts built
  /// from a stale model are refused once the sale has been cancelled.
  pub async fn record_attribution(
    &self,
    sale_id: i32,
    drafts: &[CommissionDraft],
  ) -> Result<Recorded> {
    if let Some(draft) = drafts.iter().find(|d| d.source_sale_id != sale_id) {
      return Err(Error::InvalidArgs(format!(
        "draft for sale #{} recorded under sale #{}",
        draft.source_sale_id, sale_id
      )));
    }

    let txn = self.db.begin().await?;

    if attribution::Entity::find_by_id(sale_id).one(&txn).await?.is_some() {
      return Ok(Recorded::Duplicate);
    }

    let sale = sale::Entity::find_by_id(sale_id)
      .one(&txn)
      .await?
      .ok_or(Error::SaleNotFound)?;
    if sale.status != SaleStatus::Completed {
      return Err(Error::InvalidSale(format!(
        "sale #{} is {}, expected completed",
        sale.id, sale.status
      )));
    }

    let now = Utc::now().naive_utc();
    let marker = attribution::ActiveModel {
      sale_id: Set(sale_id),
      records: Set(drafts.len() as i32),
      created_at: Set(now),
    }
    .insert(&txn)
    .await;

    match marker {
      Ok(_) => {}
      Err(err)
        if matches!(
          err.sql_err(),
          Some(SqlErr::UniqueConstraintViolation(_))
        ) =>
      {
        return Ok(Recorded::Duplicate);
      }
      Err(err) => return Err(err.into()),
    }

    let mut records = Vec::with_capacity(drafts.len());
    for draft in drafts {
      let record = commission::ActiveModel {
        id: NotSet,
        source_sale_id: Set(draft.source_sale_id),
        beneficiary_id: Set(draft.beneficiary_id),
        level: Set(draft.level as i32),
        plan_code: Set(draft.plan_code.clone()),
        rate_bp: Set(draft.rate.bp() as i32),
        amount_cents: Set(draft.amount_cents),
        status: Set(CommissionStatus::Pending),
        created_at: Set(now),
      }
      .insert(&txn)
      .await?;
      records.push(record);
    }

    txn.commit().await?;
    Ok(Recorded::Created(records))
  }

  pub async fn get(&self, id: i32) -> Result<commission::Model> {
    commission::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::CommissionNotFound)
  }

  /// Marks a pending commission as paid. This is the only way a record
  /// becomes paid.
  pub async fn authorize_payment(&self, id: i32) -> Result<commission::Model> {
    let record = self.get(id).await?;

    if record.status != CommissionStatus::Pending {
      return Err(Error::transition(record.status, CommissionStatus::Paid));
    }

    let record = commission::ActiveModel {
      status: Set(CommissionStatus::Paid),
      ..record.into()
    }
    .update(self.db)
    .await?;

    info!(
      "commission #{} paid: {} cents to user {}",
      record.id, record.amount_cents, record.beneficiary_id
    );
    Ok(record)
  }

  pub async fn by_sale(&self, sale_id: i32) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::SourceSaleId.eq(sale_id))
        .order_by_asc(commission::Column::Level)
        .all(self.db)
        .await?,
    )
  }

  pub async fn by_beneficiary(
    &self,
    user_id: i64,
    limit: u64,
  ) -> Result<Vec<commission::Model>> {
    Ok(
      commission::Entity::find()
        .filter(commission::Column::BeneficiaryId.eq(user_id))
        .order_by_desc(commission::Column::CreatedAt)
        .order_by_desc(commission::Column::Id)
        .limit(limit)
        .all(self.db)
        .await?,
    )
  }

  pub async fn earnings(&self, user_id: i64) -> Result<Earnings> {
    type Row = (CommissionStatus, Option<i64>, i64);

    let rows: Vec<Row> = commission::Entity::find()
      .select_only()
      .column(commission::Column::Status)
      .column_as(Expr::col(commission::Column::AmountCents).sum(), "total")
      .column_as(Expr::col(commission::Column::Id).count(), "records")
      .filter(commission::Column::BeneficiaryId.eq(user_id))
      .group_by(commission::Column::Status)
      .into_tuple()
      .all(self.db)
      .await?;

    let mut earnings = Earnings::default();
    for (status, total, records) in rows {
      let total = total.unwrap_or(0);
      match status {
        CommissionStatus::Pending => earnings.pending_cents = total,
        CommissionStatus::Paid => earnings.paid_cents = total,
        CommissionStatus::Cancelled => earnings.cancelled_cents = total,
      }
      earnings.records += records;
    }

    Ok(earnings)
  }
}

/// Cancels the pending commissions of a cancelled sale and returns how many
/// records changed. `conn` is usually the caller's transaction.
pub async fn cancel_for_sale<C: ConnectionTrait>(
  conn: &C,
  sale_id: i32,
) -> Result<u64> {
  let paid = commission::Entity::find()
    .filter(commission::Column::SourceSaleId.eq(sale_id))
    .filter(commission::Column::Status.eq(CommissionStatus::Paid))
    .count(conn)
    .await?;
  if paid > 0 {
    warn!(
      "sale #{} cancelled with {} commissions already paid out",
      sale_id, paid
    );
  }

  let result = commission::Entity::update_many()
    .col_expr(
      commission::Column::Status,
      Expr::value(CommissionStatus::Cancelled),
    )
    .filter(commission::Column::SourceSaleId.eq(sale_id))
    .filter(commission::Column::Status.eq(CommissionStatus::Pending))
    .exec(conn)
    .await?;

  Ok(result.rows_affected)
}
