use sea_orm::sea_query::Query;
use serde::{Deserialize, Serialize};

use crate::{
  entity::{SaleStatus, UserStatus, attribution, sale},
  prelude::*,
  sv::{
    self,
    attribution::{DbAttributor, Recorded},
    ledger,
  },
};

pub struct Sale<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSale {
  pub seller_id: i64,
  pub amount_cents: i64,
  pub product_ref: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Completion {
  pub sale: sale::Model,
  pub attribution: Recorded,
}

#[derive(Debug, Clone, Serialize)]
pub struct Cancellation {
  pub sale: sale::Model,
  pub cancelled_commissions: u64,
}

impl<'a> Sale<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  /// Records a sale in `pending` state.
  pub async fn record(&self, new: NewSale) -> Result<sale::Model> {
    if new.amount_cents <= 0 {
      return Err(Error::InvalidSale("Sale amount must be positive".into()));
    }

    let seller = sv::User::new(self.db).get(new.seller_id).await?;
    if seller.status == UserStatus::Suspended {
      return Err(Error::InvalidArgs(format!(
        "user {} is suspended",
        seller.id
      )));
    }

    let now = Utc::now().naive_utc();
    let sale = sale::ActiveModel {
      id: NotSet,
      seller_id: Set(new.seller_id),
      amount_cents: Set(new.amount_cents),
      product_ref: Set(new.product_ref),
      status: Set(SaleStatus::Pending),
      created_at: Set(now),
      updated_at: Set(now),
    };

    Ok(sale.insert(self.db).await?)
  }

  pub async fn get(&self, id: i32) -> Result<sale::Model> {
    sale::Entity::find_by_id(id).one(self.db).await?.ok_or(Error::SaleNotFound)
  }

  pub async fn by_seller(&self, seller_id: i64) -> Result<Vec<sale::Model>> {
    Ok(
      sale::Entity::find()
        .filter(sale::Column::SellerId.eq(seller_id))
        .order_by_desc(sale::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Completes a pending sale and attributes its commissions.
  ///
  /// The status change is kept when attribution fails (e.g. the seller
  /// has no plan yet); [`Sale::unattributed`] lists such sales for retry.
  pub async fn complete(&self, id: i32) -> Result<Completion> {
    let sale = transition(self.db, id, SaleStatus::Completed).await?;
    let attribution = DbAttributor::for_db(self.db).attribute(&sale).await?;
    Ok(Completion { sale, attribution })
  }

  /// Attributes an already completed sale. Safe to repeat.
  pub async fn attribute(&self, id: i32) -> Result<Recorded> {
    let sale = self.get(id).await?;
    DbAttributor::for_db(self.db).attribute(&sale).await
  }

  /// Cancels a sale and every pending commission it produced, in one
  /// transaction.
  pub async fn cancel(&self, id: i32) -> Result<Cancellation> {
    let txn = self.db.begin().await?;
    let sale = transition(&txn, id, SaleStatus::Cancelled).await?;
    let cancelled_commissions =
      ledger::cancel_for_sale(&txn, sale.id).await?;
    txn.commit().await?;

    info!(
      "sale #{} cancelled, {} commissions voided",
      sale.id, cancelled_commissions
    );
    Ok(Cancellation { sale, cancelled_commissions })
  }

  /// Completed sales that have no attribution yet.
  pub async fn unattributed(&self) -> Result<Vec<sale::Model>> {
    let attributed = Query::select()
      .column(attribution::Column::SaleId)
      .from(attribution::Entity)
      .to_owned();

    Ok(
      sale::Entity::find()
        .filter(sale::Column::Status.eq(SaleStatus::Completed))
        .filter(sale::Column::Id.not_in_subquery(attributed))
        .order_by_asc(sale::Column::Id)
        .all(self.db)
        .await?,
    )
  }
}

async fn transition<C: ConnectionTrait>(
  conn: &C,
  id: i32,
  next: SaleStatus,
) -> Result<sale::Model> {
  let sale =
    sale::Entity::find_by_id(id).one(conn).await?.ok_or(Error::SaleNotFound)?;

  if !sale.status.can_become(next) {
    return Err(Error::transition(sale.status, next));
  }

  Ok(
    sale::ActiveModel {
      status: Set(next),
      updated_at: Set(Utc::now().naive_utc()),
      ..sale.into()
    }
    .update(conn)
    .await?,
  )
}
