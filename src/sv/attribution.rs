use async_trait::async_trait;
use serde::Serialize;

use crate::{
  engine::{self, CommissionDraft, LEVELS, Plan},
  entity::{commission, sale},
  prelude::*,
  sv,
};

/// Upline of a user, nearest sponsor first.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SponsorChain {
  pub ids: Vec<i64>,
  /// Id whose second visit stopped the walk.
  pub cycle_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", content = "records", rename_all = "snake_case")]
pub enum Recorded {
  Created(Vec<commission::Model>),
  /// The sale was attributed before; nothing was written.
  Duplicate,
}

#[async_trait]
pub trait SponsorGraph: Send + Sync {
  async fn sponsor_chain(
    &self,
    user_id: i64,
    max_depth: usize,
  ) -> Result<SponsorChain>;
}

#[async_trait]
pub trait PlanRegistry: Send + Sync {
  async fn active_plan(&self, user_id: i64) -> Result<Option<Plan>>;
}

#[async_trait]
pub trait Ledger: Send + Sync {
  async fn record_attribution(
    &self,
    sale_id: i32,
    drafts: &[CommissionDraft],
  ) -> Result<Recorded>;
}

pub struct Attributor<G, P, L> {
  graph: G,
  plans: P,
  ledger: L,
}

impl<G, P, L> Attributor<G, P, L>
where
  G: SponsorGraph,
  P: PlanRegistry,
  L: Ledger,
{
  pub fn new(graph: G, plans: P, ledger: L) -> Self {
    Self { graph, plans, ledger }
  }

  pub async fn attribute(&self, sale: &sale::Model) -> Result<Recorded> {
    engine::validate_sale(sale)?;

    let plan = self
      .plans
      .active_plan(sale.seller_id)
      .await?
      .ok_or(Error::PlanNotFound(sale.seller_id))?;

    let chain = self.graph.sponsor_chain(sale.seller_id, LEVELS).await?;
    if let Some(id) = chain.cycle_at {
      warn!(
        "sponsor cycle above user {} at user {}, upline truncated to {:?}",
        sale.seller_id, id, chain.ids
      );
    }

    let drafts = engine::attribute(sale, &plan, &chain.ids)?;
    let recorded = self.ledger.record_attribution(sale.id, &drafts).await?;

    match &recorded {
      Recorded::Created(records) => info!(
        "sale #{} attributed under plan `{}`: {} records",
        sale.id,
        plan.code,
        records.len()
      ),
      Recorded::Duplicate => debug!("sale #{} already attributed", sale.id),
    }

    Ok(recorded)
  }
}

pub type DbAttributor<'a> =
  Attributor<sv::User<'a>, sv::Plan<'a>, sv::Ledger<'a>>;

impl<'a> DbAttributor<'a> {
  pub fn for_db(db: &'a DatabaseConnection) -> Self {
    Self::new(sv::User::new(db), sv::Plan::new(db), sv::Ledger::new(db))
  }
}

#[async_trait]
impl<'a> SponsorGraph for sv::User<'a> {
  async fn sponsor_chain(
    &self,
    user_id: i64,
    max_depth: usize,
  ) -> Result<SponsorChain> {
    sv::User::sponsor_chain(self, user_id, max_depth).await
  }
}

#[async_trait]
impl<'a> PlanRegistry for sv::Plan<'a> {
  async fn active_plan(&self, user_id: i64) -> Result<Option<Plan>> {
    sv::Plan::active_plan(self, user_id).await
  }
}

#[async_trait]
impl<'a> Ledger for sv::Ledger<'a> {
  async fn record_attribution(
    &self,
    sale_id: i32,
    drafts: &[CommissionDraft],
  ) -> Result<Recorded> {
    sv::Ledger::record_attribution(self, sale_id, drafts).await
  }
}
