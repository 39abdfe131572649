//! Commission attribution.
//!
//! Pure computation from a completed sale, the seller's plan and the
//! seller's upline into the commission drafts the ledger persists. Money is
//! integer cents and rates are basis points, so the same inputs give the
//! same cents on every platform.

use serde::Serialize;

use crate::{
  entity::{SaleStatus, sale},
  prelude::*,
};

/// Upline depth that earns commission.
pub const LEVELS: usize = 5;

/// Commission rate in basis points (`10_000` = 100%).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[derive(Serialize)]
#[serde(transparent)]
pub struct Rate(u32);

impl Rate {
  pub const ZERO: Rate = Rate(0);
  pub const MAX_BP: u32 = 10_000;

  pub fn from_bp(bp: u32) -> Result<Self> {
    if bp > Self::MAX_BP {
      return Err(Error::InvalidPlan(format!(
        "rate {bp}bp exceeds {}bp",
        Self::MAX_BP
      )));
    }
    Ok(Self(bp))
  }

  pub fn from_db(bp: i32) -> Result<Self> {
    let bp = u32::try_from(bp)
      .map_err(|_| Error::InvalidPlan(format!("negative rate {bp}bp")))?;
    Self::from_bp(bp)
  }

  pub fn bp(self) -> u32 {
    self.0
  }

  /// `cents * rate`, rounded half-up to a whole cent.
  pub fn apply(self, cents: i64) -> i64 {
    let scaled = cents as i128 * self.0 as i128;
    let max = Self::MAX_BP as i128;
    // amounts and rates are non-negative here, so truncation is floor
    ((scaled + max / 2) / max) as i64
  }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateTable {
  pub direct_sale: Rate,
  pub levels: [Rate; LEVELS],
}

impl RateTable {
  /// Rate for upline `level` (1-indexed). Out of range levels pay nothing.
  pub fn level(&self, level: usize) -> Rate {
    level
      .checked_sub(1)
      .and_then(|idx| self.levels.get(idx))
      .copied()
      .unwrap_or(Rate::ZERO)
  }

  pub fn total_bp(&self) -> u32 {
    self.direct_sale.bp() + self.levels.iter().map(|r| r.bp()).sum::<u32>()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
  pub code: String,
  pub rates: RateTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommissionDraft {
  pub source_sale_id: i32,
  pub beneficiary_id: i64,
  pub level: u8,
  pub plan_code: String,
  pub rate: Rate,
  pub amount_cents: i64,
}

pub fn validate_sale(sale: &sale::Model) -> Result<()> {
  if sale.amount_cents <= 0 {
    return Err(Error::InvalidSale(format!(
      "sale #{} has non-positive amount {}",
      sale.id, sale.amount_cents
    )));
  }
  if sale.status != SaleStatus::Completed {
    return Err(Error::InvalidSale(format!(
      "sale #{} is {}, expected completed",
      sale.id, sale.status
    )));
  }
  Ok(())
}

/// Longest usable prefix of `chain`: at most [`LEVELS`] entries, cut before
/// the first id that repeats an earlier entry or the seller.
pub fn sanitize_chain(seller_id: i64, chain: &[i64]) -> &[i64] {
  let mut seen = HashSet::with_capacity(LEVELS + 1);
  seen.insert(seller_id);

  let len = chain
    .iter()
    .take(LEVELS)
    .position(|id| !seen.insert(*id))
    .unwrap_or(chain.len().min(LEVELS));

  &chain[..len]
}

/// Commission drafts for `sale`, direct record first then levels 1 to 5.
///
/// The direct record is always present, even at zero, so the ledger shows
/// that attribution ran. Upline records that round to zero are skipped.
pub fn attribute(
  sale: &sale::Model,
  plan: &Plan,
  sponsor_chain: &[i64],
) -> Result<Vec<CommissionDraft>> {
  validate_sale(sale)?;

  let draft = |beneficiary_id, level: usize, rate: Rate| CommissionDraft {
    source_sale_id: sale.id,
    beneficiary_id,
    level: level as u8,
    plan_code: plan.code.clone(),
    rate,
    amount_cents: rate.apply(sale.amount_cents),
  };

  let mut drafts = Vec::with_capacity(LEVELS + 1);
  drafts.push(draft(sale.seller_id, 0, plan.rates.direct_sale));

  let chain = sanitize_chain(sale.seller_id, sponsor_chain);
  for (idx, &ancestor) in chain.iter().enumerate() {
    let level = idx + 1;
    let record = draft(ancestor, level, plan.rates.level(level));
    if record.amount_cents > 0 {
      drafts.push(record);
    }
  }

  Ok(drafts)
}
