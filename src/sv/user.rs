use serde::Deserialize;

use crate::{
  entity::{UserStatus, commission_plan, user},
  prelude::*,
  sv::attribution::SponsorChain,
};

pub struct User<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
  pub id: i64,
  #[serde(default)]
  pub sponsor_id: Option<i64>,
  #[serde(default)]
  pub plan_code: Option<String>,
}

impl<'a> User<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, new: NewUser) -> Result<user::Model> {
    if self.by_id(new.id).await?.is_some() {
      return Err(Error::InvalidArgs(format!("user {} already exists", new.id)));
    }

    if let Some(sponsor_id) = new.sponsor_id {
      if sponsor_id == new.id {
        return Err(Error::InvalidArgs("Cannot sponsor yourself".into()));
      }
      self.get(sponsor_id).await?;
    }

    if let Some(code) = &new.plan_code {
      self.ensure_plan(code).await?;
    }

    let now = Utc::now().naive_utc();
    let user = user::ActiveModel {
      id: Set(new.id),
      sponsor_id: Set(new.sponsor_id),
      plan_code: Set(new.plan_code),
      status: Set(UserStatus::Active),
      points: Set(0),
      reg_date: Set(now),
    };

    Ok(user.insert(self.db).await?)
  }

  pub async fn by_id(&self, id: i64) -> Result<Option<user::Model>> {
    Ok(user::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn get(&self, id: i64) -> Result<user::Model> {
    self.by_id(id).await?.ok_or(Error::UserNotFound)
  }

  /// Moves `user_id` under `sponsor_id`, or makes it a root with `None`.
  /// Refuses links that would close a loop in the sponsor forest.
  pub async fn set_sponsor(
    &self,
    user_id: i64,
    sponsor_id: Option<i64>,
  ) -> Result<user::Model> {
    let user = self.get(user_id).await?;

    if let Some(sponsor_id) = sponsor_id {
      if sponsor_id == user_id {
        return Err(Error::InvalidArgs("Cannot sponsor yourself".into()));
      }
      self.get(sponsor_id).await?;

      let upline = self.sponsor_chain(sponsor_id, usize::MAX).await?;
      if upline.ids.contains(&user_id) || upline.cycle_at == Some(user_id) {
        return Err(Error::InvalidArgs(format!(
          "user {sponsor_id} is in the downline of user {user_id}"
        )));
      }
    }

    Ok(
      user::ActiveModel { sponsor_id: Set(sponsor_id), ..user.into() }
        .update(self.db)
        .await?,
    )
  }

  pub async fn set_plan(
    &self,
    user_id: i64,
    plan_code: Option<String>,
  ) -> Result<user::Model> {
    let user = self.get(user_id).await?;

    if let Some(code) = &plan_code {
      self.ensure_plan(code).await?;
    }

    Ok(
      user::ActiveModel { plan_code: Set(plan_code), ..user.into() }
        .update(self.db)
        .await?,
    )
  }

  pub async fn set_status(
    &self,
    user_id: i64,
    status: UserStatus,
  ) -> Result<user::Model> {
    let user = self.get(user_id).await?;

    Ok(
      user::ActiveModel { status: Set(status), ..user.into() }
        .update(self.db)
        .await?,
    )
  }

  pub async fn add_points(&self, user_id: i64, points: i64) -> Result<i64> {
    let user = self.get(user_id).await?;
    let total = user.points + points;

    if total < 0 {
      return Err(Error::InvalidArgs("Points cannot go negative".into()));
    }

    user::ActiveModel { points: Set(total), ..user.into() }
      .update(self.db)
      .await?;

    Ok(total)
  }

  /// Direct recruits of `user_id`.
  pub async fn downline(&self, user_id: i64) -> Result<Vec<user::Model>> {
    Ok(
      user::Entity::find()
        .filter(user::Column::SponsorId.eq(user_id))
        .order_by_asc(user::Column::RegDate)
        .all(self.db)
        .await?,
    )
  }

  /// Follows `sponsor_id` links up from `user_id`.
  ///
  /// Stops after `max_depth` ancestors, at a root, or at the first id seen
  /// twice (the start user counts as seen). Manual admin edits can leave
  /// loops in the table, so a repeat ends the walk instead of failing it.
  pub async fn sponsor_chain(
    &self,
    user_id: i64,
    max_depth: usize,
  ) -> Result<SponsorChain> {
    let start = self.get(user_id).await?;

    let mut chain = SponsorChain::default();
    let mut visited = HashSet::from([user_id]);
    let mut next = start.sponsor_id;

    while let Some(id) = next {
      if chain.ids.len() >= max_depth {
        break;
      }
      if !visited.insert(id) {
        chain.cycle_at = Some(id);
        break;
      }

      let Some(sponsor) = self.by_id(id).await? else {
        warn!("user {} references missing sponsor {}", user_id, id);
        break;
      };

      chain.ids.push(id);
      next = sponsor.sponsor_id;
    }

    trace!("upline of {}: {:?}", user_id, chain.ids);
    Ok(chain)
  }

  pub async fn all(&self) -> Result<Vec<user::Model>> {
    Ok(
      user::Entity::find()
        .order_by_asc(user::Column::RegDate)
        .all(self.db)
        .await?,
    )
  }

  async fn ensure_plan(&self, code: &str) -> Result<()> {
    commission_plan::Entity::find_by_id(code)
      .one(self.db)
      .await?
      .ok_or_else(|| Error::UnknownPlan(code.to_string()))?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::test_utils::test_db;

  async fn chain(db: &DatabaseConnection, id: i64) -> SponsorChain {
    User::new(db).sponsor_chain(id, 5).await.unwrap()
  }

  #[tokio::test]
  async fn test_create_and_sponsor() {
    let db = test_db::setup().await;
    let users = User::new(&db);

    test_db::user(&db, 1, None).await;
    let user = users
      .create(NewUser { id: 2, sponsor_id: Some(1), plan_code: None })
      .await
      .unwrap();

    assert_eq!(user.sponsor_id, Some(1));
    assert_eq!(user.status, UserStatus::Active);

    let result =
      users.create(NewUser { id: 2, sponsor_id: None, plan_code: None }).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));

    let result = users
      .create(NewUser { id: 3, sponsor_id: Some(99), plan_code: None })
      .await;
    assert!(matches!(result, Err(Error::UserNotFound)));

    let result = users
      .create(NewUser { id: 3, sponsor_id: None, plan_code: Some("x".into()) })
      .await;
    assert!(matches!(result, Err(Error::UnknownPlan(_))));
  }

  #[tokio::test]
  async fn test_chain_is_nearest_first_and_bounded() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, None).await;
    for id in 2..=8 {
      test_db::user(&db, id, Some(id - 1)).await;
    }

    assert_eq!(chain(&db, 8).await.ids, vec![7, 6, 5, 4, 3]);
    assert_eq!(chain(&db, 3).await.ids, vec![2, 1]);
    assert_eq!(chain(&db, 1).await, SponsorChain::default());

    let full = User::new(&db).sponsor_chain(8, usize::MAX).await.unwrap();
    assert_eq!(full.ids, vec![7, 6, 5, 4, 3, 2, 1]);
  }

  #[tokio::test]
  async fn test_chain_stops_at_cycle() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, None).await;
    test_db::user(&db, 2, Some(1)).await;
    test_db::user(&db, 3, Some(2)).await;

    // corrupt the table the way a manual edit would: 1 -> 3 -> 2 -> 1
    test_db::force_sponsor(&db, 1, Some(3)).await;

    let upline = chain(&db, 3).await;
    assert_eq!(upline.ids, vec![2, 1]);
    assert_eq!(upline.cycle_at, Some(3));

    let upline = User::new(&db).sponsor_chain(2, usize::MAX).await.unwrap();
    assert_eq!(upline.ids, vec![1, 3]);
    assert_eq!(upline.cycle_at, Some(2));
  }

  #[tokio::test]
  async fn test_chain_stops_at_missing_sponsor() {
    let db = test_db::setup().await;
    test_db::user(&db, 1, None).await;

    test_db::force_sponsor(&db, 1, Some(42)).await;

    let upline = chain(&db, 1).await;
    assert!(upline.ids.is_empty());
    assert_eq!(upline.cycle_at, None);
  }

  #[tokio::test]
  async fn test_set_sponsor_rejects_loops() {
    let db = test_db::setup().await;
    let users = User::new(&db);
    test_db::user(&db, 1, None).await;
    test_db::user(&db, 2, Some(1)).await;
    test_db::user(&db, 3, Some(2)).await;

    let result = users.set_sponsor(1, Some(3)).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));

    let result = users.set_sponsor(1, Some(1)).await;
    assert!(matches!(result, Err(Error::InvalidArgs(_))));

    test_db::user(&db, 4, None).await;
    let moved = users.set_sponsor(3, Some(4)).await.unwrap();
    assert_eq!(moved.sponsor_id, Some(4));

    let root = users.set_sponsor(3, None).await.unwrap();
    assert_eq!(root.sponsor_id, None);
  }

  #[tokio::test]
  async fn test_downline_and_points() {
    let db = test_db::setup().await;
    let users = User::new(&db);
    test_db::user(&db, 1, None).await;
    test_db::user(&db, 2, Some(1)).await;
    test_db::user(&db, 3, Some(1)).await;
    test_db::user(&db, 4, Some(2)).await;

    let ids: Vec<i64> =
      users.downline(1).await.unwrap().into_iter().map(|u| u.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&2) && ids.contains(&3));

    assert_eq!(users.add_points(1, 150).await.unwrap(), 150);
    assert!(matches!(
      users.add_points(1, -200).await,
      Err(Error::InvalidArgs(_))
    ));

    let suspended = users.set_status(2, UserStatus::Suspended).await.unwrap();
    assert_eq!(suspended.status, UserStatus::Suspended);
  }
}
