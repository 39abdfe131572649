use sea_orm::{DbBackend, EntityTrait, Schema};

use crate::{entity::*, prelude::*};

async fn create_table<E: EntityTrait>(
  db: &DatabaseConnection,
  schema: &Schema,
  entity: E,
) -> Result<()> {
  let mut stmt = schema.create_table_from_entity(entity);
  stmt.if_not_exists();
  db.execute(db.get_database_backend().build(&stmt)).await?;
  Ok(())
}

/// Creates every table the service needs if it is missing.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
  let schema = Schema::new(DbBackend::Sqlite);

  create_table(db, &schema, user::Entity).await?;
  create_table(db, &schema, commission_plan::Entity).await?;
  create_table(db, &schema, sale::Entity).await?;
  create_table(db, &schema, commission::Entity).await?;
  create_table(db, &schema, attribution::Entity).await?;

  debug!("schema ready");
  Ok(())
}
