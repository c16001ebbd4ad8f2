use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};

use crate::cars::repo_types::{Car, CarFilter};
use crate::db::PgStore;

#[async_trait]
pub trait CarRepo: Send + Sync {
    /// Cars matching `filter`, ordered by id.
    async fn list(&self, filter: &CarFilter) -> anyhow::Result<Vec<Car>>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Car>>;
}

#[async_trait]
impl CarRepo for PgStore {
    async fn list(&self, filter: &CarFilter) -> anyhow::Result<Vec<Car>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"
            SELECT id, name, category, stock_availability, rental_costs, created_at, updated_at
            FROM cars
            WHERE TRUE
            "#,
        );
        if let Some(category) = &filter.category {
            qb.push(" AND category = ").push_bind(category.clone());
        }
        if filter.available_only {
            qb.push(" AND stock_availability > 0");
        }
        qb.push(" ORDER BY id ASC");

        let rows = qb.build_query_as::<Car>().fetch_all(&self.db).await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Car>> {
        let car = sqlx::query_as::<_, Car>(
            r#"
            SELECT id, name, category, stock_availability, rental_costs, created_at, updated_at
            FROM cars
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(car)
    }
}
