use async_trait::async_trait;
use chrono::Utc;
use domain::{LineItem, Money, NewOrder, Order, OrderStatus, UserId};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};

use crate::{OrderId, OrderRepository, Result, StatusTransition, StoreError};

const ORDER_COLUMNS: &str = "id, user_id, line_items, total_cents, status, created_at, updated_at";

/// PostgreSQL-backed order repository.
///
/// IDs come from the `BIGSERIAL` column. Status writes lock the row with
/// `SELECT ... FOR UPDATE` inside a transaction, so the read and the write
/// of one call are never interleaved with another writer on the same order.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let id: i64 = row.try_get("id")?;
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status.parse().map_err(|e: domain::OrderError| {
            StoreError::CorruptRecord {
                id,
                reason: e.to_string(),
            }
        })?;
        let Json(line_items): Json<Vec<LineItem>> = row.try_get("line_items")?;

        Ok(Order::from_parts(
            OrderId::new(id),
            UserId::new(row.try_get("user_id")?),
            line_items,
            Money::from_cents(row.try_get("total_cents")?),
            status,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        ))
    }

    async fn lock_order(tx: &mut Transaction<'_, Postgres>, id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_i64())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        Self::row_to_order(row)
    }

    async fn write_status(
        tx: &mut Transaction<'_, Postgres>,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(id.as_i64())
        .fetch_one(&mut **tx)
        .await?;

        Self::row_to_order(row)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    #[tracing::instrument(skip(self, line_items), fields(items = line_items.len()))]
    async fn create(&self, user_id: UserId, line_items: Vec<LineItem>) -> Result<Order> {
        let new_order = NewOrder::new(user_id, line_items)?;
        let now = Utc::now();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO orders (user_id, line_items, total_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(new_order.user_id().as_i64())
        .bind(Json(new_order.line_items()))
        .bind(new_order.total().cents())
        .bind(OrderStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_order(row)
    }

    #[tracing::instrument(skip(self))]
    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        Self::lock_order(&mut tx, id).await?;
        let order = Self::write_status(&mut tx, id, status).await?;

        tx.commit().await?;
        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<StatusTransition> {
        let mut tx = self.pool.begin().await?;

        let current = Self::lock_order(&mut tx, id).await?;
        if current.status() != from {
            tx.rollback().await?;
            return Ok(StatusTransition::Skipped(current));
        }
        let order = Self::write_status(&mut tx, id, to).await?;

        tx.commit().await?;
        Ok(StatusTransition::Applied(order))
    }

    async fn get(&self, id: OrderId) -> Result<Order> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        Self::row_to_order(row)
    }

    async fn list(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_order).collect()
    }
}
