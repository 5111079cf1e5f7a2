//! Escrow and escrow ratio persistence
//!
//! The service only talks to the traits; `Pg*` types are the sqlx-backed
//! implementations and `crate::memory` has in-process ones.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use crate::error::EscrowResult;
use crate::escrow::{Escrow, EscrowRatio, EscrowType};

/// Fields of a new escrow row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEscrow {
    pub payment_information_id: i64,
    pub escrow_type: EscrowType,
}

/// Mutable fields of an escrow row, written as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowChanges {
    pub escrow_type: EscrowType,
}

/// Fields of a new ratio row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewEscrowRatio {
    pub escrow_id: i64,
    pub buyer: i32,
    pub seller: i32,
}

#[async_trait]
pub trait EscrowRepository: Send + Sync {
    async fn find_all(&self) -> EscrowResult<Vec<Escrow>>;

    async fn find_one(&self, id: i64) -> EscrowResult<Option<Escrow>>;

    async fn find_one_by_payment_information(
        &self,
        payment_information_id: i64,
    ) -> EscrowResult<Option<Escrow>>;

    async fn create(&self, escrow: NewEscrow) -> EscrowResult<Escrow>;

    /// Returns `None` when no row has this id
    async fn update(&self, id: i64, changes: EscrowChanges) -> EscrowResult<Option<Escrow>>;

    /// Returns whether a row was deleted
    async fn destroy(&self, id: i64) -> EscrowResult<bool>;
}

#[async_trait]
pub trait EscrowRatioRepository: Send + Sync {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<EscrowRatio>>;

    /// All ratio rows of an escrow, oldest first
    async fn find_all_by_escrow(&self, escrow_id: i64) -> EscrowResult<Vec<EscrowRatio>>;

    async fn create(&self, ratio: NewEscrowRatio) -> EscrowResult<EscrowRatio>;

    async fn destroy(&self, id: i64) -> EscrowResult<bool>;
}

/// sqlx-backed escrow repository over the `escrows` table
#[derive(Clone)]
pub struct PgEscrowRepository {
    db_pool: PgPool,
}

impl PgEscrowRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EscrowRepository for PgEscrowRepository {
    async fn find_all(&self) -> EscrowResult<Vec<Escrow>> {
        let escrows = sqlx::query_as::<_, Escrow>("SELECT * FROM escrows ORDER BY id")
            .fetch_all(&self.db_pool)
            .await?;

        Ok(escrows)
    }

    async fn find_one(&self, id: i64) -> EscrowResult<Option<Escrow>> {
        let escrow = sqlx::query_as::<_, Escrow>("SELECT * FROM escrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(escrow)
    }

    async fn find_one_by_payment_information(
        &self,
        payment_information_id: i64,
    ) -> EscrowResult<Option<Escrow>> {
        let escrow = sqlx::query_as::<_, Escrow>(
            "SELECT * FROM escrows WHERE payment_information_id = $1 ORDER BY id LIMIT 1",
        )
        .bind(payment_information_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(escrow)
    }

    async fn create(&self, escrow: NewEscrow) -> EscrowResult<Escrow> {
        let now = Utc::now();
        let escrow = sqlx::query_as::<_, Escrow>(
            r#"
            INSERT INTO escrows (type, payment_information_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(escrow.escrow_type.as_str())
        .bind(escrow.payment_information_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(escrow)
    }

    async fn update(&self, id: i64, changes: EscrowChanges) -> EscrowResult<Option<Escrow>> {
        let escrow = sqlx::query_as::<_, Escrow>(
            r#"
            UPDATE escrows
            SET type = $1, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(changes.escrow_type.as_str())
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(escrow)
    }

    async fn destroy(&self, id: i64) -> EscrowResult<bool> {
        let result = sqlx::query("DELETE FROM escrows WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// sqlx-backed ratio repository over the `escrow_ratios` table
#[derive(Clone)]
pub struct PgEscrowRatioRepository {
    db_pool: PgPool,
}

impl PgEscrowRatioRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl EscrowRatioRepository for PgEscrowRatioRepository {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<EscrowRatio>> {
        let ratio = sqlx::query_as::<_, EscrowRatio>("SELECT * FROM escrow_ratios WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        Ok(ratio)
    }

    async fn find_all_by_escrow(&self, escrow_id: i64) -> EscrowResult<Vec<EscrowRatio>> {
        let ratios = sqlx::query_as::<_, EscrowRatio>(
            "SELECT * FROM escrow_ratios WHERE escrow_id = $1 ORDER BY id",
        )
        .bind(escrow_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ratios)
    }

    async fn create(&self, ratio: NewEscrowRatio) -> EscrowResult<EscrowRatio> {
        let now = Utc::now();
        let ratio = sqlx::query_as::<_, EscrowRatio>(
            r#"
            INSERT INTO escrow_ratios (buyer, seller, escrow_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(ratio.buyer)
        .bind(ratio.seller)
        .bind(ratio.escrow_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(ratio)
    }

    async fn destroy(&self, id: i64) -> EscrowResult<bool> {
        let result = sqlx::query("DELETE FROM escrow_ratios WHERE id = $1")
            .bind(id)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
