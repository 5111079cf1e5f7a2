use async_trait::async_trait;
use sqlx::PgPool;

use super::model::{ListingItemTemplate, PaymentInformation};
use crate::error::EscrowResult;

#[async_trait]
pub trait ListingItemTemplateRepository: Send + Sync {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<ListingItemTemplate>>;
}

#[async_trait]
pub trait PaymentInformationRepository: Send + Sync {
    async fn find_one_by_listing_item_template_id(
        &self,
        listing_item_template_id: i64,
    ) -> EscrowResult<Option<PaymentInformation>>;
}

#[derive(Clone)]
pub struct PgListingItemTemplateRepository {
    db_pool: PgPool,
}

impl PgListingItemTemplateRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl ListingItemTemplateRepository for PgListingItemTemplateRepository {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<ListingItemTemplate>> {
        let exists = sqlx::query_as::<_, (i64,)>("SELECT id FROM listing_item_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db_pool)
            .await?;

        if exists.is_none() {
            return Ok(None);
        }

        let listing_items = sqlx::query_as::<_, (i64,)>(
            "SELECT id FROM listing_items WHERE listing_item_template_id = $1 ORDER BY id",
        )
        .bind(id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(Some(ListingItemTemplate {
            id,
            listing_item_ids: listing_items.into_iter().map(|(item_id,)| item_id).collect(),
        }))
    }
}

#[derive(Clone)]
pub struct PgPaymentInformationRepository {
    db_pool: PgPool,
}

impl PgPaymentInformationRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl PaymentInformationRepository for PgPaymentInformationRepository {
    async fn find_one_by_listing_item_template_id(
        &self,
        listing_item_template_id: i64,
    ) -> EscrowResult<Option<PaymentInformation>> {
        let payment_information = sqlx::query_as::<_, PaymentInformation>(
            r#"
            SELECT id, listing_item_template_id
            FROM payment_informations
            WHERE listing_item_template_id = $1
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(listing_item_template_id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(payment_information)
    }
}
