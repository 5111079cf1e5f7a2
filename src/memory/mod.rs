//! In-memory repositories
//!
//! Drop-in replacements for the Pg repositories, used for local runs and
//! service tests. Ids are assigned from 1 in insertion order.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::address::{Address, AddressRepository};
use crate::error::EscrowResult;
use crate::escrow::repository::{
    EscrowChanges, EscrowRatioRepository, EscrowRepository, NewEscrow, NewEscrowRatio,
};
use crate::escrow::{Escrow, EscrowRatio};
use crate::listing::{
    ListingItemTemplate, ListingItemTemplateRepository, PaymentInformation,
    PaymentInformationRepository,
};

#[derive(Default)]
pub struct InMemoryEscrowRepository {
    rows: RwLock<BTreeMap<i64, Escrow>>,
    next_id: AtomicI64,
}

impl InMemoryEscrowRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl EscrowRepository for InMemoryEscrowRepository {
    async fn find_all(&self) -> EscrowResult<Vec<Escrow>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn find_one(&self, id: i64) -> EscrowResult<Option<Escrow>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_one_by_payment_information(
        &self,
        payment_information_id: i64,
    ) -> EscrowResult<Option<Escrow>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|escrow| escrow.payment_information_id == payment_information_id)
            .cloned())
    }

    async fn create(&self, escrow: NewEscrow) -> EscrowResult<Escrow> {
        let now = Utc::now();
        let created = Escrow {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            escrow_type: escrow.escrow_type,
            payment_information_id: escrow.payment_information_id,
            created_at: now,
            updated_at: now,
            ratio: None,
        };

        self.rows.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, changes: EscrowChanges) -> EscrowResult<Option<Escrow>> {
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).map(|escrow| {
            escrow.escrow_type = changes.escrow_type;
            escrow.updated_at = Utc::now();
            escrow.clone()
        }))
    }

    async fn destroy(&self, id: i64) -> EscrowResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryEscrowRatioRepository {
    rows: RwLock<BTreeMap<i64, EscrowRatio>>,
    next_id: AtomicI64,
}

impl InMemoryEscrowRatioRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

#[async_trait]
impl EscrowRatioRepository for InMemoryEscrowRatioRepository {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<EscrowRatio>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_all_by_escrow(&self, escrow_id: i64) -> EscrowResult<Vec<EscrowRatio>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .filter(|ratio| ratio.escrow_id == escrow_id)
            .cloned()
            .collect())
    }

    async fn create(&self, ratio: NewEscrowRatio) -> EscrowResult<EscrowRatio> {
        let now = Utc::now();
        let created = EscrowRatio {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            buyer: ratio.buyer,
            seller: ratio.seller,
            escrow_id: ratio.escrow_id,
            created_at: now,
            updated_at: now,
        };

        self.rows.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn destroy(&self, id: i64) -> EscrowResult<bool> {
        Ok(self.rows.write().await.remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct InMemoryListingItemTemplateRepository {
    rows: RwLock<BTreeMap<i64, ListingItemTemplate>>,
}

impl InMemoryListingItemTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, template: ListingItemTemplate) {
        self.rows.write().await.insert(template.id, template);
    }

    /// Record a live listing posted from a template
    pub async fn post_listing(&self, template_id: i64, listing_item_id: i64) -> bool {
        match self.rows.write().await.get_mut(&template_id) {
            Some(template) => {
                template.listing_item_ids.push(listing_item_id);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl ListingItemTemplateRepository for InMemoryListingItemTemplateRepository {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<ListingItemTemplate>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryPaymentInformationRepository {
    rows: RwLock<BTreeMap<i64, PaymentInformation>>,
}

impl InMemoryPaymentInformationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, payment_information: PaymentInformation) {
        self.rows
            .write()
            .await
            .insert(payment_information.id, payment_information);
    }
}

#[async_trait]
impl PaymentInformationRepository for InMemoryPaymentInformationRepository {
    async fn find_one_by_listing_item_template_id(
        &self,
        listing_item_template_id: i64,
    ) -> EscrowResult<Option<PaymentInformation>> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|info| info.listing_item_template_id == listing_item_template_id)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryAddressRepository {
    rows: RwLock<BTreeMap<i64, Address>>,
}

impl InMemoryAddressRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, address: Address) {
        self.rows.write().await.insert(address.id, address);
    }
}

#[async_trait]
impl AddressRepository for InMemoryAddressRepository {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<Address>> {
        Ok(self.rows.read().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escrow::EscrowType;

    #[tokio::test]
    async fn test_escrow_ids_are_sequential() {
        let repo = InMemoryEscrowRepository::new();
        let new = NewEscrow {
            payment_information_id: 1,
            escrow_type: EscrowType::Mad,
        };

        assert_eq!(repo.create(new).await.unwrap().id, 1);
        assert_eq!(repo.create(new).await.unwrap().id, 2);
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_update_and_destroy_missing_row() {
        let repo = InMemoryEscrowRepository::new();
        let changes = EscrowChanges {
            escrow_type: EscrowType::Nop,
        };

        assert!(repo.update(9, changes).await.unwrap().is_none());
        assert!(!repo.destroy(9).await.unwrap());
    }

    #[tokio::test]
    async fn test_post_listing_on_unknown_template() {
        let repo = InMemoryListingItemTemplateRepository::new();
        assert!(!repo.post_listing(1, 1).await);

        repo.insert(ListingItemTemplate::new(1)).await;
        assert!(repo.post_listing(1, 5).await);
        assert!(repo.find_one(1).await.unwrap().unwrap().is_posted());
    }
}
