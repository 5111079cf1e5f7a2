//! Shipping addresses referenced by escrow lock messages

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{EscrowError, EscrowResult};

/// Address model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub country: String,
    pub zip_code: String,
    pub profile_id: i64,
}

#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<Address>>;
}

#[derive(Clone)]
pub struct PgAddressRepository {
    db_pool: PgPool,
}

impl PgAddressRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn find_one(&self, id: i64) -> EscrowResult<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            r#"
            SELECT id, title, first_name, last_name, address_line1, address_line2,
                   city, state, country, zip_code, profile_id
            FROM addresses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(address)
    }
}

/// Address lookups that fail loudly on a missing row
#[derive(Clone)]
pub struct AddressService {
    address_repo: Arc<dyn AddressRepository>,
}

impl AddressService {
    pub fn new(address_repo: Arc<dyn AddressRepository>) -> Self {
        Self { address_repo }
    }

    pub async fn find_one(&self, id: i64) -> EscrowResult<Address> {
        match self.address_repo.find_one(id).await? {
            Some(address) => Ok(address),
            None => {
                tracing::warn!("Address with the id={} was not found!", id);
                Err(EscrowError::not_found("Address", id))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryAddressRepository;

    fn address(id: i64) -> Address {
        Address {
            id,
            title: Some("Home".to_string()),
            first_name: Some("Robin".to_string()),
            last_name: None,
            address_line1: "1 Main St".to_string(),
            address_line2: None,
            city: "Springfield".to_string(),
            state: None,
            country: "US".to_string(),
            zip_code: "12345".to_string(),
            profile_id: 1,
        }
    }

    #[tokio::test]
    async fn test_find_one_returns_address() {
        let repo = Arc::new(InMemoryAddressRepository::new());
        repo.insert(address(3)).await;

        let service = AddressService::new(repo);
        assert_eq!(service.find_one(3).await.unwrap().city, "Springfield");
    }

    #[tokio::test]
    async fn test_find_one_missing_is_not_found() {
        let service = AddressService::new(Arc::new(InMemoryAddressRepository::new()));

        let err = service.find_one(99).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Address with the id=99 was not found!");
    }
}
