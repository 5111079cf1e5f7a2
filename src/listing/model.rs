use serde::{Deserialize, Serialize};

/// Draft listing; every posted listing item keeps a reference to it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingItemTemplate {
    pub id: i64,
    pub listing_item_ids: Vec<i64>,
}

impl ListingItemTemplate {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            listing_item_ids: Vec::new(),
        }
    }

    /// A template is posted once at least one live listing points at it
    pub fn is_posted(&self) -> bool {
        !self.listing_item_ids.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct PaymentInformation {
    pub id: i64,
    pub listing_item_template_id: i64,
}
