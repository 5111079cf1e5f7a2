//! Listing linkage checks for template-scoped escrow operations
//!
//! Escrow configuration hangs off a template's payment information and is
//! frozen as soon as the template has been posted as a live listing.

use std::sync::Arc;

use crate::error::{EscrowError, EscrowResult};
use crate::listing::{ListingItemTemplateRepository, PaymentInformationRepository};

/// What the caller is about to do with the escrow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateAction {
    Create,
    Update,
    Delete,
}

impl TemplateAction {
    fn past_participle(&self) -> &'static str {
        match self {
            TemplateAction::Create => "created",
            TemplateAction::Update => "updated",
            TemplateAction::Delete => "deleted",
        }
    }
}

pub struct ListingLinkageGuard {
    template_repo: Arc<dyn ListingItemTemplateRepository>,
    payment_info_repo: Arc<dyn PaymentInformationRepository>,
}

impl ListingLinkageGuard {
    pub fn new(
        template_repo: Arc<dyn ListingItemTemplateRepository>,
        payment_info_repo: Arc<dyn PaymentInformationRepository>,
    ) -> Self {
        Self {
            template_repo,
            payment_info_repo,
        }
    }

    /// Resolve the payment information id escrow operations on an unposted
    /// template are anchored to
    pub async fn resolve_payment_information(
        &self,
        listing_item_template_id: i64,
        action: TemplateAction,
    ) -> EscrowResult<i64> {
        let template = match self.template_repo.find_one(listing_item_template_id).await? {
            Some(template) => template,
            None => {
                tracing::warn!(
                    "ListingItemTemplate with the id={} was not found!",
                    listing_item_template_id
                );
                return Err(EscrowError::not_found(
                    "ListingItemTemplate",
                    listing_item_template_id,
                ));
            }
        };

        if template.is_posted() {
            let message = format!(
                "Escrow cannot be {} because ListingItem has already been posted with listing-item-template-id {}",
                action.past_participle(),
                listing_item_template_id
            );
            tracing::warn!(
                listing_item_template_id,
                listing_items = template.listing_item_ids.len(),
                "{}",
                message
            );
            return Err(EscrowError::Message(message));
        }

        let payment_information = self
            .payment_info_repo
            .find_one_by_listing_item_template_id(listing_item_template_id)
            .await?;

        match payment_information {
            Some(payment_information) => Ok(payment_information.id),
            None => {
                let message = format!(
                    "PaymentInformation with the listing_item_template_id={} was not found!",
                    listing_item_template_id
                );
                tracing::warn!("{}", message);
                Err(EscrowError::Message(message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{ListingItemTemplate, PaymentInformation};
    use crate::memory::{InMemoryListingItemTemplateRepository, InMemoryPaymentInformationRepository};

    async fn guard_with(
        templates: Vec<ListingItemTemplate>,
        payment_informations: Vec<PaymentInformation>,
    ) -> ListingLinkageGuard {
        let template_repo = Arc::new(InMemoryListingItemTemplateRepository::new());
        for template in templates {
            template_repo.insert(template).await;
        }
        let payment_info_repo = Arc::new(InMemoryPaymentInformationRepository::new());
        for payment_information in payment_informations {
            payment_info_repo.insert(payment_information).await;
        }
        ListingLinkageGuard::new(template_repo, payment_info_repo)
    }

    #[tokio::test]
    async fn test_unposted_template_resolves_payment_information() {
        let guard = guard_with(
            vec![ListingItemTemplate::new(1)],
            vec![PaymentInformation {
                id: 10,
                listing_item_template_id: 1,
            }],
        )
        .await;

        let id = guard
            .resolve_payment_information(1, TemplateAction::Create)
            .await
            .unwrap();
        assert_eq!(id, 10);
    }

    #[tokio::test]
    async fn test_posted_template_is_business_rule_violation() {
        let guard = guard_with(
            vec![ListingItemTemplate {
                id: 1,
                listing_item_ids: vec![100],
            }],
            vec![PaymentInformation {
                id: 10,
                listing_item_template_id: 1,
            }],
        )
        .await;

        let err = guard
            .resolve_payment_information(1, TemplateAction::Update)
            .await
            .unwrap_err();
        assert!(err.is_business_rule());
        assert!(err.to_string().contains("cannot be updated"));
        assert!(err.to_string().contains("listing-item-template-id 1"));
    }

    #[tokio::test]
    async fn test_missing_payment_information_is_business_rule_violation() {
        let guard = guard_with(vec![ListingItemTemplate::new(2)], vec![]).await;

        let err = guard
            .resolve_payment_information(2, TemplateAction::Delete)
            .await
            .unwrap_err();
        assert!(err.is_business_rule());
        assert_eq!(
            err.to_string(),
            "PaymentInformation with the listing_item_template_id=2 was not found!"
        );
    }

    #[tokio::test]
    async fn test_missing_template_is_not_found() {
        let guard = guard_with(vec![], vec![]).await;

        let err = guard
            .resolve_payment_information(3, TemplateAction::Create)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
