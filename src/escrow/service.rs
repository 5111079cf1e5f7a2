//! Escrow service layer - Business logic for escrow management

use std::sync::Arc;

use validator::Validate;

use crate::address::{AddressRepository, AddressService};
use crate::error::{EscrowError, EscrowResult};
use crate::escrow::guard::{ListingLinkageGuard, TemplateAction};
use crate::escrow::lock::KeyedLock;
use crate::escrow::ratio::EscrowRatioCoordinator;
use crate::escrow::repository::{
    EscrowChanges, EscrowRatioRepository, EscrowRepository, NewEscrow,
};
use crate::escrow::{
    Escrow, EscrowCreateRequest, EscrowLockRequest, EscrowRefundRequest, EscrowReleaseRequest,
    EscrowTemplateRequest, EscrowUpdateRequest,
};
use crate::listing::{ListingItemTemplateRepository, PaymentInformationRepository};
use crate::messaging::{
    Broadcaster, EscrowActionFactories, EscrowActionFactory, EscrowActionMessage,
    EscrowLockInput, EscrowRefundInput, EscrowReleaseInput,
};

/// Escrow service for managing escrow configuration and actions
pub struct EscrowService {
    escrow_repo: Arc<dyn EscrowRepository>,
    ratio_coordinator: EscrowRatioCoordinator,
    /// Keyed by payment information id
    create_locks: KeyedLock,
    linkage_guard: ListingLinkageGuard,
    address_service: AddressService,
    factories: EscrowActionFactories,
    broadcaster: Arc<dyn Broadcaster>,
}

impl EscrowService {
    /// Create new escrow service instance
    pub fn new(
        escrow_repo: Arc<dyn EscrowRepository>,
        ratio_repo: Arc<dyn EscrowRatioRepository>,
        template_repo: Arc<dyn ListingItemTemplateRepository>,
        payment_info_repo: Arc<dyn PaymentInformationRepository>,
        address_repo: Arc<dyn AddressRepository>,
        factories: EscrowActionFactories,
        broadcaster: Arc<dyn Broadcaster>,
    ) -> Self {
        Self {
            escrow_repo,
            ratio_coordinator: EscrowRatioCoordinator::new(ratio_repo),
            create_locks: KeyedLock::new(),
            linkage_guard: ListingLinkageGuard::new(template_repo, payment_info_repo),
            address_service: AddressService::new(address_repo),
            factories,
            broadcaster,
        }
    }

    /// List all escrows, without related rows
    pub async fn find_all(&self) -> EscrowResult<Vec<Escrow>> {
        self.escrow_repo.find_all().await
    }

    /// Get a single escrow by ID
    pub async fn find_one(&self, id: i64, with_related: bool) -> EscrowResult<Escrow> {
        let escrow = match self.escrow_repo.find_one(id).await? {
            Some(escrow) => escrow,
            None => {
                tracing::warn!("Escrow with the id={} was not found!", id);
                return Err(EscrowError::not_found("Escrow", id));
            }
        };

        self.with_related(escrow, with_related).await
    }

    /// Get the escrow attached to a payment information
    pub async fn find_one_by_payment_information(
        &self,
        payment_information_id: i64,
        with_related: bool,
    ) -> EscrowResult<Escrow> {
        let escrow = self
            .escrow_repo
            .find_one_by_payment_information(payment_information_id)
            .await?;

        let escrow = match escrow {
            Some(escrow) => escrow,
            None => {
                tracing::warn!(
                    "Escrow with the payment_information_id={} was not found!",
                    payment_information_id
                );
                return Err(EscrowError::not_found(
                    "Escrow for PaymentInformation",
                    payment_information_id,
                ));
            }
        };

        self.with_related(escrow, with_related).await
    }

    /// Create an escrow for the payment information of an unposted template
    pub async fn create_check_by_listing_item(
        &self,
        request: EscrowTemplateRequest,
    ) -> EscrowResult<Escrow> {
        request.validate()?;

        let payment_information_id = self
            .linkage_guard
            .resolve_payment_information(request.listing_item_template_id, TemplateAction::Create)
            .await?;

        self.create(request.into_create_request(payment_information_id))
            .await
    }

    /// Create an escrow and its ratio, returning the escrow with the ratio attached
    pub async fn create(&self, request: EscrowCreateRequest) -> EscrowResult<Escrow> {
        request.validate()?;

        self.create_locks
            .with_lock(request.payment_information_id, self.create_locked(&request))
            .await
    }

    /// Update the escrow of an unposted template
    pub async fn update_check_by_listing_item(
        &self,
        request: EscrowTemplateRequest,
    ) -> EscrowResult<Escrow> {
        request.validate()?;

        let payment_information_id = self
            .linkage_guard
            .resolve_payment_information(request.listing_item_template_id, TemplateAction::Update)
            .await?;
        let escrow = self
            .find_one_by_payment_information(payment_information_id, false)
            .await?;

        self.update(escrow.id, request.into_update_request()).await
    }

    /// Overwrite the escrow type and replace its ratio
    pub async fn update(&self, id: i64, request: EscrowUpdateRequest) -> EscrowResult<Escrow> {
        request.validate()?;

        let escrow = self.find_one(id, false).await?;

        let updated = self
            .escrow_repo
            .update(
                escrow.id,
                EscrowChanges {
                    escrow_type: request.escrow_type,
                },
            )
            .await?
            .ok_or_else(|| EscrowError::not_found("Escrow", id))?;

        if let Err(err) = self.ratio_coordinator.replace(updated.id, &request.ratio).await {
            self.restore_escrow_type(&escrow).await;
            return Err(err);
        }

        tracing::info!(
            escrow_id = id,
            escrow_type = updated.escrow_type.as_str(),
            "Escrow updated"
        );

        self.find_one(id, true).await
    }

    /// Delete the escrow of an unposted template
    pub async fn destroy_check_by_listing_item(
        &self,
        listing_item_template_id: i64,
    ) -> EscrowResult<()> {
        let payment_information_id = self
            .linkage_guard
            .resolve_payment_information(listing_item_template_id, TemplateAction::Delete)
            .await?;
        let escrow = self
            .find_one_by_payment_information(payment_information_id, false)
            .await?;

        self.destroy(escrow.id).await
    }

    /// Delete an escrow and its ratio. A missing id is NotFound.
    pub async fn destroy(&self, id: i64) -> EscrowResult<()> {
        self.find_one(id, false).await?;

        let detached = self.ratio_coordinator.detach_all(id).await?;

        match self.escrow_repo.destroy(id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("Escrow with the id={} was not found!", id);
                return Err(EscrowError::not_found("Escrow", id));
            }
            Err(err) => {
                if let Some(last) = detached.last() {
                    self.ratio_coordinator.restore(last).await;
                }
                return Err(err);
            }
        }

        tracing::info!(escrow_id = id, ratios = detached.len(), "Escrow destroyed");
        Ok(())
    }

    /// Build and broadcast a lock message
    pub async fn lock(&self, request: EscrowLockRequest) -> EscrowResult<EscrowActionMessage> {
        request.validate()?;

        let escrow = self.find_one(request.escrow_id, false).await?;
        let address = self.address_service.find_one(request.address_id).await?;

        let message = self.factories.lock.get(EscrowLockInput {
            escrow,
            address,
            listing: request.item_hash,
            nonce: request.nonce,
            memo: request.memo,
        })?;

        self.send(message).await
    }

    /// Build and broadcast a refund message
    pub async fn refund(&self, request: EscrowRefundRequest) -> EscrowResult<EscrowActionMessage> {
        request.validate()?;

        let escrow = self.find_one(request.escrow_id, false).await?;

        let message = self.factories.refund.get(EscrowRefundInput {
            escrow,
            listing: request.item_hash,
            accepted: request.accepted,
            memo: request.memo,
        })?;

        self.send(message).await
    }

    /// Build and broadcast a release message
    pub async fn release(
        &self,
        request: EscrowReleaseRequest,
    ) -> EscrowResult<EscrowActionMessage> {
        request.validate()?;

        let escrow = self.find_one(request.escrow_id, false).await?;

        let message = self.factories.release.get(EscrowReleaseInput {
            escrow,
            listing: request.item_hash,
            memo: request.memo,
        })?;

        self.send(message).await
    }

    // ===== Private Helper Methods =====

    async fn create_locked(&self, request: &EscrowCreateRequest) -> EscrowResult<Escrow> {
        if let Some(existing) = self
            .escrow_repo
            .find_one_by_payment_information(request.payment_information_id)
            .await?
        {
            let message = format!(
                "Escrow {} already exists for PaymentInformation with the id={}",
                existing.id, request.payment_information_id
            );
            tracing::warn!("{}", message);
            return Err(EscrowError::Message(message));
        }

        let escrow = self
            .escrow_repo
            .create(NewEscrow {
                payment_information_id: request.payment_information_id,
                escrow_type: request.escrow_type,
            })
            .await?;

        if let Err(err) = self.ratio_coordinator.attach(escrow.id, &request.ratio).await {
            self.discard_escrow_without_ratio(escrow.id).await;
            return Err(err);
        }

        tracing::info!(
            escrow_id = escrow.id,
            payment_information_id = escrow.payment_information_id,
            escrow_type = escrow.escrow_type.as_str(),
            "Escrow created"
        );

        self.find_one(escrow.id, true).await
    }

    async fn with_related(&self, mut escrow: Escrow, with_related: bool) -> EscrowResult<Escrow> {
        if with_related {
            escrow.ratio = self.ratio_coordinator.find_by_escrow(escrow.id).await?;
        }
        Ok(escrow)
    }

    async fn send(&self, message: EscrowActionMessage) -> EscrowResult<EscrowActionMessage> {
        self.broadcaster.broadcast(&message).await?;

        tracing::info!(
            message_id = %message.id,
            action = ?message.action(),
            escrow_id = message.mpaction.escrow.id,
            "Escrow action sent"
        );
        Ok(message)
    }

    /// Put back the type of an escrow whose ratio swap failed
    async fn restore_escrow_type(&self, previous: &Escrow) {
        let restored = self
            .escrow_repo
            .update(
                previous.id,
                EscrowChanges {
                    escrow_type: previous.escrow_type,
                },
            )
            .await;

        match restored {
            Ok(_) => tracing::warn!(
                escrow_id = previous.id,
                escrow_type = previous.escrow_type.as_str(),
                "Ratio replacement failed, escrow type restored"
            ),
            Err(e) => tracing::error!(
                escrow_id = previous.id,
                error = %e,
                "Ratio replacement failed and the escrow type could not be restored"
            ),
        }
    }

    /// Undo an escrow insert whose ratio could not be written
    async fn discard_escrow_without_ratio(&self, escrow_id: i64) {
        match self.escrow_repo.destroy(escrow_id).await {
            Ok(_) => tracing::warn!(escrow_id, "Ratio creation failed, escrow row removed"),
            Err(e) => tracing::error!(
                escrow_id,
                error = %e,
                "Ratio creation failed and the escrow row could not be removed"
            ),
        }
    }
}
