//! Escrow ratio coordination
//!
//! A ratio row lives and dies with its escrow. Replacement is delete then
//! create; a failed create puts the previous values back before the error is
//! returned.

use std::sync::Arc;

use crate::error::EscrowResult;
use crate::escrow::lock::KeyedLock;
use crate::escrow::repository::{EscrowRatioRepository, NewEscrowRatio};
use crate::escrow::{EscrowRatio, EscrowRatioRequest};

pub struct EscrowRatioCoordinator {
    ratio_repo: Arc<dyn EscrowRatioRepository>,
    replace_locks: KeyedLock,
}

impl EscrowRatioCoordinator {
    pub fn new(ratio_repo: Arc<dyn EscrowRatioRepository>) -> Self {
        Self {
            ratio_repo,
            replace_locks: KeyedLock::new(),
        }
    }

    /// Current ratio of an escrow, the newest row if several exist
    pub async fn find_by_escrow(&self, escrow_id: i64) -> EscrowResult<Option<EscrowRatio>> {
        let ratios = self.ratio_repo.find_all_by_escrow(escrow_id).await?;
        Ok(ratios.into_iter().last())
    }

    /// Create the ratio row of a freshly created escrow
    pub async fn attach(
        &self,
        escrow_id: i64,
        ratio: &EscrowRatioRequest,
    ) -> EscrowResult<EscrowRatio> {
        let created = self
            .ratio_repo
            .create(NewEscrowRatio {
                escrow_id,
                buyer: ratio.buyer,
                seller: ratio.seller,
            })
            .await?;

        tracing::debug!(escrow_id, ratio_id = created.id, "Escrow ratio attached");
        Ok(created)
    }

    /// Swap the ratio of an existing escrow for a new one
    pub async fn replace(
        &self,
        escrow_id: i64,
        ratio: &EscrowRatioRequest,
    ) -> EscrowResult<EscrowRatio> {
        self.replace_locks
            .with_lock(escrow_id, self.replace_locked(escrow_id, ratio))
            .await
    }

    /// Delete every ratio row of an escrow and return the removed rows.
    ///
    /// If a delete fails partway, the newest removed row is put back so the
    /// escrow keeps a ratio.
    pub async fn detach_all(&self, escrow_id: i64) -> EscrowResult<Vec<EscrowRatio>> {
        let ratios = self.ratio_repo.find_all_by_escrow(escrow_id).await?;
        let mut removed = Vec::with_capacity(ratios.len());

        for ratio in ratios {
            match self.ratio_repo.destroy(ratio.id).await {
                Ok(true) => removed.push(ratio),
                Ok(false) => {}
                Err(err) => {
                    if let Some(last) = removed.last() {
                        self.restore(last).await;
                    }
                    return Err(err);
                }
            }
        }

        Ok(removed)
    }

    /// Re-insert the values of a removed ratio row
    pub async fn restore(&self, previous: &EscrowRatio) {
        let restored = self
            .ratio_repo
            .create(NewEscrowRatio {
                escrow_id: previous.escrow_id,
                buyer: previous.buyer,
                seller: previous.seller,
            })
            .await;

        match restored {
            Ok(ratio) => tracing::warn!(
                escrow_id = previous.escrow_id,
                ratio_id = ratio.id,
                "Escrow write failed, previous ratio restored"
            ),
            Err(e) => tracing::error!(
                escrow_id = previous.escrow_id,
                error = %e,
                "Escrow write failed and the previous ratio could not be restored"
            ),
        }
    }

    async fn replace_locked(
        &self,
        escrow_id: i64,
        ratio: &EscrowRatioRequest,
    ) -> EscrowResult<EscrowRatio> {
        let previous = self.detach_all(escrow_id).await?;

        match self.attach(escrow_id, ratio).await {
            Ok(created) => {
                tracing::info!(
                    escrow_id,
                    ratio_id = created.id,
                    replaced = previous.len(),
                    "Escrow ratio replaced"
                );
                Ok(created)
            }
            Err(err) => {
                if let Some(last) = previous.last() {
                    self.restore(last).await;
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEscrowRatioRepository;

    fn ratio(buyer: i32, seller: i32) -> EscrowRatioRequest {
        EscrowRatioRequest { buyer, seller }
    }

    #[tokio::test]
    async fn test_attach_sets_escrow_id() {
        let repo = Arc::new(InMemoryEscrowRatioRepository::new());
        let coordinator = EscrowRatioCoordinator::new(repo.clone());

        let created = coordinator.attach(5, &ratio(70, 30)).await.unwrap();
        assert_eq!(created.escrow_id, 5);
        assert_eq!((created.buyer, created.seller), (70, 30));
        assert_eq!(coordinator.find_by_escrow(5).await.unwrap(), Some(created));
    }

    #[tokio::test]
    async fn test_replace_leaves_single_row() {
        let repo = Arc::new(InMemoryEscrowRatioRepository::new());
        let coordinator = EscrowRatioCoordinator::new(repo.clone());

        let first = coordinator.attach(1, &ratio(50, 50)).await.unwrap();
        let second = coordinator.replace(1, &ratio(80, 20)).await.unwrap();

        let rows = repo.find_all_by_escrow(1).await.unwrap();
        assert_eq!(rows, vec![second.clone()]);
        assert!(repo.find_one(first.id).await.unwrap().is_none());
        assert!(coordinator.replace_locks.is_empty().await);
    }

    #[tokio::test]
    async fn test_detach_all_only_touches_one_escrow() {
        let repo = Arc::new(InMemoryEscrowRatioRepository::new());
        let coordinator = EscrowRatioCoordinator::new(repo.clone());

        coordinator.attach(1, &ratio(50, 50)).await.unwrap();
        coordinator.attach(2, &ratio(10, 90)).await.unwrap();

        let removed = coordinator.detach_all(1).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!((removed[0].buyer, removed[0].seller), (50, 50));
        assert!(coordinator.find_by_escrow(1).await.unwrap().is_none());
        assert!(coordinator.find_by_escrow(2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_restore_reinserts_previous_values() {
        let repo = Arc::new(InMemoryEscrowRatioRepository::new());
        let coordinator = EscrowRatioCoordinator::new(repo.clone());

        coordinator.attach(3, &ratio(65, 35)).await.unwrap();
        let removed = coordinator.detach_all(3).await.unwrap();
        assert!(coordinator.find_by_escrow(3).await.unwrap().is_none());

        coordinator.restore(&removed[0]).await;

        let restored = coordinator.find_by_escrow(3).await.unwrap().unwrap();
        assert_eq!((restored.buyer, restored.seller), (65, 35));
        assert_ne!(restored.id, removed[0].id);
    }
}
