//! Fan-out of description changes to resources sharing a remote issue.

use super::conditions::ConditionLedger;
use crate::issue::{
    domain::{
        CanonicalLabels, ConditionStatus, ConditionType, ConditionUpdate, IssueDomainError,
        IssueResource, LabelKeys,
    },
    ports::{IssueResourceStore, StoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Summary of a propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationReport {
    /// The changed resource does not carry the canonical labels yet.
    Skipped,
    /// Siblings were visited.
    Propagated {
        /// Resources matched by the selector, including the changed one.
        matched: usize,
        /// Resources whose description differs from the changed one.
        unaffected: usize,
    },
}

/// Errors raised while finding sibling resources.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The spec cannot produce canonical label values.
    #[error(transparent)]
    Domain(#[from] IssueDomainError),

    /// Listing siblings failed.
    #[error("could not list sibling resources: {0}")]
    Store(#[from] StoreError),
}

/// Marks every resource that shares the changed resource's repository and
/// title with `IssueDescriptionUnaffected`.
///
/// Only resources selected by the canonical labels are visited; others
/// are never touched.
pub struct CrossResourcePropagator<R, C>
where
    R: IssueResourceStore,
    C: Clock + Send + Sync,
{
    store: Arc<R>,
    ledger: ConditionLedger<R, C>,
    keys: LabelKeys,
}

impl<R, C> CrossResourcePropagator<R, C>
where
    R: IssueResourceStore,
    C: Clock + Send + Sync,
{
    /// Creates the propagator.
    #[must_use]
    pub const fn new(store: Arc<R>, ledger: ConditionLedger<R, C>, keys: LabelKeys) -> Self {
        Self {
            store,
            ledger,
            keys,
        }
    }

    /// Records `IssueDescriptionUnaffected` on every sibling of `changed`.
    ///
    /// A sibling whose description differs from `changed` gets `True`, one
    /// with the same description gets `False`. When the listing contains
    /// `changed` itself the condition is written through `changed` so the
    /// caller's copy stays current.
    ///
    /// # Errors
    ///
    /// Returns [`PropagationError`] when the selector cannot be built or the
    /// listing fails. Condition writes are best-effort.
    pub async fn propagate(
        &self,
        changed: &mut IssueResource,
    ) -> Result<PropagationReport, PropagationError> {
        if !self.keys.present_on(&changed.metadata.labels) {
            info!(resource = %changed.key(), "canonical labels missing; skipping propagation");
            return Ok(PropagationReport::Skipped);
        }

        let selector = CanonicalLabels::from_spec(&changed.spec)?.selector(&self.keys);
        let mut siblings = self.store.list(&selector).await?;
        let changed_key = changed.key();
        let matched = siblings.len();
        let mut unaffected = 0;

        for sibling in &mut siblings {
            let differs = sibling.spec.description != changed.spec.description;
            if differs {
                unaffected += 1;
            }
            let update = ConditionUpdate::of(
                ConditionType::IssueDescriptionUnaffected,
                ConditionStatus::from(differs),
            );
            if sibling.key() == changed_key {
                self.ledger.set_condition(changed, update).await;
            } else {
                self.ledger.set_condition(sibling, update).await;
            }
        }

        debug!(%selector, matched, unaffected, "propagated description change");
        Ok(PropagationReport::Propagated {
            matched,
            unaffected,
        })
    }
}
