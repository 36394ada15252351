//! Optimistic credit deduction with server reconciliation.
//!
//! Smart analysis costs one credit and the upstream does the real deduction.
//! The local balance is decremented optimistically so the UI reflects the
//! charge immediately; the transaction records a pre-image of the profile
//! and either commits (adopting the server's profile when one came back) or
//! rolls the pre-image back on failure.

use std::sync::Arc;

use crate::errors::AppError;
use crate::session::SessionStore;
use crate::upstream::types::Profile;

pub const SMART_ANALYSIS_COST: i64 = 1;

/// An in-progress optimistic deduction. Must be resolved with `commit` or
/// `rollback`; dropping it unresolved leaves the optimistic balance in place.
#[must_use = "resolve the transaction with commit() or rollback()"]
pub struct CreditTransaction {
    store: Arc<SessionStore>,
    pre_image: Profile,
}

impl std::fmt::Debug for CreditTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditTransaction")
            .field("pre_image", &self.pre_image)
            .finish_non_exhaustive()
    }
}

impl CreditTransaction {
    /// Checks the balance, applies the optimistic decrement, and captures the
    /// pre-image. Fails with `Unauthorized` when no session is cached and
    /// `InsufficientCredits` when the balance cannot cover the cost.
    pub fn begin(store: &Arc<SessionStore>, cost: i64) -> Result<Self, AppError> {
        let pre_image = store.current().ok_or(AppError::Unauthorized)?;
        if pre_image.credits < cost {
            return Err(AppError::InsufficientCredits);
        }

        let mut optimistic = pre_image.clone();
        optimistic.credits -= cost;
        store.apply(optimistic);

        Ok(Self {
            store: store.clone(),
            pre_image,
        })
    }

    /// The upstream confirmed the charge. When it returned a fresh profile,
    /// that replaces the optimistic guess; otherwise the guess stands.
    pub fn commit(self, confirmed: Option<Profile>) {
        if let Some(profile) = confirmed {
            self.store.apply(profile);
        }
    }

    /// The upstream call failed; restore the pre-image.
    pub fn rollback(self) {
        self.store.apply(self.pre_image);
    }
}
