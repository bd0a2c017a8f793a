//! Settle-delayed fragment refreshes with per-target staleness tokens.
//!
//! A mutation acknowledgment can precede the moment the storefront renders the
//! new cart, so refreshes are fetched after a settle delay. Several refreshes
//! for the same target may be in flight at once and their responses may arrive
//! in any order; a response is applied only if its token is still the latest
//! one issued for its target. Superseded responses are dropped on arrival.
//! Their network activity is not cancelled.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use parking_lot::Mutex;
use shared::domain::sections;
use tokio::{task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};

use crate::{
    client::StorefrontApi,
    error::{CartError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshTarget {
    DrawerContent,
    IconBadge,
}

impl RefreshTarget {
    pub fn key(self) -> &'static str {
        match self {
            RefreshTarget::DrawerContent => "drawer-content",
            RefreshTarget::IconBadge => "icon-badge",
        }
    }

    pub fn section_id(self) -> &'static str {
        match self {
            RefreshTarget::DrawerContent => sections::CART_DRAWER,
            RefreshTarget::IconBadge => sections::CART_ICON_BUBBLE,
        }
    }
}

impl fmt::Display for RefreshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone)]
pub struct RefreshRequest {
    pub target: RefreshTarget,
    pub token: u64,
    pub issued_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// Superseded by a newer request for the same target.
    Stale,
    /// The response lacked the expected markup or its mount was gone; the
    /// view keeps its content.
    NotFound,
    Failed,
}

/// Owner of the mount a refresh writes into.
pub trait RefreshSink: Send + Sync {
    fn apply_refresh(&self, target: RefreshTarget, markup: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
struct TokenState {
    issued: u64,
    applied: u64,
}

impl TokenState {
    fn admits(&self, token: u64) -> bool {
        token == self.issued && token >= self.applied
    }
}

pub struct ReconciliationScheduler {
    api: Arc<dyn StorefrontApi>,
    sink: Arc<dyn RefreshSink>,
    tokens: Mutex<HashMap<RefreshTarget, TokenState>>,
}

impl ReconciliationScheduler {
    pub fn new(api: Arc<dyn StorefrontApi>, sink: Arc<dyn RefreshSink>) -> Arc<Self> {
        Arc::new(Self {
            api,
            sink,
            tokens: Mutex::new(HashMap::new()),
        })
    }

    /// Records a new refresh intent for `target`. Tokens increase strictly per
    /// target in issue order; every earlier request for the target is stale
    /// from here on, so callers writing the view directly issue first.
    pub fn issue(&self, target: RefreshTarget) -> RefreshRequest {
        let mut tokens = self.tokens.lock();
        let state = tokens.entry(target).or_default();
        state.issued += 1;
        RefreshRequest {
            target,
            token: state.issued,
            issued_at: Instant::now(),
        }
    }

    /// Admits or drops a fetched response. Admission and application happen
    /// under one lock so no other response for any target can interleave.
    pub fn complete(&self, request: &RefreshRequest, fetched: Result<String>) -> RefreshOutcome {
        let mut tokens = self.tokens.lock();
        let state = tokens.entry(request.target).or_default();

        if !state.admits(request.token) {
            debug!(
                refresh = %request.target,
                token = request.token,
                latest = state.issued,
                "dropping superseded refresh"
            );
            return RefreshOutcome::Stale;
        }

        let markup = match fetched {
            Ok(markup) => markup,
            Err(error) => {
                warn!(refresh = %request.target, token = request.token, %error, "refresh fetch failed; view stays stale");
                return RefreshOutcome::Failed;
            }
        };

        match self.sink.apply_refresh(request.target, &markup) {
            Ok(()) => {
                state.applied = request.token;
                info!(
                    refresh = %request.target,
                    token = request.token,
                    elapsed_ms = request.issued_at.elapsed().as_millis() as u64,
                    "refresh applied"
                );
                RefreshOutcome::Applied
            }
            Err(error @ (CartError::FragmentNotFound { .. } | CartError::MountMissing { .. })) => {
                warn!(refresh = %request.target, %error, "refresh left the view as is");
                RefreshOutcome::NotFound
            }
            Err(error) => {
                warn!(refresh = %request.target, %error, "refresh could not be applied");
                RefreshOutcome::Failed
            }
        }
    }

    /// Fetches an already issued request after `settle_delay`. No retries: a
    /// failed refresh waits for the next mutation to schedule another.
    pub fn fetch_after(
        self: &Arc<Self>,
        request: RefreshRequest,
        settle_delay: Duration,
    ) -> JoinHandle<RefreshOutcome> {
        debug!(refresh = %request.target, token = request.token, delay_ms = settle_delay.as_millis() as u64, "refresh scheduled");
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(settle_delay).await;
            let fetched = scheduler
                .api
                .fetch_section(request.target.section_id())
                .await;
            scheduler.complete(&request, fetched)
        })
    }

    /// Issues a token now and fetches after `settle_delay`.
    pub fn schedule(
        self: &Arc<Self>,
        target: RefreshTarget,
        settle_delay: Duration,
    ) -> JoinHandle<RefreshOutcome> {
        let request = self.issue(target);
        self.fetch_after(request, settle_delay)
    }

    pub fn latest_issued(&self, target: RefreshTarget) -> Option<u64> {
        self.tokens
            .lock()
            .get(&target)
            .map(|state| state.issued)
            .filter(|issued| *issued > 0)
    }

    pub fn latest_applied(&self, target: RefreshTarget) -> Option<u64> {
        self.tokens
            .lock()
            .get(&target)
            .map(|state| state.applied)
            .filter(|applied| *applied > 0)
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
