// SPDX-License-Identifier: GPL-3.0-only

//! Result routing
//!
//! Turns the payloads of one frame into at most one UI action. The router
//! is stateless: nothing carries over from one frame to the next.

use super::types::{DecodedPayload, RouteAction};
use crate::config::RouterPolicy;
use crate::constants::scheme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRouter {
    policy: RouterPolicy,
    scheme_prefix: String,
}

impl Default for ResultRouter {
    fn default() -> Self {
        Self::new(RouterPolicy::default(), scheme::UPI_PREFIX)
    }
}

impl ResultRouter {
    pub fn new(policy: RouterPolicy, scheme_prefix: impl Into<String>) -> Self {
        Self {
            policy,
            scheme_prefix: scheme_prefix.into(),
        }
    }

    pub fn policy(&self) -> RouterPolicy {
        self.policy
    }

    pub fn scheme_prefix(&self) -> &str {
        &self.scheme_prefix
    }

    /// Pick the action for a frame; the first matching payload wins
    pub fn route(&self, payloads: &[DecodedPayload]) -> Option<RouteAction> {
        let hit = payloads
            .iter()
            .filter(|payload| !payload.is_blank())
            .find(|payload| self.matches(payload))?;

        let content = hit.content.clone();
        Some(match self.policy {
            RouterPolicy::Dispatch => RouteAction::Dispatch { uri: content },
            RouterPolicy::Display => RouteAction::Display { text: content },
        })
    }

    fn matches(&self, payload: &DecodedPayload) -> bool {
        match self.policy {
            RouterPolicy::Dispatch => payload.content.starts_with(&self.scheme_prefix),
            RouterPolicy::Display => true,
        }
    }
}
