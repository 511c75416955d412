use std::collections::HashMap;

/// A logical fetch context whose results must be applied in
/// most-recent-wins order. Each scope owns its own monotonic sequence;
/// sequences are process-local and never shared across scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchScope {
    Tasks,
    Sessions,
    CategoryStats,
}

/// Token identifying one issued request within its scope. Held by the
/// caller alongside the in-flight request and checked on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    scope: FetchScope,
    seq: u64,
}

impl RequestToken {
    pub fn scope(&self) -> FetchScope {
        self.scope
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ScopeState {
    /// Sequence number of the most recently issued request; starts at 0.
    issued: u64,
    /// The token currently allowed to apply its result. `None` after an
    /// invalidation, until the next request is issued.
    current: Option<u64>,
}

/// Issues and validates monotonic tokens per fetch scope so that only the
/// most recently issued request's result is ever applied, even when an
/// earlier request's network round trip completes later.
///
/// This is last-writer-wins, not cancellation: in-flight calls are allowed
/// to complete, only their effect is suppressed.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    scopes: HashMap<FetchScope, ScopeState>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the scope's sequence and return the token for the request
    /// being issued. Call exactly once per logical fetch attempt.
    pub fn begin_request(&mut self, scope: FetchScope) -> RequestToken {
        let state = self.scopes.entry(scope).or_default();
        state.issued += 1;
        state.current = Some(state.issued);
        RequestToken {
            scope,
            seq: state.issued,
        }
    }

    /// True iff the token is the scope's current one. Every async
    /// completion must pass this gate before mutating state.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.scopes
            .get(&token.scope)
            .and_then(|state| state.current)
            == Some(token.seq)
    }

    /// Reject any still-pending result for the scope without consuming a
    /// sequence number. Used when the scope's input parameters change
    /// before a prior request resolves.
    pub fn invalidate(&mut self, scope: FetchScope) {
        self.scopes.entry(scope).or_default().current = None;
    }

    /// Drop the scope entirely; the next `begin_request` counts from zero
    /// again. This models recreating a scope, not invalidating it.
    pub fn reset(&mut self, scope: FetchScope) {
        self.scopes.remove(&scope);
    }
}
