use super::*;

/// The contract state.
#[derive(Debug, Serialize, SchemaType, Clone)]
pub struct State {
    /// Escrow and bidding bookkeeping. Everything `view` reports.
    pub auction: Auction,
}

// The state holds no state-api handles, so a snapshot is a plain copy.
#[cfg(not(target_arch = "wasm32"))]
impl<S: HasStateApi> StateClone<S> for State {
    unsafe fn clone_state(&self, _cloned_state_api: &S) -> Self {
        self.clone()
    }
}
