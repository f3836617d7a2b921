use super::*;

/// The contract state.
#[derive(Serial, DeserialWithState, StateClone)]
#[concordium(state_parameter = "S")]
pub struct State<S: HasStateApi> {
    /// Escrow and bidding bookkeeping. Everything `view` reports.
    pub auction: Auction,
    /// Keeping track of how much money each enrolled participant can
    /// withdraw. Entries only exist for enrolled accounts.
    pub claims: StateMap<AccountAddress, Amount, S>,
}
