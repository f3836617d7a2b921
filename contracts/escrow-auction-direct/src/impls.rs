use super::*;

impl State {
    /// A fresh escrow with no asset bound and no bids placed.
    pub fn new(settlement: SettlementPolicy) -> Self {
        Self {
            auction: Auction::new(settlement),
        }
    }
}
