use super::*;

// Functions for creating, updating and querying the contract state.
impl<S: HasStateApi> State<S> {
    /// A fresh escrow with no asset bound, no bids placed and an empty claim
    /// ledger.
    pub fn new(state_builder: &mut StateBuilder<S>, settlement: SettlementPolicy) -> Self {
        Self {
            auction: Auction::new(settlement),
            claims: state_builder.new_map(),
        }
    }

    /// Enroll `account` in the claim ledger with a zero balance. Returns
    /// whether the account was newly enrolled; re-enrolling keeps the
    /// existing balance untouched.
    pub fn enroll(&mut self, account: AccountAddress) -> bool {
        if self.claims.get(&account).is_some() {
            return false;
        }
        self.claims.insert(account, Amount::zero());
        true
    }

    /// The amount `account` could currently withdraw, ignoring any winning
    /// bid withholding. `None` for accounts that never enrolled.
    pub fn claimable(&self, account: &AccountAddress) -> Option<Amount> {
        self.claims.get(account).map(|claim| *claim)
    }

    /// Credit an accepted bid payment to the bidder's ledger entry.
    pub fn credit(
        &mut self,
        account: &AccountAddress,
        amount: Amount,
    ) -> Result<(), CustomContractError> {
        let mut claim = self
            .claims
            .get_mut(account)
            .ok_or(CustomContractError::NotEnrolled)?;
        *claim += amount;
        Ok(())
    }

    /// Zero out `account`'s ledger entry and return the amount to pay out.
    ///
    /// While `account` holds the standing bid, that bid stays withheld: the
    /// entry is lowered to exactly `highest_bid` and only the excess is
    /// released. The winner's entry therefore stays pinned at the winning
    /// amount and repeat claims return zero.
    pub fn release_claim(
        &mut self,
        account: &AccountAddress,
    ) -> Result<Amount, CustomContractError> {
        let withheld = if self.auction.highest_bidder == Some(*account) {
            self.auction.highest_bid
        } else {
            Amount::zero()
        };
        let mut claim = self
            .claims
            .get_mut(account)
            .ok_or(CustomContractError::NotEnrolled)?;
        let payout = *claim - withheld;
        *claim = withheld;
        Ok(payout)
    }
}
