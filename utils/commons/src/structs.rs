use super::*;

/// Token
#[derive(Debug, Serialize, SchemaType, Hash, PartialEq, Eq, Clone)]
pub struct Token {
    pub contract: ContractAddress,
    pub id: ContractTokenId,
}

/// Type of the parameter to the `init` function of both auction contracts.
#[derive(Debug, Serialize, SchemaType)]
pub struct InitParameter {
    /// When settlement payouts become available.
    pub settlement: SettlementPolicy,
}

/// Auction terms carried in the `data` field of the starting deposit.
#[derive(Debug, Serialize, SchemaType, Clone)]
pub struct StartParams {
    /// Price the first bid has to beat.
    pub starting_price: Amount,
    /// How long bidding stays open, measured from the deposit slot time.
    pub length: Duration,
}
