use super::*;

/// Asset binding event data.
#[derive(Debug, Serialize, SchemaType)]
pub struct BindEvent {
    /// The token this escrow is going to auction.
    pub asset: Token,
}

/// Auction start event data.
#[derive(Debug, Serialize, SchemaType)]
pub struct StartEvent {
    /// The token under auction.
    pub asset: Token,
    /// Token units taken into escrow.
    pub amount: ContractTokenAmount,
    /// Price every bid has to exceed.
    pub starting_price: Amount,
    /// Bidding cutoff.
    pub deadline: Timestamp,
}

/// Bid event data.
#[derive(Debug, Serialize, SchemaType)]
pub struct BidEvent {
    /// Account holding the new standing bid.
    pub bidder: AccountAddress,
    /// Bid amount.
    pub amount: Amount,
}

/// Proceeds payout event data.
#[derive(Debug, Serialize, SchemaType)]
pub struct ProceedsEvent {
    /// Account the winning bid was paid to.
    pub beneficiary: AccountAddress,
    /// Amount paid out.
    pub amount: Amount,
}

/// Asset delivery event data.
#[derive(Debug, Serialize, SchemaType)]
pub struct AssetClaimEvent {
    /// Account the escrowed batch was delivered to.
    pub recipient: AccountAddress,
    /// Token units delivered.
    pub amount: ContractTokenAmount,
}

/// Escrow teardown event data.
#[derive(Debug, Serialize, SchemaType)]
pub struct TeardownEvent {
    /// Account the remaining balance was swept to.
    pub beneficiary: AccountAddress,
    /// CCD swept out of the contract.
    pub amount: Amount,
}

/// Tagged custom event to be serialized for the event log.
#[derive(Debug)]
pub enum AuctionEvent {
    /// Binding the auctioned token.
    Bind(BindEvent),
    /// Opening the bidding window.
    Start(StartEvent),
    /// Accepting a new standing bid.
    Bid(BidEvent),
    /// Paying the winning bid to the seller.
    ProceedsClaim(ProceedsEvent),
    /// Delivering the escrowed batch.
    AssetClaim(AssetClaimEvent),
    /// Dismantling the escrow.
    Teardown(TeardownEvent),
}

impl Serial for AuctionEvent {
    fn serial<W: Write>(&self, out: &mut W) -> Result<(), W::Err> {
        match self {
            AuctionEvent::Bind(event) => {
                out.write_u8(BIND_EVENT_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Start(event) => {
                out.write_u8(START_EVENT_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Bid(event) => {
                out.write_u8(BID_EVENT_TAG)?;
                event.serial(out)
            }
            AuctionEvent::ProceedsClaim(event) => {
                out.write_u8(PROCEEDS_CLAIM_EVENT_TAG)?;
                event.serial(out)
            }
            AuctionEvent::AssetClaim(event) => {
                out.write_u8(ASSET_CLAIM_EVENT_TAG)?;
                event.serial(out)
            }
            AuctionEvent::Teardown(event) => {
                out.write_u8(TEARDOWN_EVENT_TAG)?;
                event.serial(out)
            }
        }
    }
}

impl Deserial for AuctionEvent {
    fn deserial<R: Read>(source: &mut R) -> ParseResult<Self> {
        let tag = source.read_u8()?;
        match tag {
            BIND_EVENT_TAG => BindEvent::deserial(source).map(AuctionEvent::Bind),
            START_EVENT_TAG => StartEvent::deserial(source).map(AuctionEvent::Start),
            BID_EVENT_TAG => BidEvent::deserial(source).map(AuctionEvent::Bid),
            PROCEEDS_CLAIM_EVENT_TAG => {
                ProceedsEvent::deserial(source).map(AuctionEvent::ProceedsClaim)
            }
            ASSET_CLAIM_EVENT_TAG => {
                AssetClaimEvent::deserial(source).map(AuctionEvent::AssetClaim)
            }
            TEARDOWN_EVENT_TAG => TeardownEvent::deserial(source).map(AuctionEvent::Teardown),
            _ => Err(ParseError::default()),
        }
    }
}
