use super::*;

/// The custom errors the contracts can produce.
#[derive(Serialize, Debug, PartialEq, Eq, Reject, SchemaType)]
pub enum CustomContractError {
    /// Failed parsing the parameter (Error code: -1).
    #[from(ParseError)]
    ParseParams,
    /// Failed logging: Log is full (Error code: -2).
    LogFull,
    /// Failed logging: Log is malformed (Error code: -3).
    LogMalformed,
    /// Only account addresses can bid and claim (Error code: -4).
    OnlyAccountAddress,
    /// This function must only be called by a contract (Error code: -5).
    ContractOnly,
    /// Unauthorized (Error code: -6).
    Unauthorized,
    /// An asset is already bound to this escrow (Error code: -7).
    AssetAlreadyBound,
    /// No asset has been bound to this escrow yet (Error code: -8).
    AssetNotBound,
    /// Incoming transfer does not match the bound asset (Error code: -9).
    UnexpectedAsset,
    /// The starting deposit carried no token units (Error code: -10).
    EmptyDeposit,
    /// The auction deadline has already been set (Error code: -11).
    AlreadyStarted,
    /// The starting deposit has not arrived yet (Error code: -12).
    AuctionNotStarted,
    /// Duration is either too far in the future or in the past (Error code: -13).
    InvalidDuration,
    // Raised if bid is lower than highest amount (Error code: -14)
    BidTooLow,
    // Attempt to bid past the deadline (Error code: -15)
    AuctionFinished,
    // Raised if there is an attempt to settle the auction before its deadline
    // (Error code: -16)
    AuctionStillActive,
    // Raised if the operation is attempted after the asset has been settled
    // (Error code: -17)
    AuctionFinalized,
    /// The escrow has been torn down and takes no further calls (Error code: -18).
    EscrowDismantled,
    /// The caller never enrolled in the claim ledger (Error code: -19).
    NotEnrolled,
    /// No bids were placed in this auction (Error code: -20).
    NoBidsPlaced,
    /// The winning bid has already been paid out (Error code: -21).
    ProceedsAlreadyClaimed,
    /// The escrow still holds the auctioned asset (Error code: -22).
    AssetStillEscrowed,
    /// Failed to invoke a contract (Error code: -23).
    InvokeContractError,
    /// Failed to invoke a transfer (Error code: -24).
    InvokeTransferError,
    /// Incompatible contract (Error code: -25).
    Incompatible,
}

/// Mapping the logging errors to CustomContractError.
impl From<LogError> for CustomContractError {
    fn from(le: LogError) -> Self {
        match le {
            LogError::Full => Self::LogFull,
            LogError::Malformed => Self::LogMalformed,
        }
    }
}

/// Mapping errors related to contract invocations to CustomContractError.
impl<T> From<CallContractError<T>> for CustomContractError {
    fn from(_cce: CallContractError<T>) -> Self {
        Self::InvokeContractError
    }
}

/// Mapping CustomContractError to ContractError.
impl From<CustomContractError> for ContractError {
    fn from(c: CustomContractError) -> Self {
        Cis2Error::Custom(c)
    }
}

/// Mapping errors related to CCD transfers to CustomContractError.
impl From<TransferError> for CustomContractError {
    fn from(_te: TransferError) -> Self {
        Self::InvokeTransferError
    }
}

/// Failure modes of read-only queries against another contract.
#[derive(Debug)]
pub enum ContractReadError<R> {
    Call(CallContractError<R>),
    Compatibility,
    Parse,
}

impl<R> ContractReadError<R> {
    /// Collapse into the error the entrypoint rejects with: logic rejections
    /// keep the invoke classification, everything else means the queried
    /// contract does not speak the expected interface.
    pub fn reject_reason(self) -> CustomContractError {
        match self {
            ContractReadError::Call(CallContractError::LogicReject { .. }) => {
                CustomContractError::InvokeContractError
            }
            _ => CustomContractError::Incompatible,
        }
    }
}
