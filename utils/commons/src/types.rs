use super::*;

pub type ContractResult<A> = Result<A, ContractError>;

/// Contract token ID type. Token contracts vary in the ID width they use, so
/// the escrow keeps the general variable-length representation.
pub type ContractTokenId = TokenIdVec;

/// Amount of fungible token units held in escrow.
pub type ContractTokenAmount = TokenAmountU64;

/// Wrapping the custom errors in a type with CIS2 errors.
pub type ContractError = Cis2Error<CustomContractError>;

/// Parameter type for the CIS-2 function `balanceOf` specialized to the
/// token types used by this contract.
pub type ContractBalanceOfQueryParams = BalanceOfQueryParams<ContractTokenId>;

pub type ContractBalanceOfQueryResponse = BalanceOfQueryResponse<ContractTokenAmount>;

/// Parameter type for the CIS-2 function `transfer` specialized to the
/// token types used by this contract.
pub type TransferParameter = TransferParams<ContractTokenId, ContractTokenAmount>;

/// Parameter type of the CIS-2 receive hook that delivers the escrow deposit.
pub type DepositParams = OnReceivingCis2Params<ContractTokenId, ContractTokenAmount>;
