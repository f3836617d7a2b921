use concordium_cis2::*;
use concordium_std::*;

use crate::{
    ContractBalanceOfQueryParams, ContractBalanceOfQueryResponse, ContractReadError,
    ContractTokenAmount, Token, TransferParameter,
};

/// Client for the CIS-2 entrypoints of the token contract holding the
/// auctioned asset.
pub trait HostAssetExt<S>: HasHost<S> {
    /// Query `holder`'s balance of `asset` through the token contract's
    /// `balanceOf` entrypoint.
    fn asset_balance_of(
        &self,
        asset: &Token,
        holder: Address,
    ) -> Result<ContractTokenAmount, ContractReadError<Self::ReturnValueType>> {
        let mut response = self
            .invoke_contract_read_only(
                &asset.contract,
                &ContractBalanceOfQueryParams {
                    queries: vec![BalanceOfQuery {
                        token_id: asset.id.clone(),
                        address: holder,
                    }],
                },
                EntrypointName::new_unchecked("balanceOf"),
                Amount::zero(),
            )
            .map_err(ContractReadError::Call)?
            .ok_or(ContractReadError::Compatibility)?;

        let BalanceOfQueryResponse(amounts) =
            ContractBalanceOfQueryResponse::deserial(&mut response)
                .map_err(|_| ContractReadError::Parse)?;

        amounts.first().copied().ok_or(ContractReadError::Parse)
    }

    /// Move `amount` units of `asset` out of `from` through the token
    /// contract's `transfer` entrypoint.
    fn asset_transfer(
        &mut self,
        asset: &Token,
        from: Address,
        to: Receiver,
        amount: ContractTokenAmount,
    ) -> Result<(), CallContractError<Self::ReturnValueType>> {
        let transfer = Transfer {
            token_id: asset.id.clone(),
            amount,
            from,
            to,
            data: AdditionalData::empty(),
        };
        self.invoke_contract(
            &asset.contract,
            &TransferParams(vec![transfer]),
            EntrypointName::new_unchecked("transfer"),
            Amount::zero(),
        )?;

        Ok(())
    }
}

impl<S, H: HasHost<S>> HostAssetExt<S> for H {}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use crate::{test::*, ContractTokenId};
    use test_infrastructure::*;

    const ACCOUNT_0: AccountAddress = AccountAddress([0u8; 32]);
    const TOKEN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 7,
        subindex: 0,
    };

    fn token_0() -> Token {
        Token {
            contract: TOKEN_CONTRACT,
            id: ContractTokenId(vec![0, 1]),
        }
    }

    #[derive(Serial, DeserialWithState, StateClone)]
    #[concordium(state_parameter = "S")]
    struct Ledger<S: HasStateApi> {
        credits: StateMap<AccountAddress, Amount, S>,
    }

    fn host() -> TestHost<Ledger<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let state = Ledger {
            credits: state_builder.new_map(),
        };
        TestHost::new(state, state_builder)
    }

    #[concordium_test]
    fn test_asset_balance_of() {
        let mut host = host();
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            parse_and_map_mock::<ContractBalanceOfQueryParams, _, _>(|params| {
                if params.queries.len() == 1
                    && params.queries[0].address == Address::Contract(SELF_ADDRESS)
                {
                    Some(ContractBalanceOfQueryResponse(vec![ContractTokenAmount::from(42)]))
                } else {
                    None
                }
            }),
        );

        let held = host
            .asset_balance_of(&token_0(), Address::Contract(SELF_ADDRESS))
            .expect("Balance query should pass");
        claim_eq!(held, ContractTokenAmount::from(42));
    }

    #[concordium_test]
    fn test_asset_balance_of_rejects_malformed_response() {
        let mut host = host();
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(3u8),
        );

        let res = host.asset_balance_of(&token_0(), Address::Contract(SELF_ADDRESS));
        claim!(matches!(res, Err(ContractReadError::Parse)));
    }

    #[concordium_test]
    fn test_asset_transfer() {
        let mut host = host();
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                |params| {
                    params.0.len() == 1
                        && params.0[0].amount == ContractTokenAmount::from(10)
                        && matches!(params.0[0].to, Receiver::Account(account) if account == ACCOUNT_0)
                },
                (),
            ),
        );

        host.asset_transfer(
            &token_0(),
            Address::Contract(SELF_ADDRESS),
            Receiver::Account(ACCOUNT_0),
            ContractTokenAmount::from(10),
        )
        .expect("Transfer should pass");
    }
}
