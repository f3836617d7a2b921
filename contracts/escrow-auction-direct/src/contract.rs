use super::*;

/// Initialize the escrow auction.
///
/// The account instantiating the contract becomes the controller. Nothing can
/// be bid on until the controller binds a token and deposits the batch.
#[init(contract = "EscrowAuctionDirect", parameter = "InitParameter")]
fn init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    _state_builder: &mut StateBuilder<S>,
) -> InitResult<State> {
    let params: InitParameter = ctx.parameter_cursor().get()?;
    Ok(State::new(params.settlement))
}

/// Bind the token this escrow is going to auction.
///
/// Queries the token contract for the escrow's own balance, so binding to an
/// address that does not answer `balanceOf` is rejected. Controller only, at
/// most once.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "bindAsset",
    parameter = "Token",
    mutable,
    enable_logger
)]
fn bind_asset<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    ensure!(
        ctx.sender().matches_account(&ctx.owner()),
        CustomContractError::Unauthorized.into()
    );

    let asset: Token = ctx.parameter_cursor().get()?;
    host.state_mut().auction.bind_asset(asset.clone())?;

    host.asset_balance_of(&asset, Address::Contract(ctx.self_address()))
        .map_err(|e| e.reject_reason())?;

    logger.log(&AuctionEvent::Bind(BindEvent { asset }))?;

    Ok(())
}

/// Receive hook for the starting deposit.
///
/// The controller transfers the auctioned batch to this escrow with the
/// auction terms attached as the extra transfer data. Bidding opens the
/// moment the deposit is accepted; the deadline is derived from the slot time
/// of the deposit.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "startAuction",
    parameter = "DepositParams",
    mutable,
    enable_logger
)]
fn start_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    // Deposit notifications only ever come from a token contract.
    let sender = if let Address::Contract(sender) = ctx.sender() {
        sender
    } else {
        bail!(CustomContractError::ContractOnly.into());
    };

    let params: DepositParams = ctx.parameter_cursor().get()?;
    let terms: StartParams = from_bytes(params.data.as_ref())?;

    let asset = host.state().auction.bound_asset()?.clone();
    ensure!(
        sender == asset.contract && params.token_id == asset.id,
        CustomContractError::UnexpectedAsset.into()
    );
    ensure!(
        params.from == Address::Account(ctx.owner()),
        CustomContractError::Unauthorized.into()
    );

    let now = ctx.metadata().slot_time();
    host.state_mut()
        .auction
        .open_bidding(params.amount, terms.starting_price, now, terms.length)?;
    let deadline = host.state().auction.bidding_deadline()?;

    logger.log(&AuctionEvent::Start(StartEvent {
        asset,
        amount: params.amount,
        starting_price: terms.starting_price,
        deadline,
    }))?;

    Ok(())
}

/// Receive function for accounts to place a bid.
///
/// The payment is held in escrow and has to exceed the standing bid. The
/// previously leading bid is refunded to its bidder within this same
/// invocation; if that refund cannot be delivered the new bid is rejected
/// with it.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "bid",
    payable,
    mutable,
    enable_logger
)]
fn bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    amount: Amount,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let bidder = if let Address::Account(bidder) = ctx.sender() {
        bidder
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    let slot_time = ctx.metadata().slot_time();
    let auction = &host.state().auction;
    auction.ensure_live()?;
    let deadline = auction.bidding_deadline()?;
    // Bids are accepted strictly before the deadline.
    ensure!(
        slot_time < deadline,
        CustomContractError::AuctionFinished.into()
    );
    ensure!(
        amount > auction.highest_bid,
        CustomContractError::BidTooLow.into()
    );
    let previous = auction
        .highest_bidder
        .map(|previous_bidder| (previous_bidder, auction.highest_bid));

    // Pay the outbid participant back before recording the new leader.
    if let Some((previous_bidder, previous_bid)) = previous {
        host.invoke_transfer(&previous_bidder, previous_bid)?;
    }

    let auction = &mut host.state_mut().auction;
    auction.highest_bid = amount;
    auction.highest_bidder = Some(bidder);

    logger.log(&AuctionEvent::Bid(BidEvent { bidder, amount }))?;

    Ok(())
}

/// Pay the winning bid out to the controller.
///
/// Callable by anyone once a bid is standing and the settlement policy allows
/// it. Pays out exactly once; repeat calls are rejected.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "claimProceeds",
    mutable,
    enable_logger
)]
fn claim_proceeds<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let beneficiary = ctx.owner();

    let auction = &host.state().auction;
    auction.ensure_not_dismantled()?;
    ensure!(
        auction.highest_bidder.is_some(),
        CustomContractError::NoBidsPlaced.into()
    );
    auction.ensure_settlement_open(ctx.metadata().slot_time())?;
    ensure!(
        !auction.proceeds_claimed,
        CustomContractError::ProceedsAlreadyClaimed.into()
    );
    let amount = auction.highest_bid;

    host.state_mut().auction.proceeds_claimed = true;
    host.invoke_transfer(&beneficiary, amount)?;

    logger.log(&AuctionEvent::ProceedsClaim(ProceedsEvent {
        beneficiary,
        amount,
    }))?;

    Ok(())
}

/// Deliver the escrowed batch.
///
/// Callable by anyone once the settlement policy allows it. The full holding
/// of the escrow is swept to the winner, or back to the controller if nobody
/// bid. Finalizes the auction; repeat calls are rejected.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "claimAsset",
    mutable,
    enable_logger
)]
fn claim_asset<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let slot_time = ctx.metadata().slot_time();
    let self_address = Address::Contract(ctx.self_address());

    let auction = &host.state().auction;
    auction.ensure_live()?;
    auction.ensure_settlement_open(slot_time)?;
    let asset = auction.bound_asset()?.clone();
    // With no bids the batch goes back to the controller.
    let recipient = match auction.highest_bidder {
        Some(winner) => winner,
        None => ctx.owner(),
    };

    // Sweep the full holding, not just the recorded deposit.
    let holding = host
        .asset_balance_of(&asset, self_address)
        .map_err(|e| e.reject_reason())?;

    host.state_mut().auction.auction_state = AuctionState::Sold(recipient);
    host.asset_transfer(&asset, self_address, Receiver::Account(recipient), holding)?;

    logger.log(&AuctionEvent::AssetClaim(AssetClaimEvent {
        recipient,
        amount: holding,
    }))?;

    Ok(())
}

/// Dismantle the escrow and sweep any remaining CCD to the controller.
///
/// Controller only, and only while the escrow holds no asset: before the
/// starting deposit arrived, or after the batch has been delivered. A
/// dismantled escrow takes no further calls.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "teardown",
    mutable,
    enable_logger
)]
fn teardown<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let beneficiary = ctx.owner();
    ensure!(
        ctx.sender().matches_account(&beneficiary),
        CustomContractError::Unauthorized.into()
    );

    host.state().auction.ensure_teardown_allowed()?;

    let balance = host.self_balance();
    host.state_mut().auction.auction_state = AuctionState::Dismantled;
    if balance != Amount::zero() {
        host.invoke_transfer(&beneficiary, balance)?;
    }

    logger.log(&AuctionEvent::Teardown(TeardownEvent {
        beneficiary,
        amount: balance,
    }))?;

    Ok(())
}

/// View the auction bookkeeping.
#[receive(
    contract = "EscrowAuctionDirect",
    name = "view",
    return_value = "Auction"
)]
fn view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State, StateApiType = S>,
) -> ContractResult<Auction> {
    Ok(host.state().auction.clone())
}

#[concordium_cfg_test]
mod tests {
    use super::*;
    use commons::test::*;
    use core::fmt::Debug;
    use test_infrastructure::*;

    const AUCTION_END: u64 = 1000;
    const ACCOUNT_0: AccountAddress = AccountAddress([0u8; 32]);
    const ACCOUNT_1: AccountAddress = AccountAddress([1u8; 32]);
    const ACCOUNT_2: AccountAddress = AccountAddress([2u8; 32]);
    const SELF_ADDRESS: ContractAddress = ContractAddress {
        index: 7,
        subindex: 0,
    };
    const TOKEN_CONTRACT: ContractAddress = ContractAddress {
        index: 1,
        subindex: 0,
    };

    fn token_0() -> Token {
        Token {
            contract: TOKEN_CONTRACT,
            id: ContractTokenId(vec![0, 1]),
        }
    }

    fn expect_error<E, T>(expr: Result<T, E>, err: E, msg: &str)
    where
        E: Eq + Debug,
        T: Debug,
    {
        let actual = expr.expect_err(msg);
        assert_eq!(actual, err);
    }

    fn create_parameter_bytes(parameter: &InitParameter) -> Vec<u8> {
        to_bytes(parameter)
    }

    fn parametrized_init_ctx<'a>(parameter_bytes: &'a Vec<u8>) -> TestInitContext<'a> {
        let mut ctx = TestInitContext::empty();
        ctx.set_parameter(parameter_bytes);
        ctx
    }

    fn new_ctx<'a>(
        owner: AccountAddress,
        sender: AccountAddress,
        slot_time: u64,
    ) -> TestReceiveContext<'a> {
        let mut ctx = TestReceiveContext::empty();
        ctx.set_sender(Address::Account(sender));
        ctx.set_owner(owner);
        ctx.set_metadata_slot_time(Timestamp::from_timestamp_millis(slot_time));
        ctx
    }

    fn bound_state() -> State {
        let mut state = State::new(SettlementPolicy::AfterDeadline);
        state
            .auction
            .bind_asset(token_0())
            .expect("Binding should pass");
        state
    }

    /// Price 100, deposit of 10 units, deadline at AUCTION_END.
    fn started_state() -> State {
        let mut state = bound_state();
        state
            .auction
            .open_bidding(
                ContractTokenAmount::from(10),
                Amount::from_micro_ccd(100),
                Timestamp::from_timestamp_millis(0),
                Duration::from_millis(AUCTION_END),
            )
            .expect("Opening should pass");
        state
    }

    fn started_host() -> TestHost<State> {
        TestHost::new(started_state(), TestStateBuilder::new())
    }

    fn deposit_params(from: Address, token_id: ContractTokenId, amount: u64) -> DepositParams {
        DepositParams {
            token_id,
            amount: ContractTokenAmount::from(amount),
            from,
            data: AdditionalData::from(to_bytes(&StartParams {
                starting_price: Amount::from_micro_ccd(100),
                length: Duration::from_millis(AUCTION_END),
            })),
        }
    }

    fn deposit_ctx<'a>(
        sender: ContractAddress,
        parameter_bytes: &'a [u8],
    ) -> TestReceiveContext<'a> {
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        ctx.set_sender(Address::Contract(sender));
        ctx.set_parameter(parameter_bytes);
        ctx
    }

    fn mock_escrow_balance(host: &mut TestHost<State>, balance: u64) {
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            parse_and_map_mock::<ContractBalanceOfQueryParams, _, _>(move |params| {
                if params.queries.len() == 1
                    && params.queries[0].address == Address::Contract(SELF_ADDRESS)
                {
                    Some(ContractBalanceOfQueryResponse(vec![
                        ContractTokenAmount::from(balance),
                    ]))
                } else {
                    None
                }
            }),
        );
    }

    fn mock_delivery(host: &mut TestHost<State>, recipient: AccountAddress, amount: u64) {
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("transfer".into()),
            parse_and_check_mock::<TransferParameter, _>(
                move |params| {
                    params.0.len() == 1
                        && params.0[0].amount == ContractTokenAmount::from(amount)
                        && matches!(params.0[0].to, Receiver::Account(account) if account == recipient)
                },
                (),
            ),
        );
    }

    #[concordium_test]
    /// Test that initialization leaves an empty escrow: no asset bound, no
    /// deadline, no bids.
    fn test_init() {
        let parameter_bytes = create_parameter_bytes(&InitParameter {
            settlement: SettlementPolicy::AfterDeadline,
        });
        let ctx = parametrized_init_ctx(&parameter_bytes);
        let mut state_builder = TestStateBuilder::new();

        let state = init(&ctx, &mut state_builder).expect("Initialization should pass");
        claim_eq!(state.auction.auction_state, AuctionState::NotSoldYet);
        claim_eq!(state.auction.asset, None);
        claim_eq!(state.auction.deadline, None);
        claim_eq!(state.auction.highest_bid, Amount::zero());
        claim_eq!(state.auction.highest_bidder, None);
        claim_eq!(state.auction.settlement, SettlementPolicy::AfterDeadline);
    }

    #[concordium_test]
    /// Test that the controller can bind the asset exactly once and that the
    /// token contract is probed for compatibility.
    fn test_bind_asset() {
        let parameter_bytes = to_bytes(&token_0());
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        ctx.set_self_address(SELF_ADDRESS);
        ctx.set_parameter(&parameter_bytes);

        let mut host = TestHost::new(
            State::new(SettlementPolicy::AfterDeadline),
            TestStateBuilder::new(),
        );
        mock_escrow_balance(&mut host, 0);
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = bind_asset(&ctx, &mut host, &mut logger);
        res.expect("Binding should pass");
        claim_eq!(host.state().auction.asset, Some(token_0()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], BIND_EVENT_TAG);

        let res: ContractResult<()> = bind_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AssetAlreadyBound.into(),
            "Binding a second time should fail",
        );
    }

    #[concordium_test]
    fn test_bind_requires_controller() {
        let parameter_bytes = to_bytes(&token_0());
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 0);
        ctx.set_self_address(SELF_ADDRESS);
        ctx.set_parameter(&parameter_bytes);

        let mut host = TestHost::new(
            State::new(SettlementPolicy::AfterDeadline),
            TestStateBuilder::new(),
        );
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = bind_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::Unauthorized.into(),
            "Binding should fail for anyone but the controller",
        );
    }

    #[concordium_test]
    /// Test that binding fails when the token contract does not answer
    /// `balanceOf` with a CIS-2 response.
    fn test_bind_rejects_incompatible_token() {
        let parameter_bytes = to_bytes(&token_0());
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        ctx.set_self_address(SELF_ADDRESS);
        ctx.set_parameter(&parameter_bytes);

        let mut host = TestHost::new(
            State::new(SettlementPolicy::AfterDeadline),
            TestStateBuilder::new(),
        );
        host.setup_mock_entrypoint(
            TOKEN_CONTRACT,
            OwnedEntrypointName::new_unchecked("balanceOf".into()),
            parse_and_ok_mock::<ContractBalanceOfQueryParams, _>(3u8),
        );
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = bind_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::Incompatible.into(),
            "Binding should fail when the balance query is unanswerable",
        );
    }

    #[concordium_test]
    /// Test that the starting deposit opens bidding with the attached terms.
    fn test_start_opens_bidding() {
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            token_0().id,
            10,
        ));
        let ctx = deposit_ctx(TOKEN_CONTRACT, &parameter_bytes);

        let mut host = TestHost::new(bound_state(), TestStateBuilder::new());
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        res.expect("Starting should pass");
        claim_eq!(
            host.state().auction.deadline,
            Some(Timestamp::from_timestamp_millis(AUCTION_END))
        );
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(100));
        claim_eq!(
            host.state().auction.asset_amount,
            ContractTokenAmount::from(10)
        );

        claim_eq!(logger.logs.len(), 1);
        let event: AuctionEvent =
            from_bytes(&logger.logs[0]).expect("Logged event should deserialize");
        match event {
            AuctionEvent::Start(start) => {
                claim_eq!(start.asset, token_0());
                claim_eq!(start.amount, ContractTokenAmount::from(10));
                claim_eq!(start.starting_price, Amount::from_micro_ccd(100));
                claim_eq!(start.deadline, Timestamp::from_timestamp_millis(AUCTION_END));
            }
            _ => fail!("Expected a start event"),
        }
    }

    #[concordium_test]
    /// Test that deposits are only accepted from the bound token contract,
    /// for the bound token.
    fn test_start_rejects_wrong_sender() {
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            token_0().id,
            10,
        ));
        let mut host = TestHost::new(bound_state(), TestStateBuilder::new());
        let mut logger = TestLogger::init();

        // Plain accounts cannot deliver deposit notifications.
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        ctx.set_parameter(&parameter_bytes);
        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::ContractOnly.into(),
            "Accounts should not pass as deposit senders",
        );

        // Some other token contract is not the bound asset.
        let foreign = ContractAddress {
            index: 99,
            subindex: 0,
        };
        let ctx = deposit_ctx(foreign, &parameter_bytes);
        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::UnexpectedAsset.into(),
            "Deposits from a foreign token contract should fail",
        );

        // Right contract, wrong token identifier.
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            ContractTokenId(vec![9, 9]),
            10,
        ));
        let ctx = deposit_ctx(TOKEN_CONTRACT, &parameter_bytes);
        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::UnexpectedAsset.into(),
            "Deposits of a different token should fail",
        );
    }

    #[concordium_test]
    fn test_start_rejects_non_controller_deposit() {
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_1),
            token_0().id,
            10,
        ));
        let ctx = deposit_ctx(TOKEN_CONTRACT, &parameter_bytes);

        let mut host = TestHost::new(bound_state(), TestStateBuilder::new());
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::Unauthorized.into(),
            "Deposits from anyone but the controller should fail",
        );
    }

    #[concordium_test]
    fn test_start_requires_bound_asset() {
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            token_0().id,
            10,
        ));
        let ctx = deposit_ctx(TOKEN_CONTRACT, &parameter_bytes);

        let mut host = TestHost::new(
            State::new(SettlementPolicy::AfterDeadline),
            TestStateBuilder::new(),
        );
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AssetNotBound.into(),
            "Deposits before binding should fail",
        );
    }

    #[concordium_test]
    fn test_start_rejects_empty_deposit() {
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            token_0().id,
            0,
        ));
        let ctx = deposit_ctx(TOKEN_CONTRACT, &parameter_bytes);

        let mut host = TestHost::new(bound_state(), TestStateBuilder::new());
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::EmptyDeposit.into(),
            "Deposits of zero units should fail",
        );
    }

    #[concordium_test]
    fn test_start_is_single_shot() {
        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            token_0().id,
            10,
        ));
        let ctx = deposit_ctx(TOKEN_CONTRACT, &parameter_bytes);

        let mut host = started_host();
        let mut logger = TestLogger::init();

        let res: ContractResult<()> = start_auction(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AlreadyStarted.into(),
            "Depositing into a started auction should fail",
        );
    }

    #[concordium_test]
    /// Test a sequence of bids:
    /// 1. Alice bids 150, above the starting price of 100.
    /// 2. Bob outbids with 250; Alice's 150 is paid back within the call.
    /// 3. Alice tries 250 again, which is not above the standing bid.
    fn test_bid_flow_with_refunds() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("First bid should pass");
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(150));
        claim_eq!(host.state().auction.highest_bidder, Some(ACCOUNT_1));

        // The escrow holds Alice's 150 at this point.
        host.set_self_balance(Amount::from_micro_ccd(150));
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(250), &mut logger);
        res.expect("Outbidding should pass");
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(250));
        claim_eq!(host.state().auction.highest_bidder, Some(ACCOUNT_2));
        claim!(host.transfer_occurred(&ACCOUNT_1, Amount::from_micro_ccd(150)));

        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(250), &mut logger);
        expect_error(
            res,
            CustomContractError::BidTooLow.into(),
            "Matching the standing bid should fail",
        );
    }

    #[concordium_test]
    fn test_bid_requires_higher_amount() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        // The starting price itself is not an acceptable bid.
        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> =
            bid(&ctx, &mut host, Amount::from_micro_ccd(100), &mut logger);
        expect_error(
            res,
            CustomContractError::BidTooLow.into(),
            "Bidding the starting price should fail",
        );
    }

    #[concordium_test]
    fn test_bid_after_deadline_fails() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        // A bid at the deadline slot itself is already too late.
        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END);
        let res: ContractResult<()> =
            bid(&ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionFinished.into(),
            "Bidding at the deadline should fail",
        );
    }

    #[concordium_test]
    fn test_bid_requires_started_auction() {
        let mut host = TestHost::new(bound_state(), TestStateBuilder::new());
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> =
            bid(&ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionNotStarted.into(),
            "Bidding before the starting deposit should fail",
        );
    }

    #[concordium_test]
    fn test_bid_requires_account_sender() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        ctx.set_sender(Address::Contract(TOKEN_CONTRACT));
        let res: ContractResult<()> =
            bid(&ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        expect_error(
            res,
            CustomContractError::OnlyAccountAddress.into(),
            "Bidding from a contract should fail",
        );
    }

    #[concordium_test]
    /// Test that a failing refund blocks the replacement bid: when the
    /// standing bid cannot be paid back, nobody can outbid it.
    fn test_failed_refund_blocks_new_bids() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("First bid should pass");

        // Nothing to pay the refund from, so Bob's bid is rejected and Alice
        // keeps the lead.
        host.set_self_balance(Amount::zero());
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(250), &mut logger);
        expect_error(
            res,
            CustomContractError::InvokeTransferError.into(),
            "Bidding should fail when the refund cannot be delivered",
        );
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(150));
        claim_eq!(host.state().auction.highest_bidder, Some(ACCOUNT_1));

        // Once the refund can be delivered again, bidding recovers.
        host.set_self_balance(Amount::from_micro_ccd(150));
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(250), &mut logger);
        res.expect("Outbidding should pass once the refund goes through");
        claim!(host.transfer_occurred(&ACCOUNT_1, Amount::from_micro_ccd(150)));
    }

    #[concordium_test]
    /// Test that the proceeds go to the controller exactly once.
    fn test_claim_proceeds_pays_controller_once() {
        let mut host = started_host();
        host.state_mut().auction.highest_bid = Amount::from_micro_ccd(300);
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        host.set_self_balance(Amount::from_micro_ccd(300));
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        res.expect("Claiming proceeds should pass");
        claim!(host.transfer_occurred(&ACCOUNT_0, Amount::from_micro_ccd(300)));
        claim!(host.state().auction.proceeds_claimed);

        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::ProceedsAlreadyClaimed.into(),
            "Claiming proceeds a second time should fail",
        );
    }

    #[concordium_test]
    fn test_claim_proceeds_requires_bids() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::NoBidsPlaced.into(),
            "Claiming proceeds without bids should fail",
        );
    }

    #[concordium_test]
    /// Test the settlement gate: under AfterDeadline the proceeds stay locked
    /// until the deadline passes, under Anytime they do not.
    fn test_claim_proceeds_respects_policy() {
        let mut host = started_host();
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        host.set_self_balance(Amount::from_micro_ccd(100));
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 500);
        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionStillActive.into(),
            "Claiming proceeds before the deadline should fail",
        );

        host.state_mut().auction.settlement = SettlementPolicy::Anytime;
        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        res.expect("Claiming proceeds early should pass under Anytime");
    }

    #[concordium_test]
    /// Test that the escrowed batch is delivered to the winner and that the
    /// auction is finalized by it.
    fn test_claim_asset_delivers_to_winner() {
        let mut host = started_host();
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        mock_escrow_balance(&mut host, 10);
        mock_delivery(&mut host, ACCOUNT_2, 10);
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        ctx.set_self_address(SELF_ADDRESS);
        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        res.expect("Claiming the asset should pass");
        claim_eq!(
            host.state().auction.auction_state,
            AuctionState::Sold(ACCOUNT_2)
        );
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], ASSET_CLAIM_EVENT_TAG);

        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionFinalized.into(),
            "Claiming the asset a second time should fail",
        );
    }

    #[concordium_test]
    /// Test that delivery sweeps whatever the escrow holds, not only the
    /// recorded deposit.
    fn test_claim_asset_sweeps_full_holding() {
        let mut host = started_host();
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        mock_escrow_balance(&mut host, 25);
        mock_delivery(&mut host, ACCOUNT_2, 25);
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        ctx.set_self_address(SELF_ADDRESS);
        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        res.expect("Claiming the asset should pass");
    }

    #[concordium_test]
    /// Test that with no bids the batch goes back to the controller,
    /// unblocking teardown.
    fn test_claim_asset_reclaims_to_controller_without_bids() {
        let mut host = started_host();
        mock_escrow_balance(&mut host, 10);
        mock_delivery(&mut host, ACCOUNT_0, 10);
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        ctx.set_self_address(SELF_ADDRESS);
        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        res.expect("Reclaiming the asset should pass");
        claim_eq!(
            host.state().auction.auction_state,
            AuctionState::Sold(ACCOUNT_0)
        );
        claim_eq!(host.state().auction.ensure_teardown_allowed(), Ok(()));
    }

    #[concordium_test]
    fn test_claim_asset_respects_deadline() {
        let mut host = started_host();
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END);
        ctx.set_self_address(SELF_ADDRESS);
        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionStillActive.into(),
            "Claiming the asset before the deadline should fail",
        );
    }

    #[concordium_test]
    /// Test that teardown sweeps the remaining balance and bricks the escrow.
    fn test_teardown_sweeps_balance() {
        let mut host = TestHost::new(
            State::new(SettlementPolicy::AfterDeadline),
            TestStateBuilder::new(),
        );
        host.set_self_balance(Amount::from_micro_ccd(40));
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        let res: ContractResult<()> = teardown(&ctx, &mut host, &mut logger);
        res.expect("Teardown should pass");
        claim!(host.transfer_occurred(&ACCOUNT_0, Amount::from_micro_ccd(40)));
        claim_eq!(host.state().auction.auction_state, AuctionState::Dismantled);

        // A dismantled escrow takes no further calls.
        let bid_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> =
            bid(&bid_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        expect_error(
            res,
            CustomContractError::EscrowDismantled.into(),
            "Bidding into a dismantled escrow should fail",
        );
        let res: ContractResult<()> = teardown(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::EscrowDismantled.into(),
            "Tearing down twice should fail",
        );
    }

    #[concordium_test]
    fn test_teardown_requires_controller() {
        let mut host = TestHost::new(
            State::new(SettlementPolicy::AfterDeadline),
            TestStateBuilder::new(),
        );
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 0);
        let res: ContractResult<()> = teardown(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::Unauthorized.into(),
            "Teardown should fail for anyone but the controller",
        );
    }

    #[concordium_test]
    fn test_teardown_blocked_while_escrowed() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, AUCTION_END + 1);
        let res: ContractResult<()> = teardown(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AssetStillEscrowed.into(),
            "Teardown should fail while the batch is in escrow",
        );
    }

    #[concordium_test]
    fn test_view() {
        let host = started_host();
        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);

        let auction = view(&ctx, &host).expect("Viewing should pass");
        claim_eq!(auction.auction_state, AuctionState::NotSoldYet);
        claim_eq!(auction.asset, Some(token_0()));
        claim_eq!(auction.deadline, Some(Timestamp::from_timestamp_millis(AUCTION_END)));
        claim_eq!(auction.highest_bid, Amount::from_micro_ccd(100));
    }

    #[concordium_test]
    /// Test the full lifecycle: deposit at price 100 for 1000 ms, a bid of
    /// 150, an undercutting 120 rejected, an outbidding 200 with the 150
    /// refunded, settlement of proceeds and asset, then teardown.
    fn test_full_auction_scenario() {
        let mut host = started_host();
        host.set_self_balance(Amount::from_micro_ccd(350));
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);

        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("Alice's bid should pass");

        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(120), &mut logger);
        expect_error(
            res,
            CustomContractError::BidTooLow.into(),
            "An undercutting bid should fail",
        );

        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's outbid should pass");
        claim!(host.transfer_occurred(&ACCOUNT_1, Amount::from_micro_ccd(150)));

        // The window closes at 1000.
        let late_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END);
        let res: ContractResult<()> =
            bid(&late_ctx, &mut host, Amount::from_micro_ccd(400), &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionFinished.into(),
            "Bidding at the deadline should fail",
        );

        let settle_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        let res: ContractResult<()> = claim_proceeds(&settle_ctx, &mut host, &mut logger);
        res.expect("Claiming proceeds should pass");
        claim!(host.transfer_occurred(&ACCOUNT_0, Amount::from_micro_ccd(200)));

        mock_escrow_balance(&mut host, 10);
        mock_delivery(&mut host, ACCOUNT_2, 10);
        let mut claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        claim_ctx.set_self_address(SELF_ADDRESS);
        let res: ContractResult<()> = claim_asset(&claim_ctx, &mut host, &mut logger);
        res.expect("Claiming the asset should pass");
        claim_eq!(
            host.state().auction.auction_state,
            AuctionState::Sold(ACCOUNT_2)
        );

        let owner_ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, AUCTION_END + 2);
        let res: ContractResult<()> = teardown(&owner_ctx, &mut host, &mut logger);
        res.expect("Teardown should pass");
        claim_eq!(host.state().auction.auction_state, AuctionState::Dismantled);
    }
}
