use super::*;

/// Initialize the escrow auction.
///
/// The account instantiating the contract becomes the controller. Nothing can
/// be bid on until the controller binds a token and deposits the batch.
#[init(contract = "EscrowAuctionClaims", parameter = "InitParameter")]
fn init<S: HasStateApi>(
    ctx: &impl HasInitContext,
    state_builder: &mut StateBuilder<S>,
) -> InitResult<State<S>> {
    let params: InitParameter = ctx.parameter_cursor().get()?;
    Ok(State::new(state_builder, params.settlement))
}

/// Bind the token this escrow is going to auction.
///
/// Queries the token contract for the escrow's own balance, so binding to an
/// address that does not answer `balanceOf` is rejected. Controller only, at
/// most once.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "bindAsset",
    parameter = "Token",
    mutable,
    enable_logger
)]
fn bind_asset<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
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
    contract = "EscrowAuctionClaims",
    name = "startAuction",
    parameter = "DepositParams",
    mutable,
    enable_logger
)]
fn start_auction<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
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

/// Enroll the calling account in the claim ledger.
///
/// Required once before the account's first bid. Enrolling again is a no-op
/// and never touches an existing balance.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "enroll",
    mutable,
    enable_logger
)]
fn enroll<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let account = if let Address::Account(account) = ctx.sender() {
        account
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    host.state().auction.ensure_not_dismantled()?;

    if host.state_mut().enroll(account) {
        logger.log(&AuctionEvent::Enroll(EnrollEvent { account }))?;
    }

    Ok(())
}

/// Receive function for enrolled accounts to place a bid.
///
/// The payment is held in escrow and has to exceed the standing bid on its
/// own; earlier payments by the same bidder do not stack toward it. The full
/// payment is credited to the bidder's ledger entry, and no refund is pushed
/// anywhere, so a bid never depends on another party being able to receive
/// funds.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "bid",
    payable,
    mutable,
    enable_logger
)]
fn bid<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
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

    let state = host.state_mut();
    state.credit(&bidder, amount)?;
    state.auction.highest_bid = amount;
    state.auction.highest_bidder = Some(bidder);

    logger.log(&AuctionEvent::Bid(BidEvent { bidder, amount }))?;

    Ok(())
}

/// Withdraw the calling account's ledger credit.
///
/// Pays out the caller's full claimable balance, except that a caller who
/// holds the standing bid keeps exactly that amount withheld in escrow.
/// Callable at any time before teardown; repeat calls pay out whatever
/// accumulated since, which is zero unless the caller bid again.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "claimBids",
    mutable,
    enable_logger
)]
fn claim_bids<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let account = if let Address::Account(account) = ctx.sender() {
        account
    } else {
        bail!(CustomContractError::OnlyAccountAddress.into());
    };

    host.state().auction.ensure_not_dismantled()?;

    let payout = host.state_mut().release_claim(&account)?;
    if payout != Amount::zero() {
        host.invoke_transfer(&account, payout)?;
    }

    logger.log(&AuctionEvent::RefundClaim(RefundClaimEvent {
        account,
        amount: payout,
    }))?;

    Ok(())
}

/// Pay the winning bid out to the controller.
///
/// Callable by anyone once a bid is standing and the settlement policy allows
/// it. Pays out exactly once; repeat calls are rejected.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "claimProceeds",
    mutable,
    enable_logger
)]
fn claim_proceeds<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
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
/// Callable by anyone, but only strictly after the deadline. The full holding
/// of the escrow is swept to the winner, or back to the controller if nobody
/// bid. Finalizes the auction; repeat calls are rejected.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "claimAsset",
    mutable,
    enable_logger
)]
fn claim_asset<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
    logger: &mut impl HasLogger,
) -> ContractResult<()> {
    let slot_time = ctx.metadata().slot_time();
    let self_address = Address::Contract(ctx.self_address());

    let auction = &host.state().auction;
    auction.ensure_live()?;
    // The batch only ever leaves once bidding is over, regardless of the
    // settlement policy for the proceeds.
    let deadline = auction.bidding_deadline()?;
    ensure!(
        slot_time > deadline,
        CustomContractError::AuctionStillActive.into()
    );
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
/// starting deposit arrived, or after the batch has been delivered. Unclaimed
/// ledger credit is swept along with the rest; a dismantled escrow takes no
/// further calls.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "teardown",
    mutable,
    enable_logger
)]
fn teardown<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &mut impl HasHost<State<S>, StateApiType = S>,
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
    contract = "EscrowAuctionClaims",
    name = "view",
    return_value = "Auction"
)]
fn view<S: HasStateApi>(
    _ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Auction> {
    Ok(host.state().auction.clone())
}

/// View an account's ledger entry: the credited amount for enrolled
/// accounts, `None` for strangers.
#[receive(
    contract = "EscrowAuctionClaims",
    name = "viewClaim",
    parameter = "AccountAddress",
    return_value = "Option<Amount>"
)]
fn view_claim<S: HasStateApi>(
    ctx: &impl HasReceiveContext,
    host: &impl HasHost<State<S>, StateApiType = S>,
) -> ContractResult<Option<Amount>> {
    let account: AccountAddress = ctx.parameter_cursor().get()?;
    Ok(host.state().claimable(&account))
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

    /// Price 100, deposit of 10 units, deadline at AUCTION_END.
    fn started_state(state_builder: &mut TestStateBuilder) -> State<TestStateApi> {
        let mut state = State::new(state_builder, SettlementPolicy::AfterDeadline);
        state
            .auction
            .bind_asset(token_0())
            .expect("Binding should pass");
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

    fn started_host() -> TestHost<State<TestStateApi>> {
        let mut state_builder = TestStateBuilder::new();
        let state = started_state(&mut state_builder);
        TestHost::new(state, state_builder)
    }

    /// Started auction with ACCOUNT_1 and ACCOUNT_2 already enrolled.
    fn enrolled_host() -> TestHost<State<TestStateApi>> {
        let mut host = started_host();
        host.state_mut().enroll(ACCOUNT_1);
        host.state_mut().enroll(ACCOUNT_2);
        host
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

    fn mock_escrow_balance(host: &mut TestHost<State<TestStateApi>>, balance: u64) {
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

    fn mock_delivery(
        host: &mut TestHost<State<TestStateApi>>,
        recipient: AccountAddress,
        amount: u64,
    ) {
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
    /// Test that initialization leaves an empty escrow with an empty claim
    /// ledger.
    fn test_init() {
        let parameter_bytes = to_bytes(&InitParameter {
            settlement: SettlementPolicy::AfterDeadline,
        });
        let mut ctx = TestInitContext::empty();
        ctx.set_parameter(&parameter_bytes);
        let mut state_builder = TestStateBuilder::new();

        let state = init(&ctx, &mut state_builder).expect("Initialization should pass");
        claim_eq!(state.auction.auction_state, AuctionState::NotSoldYet);
        claim_eq!(state.auction.asset, None);
        claim_eq!(state.auction.deadline, None);
        claim_eq!(state.claimable(&ACCOUNT_1), None);
    }

    #[concordium_test]
    /// Test that binding probes the token contract and that only the
    /// controller may bind, then that the starting deposit opens bidding.
    fn test_bind_and_start() {
        let mut host = {
            let mut state_builder = TestStateBuilder::new();
            let state = State::new(&mut state_builder, SettlementPolicy::AfterDeadline);
            TestHost::new(state, state_builder)
        };
        mock_escrow_balance(&mut host, 0);
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&token_0());
        let mut bind_ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        bind_ctx.set_self_address(SELF_ADDRESS);
        bind_ctx.set_parameter(&parameter_bytes);
        let res: ContractResult<()> = bind_asset(&bind_ctx, &mut host, &mut logger);
        res.expect("Binding should pass");
        claim_eq!(host.state().auction.asset, Some(token_0()));

        let parameter_bytes = to_bytes(&deposit_params(
            Address::Account(ACCOUNT_0),
            token_0().id,
            10,
        ));
        let mut start_ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        start_ctx.set_sender(Address::Contract(TOKEN_CONTRACT));
        start_ctx.set_parameter(&parameter_bytes);
        let res: ContractResult<()> = start_auction(&start_ctx, &mut host, &mut logger);
        res.expect("Starting should pass");
        claim_eq!(
            host.state().auction.deadline,
            Some(Timestamp::from_timestamp_millis(AUCTION_END))
        );
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(100));
    }

    #[concordium_test]
    fn test_bind_requires_controller() {
        let mut host = {
            let mut state_builder = TestStateBuilder::new();
            let state = State::new(&mut state_builder, SettlementPolicy::AfterDeadline);
            TestHost::new(state, state_builder)
        };
        let mut logger = TestLogger::init();

        let parameter_bytes = to_bytes(&token_0());
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 0);
        ctx.set_self_address(SELF_ADDRESS);
        ctx.set_parameter(&parameter_bytes);
        let res: ContractResult<()> = bind_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::Unauthorized.into(),
            "Binding should fail for anyone but the controller",
        );
    }

    #[concordium_test]
    /// Test that enrollment creates a zeroed ledger entry, logs once, and
    /// that re-enrolling neither fails nor resets the balance.
    fn test_enroll() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> = enroll(&ctx, &mut host, &mut logger);
        res.expect("Enrolling should pass");
        claim_eq!(host.state().claimable(&ACCOUNT_1), Some(Amount::zero()));
        claim_eq!(logger.logs.len(), 1);
        claim_eq!(logger.logs[0][0], ENROLL_EVENT_TAG);

        // Give the entry some credit, then enroll again.
        host.state_mut()
            .credit(&ACCOUNT_1, Amount::from_micro_ccd(70))
            .expect("Crediting should pass");
        let res: ContractResult<()> = enroll(&ctx, &mut host, &mut logger);
        res.expect("Re-enrolling should pass");
        claim_eq!(
            host.state().claimable(&ACCOUNT_1),
            Some(Amount::from_micro_ccd(70))
        );
        claim_eq!(logger.logs.len(), 1);
    }

    #[concordium_test]
    fn test_enroll_requires_account_sender() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        ctx.set_sender(Address::Contract(TOKEN_CONTRACT));
        let res: ContractResult<()> = enroll(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::OnlyAccountAddress.into(),
            "Enrolling a contract should fail",
        );
    }

    #[concordium_test]
    fn test_bid_requires_enrollment() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> =
            bid(&ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        expect_error(
            res,
            CustomContractError::NotEnrolled.into(),
            "Bidding without enrollment should fail",
        );
    }

    #[concordium_test]
    /// Test that accepted payments accumulate in the ledger while the
    /// standing bid tracks the latest payment, and that no refund transfer
    /// is ever pushed. The escrow balance is left at zero throughout, so any
    /// attempted outgoing transfer would fail the bid.
    fn test_bid_accumulates_claims() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);

        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("Alice's bid should pass");
        claim_eq!(
            host.state().claimable(&ACCOUNT_1),
            Some(Amount::from_micro_ccd(150))
        );

        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's bid should pass despite Alice's pending refund");
        claim_eq!(
            host.state().claimable(&ACCOUNT_2),
            Some(Amount::from_micro_ccd(200))
        );
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(200));

        // Alice tops Bob; her ledger entry now holds both payments.
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(250), &mut logger);
        res.expect("Alice's second bid should pass");
        claim_eq!(
            host.state().claimable(&ACCOUNT_1),
            Some(Amount::from_micro_ccd(400))
        );
        claim_eq!(host.state().auction.highest_bid, Amount::from_micro_ccd(250));
        claim_eq!(host.state().auction.highest_bidder, Some(ACCOUNT_1));
    }

    #[concordium_test]
    /// Test that every payment has to top the standing bid on its own:
    /// accumulated credit does not stack toward the threshold.
    fn test_bid_payment_must_top_standing_bid() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);

        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's bid should pass");
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(250), &mut logger);
        res.expect("Alice's bid should pass");

        // Bob's 200 in credit plus 60 would exceed 250, but the payment
        // alone does not.
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(60), &mut logger);
        expect_error(
            res,
            CustomContractError::BidTooLow.into(),
            "A payment below the standing bid should fail",
        );
        claim_eq!(
            host.state().claimable(&ACCOUNT_2),
            Some(Amount::from_micro_ccd(200))
        );
    }

    #[concordium_test]
    fn test_bid_after_deadline_fails() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

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
    /// Test that an outbid participant can withdraw while bidding is still
    /// open.
    fn test_outbid_credit_claimable_immediately() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("Alice's bid should pass");
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's bid should pass");

        host.set_self_balance(Amount::from_micro_ccd(350));
        let claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 30);
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        res.expect("Claiming should pass");
        claim!(host.transfer_occurred(&ACCOUNT_1, Amount::from_micro_ccd(150)));
        claim_eq!(host.state().claimable(&ACCOUNT_1), Some(Amount::zero()));
    }

    #[concordium_test]
    /// Test that the standing bid stays withheld: the leader only receives
    /// the excess over the bid, and the entry stays pinned at the bid.
    fn test_claim_bids_withholds_standing_bid() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(120), &mut logger);
        res.expect("Bob's first bid should pass");
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("Alice's bid should pass");
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's second bid should pass");

        // Bob holds 320 in credit with 200 committed as the standing bid.
        host.set_self_balance(Amount::from_micro_ccd(470));
        let claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 30);
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        res.expect("Claiming should pass");
        claim!(host.transfer_occurred(&ACCOUNT_2, Amount::from_micro_ccd(120)));
        claim_eq!(
            host.state().claimable(&ACCOUNT_2),
            Some(Amount::from_micro_ccd(200))
        );

        // Nothing further accumulates, so a repeat claim releases zero.
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        res.expect("Repeat claiming should pass");
        claim_eq!(
            host.state().claimable(&ACCOUNT_2),
            Some(Amount::from_micro_ccd(200))
        );
    }

    #[concordium_test]
    fn test_claim_bids_requires_enrollment() {
        let mut host = started_host();
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 30);
        let res: ContractResult<()> = claim_bids(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::NotEnrolled.into(),
            "Claiming without enrollment should fail",
        );
    }

    #[concordium_test]
    fn test_claim_bids_repeat_pays_zero() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("Alice's bid should pass");
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's bid should pass");

        host.set_self_balance(Amount::from_micro_ccd(150));
        let claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 30);
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        res.expect("Claiming should pass");
        claim_eq!(host.state().claimable(&ACCOUNT_1), Some(Amount::zero()));

        // The second claim has nothing to transfer and needs no balance.
        host.set_self_balance(Amount::zero());
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        res.expect("Repeat claiming should pass");
        claim_eq!(host.state().claimable(&ACCOUNT_1), Some(Amount::zero()));
    }

    #[concordium_test]
    /// Test invariant: the ledger total equals everything deposited minus
    /// everything withdrawn.
    fn test_ledger_backs_escrow_balance() {
        let mut host = enrolled_host();
        let mut logger = TestLogger::init();

        let alice_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let bob_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, 20);
        let res: ContractResult<()> =
            bid(&alice_ctx, &mut host, Amount::from_micro_ccd(150), &mut logger);
        res.expect("Alice's bid should pass");
        let res: ContractResult<()> =
            bid(&bob_ctx, &mut host, Amount::from_micro_ccd(200), &mut logger);
        res.expect("Bob's bid should pass");

        let total = host
            .state()
            .claims
            .iter()
            .fold(Amount::zero(), |acc, (_, claim)| acc + *claim);
        claim_eq!(total, Amount::from_micro_ccd(350));

        host.set_self_balance(Amount::from_micro_ccd(350));
        let claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 30);
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        res.expect("Claiming should pass");

        let total = host
            .state()
            .claims
            .iter()
            .fold(Amount::zero(), |acc, (_, claim)| acc + *claim);
        claim_eq!(total, Amount::from_micro_ccd(200));
    }

    #[concordium_test]
    /// Test that the batch stays put until strictly after the deadline, even
    /// under the relaxed settlement policy.
    fn test_claim_asset_requires_deadline_passed() {
        let mut host = enrolled_host();
        host.state_mut().auction.settlement = SettlementPolicy::Anytime;
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        let mut logger = TestLogger::init();

        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END);
        ctx.set_self_address(SELF_ADDRESS);
        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionStillActive.into(),
            "Claiming the asset before the deadline passed should fail",
        );
    }

    #[concordium_test]
    /// Test that the escrowed batch is delivered to the winner exactly once.
    fn test_claim_asset_delivers_to_winner() {
        let mut host = enrolled_host();
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

        let res: ContractResult<()> = claim_asset(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::AuctionFinalized.into(),
            "Claiming the asset a second time should fail",
        );
    }

    #[concordium_test]
    /// Test that the proceeds go to the controller exactly once.
    fn test_claim_proceeds_pays_controller_once() {
        let mut host = enrolled_host();
        host.state_mut().auction.highest_bid = Amount::from_micro_ccd(300);
        host.state_mut().auction.highest_bidder = Some(ACCOUNT_2);
        host.set_self_balance(Amount::from_micro_ccd(300));
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        res.expect("Claiming proceeds should pass");
        claim!(host.transfer_occurred(&ACCOUNT_0, Amount::from_micro_ccd(300)));

        let res: ContractResult<()> = claim_proceeds(&ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::ProceedsAlreadyClaimed.into(),
            "Claiming proceeds a second time should fail",
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
    /// Test that teardown closes the claim window: remaining credit is swept
    /// to the controller and later claims are rejected.
    fn test_teardown_confiscates_unclaimed_credit() {
        let mut host = {
            let mut state_builder = TestStateBuilder::new();
            let state = State::new(&mut state_builder, SettlementPolicy::AfterDeadline);
            TestHost::new(state, state_builder)
        };
        host.state_mut().enroll(ACCOUNT_1);
        host.state_mut()
            .credit(&ACCOUNT_1, Amount::from_micro_ccd(90))
            .expect("Crediting should pass");
        host.set_self_balance(Amount::from_micro_ccd(90));
        let mut logger = TestLogger::init();

        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, 0);
        let res: ContractResult<()> = teardown(&ctx, &mut host, &mut logger);
        res.expect("Teardown should pass");
        claim!(host.transfer_occurred(&ACCOUNT_0, Amount::from_micro_ccd(90)));
        claim_eq!(host.state().auction.auction_state, AuctionState::Dismantled);

        let claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        let res: ContractResult<()> = claim_bids(&claim_ctx, &mut host, &mut logger);
        expect_error(
            res,
            CustomContractError::EscrowDismantled.into(),
            "Claiming from a dismantled escrow should fail",
        );
    }

    #[concordium_test]
    fn test_view_claim() {
        let host = enrolled_host();
        let parameter_bytes = to_bytes(&ACCOUNT_1);
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        ctx.set_parameter(&parameter_bytes);

        let entry = view_claim(&ctx, &host).expect("Viewing should pass");
        claim_eq!(entry, Some(Amount::zero()));

        let parameter_bytes = to_bytes(&AccountAddress([9u8; 32]));
        let mut ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);
        ctx.set_parameter(&parameter_bytes);
        let entry = view_claim(&ctx, &host).expect("Viewing should pass");
        claim_eq!(entry, None);
    }

    #[concordium_test]
    fn test_view() {
        let host = started_host();
        let ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, 10);

        let auction = view(&ctx, &host).expect("Viewing should pass");
        claim_eq!(auction.auction_state, AuctionState::NotSoldYet);
        claim_eq!(auction.asset, Some(token_0()));
        claim_eq!(
            auction.deadline,
            Some(Timestamp::from_timestamp_millis(AUCTION_END))
        );
    }

    #[concordium_test]
    /// Test the full lifecycle: deposit at price 100 for 1000 ms, Alice bids
    /// 150, Bob's 120 is rejected, Bob's 200 wins. After the deadline the
    /// batch goes to Bob, the proceeds to the controller, Alice withdraws
    /// her 150 and Bob's pinned 200 releases nothing.
    fn test_full_auction_scenario() {
        let mut host = enrolled_host();
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
        res.expect("Bob's bid should pass");
        claim_eq!(
            host.state().claimable(&ACCOUNT_1),
            Some(Amount::from_micro_ccd(150))
        );

        host.set_self_balance(Amount::from_micro_ccd(350));

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

        let settle_ctx = new_ctx(ACCOUNT_0, ACCOUNT_1, AUCTION_END + 1);
        let res: ContractResult<()> = claim_proceeds(&settle_ctx, &mut host, &mut logger);
        res.expect("Claiming proceeds should pass");
        claim!(host.transfer_occurred(&ACCOUNT_0, Amount::from_micro_ccd(200)));

        let res: ContractResult<()> = claim_bids(&settle_ctx, &mut host, &mut logger);
        res.expect("Alice's withdrawal should pass");
        claim!(host.transfer_occurred(&ACCOUNT_1, Amount::from_micro_ccd(150)));
        claim_eq!(host.state().claimable(&ACCOUNT_1), Some(Amount::zero()));

        let bob_claim_ctx = new_ctx(ACCOUNT_0, ACCOUNT_2, AUCTION_END + 2);
        let res: ContractResult<()> = claim_bids(&bob_claim_ctx, &mut host, &mut logger);
        res.expect("Bob's claim should pass with nothing released");
        claim_eq!(
            host.state().claimable(&ACCOUNT_2),
            Some(Amount::from_micro_ccd(200))
        );

        let owner_ctx = new_ctx(ACCOUNT_0, ACCOUNT_0, AUCTION_END + 3);
        let res: ContractResult<()> = teardown(&owner_ctx, &mut host, &mut logger);
        res.expect("Teardown should pass");
        claim_eq!(host.state().auction.auction_state, AuctionState::Dismantled);
    }
}
