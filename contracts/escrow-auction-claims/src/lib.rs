//! Escrow auction with deferred refunds.
//!
//! The contract custodies one batch of a CIS-2 token and sells it to the
//! highest bidder. Instead of paying an outbid participant back within the
//! bid call, every payment is credited to the payer's entry in a claim
//! ledger, to be withdrawn on demand. A bid therefore never depends on
//! another party being able to receive funds. Participants enroll in the
//! ledger once before their first bid.
#![cfg_attr(not(feature = "std"), no_std)]
use crate::{events::*, structs::*};
use commons::*;
use concordium_cis2::*;
use concordium_std::*;

mod contract;
mod events;
mod impls;
mod structs;
