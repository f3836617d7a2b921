//! Escrow auction with synchronous refunds.
//!
//! The contract custodies one batch of a CIS-2 token and sells it to the
//! highest bidder. Every accepted bid pays the previously leading bid back to
//! its bidder in the same invocation, so the contract never holds more than
//! the standing bid in CCD.
#![cfg_attr(not(feature = "std"), no_std)]
use crate::{events::*, structs::*};
use commons::*;
use concordium_cis2::*;
use concordium_std::*;

mod contract;
mod events;
mod impls;
mod structs;
