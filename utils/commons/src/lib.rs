//! Shared building blocks for the escrow auction contracts: error taxonomy,
//! common types, the auction state component and the CIS-2 asset client.
#![cfg_attr(not(feature = "std"), no_std)]
pub use crate::{asset::*, auction::*, constants::*, errors::*, structs::*, types::*};
use concordium_cis2::*;
use concordium_std::*;

pub mod test;

mod asset;
mod auction;
mod constants;
mod errors;
mod structs;
mod types;
