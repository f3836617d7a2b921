/// Tag for the Custom Bind event.
pub const BIND_EVENT_TAG: u8 = u8::MAX - 10;

/// Tag for the Custom Start event.
pub const START_EVENT_TAG: u8 = u8::MAX - 11;

/// Tag for the Custom Bid event.
pub const BID_EVENT_TAG: u8 = u8::MAX - 12;

/// Tag for the Custom Enroll event.
pub const ENROLL_EVENT_TAG: u8 = u8::MAX - 13;

/// Tag for the Custom Refund Claim event.
pub const REFUND_CLAIM_EVENT_TAG: u8 = u8::MAX - 14;

/// Tag for the Custom Proceeds Claim event.
pub const PROCEEDS_CLAIM_EVENT_TAG: u8 = u8::MAX - 15;

/// Tag for the Custom Asset Claim event.
pub const ASSET_CLAIM_EVENT_TAG: u8 = u8::MAX - 16;

/// Tag for the Custom Teardown event.
pub const TEARDOWN_EVENT_TAG: u8 = u8::MAX - 17;
