//! BscScan Adapter
//!
//! Chain explorer client for BNB Smart Chain token transfers and balances.

pub mod client;
pub mod types;


pub use client::{
    api_client_config, BscScanClient, BscScanConfig, DEFAULT_BSCSCAN_URL, MAX_RESULT_WINDOW,
};
pub use types::{
    decode_balance, decode_block_number, decode_tokentx, TransferPage, BALANCE_SCHEMA,
    BLOCK_NUMBER_SCHEMA, TOKENTX_SCHEMA,
};
