//! CoinGecko Adapter
//!
//! Market data client for trending lists, market listings and coin detail.

pub mod client;
pub mod types;


pub use client::{api_client_config, CoinGeckoClient, CoinGeckoConfig, DEFAULT_COINGECKO_URL};
pub use types::{
    decode_coin, decode_markets, decode_new_listings, decode_trending, CoinDetail, ListingPage,
    COIN_SCHEMA, MARKETS_SCHEMA, NEW_LISTINGS_SCHEMA, TRENDING_SCHEMA,
};
