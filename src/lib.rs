//! Solfolio - Position & Order Ledger for Solana wallet trading
//!
//! Tracks per-wallet token positions with weighted-average cost accounting,
//! values them against live market prices, and evaluates standing limit
//! orders for automatic execution.
//!
//! # Modules
//!
//! - `domain`: Core types and accounting math (Holding, LimitOrder, Settings)
//! - `ports`: Trait abstractions (WalletCustody, PriceFeed, LedgerStore)
//! - `adapters`: External implementations (Jupiter, CoinGecko, in-memory, CLI)
//! - `application`: PriceResolver, PositionLedger, OrderBook, LedgerFacade
//! - `config`: Configuration loading and validation

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
