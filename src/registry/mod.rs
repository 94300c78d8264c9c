//! Token registry: the comma-separated table mapping (source chain, symbol)
//! to per-chain contract and mint addresses.
//!
//! - `table`: parsed rows and the derived routing queries
//! - `column`: address column header interpretation
//! - `fetch`: fail-soft HTTP retrieval

mod column;
mod fetch;
mod table;

pub use column::*;
pub use fetch::*;
pub use table::*;
