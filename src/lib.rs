#![deny(unreachable_pub)]

// Core modules
pub mod consts;
mod errors;
mod prelude;
pub mod req;
pub mod retry;
pub mod rpc;
#[cfg(test)]
mod stub_server;

// Shared state and setup
pub mod cache;
pub mod config;
pub mod logging;

// Feature modules
pub mod adapters;
pub mod dispatcher;
pub mod engine;
pub mod registry;

// Re-exports
pub use adapters::{AdapterKind, ChainAdapter, EvmAdapter, NullAdapter, SolanaAdapter};
pub use cache::DecimalCache;
pub use config::{AuditConfig, ChainEndpoint, ChainKind, QueryConfig, RegistryConfig};
pub use consts::{DEFAULT_REGISTRY_URL, TOTAL_KEY};
pub use dispatcher::{AdapterDispatcher, AmountRecord, ChainQuery, QueryKind, QueryOutcome};
pub use engine::{ReconciliationPlan, ReconciliationResult, Reconciler};
pub use errors::{Error, HttpErrorKind};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use registry::{fetch_registry, RegistryTable};
pub use retry::RetryPolicy;
