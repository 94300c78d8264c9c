use thiserror::Error;

/// HTTP error classification
#[derive(Error, Debug, Clone)]
pub enum HttpErrorKind {
    #[error("Client error: {message}")]
    Client { message: String },
    #[error("Server error: {message}")]
    Server { message: String },
}

/// Main crate error type.
///
/// Nothing here ever reaches the caller of a reconciliation: the dispatcher
/// converts every variant into a zero amount plus a logged outcome.
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// HTTP error with status code and classification
    #[error("HTTP error (status {status}): {kind}")]
    Http { status: u16, kind: HttpErrorKind },

    /// Generic request error (connect, TLS, body read)
    #[error("Generic request error: {0}")]
    GenericRequest(String),

    /// JSON parse error
    #[error("Json parse error: {0}")]
    JsonParse(String),

    /// JSON-RPC level error returned by a node
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// JSON-RPC response carried neither a result nor an error
    #[error("RPC response missing result")]
    RpcMissingResult,

    /// ABI return data could not be decoded
    #[error("ABI decode error: {0}")]
    AbiDecode(String),

    /// Raw amount could not be scaled into display units
    #[error("Amount scaling error: {0}")]
    Scaling(String),

    /// Address could not be parsed for the target chain
    #[error("Invalid address '{address}' for chain {chain}")]
    InvalidAddress { chain: String, address: String },

    /// One query attempt ran past its deadline
    #[error("Query timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),
}

// Convenience constructors for common error patterns
impl Error {
    /// Create an HTTP client error (4xx)
    pub fn client_error(status: u16, message: String) -> Self {
        Error::Http {
            status,
            kind: HttpErrorKind::Client { message },
        }
    }

    /// Create an HTTP server error (5xx)
    pub fn server_error(status: u16, message: String) -> Self {
        Error::Http {
            status,
            kind: HttpErrorKind::Server { message },
        }
    }

    pub fn json_parse(msg: impl Into<String>) -> Self {
        Error::JsonParse(msg.into())
    }

    pub fn abi_decode(msg: impl Into<String>) -> Self {
        Error::AbiDecode(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether a retry has any chance of a different outcome.
    ///
    /// Client errors, decode failures and bad addresses are deterministic.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http { status, kind } => {
                *status == 429 || matches!(kind, HttpErrorKind::Server { .. })
            }
            Error::GenericRequest(_) | Error::RpcMissingResult | Error::Timeout { .. } => true,
            // -32005 limit exceeded, -32603 internal error
            Error::Rpc { code, .. } => matches!(code, -32005 | -32603),
            _ => false,
        }
    }
}
