/// Published Wormhole token list, one row per (source chain, symbol).
pub const DEFAULT_REGISTRY_URL: &str = "https://raw.githubusercontent.com/wormhole-foundation/wormhole-token-list/refs/heads/main/content/by_source.csv";

/// Header suffix marking an address column.
pub const ADDRESS_SUFFIX: &str = "Address";

/// Target name that resolves to the row's own source chain.
pub const SOURCE_TARGET: &str = "source";

/// Key of the synthetic aggregate entry.
pub const TOTAL_KEY: &str = "total";

/// SPL token program.
pub const SPL_TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// Size in bytes of an SPL token account.
pub const SPL_TOKEN_ACCOUNT_SIZE: u64 = 165;

/// Offset of the owner pubkey inside an SPL token account.
pub const SPL_TOKEN_OWNER_OFFSET: u64 = 32;

pub const SOLANA_MAINNET_URL: &str = "https://api.mainnet-beta.solana.com";

/// Default EVM JSON-RPC endpoints, keyed by chain identifier.
pub const DEFAULT_EVM_ENDPOINTS: &[(&str, &str)] = &[
    ("eth", "https://rpc.ankr.com/eth"),
    ("avax", "https://api.avax.network/ext/bc/C/rpc"),
    ("ftm", "https://rpc.ftm.tools"),
    ("matic", "https://polygon-rpc.com"),
    ("oasis", "https://emerald.oasis.dev"),
    ("bsc", "https://bsc-dataseed.binance.org"),
    ("aurora", "https://mainnet.aurora.dev"),
    ("celo", "https://forno.celo.org"),
    ("moonbeam", "https://rpc.api.moonbeam.network"),
];

/// Default bridge custody accounts, keyed by source chain identifier.
pub const DEFAULT_HOLDERS: &[(&str, &str)] = &[("eth", "0x3ee18B2214AFF97000D974cf647E7C347E8fa585")];

/// Native denominations whose precision is known without a query.
pub const KNOWN_NATIVE_DECIMALS: &[(&str, u8)] = &[("uusd", 6), ("uluna", 6)];
