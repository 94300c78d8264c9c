use tracing::warn;

use crate::consts::{ADDRESS_SUFFIX, SOURCE_TARGET};
use crate::logging::targets;

/// Where the addresses of one column live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnTarget {
    /// The row's own source chain (header `sourceAddress`).
    Source,
    /// A fixed destination chain named by the header.
    Chain(String),
}

/// An address-bearing column of the registry, interpreted from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressColumn {
    pub index: usize,
    pub header: String,
    pub target: ColumnTarget,
}

/// A column target resolved against a concrete row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub chain_id: String,
    /// True when the chain came from the row's column 0.
    pub is_source: bool,
}

impl AddressColumn {
    pub fn from_header(index: usize, header: &str) -> Self {
        let derived = derive_chain_id(header);
        let target = if derived == SOURCE_TARGET {
            ColumnTarget::Source
        } else {
            ColumnTarget::Chain(derived)
        };
        Self {
            index,
            header: header.to_string(),
            target,
        }
    }

    pub fn resolve(&self, row_source_chain: &str) -> ResolvedTarget {
        match &self.target {
            ColumnTarget::Source => ResolvedTarget {
                chain_id: row_source_chain.to_string(),
                is_source: true,
            },
            ColumnTarget::Chain(chain) => ResolvedTarget {
                chain_id: chain.clone(),
                is_source: false,
            },
        }
    }
}

/// Whether a header cell marks an address column.
pub fn is_address_header(header: &str) -> bool {
    header.to_lowercase().contains("address")
}

/// Recover the chain identifier from an address column header.
///
/// `ethAddress` becomes `eth`. Headers that do not end in the suffix still
/// lose their last seven characters, with a warning, so registries keep
/// routing the way they always have.
pub fn derive_chain_id(header: &str) -> String {
    let trimmed = header.trim();
    let suffix_len = ADDRESS_SUFFIX.len();
    let has_suffix = trimmed.len() >= suffix_len
        && trimmed.is_char_boundary(trimmed.len() - suffix_len)
        && trimmed[trimmed.len() - suffix_len..].eq_ignore_ascii_case(ADDRESS_SUFFIX);

    if has_suffix {
        return trimmed[..trimmed.len() - suffix_len].trim().to_string();
    }

    warn!(
        target: targets::REGISTRY,
        header = %header,
        "Address column header lacks the expected suffix, truncating"
    );
    let keep = trimmed.chars().count().saturating_sub(suffix_len);
    trimmed.chars().take(keep).collect::<String>().trim().to_string()
}
