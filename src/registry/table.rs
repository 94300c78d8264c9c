use indexmap::IndexSet;

use super::column::{is_address_header, AddressColumn};

/// Column holding the source chain identifier.
pub const SOURCE_CHAIN_COLUMN: usize = 0;
/// Column holding the token symbol.
pub const SYMBOL_COLUMN: usize = 1;

/// Parsed registry. Row 0 is the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryTable {
    rows: Vec<Vec<String>>,
}

impl RegistryTable {
    /// Split raw text into rows on line boundaries and cells on commas.
    ///
    /// There is no quoting: the registry never embeds commas in cells.
    pub fn parse(raw: &str) -> Self {
        let rows = raw
            .lines()
            .map(|line| line.split(',').map(str::to_string).collect())
            .collect();
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self) -> &[String] {
        self.rows.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn data_rows(&self) -> &[Vec<String>] {
        self.rows.get(1..).unwrap_or(&[])
    }

    /// Cell text, or "" when the row is too short.
    pub fn cell(row: &[String], index: usize) -> &str {
        row.get(index).map(String::as_str).unwrap_or("")
    }

    /// Indices of header cells containing "address", in column order.
    pub fn address_column_indices(&self) -> Vec<usize> {
        self.header()
            .iter()
            .enumerate()
            .filter(|(_, cell)| is_address_header(cell))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn address_columns(&self) -> Vec<AddressColumn> {
        let header = self.header();
        self.address_column_indices()
            .into_iter()
            .map(|index| AddressColumn::from_header(index, &header[index]))
            .collect()
    }

    /// Every distinct non-empty source chain in the registry, first seen first.
    pub fn source_chain_identifiers(&self) -> IndexSet<String> {
        self.data_rows()
            .iter()
            .map(|row| Self::cell(row, SOURCE_CHAIN_COLUMN))
            .filter(|chain| !chain.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Source chains of the rows listing `symbol` (exact, case-sensitive).
    pub fn symbol_source_chain(&self, symbol: &str) -> IndexSet<String> {
        self.rows_for_symbol(symbol)
            .map(|row| Self::cell(row, SOURCE_CHAIN_COLUMN))
            .filter(|chain| !chain.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn rows_for_symbol<'a>(&'a self, symbol: &'a str) -> impl Iterator<Item = &'a Vec<String>> {
        self.data_rows()
            .iter()
            .filter(move |row| Self::cell(row, SYMBOL_COLUMN) == symbol)
    }

    /// Distinct symbols in row order, optionally only those bridged from
    /// `source_chain`.
    pub fn symbols(&self, source_chain: Option<&str>) -> Vec<String> {
        let symbols: IndexSet<String> = self
            .data_rows()
            .iter()
            .filter(|row| source_chain.map_or(true, |chain| Self::cell(row, SOURCE_CHAIN_COLUMN) == chain))
            .map(|row| Self::cell(row, SYMBOL_COLUMN))
            .filter(|symbol| !symbol.is_empty())
            .map(str::to_string)
            .collect();
        symbols.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ColumnTarget;

    const REGISTRY: &str = "\
source,symbol,name,ethAddress,solAddress,sourceAddress
eth,ABC,Alpha,0xTokenA,MintB,0xHolderA
sol,XYZ,Zeta,0xWrapped,,MintX
eth,DEF,Delta,,MintD,0xTokenD
bsc,ABC,Alpha BSC
";

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn test_parse_rows_and_cells() {
        let table = RegistryTable::parse(REGISTRY);
        assert_eq!(table.rows().len(), 5);
        assert_eq!(table.header()[4], "solAddress");
        assert_eq!(table.data_rows()[0][1], "ABC");
    }

    #[test]
    fn test_parse_crlf() {
        let table = RegistryTable::parse("a,bAddress\r\neth,ABC\r\n");
        assert_eq!(table.header(), ["a".to_string(), "bAddress".to_string()]);
        assert_eq!(table.data_rows()[0], vec!["eth".to_string(), "ABC".to_string()]);
    }

    #[test]
    fn test_parse_empty() {
        let table = RegistryTable::parse("");
        assert!(table.is_empty());
        assert!(table.header().is_empty());
        assert!(table.data_rows().is_empty());
        assert!(table.address_column_indices().is_empty());
        assert!(table.source_chain_identifiers().is_empty());
    }

    #[test]
    fn test_short_row_reads_empty() {
        let table = RegistryTable::parse(REGISTRY);
        let short = &table.data_rows()[3];
        assert_eq!(RegistryTable::cell(short, 3), "");
        assert_eq!(RegistryTable::cell(short, 99), "");
    }

    // =========================================================================
    // Derived queries
    // =========================================================================

    #[test]
    fn test_address_column_indices() {
        let table = RegistryTable::parse(REGISTRY);
        assert_eq!(table.address_column_indices(), vec![3, 4, 5]);
        // Stable across calls
        assert_eq!(table.address_column_indices(), table.address_column_indices());
    }

    #[test]
    fn test_address_column_indices_case_insensitive() {
        let table = RegistryTable::parse("x,y,ETHADDRESS,notes,Sol address\n");
        assert_eq!(table.address_column_indices(), vec![2, 4]);
    }

    #[test]
    fn test_address_columns_targets() {
        let table = RegistryTable::parse(REGISTRY);
        let columns = table.address_columns();
        assert_eq!(columns[0].target, ColumnTarget::Chain("eth".into()));
        assert_eq!(columns[1].target, ColumnTarget::Chain("sol".into()));
        assert_eq!(columns[2].target, ColumnTarget::Source);
    }

    #[test]
    fn test_source_chain_identifiers_distinct_ordered() {
        let table = RegistryTable::parse(REGISTRY);
        let chains: Vec<_> = table.source_chain_identifiers().into_iter().collect();
        assert_eq!(chains, vec!["eth", "sol", "bsc"]);
    }

    #[test]
    fn test_source_chain_identifiers_skip_empty() {
        let table = RegistryTable::parse("h0,h1\n,ABC\neth,DEF\n\n");
        let chains: Vec<_> = table.source_chain_identifiers().into_iter().collect();
        assert_eq!(chains, vec!["eth"]);
    }

    #[test]
    fn test_symbol_source_chain() {
        let table = RegistryTable::parse(REGISTRY);
        let chains: Vec<_> = table.symbol_source_chain("ABC").into_iter().collect();
        assert_eq!(chains, vec!["eth", "bsc"]);
        assert!(table.symbol_source_chain("abc").is_empty());
    }

    #[test]
    fn test_symbols_listing() {
        let table = RegistryTable::parse(REGISTRY);
        assert_eq!(table.symbols(None), vec!["ABC", "XYZ", "DEF"]);
        assert_eq!(table.symbols(Some("eth")), vec!["ABC", "DEF"]);
        assert!(table.symbols(Some("terra")).is_empty());
    }
}
