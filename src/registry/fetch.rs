use reqwest::Client;
use tracing::{error, info};

use super::RegistryTable;
use crate::logging::targets;
use crate::req::HttpClient;

/// Download and parse the registry.
///
/// Never fails: transport and status errors are logged and produce an empty
/// table, which reconciles to no symbols and no chains.
pub async fn fetch_registry(client: &Client, url: &str) -> RegistryTable {
    let http = HttpClient::new(client.clone(), url);
    match http.get_text().await {
        Ok(text) => {
            let table = RegistryTable::parse(&text);
            info!(
                target: targets::REGISTRY,
                url = %url,
                rows = table.data_rows().len(),
                "Registry fetched"
            );
            table
        }
        Err(e) => {
            error!(target: targets::REGISTRY, url = %url, error = %e, "Registry fetch failed");
            RegistryTable::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_registry_is_empty() {
        // Nothing listens on the discard port.
        let table = fetch_registry(&Client::new(), "http://127.0.0.1:9/by_source.csv").await;
        assert!(table.is_empty());
        assert!(table.symbols(None).is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_empty() {
        let table = fetch_registry(&Client::new(), "not a url").await;
        assert!(table.is_empty());
    }
}
