//! Mock balance provider server for testing
//!
//! One in-process HTTP server that answers the endpoints of every provider,
//! so a whole scan can be pointed at it with `Endpoints::all(server.base_url())`:
//! - Etherscan: GET /v2/api?module=account&action=balance
//! - BlockCypher: GET /v1/{coin}/main/addrs/{address}/balance
//! - Alchemy: POST /v2/{key} (eth_getBalance)
//! - Blockstream: POST /oauth/token, GET /api/address/{address}
//! - CryptoAPIs.io: GET /blockchain-data/ethereum/mainnet/addresses/{address}/balance
//!
//! Every address holds the same configured balance per asset.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use serde_json::json;

use crate::domain::{Asset, ProviderKind};

pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// Mock provider server for testing
pub struct MockProviderServer {
    port: u16,
    running: Arc<AtomicBool>,
    requests: Arc<AtomicUsize>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

/// Configuration for mock responses
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Balance in subunits (wei, satoshi) reported for every address
    pub balances: HashMap<Asset, u128>,
    /// Providers that answer every request with HTTP 500
    pub fail_providers: Vec<ProviderKind>,
    /// BlockCypher coins that answer with HTTP 500
    pub fail_blockcypher_coins: Vec<Asset>,
    /// BlockCypher coins that reject the address as invalid
    pub invalid_blockcypher_coins: Vec<Asset>,
    /// Providers that answer 200 with a body that is not their JSON shape
    pub malformed_providers: Vec<ProviderKind>,
    /// Delay in milliseconds before responding
    pub delay_ms: u64,
}

impl MockConfig {
    pub fn with_balance(mut self, asset: Asset, subunits: u128) -> Self {
        self.balances.insert(asset, subunits);
        self
    }

    fn balance(&self, asset: Asset) -> u128 {
        self.balances.get(&asset).copied().unwrap_or(0)
    }

    fn fails(&self, provider: ProviderKind) -> bool {
        self.fail_providers.contains(&provider)
    }

    fn malformed(&self, provider: ProviderKind) -> bool {
        self.malformed_providers.contains(&provider)
    }
}

impl MockProviderServer {
    /// Start a new mock server on a random available port
    pub fn start(config: MockConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let requests = Arc::new(AtomicUsize::new(0));
        let running_clone = running.clone();
        let requests_clone = requests.clone();

        // Set listener to non-blocking for graceful shutdown
        listener.set_nonblocking(true)?;

        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        requests_clone.fetch_add(1, Ordering::SeqCst);
                        let cfg = config.clone();
                        thread::spawn(move || {
                            handle_connection(stream, &cfg);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            requests,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    /// Number of connections accepted so far
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockProviderServer {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Request {
    method: String,
    path: String,
    query: String,
    headers: String,
    body: String,
}

/// Read the head and, if announced, the body of one request
fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < head_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let mut request_line = head.lines().next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?;
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    Some(Request {
        method,
        path: path.to_string(),
        query: query.to_string(),
        headers: head.to_lowercase(),
        body: String::from_utf8_lossy(&data[head_end..]).to_string(),
    })
}

fn handle_connection(mut stream: TcpStream, config: &MockConfig) {
    let _ = stream.set_nonblocking(false);
    let Some(request) = read_request(&mut stream) else {
        send_response(&mut stream, 400, "Bad Request", r#"{"error": "Invalid request"}"#);
        return;
    };

    if config.delay_ms > 0 {
        thread::sleep(std::time::Duration::from_millis(config.delay_ms));
    }

    let segments: Vec<&str> = request.path.trim_start_matches('/').split('/').collect();
    let (status, body) = match (request.method.as_str(), segments.as_slice()) {
        ("GET", ["v2", "api"]) => etherscan(&request, config),
        ("GET", ["v1", coin, "main", "addrs", address, "balance"]) => blockcypher(coin, address, config),
        ("POST", ["v2", _key]) => alchemy(&request, config),
        ("POST", ["oauth", "token"]) => blockstream_token(&request, config),
        ("GET", ["api", "address", address]) => blockstream_address(&request, address, config),
        ("GET", ["blockchain-data", "ethereum", "mainnet", "addresses", _address, "balance"]) => {
            cryptoapis(&request, config)
        }
        _ => (404, json!({"error": "Endpoint not found"}).to_string()),
    };

    send_response(&mut stream, status, status_text(status), &body);
}

fn failure(provider: ProviderKind, config: &MockConfig) -> Option<(u16, String)> {
    if config.fails(provider) {
        return Some((500, json!({"error": "Internal server error"}).to_string()));
    }
    if config.malformed(provider) {
        return Some((200, "<html>maintenance</html>".to_string()));
    }
    None
}

fn etherscan(request: &Request, config: &MockConfig) -> (u16, String) {
    if let Some(response) = failure(ProviderKind::Etherscan, config) {
        return response;
    }
    if !request.query.contains("apikey=") || !request.query.contains("action=balance") {
        let body = json!({"status": "0", "message": "NOTOK", "result": "Missing or invalid API Key"});
        return (200, body.to_string());
    }
    let body = json!({
        "status": "1",
        "message": "OK",
        "result": config.balance(Asset::Eth).to_string(),
    });
    (200, body.to_string())
}

fn blockcypher(coin: &str, address: &str, config: &MockConfig) -> (u16, String) {
    if let Some(response) = failure(ProviderKind::BlockCypher, config) {
        return response;
    }
    let Some(asset) = Asset::ALL.iter().copied().find(|a| a.symbol().eq_ignore_ascii_case(coin)) else {
        return (404, json!({"error": "Unknown coin"}).to_string());
    };
    if config.fail_blockcypher_coins.contains(&asset) {
        return (500, json!({"error": "Internal server error"}).to_string());
    }
    if config.invalid_blockcypher_coins.contains(&asset) {
        let message = format!("Address {} is an invalid {} address", address, asset);
        return (400, json!({"error": message}).to_string());
    }
    let body = json!({
        "address": address,
        "balance": config.balance(asset),
        "final_balance": config.balance(asset),
    });
    (200, body.to_string())
}

fn alchemy(request: &Request, config: &MockConfig) -> (u16, String) {
    if let Some(response) = failure(ProviderKind::Alchemy, config) {
        return response;
    }
    let rpc: serde_json::Value = serde_json::from_str(&request.body).unwrap_or_default();
    if rpc["method"] != "eth_getBalance" {
        let body = json!({"jsonrpc": "2.0", "id": rpc["id"], "error": {"code": -32601, "message": "method not found"}});
        return (200, body.to_string());
    }
    let body = json!({
        "jsonrpc": "2.0",
        "id": rpc["id"],
        "result": format!("0x{:x}", config.balance(Asset::Eth)),
    });
    (200, body.to_string())
}

fn blockstream_token(request: &Request, config: &MockConfig) -> (u16, String) {
    if config.fails(ProviderKind::Blockstream) {
        return (500, json!({"error": "Internal server error"}).to_string());
    }
    if !request.body.contains("grant_type=client_credentials") {
        return (400, json!({"error": "unsupported_grant_type"}).to_string());
    }
    let body = json!({
        "access_token": MOCK_ACCESS_TOKEN,
        "expires_in": 300,
        "token_type": "Bearer",
    });
    (200, body.to_string())
}

fn blockstream_address(request: &Request, address: &str, config: &MockConfig) -> (u16, String) {
    if let Some(response) = failure(ProviderKind::Blockstream, config) {
        return response;
    }
    if !request
        .headers
        .contains(&format!("authorization: bearer {}", MOCK_ACCESS_TOKEN))
    {
        return (401, json!({"error": "Unauthorized"}).to_string());
    }
    if address.starts_with("0x") {
        return (400, "Invalid Bitcoin address".to_string());
    }
    let body = json!({
        "address": address,
        "chain_stats": {"funded_txo_sum": config.balance(Asset::Btc), "spent_txo_sum": 0, "tx_count": 1},
        "mempool_stats": {"funded_txo_sum": 0, "spent_txo_sum": 0, "tx_count": 0},
    });
    (200, body.to_string())
}

fn cryptoapis(request: &Request, config: &MockConfig) -> (u16, String) {
    if let Some(response) = failure(ProviderKind::CryptoApis, config) {
        return response;
    }
    if !request.headers.contains("x-api-key: ") {
        return (401, json!({"error": {"code": "missing_api_key"}}).to_string());
    }
    let amount = Asset::Eth
        .from_subunits(config.balance(Asset::Eth))
        .map(|d| d.to_string())
        .unwrap_or_else(|_| "0".to_string());
    let body = json!({
        "apiVersion": "2023-04-25",
        "data": {"item": {"confirmedBalance": {"amount": amount, "unit": "ETH"}}},
    });
    (200, body.to_string())
}

fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use rust_decimal::Decimal;

    use crate::adapters::{
        AlchemyProvider, BlockCypherProvider, BlockstreamProvider, CryptoApisProvider, EtherscanProvider,
    };
    use crate::config::BlockstreamCredential;
    use crate::domain::result::Error;
    use crate::ports::{BalanceProvider, Observation};

    const ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
    const ONE_ETH: u128 = 1_000_000_000_000_000_000;

    fn timeout() -> Duration {
        Duration::from_secs(5)
    }

    #[test]
    fn test_etherscan_balance() {
        let server = MockProviderServer::start(MockConfig::default().with_balance(Asset::Eth, ONE_ETH)).unwrap();
        let provider = EtherscanProvider::new("key", Some(&server.base_url()), timeout()).unwrap();
        assert_eq!(provider.get_balance(ADDRESS).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_alchemy_balance() {
        let server =
            MockProviderServer::start(MockConfig::default().with_balance(Asset::Eth, ONE_ETH / 4)).unwrap();
        let provider = AlchemyProvider::new("key", Some(&server.base_url()), timeout()).unwrap();
        assert_eq!(provider.get_balance(ADDRESS).unwrap(), Decimal::new(25, 2));
    }

    #[test]
    fn test_cryptoapis_balance() {
        let server = MockProviderServer::start(MockConfig::default().with_balance(Asset::Eth, ONE_ETH * 3)).unwrap();
        let provider = CryptoApisProvider::new("key", Some(&server.base_url()), timeout()).unwrap();
        assert_eq!(provider.get_balance(ADDRESS).unwrap(), Decimal::new(3, 0));
    }

    #[test]
    fn test_blockcypher_per_coin_outcomes() {
        let config = MockConfig {
            fail_blockcypher_coins: vec![Asset::Btc],
            invalid_blockcypher_coins: vec![Asset::Doge],
            ..MockConfig::default().with_balance(Asset::Eth, ONE_ETH)
        };
        let server = MockProviderServer::start(config).unwrap();
        let provider = BlockCypherProvider::new("tok", Some(&server.base_url()), timeout()).unwrap();

        assert!(matches!(
            provider.fetch_balance(ADDRESS, Asset::Btc),
            Err(Error::ProviderTransport(_))
        ));
        assert_eq!(
            provider.fetch_balance(ADDRESS, Asset::Eth).unwrap(),
            Observation::Balance(Decimal::ONE)
        );
        assert_eq!(
            provider.fetch_balance(ADDRESS, Asset::Doge).unwrap(),
            Observation::InvalidAddress
        );
        assert_eq!(
            provider.fetch_balance(ADDRESS, Asset::Ltc).unwrap(),
            Observation::Balance(Decimal::ZERO)
        );
    }

    #[test]
    fn test_blockstream_rejects_ethereum_address_as_zero() {
        let server = MockProviderServer::start(MockConfig::default()).unwrap();
        let credential = BlockstreamCredential {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        let auth = format!("{}/oauth/token", server.base_url());
        let provider =
            BlockstreamProvider::new(&credential, Some(&server.base_url()), Some(&auth), timeout()).unwrap();

        assert_eq!(provider.get_balance(ADDRESS).unwrap(), Observation::InvalidAddress);
        // Token is cached: the second lookup needs one connection, not two
        let before = server.requests();
        provider.get_balance("bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq").unwrap();
        assert_eq!(server.requests() - before, 1);
    }

    #[test]
    fn test_server_error_is_transport_error() {
        let config = MockConfig {
            fail_providers: vec![ProviderKind::Etherscan],
            ..Default::default()
        };
        let server = MockProviderServer::start(config).unwrap();
        let provider = EtherscanProvider::new("key", Some(&server.base_url()), timeout()).unwrap();
        let err = provider.get_balance(ADDRESS).unwrap_err();
        assert!(matches!(err, Error::ProviderTransport(_)));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_malformed_body_is_data_error() {
        let config = MockConfig {
            malformed_providers: vec![ProviderKind::Alchemy],
            ..Default::default()
        };
        let server = MockProviderServer::start(config).unwrap();
        let provider = AlchemyProvider::new("key", Some(&server.base_url()), timeout()).unwrap();
        assert!(matches!(provider.get_balance(ADDRESS), Err(Error::ProviderData(_))));
    }

    #[test]
    fn test_slow_provider_times_out() {
        let config = MockConfig {
            delay_ms: 2_000,
            ..Default::default()
        };
        let server = MockProviderServer::start(config).unwrap();
        let provider = EtherscanProvider::new("key", Some(&server.base_url()), Duration::from_millis(200)).unwrap();
        let err = provider.get_balance(ADDRESS).unwrap_err();
        assert!(matches!(err, Error::ProviderTransport(_)));
        assert!(err.to_string().contains("timed out after 200ms"), "{}", err);
    }
}
