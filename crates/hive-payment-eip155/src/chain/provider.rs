use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, Bytes, Log};
use alloy_provider::fillers::{
    ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller, WalletFiller,
};
use alloy_provider::{Identity, Provider, ProviderBuilder, RootProvider, WalletProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types_eth::{Filter, TransactionReceipt, TransactionRequest};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::layers::{FallbackLayer, ThrottleLayer};
use alloy_transport_http::Http;
use hive_payment_types::chain::{
    CallRequest, ChainClient, ChainClientError, LogFilter, PaymentReceipt, Submission,
    SubmissionEvent, TransactionParams,
};
use hive_payment_types::config::RpcConfig;
use std::num::NonZeroUsize;
use std::time::Duration;
use tower::ServiceBuilder;

/// Default time to wait for a payment to be mined.
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// Filler stack: gas, nonce and chain id.
///
/// Payments carry an explicit gas limit and gas price, so the gas filler only
/// kicks in for requests built elsewhere.
pub type InnerFiller = JoinFill<GasFiller, JoinFill<NonceFiller, ChainIdFiller>>;

/// The fully composed provider: fillers and wallet signing over a [`RootProvider`].
pub type InnerProvider = FillProvider<
    JoinFill<JoinFill<Identity, InnerFiller>, WalletFiller<EthereumWallet>>,
    RootProvider,
>;

/// [`ChainClient`] over JSON-RPC, signing with a local key.
///
/// Submitted transactions are followed by a background task which emits the
/// transaction hash right away and the receipt once the transaction is mined.
#[derive(Debug, Clone)]
pub struct Eip155ChainClient {
    chain_reference: u64,
    receipt_timeout: Duration,
    inner: InnerProvider,
}

impl Eip155ChainClient {
    /// Builds a client for `chain_reference` over the given endpoints.
    ///
    /// Endpoints are tried in order of health; each one is rate limited separately.
    pub fn new(
        chain_reference: u64,
        rpc: &[RpcConfig],
        signer: PrivateKeySigner,
    ) -> Result<Self, ChainClientError> {
        let client = Self::rpc_client(chain_reference, rpc)?;
        let signer = signer.with_chain_id(Some(chain_reference));
        let wallet = EthereumWallet::from(signer);
        let filler = JoinFill::new(
            GasFiller,
            JoinFill::new(NonceFiller::default(), ChainIdFiller::default()),
        );
        let inner: InnerProvider = ProviderBuilder::default()
            .filler(filler)
            .wallet(wallet)
            .connect_client(client);
        let signers = inner.signer_addresses().collect::<Vec<_>>();
        tracing::info!(chain = chain_reference, signers = ?signers, "Using EVM provider");
        Ok(Self {
            chain_reference,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
            inner,
        })
    }

    pub fn with_receipt_timeout(mut self, receipt_timeout: Duration) -> Self {
        self.receipt_timeout = receipt_timeout;
        self
    }

    pub fn chain_reference(&self) -> u64 {
        self.chain_reference
    }

    pub fn inner(&self) -> &InnerProvider {
        &self.inner
    }

    /// JSON-RPC client over every HTTP endpoint in `rpc`, with fallback between them.
    pub fn rpc_client(chain_reference: u64, rpc: &[RpcConfig]) -> Result<RpcClient, ChainClientError> {
        let transports = rpc
            .iter()
            .filter_map(|provider_config| {
                let scheme = provider_config.http.scheme();
                let is_http = scheme == "http" || scheme == "https";
                if !is_http {
                    return None;
                }
                let rpc_url = provider_config.http.clone();
                tracing::info!(chain = chain_reference, rpc_url = %rpc_url, rate_limit = ?provider_config.rate_limit, "Using HTTP transport");
                let rate_limit = provider_config.rate_limit.unwrap_or(u32::MAX);
                let service = ServiceBuilder::new()
                    .layer(ThrottleLayer::new(rate_limit))
                    .service(Http::new(rpc_url));
                Some(service)
            })
            .collect::<Vec<_>>();
        let active = NonZeroUsize::new(transports.len()).ok_or_else(|| {
            ChainClientError::Custom(format!(
                "No HTTP RPC endpoint configured for chain {chain_reference}"
            ))
        })?;
        let fallback = ServiceBuilder::new()
            .layer(FallbackLayer::default().with_active_transport_count(active))
            .service(transports);
        Ok(RpcClient::new(fallback, false))
    }

    fn request(from: Option<Address>, to: Address, data: Bytes) -> TransactionRequest {
        let request = TransactionRequest::default().with_to(to).with_input(data);
        match from {
            Some(from) => request.with_from(from),
            None => request,
        }
    }
}

fn payment_receipt(receipt: &TransactionReceipt) -> PaymentReceipt {
    PaymentReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        status: receipt.status(),
        logs: receipt
            .inner
            .logs()
            .iter()
            .map(|log| log.inner.clone())
            .collect(),
    }
}

#[async_trait::async_trait]
impl ChainClient for Eip155ChainClient {
    async fn accounts(&self) -> Result<Vec<Address>, ChainClientError> {
        Ok(self.inner.signer_addresses().collect())
    }

    async fn chain_id(&self) -> Result<u64, ChainClientError> {
        self.inner
            .get_chain_id()
            .await
            .map_err(ChainClientError::transport)
    }

    async fn block_number(&self) -> Result<u64, ChainClientError> {
        self.inner
            .get_block_number()
            .await
            .map_err(ChainClientError::transport)
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ChainClientError> {
        let tx = Self::request(request.from, request.to, request.data.clone())
            .with_value(request.value);
        self.inner
            .call(tx)
            .await
            .map_err(ChainClientError::transport)
    }

    async fn estimate_gas(&self, request: &CallRequest) -> Result<u64, ChainClientError> {
        let tx = Self::request(request.from, request.to, request.data.clone())
            .with_value(request.value);
        self.inner
            .estimate_gas(tx)
            .await
            .map_err(ChainClientError::transport)
    }

    async fn gas_price(&self) -> Result<u128, ChainClientError> {
        self.inner
            .get_gas_price()
            .await
            .map_err(ChainClientError::transport)
    }

    async fn send_transaction(
        &self,
        params: TransactionParams,
    ) -> Result<Submission, ChainClientError> {
        let tx = Self::request(Some(params.from), params.to, params.data)
            .with_value(params.value)
            .with_gas_limit(params.gas_limit)
            .with_gas_price(params.gas_price);
        let pending = self
            .inner
            .send_transaction(tx)
            .await
            .map_err(ChainClientError::transport)?;

        let (sender, submission) = Submission::channel();
        let tx_hash = *pending.tx_hash();
        sender.emit(SubmissionEvent::TransactionHash(tx_hash));

        let watcher = pending.with_timeout(Some(self.receipt_timeout));
        tokio::spawn(async move {
            let event = match watcher.get_receipt().await {
                Ok(receipt) if receipt.status() => {
                    SubmissionEvent::Receipt(payment_receipt(&receipt))
                }
                Ok(_) => SubmissionEvent::Error(ChainClientError::Reverted(tx_hash.to_string())),
                Err(e) => SubmissionEvent::Error(ChainClientError::transport(e)),
            };
            tracing::debug!(tx = %tx_hash, event = event.kind(), "Payment transaction settled");
            sender.emit(event);
        });

        Ok(submission)
    }

    async fn get_logs(&self, filter: &LogFilter) -> Result<Vec<Log>, ChainClientError> {
        let filter = Filter::new()
            .address(filter.address)
            .from_block(filter.from_block)
            .to_block(filter.to_block);
        let logs = self
            .inner
            .get_logs(&filter)
            .await
            .map_err(ChainClientError::transport)?;
        Ok(logs.into_iter().map(|log| log.inner).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, U256, address};
    use serde_json::{Value, json};
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
    const CONTRACT: Address = address!("0x81897263EC51A2314d256703b2B9f57664B772a9");

    /// Answers JSON-RPC requests by method name, echoing the request id.
    struct JsonRpc;

    impl Respond for JsonRpc {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            let result = match body["method"].as_str().unwrap() {
                "eth_chainId" => json!("0x15"),
                "eth_blockNumber" => json!("0x64"),
                "eth_gasPrice" => json!("0x3b9aca00"),
                "eth_estimateGas" => json!("0x5208"),
                "eth_call" => json!(format!("0x{}3", "0".repeat(63))),
                "eth_getLogs" => json!([{
                    "address": CONTRACT,
                    "topics": [B256::repeat_byte(0x01)],
                    "data": "0x",
                    "blockNumber": "0x63",
                    "blockHash": B256::repeat_byte(0x02),
                    "transactionHash": B256::repeat_byte(0x03),
                    "transactionIndex": "0x0",
                    "logIndex": "0x0",
                    "removed": false
                }]),
                other => {
                    return ResponseTemplate::new(200).set_body_json(json!({
                        "jsonrpc": "2.0",
                        "id": body["id"],
                        "error": { "code": -32601, "message": format!("method {other} not found") },
                    }));
                }
            };
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "result": result,
            }))
        }
    }

    async fn client() -> (MockServer, Eip155ChainClient) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(JsonRpc)
            .mount(&server)
            .await;
        let rpc = RpcConfig::new(Url::parse(&server.uri()).unwrap());
        let signer: PrivateKeySigner = KEY.parse().unwrap();
        let client = Eip155ChainClient::new(21, &[rpc], signer).unwrap();
        (server, client)
    }

    #[test]
    fn test_no_http_endpoint() {
        let rpc = RpcConfig::new(Url::parse("wss://api.elastos.io/ws").unwrap());
        let err = Eip155ChainClient::rpc_client(20, &[rpc]).unwrap_err();
        assert!(err.to_string().contains("chain 20"));
    }

    #[tokio::test]
    async fn test_accounts_are_signer_addresses() {
        let (_server, client) = client().await;
        let signer: PrivateKeySigner = KEY.parse().unwrap();
        assert_eq!(client.accounts().await.unwrap(), vec![signer.address()]);
    }

    #[tokio::test]
    async fn test_chain_reads() {
        let (_server, client) = client().await;
        assert_eq!(client.chain_id().await.unwrap(), 21);
        assert_eq!(client.block_number().await.unwrap(), 100);
        assert_eq!(client.gas_price().await.unwrap(), 1_000_000_000);
    }

    #[tokio::test]
    async fn test_estimate_gas() {
        let (_server, client) = client().await;
        let request = CallRequest {
            from: Some(address!("0x1111111111111111111111111111111111111111")),
            to: CONTRACT,
            data: Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]),
            value: U256::from(1u64),
        };
        assert_eq!(client.estimate_gas(&request).await.unwrap(), 21_000);
    }

    #[tokio::test]
    async fn test_call_returns_raw_output() {
        let (_server, client) = client().await;
        let output = client
            .call(&CallRequest::read(CONTRACT, Bytes::new()))
            .await
            .unwrap();
        assert_eq!(output.len(), 32);
        assert_eq!(U256::from_be_slice(&output), U256::from(3u64));
    }

    #[tokio::test]
    async fn test_get_logs() {
        let (_server, client) = client().await;
        let logs = client
            .get_logs(&LogFilter {
                address: CONTRACT,
                from_block: 90,
                to_block: 100,
            })
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].address, CONTRACT);
        assert_eq!(logs[0].data.topics(), &[B256::repeat_byte(0x01)]);
    }

    #[tokio::test]
    async fn test_transport_failure_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let rpc = RpcConfig::new(Url::parse(&server.uri()).unwrap());
        let signer: PrivateKeySigner = KEY.parse().unwrap();
        let client = Eip155ChainClient::new(21, &[rpc], signer).unwrap();
        let err = client.gas_price().await.unwrap_err();
        assert!(matches!(err, ChainClientError::Transport(_)));
    }
}
