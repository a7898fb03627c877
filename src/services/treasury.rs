//! Treasury contract reader.
//!
//! Reads raw fixed-point values off the promo token contract (or its tax
//! processor, depending on the deployed contract shape) and normalizes them
//! into exact decimal strings. Every per-field read degrades to zero on
//! failure so the dashboard always has something to render.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    contract::abigen,
    providers::{Http, Provider},
    types::{Address, U256},
};
use serde::Serialize;

use crate::{
    config::Config,
    constants::{NATIVE_DECIMALS, TREASURY_FIELD_TIMEOUT_SECS},
    error::{AppError, Result},
};

/// The slice of configuration the reader needs, detached from the full
/// server config so the CLI tool can assemble it from the environment alone.
#[derive(Debug, Clone, Default)]
pub struct TreasurySettings {
    pub token_contract_address: Option<String>,
    pub tax_processor_address: Option<String>,
    pub strategy: TreasuryStrategy,
}

impl TreasurySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            token_contract_address: config.token_contract_address.clone(),
            tax_processor_address: config.tax_processor_address.clone(),
            strategy: TreasuryStrategy::from_config(&config.treasury_strategy),
        }
    }

    pub fn from_env() -> Self {
        Self {
            token_contract_address: std::env::var("TOKEN_CONTRACT_ADDRESS").ok(),
            tax_processor_address: std::env::var("TAX_PROCESSOR_ADDRESS").ok(),
            strategy: TreasuryStrategy::from_config(
                &std::env::var("TREASURY_STRATEGY").unwrap_or_default(),
            ),
        }
    }
}

// Minimal ABI subsets. The token contract exposes its fee accumulators
// directly; older deployments delegate fee accounting to a separate tax
// processor contract.
abigen!(
    PromoToken,
    r#"[
        function pair() view returns (address)
        function WETH() view returns (address)
        function quoteFounder() view returns (uint256)
        function quoteHolder() view returns (uint256)
        function feeAccumulated() view returns (uint256)
        function quoteClaimed() view returns (uint256)
        function feeFounder() view returns (uint256)
        function feeLiquidity() view returns (uint256)
        function decimals() view returns (uint8)
        function taxProcessor() view returns (address)
    ]"#
);

abigen!(
    TaxProcessor,
    r#"[
        function totalQuoteToLiquidity() view returns (uint256)
        function totalTokenToLiquidity() view returns (uint256)
        function totalQuoteSentToMarketing() view returns (uint256)
        function marketQuoteBalance() view returns (uint256)
    ]"#
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasurySnapshot {
    pub funds_balance: String,
    pub liquidity_balance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liquidity_tokens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<TreasuryDebug>,
}

impl TreasurySnapshot {
    pub fn zeroed() -> Self {
        Self {
            funds_balance: "0".to_string(),
            liquidity_balance: "0".to_string(),
            liquidity_tokens: None,
            debug: None,
        }
    }
}

/// Raw intermediate values, pre-formatting, for operator audits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreasuryDebug {
    pub strategy: String,
    pub token_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_decimals: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_founder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_holder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_accumulated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_claimed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_founder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_liquidity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees_from_quotes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fees_unclaimed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_quote_to_liquidity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_token_to_liquidity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marketing_quote: Option<String>,
}

impl TreasuryDebug {
    fn new(strategy: &TreasuryStrategy, token: Address) -> Self {
        Self {
            strategy: strategy.to_string(),
            token_address: format!("{:?}", token),
            pair_address: None,
            weth: None,
            token_decimals: None,
            quote_founder: None,
            quote_holder: None,
            fee_accumulated: None,
            quote_claimed: None,
            fee_founder: None,
            fee_liquidity: None,
            fees_from_quotes: None,
            fees_unclaimed: None,
            processor_address: None,
            total_quote_to_liquidity: None,
            total_token_to_liquidity: None,
            marketing_quote: None,
        }
    }
}

/// Which contract shape the deployment exposes. The two shapes are not
/// distinguishable from configuration addresses alone, so the operator picks
/// one explicitly (TREASURY_STRATEGY); unknown values read as direct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TreasuryStrategy {
    #[default]
    DirectToken,
    TaxProcessor,
}

impl TreasuryStrategy {
    pub fn from_config(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "processor" | "tax-processor" | "tax_processor" => Self::TaxProcessor,
            _ => Self::DirectToken,
        }
    }
}

impl std::fmt::Display for TreasuryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DirectToken => write!(f, "direct"),
            Self::TaxProcessor => write!(f, "processor"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct TreasuryReadOptions {
    pub token_address: Option<String>,
    pub include_debug: bool,
}

/// Seam between the read pipeline and the chain transport so strategies stay
/// pure functions over (calls, address).
#[async_trait]
pub trait ChainCalls: Send + Sync {
    async fn read_uint(&self, contract: Address, function: &str) -> Result<U256>;
    async fn read_address(&self, contract: Address, function: &str) -> Result<Address>;
    async fn read_decimals(&self, contract: Address) -> Result<u8>;
}

/// `ChainCalls` over a JSON-RPC HTTP provider.
pub struct RpcCalls {
    provider: Arc<Provider<Http>>,
}

impl RpcCalls {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| AppError::Internal(format!("Invalid EVM RPC URL: {}", e)))?;
        Ok(Self {
            provider: Arc::new(provider),
        })
    }
}

#[async_trait]
impl ChainCalls for RpcCalls {
    async fn read_uint(&self, contract: Address, function: &str) -> Result<U256> {
        let token = PromoToken::new(contract, self.provider.clone());
        let processor = TaxProcessor::new(contract, self.provider.clone());
        let value = match function {
            "quoteFounder" => token.quote_founder().call().await,
            "quoteHolder" => token.quote_holder().call().await,
            "feeAccumulated" => token.fee_accumulated().call().await,
            "quoteClaimed" => token.quote_claimed().call().await,
            "feeFounder" => token.fee_founder().call().await,
            "feeLiquidity" => token.fee_liquidity().call().await,
            "totalQuoteToLiquidity" => processor.total_quote_to_liquidity().call().await,
            "totalTokenToLiquidity" => processor.total_token_to_liquidity().call().await,
            "totalQuoteSentToMarketing" => processor.total_quote_sent_to_marketing().call().await,
            "marketQuoteBalance" => processor.market_quote_balance().call().await,
            other => {
                return Err(AppError::Internal(format!(
                    "Unknown uint256 field '{}'",
                    other
                )))
            }
        };
        value.map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn read_address(&self, contract: Address, function: &str) -> Result<Address> {
        let token = PromoToken::new(contract, self.provider.clone());
        let value = match function {
            "pair" => token.pair().call().await,
            "WETH" => token.weth().call().await,
            "taxProcessor" => token.tax_processor().call().await,
            other => {
                return Err(AppError::Internal(format!(
                    "Unknown address field '{}'",
                    other
                )))
            }
        };
        value.map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }

    async fn read_decimals(&self, contract: Address) -> Result<u8> {
        PromoToken::new(contract, self.provider.clone())
            .decimals()
            .call()
            .await
            .map_err(|e| AppError::BlockchainRPC(e.to_string()))
    }
}

/// Produces a fresh treasury snapshot from live chain state.
///
/// The only error this returns is `AppError::Configuration` when no contract
/// address resolves; every other failure mode collapses to zero values so the
/// caller can always render. Resolution order for the target address:
/// valid explicit override, then TOKEN_CONTRACT_ADDRESS, then
/// TAX_PROCESSOR_ADDRESS. A malformed override is ignored, not rejected.
pub async fn read_treasury(
    calls: &dyn ChainCalls,
    settings: &TreasurySettings,
    opts: &TreasuryReadOptions,
) -> Result<TreasurySnapshot> {
    let token = opts
        .token_address
        .as_deref()
        .and_then(parse_contract_address)
        .or_else(|| {
            settings
                .token_contract_address
                .as_deref()
                .and_then(parse_contract_address)
        })
        .or_else(|| {
            settings
                .tax_processor_address
                .as_deref()
                .and_then(parse_contract_address)
        })
        .ok_or_else(|| {
            AppError::Configuration(
                "No treasury contract address configured (TOKEN_CONTRACT_ADDRESS)".to_string(),
            )
        })?;

    let snapshot = match settings.strategy {
        TreasuryStrategy::DirectToken => {
            read_direct_token(calls, token, opts.include_debug).await
        }
        TreasuryStrategy::TaxProcessor => {
            read_tax_processor(calls, settings, token, opts.include_debug).await
        }
    };

    tracing::info!(
        strategy = %settings.strategy,
        funds = %snapshot.funds_balance,
        liquidity = %snapshot.liquidity_balance,
        "treasury snapshot read"
    );
    Ok(snapshot)
}

/// Strategy A: the token contract carries its fee accumulators directly.
/// All nine reads fan out; any single failure zeroes that field only.
async fn read_direct_token(
    calls: &dyn ChainCalls,
    token: Address,
    include_debug: bool,
) -> TreasurySnapshot {
    let (
        pair,
        weth,
        quote_founder,
        quote_holder,
        fee_accumulated,
        quote_claimed,
        fee_founder,
        fee_liquidity,
        token_decimals,
    ) = tokio::join!(
        address_or_zero(calls, token, "pair"),
        address_or_zero(calls, token, "WETH"),
        uint_or_zero(calls, token, "quoteFounder"),
        uint_or_zero(calls, token, "quoteHolder"),
        uint_or_zero(calls, token, "feeAccumulated"),
        uint_or_zero(calls, token, "quoteClaimed"),
        uint_or_zero(calls, token, "feeFounder"),
        uint_or_zero(calls, token, "feeLiquidity"),
        decimals_or_default(calls, token),
    );

    let fees_from_quotes = quote_founder.saturating_add(quote_holder);
    let fees_unclaimed = fee_accumulated.saturating_sub(quote_claimed);

    // Funds are the BNB amount tracked in quoteFounder; liquidity is the
    // feeLiquidity accumulator. Both are quote-denominated, so the chain
    // native 18-decimal convention applies regardless of token decimals.
    let mut snapshot = TreasurySnapshot {
        funds_balance: format_units(quote_founder, NATIVE_DECIMALS),
        liquidity_balance: format_units(fee_liquidity, NATIVE_DECIMALS),
        liquidity_tokens: None,
        debug: None,
    };

    if include_debug {
        let mut debug = TreasuryDebug::new(&TreasuryStrategy::DirectToken, token);
        debug.pair_address = Some(format!("{:?}", pair));
        debug.weth = Some(format!("{:?}", weth));
        debug.token_decimals = Some(token_decimals);
        debug.quote_founder = Some(quote_founder.to_string());
        debug.quote_holder = Some(quote_holder.to_string());
        debug.fee_accumulated = Some(fee_accumulated.to_string());
        debug.quote_claimed = Some(quote_claimed.to_string());
        debug.fee_founder = Some(fee_founder.to_string());
        debug.fee_liquidity = Some(fee_liquidity.to_string());
        debug.fees_from_quotes = Some(fees_from_quotes.to_string());
        debug.fees_unclaimed = Some(fees_unclaimed.to_string());
        snapshot.debug = Some(debug);
    }

    snapshot
}

/// Strategy B: fee accounting lives on a separate tax processor contract.
/// A configured TAX_PROCESSOR_ADDRESS wins over the pointer stored on the
/// token contract.
async fn read_tax_processor(
    calls: &dyn ChainCalls,
    settings: &TreasurySettings,
    token: Address,
    include_debug: bool,
) -> TreasurySnapshot {
    let configured = settings
        .tax_processor_address
        .as_deref()
        .and_then(parse_contract_address)
        .filter(|addr| !addr.is_zero());

    let processor = match configured {
        Some(addr) => addr,
        None => address_or_zero(calls, token, "taxProcessor").await,
    };

    if processor.is_zero() {
        tracing::warn!("No tax processor address resolvable; serving zeroed snapshot");
        let mut snapshot = TreasurySnapshot::zeroed();
        if include_debug {
            snapshot.debug = Some(TreasuryDebug::new(&TreasuryStrategy::TaxProcessor, token));
        }
        return snapshot;
    }

    let (quote_to_liquidity, token_to_liquidity, marketing_quote) = tokio::join!(
        uint_or_zero(calls, processor, "totalQuoteToLiquidity"),
        uint_or_zero(calls, processor, "totalTokenToLiquidity"),
        marketing_quote_with_fallback(calls, processor),
    );

    // Liquidity here is the lifetime quote-side total moved into the pool;
    // the token-side total rides along as liquidityTokens. All three fields
    // use the native 18-decimal convention.
    let mut snapshot = TreasurySnapshot {
        funds_balance: format_units(marketing_quote, NATIVE_DECIMALS),
        liquidity_balance: format_units(quote_to_liquidity, NATIVE_DECIMALS),
        liquidity_tokens: Some(format_units(token_to_liquidity, NATIVE_DECIMALS)),
        debug: None,
    };

    if include_debug {
        let mut debug = TreasuryDebug::new(&TreasuryStrategy::TaxProcessor, token);
        debug.processor_address = Some(format!("{:?}", processor));
        debug.total_quote_to_liquidity = Some(quote_to_liquidity.to_string());
        debug.total_token_to_liquidity = Some(token_to_liquidity.to_string());
        debug.marketing_quote = Some(marketing_quote.to_string());
        snapshot.debug = Some(debug);
    }

    snapshot
}

/// Marketing funds with the fallback chain older processor deployments need:
/// try totalQuoteSentToMarketing once, and on failure make exactly one
/// attempt at marketQuoteBalance before defaulting to zero.
async fn marketing_quote_with_fallback(calls: &dyn ChainCalls, processor: Address) -> U256 {
    let primary = tokio::time::timeout(
        Duration::from_secs(TREASURY_FIELD_TIMEOUT_SECS),
        calls.read_uint(processor, "totalQuoteSentToMarketing"),
    )
    .await;

    match primary {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::debug!(
                "totalQuoteSentToMarketing read failed ({}); trying marketQuoteBalance",
                err
            );
            uint_or_zero(calls, processor, "marketQuoteBalance").await
        }
        Err(_) => {
            tracing::debug!(
                "totalQuoteSentToMarketing timed out after {}s; trying marketQuoteBalance",
                TREASURY_FIELD_TIMEOUT_SECS
            );
            uint_or_zero(calls, processor, "marketQuoteBalance").await
        }
    }
}

async fn uint_or_zero(calls: &dyn ChainCalls, contract: Address, function: &str) -> U256 {
    match tokio::time::timeout(
        Duration::from_secs(TREASURY_FIELD_TIMEOUT_SECS),
        calls.read_uint(contract, function),
    )
    .await
    {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::debug!("treasury {} read failed: {}", function, err);
            U256::zero()
        }
        Err(_) => {
            tracing::debug!(
                "treasury {} read timed out after {}s",
                function,
                TREASURY_FIELD_TIMEOUT_SECS
            );
            U256::zero()
        }
    }
}

async fn address_or_zero(calls: &dyn ChainCalls, contract: Address, function: &str) -> Address {
    match tokio::time::timeout(
        Duration::from_secs(TREASURY_FIELD_TIMEOUT_SECS),
        calls.read_address(contract, function),
    )
    .await
    {
        Ok(Ok(value)) => value,
        Ok(Err(err)) => {
            tracing::debug!("treasury {} read failed: {}", function, err);
            Address::zero()
        }
        Err(_) => {
            tracing::debug!(
                "treasury {} read timed out after {}s",
                function,
                TREASURY_FIELD_TIMEOUT_SECS
            );
            Address::zero()
        }
    }
}

async fn decimals_or_default(calls: &dyn ChainCalls, contract: Address) -> u8 {
    match tokio::time::timeout(
        Duration::from_secs(TREASURY_FIELD_TIMEOUT_SECS),
        calls.read_decimals(contract),
    )
    .await
    {
        Ok(Ok(value)) => value,
        _ => 18,
    }
}

/// Strict 0x + 40 hex chars. Anything else is treated as absent so a bad
/// override query parameter can never break the read.
pub fn parse_contract_address(value: &str) -> Option<Address> {
    let trimmed = value.trim();
    let hex = trimmed.strip_prefix("0x")?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    trimmed.parse::<Address>().ok()
}

/// Exact fixed-point to decimal-string conversion. Integer division and
/// remainder against 10^decimals, so balances far beyond 2^53 survive
/// without float rounding. Trailing fractional zeros are trimmed and a zero
/// value renders as plain "0".
pub fn format_units(raw: U256, decimals: u32) -> String {
    if decimals == 0 {
        return raw.to_string();
    }
    let base = U256::from(10u64).pow(U256::from(decimals));
    let whole = raw / base;
    let frac = raw % base;
    if frac.is_zero() {
        return whole.to_string();
    }
    let padded = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    let trimmed = padded.trim_end_matches('0');
    format!("{}.{}", whole, trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Instant;

    fn settings(token: Option<&str>, processor: Option<&str>, strategy: &str) -> TreasurySettings {
        TreasurySettings {
            token_contract_address: token.map(str::to_string),
            tax_processor_address: processor.map(str::to_string),
            strategy: TreasuryStrategy::from_config(strategy),
        }
    }

    const TOKEN: &str = "0x00000000000000000000000000000000000000aa";
    const PROCESSOR: &str = "0x00000000000000000000000000000000000000bb";

    #[derive(Default)]
    struct MockCalls {
        uints: HashMap<&'static str, std::result::Result<U256, ()>>,
        addresses: HashMap<&'static str, Address>,
        latency: Option<Duration>,
        log: Mutex<Vec<(Address, String)>>,
    }

    impl MockCalls {
        fn with_uint(mut self, function: &'static str, value: u128) -> Self {
            self.uints.insert(function, Ok(U256::from(value)));
            self
        }

        fn with_uint_str(mut self, function: &'static str, value: &str) -> Self {
            self.uints
                .insert(function, Ok(U256::from_dec_str(value).unwrap()));
            self
        }

        fn with_failing(mut self, function: &'static str) -> Self {
            self.uints.insert(function, Err(()));
            self
        }

        fn with_address(mut self, function: &'static str, value: &str) -> Self {
            self.addresses.insert(function, value.parse().unwrap());
            self
        }

        fn with_latency(mut self, latency: Duration) -> Self {
            self.latency = Some(latency);
            self
        }

        fn calls_to(&self, function: &str) -> usize {
            self.log
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, name)| name == function)
                .count()
        }

        fn contracts_called(&self) -> Vec<Address> {
            self.log.lock().unwrap().iter().map(|(a, _)| *a).collect()
        }
    }

    #[async_trait]
    impl ChainCalls for MockCalls {
        async fn read_uint(&self, contract: Address, function: &str) -> Result<U256> {
            self.log
                .lock()
                .unwrap()
                .push((contract, function.to_string()));
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            match self.uints.get(function) {
                Some(Ok(value)) => Ok(*value),
                _ => Err(AppError::BlockchainRPC("execution reverted".to_string())),
            }
        }

        async fn read_address(&self, contract: Address, function: &str) -> Result<Address> {
            self.log
                .lock()
                .unwrap()
                .push((contract, function.to_string()));
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.addresses
                .get(function)
                .copied()
                .ok_or_else(|| AppError::BlockchainRPC("execution reverted".to_string()))
        }

        async fn read_decimals(&self, contract: Address) -> Result<u8> {
            self.log
                .lock()
                .unwrap()
                .push((contract, "decimals".to_string()));
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            Ok(18)
        }
    }

    #[test]
    fn format_units_exact_eighteen_decimals() {
        let raw = U256::from_dec_str("1234567890123456789").unwrap();
        assert_eq!(format_units(raw, 18), "1.234567890123456789");
    }

    #[test]
    fn format_units_survives_values_beyond_f64_precision() {
        // 27 significant digits, well past 2^53
        let raw = U256::from_dec_str("123456789012345678901234567").unwrap();
        assert_eq!(format_units(raw, 18), "123456789.012345678901234567");
    }

    #[test]
    fn format_units_zero_and_trimming() {
        assert_eq!(format_units(U256::zero(), 18), "0");
        let raw = U256::from_dec_str("1500000000000000000").unwrap();
        assert_eq!(format_units(raw, 18), "1.5");
        assert_eq!(format_units(U256::from(5u64), 18), "0.000000000000000005");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[tokio::test]
    async fn direct_strategy_formats_quote_founder_as_funds() {
        let mock = MockCalls::default()
            .with_address("pair", "0x00000000000000000000000000000000000000cc")
            .with_address("WETH", "0x00000000000000000000000000000000000000dd")
            .with_uint_str("quoteFounder", "98765432109876543210")
            .with_uint("quoteHolder", 1)
            .with_uint("feeAccumulated", 10)
            .with_uint("quoteClaimed", 3)
            .with_uint("feeFounder", 2)
            .with_uint_str("feeLiquidity", "2500000000000000000");
        let config = settings(Some(TOKEN), None, "direct");

        let snapshot = read_treasury(&mock, &config, &TreasuryReadOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.funds_balance, "98.76543210987654321");
        assert_eq!(snapshot.liquidity_balance, "2.5");
        assert!(snapshot.liquidity_tokens.is_none());
    }

    #[tokio::test]
    async fn direct_strategy_partial_failure_zeroes_only_that_field() {
        let mock = MockCalls::default()
            .with_failing("quoteFounder")
            .with_uint_str("feeLiquidity", "7000000000000000000");
        let config = settings(Some(TOKEN), None, "direct");

        let snapshot = read_treasury(&mock, &config, &TreasuryReadOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.funds_balance, "0");
        assert_eq!(snapshot.liquidity_balance, "7");
    }

    #[tokio::test]
    async fn missing_addresses_fail_with_configuration_error() {
        let mock = MockCalls::default();
        let config = settings(None, None, "direct");

        let result = read_treasury(&mock, &config, &TreasuryReadOptions::default()).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert!(mock.contracts_called().is_empty());
    }

    #[tokio::test]
    async fn invalid_override_falls_back_to_configured_address() {
        let mock = MockCalls::default().with_uint("quoteFounder", 0);
        let config = settings(Some(TOKEN), None, "direct");
        let opts = TreasuryReadOptions {
            token_address: Some("not-an-address".to_string()),
            include_debug: false,
        };

        read_treasury(&mock, &config, &opts).await.unwrap();
        let expected: Address = TOKEN.parse().unwrap();
        assert!(mock.contracts_called().iter().all(|a| *a == expected));
    }

    #[tokio::test]
    async fn short_hex_override_is_ignored_too() {
        let mock = MockCalls::default();
        let config = settings(None, None, "direct");
        let opts = TreasuryReadOptions {
            token_address: Some("0x1234".to_string()),
            include_debug: false,
        };

        // Override is unusable and nothing else is configured
        let result = read_treasury(&mock, &config, &opts).await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn processor_strategy_reads_processor_pointer_from_token() {
        let mock = MockCalls::default()
            .with_address("taxProcessor", PROCESSOR)
            .with_uint_str("totalQuoteToLiquidity", "4000000000000000000")
            .with_uint_str("totalTokenToLiquidity", "9000000000000000000")
            .with_uint_str("totalQuoteSentToMarketing", "1000000000000000000");
        let config = settings(Some(TOKEN), None, "processor");

        let snapshot = read_treasury(&mock, &config, &TreasuryReadOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.funds_balance, "1");
        assert_eq!(snapshot.liquidity_balance, "4");
        assert_eq!(snapshot.liquidity_tokens.as_deref(), Some("9"));

        let processor: Address = PROCESSOR.parse().unwrap();
        assert!(mock
            .contracts_called()
            .iter()
            .skip(1) // the taxProcessor pointer read targets the token
            .all(|a| *a == processor));
    }

    #[tokio::test]
    async fn processor_strategy_marketing_fallback_runs_exactly_once() {
        let mock = MockCalls::default()
            .with_uint("totalQuoteToLiquidity", 0)
            .with_uint("totalTokenToLiquidity", 0)
            .with_failing("totalQuoteSentToMarketing")
            .with_uint_str("marketQuoteBalance", "3140000000000000000");
        let config = settings(Some(TOKEN), Some(PROCESSOR), "processor");

        let snapshot = read_treasury(&mock, &config, &TreasuryReadOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.funds_balance, "3.14");
        assert_eq!(mock.calls_to("totalQuoteSentToMarketing"), 1);
        assert_eq!(mock.calls_to("marketQuoteBalance"), 1);
    }

    #[tokio::test]
    async fn processor_strategy_double_failure_defaults_to_zero() {
        let mock = MockCalls::default()
            .with_uint_str("totalQuoteToLiquidity", "5000000000000000000")
            .with_uint("totalTokenToLiquidity", 0)
            .with_failing("totalQuoteSentToMarketing")
            .with_failing("marketQuoteBalance");
        let config = settings(Some(TOKEN), Some(PROCESSOR), "processor");

        let snapshot = read_treasury(&mock, &config, &TreasuryReadOptions::default())
            .await
            .unwrap();
        assert_eq!(snapshot.funds_balance, "0");
        assert_eq!(snapshot.liquidity_balance, "5");
        assert_eq!(mock.calls_to("marketQuoteBalance"), 1);
    }

    #[tokio::test]
    async fn direct_strategy_field_reads_fan_out() {
        let mock = MockCalls::default()
            .with_uint("quoteFounder", 1)
            .with_uint("quoteHolder", 1)
            .with_uint("feeAccumulated", 1)
            .with_uint("quoteClaimed", 1)
            .with_uint("feeFounder", 1)
            .with_uint("feeLiquidity", 1)
            .with_address("pair", "0x00000000000000000000000000000000000000cc")
            .with_address("WETH", "0x00000000000000000000000000000000000000dd")
            .with_latency(Duration::from_millis(50));
        let config = settings(Some(TOKEN), None, "direct");

        let start = Instant::now();
        read_treasury(&mock, &config, &TreasuryReadOptions::default())
            .await
            .unwrap();
        let elapsed = start.elapsed();

        // Nine 50ms reads serially would take ~450ms; fanned out they take
        // roughly one latency unit.
        assert!(
            elapsed < Duration::from_millis(300),
            "expected concurrent reads, took {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn debug_carries_raw_intermediate_values() {
        let mock = MockCalls::default()
            .with_uint_str("quoteFounder", "98765432109876543210")
            .with_uint("quoteHolder", 10)
            .with_uint("feeAccumulated", 7)
            .with_uint("quoteClaimed", 2)
            .with_uint("feeFounder", 0)
            .with_uint("feeLiquidity", 0)
            .with_address("pair", "0x00000000000000000000000000000000000000cc")
            .with_address("WETH", "0x00000000000000000000000000000000000000dd");
        let config = settings(Some(TOKEN), None, "direct");
        let opts = TreasuryReadOptions {
            token_address: None,
            include_debug: true,
        };

        let snapshot = read_treasury(&mock, &config, &opts).await.unwrap();
        let debug = snapshot.debug.expect("debug requested");
        assert_eq!(debug.quote_founder.as_deref(), Some("98765432109876543210"));
        assert_eq!(debug.fees_unclaimed.as_deref(), Some("5"));
        assert_eq!(debug.token_decimals, Some(18));
        assert_eq!(debug.strategy, "direct");
    }

    #[test]
    fn contract_address_parsing_is_strict() {
        assert!(parse_contract_address(TOKEN).is_some());
        assert!(parse_contract_address(" 0x00000000000000000000000000000000000000aa ").is_some());
        assert!(parse_contract_address("00000000000000000000000000000000000000aa").is_none());
        assert!(parse_contract_address("0x123").is_none());
        assert!(parse_contract_address("0xzz000000000000000000000000000000000000aa").is_none());
        assert!(parse_contract_address("").is_none());
    }
}
