use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use swap_engine_cache::SwapCache;
use swap_engine_metrics::{ErrorContext, RequestSpan};
use swap_engine_router::{AllowanceSource, SpotPriceSource};
use swap_engine_types::{
    format_units, is_native_token, parse_units, BaseUnits, ChainId, ProviderId, SwapQuote,
    SwapRequest,
};
use tracing::{debug, Instrument};

use crate::{PrepareResponse, ProtocolFees, SwapError, SwapService, TokenResolver};

/// Quote request as entered by a user: symbolic tokens, decimal amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub from_chain_id: ChainId,
    pub to_chain_id: ChainId,
    pub from_token: String,
    pub to_token: String,
    /// Human-readable amount of `from_token`, e.g. `"0.01"`
    pub amount: String,
    pub sender: String,
    /// Defaults to the sender
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slippage_bps: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolFeeQuote {
    pub bips: u32,
    pub amount: BaseUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectorQuote {
    pub provider: ProviderId,
    pub quote: SwapQuote,
    /// Normalised request the quote was produced for
    pub request: SwapRequest,
    pub from_decimals: u8,
    pub to_decimals: u8,
    /// Served from the quote cache
    pub cached: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_amount_usd: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_amount_usd: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_fee_usd: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_fee: Option<ProtocolFeeQuote>,
}

/// Top-level entry point for quote and prepare requests
///
/// Turns user input into a base-unit [`SwapRequest`], serves quotes from
/// the cache when it can and otherwise routes through the [`SwapService`].
/// Pricing and fee enrichment are best effort; a missing price only drops
/// the USD fields.
pub struct ProviderSelector {
    service: Arc<SwapService>,
    resolver: TokenResolver,
    cache: SwapCache,
    fees: ProtocolFees,
    prices: Option<Arc<dyn SpotPriceSource>>,
    allowances: Option<Arc<dyn AllowanceSource>>,
}

impl ProviderSelector {
    pub fn new(
        service: Arc<SwapService>,
        resolver: TokenResolver,
        cache: SwapCache,
        fees: ProtocolFees,
    ) -> Self {
        Self {
            service,
            resolver,
            cache,
            fees,
            prices: None,
            allowances: None,
        }
    }

    pub fn with_price_source(mut self, prices: Arc<dyn SpotPriceSource>) -> Self {
        self.prices = Some(prices);
        self
    }

    pub fn with_allowance_source(mut self, allowances: Arc<dyn AllowanceSource>) -> Self {
        self.allowances = Some(allowances);
        self
    }

    pub fn service(&self) -> &Arc<SwapService> {
        &self.service
    }

    pub fn cache(&self) -> &SwapCache {
        &self.cache
    }

    /// Normalise tokens, resolve decimals and convert the amount to base units
    pub async fn build_request(&self, params: &QuoteParams) -> Result<(SwapRequest, u8, u8), SwapError> {
        let from_token = self.resolver.normalize(params.from_chain_id, &params.from_token)?;
        let to_token = self.resolver.normalize(params.to_chain_id, &params.to_token)?;
        let from_decimals = self.resolver.decimals(params.from_chain_id, &from_token).await?;
        let to_decimals = self.resolver.decimals(params.to_chain_id, &to_token).await?;
        let amount = parse_units(&params.amount, from_decimals)?;

        let request = SwapRequest {
            from_chain_id: params.from_chain_id,
            to_chain_id: params.to_chain_id,
            from_token,
            to_token,
            amount,
            sender: params.sender.clone(),
            receiver: params.receiver.clone().unwrap_or_else(|| params.sender.clone()),
            slippage_bps: params.slippage_bps,
        };
        Ok((request, from_decimals, to_decimals))
    }

    pub async fn get_quote(&self, params: &QuoteParams) -> Result<SelectorQuote, SwapError> {
        let span = RequestSpan::new("quote", params.from_chain_id.value(), params.to_chain_id.value());
        self.quote(params)
            .instrument(span.span())
            .await
            .with_correlation_id(span.correlation_id)
    }

    async fn quote(&self, params: &QuoteParams) -> Result<SelectorQuote, SwapError> {
        let (request, from_decimals, to_decimals) = self.build_request(params).await?;
        self.service.validate_swap_request(&request)?;

        let (quote, cached) = match self.cache.get_quote(&request).await {
            Some(quote) => {
                debug!(provider = %quote.provider, "quote served from cache");
                (quote, true)
            }
            None => {
                // Already validated above; route without a second pass.
                let routed = self.service.router().select_quote(&request, None).await?;
                self.cache.put_quote(&request, &routed.result, None).await;
                (routed.result, false)
            }
        };

        let mut response = SelectorQuote {
            provider: quote.provider,
            quote,
            request,
            from_decimals,
            to_decimals,
            cached,
            from_amount_usd: None,
            to_amount_usd: None,
            total_fee_usd: None,
            protocol_fee: None,
        };
        self.enrich_usd(&mut response).await;
        response.protocol_fee = self
            .fees
            .fee_for(response.provider, response.request.amount)
            .await
            .ok()
            .map(|fee| ProtocolFeeQuote {
                bips: fee.bips,
                amount: fee.amount,
            });
        Ok(response)
    }

    pub async fn prepare_swap(&self, params: &QuoteParams) -> Result<PrepareResponse, SwapError> {
        let span = RequestSpan::new("prepare", params.from_chain_id.value(), params.to_chain_id.value());
        async {
            let (request, _, _) = self.build_request(params).await?;
            self.service.prepare_swap(&request).await
        }
        .instrument(span.span())
        .await
        .with_correlation_id(span.correlation_id)
    }

    /// Prepare through the provider that produced an earlier quote
    pub async fn prepare_swap_pinned(
        &self,
        params: &QuoteParams,
        provider: ProviderId,
    ) -> Result<PrepareResponse, SwapError> {
        let span = RequestSpan::new("prepare", params.from_chain_id.value(), params.to_chain_id.value());
        async {
            let (request, _, _) = self.build_request(params).await?;
            self.service.prepare_swap_pinned(&request, provider).await
        }
        .instrument(span.span())
        .await
        .with_correlation_id(span.correlation_id)
    }

    /// Current allowance of `owner` towards `spender`, through the approval
    /// cache. `None` for the native token, which needs no approval.
    pub async fn check_allowance(
        &self,
        chain_id: ChainId,
        token: &str,
        owner: &str,
        spender: &str,
    ) -> Result<Option<BaseUnits>, SwapError> {
        let token = self.resolver.normalize(chain_id, token)?;
        if is_native_token(&token) {
            return Ok(None);
        }

        if let Some(allowance) = self.cache.get_allowance(chain_id, &token, owner).await {
            return Ok(Some(allowance));
        }

        let source = self
            .allowances
            .as_ref()
            .ok_or_else(|| SwapError::Metadata("no allowance source configured".to_string()))?;
        let allowance = source
            .get_allowance(chain_id, &token, owner, spender)
            .await
            .map_err(|e| SwapError::Metadata(e.to_string()))?;

        self.cache
            .put_allowance(chain_id, &token, owner, allowance, None)
            .await;
        Ok(Some(allowance))
    }

    async fn enrich_usd(&self, response: &mut SelectorQuote) {
        let Some(prices) = &self.prices else {
            return;
        };
        let request = &response.request;

        let (from_price, to_price) = futures::join!(
            prices.get_token_spot_usd_price(request.from_chain_id, &request.from_token),
            prices.get_token_spot_usd_price(request.to_chain_id, &request.to_token),
        );

        response.from_amount_usd = from_price
            .and_then(|p| usd_value(request.amount, response.from_decimals, p));
        response.to_amount_usd = to_price.and_then(|p| {
            usd_value(response.quote.estimated_receive_amount, response.to_decimals, p)
        });
        // Fees are quoted in input-token units.
        response.total_fee_usd = from_price.and_then(|p| {
            let fee = response.quote.total_fee().ok()?;
            usd_value(fee, response.from_decimals, p)
        });

        if from_price.is_none() || to_price.is_none() {
            debug!(
                from_token = %request.from_token,
                to_token = %request.to_token,
                "spot price unavailable, omitting usd fields"
            );
        }
    }
}

fn usd_value(amount: BaseUnits, decimals: u8, price: Decimal) -> Option<Decimal> {
    let units = format_units(amount, decimals).ok()?;
    Decimal::from_str(&units).ok()?.checked_mul(price)
}
