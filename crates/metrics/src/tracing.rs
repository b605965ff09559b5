use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global JSON subscriber
///
/// `RUST_LOG` wins over `default_filter` when set.
pub fn init_tracing(default_filter: &str) -> Result<(), TracingError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Correlation ID for tracking one request across components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Span context for one selector request
#[derive(Debug, Clone)]
pub struct RequestSpan {
    pub correlation_id: CorrelationId,
    pub operation: &'static str,
    pub from_chain: u64,
    pub to_chain: u64,
}

impl RequestSpan {
    pub fn new(operation: &'static str, from_chain: u64, to_chain: u64) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            operation,
            from_chain,
            to_chain,
        }
    }

    /// Span to attach to the request future with `Instrument::instrument`
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "swap_request",
            correlation_id = %self.correlation_id,
            operation = self.operation,
            from_chain = self.from_chain,
            to_chain = self.to_chain,
        )
    }
}

/// Log an error with request context on its way out
pub trait ErrorContext {
    fn with_correlation_id(self, correlation_id: CorrelationId) -> Self;

    fn with_provider(self, provider: &str) -> Self;
}

impl<T, E> ErrorContext for Result<T, E>
where
    E: std::fmt::Display,
{
    fn with_correlation_id(self, correlation_id: CorrelationId) -> Self {
        self.map_err(|e| {
            tracing::error!(
                correlation_id = %correlation_id,
                error = %e,
                "request failed"
            );
            e
        })
    }

    fn with_provider(self, provider: &str) -> Self {
        self.map_err(|e| {
            tracing::warn!(
                provider = %provider,
                error = %e,
                "provider call failed"
            );
            e
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}
