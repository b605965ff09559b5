use std::fmt;
use std::time::Duration;
use swap_engine_types::ProviderId;
use thiserror::Error;

/// Failure reported by a provider adapter or an external lookup port
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("route not supported: {0}")]
    Unsupported(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("request timed out")]
    Timeout,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Why one candidate did not serve a routed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// Capability matrix or adapter rejected the route
    Unsupported,
    /// Breaker open; the adapter was not called
    CircuitOpen { retry_in: Duration },
    /// Adapter was called and failed
    Provider(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Unsupported => write!(f, "route not supported"),
            FailureReason::CircuitOpen { retry_in } => {
                write!(f, "circuit open (retry in {}ms)", retry_in.as_millis())
            }
            FailureReason::Provider(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFailure {
    pub provider: ProviderId,
    pub reason: FailureReason,
}

impl fmt::Display for CandidateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

fn join(attempts: &[CandidateFailure]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, Error)]
pub enum RouteError {
    /// No candidate can serve this route at all
    #[error("no provider supports this route [{}]", join(.attempts))]
    Unsupported { attempts: Vec<CandidateFailure> },

    /// At least one candidate could serve the route, but none did
    #[error("all providers failed [{}]", join(.attempts))]
    Exhausted { attempts: Vec<CandidateFailure> },
}

impl RouteError {
    pub fn attempts(&self) -> &[CandidateFailure] {
        match self {
            RouteError::Unsupported { attempts } | RouteError::Exhausted { attempts } => attempts,
        }
    }

    pub fn attempted_providers(&self) -> Vec<ProviderId> {
        self.attempts().iter().map(|a| a.provider).collect()
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, RouteError::Unsupported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_message_lists_every_candidate() {
        let err = RouteError::Exhausted {
            attempts: vec![
                CandidateFailure {
                    provider: ProviderId::Uniswap,
                    reason: FailureReason::CircuitOpen {
                        retry_in: Duration::from_secs(12),
                    },
                },
                CandidateFailure {
                    provider: ProviderId::Thirdweb,
                    reason: FailureReason::Provider("upstream error: 502".to_string()),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "all providers failed [uniswap: circuit open (retry in 12000ms); thirdweb: upstream error: 502]"
        );
        assert_eq!(
            err.attempted_providers(),
            vec![ProviderId::Uniswap, ProviderId::Thirdweb]
        );
        assert!(!err.is_client_error());
    }
}
