//! Session accounting
//!
//! Running token totals and the cost derived from them.

use crate::core::config::PricingConfig;
use crate::logging::SessionLogger;

/// Running token totals for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Add one response's figures
    pub fn add(&mut self, input: u64, output: u64) {
        self.input_tokens = self.input_tokens.saturating_add(input);
        self.output_tokens = self.output_tokens.saturating_add(output);
    }
}

/// Dollar cost of a session's usage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cost {
    pub input: f64,
    pub output: f64,
}

impl Cost {
    pub fn total(&self) -> f64 {
        self.input + self.output
    }
}

/// Tracks token usage and computes cost
#[derive(Debug, Clone)]
pub struct SessionAccountant {
    usage: TokenUsage,
    exchanges: usize,
    pricing: PricingConfig,
    log: SessionLogger,
}

impl SessionAccountant {
    pub fn new(pricing: PricingConfig, log: SessionLogger) -> Self {
        Self {
            usage: TokenUsage::default(),
            exchanges: 0,
            pricing,
            log,
        }
    }

    /// Record the usage reported by one model response
    pub fn update_token_usage(&mut self, input: u64, output: u64) {
        self.usage.add(input, output);
        self.exchanges += 1;
        self.log.debug(format!(
            "Exchange {}: +{} input, +{} output (totals {} / {})",
            self.exchanges, input, output, self.usage.input_tokens, self.usage.output_tokens
        ));
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    /// Number of model responses recorded
    pub fn exchanges(&self) -> usize {
        self.exchanges
    }

    /// Cost of the usage so far
    pub fn total_cost(&self) -> Cost {
        Cost {
            input: self.usage.input_tokens as f64 / 1_000_000.0 * self.pricing.input_per_million,
            output: self.usage.output_tokens as f64 / 1_000_000.0
                * self.pricing.output_per_million,
        }
    }

    /// Log token totals and dollar costs
    pub fn log_total_cost(&self) -> Cost {
        let cost = self.total_cost();
        self.log
            .info(format!("Total input tokens: {}", self.usage.input_tokens));
        self.log
            .info(format!("Total output tokens: {}", self.usage.output_tokens));
        self.log.info(format!("Input cost: {}", format_usd(cost.input)));
        self.log.info(format!("Output cost: {}", format_usd(cost.output)));
        self.log.info(format!("Total cost: {}", format_usd(cost.total())));
        cost
    }
}

/// Format a dollar amount the way cost logs do
pub fn format_usd(amount: f64) -> String {
    format!("${:.6}", amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accountant() -> SessionAccountant {
        SessionAccountant::new(
            PricingConfig::default(),
            SessionLogger::new("test").component("accounting"),
        )
    }

    #[test]
    fn test_totals_are_sums() {
        let mut acc = accountant();
        let exchanges = [(1200, 300), (800, 50), (0, 0), (4000, 1650)];
        for (i, o) in exchanges {
            acc.update_token_usage(i, o);
        }

        assert_eq!(acc.usage().input_tokens, 6000);
        assert_eq!(acc.usage().output_tokens, 2000);
        assert_eq!(acc.exchanges(), 4);
    }

    #[test]
    fn test_usage_is_monotonic() {
        let mut acc = accountant();
        let mut previous = acc.usage();
        for (i, o) in [(10, 1), (0, 5), (7, 0)] {
            acc.update_token_usage(i, o);
            let now = acc.usage();
            assert!(now.input_tokens >= previous.input_tokens);
            assert!(now.output_tokens >= previous.output_tokens);
            previous = now;
        }
    }

    #[test]
    fn test_cost_uses_published_rates() {
        let mut acc = accountant();
        acc.update_token_usage(1_000_000, 1_000_000);
        let cost = acc.total_cost();
        assert_eq!(format_usd(cost.input), "$3.000000");
        assert_eq!(format_usd(cost.output), "$15.000000");
        assert_eq!(format_usd(cost.total()), "$18.000000");
    }

    #[test]
    fn test_cost_precision() {
        let mut acc = accountant();
        acc.update_token_usage(1234, 567);
        let cost = acc.log_total_cost();
        // 1234 / 1e6 * 3 = 0.003702, 567 / 1e6 * 15 = 0.008505
        assert_eq!(format_usd(cost.input), "$0.003702");
        assert_eq!(format_usd(cost.output), "$0.008505");
        assert_eq!(format_usd(cost.total()), "$0.012207");
    }

    #[test]
    fn test_empty_session_costs_nothing() {
        let acc = accountant();
        assert_eq!(acc.total_cost().total(), 0.0);
    }
}
