/// Per-million-token USD pricing for models this pipeline is known to
/// call. Unknown models fall back to a conservative default rather than
/// failing — an extraction that under/over-estimates a dollar figure
/// should never block on that estimate.
fn price_per_million(model: &str) -> (f64, f64) {
    match model {
        "gpt-4o-mini" => (0.15, 0.60),
        "gpt-4o" => (2.50, 10.00),
        "gpt-4.1-mini" => (0.40, 1.60),
        _ => (0.50, 1.50),
    }
}

/// Estimate the USD cost of one LLM call from its token counts, for an
/// extractor's own batch summary to aggregate.
pub fn estimate_cost_usd(model: &str, tokens_in: u32, tokens_out: u32) -> f64 {
    let (in_price, out_price) = price_per_million(model);
    (tokens_in as f64 / 1_000_000.0) * in_price + (tokens_out as f64 / 1_000_000.0) * out_price
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_model_uses_its_own_pricing() {
        let cost = estimate_cost_usd("gpt-4o-mini", 1_000_000, 1_000_000);
        assert!((cost - 0.75).abs() < 1e-9);
    }

    #[test]
    fn unknown_model_falls_back_to_default_pricing() {
        let cost = estimate_cost_usd("some-future-model", 1_000_000, 0);
        assert!((cost - 0.50).abs() < 1e-9);
    }

    #[test]
    fn zero_tokens_cost_nothing() {
        assert_eq!(estimate_cost_usd("gpt-4o", 0, 0), 0.0);
    }
}
