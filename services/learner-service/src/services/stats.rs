//! fit_score computation: a pure function of the stored counters at query
//! time. Stored fit_score reflects outcome deltas; the value served to
//! Decision is always recomputed with recency and decay applied.

use chrono::{DateTime, Utc};
use routing_common::utils::clamp01;

const BASE_SCORE: f64 = 0.5;
const RESOLVE_BOOST_PER_ITEM: f64 = 0.05;
const MAX_RESOLVE_BOOST: f64 = 0.5;
const TRANSFER_PENALTY_PER_ITEM: f64 = 0.10;
const MAX_TRANSFER_PENALTY: f64 = 0.3;
const MAX_RECENCY_BOOST: f64 = 0.2;

#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    /// Days over which the recency boost linearly fades.
    pub recency_window_days: i64,
    /// Multiplicative decay per day since the last resolution.
    pub daily_decay: f64,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            recency_window_days: 90,
            daily_decay: 0.99,
        }
    }
}

/// Decayed fit in [0, 1]. A human who never resolved anything is treated as
/// a full window stale.
pub fn fit_score(
    resolves_count: i32,
    transfers_count: i32,
    last_resolved_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    params: FitParams,
) -> f64 {
    let resolve_boost = (RESOLVE_BOOST_PER_ITEM * resolves_count as f64).min(MAX_RESOLVE_BOOST);
    let transfer_penalty =
        (TRANSFER_PENALTY_PER_ITEM * transfers_count as f64).min(MAX_TRANSFER_PENALTY);

    let days = match last_resolved_at {
        Some(at) => (now - at).num_days().max(0),
        None => params.recency_window_days,
    };
    let recency_boost = (MAX_RECENCY_BOOST
        * (1.0 - days as f64 / params.recency_window_days as f64))
        .max(0.0);

    let raw = BASE_SCORE + resolve_boost - transfer_penalty + recency_boost;
    let decay = params.daily_decay.powi(days.min(i32::MAX as i64) as i32);
    clamp01(raw * decay)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn params() -> FitParams {
        FitParams::default()
    }

    #[test]
    fn fresh_resolver_hits_the_clamp() {
        let now = Utc::now();
        // 12 resolves saturates the boost; resolved today means no decay.
        let fit = fit_score(12, 0, Some(now), now, params());
        assert_eq!(fit, 1.0);
    }

    #[test]
    fn never_resolved_is_a_full_window_stale() {
        let now = Utc::now();
        let fit = fit_score(0, 0, None, now, params());
        // base 0.5, no boosts, decayed over 90 days.
        let expected = 0.5 * 0.99f64.powi(90);
        assert!((fit - expected).abs() < 1e-9);
    }

    #[test]
    fn transfers_penalize_but_the_penalty_is_capped() {
        let now = Utc::now();
        let light = fit_score(5, 1, Some(now), now, params());
        let heavy = fit_score(5, 3, Some(now), now, params());
        let saturated = fit_score(5, 30, Some(now), now, params());
        assert!(heavy < light);
        // 0.1 per transfer caps at 0.3, so 3 and 30 transfers score the same.
        assert!((saturated - heavy).abs() < 1e-9);
    }

    #[test]
    fn staleness_decays_the_score() {
        let now = Utc::now();
        let recent = fit_score(4, 0, Some(now - Duration::days(1)), now, params());
        let stale = fit_score(4, 0, Some(now - Duration::days(60)), now, params());
        assert!(stale < recent);
    }

    #[test]
    fn score_is_always_in_unit_range() {
        let now = Utc::now();
        for resolves in [0, 1, 50] {
            for transfers in [0, 2, 40] {
                for days in [0i64, 10, 90, 400] {
                    let fit = fit_score(
                        resolves,
                        transfers,
                        Some(now - Duration::days(days)),
                        now,
                        params(),
                    );
                    assert!((0.0..=1.0).contains(&fit), "fit {} out of range", fit);
                }
            }
        }
    }

    #[test]
    fn more_resolves_never_score_lower() {
        let now = Utc::now();
        let at = Some(now - Duration::days(5));
        let mut previous = 0.0;
        for resolves in 0..15 {
            let fit = fit_score(resolves, 1, at, now, params());
            assert!(fit >= previous);
            previous = fit;
        }
    }
}
