//! Efficient-frontier point set: portfolio normalization and synthetic
//! in-between portfolios for scatter density.

use crate::util::round_to;

use exchange::RawPortfolio;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Ticker → percent-of-100 weight.
pub type Composition = FxHashMap<String, f64>;

pub const FULLY_INVESTED: RangeInclusive<f64> = 99.5..=100.5;
/// Two points closer than this on both axes are the same point.
pub const DEDUP_EPSILON: f64 = 1e-8;
const COMPOSITION_DECIMALS: u32 = 6;
const MIN_AXIS_SPAN: f64 = 1e-6;
/// Generation attempts allowed per missing point before giving up.
const ATTEMPTS_PER_POINT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Portfolio {
    pub volatility: f64,
    #[serde(rename = "return")]
    pub ret: f64,
    pub sharpe: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composition: Option<Composition>,
}

impl Portfolio {
    pub fn new(volatility: f64, ret: f64, risk_free: f64) -> Self {
        Self {
            volatility,
            ret,
            sharpe: sharpe(ret, volatility, risk_free),
            composition: None,
        }
    }

    pub fn with_composition(mut self, composition: Composition) -> Self {
        self.composition = Some(composition);
        self
    }

    /// Needs both coordinates; a missing Sharpe is recomputed, weights are normalized.
    pub fn from_raw(raw: &RawPortfolio, risk_free: f64) -> Option<Self> {
        let volatility = raw.volatility?;
        let ret = raw.ret?;

        let composition = raw.weights.as_ref().and_then(|weights| {
            let normalized = normalize_composition(weights.iter());
            if normalized.is_none() {
                log::debug!("Discarding unusable weights on portfolio ({volatility}, {ret})");
            }
            normalized
        });

        Some(Self {
            volatility,
            ret,
            sharpe: raw
                .sharpe
                .unwrap_or_else(|| sharpe(ret, volatility, risk_free)),
            composition,
        })
    }

    pub fn is_fully_invested(&self) -> bool {
        self.composition.as_ref().is_some_and(is_fully_invested)
    }

    fn coincides_with(&self, other: &Portfolio) -> bool {
        (self.volatility - other.volatility).abs() <= DEDUP_EPSILON
            && (self.ret - other.ret).abs() <= DEDUP_EPSILON
    }
}

pub fn sharpe(ret: f64, volatility: f64, risk_free: f64) -> f64 {
    if volatility > 0.0 {
        (ret - risk_free) / volatility
    } else {
        0.0
    }
}

pub fn composition_sum(composition: &Composition) -> f64 {
    composition.values().sum()
}

pub fn is_fully_invested(composition: &Composition) -> bool {
    FULLY_INVESTED.contains(&composition_sum(composition))
}

/// Rescales weights to percent-of-100.
///
/// Fractions (`0.4`) and percentages (`40`) end up the same after rescaling.
/// Negative or non-finite weights, and an all-zero map, are rejected.
pub fn normalize_composition<'a>(
    weights: impl IntoIterator<Item = (&'a str, f64)>,
) -> Option<Composition> {
    let weights: Vec<(&str, f64)> = weights.into_iter().collect();

    if weights.is_empty() || weights.iter().any(|(_, w)| !w.is_finite() || *w < 0.0) {
        return None;
    }

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }

    let mut composition = Composition::default();
    for (ticker, w) in weights {
        *composition.entry(ticker.to_string()).or_default() += w;
    }
    for w in composition.values_mut() {
        *w = round_to(*w / total * 100.0, COMPOSITION_DECIMALS);
    }

    is_fully_invested(&composition).then_some(composition)
}

/// Volatility/return box the synthetic points are clamped into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_vol: f64,
    pub max_vol: f64,
    pub min_ret: f64,
    pub max_ret: f64,
}

impl Bounds {
    /// Smallest box holding every point, the origin, and reaching at least 1 on both axes.
    pub fn around<'a>(points: impl IntoIterator<Item = &'a Portfolio>) -> Self {
        points.into_iter().fold(
            Bounds {
                min_vol: 0.0,
                max_vol: 1.0,
                min_ret: 0.0,
                max_ret: 1.0,
            },
            |b, p| Bounds {
                min_vol: b.min_vol.min(p.volatility),
                max_vol: b.max_vol.max(p.volatility),
                min_ret: b.min_ret.min(p.ret),
                max_ret: b.max_ret.max(p.ret),
            },
        )
    }

    pub fn vol_span(&self) -> f64 {
        (self.max_vol - self.min_vol).max(MIN_AXIS_SPAN)
    }

    pub fn ret_span(&self) -> f64 {
        (self.max_ret - self.min_ret).max(MIN_AXIS_SPAN)
    }

    pub fn clamp(&self, volatility: f64, ret: f64) -> (f64, f64) {
        (
            volatility.min(self.max_vol).max(self.min_vol),
            ret.min(self.max_ret).max(self.min_ret),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisParams {
    pub risk_free: f64,
    /// Jitter standard deviation as a fraction of the axis span, drawn per point
    /// from `jitter_min..=jitter_max`.
    pub jitter_min: f64,
    pub jitter_max: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        Self {
            risk_free: 0.0,
            jitter_min: 0.03,
            jitter_max: 0.08,
        }
    }
}

impl SynthesisParams {
    fn jitter_range(&self) -> RangeInclusive<f64> {
        let (lo, hi) = (self.jitter_min, self.jitter_max);
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || hi < 0.0 {
            let default = Self::default();
            return default.jitter_min..=default.jitter_max;
        }
        if lo <= hi { lo..=hi } else { hi..=lo }
    }
}

/// Keeps the raw simulations that carry a fully-invested composition, normalized.
pub fn normalize_pool(raw_pool: &[RawPortfolio], risk_free: f64) -> Vec<Portfolio> {
    let pool: Vec<Portfolio> = raw_pool
        .iter()
        .filter_map(|raw| Portfolio::from_raw(raw, risk_free))
        .filter(Portfolio::is_fully_invested)
        .collect();

    let discarded = raw_pool.len() - pool.len();
    if discarded > 0 {
        log::debug!(
            "Discarded {discarded} of {} simulated portfolios without a fully-invested composition",
            raw_pool.len()
        );
    }
    pool
}

/// Produces up to `desired_extra` fully-invested portfolios that sit between the anchors.
///
/// Real simulations from `pool` are taken first, in order; only the shortfall is
/// generated by blending 2 to 4 random anchors and jittering the blend.
pub fn synthesize<R: Rng + ?Sized>(
    anchors: &[Portfolio],
    pool: &[Portfolio],
    desired_extra: usize,
    bounds: &Bounds,
    params: &SynthesisParams,
    rng: &mut R,
) -> Vec<Portfolio> {
    if desired_extra == 0 {
        return Vec::new();
    }

    let is_new = |p: &Portfolio, out: &[Portfolio]| {
        !anchors.iter().chain(out).any(|a| p.coincides_with(a))
    };

    let mut out: Vec<Portfolio> = Vec::with_capacity(desired_extra);
    for p in pool.iter().filter(|p| p.is_fully_invested()) {
        if out.len() >= desired_extra {
            break;
        }
        if is_new(p, &out) {
            out.push(p.clone());
        }
    }

    let shortfall = desired_extra - out.len();
    if shortfall == 0 || anchors.is_empty() {
        if shortfall > 0 {
            log::warn!("No anchor portfolios to interpolate, {shortfall} frontier points missing");
        }
        return out;
    }

    let max_attempts = shortfall * ATTEMPTS_PER_POINT;
    let mut attempts = 0;

    while out.len() < desired_extra && attempts < max_attempts {
        attempts += 1;

        if let Some(candidate) = blend_candidate(anchors, bounds, params, rng)
            && is_new(&candidate, &out)
        {
            out.push(candidate);
        }
    }

    if out.len() < desired_extra {
        log::warn!(
            "Frontier synthesis produced {} of {desired_extra} points after {attempts} attempts",
            out.len()
        );
    }

    out
}

/// One generated point, `None` when its blended composition is unusable.
fn blend_candidate<R: Rng + ?Sized>(
    anchors: &[Portfolio],
    bounds: &Bounds,
    params: &SynthesisParams,
    rng: &mut R,
) -> Option<Portfolio> {
    let take = anchor_count(rng).min(anchors.len());
    let chosen: Vec<&Portfolio> = rand::seq::index::sample(rng, anchors.len(), take)
        .into_iter()
        .map(|i| &anchors[i])
        .collect();

    let mut weights: Vec<f64> = (0..take).map(|_| rng.gen_range(0.0..1.0)).collect();
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        weights.iter_mut().for_each(|w| *w /= total);
    } else {
        weights.fill(1.0 / take as f64);
    }

    let (mut vol, mut ret) = chosen
        .iter()
        .zip(&weights)
        .fold((0.0, 0.0), |(v, r), (a, w)| {
            (v + a.volatility * w, r + a.ret * w)
        });

    let jitter = params.jitter_range();
    vol += gaussian(rng) * rng.gen_range(jitter.clone()) * bounds.vol_span();
    ret += gaussian(rng) * rng.gen_range(jitter) * bounds.ret_span();
    let (vol, ret) = bounds.clamp(vol, ret);

    let mut blended = Composition::default();
    for (anchor, w) in chosen.iter().zip(&weights) {
        let composition = anchor.composition.as_ref()?;
        for (ticker, pct) in composition {
            *blended.entry(ticker.clone()).or_default() += pct / 100.0 * w;
        }
    }

    let composition = normalize_composition(blended.iter().map(|(t, w)| (t.as_str(), *w)))?;

    Some(Portfolio::new(vol, ret, params.risk_free).with_composition(composition))
}

/// 2, 3 or 4 with probability 0.5, 0.3 and 0.2.
fn anchor_count<R: Rng + ?Sized>(rng: &mut R) -> usize {
    let roll: f64 = rng.gen_range(0.0..1.0);
    if roll < 0.5 {
        2
    } else if roll < 0.8 {
        3
    } else {
        4
    }
}

/// Standard normal sample via Box–Muller.
fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
    let v: f64 = rng.gen_range(0.0..1.0);
    (-2.0 * u.ln()).sqrt() * (2.0 * std::f64::consts::PI * v).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange::RawWeights;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn comp(entries: &[(&str, f64)]) -> Composition {
        normalize_composition(entries.iter().copied()).unwrap()
    }

    fn anchors() -> Vec<Portfolio> {
        vec![
            Portfolio::new(8.0, 5.0, 0.0).with_composition(comp(&[("AGG", 80.0), ("SPY", 20.0)])),
            Portfolio::new(15.0, 9.0, 0.0).with_composition(comp(&[("SPY", 60.0), ("QQQ", 40.0)])),
            Portfolio::new(22.0, 12.0, 0.0).with_composition(comp(&[("QQQ", 100.0)])),
            Portfolio::new(12.0, 6.5, 0.0).with_composition(comp(&[("SPY", 50.0), ("AGG", 50.0)])),
        ]
    }

    fn assert_all_valid(out: &[Portfolio], anchors: &[Portfolio]) {
        for p in out {
            let sum = composition_sum(p.composition.as_ref().expect("composition"));
            assert!((sum - 100.0).abs() <= 0.5, "sum {sum}");
            assert!(
                anchors.iter().all(|a| !p.coincides_with(a)),
                "duplicates an anchor: {p:?}"
            );
        }
    }

    #[test]
    fn fractions_and_percentages_normalize_to_100() {
        let fractions = comp(&[("SPY", 0.6), ("AGG", 0.4)]);
        assert!((fractions["SPY"] - 60.0).abs() < 1e-9);
        assert!((fractions["AGG"] - 40.0).abs() < 1e-9);

        let percents = comp(&[("SPY", 30.0), ("AGG", 30.0)]);
        assert!((percents["SPY"] - 50.0).abs() < 1e-9);
        assert!(is_fully_invested(&percents));
    }

    #[test]
    fn unusable_weights_are_rejected() {
        assert!(normalize_composition([("SPY", -10.0), ("AGG", 110.0)]).is_none());
        assert!(normalize_composition([("SPY", 0.0)]).is_none());
        assert!(normalize_composition([("SPY", f64::NAN)]).is_none());
        assert!(normalize_composition(std::iter::empty()).is_none());
    }

    #[test]
    fn raw_portfolio_conversion() {
        let raw = RawPortfolio {
            volatility: Some(10.0),
            ret: Some(7.0),
            sharpe: None,
            weights: Some(RawWeights(vec![("SPY".into(), 0.5), ("AGG".into(), 0.5)])),
        };
        let p = Portfolio::from_raw(&raw, 2.0).unwrap();
        assert!((p.sharpe - 0.5).abs() < 1e-12);
        assert!(p.is_fully_invested());

        let missing = RawPortfolio {
            ret: Some(1.0),
            ..RawPortfolio::default()
        };
        assert!(Portfolio::from_raw(&missing, 0.0).is_none());
        assert_eq!(sharpe(5.0, 0.0, 1.0), 0.0);
    }

    #[test]
    fn zero_requested_is_empty() {
        let anchors = anchors();
        let bounds = Bounds::around(&anchors);
        let mut rng = StdRng::seed_from_u64(7);
        let out = synthesize(&anchors, &[], 0, &bounds, &SynthesisParams::default(), &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn real_simulations_are_preferred() {
        let anchors = anchors();
        let pool: Vec<Portfolio> = (0..10)
            .map(|i| {
                Portfolio::new(9.0 + i as f64, 5.5 + i as f64 * 0.3, 0.0)
                    .with_composition(comp(&[("SPY", 50.0), ("AGG", 50.0)]))
            })
            .collect();
        let bounds = Bounds::around(anchors.iter().chain(&pool));
        let mut rng = StdRng::seed_from_u64(1);

        let out = synthesize(&anchors, &pool, 4, &bounds, &SynthesisParams::default(), &mut rng);
        assert_eq!(out, pool[..4].to_vec());
    }

    #[test]
    fn pool_copies_of_anchors_are_skipped() {
        let anchors = anchors();
        let pool = vec![anchors[0].clone(), anchors[1].clone()];
        let bounds = Bounds::around(&anchors);
        let mut rng = StdRng::seed_from_u64(3);

        let out = synthesize(&anchors, &pool, 5, &bounds, &SynthesisParams::default(), &mut rng);
        assert_eq!(out.len(), 5);
        assert_all_valid(&out, &anchors);
    }

    #[test]
    fn generated_points_are_invested_and_bounded() {
        let anchors = anchors();
        let bounds = Bounds::around(&anchors);
        let params = SynthesisParams::default();

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let out = synthesize(&anchors, &[], 100, &bounds, &params, &mut rng);

            assert_eq!(out.len(), 100, "seed {seed}");
            assert_all_valid(&out, &anchors);
            for p in &out {
                assert!(p.volatility >= bounds.min_vol && p.volatility <= bounds.max_vol);
                assert!(p.ret >= bounds.min_ret && p.ret <= bounds.max_ret);
                assert!((p.sharpe - sharpe(p.ret, p.volatility, 0.0)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn anchors_without_composition_yield_nothing() {
        let anchors = vec![Portfolio::new(5.0, 3.0, 0.0), Portfolio::new(10.0, 6.0, 0.0)];
        let bounds = Bounds::around(&anchors);
        let mut rng = StdRng::seed_from_u64(11);

        let out = synthesize(&anchors, &[], 10, &bounds, &SynthesisParams::default(), &mut rng);
        assert!(out.is_empty());
    }

    #[test]
    fn bounds_include_origin_and_unit() {
        let b = Bounds::around(&[Portfolio::new(0.5, -2.0, 0.0)]);
        assert_eq!((b.min_vol, b.max_vol), (0.0, 1.0));
        assert_eq!((b.min_ret, b.max_ret), (-2.0, 1.0));
        assert_eq!(b.clamp(5.0, -9.0), (1.0, -2.0));
    }

    #[test]
    fn pool_normalization_drops_uninvested() {
        let raw = vec![
            RawPortfolio {
                volatility: Some(1.0),
                ret: Some(1.0),
                sharpe: None,
                weights: Some(RawWeights(vec![("A".into(), 60.0), ("B".into(), 40.0)])),
            },
            RawPortfolio {
                volatility: Some(2.0),
                ret: Some(2.0),
                ..RawPortfolio::default()
            },
        ];
        let pool = normalize_pool(&raw, 0.0);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool[0].volatility, 1.0);
    }
}
