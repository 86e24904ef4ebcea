use linked_hash_map::LinkedHashMap;
use log::debug;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::io::counts::CountsTable;
use crate::loglin::{BaseStat, PositionEffectModel};
use crate::motif::Combination;
use crate::motif::counts;
use crate::stats;

/// Position-effect statistics of one combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectResult {
    pub rel_entropy: f64,
    pub deviance: f64,
    pub df: usize,
    pub stats: Vec<BaseStat>,
    pub formula: String,
    pub prob: f64,
}

/// Results keyed by combination, iterated in enumeration order.
pub type EffectResults = LinkedHashMap<Combination, EffectResult>;

/// Survival function of the test statistic: (deviance, df) -> p-value.
pub type SurvivalFn = fn(f64, usize) -> f64;

/// p-value of a fit; a negative deviance is treated as no evidence of an effect.
pub fn effect_prob(deviance: f64, df: usize, sf: SurvivalFn) -> f64 {
    if deviance < 0.0 {
        1.0
    } else {
        sf(deviance, df)
    }
}

/// Evaluates position effects of combinations with an injected model.
pub struct EffectEvaluator<'a, M: PositionEffectModel> {
    model: &'a M,
    survival: SurvivalFn,
    group_label: Option<String>,
}

impl<'a, M: PositionEffectModel> EffectEvaluator<'a, M> {
    pub fn new(model: &'a M, group_label: Option<&str>) -> Self {
        EffectEvaluator {
            model: model,
            survival: stats::chisq_sf,
            group_label: group_label.map(String::from),
        }
    }

    pub fn with_survival(mut self, survival: SurvivalFn) -> Self {
        self.survival = survival;
        self
    }

    pub fn group_label(&self) -> Option<&str> {
        self.group_label.as_deref()
    }

    pub fn evaluate(&self, table: &CountsTable, combination: &Combination) -> Result<EffectResult> {
        let counts = counts::combined_counts(table, combination, self.group_label())?;
        let effect = self.model.fit(&counts)?;
        let prob = effect_prob(effect.deviance, effect.df, self.survival);
        debug!("{}: RE={:.6} deviance={:.4} df={} p={:.4e}",
               combination, effect.rel_entropy, effect.deviance, effect.df, prob);

        Ok(EffectResult {
            rel_entropy: effect.rel_entropy,
            deviance: effect.deviance,
            df: effect.df,
            stats: effect.stats,
            formula: effect.formula,
            prob: prob,
        })
    }

    /// Evaluate every combination; fails on the first failing combination.
    pub fn position_effects(&self, table: &CountsTable, combinations: &[Combination]) -> Result<EffectResults> {
        if let Some(label) = self.group_label() {
            let values = table.distinct_values(label)?;
            if values.len() != 2 {
                return Err(Error::config(format!(
                    "group column '{}' must have exactly two values, found {:?}", label, values)));
            }
        }

        let mut results = EffectResults::new();
        for combination in combinations {
            let result = self.evaluate(table, combination)?;
            results.insert(combination.clone(), result);
        }
        Ok(results)
    }
}

/// Largest relative entropy among results.
pub fn max_rel_entropy(results: &EffectResults) -> f64 {
    results.values().map(|r| r.rel_entropy).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::counts::Reader;
    use crate::loglin::{LogLinearModel, PositionEffect};
    use crate::motif::combinations;
    use crate::motif::counts::CombinedCounts;

    const COUNTS_FILE: &'static [u8] = b"count\tpos0\tpos1\tpos2\tpos3\tstrand\tmut
12\tA\tC\tG\tT\t+\tM
7\tC\tC\tA\tA\t-\tM
3\tG\tT\tA\tC\t+\tM
5\tT\tA\tC\tG\t-\tM
4\tA\tC\tG\tT\t+\tR
6\tT\tG\tA\tA\t-\tR
5\tA\tA\tA\tA\t+\tR
9\tC\tT\tG\tC\t-\tR
";

    /// Model returning a fixed deviance, to exercise the p-value guard.
    struct FixedDeviance(f64);

    impl PositionEffectModel for FixedDeviance {
        fn fit(&self, counts: &CombinedCounts) -> Result<PositionEffect> {
            Ok(PositionEffect {
                rel_entropy: 0.0,
                deviance: self.0,
                df: 3,
                stats: Vec::new(),
                formula: format!("fixed {}", counts.combination),
            })
        }
    }

    fn table() -> CountsTable {
        Reader::new(COUNTS_FILE).read_table().unwrap()
    }

    #[test]
    fn test_negative_deviance_gives_unit_prob() {
        for df in 0 .. 10 {
            assert_eq!(effect_prob(-0.5, df, stats::chisq_sf), 1.0);
        }

        let model = FixedDeviance(-0.5);
        let evaluator = EffectEvaluator::new(&model, None)
            .with_survival(|_, _| 0.0);
        let r = evaluator.evaluate(&table(), &Combination::new(&["pos0"])).unwrap();
        assert_eq!(r.prob, 1.0);
    }

    #[test]
    fn test_injected_survival_is_used() {
        let model = FixedDeviance(2.0);
        let evaluator = EffectEvaluator::new(&model, None)
            .with_survival(|dev, df| dev / (10.0 * df as f64));
        let r = evaluator.evaluate(&table(), &Combination::new(&["pos1"])).unwrap();
        assert!((r.prob - 2.0 / 30.0).abs() < 1.0e-12);
        assert_eq!(r.formula, "fixed pos1");
    }

    #[test]
    fn test_results_keyed_in_enumeration_order() {
        let t = table();
        let combos = combinations(t.positions(), 2);
        let model = LogLinearModel;
        let results = EffectEvaluator::new(&model, None).position_effects(&t, &combos).unwrap();

        assert_eq!(results.len(), 6);
        let keys: Vec<&Combination> = results.keys().collect();
        let expected: Vec<&Combination> = combos.iter().collect();
        assert_eq!(keys, expected);
        for r in results.values() {
            assert!(r.rel_entropy >= 0.0);
            assert!(r.prob >= 0.0 && r.prob <= 1.0);
            assert_eq!(r.df, 9);
            assert_eq!(r.stats.len(), 32);
        }
        assert!(max_rel_entropy(&results) > 0.0);
    }

    #[test]
    fn test_grouped_effects() {
        let t = table();
        let combos = combinations(t.positions(), 1);
        let model = LogLinearModel;
        let results = EffectEvaluator::new(&model, Some("strand")).position_effects(&t, &combos).unwrap();
        let r = results.get(&Combination::new(&["pos0"])).unwrap();
        assert_eq!(r.stats.len(), 16);
        assert_eq!(r.df, 3);
        assert_eq!(r.formula, "count ~ strand*mut*pos0 - strand:mut:pos0");
    }

    #[test]
    fn test_group_column_must_have_two_values() {
        let t = table().with_constant_column("group", "1").unwrap();
        let combos = combinations(t.positions(), 1);
        let model = LogLinearModel;
        match EffectEvaluator::new(&model, Some("group")).position_effects(&t, &combos) {
            Err(Error::Config(_)) => {},
            other => panic!("expected configuration error, got {:?}", other.map(|r| r.len())),
        }
    }
}
