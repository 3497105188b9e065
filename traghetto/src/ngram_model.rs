use bincode::{Decode, Encode};

use crate::errors::{Result, TraghettoError};
use crate::tag::Tag;
use crate::utils::SerializableHashMap;

/// Separator of tag names inside an n-gram path string.
pub(crate) const PATH_SEPARATOR: char = '+';

/// Interpolation weights for unigram, bigram, and trigram maximum-likelihood
/// estimates, in that order. Non-negative, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Encode, Decode)]
pub struct Lambda(pub(crate) [f64; 3]);

impl Lambda {
    /// Creates a lambda vector.
    ///
    /// # Errors
    ///
    /// [`TraghettoError::InvalidArgument`] if a weight is negative or the
    /// weights do not sum to 1.
    pub fn new(l1: f64, l2: f64, l3: f64) -> Result<Self> {
        if l1 < 0.0 || l2 < 0.0 || l3 < 0.0 {
            return Err(TraghettoError::invalid_argument(
                "lambda",
                "weights must be non-negative",
            ));
        }
        if (l1 + l2 + l3 - 1.0).abs() > 1e-9 {
            return Err(TraghettoError::invalid_argument(
                "lambda",
                format!("weights must sum to 1, got {}", l1 + l2 + l3),
            ));
        }
        Ok(Self([l1, l2, l3]))
    }

    /// The weights as a slice, unigram first.
    pub fn weights(&self) -> &[f64; 3] {
        &self.0
    }
}

impl Default for Lambda {
    /// Uniform interpolation, used until [`select_lambda`] picks a vector.
    fn default() -> Self {
        Self([1.0 / 3.0; 3])
    }
}

/// One n-gram row with its derived estimates.
///
/// `max_likelihood` is `None` until [`NgramTable::estimate`] runs, and stays
/// `None` for entries whose own or suffix frequency is zero. `probability`
/// and `log_probability` are recomputed by every `estimate` call; the raw
/// frequency never changes after ingestion.
#[derive(Debug, Clone, Default, Encode, Decode)]
pub struct NgramEntry {
    pub(crate) frequency: u64,
    pub(crate) max_likelihood: Option<f64>,
    pub(crate) probability: f64,
    pub(crate) log_probability: f64,
}

impl NgramEntry {
    /// Raw observed frequency of the path.
    pub fn frequency(&self) -> u64 {
        self.frequency
    }

    /// Smoothed log-probability from the last `estimate` call.
    pub fn log_probability(&self) -> f64 {
        self.log_probability
    }
}

/// Smoothed trigram tag distribution, keyed by `+`-joined tag paths
/// (e.g. `"NOUN+VERB+STOP"`).
///
/// Rows are tab-separated: `tagPath \t frequency \t distributionPercent`;
/// the trailing percent column is ignored. Malformed rows are counted and
/// skipped.
///
/// # Examples
///
/// ```
/// use traghetto::{Lambda, NgramTable};
///
/// let mut table = NgramTable::new();
/// table.push_row("NOUN\t8\t");
/// table.push_row("VERB\t2\t");
/// table.push_row("NOUN+VERB\t2\t");
/// table.estimate(Lambda::default());
///
/// assert!(table.log_probability("NOUN+VERB").is_some());
/// assert!(table.log_probability("VERB+NOUN").is_none());
/// ```
#[derive(Debug, Default, Encode, Decode)]
pub struct NgramTable {
    entries: SerializableHashMap<String, NgramEntry>,
    total_unigrams: u64,
    n_rows: u64,
    n_skipped: u64,
}

impl NgramTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests one frequency row. Malformed rows are counted and skipped.
    pub fn push_row(&mut self, row: &str) {
        self.n_rows += 1;
        if self.parse_row(row).is_none() {
            self.n_skipped += 1;
        }
    }

    fn parse_row(&mut self, row: &str) -> Option<()> {
        let mut fields = row.split('\t');
        let path = fields.next()?.trim();
        let frequency: u64 = fields.next()?.trim().parse().ok()?;
        let order = path.split(PATH_SEPARATOR).count();
        if order == 0 || order > 3 {
            return None;
        }
        for name in path.split(PATH_SEPARATOR) {
            Tag::from_name(name)?;
        }
        if order == 1 {
            self.total_unigrams += frequency;
        }
        let entry = self.entries.entry(path.to_string()).or_default();
        entry.frequency += frequency;
        Some(())
    }

    /// Number of rows ingested so far, including skipped ones.
    pub fn n_rows(&self) -> u64 {
        self.n_rows
    }

    /// Number of malformed rows skipped so far.
    pub fn n_skipped(&self) -> u64 {
        self.n_skipped
    }

    /// Number of distinct paths in the table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks if the table contains no paths.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all unigram frequencies.
    pub fn total_unigrams(&self) -> u64 {
        self.total_unigrams
    }

    pub(crate) fn has_trigrams(&self) -> bool {
        self.entries
            .keys()
            .any(|p| p.split(PATH_SEPARATOR).count() == 3)
    }

    /// Smoothed log-probability of a path, if present.
    pub fn log_probability(&self, path: &str) -> Option<f64> {
        self.entries.get(path).map(|e| e.log_probability)
    }

    /// Recomputes all derived estimates under the given lambda vector.
    ///
    /// First pass: the maximum-likelihood estimate of every path is its
    /// frequency over the frequency of its suffix (the path minus the
    /// leading tag), the total unigram mass for unigrams. Entries whose own
    /// or suffix frequency is zero are left unestimated.
    ///
    /// Second pass: the smoothed probability is the right-anchored linear
    /// interpolation `Σ lambda[k-1] · ML(last k tags)`, missing or
    /// unestimated sub-grams contributing 0; the log-probability is its
    /// natural log.
    ///
    /// Idempotent for a fixed lambda over unchanged frequencies.
    pub fn estimate(&mut self, lambda: Lambda) {
        let mls: Vec<(String, Option<f64>)> = self
            .entries
            .iter()
            .map(|(path, entry)| {
                let suffix_freq = match path.split_once(PATH_SEPARATOR) {
                    Some((_, suffix)) => self.entries.get(suffix).map_or(0, |e| e.frequency),
                    None => self.total_unigrams,
                };
                let ml = if entry.frequency == 0 || suffix_freq == 0 {
                    None
                } else {
                    Some(entry.frequency as f64 / suffix_freq as f64)
                };
                (path.clone(), ml)
            })
            .collect();
        for (path, ml) in mls {
            self.entries.get_mut(&path).unwrap().max_likelihood = ml;
        }

        let probs: Vec<(String, f64)> = self
            .entries
            .keys()
            .map(|path| {
                let parts: Vec<&str> = path.split(PATH_SEPARATOR).collect();
                let mut probability = 0.0;
                for k in 1..=parts.len() {
                    let sub = parts[parts.len() - k..].join("+");
                    if let Some(ml) = self.entries.get(&sub).and_then(|e| e.max_likelihood) {
                        probability += lambda.0[k - 1] * ml;
                    }
                }
                (path.clone(), probability)
            })
            .collect();
        for (path, probability) in probs {
            let entry = self.entries.get_mut(&path).unwrap();
            entry.probability = probability;
            entry.log_probability = probability.ln();
        }
    }

    /// Held-out log-likelihood of this table's trigram estimates against
    /// another table's observed frequencies. Trigrams absent from `other`
    /// contribute 0.
    pub fn cross_validate(&self, other: &NgramTable) -> f64 {
        let mut score = 0.0;
        for (path, entry) in self.entries.iter() {
            if path.split(PATH_SEPARATOR).count() != 3 {
                continue;
            }
            if let Some(held_out) = other.entries.get(path) {
                if held_out.frequency > 0 {
                    score += entry.log_probability * held_out.frequency as f64;
                }
            }
        }
        score
    }
}

/// Sweeps the lambda grid and keeps the vector maximizing the held-out
/// log-likelihood against `validation`, then scores the winner once against
/// `test`.
///
/// The grid is every `(l1, l2, l3)` in 0.1 steps with `l1 + l2 + l3 = 1`.
/// `train` is left estimated under the winning vector.
///
/// # Returns
///
/// The winning lambda vector and its score against `test`.
pub fn select_lambda(
    train: &mut NgramTable,
    validation: &NgramTable,
    test: &NgramTable,
) -> (Lambda, f64) {
    let mut best_lambda = Lambda::default();
    let mut best_score = f64::NEG_INFINITY;
    for i in 0..=10u32 {
        for j in 0..=(10 - i) {
            let k = 10 - i - j;
            let lambda = Lambda([
                f64::from(i) / 10.0,
                f64::from(j) / 10.0,
                f64::from(k) / 10.0,
            ]);
            train.estimate(lambda);
            let score = train.cross_validate(validation);
            if score > best_score {
                best_score = score;
                best_lambda = lambda;
            }
        }
    }
    train.estimate(best_lambda);
    let test_score = train.cross_validate(test);
    (best_lambda, test_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&str]) -> NgramTable {
        let mut t = NgramTable::new();
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn test_malformed_rows_are_counted_not_fatal() {
        let mut t = NgramTable::new();
        t.push_row("NOUN\t5\t41.7");
        t.push_row("no frequency column");
        t.push_row("NOUN+BOGUS\t3\t");
        t.push_row("NOUN+VERB+ADJ+STOP\t3\t");
        t.push_row("VERB\t7");
        assert_eq!(5, t.n_rows());
        assert_eq!(3, t.n_skipped());
        assert_eq!(2, t.len());
        assert_eq!(12, t.total_unigrams());
    }

    #[test]
    fn test_maximum_likelihood() {
        let mut t = table(&["NOUN\t8\t", "VERB\t2\t", "NOUN+VERB\t2\t"]);
        t.estimate(Lambda::new(0.0, 1.0, 0.0).unwrap());
        // ML(NOUN) = 8/10, ML(NOUN+VERB) = f(NOUN+VERB)/f(VERB) = 2/2.
        let noun = t.entries.get("NOUN").unwrap();
        assert!((noun.max_likelihood.unwrap() - 0.8).abs() < 1e-12);
        let bigram = t.entries.get("NOUN+VERB").unwrap();
        assert!((bigram.max_likelihood.unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolated_probability() {
        let mut t = table(&["NOUN\t8\t", "VERB\t2\t", "NOUN+VERB\t2\t"]);
        t.estimate(Lambda::new(0.5, 0.5, 0.0).unwrap());
        // P(NOUN+VERB) = 0.5 * ML(VERB) + 0.5 * ML(NOUN+VERB)
        //             = 0.5 * 0.2 + 0.5 * 1.0 = 0.6
        let bigram = t.entries.get("NOUN+VERB").unwrap();
        assert!((bigram.probability - 0.6).abs() < 1e-12);
        assert!((bigram.log_probability - 0.6f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_missing_subgram_contributes_zero() {
        let mut t = table(&["VERB\t2\t", "NOUN+VERB\t2\t"]);
        // The NOUN unigram is absent, so only lambda[1] can contribute to
        // the bigram.
        t.estimate(Lambda::new(0.5, 0.5, 0.0).unwrap());
        let bigram = t.entries.get("NOUN+VERB").unwrap();
        assert!((bigram.probability - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_estimate_is_idempotent() {
        let mut t = table(&[
            "NOUN\t8\t",
            "VERB\t2\t",
            "NOUN+VERB\t2\t",
            "*+NOUN+VERB\t1\t",
        ]);
        let lambda = Lambda::new(0.2, 0.3, 0.5).unwrap();
        t.estimate(lambda);
        let first: Vec<(String, f64)> = t
            .entries
            .iter()
            .map(|(p, e)| (p.clone(), e.log_probability))
            .collect();
        t.estimate(lambda);
        for (path, logp) in first {
            assert_eq!(logp, t.entries.get(&path).unwrap().log_probability);
        }
    }

    #[test]
    fn test_cross_validate_counts_trigrams_only() {
        let mut t = table(&["NOUN\t10\t", "NOUN+NOUN\t5\t", "NOUN+NOUN+NOUN\t5\t"]);
        t.estimate(Lambda::new(1.0, 0.0, 0.0).unwrap());
        let held_out = table(&[
            "NOUN\t3\t",
            "NOUN+NOUN\t3\t",
            "NOUN+NOUN+NOUN\t3\t",
            "VERB+VERB+VERB\t9\t",
        ]);
        // Only NOUN+NOUN+NOUN overlaps at order 3: logP = ln(ML(NOUN)) = ln(1).
        let score = t.cross_validate(&held_out);
        assert!((score - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_select_lambda_maximizes_validation_score() {
        // Train data where the trigram ML is certain (1.0) but the unigram
        // and bigram MLs are diluted, so pure trigram weight maximizes the
        // held-out likelihood.
        let mut train = table(&[
            "NOUN\t5\t",
            "VERB\t5\t",
            "NOUN+VERB\t1\t",
            "VERB+VERB\t4\t",
            "NOUN+NOUN+VERB\t1\t",
        ]);
        let validation = table(&["NOUN+NOUN+VERB\t7\t"]);
        let test = table(&["NOUN+NOUN+VERB\t2\t"]);
        let (lambda, test_score) = select_lambda(&mut train, &validation, &test);
        assert_eq!(&[0.0, 0.0, 1.0], lambda.weights());
        // ML(NOUN+NOUN+VERB) = 1/1, so the winning probability is 1.0 and
        // the score is 0 for validation and test alike.
        assert!((test_score - 0.0).abs() < 1e-12);
    }

    #[test]
    fn test_lambda_validation() {
        assert!(Lambda::new(0.2, 0.3, 0.5).is_ok());
        assert!(Lambda::new(-0.1, 0.6, 0.5).is_err());
        assert!(Lambda::new(0.5, 0.5, 0.5).is_err());
    }
}
