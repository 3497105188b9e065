use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Result, TraghettoError};
use crate::lexicon::Lexicon;
use crate::model::Model;
use crate::ngram_model::NgramTable;
use crate::tag::{Tag, N_SYMBOLS};

/// Numerals, optionally signed, decorated, or percent-suffixed.
static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+([.,/:-][0-9]+)*%?$").unwrap());

/// Mentions and hashtags.
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[@#]\w+$").unwrap());

/// Runs of two or more punctuation characters.
static PUNCT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[[:punct:]]{2,}$").unwrap());

/// Substitute log-probability for trigrams absent from the table.
const MISSING_TRIGRAM_LOG_PROB: f64 = -13.815_510_557_964_274; // ln(1e-6)

/// Substitute log-probability for emission weights that round to zero.
const ZERO_EMISSION_LOG_PROB: f64 = -1.0;

fn is_url(token: &str) -> bool {
    token.starts_with("http://") || token.starts_with("https://") || token.starts_with("www.")
}

/// Predictor.
///
/// Owns the trained artifacts read-only; `predict` calls are independent
/// and may run concurrently, each owning its transient score tables.
///
/// # Examples
///
/// ```no_run
/// use std::fs::File;
/// use std::io::BufReader;
///
/// use traghetto::{Model, Predictor};
///
/// let mut f = BufReader::new(File::open("model.bin").unwrap());
/// let model = Model::read(&mut f).unwrap();
/// let predictor = Predictor::new(model).unwrap();
///
/// let tags = predictor.predict(&["the", "dog", "is", "beautiful"]);
/// assert_eq!(4, tags.len());
/// ```
pub struct Predictor {
    lexicon: Lexicon,
    ngrams: NgramTable,
}

impl Predictor {
    /// Creates a new predictor.
    ///
    /// # Arguments
    ///
    /// * `model` - A model data.
    ///
    /// # Errors
    ///
    /// [`TraghettoError::UntrainedModel`] if the model carries no
    /// vocabulary or no trigram distribution.
    pub fn new(model: Model) -> Result<Self> {
        if model.lexicon.is_empty() {
            return Err(TraghettoError::untrained_model(
                "the vocabulary has not been trained",
            ));
        }
        if !model.ngrams.has_trigrams() {
            return Err(TraghettoError::untrained_model(
                "the tag distribution has not been trained",
            ));
        }
        Ok(Self {
            lexicon: model.lexicon,
            ngrams: model.ngrams,
        })
    }

    /// Emission distribution of one token: `(tag, weight)` candidates.
    ///
    /// Checked in order, first match wins: numerals are forced to `NUM`,
    /// mentions/hashtags and URLs to `X`, punctuation runs to `.`, each
    /// with weight 1. Everything else goes through the vocabulary; known
    /// terms with a usable per-tag frequency vector get it normalized over
    /// the tag marginals, known terms without one get their class
    /// distribution, unknown terms get the catch-all distribution.
    fn emissions(&self, token: &str) -> Vec<(Tag, f64)> {
        if NUMERIC.is_match(token) {
            return vec![(Tag::Num, 1.0)];
        }
        if MENTION.is_match(token) {
            return vec![(Tag::X, 1.0)];
        }
        if is_url(token) {
            return vec![(Tag::X, 1.0)];
        }
        if PUNCT_RUN.is_match(token) {
            return vec![(Tag::Punct, 1.0)];
        }
        if let Some(record) = self.lexicon.lookup(token) {
            let class = self.lexicon.class(record.class);
            if let Some(freqs) = &record.tag_freq {
                // A frequency vector that does not line up with the class
                // tag set falls back to the class distribution.
                if freqs.len() == class.tags().len() {
                    let weights: Vec<f64> = class
                        .tags()
                        .iter()
                        .zip(freqs)
                        .map(|(&t, &f)| {
                            let marginal = self.lexicon.tag_frequency(
                                Tag::from_index(t.into()).unwrap(),
                            );
                            if marginal == 0 {
                                0.0
                            } else {
                                f64::from(f) / marginal as f64
                            }
                        })
                        .collect();
                    let total: f64 = weights.iter().sum();
                    if total > 0.0 {
                        return class
                            .tags()
                            .iter()
                            .zip(weights)
                            .map(|(&t, w)| (Tag::from_index(t.into()).unwrap(), w / total))
                            .collect();
                    }
                }
            }
            return self.lexicon.emission_distribution(record.class);
        }
        self.lexicon
            .emission_distribution(self.lexicon.catch_all_class())
    }

    fn transition_log_prob(&self, w: Tag, u: Tag, v: Tag) -> f64 {
        let path = format!("{}+{}+{}", w.name(), u.name(), v.name());
        self.ngrams
            .log_probability(&path)
            .unwrap_or(MISSING_TRIGRAM_LOG_PROB)
    }

    /// Predicts the tag sequence of a tokenized sentence.
    ///
    /// # Arguments
    ///
    /// * `tokens` - An ordered token sequence.
    ///
    /// # Returns
    ///
    /// One tag per token, in token order. Empty input yields an empty
    /// sequence.
    pub fn predict<S>(&self, tokens: &[S]) -> Vec<Tag>
    where
        S: AsRef<str>,
    {
        let n = tokens.len();
        if n == 0 {
            return vec![];
        }
        let emissions: Vec<Vec<(Tag, f64)>> = tokens
            .iter()
            .map(|t| self.emissions(t.as_ref()))
            .collect();
        // Tags possible at 1-based position k; `*` before the sentence.
        let candidates = |k: isize| -> Vec<Tag> {
            if k < 1 {
                vec![Tag::Star]
            } else {
                emissions[k as usize - 1].iter().map(|&(t, _)| t).collect()
            }
        };

        let star = Tag::Star.index();
        let mut pi = vec![[[0.0f64; N_SYMBOLS]; N_SYMBOLS]; n + 1];
        let mut backpointers = vec![[[Tag::Star; N_SYMBOLS]; N_SYMBOLS]; n + 1];
        pi[0][star][star] = 1.0;

        for k in 1..=n {
            let ws = candidates(k as isize - 2);
            let us = candidates(k as isize - 1);
            for &u in &us {
                for &(v, weight) in &emissions[k - 1] {
                    let emission = if weight == 0.0 {
                        ZERO_EMISSION_LOG_PROB
                    } else {
                        weight.ln()
                    };
                    let mut best_score = f64::INFINITY;
                    let mut best_w = ws[0];
                    for &w in &ws {
                        let score = pi[k - 1][w.index()][u.index()]
                            * self.transition_log_prob(w, u, v)
                            * emission;
                        if score < best_score {
                            best_score = score;
                            best_w = w;
                        }
                    }
                    pi[k][u.index()][v.index()] = best_score;
                    backpointers[k][u.index()][v.index()] = best_w;
                }
            }
        }

        let us = candidates(n as isize - 1);
        let vs = candidates(n as isize);
        let mut best_score = f64::NEG_INFINITY;
        let mut best_pair = (us[0], vs[0]);
        for &u in &us {
            for &v in &vs {
                let score =
                    pi[n][u.index()][v.index()] * self.transition_log_prob(u, v, Tag::Stop);
                if score > best_score {
                    best_score = score;
                    best_pair = (u, v);
                }
            }
        }

        let (mut u, mut v) = best_pair;
        let mut tags = vec![v];
        if n >= 2 {
            tags.push(u);
        }
        for k in (3..=n).rev() {
            let w = backpointers[k][u.index()][v.index()];
            tags.push(w);
            v = u;
            u = w;
        }
        tags.reverse();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconBuilder;
    use crate::ngram_model::Lambda;

    fn fixture_predictor() -> Predictor {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tthe\t8\t90");
        builder.push_row("2\tdog\t0\t25");
        builder.push_row("3\tis\t1\t40");
        builder.push_row("4\tbeautiful\t2\t15");
        let lexicon = builder.finalize().unwrap();

        let mut ngrams = NgramTable::new();
        for row in [
            "DET\t90\t",
            "NOUN\t25\t",
            "VERB\t40\t",
            "ADJ\t15\t",
            "DET+NOUN\t25\t",
            "NOUN+VERB\t25\t",
            "VERB+ADJ\t15\t",
            "*+*+DET\t90\t",
            "*+DET+NOUN\t25\t",
            "DET+NOUN+VERB\t25\t",
            "NOUN+VERB+ADJ\t15\t",
            "VERB+ADJ+STOP\t15\t",
        ] {
            ngrams.push_row(row);
        }
        ngrams.estimate(Lambda::new(0.2, 0.3, 0.5).unwrap());
        Predictor::new(Model::new(lexicon, ngrams, Lambda::new(0.2, 0.3, 0.5).unwrap())).unwrap()
    }

    #[test]
    fn test_untrained_model_is_rejected() {
        let lexicon = LexiconBuilder::new().finalize().unwrap();
        let e = Predictor::new(Model::new(lexicon, NgramTable::new(), Lambda::default()));
        assert!(matches!(e, Err(TraghettoError::UntrainedModel(_))));

        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tdog\t0");
        let lexicon = builder.finalize().unwrap();
        let mut ngrams = NgramTable::new();
        ngrams.push_row("NOUN\t5\t");
        let e = Predictor::new(Model::new(lexicon, ngrams, Lambda::default()));
        assert!(matches!(e, Err(TraghettoError::UntrainedModel(_))));
    }

    #[test]
    fn test_empty_input() {
        let predictor = fixture_predictor();
        assert_eq!(Vec::<Tag>::new(), predictor.predict::<&str>(&[]));
    }

    #[test]
    fn test_output_length_matches_input() {
        let predictor = fixture_predictor();
        for tokens in [
            vec!["dog"],
            vec!["the", "dog"],
            vec!["the", "dog", "is"],
            vec!["unseen", "words", "only", "here", "now"],
        ] {
            assert_eq!(tokens.len(), predictor.predict(&tokens).len());
        }
    }

    #[test]
    fn test_forced_numeric() {
        let predictor = fixture_predictor();
        assert_eq!(vec![Tag::Num], predictor.predict(&["42%"]));
        assert_eq!(vec![Tag::Num], predictor.predict(&["3.14"]));
        assert_eq!(vec![Tag::Num], predictor.predict(&["1,500"]));
        assert_eq!(vec![Tag::Num], predictor.predict(&["-7"]));
    }

    #[test]
    fn test_forced_mention_and_hashtag() {
        let predictor = fixture_predictor();
        assert_eq!(vec![Tag::X], predictor.predict(&["#cool"]));
        assert_eq!(vec![Tag::X], predictor.predict(&["@someone"]));
    }

    #[test]
    fn test_forced_url() {
        let predictor = fixture_predictor();
        assert_eq!(vec![Tag::X], predictor.predict(&["https://example.com"]));
        assert_eq!(vec![Tag::X], predictor.predict(&["www.example.com"]));
    }

    #[test]
    fn test_forced_punctuation_run() {
        let predictor = fixture_predictor();
        assert_eq!(vec![Tag::Punct], predictor.predict(&["!!!"]));
        assert_eq!(vec![Tag::Punct], predictor.predict(&["?!"]));
    }

    #[test]
    fn test_forced_tags_win_inside_sentences() {
        let predictor = fixture_predictor();
        let tags = predictor.predict(&["the", "dog", "is", "42%"]);
        assert_eq!(Tag::Num, tags[3]);
    }

    #[test]
    fn test_fixture_sentence() {
        let predictor = fixture_predictor();
        let tags = predictor.predict(&["the", "dog", "is", "beautiful"]);
        assert_eq!(Tag::Noun, tags[1]);
        assert_eq!(Tag::Verb, tags[2]);
        assert_eq!(Tag::Adj, tags[3]);
    }

    #[test]
    fn test_unknown_tokens_use_catch_all() {
        let predictor = fixture_predictor();
        // Unknown tokens draw candidates from the catch-all class, so any
        // of the 12 tags is legal; the call must simply succeed per token.
        let tags = predictor.predict(&["xylophone"]);
        assert_eq!(1, tags.len());
        assert!(tags[0].index() < crate::tag::N_TAGS);
    }
}
