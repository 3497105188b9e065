use bincode::{Decode, Encode};
use hashbrown::HashMap;

use crate::errors::Result;
use crate::tag::{Tag, N_TAGS};
use crate::utils::SerializableHashMap;
use crate::vocab::VocabularyStore;

/// A trained vocabulary term.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct TermRecord {
    /// Index of the equivalence class the term belongs to.
    pub(crate) class: u32,

    /// Observed frequency per candidate tag, aligned positionally with the
    /// tag set of the term's class. Absent when the dictionary row carried
    /// no frequency column.
    pub(crate) tag_freq: Option<Vec<u32>>,
}

/// A set of candidate tags shared by all terms with the same ambiguity
/// profile.
#[derive(Debug, Clone, Encode, Decode)]
pub struct EquivClass {
    /// Ascending tag indices. Never mutated after training completes.
    pub(crate) tags: Vec<u8>,

    /// Aggregate observed frequency over all member terms.
    pub(crate) frequency: u64,

    /// Frequency-weighted log-weight per tag. Computed at finalization but
    /// not used for the emission distribution, which stays uniform; kept so
    /// a weighted distribution can be switched on without retraining.
    pub(crate) tag_log_weights: Vec<f64>,
}

impl EquivClass {
    /// The candidate tag indices of this class, ascending.
    pub fn tags(&self) -> &[u8] {
        &self.tags
    }

    /// Aggregate observed frequency of this class.
    pub fn frequency(&self) -> u64 {
        self.frequency
    }
}

/// Finalized vocabulary artifact: the perfect-hash store, term records,
/// equivalence classes, and the catch-all fallback distribution.
///
/// Read-only after [`LexiconBuilder::finalize`]; shared freely across
/// concurrent decode calls.
#[derive(Debug, Encode, Decode)]
pub struct Lexicon {
    pub(crate) vocab: VocabularyStore,
    pub(crate) terms: SerializableHashMap<u32, TermRecord>,
    pub(crate) classes: Vec<EquivClass>,
    /// Marginal observed frequency per singleton tag.
    pub(crate) tag_marginals: Vec<u64>,
    /// Catch-all emission weights, one per tag, summing to 1.
    pub(crate) catch_all_weights: Vec<f64>,
}

impl Lexicon {
    /// Looks up the record of a term. Lookup is case-insensitive.
    pub fn lookup(&self, term: &str) -> Option<&TermRecord> {
        let term_id = self.vocab.lookup(&term.to_lowercase())?;
        self.terms.get(&term_id)
    }

    /// Gets an equivalence class by index.
    pub fn class(&self, class_id: u32) -> &EquivClass {
        &self.classes[class_id as usize]
    }

    /// Index of the catch-all class used for unknown terms.
    pub fn catch_all_class(&self) -> u32 {
        (self.classes.len() - 1) as u32
    }

    /// Marginal observed frequency of a single tag across the vocabulary.
    pub fn tag_frequency(&self, tag: Tag) -> u64 {
        self.tag_marginals[tag.index()]
    }

    /// Number of trained terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Checks if the lexicon contains no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Emission distribution of a class: one `(tag, weight)` pair per
    /// candidate tag, weights summing to 1.
    ///
    /// Regular classes are uniform over their tag set. The catch-all class
    /// uses the normalized singleton-tag marginals instead.
    pub fn emission_distribution(&self, class_id: u32) -> Vec<(Tag, f64)> {
        let class = &self.classes[class_id as usize];
        if class_id == self.catch_all_class() {
            class
                .tags
                .iter()
                .zip(&self.catch_all_weights)
                .map(|(&t, &w)| (Tag::from_index(t.into()).unwrap(), w))
                .collect()
        } else {
            let w = 1.0 / class.tags.len() as f64;
            class
                .tags
                .iter()
                .map(|&t| (Tag::from_index(t.into()).unwrap(), w))
                .collect()
        }
    }
}

/// Accumulates dictionary rows and produces an immutable [`Lexicon`].
///
/// Rows are tab-separated: `termId \t term \t tagIndex[,tagIndex...] \t
/// [tagFrequency[,tagFrequency...]]`. Malformed rows are counted and
/// skipped; they never abort ingestion.
///
/// # Examples
///
/// ```
/// use traghetto::LexiconBuilder;
///
/// let mut builder = LexiconBuilder::new();
/// builder.push_row("3\tdog\t0\t12");
/// builder.push_row("7\tbark\t0,1\t4,9");
/// let lexicon = builder.finalize().unwrap();
///
/// assert_eq!(2, lexicon.len());
/// assert!(lexicon.lookup("DOG").is_some());
/// ```
#[derive(Default)]
pub struct LexiconBuilder {
    keys: HashMap<String, u32>,
    terms: HashMap<u32, TermRecord>,
    class_ids: HashMap<Vec<u8>, u32>,
    classes: Vec<EquivClass>,
    tag_marginals: Vec<u64>,
    n_rows: u64,
    n_skipped: u64,
}

impl LexiconBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self {
            tag_marginals: vec![0; N_TAGS],
            ..Self::default()
        }
    }

    /// Gets the class index of a sorted candidate tag set, allocating a new
    /// class on first sight. Idempotent.
    pub fn classify(&mut self, tags: &[u8]) -> u32 {
        if let Some(&id) = self.class_ids.get(tags) {
            return id;
        }
        let id = self.classes.len() as u32;
        self.class_ids.insert(tags.to_vec(), id);
        self.classes.push(EquivClass {
            tags: tags.to_vec(),
            frequency: 0,
            tag_log_weights: vec![],
        });
        id
    }

    /// Adds observed frequency to a class aggregate.
    pub fn increment_class(&mut self, class_id: u32, by: u64) {
        self.classes[class_id as usize].frequency += by;
    }

    /// Adds observed frequency to a singleton tag marginal.
    pub fn increment_singleton_tag(&mut self, tag_index: u8, by: u64) {
        self.tag_marginals[usize::from(tag_index)] += by;
    }

    /// Ingests one dictionary row. Malformed rows are counted and skipped.
    pub fn push_row(&mut self, row: &str) {
        self.n_rows += 1;
        if self.parse_row(row).is_none() {
            self.n_skipped += 1;
        }
    }

    fn parse_row(&mut self, row: &str) -> Option<()> {
        let mut fields = row.split('\t');
        let term_id: u32 = fields.next()?.trim().parse().ok()?;
        let term = fields.next()?.trim();
        if term.is_empty() {
            return None;
        }
        let mut tags = vec![];
        for part in fields.next()?.trim().split(',') {
            let idx: u8 = part.trim().parse().ok()?;
            if usize::from(idx) >= N_TAGS {
                return None;
            }
            tags.push(idx);
        }
        tags.sort_unstable();
        tags.dedup();
        let tag_freq = match fields.next().map(str::trim).filter(|f| !f.is_empty()) {
            Some(field) => {
                let mut freqs = vec![];
                for part in field.split(',') {
                    freqs.push(part.trim().parse::<u32>().ok()?);
                }
                Some(freqs)
            }
            None => None,
        };

        let class_id = self.classify(&tags);
        match &tag_freq {
            Some(freqs) => {
                for (&tag, &freq) in tags.iter().zip(freqs) {
                    self.increment_singleton_tag(tag, freq.into());
                }
                self.increment_class(class_id, freqs.iter().map(|&f| u64::from(f)).sum());
            }
            None => {
                for &tag in &tags {
                    self.increment_singleton_tag(tag, 1);
                }
                self.increment_class(class_id, tags.len() as u64);
            }
        }
        self.terms.insert(
            term_id,
            TermRecord {
                class: class_id,
                tag_freq,
            },
        );
        self.keys.insert(term.to_lowercase(), term_id);
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

    /// Builds the perfect-hash store, appends the catch-all class, and
    /// freezes everything into a [`Lexicon`].
    pub fn finalize(mut self) -> Result<Lexicon> {
        let mut vocab = VocabularyStore::new();
        for (key, term_id) in self.keys.drain() {
            vocab.insert(key, term_id)?;
        }
        vocab.build()?;

        for class in &mut self.classes {
            class.tag_log_weights = class
                .tags
                .iter()
                .map(|&t| {
                    let marginal = self.tag_marginals[usize::from(t)];
                    if marginal == 0 || class.frequency == 0 {
                        0.0
                    } else {
                        (marginal as f64 / class.frequency as f64).ln()
                    }
                })
                .collect();
        }

        let total: u64 = self.tag_marginals.iter().sum();
        let catch_all_weights: Vec<f64> = if total == 0 {
            vec![1.0 / N_TAGS as f64; N_TAGS]
        } else {
            self.tag_marginals
                .iter()
                .map(|&m| m as f64 / total as f64)
                .collect()
        };
        self.classes.push(EquivClass {
            tags: (0..N_TAGS as u8).collect(),
            frequency: total,
            tag_log_weights: vec![],
        });

        Ok(Lexicon {
            vocab,
            terms: SerializableHashMap(self.terms),
            classes: self.classes,
            tag_marginals: self.tag_marginals,
            catch_all_weights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_idempotent() {
        let mut builder = LexiconBuilder::new();
        let a = builder.classify(&[0, 1]);
        let b = builder.classify(&[2]);
        let c = builder.classify(&[0, 1]);
        assert_eq!(a, c);
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_rows_are_counted_not_fatal() {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tdog\t0");
        builder.push_row("not enough fields");
        builder.push_row("x\tdog\t0");
        builder.push_row("2\tcat\t99");
        builder.push_row("3\tis\t1");
        assert_eq!(5, builder.n_rows());
        assert_eq!(3, builder.n_skipped());
        let lexicon = builder.finalize().unwrap();
        assert_eq!(2, lexicon.len());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tDog\t0");
        let lexicon = builder.finalize().unwrap();
        assert!(lexicon.lookup("dog").is_some());
        assert!(lexicon.lookup("DOG").is_some());
        assert!(lexicon.lookup("cat").is_none());
    }

    #[test]
    fn test_terms_share_class_iff_same_tag_set() {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tbark\t0,1");
        builder.push_row("2\twalk\t1,0");
        builder.push_row("3\tdog\t0");
        let lexicon = builder.finalize().unwrap();
        let bark = lexicon.lookup("bark").unwrap();
        let walk = lexicon.lookup("walk").unwrap();
        let dog = lexicon.lookup("dog").unwrap();
        assert_eq!(bark.class, walk.class);
        assert_ne!(bark.class, dog.class);
        assert_eq!(&[0, 1], lexicon.class(bark.class).tags());
    }

    #[test]
    fn test_emission_distribution_is_uniform_and_normalized() {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tbark\t0,1\t30,10");
        let lexicon = builder.finalize().unwrap();
        let class_id = lexicon.lookup("bark").unwrap().class;
        let dist = lexicon.emission_distribution(class_id);
        assert_eq!(2, dist.len());
        // Uniform regardless of the 30/10 split.
        assert!((dist[0].1 - 0.5).abs() < 1e-12);
        assert!((dist[1].1 - 0.5).abs() < 1e-12);
        let total: f64 = dist.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_catch_all_distribution_uses_marginals() {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tdog\t0\t30");
        builder.push_row("2\tis\t1\t10");
        let lexicon = builder.finalize().unwrap();
        let dist = lexicon.emission_distribution(lexicon.catch_all_class());
        assert_eq!(N_TAGS, dist.len());
        let total: f64 = dist.iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((dist[Tag::Noun.index()].1 - 0.75).abs() < 1e-12);
        assert!((dist[Tag::Verb.index()].1 - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_tag_marginals() {
        let mut builder = LexiconBuilder::new();
        builder.push_row("1\tbark\t0,1\t30,10");
        builder.push_row("2\tdog\t0\t5");
        let lexicon = builder.finalize().unwrap();
        assert_eq!(35, lexicon.tag_frequency(Tag::Noun));
        assert_eq!(10, lexicon.tag_frequency(Tag::Verb));
        assert_eq!(0, lexicon.tag_frequency(Tag::Adj));
    }
}
