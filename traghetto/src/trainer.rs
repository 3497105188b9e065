use crate::errors::{Result, TraghettoError};
use crate::lexicon::{Lexicon, LexiconBuilder};
use crate::model::Model;
use crate::ngram_model::{select_lambda, Lambda, NgramTable};

/// Trainer.
///
/// Accumulates the two training inputs, optionally tunes the interpolation
/// weights, and assembles the final [`Model`]. Each input is a streaming
/// pass over rows; malformed rows are counted and skipped, never fatal.
///
/// # Examples
///
/// ```
/// use traghetto::{Predictor, Trainer};
///
/// let mut trainer = Trainer::new();
/// trainer.train_vocabulary(["2\tdog\t0\t25", "3\tis\t1\t40"]).unwrap();
/// trainer.train_tag_distribution([
///     "NOUN\t25\t",
///     "VERB\t40\t",
///     "*+NOUN+VERB\t20\t",
/// ]).unwrap();
///
/// let model = trainer.into_model().unwrap();
/// let predictor = Predictor::new(model).unwrap();
/// assert_eq!(2, predictor.predict(&["dog", "is"]).len());
/// ```
#[derive(Default)]
pub struct Trainer {
    lexicon: Option<Lexicon>,
    ngrams: Option<NgramTable>,
    lambda: Option<Lambda>,
    n_skipped: u64,
}

impl Trainer {
    /// Creates an empty trainer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trains the vocabulary from dictionary rows and finalizes it.
    ///
    /// # Arguments
    ///
    /// * `rows` - Tab-separated dictionary rows, one term each.
    ///
    /// # Errors
    ///
    /// Finalization errors are returned as is; malformed rows are only
    /// counted (see [`Trainer::n_skipped`]).
    pub fn train_vocabulary<I, S>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = LexiconBuilder::new();
        for row in rows {
            builder.push_row(row.as_ref());
        }
        self.n_skipped += builder.n_skipped();
        self.lexicon = Some(builder.finalize()?);
        Ok(())
    }

    /// Trains the tag distribution from n-gram frequency rows.
    ///
    /// # Arguments
    ///
    /// * `rows` - Tab-separated `path \t frequency` rows of order 1 to 3.
    pub fn train_tag_distribution<I, S>(&mut self, rows: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table = NgramTable::new();
        for row in rows {
            table.push_row(row.as_ref());
        }
        self.n_skipped += table.n_skipped();
        self.ngrams = Some(table);
        Ok(())
    }

    /// Selects the lambda vector by grid search against held-out splits.
    ///
    /// # Arguments
    ///
    /// * `validation_rows` - N-gram rows of the validation split.
    /// * `test_rows` - N-gram rows of the test split.
    ///
    /// # Returns
    ///
    /// The winning lambda vector and its log-likelihood against the test
    /// split.
    ///
    /// # Errors
    ///
    /// [`TraghettoError::UntrainedModel`] if the tag distribution has not
    /// been trained yet.
    pub fn select_lambda<I, J, S, T>(
        &mut self,
        validation_rows: I,
        test_rows: J,
    ) -> Result<(Lambda, f64)>
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let ngrams = self.ngrams.as_mut().ok_or_else(|| {
            TraghettoError::untrained_model("the tag distribution has not been trained")
        })?;
        let mut validation = NgramTable::new();
        for row in validation_rows {
            validation.push_row(row.as_ref());
        }
        let mut test = NgramTable::new();
        for row in test_rows {
            test.push_row(row.as_ref());
        }
        let (lambda, test_score) = select_lambda(ngrams, &validation, &test);
        self.lambda = Some(lambda);
        Ok((lambda, test_score))
    }

    /// Total number of malformed rows skipped across both inputs.
    pub fn n_skipped(&self) -> u64 {
        self.n_skipped
    }

    /// Assembles the model, estimating the distribution under the selected
    /// lambda vector (uniform if [`Trainer::select_lambda`] never ran).
    ///
    /// # Errors
    ///
    /// [`TraghettoError::UntrainedModel`] if either training input is
    /// missing.
    pub fn into_model(self) -> Result<Model> {
        let lexicon = self.lexicon.ok_or_else(|| {
            TraghettoError::untrained_model("the vocabulary has not been trained")
        })?;
        let mut ngrams = self.ngrams.ok_or_else(|| {
            TraghettoError::untrained_model("the tag distribution has not been trained")
        })?;
        let lambda = self.lambda.unwrap_or_default();
        ngrams.estimate(lambda);
        Ok(Model::new(lexicon, ngrams, lambda))
    }
}
