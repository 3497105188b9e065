use std::io::{Read, Write};

use bincode::{Decode, Encode};

use crate::errors::{Result, TraghettoError};
use crate::lexicon::Lexicon;
use crate::ngram_model::{Lambda, NgramTable};

/// Leading magic bytes identifying a traghetto model blob. Checked before
/// any decoding so foreign files fail with a typed error, not a decode one.
const MODEL_MAGIC: [u8; 10] = *b"traghetto\0";

/// Current model format version. Bumped whenever the encoded layout
/// changes; readers reject anything else.
pub const MODEL_VERSION: u32 = 1;

/// Model data: the trained vocabulary, the smoothed tag distribution, and
/// the selected lambda vector.
#[derive(Encode, Decode)]
pub struct Model {
    pub(crate) version: u32,
    pub(crate) lexicon: Lexicon,
    pub(crate) ngrams: NgramTable,
    pub(crate) lambda: Lambda,
}

impl Model {
    /// Assembles a model from finalized training artifacts.
    pub fn new(lexicon: Lexicon, ngrams: NgramTable, lambda: Lambda) -> Self {
        Self {
            version: MODEL_VERSION,
            lexicon,
            ngrams,
            lambda,
        }
    }

    /// The lambda vector the tag distribution was estimated under.
    pub fn lambda(&self) -> Lambda {
        self.lambda
    }

    /// Exports the model data.
    ///
    /// # Arguments
    ///
    /// * `wtr` - Byte-oriented sink object.
    ///
    /// # Errors
    ///
    /// When `wtr` generates an error, it will be returned as is.
    pub fn write<W>(&self, wtr: &mut W) -> Result<()>
    where
        W: Write,
    {
        wtr.write_all(&MODEL_MAGIC)?;
        bincode::encode_into_std_write(self, wtr, bincode::config::standard())?;
        Ok(())
    }

    /// Creates a model from a reader.
    ///
    /// # Arguments
    ///
    /// * `rdr` - A data source.
    ///
    /// # Returns
    ///
    /// A model data read from `rdr`.
    ///
    /// # Errors
    ///
    /// [`TraghettoError::InvalidModel`] if the magic bytes are missing, the
    /// version does not match this crate, or the lambda vector is corrupt;
    /// decode and I/O errors are returned as is.
    pub fn read<R>(rdr: &mut R) -> Result<Self>
    where
        R: Read,
    {
        let mut magic = [0u8; MODEL_MAGIC.len()];
        rdr.read_exact(&mut magic)?;
        if magic != MODEL_MAGIC {
            return Err(TraghettoError::invalid_model(
                "not a traghetto model (bad magic bytes)",
            ));
        }
        let model: Self = bincode::decode_from_std_read(rdr, bincode::config::standard())?;
        if model.version != MODEL_VERSION {
            return Err(TraghettoError::invalid_model(format!(
                "unsupported model version {} (expected {})",
                model.version, MODEL_VERSION
            )));
        }
        let sum: f64 = model.lambda.0.iter().sum();
        if model.lambda.0.iter().any(|&l| l < 0.0) || (sum - 1.0).abs() > 1e-6 {
            return Err(TraghettoError::invalid_model(
                "lambda weights must be non-negative and sum to 1",
            ));
        }
        Ok(model)
    }
}
