//! # Traghetto
//!
//! Traghetto is a statistical part-of-speech tagger: a trigram hidden
//! Markov model decoded with dynamic programming, over a vocabulary stored
//! in a minimal perfect hash table.
//!
//! Training consumes a tagged dictionary and a tag n-gram frequency table;
//! interpolation weights are tuned by held-out cross-validation. The
//! trained model is a single serializable artifact.
//!
//! ## Examples
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{prelude::*, stdin, BufReader};
//!
//! use traghetto::{Model, Predictor};
//!
//! let mut f = BufReader::new(File::open("model.bin").unwrap());
//! let model = Model::read(&mut f).unwrap();
//! let predictor = Predictor::new(model).unwrap();
//!
//! for line in stdin().lock().lines() {
//!     let line = line.unwrap();
//!     let tokens: Vec<&str> = line.split_whitespace().collect();
//!     for (token, tag) in tokens.iter().zip(predictor.predict(&tokens)) {
//!         print!("{}/{} ", token, tag);
//!     }
//!     println!();
//! }
//! ```

mod errors;
mod lexicon;
mod model;
mod ngram_model;
mod predictor;
mod tag;
mod trainer;
mod utils;
mod vocab;

pub use errors::{Result, TraghettoError};
pub use lexicon::{EquivClass, Lexicon, LexiconBuilder, TermRecord};
pub use model::{Model, MODEL_VERSION};
pub use ngram_model::{select_lambda, Lambda, NgramEntry, NgramTable};
pub use predictor::Predictor;
pub use tag::{Tag, N_TAGS, TAGS};
pub use trainer::Trainer;
pub use vocab::VocabularyStore;
