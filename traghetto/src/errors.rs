//! Definition of errors.

use std::error::Error;
use std::fmt;

pub type Result<T, E = TraghettoError> = std::result::Result<T, E>;

#[derive(Debug)]
pub enum TraghettoError {
    InvalidModel(InvalidModelError),
    InvalidArgument(InvalidArgumentError),
    FrozenVocab(FrozenVocabError),
    UntrainedModel(UntrainedModelError),
    DecodeError(bincode::error::DecodeError),
    EncodeError(bincode::error::EncodeError),
    IOError(std::io::Error),
}

impl TraghettoError {
    pub(crate) fn invalid_model<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidModel(InvalidModelError { msg: msg.into() })
    }

    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    pub(crate) fn frozen_vocab<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::FrozenVocab(FrozenVocabError { msg: msg.into() })
    }

    pub(crate) fn untrained_model<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::UntrainedModel(UntrainedModelError { msg: msg.into() })
    }
}

impl fmt::Display for TraghettoError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidModel(e) => e.fmt(f),
            Self::InvalidArgument(e) => e.fmt(f),
            Self::FrozenVocab(e) => e.fmt(f),
            Self::UntrainedModel(e) => e.fmt(f),
            Self::DecodeError(e) => e.fmt(f),
            Self::EncodeError(e) => e.fmt(f),
            Self::IOError(e) => e.fmt(f),
        }
    }
}

impl Error for TraghettoError {}

/// Error used when the model is invalid.
#[derive(Debug)]
pub struct InvalidModelError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidModelError: {}", self.msg)
    }
}

impl Error for InvalidModelError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Name of the argument.
    pub(crate) arg: &'static str,

    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// Error used when mutating a vocabulary whose key set is already finalized.
#[derive(Debug)]
pub struct FrozenVocabError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for FrozenVocabError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FrozenVocabError: {}", self.msg)
    }
}

impl Error for FrozenVocabError {}

/// Error used when decoding is requested before training completes.
#[derive(Debug)]
pub struct UntrainedModelError {
    /// Error message.
    pub(crate) msg: String,
}

impl fmt::Display for UntrainedModelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "UntrainedModelError: {}", self.msg)
    }
}

impl Error for UntrainedModelError {}

impl From<bincode::error::DecodeError> for TraghettoError {
    fn from(error: bincode::error::DecodeError) -> Self {
        Self::DecodeError(error)
    }
}

impl From<bincode::error::EncodeError> for TraghettoError {
    fn from(error: bincode::error::EncodeError) -> Self {
        Self::EncodeError(error)
    }
}

impl From<std::io::Error> for TraghettoError {
    fn from(error: std::io::Error) -> Self {
        Self::IOError(error)
    }
}
