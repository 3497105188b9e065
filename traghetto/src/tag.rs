use core::fmt;

/// Number of part-of-speech tags, excluding the boundary symbols.
pub const N_TAGS: usize = 12;

/// Number of symbols the decoder iterates over, including `*` and `STOP`.
pub(crate) const N_SYMBOLS: usize = 14;

/// Part-of-speech tag.
///
/// The universal 12-tag set, plus the two synthetic symbols used by the
/// trigram decoder: `*` marks positions before the sentence starts and
/// `STOP` terminates it. The discriminants are the tag indices used in
/// dictionary rows and are stable across versions.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    /// Noun. (e.g. dog, year, ...)
    Noun = 0,

    /// Verb. (e.g. is, said, ...)
    Verb = 1,

    /// Adjective. (e.g. beautiful, wide, ...)
    Adj = 2,

    /// Adverb. (e.g. very, not, ...)
    Adv = 3,

    /// Other: foreign words, typos, URLs, mentions, hashtags, ...
    X = 4,

    /// Numeral. (e.g. 42, 3.14, ...)
    Num = 5,

    /// Pronoun. (e.g. she, they, ...)
    Pron = 6,

    /// Conjunction. (e.g. and, or, ...)
    Conj = 7,

    /// Determiner or article. (e.g. the, an, ...)
    Det = 8,

    /// Particle. (e.g. up in "give up", to in "to fly", ...)
    Prt = 9,

    /// Adposition. (e.g. in, under, ...)
    Adp = 10,

    /// Punctuation.
    Punct = 11,

    /// Sentence start boundary symbol.
    Star = 12,

    /// Sentence terminator symbol.
    Stop = 13,
}

/// The 12 part-of-speech tags in index order.
pub const TAGS: [Tag; N_TAGS] = [
    Tag::Noun,
    Tag::Verb,
    Tag::Adj,
    Tag::Adv,
    Tag::X,
    Tag::Num,
    Tag::Pron,
    Tag::Conj,
    Tag::Det,
    Tag::Prt,
    Tag::Adp,
    Tag::Punct,
];

impl Tag {
    /// Gets the integer index of this tag.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Gets the tag with the given index, including the boundary symbols.
    ///
    /// # Returns
    ///
    /// `None` if `idx` is out of range.
    pub const fn from_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(Self::Noun),
            1 => Some(Self::Verb),
            2 => Some(Self::Adj),
            3 => Some(Self::Adv),
            4 => Some(Self::X),
            5 => Some(Self::Num),
            6 => Some(Self::Pron),
            7 => Some(Self::Conj),
            8 => Some(Self::Det),
            9 => Some(Self::Prt),
            10 => Some(Self::Adp),
            11 => Some(Self::Punct),
            12 => Some(Self::Star),
            13 => Some(Self::Stop),
            _ => None,
        }
    }

    /// Gets the name used in n-gram path strings.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Noun => "NOUN",
            Self::Verb => "VERB",
            Self::Adj => "ADJ",
            Self::Adv => "ADV",
            Self::X => "X",
            Self::Num => "NUM",
            Self::Pron => "PRON",
            Self::Conj => "CONJ",
            Self::Det => "DET",
            Self::Prt => "PRT",
            Self::Adp => "ADP",
            Self::Punct => ".",
            Self::Star => "*",
            Self::Stop => "STOP",
        }
    }

    /// Gets the tag with the given path-string name.
    ///
    /// # Returns
    ///
    /// `None` if `name` is not a tag name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "NOUN" => Some(Self::Noun),
            "VERB" => Some(Self::Verb),
            "ADJ" => Some(Self::Adj),
            "ADV" => Some(Self::Adv),
            "X" => Some(Self::X),
            "NUM" => Some(Self::Num),
            "PRON" => Some(Self::Pron),
            "CONJ" => Some(Self::Conj),
            "DET" => Some(Self::Det),
            "PRT" => Some(Self::Prt),
            "ADP" => Some(Self::Adp),
            "." => Some(Self::Punct),
            "*" => Some(Self::Star),
            "STOP" => Some(Self::Stop),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for idx in 0..N_SYMBOLS {
            let tag = Tag::from_index(idx).unwrap();
            assert_eq!(idx, tag.index());
        }
        assert_eq!(None, Tag::from_index(N_SYMBOLS));
    }

    #[test]
    fn test_name_round_trip() {
        for &tag in &TAGS {
            assert_eq!(Some(tag), Tag::from_name(tag.name()));
        }
        assert_eq!(Some(Tag::Star), Tag::from_name("*"));
        assert_eq!(Some(Tag::Stop), Tag::from_name("STOP"));
        assert_eq!(Some(Tag::Punct), Tag::from_name("."));
        assert_eq!(None, Tag::from_name("NOPE"));
    }
}
