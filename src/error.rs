use std::io;

use thiserror::Error;

use crate::Count;

/// Everything that can go wrong while encoding or decoding a file
#[derive(Error, Debug)]
pub enum HuffmanError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed encoded file: {0}")]
    Format(#[from] FormatError),

    /// A code tree needs at least one symbol
    #[error("cannot build a code tree from an empty input")]
    EmptyAlphabet,

    /// The symbol was not seen when the code table was built
    #[error("symbol {0} has no code in the table")]
    UnknownSymbol(String),

    /// A node count or the encoded bit length does not fit in a `Count`
    #[error("counts too large to encode")]
    CountOverflow,
}

/// Structural problems found while reading an encoded file
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("missing magic bytes")]
    BadMagic,

    #[error("unknown bit format {0:#04x}")]
    UnknownBitFormat(u8),

    #[error("unknown node tag {0:#04x}")]
    UnknownNodeTag(u8),

    #[error("{0:#x} is not a unicode scalar value")]
    InvalidSymbol(u32),

    #[error("leaf {0} has a count of zero")]
    ZeroCount(String),

    #[error("internal node count {stored} does not match children sum {expected}")]
    CountMismatch { stored: Count, expected: Count },

    #[error("child counts overflow")]
    CountOverflow,

    #[error("symbol {0} appears in more than one leaf")]
    DuplicateSymbol(String),

    #[error("code tree deeper than {0} levels")]
    TreeTooDeep(usize),

    #[error("byte {0:#04x} in a text bit stream is neither '0' nor '1'")]
    InvalidBit(u8),

    #[error("bit stream ends in the middle of a code after {0} bits")]
    TruncatedCode(u64),

    #[error("bit 1 read at the leaf of a single-symbol tree")]
    DescendedPastLeaf,

    #[error("decoded {actual} symbols but the tree counts {expected}")]
    SymbolCountMismatch { expected: Count, actual: Count },

    #[error("unexpected data after the encoded bits")]
    TrailingData,

    #[error("padding bits after the encoded bits are not zero")]
    NonZeroPadding,

    #[error("file ends before the {0} section is complete")]
    UnexpectedEof(&'static str),
}
