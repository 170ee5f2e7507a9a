//! Prefix codes for text files.
//!
//! Characters are counted, the two rarest nodes are merged until a single
//! tree is left, and the tree paths become the codes. The tree is stored in
//! front of the encoded bits so [`decode`] can walk it again.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::{BufReader, BufWriter};
//!
//! use huffman_text::{decode, encode, BitFormat};
//!
//! let book = BufReader::new(File::open("Grimms")?);
//! let out = BufWriter::new(File::create("Grimms.huf")?);
//! encode(book, out, BitFormat::Packed)?;
//!
//! let compressed = BufReader::new(File::open("Grimms.huf")?);
//! let out = BufWriter::new(File::create("Grimms_decoded.huf")?);
//! decode(compressed, out)?;
//! # Ok::<(), huffman_text::HuffmanError>(())
//! ```

use std::io::{self, BufRead, Seek, SeekFrom, Write};

pub mod code_table;
pub mod codec;
pub mod container;
pub mod error;
pub mod frequency;
pub mod tree;

pub use code_table::{Code, CodeTable};
pub use codec::{BitSink, Decoder, Encoder};
pub use container::{BitFormat, Header};
pub use error::{FormatError, HuffmanError};
pub use frequency::{count_chars, FrequencyMap};
pub use tree::{CodeNode, CodeTree};

use container::{BitSource, PackedBitReader, PackedBitWriter, TextBitReader, TextBitWriter};

//Only use this bitvec type throughout this crate
type BitVec = bitvec::prelude::BitVec<bitvec::prelude::LittleEndian, u8>;

/// type used to store count of characters
/// u64 so that counts of large files cannot overflow
pub type Count = u64;

/// What an encode or decode pass did
#[derive(Clone, Debug)]
pub struct Summary {
    pub tree: CodeTree<char>,
    pub format: BitFormat,
    /// characters in the plain text
    pub symbols: Count,
    /// bits in the encoded payload
    pub bits: Count,
}

/// Encodes the text read from `r` into `out`.
///
/// The input is read twice, once to count characters and once to encode
/// them, so it has to be seekable.
pub fn encode<R, W>(mut r: R, mut out: W, format: BitFormat) -> Result<Summary, HuffmanError>
where
    R: BufRead + Seek,
    W: Write,
{
    let frequencies = count_chars(&mut r)?;
    let tree = CodeTree::build(&frequencies)?;
    let table = CodeTable::from(&tree);
    let bits = table.encoded_len(&frequencies)?;
    container::write_header(&mut out, format, &tree, bits)?;

    r.seek(SeekFrom::Start(0))?;
    let encoder = Encoder::new(&table);
    let written = match format {
        BitFormat::Text => {
            let mut sink = TextBitWriter::new(&mut out);
            let written = encode_lines(&mut r, &encoder, &mut sink)?;
            sink.finish()?;
            written
        }
        BitFormat::Packed => {
            let mut sink = PackedBitWriter::new(&mut out);
            let written = encode_lines(&mut r, &encoder, &mut sink)?;
            sink.finish()?;
            written
        }
    };
    if written != bits {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "input changed between counting and encoding",
        )
        .into());
    }
    out.flush()?;

    Ok(Summary {
        symbols: tree.total(),
        tree,
        format,
        bits,
    })
}

fn encode_lines<R, B>(
    r: &mut R,
    encoder: &Encoder<char>,
    sink: &mut B,
) -> Result<Count, HuffmanError>
where
    R: BufRead,
    B: BitSink,
{
    let mut written = 0;
    let mut line = String::new();
    while r.read_line(&mut line)? > 0 {
        written += encoder.encode(line.chars(), sink)?;
        line.clear();
    }
    Ok(written)
}

/// Decodes a file produced by [`encode`] from `r` into `out`.
///
/// Nothing is written unless the whole payload decodes cleanly.
pub fn decode<R, W>(mut r: R, mut out: W) -> Result<Summary, HuffmanError>
where
    R: BufRead,
    W: Write,
{
    let Header { format, tree, bits } = container::read_header(&mut r)?;
    let text = match format {
        BitFormat::Text => decode_bits(TextBitReader::new(&mut r), &tree, bits)?,
        BitFormat::Packed => decode_bits(PackedBitReader::new(&mut r), &tree, bits)?,
    };
    out.write_all(text.as_bytes())?;
    out.flush()?;

    Ok(Summary {
        symbols: tree.total(),
        tree,
        format,
        bits,
    })
}

fn decode_bits<B: BitSource>(
    mut source: B,
    tree: &CodeTree<char>,
    bits: Count,
) -> Result<String, HuffmanError> {
    let mut decoder = Decoder::new(tree);
    let mut text = String::new();
    let mut symbols: Count = 0;
    for _ in 0..bits {
        if let Some(ch) = decoder.push_bit(source.next_bit()?)? {
            text.push(*ch);
            symbols += 1;
        }
    }
    decoder.finish()?;
    source.finish()?;
    if symbols != tree.total() {
        return Err(FormatError::SymbolCountMismatch {
            expected: tree.total(),
            actual: symbols,
        }
        .into());
    }
    Ok(text)
}
