//! Layout of an encoded file.
//!
//! ```text
//! magic    b"HUFT"
//! format   b'T' (one ASCII '0'/'1' per bit) or b'P' (eight bits per byte)
//! tree     pre-order; b'L' symbol:u32 count:u64 | b'I' count:u64 left right
//! bits     u64, number of encoded bits
//! payload  the encoded bits in the chosen format
//! ```
//!
//! Integers are little endian. Packed bits fill each byte starting at the
//! least significant bit and the unused bits of the last byte are zero.

use std::io::{self, Read, Write};
use std::mem;

use crate::codec::BitSink;
use crate::error::{FormatError, HuffmanError};
use crate::tree::{CodeNode, CodeTree};
use crate::{BitVec, Count};

pub const MAGIC: &[u8; 4] = b"HUFT";

/// Trees read from a file may not be deeper than this
pub const MAX_TREE_DEPTH: usize = 256;

const LEAF: u8 = b'L';
const INTERNAL: u8 = b'I';

/// packed bits are handed to the writer in blocks of this many bytes
const FLUSH_BYTES: usize = 4096;

/// How the encoded bits are stored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum BitFormat {
    /// One ASCII '0' or '1' byte per bit
    Text,
    /// Eight bits per byte
    Packed,
}

impl BitFormat {
    fn tag(self) -> u8 {
        match self {
            BitFormat::Text => b'T',
            BitFormat::Packed => b'P',
        }
    }

    fn from_tag(tag: u8) -> Result<BitFormat, FormatError> {
        match tag {
            b'T' => Ok(BitFormat::Text),
            b'P' => Ok(BitFormat::Packed),
            other => Err(FormatError::UnknownBitFormat(other)),
        }
    }
}

/// Everything in front of the payload
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub format: BitFormat,
    pub tree: CodeTree<char>,
    pub bits: Count,
}

pub fn write_header<W: Write>(
    out: &mut W,
    format: BitFormat,
    tree: &CodeTree<char>,
    bits: Count,
) -> io::Result<()> {
    out.write_all(MAGIC)?;
    out.write_all(&[format.tag()])?;
    write_tree(out, tree)?;
    out.write_all(&bits.to_le_bytes())
}

pub fn read_header<R: Read>(r: &mut R) -> Result<Header, HuffmanError> {
    let mut magic = [0u8; 4];
    read_section(r, &mut magic, "magic")?;
    if &magic != MAGIC {
        return Err(FormatError::BadMagic.into());
    }
    let mut tag = [0u8; 1];
    read_section(r, &mut tag, "format")?;
    let format = BitFormat::from_tag(tag[0])?;
    let tree = read_tree(r)?;
    let bits = read_u64(r, "bit count")?;
    Ok(Header { format, tree, bits })
}

pub fn write_tree<W: Write>(out: &mut W, tree: &CodeTree<char>) -> io::Result<()> {
    let mut stack = vec![tree.root()];
    while let Some(node) = stack.pop() {
        match node {
            CodeNode::Leaf { symbol, count } => {
                out.write_all(&[LEAF])?;
                out.write_all(&u32::from(*symbol).to_le_bytes())?;
                out.write_all(&count.to_le_bytes())?;
            }
            CodeNode::Internal { count, left, right } => {
                out.write_all(&[INTERNAL])?;
                out.write_all(&count.to_le_bytes())?;
                stack.push(right);
                stack.push(left);
            }
        }
    }
    Ok(())
}

pub fn read_tree<R: Read>(r: &mut R) -> Result<CodeTree<char>, HuffmanError> {
    let root = read_node(r, 0)?;
    Ok(CodeTree::from_root(root)?)
}

fn read_node<R: Read>(r: &mut R, depth: usize) -> Result<CodeNode<char>, HuffmanError> {
    if depth > MAX_TREE_DEPTH {
        return Err(FormatError::TreeTooDeep(MAX_TREE_DEPTH).into());
    }
    let mut tag = [0u8; 1];
    read_section(r, &mut tag, "tree")?;
    match tag[0] {
        LEAF => {
            let scalar = read_u32(r, "tree")?;
            let symbol =
                std::char::from_u32(scalar).ok_or(FormatError::InvalidSymbol(scalar))?;
            let count = read_u64(r, "tree")?;
            Ok(CodeNode::Leaf { symbol, count })
        }
        INTERNAL => {
            let count = read_u64(r, "tree")?;
            let left = read_node(r, depth + 1)?;
            let right = read_node(r, depth + 1)?;
            Ok(CodeNode::Internal {
                count,
                left: Box::new(left),
                right: Box::new(right),
            })
        }
        other => Err(FormatError::UnknownNodeTag(other).into()),
    }
}

fn read_section<R: Read>(
    r: &mut R,
    buf: &mut [u8],
    section: &'static str,
) -> Result<(), HuffmanError> {
    r.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => FormatError::UnexpectedEof(section).into(),
        _ => HuffmanError::Io(e),
    })
}

fn read_u32<R: Read>(r: &mut R, section: &'static str) -> Result<u32, HuffmanError> {
    let mut bytes = [0u8; 4];
    read_section(r, &mut bytes, section)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_u64<R: Read>(r: &mut R, section: &'static str) -> Result<u64, HuffmanError> {
    let mut bytes = [0u8; 8];
    read_section(r, &mut bytes, section)?;
    Ok(u64::from_le_bytes(bytes))
}

/// Writes one ASCII '0' or '1' per bit
pub struct TextBitWriter<W: Write> {
    out: W,
}

impl<W: Write> TextBitWriter<W> {
    pub fn new(out: W) -> Self {
        TextBitWriter { out }
    }

    pub fn finish(self) -> io::Result<W> {
        Ok(self.out)
    }
}

impl<W: Write> BitSink for TextBitWriter<W> {
    fn put_bit(&mut self, bit: bool) -> io::Result<()> {
        self.out.write_all(if bit { b"1" } else { b"0" })
    }
}

/// Packs bits eight to a byte
pub struct PackedBitWriter<W: Write> {
    out: W,
    buffer: BitVec,
}

impl<W: Write> PackedBitWriter<W> {
    pub fn new(out: W) -> Self {
        PackedBitWriter {
            out,
            buffer: BitVec::new(),
        }
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        let full = mem::replace(&mut self.buffer, BitVec::new());
        let bytes: Vec<u8> = full.into();
        self.out.write_all(&bytes)
    }

    /// Zero-fills the last byte and writes out whatever is buffered
    pub fn finish(mut self) -> io::Result<W> {
        while self.buffer.len() % 8 != 0 {
            self.buffer.push(false);
        }
        self.flush_buffer()?;
        Ok(self.out)
    }
}

impl<W: Write> BitSink for PackedBitWriter<W> {
    fn put_bit(&mut self, bit: bool) -> io::Result<()> {
        self.buffer.push(bit);
        if self.buffer.len() == FLUSH_BYTES * 8 {
            self.flush_buffer()?;
        }
        Ok(())
    }
}

/// Where the decoder gets its bits from
pub trait BitSource {
    fn next_bit(&mut self) -> Result<bool, HuffmanError>;

    /// Called once all announced bits were read; rejects leftovers
    fn finish(self) -> Result<(), HuffmanError>;
}

/// Reads bits written by [`TextBitWriter`]
pub struct TextBitReader<R: Read> {
    bytes: io::Bytes<R>,
}

impl<R: Read> TextBitReader<R> {
    pub fn new(r: R) -> Self {
        TextBitReader { bytes: r.bytes() }
    }
}

impl<R: Read> BitSource for TextBitReader<R> {
    fn next_bit(&mut self) -> Result<bool, HuffmanError> {
        match self.bytes.next() {
            Some(Ok(b'0')) => Ok(false),
            Some(Ok(b'1')) => Ok(true),
            Some(Ok(other)) => Err(FormatError::InvalidBit(other).into()),
            Some(Err(e)) => Err(e.into()),
            None => Err(FormatError::UnexpectedEof("payload").into()),
        }
    }

    fn finish(mut self) -> Result<(), HuffmanError> {
        match self.bytes.next() {
            None => Ok(()),
            Some(Ok(_)) => Err(FormatError::TrailingData.into()),
            Some(Err(e)) => Err(e.into()),
        }
    }
}

/// Reads bits written by [`PackedBitWriter`]
pub struct PackedBitReader<R: Read> {
    bytes: io::Bytes<R>,
    // bits of the current byte, reversed so `pop` yields them in order
    current: BitVec,
}

impl<R: Read> PackedBitReader<R> {
    pub fn new(r: R) -> Self {
        PackedBitReader {
            bytes: r.bytes(),
            current: BitVec::new(),
        }
    }
}

impl<R: Read> BitSource for PackedBitReader<R> {
    fn next_bit(&mut self) -> Result<bool, HuffmanError> {
        if let Some(bit) = self.current.pop() {
            return Ok(bit);
        }
        let byte = match self.bytes.next() {
            Some(byte) => byte?,
            None => return Err(FormatError::UnexpectedEof("payload").into()),
        };
        let mut bits = BitVec::from_element(byte);
        bits.reverse();
        self.current = bits;
        self.current
            .pop()
            .ok_or_else(|| FormatError::UnexpectedEof("payload").into())
    }

    fn finish(mut self) -> Result<(), HuffmanError> {
        while let Some(bit) = self.current.pop() {
            if bit {
                return Err(FormatError::NonZeroPadding.into());
            }
        }
        match self.bytes.next() {
            None => Ok(()),
            Some(Ok(_)) => Err(FormatError::TrailingData.into()),
            Some(Err(e)) => Err(e.into()),
        }
    }
}
