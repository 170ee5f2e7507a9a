use std::fmt::Debug;
use std::hash::Hash;
use std::io;

use crate::code_table::CodeTable;
use crate::error::{FormatError, HuffmanError};
use crate::tree::{CodeNode, CodeTree};
use crate::Count;

/// Somewhere to put encoded bits
pub trait BitSink {
    fn put_bit(&mut self, bit: bool) -> io::Result<()>;
}

impl BitSink for Vec<bool> {
    fn put_bit(&mut self, bit: bool) -> io::Result<()> {
        self.push(bit);
        Ok(())
    }
}

/// Turns symbols into the concatenation of their codes
pub struct Encoder<'t, S: Eq + Hash> {
    table: &'t CodeTable<S>,
}

impl<'t, S: Eq + Hash + Clone + Debug> Encoder<'t, S> {
    pub fn new(table: &'t CodeTable<S>) -> Self {
        Encoder { table }
    }

    /// Writes the code of `symbol`, returning how many bits that took
    pub fn encode_symbol<B>(&self, symbol: &S, out: &mut B) -> Result<Count, HuffmanError>
    where
        B: BitSink,
    {
        let code = self
            .table
            .get(symbol)
            .ok_or_else(|| HuffmanError::UnknownSymbol(format!("{:?}", symbol)))?;
        for bit in code.iter() {
            out.put_bit(bit)?;
        }
        Ok(code.len() as Count)
    }

    pub fn encode<I, B>(&self, symbols: I, out: &mut B) -> Result<Count, HuffmanError>
    where
        I: IntoIterator<Item = S>,
        B: BitSink,
    {
        let mut bits = 0;
        for symbol in symbols {
            bits += self.encode_symbol(&symbol, out)?;
        }
        Ok(bits)
    }
}

/// Walks a code tree one bit at a time
pub struct Decoder<'t, S> {
    tree: &'t CodeTree<S>,
    current: &'t CodeNode<S>,
    consumed: Count,
}

impl<'t, S> Decoder<'t, S> {
    pub fn new(tree: &'t CodeTree<S>) -> Self {
        Decoder {
            tree,
            current: tree.root(),
            consumed: 0,
        }
    }

    /// Follows one edge. Returns the symbol when a leaf is reached, after
    /// which decoding starts over from the root.
    pub fn push_bit(&mut self, bit: bool) -> Result<Option<&'t S>, FormatError> {
        self.consumed += 1;
        let current: &'t CodeNode<S> = self.current;
        let next: &'t CodeNode<S> = match current {
            CodeNode::Internal { left, right, .. } => {
                if bit {
                    &**right
                } else {
                    &**left
                }
            }
            // only a single-leaf tree has a leaf root; its code is `0`
            CodeNode::Leaf { symbol, .. } => {
                return if bit {
                    Err(FormatError::DescendedPastLeaf)
                } else {
                    Ok(Some(symbol))
                };
            }
        };
        match next {
            CodeNode::Leaf { symbol, .. } => {
                self.current = self.tree.root();
                Ok(Some(symbol))
            }
            CodeNode::Internal { .. } => {
                self.current = next;
                Ok(None)
            }
        }
    }

    /// Checks that the input did not stop part way through a code
    pub fn finish(self) -> Result<(), FormatError> {
        if std::ptr::eq(self.current, self.tree.root()) {
            Ok(())
        } else {
            Err(FormatError::TruncatedCode(self.consumed))
        }
    }
}

/// Decodes a whole bit sequence with `tree`
pub fn decode<S, I>(tree: &CodeTree<S>, bits: I) -> Result<Vec<S>, FormatError>
where
    S: Clone,
    I: IntoIterator<Item = bool>,
{
    let mut decoder = Decoder::new(tree);
    let mut symbols = Vec::new();
    for bit in bits {
        if let Some(symbol) = decoder.push_bit(bit)? {
            symbols.push(symbol.clone());
        }
    }
    decoder.finish()?;
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FrequencyMap;

    fn bits(text: &str) -> Vec<bool> {
        text.chars().map(|c| c == '1').collect()
    }

    fn tree_for(text: &str) -> CodeTree<char> {
        CodeTree::build(&FrequencyMap::from_symbols(text.chars())).unwrap()
    }

    #[test]
    fn encodes_in_stream_order() {
        let map: FrequencyMap<char> = vec![('a', 1), ('b', 1), ('c', 2), ('d', 2)]
            .into_iter()
            .collect();
        let tree = CodeTree::build(&map).unwrap();
        let table = CodeTable::from_tree(&tree);
        let mut out: Vec<bool> = Vec::new();
        let written = Encoder::new(&table).encode("cabd".chars(), &mut out).unwrap();
        assert_eq!(out, bits("010110011"));
        assert_eq!(written, 9);
        assert_eq!(decode(&tree, out).unwrap(), vec!['c', 'a', 'b', 'd']);
    }

    #[test]
    fn unknown_symbol_is_an_error() {
        let tree = tree_for("abc");
        let table = CodeTable::from_tree(&tree);
        let mut out: Vec<bool> = Vec::new();
        let err = Encoder::new(&table).encode("abx".chars(), &mut out).unwrap_err();
        assert!(matches!(err, HuffmanError::UnknownSymbol(ref s) if s == "'x'"));
    }

    #[test]
    fn round_trip() {
        let text = "she sells sea shells\nby the sea shore\n";
        let tree = tree_for(text);
        let table = CodeTable::from_tree(&tree);
        let mut out: Vec<bool> = Vec::new();
        Encoder::new(&table).encode(text.chars(), &mut out).unwrap();
        let decoded: String = decode(&tree, out).unwrap().into_iter().collect();
        assert_eq!(decoded, text);
    }

    #[test]
    fn single_symbol_round_trip() {
        let tree = tree_for("aaaaa");
        let table = CodeTable::from_tree(&tree);
        let mut out: Vec<bool> = Vec::new();
        Encoder::new(&table).encode("aaaaa".chars(), &mut out).unwrap();
        assert_eq!(out, bits("00000"));
        assert_eq!(decode(&tree, out).unwrap(), vec!['a'; 5]);
    }

    #[test]
    fn single_symbol_rejects_one_bit() {
        let tree = tree_for("aaaaa");
        assert_eq!(decode(&tree, bits("001")), Err(FormatError::DescendedPastLeaf));
    }

    #[test]
    fn stopping_mid_code_is_rejected() {
        // d = 11, so a lone 1 leaves the walk inside the tree
        let map: FrequencyMap<char> = vec![('a', 1), ('b', 1), ('c', 2), ('d', 2)]
            .into_iter()
            .collect();
        let tree = CodeTree::build(&map).unwrap();
        assert_eq!(decode(&tree, bits("0111")), Err(FormatError::TruncatedCode(4)));
        assert_eq!(decode(&tree, bits("10")), Err(FormatError::TruncatedCode(2)));
    }

    #[test]
    fn empty_bits_decode_to_nothing() {
        let tree = tree_for("ab");
        assert_eq!(decode(&tree, Vec::new()).unwrap(), Vec::<char>::new());
    }
}
