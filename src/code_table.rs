use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use smallbitvec::SmallBitVec;

use crate::error::HuffmanError;
use crate::frequency::FrequencyMap;
use crate::tree::{CodeNode, CodeTree};
use crate::Count;

/// The bits on the path from the root to a leaf, 0 for left and 1 for right
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Code {
    bits: SmallBitVec,
}

impl Code {
    pub fn new() -> Code {
        Code {
            bits: SmallBitVec::new(),
        }
    }

    pub fn push(&mut self, bit: bool) {
        self.bits.push(bit);
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter()
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len() <= other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }

    fn with(&self, bit: bool) -> Code {
        let mut code = self.clone();
        code.push(bit);
        code
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Maps every symbol of a tree to its code
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTable<S: Eq + Hash> {
    codes: HashMap<S, Code>,
}

impl<S: Eq + Hash + Clone> CodeTable<S> {
    /// Walks the tree depth first, extending the code by one bit per edge.
    /// A lone leaf root gets the code `0`.
    pub fn from_tree(tree: &CodeTree<S>) -> Self {
        let mut codes = HashMap::new();
        if let CodeNode::Leaf { symbol, .. } = tree.root() {
            codes.insert(symbol.clone(), Code::new().with(false));
            return CodeTable { codes };
        }

        let mut stack = vec![(tree.root(), Code::new())];
        while let Some((node, code)) = stack.pop() {
            match node {
                CodeNode::Leaf { symbol, .. } => {
                    codes.insert(symbol.clone(), code);
                }
                CodeNode::Internal { left, right, .. } => {
                    stack.push((&**right, code.with(true)));
                    stack.push((&**left, code.with(false)));
                }
            }
        }
        CodeTable { codes }
    }

    pub fn get(&self, symbol: &S) -> Option<&Code> {
        self.codes.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&S, &Code)> {
        self.codes.iter()
    }

    /// Number of bits needed to encode the stream `frequencies` was counted
    /// from.
    pub fn encoded_len(&self, frequencies: &FrequencyMap<S>) -> Result<Count, HuffmanError>
    where
        S: Debug,
    {
        frequencies.iter().try_fold(0, |bits: Count, (symbol, count)| {
            let code = self
                .codes
                .get(symbol)
                .ok_or_else(|| HuffmanError::UnknownSymbol(format!("{:?}", symbol)))?;
            count
                .checked_mul(code.len() as Count)
                .and_then(|n| bits.checked_add(n))
                .ok_or(HuffmanError::CountOverflow)
        })
    }
}

impl<S: Eq + Hash + Clone> From<&CodeTree<S>> for CodeTable<S> {
    fn from(tree: &CodeTree<S>) -> Self {
        CodeTable::from_tree(tree)
    }
}
