use std::collections::HashSet;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use crate::error::{FormatError, HuffmanError};
use crate::frequency::FrequencyMap;
use crate::Count;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CodeNode<S> {
    Leaf {
        symbol: S,
        count: Count,
    },
    Internal {
        count: Count,
        left: Box<CodeNode<S>>,
        right: Box<CodeNode<S>>,
    },
}

impl<S> CodeNode<S> {
    pub fn count(&self) -> Count {
        match self {
            CodeNode::Leaf { count, .. } => *count,
            CodeNode::Internal { count, .. } => *count,
        }
    }

    /// joins two nodes under a new internal node, `left` takes the 0 edge
    fn merge(left: Self, right: Self) -> Result<Self, HuffmanError> {
        let count = left
            .count()
            .checked_add(right.count())
            .ok_or(HuffmanError::CountOverflow)?;
        Ok(CodeNode::Internal {
            count,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

/// A binary tree whose root-to-leaf paths are the codes of its symbols.
///
/// A tree built from a single distinct symbol is a lone `Leaf` root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTree<S> {
    root: CodeNode<S>,
}

impl<S: Eq + Hash + Clone> CodeTree<S> {
    /// Builds a tree by repeatedly merging the two least frequent nodes.
    ///
    /// The working list is kept sorted by count, highest first, and merged
    /// nodes are put back in front of the first node with a strictly smaller
    /// count. Equal counts therefore keep their encounter order, which fixes
    /// the tree shape for a given frequency map.
    pub fn build(frequencies: &FrequencyMap<S>) -> Result<Self, HuffmanError> {
        let mut nodes: Vec<CodeNode<S>> = frequencies
            .iter()
            .map(|(symbol, count)| CodeNode::Leaf {
                symbol: symbol.clone(),
                count,
            })
            .collect();
        // stable, so ties stay in map order
        nodes.sort_by(|a, b| b.count().cmp(&a.count()));

        while nodes.len() > 1 {
            let (first, second) = match (nodes.pop(), nodes.pop()) {
                (Some(first), Some(second)) => (first, second),
                _ => unreachable!("loop runs while two or more nodes remain"),
            };
            let parent = CodeNode::merge(first, second)?;
            let at = nodes
                .iter()
                .position(|node| node.count() < parent.count())
                .unwrap_or_else(|| nodes.len());
            nodes.insert(at, parent);
        }

        nodes
            .pop()
            .map(|root| CodeTree { root })
            .ok_or(HuffmanError::EmptyAlphabet)
    }
}

impl<S: Eq + Hash + Debug> CodeTree<S> {
    /// Wraps a root read back from storage, checking that every internal
    /// count is the sum of its children, that leaves are never empty and
    /// that no symbol has two leaves.
    pub fn from_root(root: CodeNode<S>) -> Result<Self, FormatError> {
        validate(&root)?;
        Ok(CodeTree { root })
    }
}

fn validate<S: Eq + Hash + Debug>(root: &CodeNode<S>) -> Result<(), FormatError> {
    let mut seen = HashSet::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        match node {
            CodeNode::Leaf { symbol, count } => {
                if *count == 0 {
                    return Err(FormatError::ZeroCount(format!("{:?}", symbol)));
                }
                if !seen.insert(symbol) {
                    return Err(FormatError::DuplicateSymbol(format!("{:?}", symbol)));
                }
            }
            CodeNode::Internal { count, left, right } => {
                let expected = left
                    .count()
                    .checked_add(right.count())
                    .ok_or(FormatError::CountOverflow)?;
                if *count != expected {
                    return Err(FormatError::CountMismatch {
                        stored: *count,
                        expected,
                    });
                }
                stack.push(right);
                stack.push(left);
            }
        }
    }
    Ok(())
}

impl<S> CodeTree<S> {
    pub fn root(&self) -> &CodeNode<S> {
        &self.root
    }

    /// Number of symbols in the stream the tree was built from
    pub fn total(&self) -> Count {
        self.root.count()
    }

    pub fn leaf_count(&self) -> usize {
        let mut leaves = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                CodeNode::Leaf { .. } => leaves += 1,
                CodeNode::Internal { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        leaves
    }

    /// Length of the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(&self.root, 0)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                CodeNode::Leaf { .. } => deepest = deepest.max(depth),
                CodeNode::Internal { left, right, .. } => {
                    stack.push((&**left, depth + 1));
                    stack.push((&**right, depth + 1));
                }
            }
        }
        deepest
    }
}

impl<S: Debug> Display for CodeTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stack = vec![(&self.root, 0, "root")];
        while let Some((node, depth, edge)) = stack.pop() {
            let indent = "  ".repeat(depth);
            match node {
                CodeNode::Leaf { symbol, count } => {
                    writeln!(f, "{}{}: {:?} x{}", indent, edge, symbol, count)?;
                }
                CodeNode::Internal { count, left, right } => {
                    writeln!(f, "{}{}: x{}", indent, edge, count)?;
                    stack.push((&**right, depth + 1, "1"));
                    stack.push((&**left, depth + 1, "0"));
                }
            }
        }
        Ok(())
    }
}
