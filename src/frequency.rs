use std::collections::HashMap;
use std::hash::Hash;
use std::io::{self, BufRead};
use std::iter::FromIterator;

use crate::Count;

/// How often each symbol occurs in a stream.
///
/// Entries are kept in the order their symbols were first seen, so building a
/// tree from the same input always yields the same tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrequencyMap<S: Eq + Hash> {
    counts: Vec<(S, Count)>,
    index: HashMap<S, usize>,
}

impl<S: Eq + Hash + Clone> FrequencyMap<S> {
    fn new() -> Self {
        FrequencyMap {
            counts: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn record(&mut self, symbol: S, n: Count) {
        match self.index.get(&symbol) {
            Some(&i) => self.counts[i].1 += n,
            None => {
                self.index.insert(symbol.clone(), self.counts.len());
                self.counts.push((symbol, n));
            }
        }
    }

    /// Counts every symbol yielded by `symbols`
    pub fn from_symbols<I>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        symbols.into_iter().fold(Self::new(), |mut map, symbol| {
            map.record(symbol, 1);
            map
        })
    }

    pub fn get(&self, symbol: &S) -> Option<Count> {
        self.index.get(symbol).map(|&i| self.counts[i].1)
    }

    /// Number of distinct symbols
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of symbols in the counted stream
    pub fn total(&self) -> Count {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    /// (symbol, count) pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&S, Count)> {
        self.counts.iter().map(|(symbol, n)| (symbol, *n))
    }
}

impl<S: Eq + Hash + Clone> FromIterator<(S, Count)> for FrequencyMap<S> {
    fn from_iter<I: IntoIterator<Item = (S, Count)>>(pairs: I) -> Self {
        pairs.into_iter().fold(Self::new(), |mut map, (symbol, n)| {
            map.record(symbol, n);
            map
        })
    }
}

/// Counts every character read from `r`, line terminators included
pub fn count_chars(r: &mut impl BufRead) -> io::Result<FrequencyMap<char>> {
    let mut frequencies = FrequencyMap::new();
    let mut line = String::new();
    while r.read_line(&mut line)? > 0 {
        for ch in line.chars() {
            frequencies.record(ch, 1);
        }
        line.clear();
    }
    Ok(frequencies)
}
