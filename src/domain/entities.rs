//! Domain entities: core data structures

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};

/// Kind of structural unit tracked by the counter tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Module,
    Package,
    SourceFile,
    Class,
    Function,
}

impl EntryKind {
    /// Functions are terminal: no counters, no children.
    pub fn is_leaf(self) -> bool {
        matches!(self, EntryKind::Function)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Module => "module",
            EntryKind::Package => "package",
            EntryKind::SourceFile => "source file",
            EntryKind::Class => "class",
            EntryKind::Function => "function",
        };
        f.write_str(name)
    }
}

/// Pair of class/function counters.
///
/// Signed so that deltas and counters share one type; counters themselves
/// never go below zero as long as the producer's entries are consistent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Count {
    pub class_count: i64,
    pub function_count: i64,
}

impl Count {
    pub const ZERO: Count = Count {
        class_count: 0,
        function_count: 0,
    };

    pub fn new(class_count: i64, function_count: i64) -> Self {
        Self {
            class_count,
            function_count,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.class_count == 0 && self.function_count == 0
    }

    /// Sum the counters of a sequence of entries. Empty input yields zero.
    pub fn accumulate<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Self {
        entries.into_iter().map(Entry::count).sum()
    }
}

impl Add for Count {
    type Output = Count;

    fn add(self, rhs: Count) -> Count {
        Count::new(
            self.class_count + rhs.class_count,
            self.function_count + rhs.function_count,
        )
    }
}

impl AddAssign for Count {
    fn add_assign(&mut self, rhs: Count) {
        *self = *self + rhs;
    }
}

impl Sub for Count {
    type Output = Count;

    fn sub(self, rhs: Count) -> Count {
        Count::new(
            self.class_count - rhs.class_count,
            self.function_count - rhs.function_count,
        )
    }
}

impl Sum for Count {
    fn sum<I: Iterator<Item = Count>>(iter: I) -> Self {
        iter.fold(Count::ZERO, Add::add)
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "classes={}, functions={}",
            self.class_count, self.function_count
        )
    }
}

/// Immutable snapshot of one structural unit, as produced by a parser.
///
/// For non-leaf kinds the counters are expected to match the aggregate of
/// `nested`; the producer is responsible for that, nothing here checks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub name: String,
    pub class_count: i64,
    pub function_count: i64,
    pub nested: Vec<Entry>,
}

impl Entry {
    pub fn new(
        kind: EntryKind,
        name: impl Into<String>,
        class_count: i64,
        function_count: i64,
        nested: Vec<Entry>,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            class_count,
            function_count,
            nested,
        }
    }

    /// A function entry: zero counters, no nested entries.
    pub fn function(name: impl Into<String>) -> Self {
        Self::new(EntryKind::Function, name, 0, 0, Vec::new())
    }

    /// Build a container entry whose counters are the sum of `nested`.
    pub fn aggregate(kind: EntryKind, name: impl Into<String>, nested: Vec<Entry>) -> Self {
        let total = Count::accumulate(&nested);
        Self::new(kind, name, total.class_count, total.function_count, nested)
    }

    /// A class entry counting its nested functions.
    pub fn class(name: impl Into<String>, functions: Vec<Entry>) -> Self {
        let function_count = functions.len() as i64;
        Self::new(EntryKind::Class, name, 0, function_count, functions)
    }

    /// A source file entry: one class per nested class entry, functions summed.
    pub fn source_file(name: impl Into<String>, classes: Vec<Entry>) -> Self {
        let class_count = classes.len() as i64;
        let function_count = classes.iter().map(|c| c.function_count).sum();
        Self::new(EntryKind::SourceFile, name, class_count, function_count, classes)
    }

    pub fn count(&self) -> Count {
        Count::new(self.class_count, self.function_count)
    }

    /// Same entry with the kind replaced, nested entries untouched.
    pub fn with_kind(mut self, kind: EntryKind) -> Self {
        self.kind = kind;
        self
    }
}
