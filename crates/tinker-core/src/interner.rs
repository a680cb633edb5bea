//! Symbol interning.
//!
//! Every identifier, keyword, punctuator, and literal spelling in a
//! translation is interned exactly once. Two symbols compare equal iff
//! their underlying indices are equal, which holds iff their spellings are
//! equal, so `Symbol` equality can stand in for string equality everywhere
//! downstream.

use std::collections::HashMap;
use std::fmt;

/// An interned spelling. Cheap to copy and compare; the actual string lives
/// in the owning [`Interner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u32);

impl Symbol {
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Reconstructs a symbol from a raw index previously obtained from
    /// [`Symbol::as_u32`]. Callers must ensure the index was produced by the
    /// same interner it will be resolved against.
    pub fn from_raw(raw: u32) -> Self {
        Symbol(raw)
    }
}

/// The lexical class a symbol was interned under. Re-interning an existing
/// spelling under a different class is a bug in the lexer, not a condition
/// this type tries to recover from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Identifier,
    Keyword,
    Punctuator,
    Boolean,
    Integer,
    Character,
    Floating,
    String,
}

/// Append-only interning table mapping spellings to [`Symbol`]s.
#[derive(Debug, Default)]
pub struct Interner {
    map: HashMap<String, Symbol>,
    strings: Vec<String>,
    classes: Vec<TokenClass>,
}

impl Interner {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            strings: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Interns `text` under `class`. If `text` was already interned, its
    /// class must match; a mismatch is an internal error since it can only
    /// happen if the lexer confused two token kinds with the same spelling
    /// (this cannot occur for punctuators/keywords, which are seeded once
    /// up front, but is checked for literals too).
    pub fn intern(&mut self, text: &str, class: TokenClass) -> Symbol {
        if let Some(&sym) = self.map.get(text) {
            debug_assert_eq!(
                self.classes[sym.as_u32() as usize],
                class,
                "re-interned {text:?} under a different token class"
            );
            return sym;
        }
        let sym = Symbol(self.strings.len() as u32);
        self.strings.push(text.to_owned());
        self.classes.push(class);
        self.map.insert(text.to_owned(), sym);
        sym
    }

    /// Looks up an existing symbol without interning a new one.
    pub fn lookup(&self, text: &str) -> Option<Symbol> {
        self.map.get(text).copied()
    }

    /// Resolves a symbol to its spelling.
    ///
    /// # Panics
    ///
    /// Panics if `sym` was not produced by this interner.
    pub fn resolve(&self, sym: Symbol) -> &str {
        &self.strings[sym.as_u32() as usize]
    }

    pub fn class_of(&self, sym: Symbol) -> TokenClass {
        self.classes[sym.as_u32() as usize]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Seeds an interner with the language's fixed keyword and punctuator
/// spellings, returning the interner and a lookup table from spelling to
/// symbol that the lexer uses to classify words it scans as keywords
/// instead of identifiers.
pub fn seed() -> Interner {
    let mut interner = Interner::new();
    for kw in KEYWORDS {
        interner.intern(kw, TokenClass::Keyword);
    }
    for punct in PUNCTUATORS {
        interner.intern(punct, TokenClass::Punctuator);
    }
    interner
}

pub const KEYWORDS: &[&str] = &[
    "def", "var", "if", "else", "while", "for", "return", "break", "continue", "record",
    "extends", "foreign", "virtual", "abstract", "root", "bool", "char", "int", "float",
    "double", "true", "false",
];

pub const PUNCTUATORS: &[&str] = &[
    "{", "}", "(", ")", "[", "]", ",", ":", ";", ".", "+", "-", "*", "/", "%", "=", "==", "!=",
    "<", ">", "<=", ">=", "&&", "||", "!", "&",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_same_spelling_returns_same_symbol() {
        let mut interner = Interner::new();
        let a = interner.intern("foo", TokenClass::Identifier);
        let b = interner.intern("foo", TokenClass::Identifier);
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "foo");
    }

    #[test]
    fn distinct_spellings_get_distinct_symbols() {
        let mut interner = Interner::new();
        let a = interner.intern("foo", TokenClass::Identifier);
        let b = interner.intern("bar", TokenClass::Identifier);
        assert_ne!(a, b);
    }

    #[test]
    fn seed_installs_keywords_and_punctuators() {
        let interner = seed();
        let def = interner.lookup("def").expect("def should be seeded");
        assert_eq!(interner.class_of(def), TokenClass::Keyword);
        let brace = interner.lookup("{").expect("{ should be seeded");
        assert_eq!(interner.class_of(brace), TokenClass::Punctuator);
    }
}
