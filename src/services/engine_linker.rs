//! Host table of engine constructors that module classes link against.

use std::collections::BTreeMap;

use super::builtin_engines::{
    END_WITH_NEWLINE, EndWithNewline, IMPORT_ORDER, INDENT, ImportOrder, Indent,
    TRAILING_WHITESPACE, TrailingWhitespace,
};
use crate::ports::EngineConstructor;

#[derive(Clone, Default)]
pub struct EngineLinker {
    entries: BTreeMap<String, EngineConstructor>,
}

impl std::fmt::Debug for EngineLinker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineLinker").field("entries", &self.entries.keys()).finish()
    }
}

impl EngineLinker {
    /// A linker with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A linker preloaded with the builtin engine kernels.
    pub fn with_builtins() -> Self {
        Self::empty()
            .with(TRAILING_WHITESPACE, TrailingWhitespace::create)
            .with(END_WITH_NEWLINE, EndWithNewline::create)
            .with(INDENT, Indent::create)
            .with(IMPORT_ORDER, ImportOrder::create)
    }

    pub fn with(mut self, entry: impl Into<String>, constructor: EngineConstructor) -> Self {
        self.register(entry, constructor);
        self
    }

    pub fn register(&mut self, entry: impl Into<String>, constructor: EngineConstructor) {
        self.entries.insert(entry.into(), constructor);
    }

    pub fn lookup(&self, entry: &str) -> Option<EngineConstructor> {
        self.entries.get(entry).copied()
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
