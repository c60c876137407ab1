//! Spreadsheet error values.
//!
//! - **`ErrorKind`**  : the canonical error codes plus interned custom tags
//! - **`ErrorValue`** : the `Copy` handle carried through evaluation
//!
//! Two error values are equal exactly when their tags are equal. Custom
//! tags are interned once per process so every `ErrorValue` with the same
//! tag shares one `&'static str`.

use std::{error::Error, fmt, sync::Mutex};

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

/// All recognised error codes.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display`
/// renders them exactly as a spreadsheet shows them (`#DIV/0!`, …).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Null,
    Ref,
    Name,
    Value,
    Div,
    Na,
    Num,
    /// Produced when a cell's formula depends on its own value.
    Cycle,
    /// Any other tag, interned.
    Custom(&'static str),
}

impl ErrorKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Null => "#NULL!",
            Self::Ref => "#REF!",
            Self::Name => "#NAME?",
            Self::Value => "#VALUE!",
            Self::Div => "#DIV/0!",
            Self::Na => "#N/A",
            Self::Num => "#NUM!",
            Self::Cycle => "#CYCLE!",
            Self::Custom(tag) => tag,
        }
    }

    /// Parse an error tag. Unknown tags become interned `Custom` kinds.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "#NULL!" => Self::Null,
            "#REF!" => Self::Ref,
            "#NAME?" => Self::Name,
            "#VALUE!" => Self::Value,
            "#DIV/0!" => Self::Div,
            "#N/A" => Self::Na,
            "#NUM!" => Self::Num,
            "#CYCLE!" => Self::Cycle,
            _ => Self::Custom(intern(s)),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

static CUSTOM_TAGS: Lazy<Mutex<FxHashSet<&'static str>>> =
    Lazy::new(|| Mutex::new(FxHashSet::default()));

fn intern(tag: &str) -> &'static str {
    // A poisoned lock still holds a valid set; keep using it.
    let mut tags = CUSTOM_TAGS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(existing) = tags.get(tag) {
        return existing;
    }
    let leaked: &'static str = Box::leak(tag.to_owned().into_boxed_str());
    tags.insert(leaked);
    leaked
}

/// The error value stored in cells and returned by functions.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ErrorValue {
    kind: ErrorKind,
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl ErrorValue {
    pub const NULL: Self = Self::new(ErrorKind::Null);
    pub const REF: Self = Self::new(ErrorKind::Ref);
    pub const NAME: Self = Self::new(ErrorKind::Name);
    pub const VALUE: Self = Self::new(ErrorKind::Value);
    pub const DIV: Self = Self::new(ErrorKind::Div);
    pub const NA: Self = Self::new(ErrorKind::Na);
    pub const NUM: Self = Self::new(ErrorKind::Num);
    pub const CYCLE: Self = Self::new(ErrorKind::Cycle);

    pub const fn new(kind: ErrorKind) -> Self {
        Self { kind }
    }

    /// Build an error from its textual tag, e.g. `"#REF!"` or `"#BUSY!"`.
    pub fn from_tag(tag: &str) -> Self {
        Self::new(ErrorKind::parse(tag))
    }

    pub fn kind(self) -> ErrorKind {
        self.kind
    }

    pub fn tag(self) -> &'static str {
        self.kind.tag()
    }
}

impl From<ErrorKind> for ErrorValue {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/* ───────────────────────── Display / Error ────────────────────────── */

impl fmt::Debug for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorValue({})", self.tag())
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Error for ErrorValue {}

impl PartialEq<str> for ErrorValue {
    fn eq(&self, other: &str) -> bool {
        self.tag() == other
    }
}

impl PartialEq<&str> for ErrorValue {
    fn eq(&self, other: &&str) -> bool {
        self.tag() == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tags_render_like_a_spreadsheet() {
        assert_eq!(ErrorValue::REF.to_string(), "#REF!");
        assert_eq!(ErrorValue::DIV.to_string(), "#DIV/0!");
        assert_eq!(ErrorValue::CYCLE.to_string(), "#CYCLE!");
        assert_eq!(ErrorValue::NA, "#N/A");
    }

    #[test]
    fn parse_is_case_insensitive_for_builtins() {
        assert_eq!(ErrorKind::parse("#ref!"), ErrorKind::Ref);
        assert_eq!(ErrorKind::parse(" #N/A "), ErrorKind::Na);
    }

    #[test]
    fn custom_tags_are_interned() {
        let a = ErrorValue::from_tag("#BUSY!");
        let b = ErrorValue::from_tag("#BUSY!");
        assert_eq!(a, b);
        assert!(std::ptr::eq(a.tag(), b.tag()));
        assert_ne!(a, ErrorValue::VALUE);
    }
}
