//! Type descriptors
//!
//! A [`TypeDescriptor`] is the canonical representation of the value type a
//! project input, output or parameter declares. Its text form nests in a fixed
//! order: `base` -> `Map[String, base]` -> `List[...]` -> trailing `?`.
//!
//! ```
//! use lattice_core::domain::types::TypeDescriptor;
//!
//! let ty = TypeDescriptor::parse("List[Map[String, File]]?");
//! assert_eq!(ty.base(), "File");
//! assert!(ty.is_list() && ty.is_map() && ty.is_optional());
//! assert_eq!(ty.to_string(), "List[Map[String, File]]?");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generic string type. Compatible with every other type in both directions.
pub const STRING_TYPE: &str = "String";

/// Structured per-subject record type consumed by selection-mode runs.
pub const GENOTYPE_RECORD_TYPE: &str = "GenotypeRecord";

pub const FILE_TYPE: &str = "File";
pub const DIRECTORY_TYPE: &str = "Directory";

/// Base vocabulary offered when picking a leaf type.
///
/// The vocabulary is open: any other base name is accepted by the parser and
/// compared by name.
pub const BASE_TYPES: &[&str] = &[
    STRING_TYPE,
    "Bool",
    FILE_TYPE,
    DIRECTORY_TYPE,
    "ParticipantSheet",
    GENOTYPE_RECORD_TYPE,
    "Context",
    "Enum[...]",
];

/// Value type with its optionality and collection modifiers
///
/// Immutable once constructed: the builder methods return a new descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TypeDescriptor {
    base: String,
    is_list: bool,
    is_map: bool,
    is_optional: bool,
}

/// Outcome of comparing a bound source type with a declared destination type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    Compatible,
    Mismatch,
    /// One side is not a leaf type after stripping (nested collection or
    /// malformed text), so no verdict is given.
    Unsupported,
}

impl TypeDescriptor {
    /// Create a plain, required, non-collection descriptor
    ///
    /// Surrounding whitespace is dropped from `base`, as [`parse`](Self::parse) does.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim().to_string(),
            is_list: false,
            is_map: false,
            is_optional: false,
        }
    }

    /// Wrap in "string-keyed map of"
    pub fn map_of(self) -> Self {
        Self {
            is_map: true,
            ..self
        }
    }

    /// Wrap in "one or more of"
    pub fn list_of(self) -> Self {
        Self {
            is_list: true,
            ..self
        }
    }

    /// Mark the value as possibly absent
    pub fn optional(self) -> Self {
        Self {
            is_optional: true,
            ..self
        }
    }

    /// Parse the canonical text form
    ///
    /// Never fails. Anything that does not match the grammar (unbalanced
    /// brackets, a map keyed by something other than `String`, empty
    /// wrappers) stays in `base` verbatim.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        let (rest, is_optional) = match trimmed.strip_suffix('?') {
            Some(rest) => (rest.trim_end(), true),
            None => (trimmed, false),
        };

        let (rest, is_list) = match unwrap_brackets(rest, "List[") {
            Some(inner) => (inner, true),
            None => (rest, false),
        };

        let (base, is_map) = match unwrap_brackets(rest, "Map[").and_then(map_value) {
            Some(value) => (value, true),
            None => (rest, false),
        };

        Self {
            base: base.to_string(),
            is_list,
            is_map,
            is_optional,
        }
    }

    /// Base type name with every modifier stripped
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn is_list(&self) -> bool {
        self.is_list
    }

    pub fn is_map(&self) -> bool {
        self.is_map
    }

    pub fn is_optional(&self) -> bool {
        self.is_optional
    }

    /// A binding must be supplied for this type
    pub fn is_required(&self) -> bool {
        !self.is_optional
    }

    /// Whether the stripped base is the generic string type
    pub fn is_string(&self) -> bool {
        self.base.eq_ignore_ascii_case(STRING_TYPE)
    }

    /// Choice list of an `Enum[a, b, c]` base
    pub fn enum_choices(&self) -> Option<Vec<&str>> {
        let inner = self.base.strip_prefix("Enum[")?.strip_suffix(']')?;
        Some(
            inner
                .split(',')
                .map(str::trim)
                .filter(|choice| !choice.is_empty())
                .collect(),
        )
    }

    /// Compare a source type bound into a destination of type `target`
    ///
    /// Optionality and one level of collection are stripped from both sides
    /// before comparing base names. `String` on either side always passes.
    pub fn check_compatibility(source: &TypeDescriptor, target: &TypeDescriptor) -> Compatibility {
        if source.is_string() || target.is_string() {
            return Compatibility::Compatible;
        }

        if !is_primitive(&source.base) || !is_primitive(&target.base) {
            return Compatibility::Unsupported;
        }

        if source.base.eq_ignore_ascii_case(&target.base) {
            Compatibility::Compatible
        } else {
            Compatibility::Mismatch
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.base.clone();
        if self.is_map {
            text = format!("Map[String, {}]", text);
        }
        if self.is_list {
            text = format!("List[{}]", text);
        }
        if self.is_optional {
            text.push('?');
        }
        f.write_str(&text)
    }
}

impl From<String> for TypeDescriptor {
    fn from(text: String) -> Self {
        Self::parse(&text)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl From<TypeDescriptor> for String {
    fn from(descriptor: TypeDescriptor) -> Self {
        descriptor.to_string()
    }
}

/// True iff `text` carries no collection or optionality marker
///
/// Used to restrict "pick a base type" choices to leaf vocabulary entries.
pub fn is_primitive(text: &str) -> bool {
    !text.contains("List[") && !text.contains("Map[") && !text.contains('?')
}

/// Strip `prefix` ... `]` when the inner text is non-empty and balanced
fn unwrap_brackets<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let inner = text.strip_prefix(prefix)?.strip_suffix(']')?.trim();
    if inner.is_empty() || !is_balanced(inner) {
        return None;
    }
    Some(inner)
}

/// Value type of a `String, value` map body
fn map_value(inner: &str) -> Option<&str> {
    let (key, value) = split_top_level_once(inner, ',')?;
    if !key.eq_ignore_ascii_case(STRING_TYPE) || value.is_empty() {
        return None;
    }
    Some(value)
}

fn split_top_level_once(text: &str, delimiter: char) -> Option<(&str, &str)> {
    let mut depth: usize = 0;
    for (idx, ch) in text.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if ch == delimiter && depth == 0 {
            return Some((text[..idx].trim(), text[idx + 1..].trim()));
        }
    }
    None
}

fn is_balanced(text: &str) -> bool {
    let mut depth: usize = 0;
    for ch in text.chars() {
        match ch {
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    depth == 0
}
