//! Host-independent symbol model and the [`SymbolUniverse`] capability.
//!
//! The scanner and entry builder never look at a concrete compiler. They ask
//! a [`SymbolUniverse`] four questions:
//!
//! - which type declarations carry a marker,
//! - which members of a type carry a marker,
//! - what a written type reference resolves to,
//! - whether a declaration is fully resolvable yet.
//!
//! Type references are written Kotlin-style and parsed into [`TypeUse`]:
//!
//! ```
//! use vmbridge_scan::symbol::{TypeArgument, TypeUse};
//!
//! let ty: TypeUse = "kotlinx.coroutines.flow.StateFlow<com.example.CounterState>"
//!     .parse()
//!     .unwrap();
//! assert_eq!(ty.simple_name(), "StateFlow");
//! assert!(matches!(&ty.args[0], TypeArgument::Type(inner) if inner.name == "com.example.CounterState"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::marker::Marker;

// ---------------------------------------------------------------------------
// Identifiers and kinds
// ---------------------------------------------------------------------------

/// Host-assigned identity of a declaration, stable across rounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub String);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The syntactic kind of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SymbolKind {
    Class,
    Interface,
    Object,
    Enum,
    Function,
    Property,
    TypeAlias,
}

impl SymbolKind {
    /// Whether the kind is a class declaration (class, interface, object or
    /// enum), i.e. a valid target for the view-model marker.
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            SymbolKind::Class | SymbolKind::Interface | SymbolKind::Object | SymbolKind::Enum
        )
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::Object => "object",
            SymbolKind::Enum => "enum",
            SymbolKind::Function => "function",
            SymbolKind::Property => "property",
            SymbolKind::TypeAlias => "type alias",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// A declaration carrying the view-model marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSymbol {
    pub id: SymbolId,
    pub kind: SymbolKind,
    /// `None` for local or anonymous declarations.
    pub qualified_name: Option<String>,
    pub simple_name: String,
}

impl TypeSymbol {
    /// The most specific name available, for diagnostics.
    pub fn display_name(&self) -> &str {
        self.qualified_name.as_deref().unwrap_or(&self.simple_name)
    }
}

/// A property or function declared in (or inherited by) a type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSymbol {
    pub name: String,
    #[serde(flatten)]
    pub kind: MemberKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MemberKind {
    Property {
        #[serde(rename = "type")]
        type_use: TypeUse,
    },
    Function {
        #[serde(default)]
        params: Vec<ParamSymbol>,
    },
}

/// A function parameter. Destructured or synthetic parameters have no name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSymbol {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_use: TypeUse,
}

impl MemberSymbol {
    pub fn property(name: impl Into<String>, type_use: TypeUse) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Property { type_use },
        }
    }

    pub fn function(name: impl Into<String>, params: Vec<ParamSymbol>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Function { params },
        }
    }

    /// Every type reference this member mentions.
    pub fn type_uses(&self) -> Vec<&TypeUse> {
        match &self.kind {
            MemberKind::Property { type_use } => vec![type_use],
            MemberKind::Function { params } => params.iter().map(|p| &p.type_use).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Type references
// ---------------------------------------------------------------------------

/// A type reference as written at a use site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeUse {
    /// The referenced name, qualified or simple.
    pub name: String,
    pub args: Vec<TypeArgument>,
    pub nullable: bool,
}

/// A type argument: a concrete type or a star projection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Star,
    Type(TypeUse),
}

/// A [`TypeUse`] whose name the universe could map to a known declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedType {
    pub qualified_name: String,
    pub simple_name: String,
    pub args: Vec<TypeArgument>,
}

impl TypeUse {
    /// A non-generic, non-null reference.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            nullable: false,
        }
    }

    pub fn with_arg(mut self, arg: TypeUse) -> Self {
        self.args.push(TypeArgument::Type(arg));
        self
    }

    pub fn with_star(mut self) -> Self {
        self.args.push(TypeArgument::Star);
        self
    }

    /// The last segment of the written name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// This reference and, recursively, every concrete type argument.
    pub fn walk(&self) -> Vec<&TypeUse> {
        let mut out = vec![self];
        for arg in &self.args {
            if let TypeArgument::Type(inner) = arg {
                out.extend(inner.walk());
            }
        }
        out
    }
}

impl fmt::Display for TypeUse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            f.write_str("<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                match arg {
                    TypeArgument::Star => f.write_str("*")?,
                    TypeArgument::Type(inner) => write!(f, "{inner}")?,
                }
            }
            f.write_str(">")?;
        }
        if self.nullable {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl From<TypeUse> for String {
    fn from(value: TypeUse) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for TypeUse {
    type Error = TypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A type reference string that does not follow `Name<Arg, ...>?` syntax.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid type reference '{input}': {reason}")]
pub struct TypeParseError {
    pub input: String,
    pub reason: &'static str,
}

impl FromStr for TypeUse {
    type Err = TypeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason| TypeParseError {
            input: input.to_owned(),
            reason,
        };
        let mut cursor = Cursor { src: input, pos: 0 };
        let parsed = parse_type(&mut cursor).map_err(fail)?;
        cursor.skip_ws();
        if cursor.pos != input.len() {
            return Err(fail("unexpected trailing input"));
        }
        Ok(parsed)
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_variance(&mut self) {
        for keyword in ["out ", "in "] {
            if self.rest().starts_with(keyword) {
                self.pos += keyword.len();
                self.skip_ws();
                return;
            }
        }
    }

    fn take_name(&mut self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, ch)| !(ch.is_alphanumeric() || ch == '_' || ch == '.' || ch == '$'))
            .map_or(rest.len(), |(idx, _)| idx);
        self.pos += end;
        &rest[..end]
    }
}

fn parse_type(cursor: &mut Cursor<'_>) -> Result<TypeUse, &'static str> {
    cursor.skip_ws();
    let name = cursor.take_name();
    if name.is_empty() {
        return Err("expected a type name");
    }
    if name.starts_with('.') || name.ends_with('.') || name.contains("..") {
        return Err("malformed qualified name");
    }

    let mut args = Vec::new();
    cursor.skip_ws();
    if cursor.eat('<') {
        loop {
            cursor.skip_ws();
            if cursor.eat('*') {
                args.push(TypeArgument::Star);
            } else {
                cursor.eat_variance();
                args.push(TypeArgument::Type(parse_type(cursor)?));
            }
            cursor.skip_ws();
            if cursor.eat(',') {
                continue;
            }
            if cursor.eat('>') {
                break;
            }
            return Err("expected ',' or '>'");
        }
    }

    cursor.skip_ws();
    let nullable = cursor.eat('?');

    Ok(TypeUse {
        name: name.to_owned(),
        args,
        nullable,
    })
}

// ---------------------------------------------------------------------------
// SymbolUniverse
// ---------------------------------------------------------------------------

/// Read-only view of one compilation round's symbols.
///
/// Implementations differ per host; everything downstream is written against
/// this trait only. All methods must be side-effect free.
pub trait SymbolUniverse {
    /// Declarations carrying `marker`, in declaration order.
    fn types_with_marker(&self, marker: Marker) -> Vec<TypeSymbol>;

    /// Members of `owner` (own and inherited) carrying `marker`, in
    /// declaration order.
    fn members_with_marker(&self, owner: &TypeSymbol, marker: Marker) -> Vec<MemberSymbol>;

    /// Resolve a written type reference to a known declaration.
    fn resolve_type(&self, type_use: &TypeUse) -> Option<ResolvedType>;

    /// Whether every type `symbol` references is resolvable in this round.
    ///
    /// A symbol that is not ready is deferred to the next round rather than
    /// validated.
    fn is_ready(&self, symbol: &TypeSymbol) -> bool;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
