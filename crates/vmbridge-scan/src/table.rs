//! In-memory [`SymbolUniverse`] host backed by a symbol dump.
//!
//! A [`SymbolTable`] holds the declarations visible in one compilation round.
//! It can be built programmatically or loaded from a JSON dump:
//!
//! ```json
//! {
//!   "externalTypes": ["com.example.platform.Closeable"],
//!   "declarations": [
//!     {
//!       "kind": "class",
//!       "qualifiedName": "com.example.CounterViewModel",
//!       "simpleName": "CounterViewModel",
//!       "annotations": ["SwiftViewModel"],
//!       "supertypes": ["com.example.ViewModel"],
//!       "members": [
//!         { "name": "state", "kind": "property", "annotations": ["SwiftUiState"],
//!           "type": "kotlinx.coroutines.flow.StateFlow<Int>" },
//!         { "name": "increment", "kind": "function", "annotations": ["SwiftUiAction"],
//!           "params": [] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! # Resolution
//!
//! A written type name resolves, in order, to: a declaration with that
//! qualified name, a built-in Kotlin or coroutines type (by qualified or simple
//! name), an external type listed in `externalTypes`, or the only declaration
//! with that simple name. Anything else is unresolved, which makes the
//! referencing view-model not ready and defers it to the next round.
//!
//! # Inheritance
//!
//! Member lookup walks supertypes that are declared in the same table. Own
//! members come first; an inherited member with the same name and shape as
//! one already seen is shadowed.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::marker::Marker;
use crate::symbol::{
    MemberKind, MemberSymbol, ResolvedType, SymbolId, SymbolKind, SymbolUniverse, TypeSymbol,
    TypeUse,
};

/// Kotlin and coroutines types every host knows without declaring them.
const BUILTIN_TYPES: &[&str] = &[
    "kotlin.Any",
    "kotlin.Unit",
    "kotlin.Nothing",
    "kotlin.Boolean",
    "kotlin.Byte",
    "kotlin.Short",
    "kotlin.Int",
    "kotlin.Long",
    "kotlin.Float",
    "kotlin.Double",
    "kotlin.Char",
    "kotlin.String",
    "kotlin.Array",
    "kotlin.Pair",
    "kotlin.Triple",
    "kotlin.Function0",
    "kotlin.Function1",
    "kotlin.Function2",
    "kotlin.Function3",
    "kotlin.collections.List",
    "kotlin.collections.MutableList",
    "kotlin.collections.Set",
    "kotlin.collections.MutableSet",
    "kotlin.collections.Map",
    "kotlin.collections.MutableMap",
    "kotlinx.coroutines.flow.Flow",
    "kotlinx.coroutines.flow.SharedFlow",
    "kotlinx.coroutines.flow.MutableSharedFlow",
    "kotlinx.coroutines.flow.StateFlow",
    "kotlinx.coroutines.flow.MutableStateFlow",
];

// ---------------------------------------------------------------------------
// Dump format
// ---------------------------------------------------------------------------

/// One declaration in a symbol dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Declaration {
    /// Host identity. Defaults to the qualified name when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub kind: SymbolKind,
    #[serde(default)]
    pub qualified_name: Option<String>,
    pub simple_name: String,
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(default)]
    pub supertypes: Vec<TypeUse>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
}

/// A member together with its annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDecl {
    #[serde(default)]
    pub annotations: Vec<String>,
    #[serde(flatten)]
    pub symbol: MemberSymbol,
}

impl Declaration {
    /// A class with a qualified name; the simple name is its last segment.
    pub fn class(qualified_name: &str) -> Self {
        let simple_name = qualified_name
            .rsplit('.')
            .next()
            .unwrap_or(qualified_name)
            .to_owned();
        Self {
            id: None,
            kind: SymbolKind::Class,
            qualified_name: Some(qualified_name.to_owned()),
            simple_name,
            annotations: Vec::new(),
            supertypes: Vec::new(),
            members: Vec::new(),
        }
    }

    /// A declaration of any kind with no qualified name (local/anonymous).
    pub fn local(id: &str, kind: SymbolKind, simple_name: &str) -> Self {
        Self {
            id: Some(id.to_owned()),
            kind,
            qualified_name: None,
            simple_name: simple_name.to_owned(),
            annotations: Vec::new(),
            supertypes: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: SymbolKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn marked(mut self, marker: Marker) -> Self {
        self.annotations.push(marker.short_name().to_owned());
        self
    }

    pub fn extends(mut self, supertype: TypeUse) -> Self {
        self.supertypes.push(supertype);
        self
    }

    /// Append a member carrying the given markers.
    pub fn member(mut self, symbol: MemberSymbol, markers: &[Marker]) -> Self {
        self.members.push(MemberDecl {
            annotations: markers.iter().map(|m| m.short_name().to_owned()).collect(),
            symbol,
        });
        self
    }

    fn symbol_id(&self, index: usize) -> SymbolId {
        match (&self.id, &self.qualified_name) {
            (Some(id), _) => SymbolId(id.clone()),
            (None, Some(qualified)) => SymbolId(qualified.clone()),
            (None, None) => SymbolId(format!("{}#{index}", self.simple_name)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolDump {
    #[serde(default)]
    declarations: Vec<Declaration>,
    #[serde(default)]
    external_types: Vec<String>,
}

// ---------------------------------------------------------------------------
// SymbolTable
// ---------------------------------------------------------------------------

/// The declarations of one round, indexed for lookup.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    declarations: Vec<Declaration>,
    ids: Vec<SymbolId>,
    by_id: HashMap<SymbolId, usize>,
    by_qualified: HashMap<String, usize>,
    by_simple: HashMap<String, Vec<usize>>,
    external: BTreeSet<String>,
}

impl SymbolTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON symbol dump.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let dump: SymbolDump = serde_json::from_str(text)?;
        let mut table = Self::new();
        for name in dump.external_types {
            table.external.insert(name);
        }
        for decl in dump.declarations {
            table.declare(decl);
        }
        Ok(table)
    }

    /// Add a declaration. A later declaration with the same id replaces the
    /// earlier one.
    pub fn declare(&mut self, decl: Declaration) -> &mut Self {
        let id = decl.symbol_id(self.declarations.len());
        if let Some(&idx) = self.by_id.get(&id) {
            self.declarations[idx] = decl;
            self.reindex();
            return self;
        }
        let idx = self.declarations.len();
        self.index_one(idx, &decl, id);
        self.declarations.push(decl);
        self
    }

    /// Builder-style [`declare`](Self::declare).
    pub fn with(mut self, decl: Declaration) -> Self {
        self.declare(decl);
        self
    }

    /// Register a type known from a dependency without its members.
    pub fn with_external(mut self, qualified_name: &str) -> Self {
        self.external.insert(qualified_name.to_owned());
        self
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    fn index_one(&mut self, idx: usize, decl: &Declaration, id: SymbolId) {
        self.by_id.insert(id.clone(), idx);
        if idx == self.ids.len() {
            self.ids.push(id);
        } else {
            self.ids[idx] = id;
        }
        if let Some(qualified) = &decl.qualified_name {
            self.by_qualified.insert(qualified.clone(), idx);
        }
        self.by_simple
            .entry(decl.simple_name.clone())
            .or_default()
            .push(idx);
    }

    fn reindex(&mut self) {
        self.by_id.clear();
        self.by_qualified.clear();
        self.by_simple.clear();
        let ids = std::mem::take(&mut self.ids);
        let declarations = std::mem::take(&mut self.declarations);
        for (idx, (decl, id)) in declarations.iter().zip(ids).enumerate() {
            self.index_one(idx, decl, id);
        }
        self.declarations = declarations;
    }

    fn type_symbol(&self, idx: usize) -> TypeSymbol {
        let decl = &self.declarations[idx];
        TypeSymbol {
            id: self.ids[idx].clone(),
            kind: decl.kind,
            qualified_name: decl.qualified_name.clone(),
            simple_name: decl.simple_name.clone(),
        }
    }

    fn resolve_name(&self, name: &str) -> Option<(String, String)> {
        let simple_of =
            |qualified: &str| qualified.rsplit('.').next().unwrap_or(qualified).to_owned();

        if let Some(&idx) = self.by_qualified.get(name) {
            let decl = &self.declarations[idx];
            return Some((name.to_owned(), decl.simple_name.clone()));
        }
        if let Some(builtin) = BUILTIN_TYPES
            .iter()
            .copied()
            .find(|b| *b == name || simple_of(b) == name)
        {
            return Some((builtin.to_owned(), simple_of(builtin)));
        }
        if self.external.contains(name) {
            return Some((name.to_owned(), simple_of(name)));
        }
        match self.by_simple.get(name).map(Vec::as_slice) {
            Some([idx]) => {
                let decl = &self.declarations[*idx];
                decl.qualified_name
                    .clone()
                    .map(|qualified| (qualified, decl.simple_name.clone()))
            }
            _ => None,
        }
    }

    /// Index of the declaration a supertype reference points at, if declared
    /// in this table.
    fn declared_index(&self, type_use: &TypeUse) -> Option<usize> {
        let (qualified, _) = self.resolve_name(&type_use.name)?;
        self.by_qualified.get(&qualified).copied()
    }

    /// Own members first, then inherited ones, with shadowing by name and shape.
    fn all_members(&self, idx: usize) -> Vec<&MemberDecl> {
        let mut out = Vec::new();
        let mut seen_shapes: HashSet<(&str, Option<usize>)> = HashSet::new();
        let mut visited = HashSet::new();
        let mut queue = vec![idx];

        while let Some(current) = queue.pop() {
            if !visited.insert(current) {
                continue;
            }
            let decl = &self.declarations[current];
            for member in &decl.members {
                let arity = match &member.symbol.kind {
                    MemberKind::Property { .. } => None,
                    MemberKind::Function { params } => Some(params.len()),
                };
                if seen_shapes.insert((member.symbol.name.as_str(), arity)) {
                    out.push(member);
                }
            }
            // Reverse so the first declared supertype is visited first.
            for supertype in decl.supertypes.iter().rev() {
                if let Some(parent) = self.declared_index(supertype) {
                    queue.push(parent);
                }
            }
        }
        out
    }
}

impl SymbolUniverse for SymbolTable {
    fn types_with_marker(&self, marker: Marker) -> Vec<TypeSymbol> {
        self.declarations
            .iter()
            .enumerate()
            .filter(|(_, decl)| decl.annotations.iter().any(|a| marker.matches(a)))
            .map(|(idx, _)| self.type_symbol(idx))
            .collect()
    }

    fn members_with_marker(&self, owner: &TypeSymbol, marker: Marker) -> Vec<MemberSymbol> {
        let Some(&idx) = self.by_id.get(&owner.id) else {
            return Vec::new();
        };
        self.all_members(idx)
            .into_iter()
            .filter(|member| member.annotations.iter().any(|a| marker.matches(a)))
            .map(|member| member.symbol.clone())
            .collect()
    }

    fn resolve_type(&self, type_use: &TypeUse) -> Option<ResolvedType> {
        let (qualified_name, simple_name) = self.resolve_name(&type_use.name)?;
        Some(ResolvedType {
            qualified_name,
            simple_name,
            args: type_use.args.clone(),
        })
    }

    fn is_ready(&self, symbol: &TypeSymbol) -> bool {
        let Some(&idx) = self.by_id.get(&symbol.id) else {
            return false;
        };
        let decl = &self.declarations[idx];
        let supertypes_ready = decl
            .supertypes
            .iter()
            .flat_map(TypeUse::walk)
            .all(|t| self.resolve_name(&t.name).is_some());
        supertypes_ready
            && self.all_members(idx).iter().all(|member| {
                member
                    .symbol
                    .type_uses()
                    .into_iter()
                    .flat_map(TypeUse::walk)
                    .all(|t| self.resolve_name(&t.name).is_some())
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
