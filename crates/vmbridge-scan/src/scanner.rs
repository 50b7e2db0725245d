//! Symbol scanning: a pure query over a [`SymbolUniverse`].
//!
//! The scanner does not validate anything. It reports every state-marked
//! member it finds (the builder enforces "at most one") and every
//! action-marked member, in declaration order.

use crate::marker::Marker;
use crate::symbol::{MemberSymbol, SymbolUniverse, TypeSymbol};

/// A view-model-marked type and its marked members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedType {
    pub symbol: TypeSymbol,
    pub state_members: Vec<MemberSymbol>,
    pub action_members: Vec<MemberSymbol>,
}

/// Collect the marked members of one type.
pub fn scan_type<U: SymbolUniverse + ?Sized>(universe: &U, symbol: TypeSymbol) -> ScannedType {
    let state_members = universe.members_with_marker(&symbol, Marker::UiState);
    let action_members = universe.members_with_marker(&symbol, Marker::UiAction);
    ScannedType {
        symbol,
        state_members,
        action_members,
    }
}

/// Every view-model-marked type currently visible in `universe`.
pub fn scan<U: SymbolUniverse + ?Sized>(universe: &U) -> Vec<ScannedType> {
    universe
        .types_with_marker(Marker::ViewModel)
        .into_iter()
        .map(|symbol| scan_type(universe, symbol))
        .collect()
}
