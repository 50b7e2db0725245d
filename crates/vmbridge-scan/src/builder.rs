//! Entry building: validate one scanned type and resolve it into a
//! [`ViewModelEntry`].
//!
//! # Validation rules
//!
//! | Rule                         | Failure                    |
//! |------------------------------|----------------------------|
//! | marker target is a class     | `InvalidMarkerTarget`      |
//! | qualified name is known      | `UnresolvableSymbol`       |
//! | at most one state member     | `MultipleStateMarkers`     |
//! | state is `StateFlow<T>`      | `InvalidStateShape`        |
//! | `T` is present and resolves  | `MissingStateTypeArgument` |
//!
//! Action parameters are deliberately lenient: an unnamed parameter is
//! labelled `p<index>` (zero-based) and an unresolvable parameter type falls
//! back to the simple name as written. The state type argument is not lenient.
//! The asymmetry is intentional.

use serde::{Deserialize, Serialize};
use vmbridge_manifest::{ActionEntry, ActionParamEntry, StateEntry, ViewModelEntry};

use crate::scanner::ScannedType;
use crate::symbol::{MemberKind, MemberSymbol, SymbolUniverse, TypeArgument};
use crate::ScanError;

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

/// Configuration for entry building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScanConfig {
    /// Qualified names of the types accepted as a state container. Each must
    /// be a latest-value-caching, multicast stream with one type parameter.
    pub state_containers: Vec<String>,
}

impl Default for ScanConfig {
    /// Accepts `kotlinx.coroutines.flow.StateFlow` only.
    fn default() -> Self {
        Self {
            state_containers: vec!["kotlinx.coroutines.flow.StateFlow".to_owned()],
        }
    }
}

// ---------------------------------------------------------------------------
// EntryBuilder
// ---------------------------------------------------------------------------

/// Stateless builder turning a [`ScannedType`] into a [`ViewModelEntry`].
pub struct EntryBuilder<'a, U: SymbolUniverse + ?Sized> {
    universe: &'a U,
    config: &'a ScanConfig,
}

impl<'a, U: SymbolUniverse + ?Sized> EntryBuilder<'a, U> {
    pub fn new(universe: &'a U, config: &'a ScanConfig) -> Self {
        Self { universe, config }
    }

    /// Validate and resolve one scanned type.
    pub fn build(&self, scanned: &ScannedType) -> Result<ViewModelEntry, ScanError> {
        let symbol = &scanned.symbol;

        if !symbol.kind.is_class_like() {
            return Err(ScanError::InvalidMarkerTarget {
                symbol: symbol.display_name().to_owned(),
                kind: symbol.kind,
            });
        }

        let Some(qualified_name) = symbol.qualified_name.clone() else {
            return Err(ScanError::UnresolvableSymbol {
                symbol: symbol.simple_name.clone(),
            });
        };

        let state = self.build_state(&qualified_name, &scanned.state_members)?;
        let actions = scanned
            .action_members
            .iter()
            .filter_map(|member| self.build_action(&qualified_name, member))
            .collect();

        Ok(ViewModelEntry {
            qualified_name,
            simple_name: symbol.simple_name.clone(),
            state,
            actions,
        })
    }

    fn build_state(
        &self,
        owner: &str,
        members: &[MemberSymbol],
    ) -> Result<Option<StateEntry>, ScanError> {
        let member = match members {
            [] => return Ok(None),
            [single] => single,
            _ => {
                return Err(ScanError::MultipleStateMarkers {
                    symbol: owner.to_owned(),
                    properties: members.iter().map(|m| m.name.clone()).collect(),
                })
            }
        };

        let invalid_shape = |found: String| ScanError::InvalidStateShape {
            symbol: owner.to_owned(),
            property: member.name.clone(),
            found,
        };
        let missing_argument = || ScanError::MissingStateTypeArgument {
            symbol: owner.to_owned(),
            property: member.name.clone(),
        };

        let type_use = match &member.kind {
            MemberKind::Property { type_use } => type_use,
            MemberKind::Function { .. } => return Err(invalid_shape("a function".to_owned())),
        };

        let container = self
            .universe
            .resolve_type(type_use)
            .ok_or_else(|| invalid_shape(format!("unresolved type {type_use}")))?;
        if !self
            .config
            .state_containers
            .iter()
            .any(|c| *c == container.qualified_name)
        {
            return Err(invalid_shape(container.qualified_name));
        }

        let inner = match container.args.as_slice() {
            [] | [TypeArgument::Star] => return Err(missing_argument()),
            [TypeArgument::Type(inner)] => inner,
            _ => {
                return Err(invalid_shape(format!(
                    "{} with {} type arguments",
                    container.qualified_name,
                    container.args.len()
                )))
            }
        };
        let value_type = self
            .universe
            .resolve_type(inner)
            .ok_or_else(missing_argument)?;

        Ok(Some(StateEntry {
            property: member.name.clone(),
            type_simple_name: value_type.simple_name,
        }))
    }

    fn build_action(&self, owner: &str, member: &MemberSymbol) -> Option<ActionEntry> {
        let MemberKind::Function { params } = &member.kind else {
            tracing::warn!(
                symbol = owner,
                member = %member.name,
                "action marker on a non-function member ignored"
            );
            return None;
        };

        let params = params
            .iter()
            .enumerate()
            .map(|(index, param)| {
                let param_label = param
                    .name
                    .clone()
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| format!("p{index}"));
                let type_simple_name = self
                    .universe
                    .resolve_type(&param.type_use)
                    .map(|resolved| resolved.simple_name)
                    .unwrap_or_else(|| param.type_use.simple_name().to_owned());
                ActionParamEntry {
                    param_label,
                    type_simple_name,
                }
            })
            .collect();

        Some(ActionEntry {
            function: member.name.clone(),
            params,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::Marker;
    use crate::scanner::scan;
    use crate::symbol::{ParamSymbol, SymbolKind, TypeUse};
    use crate::table::{Declaration, SymbolTable};

    fn ty(text: &str) -> TypeUse {
        text.parse().unwrap()
    }

    fn build_all(table: &SymbolTable) -> Vec<Result<ViewModelEntry, ScanError>> {
        let config = ScanConfig::default();
        let builder = EntryBuilder::new(table, &config);
        scan(table).iter().map(|s| builder.build(s)).collect()
    }

    fn build_one(decl: Declaration) -> Result<ViewModelEntry, ScanError> {
        let table = SymbolTable::new()
            .with(Declaration::class("com.a.CounterState"))
            .with(decl);
        build_all(&table).remove(0)
    }

    #[test]
    fn counter_scenario() {
        let entry = build_one(
            Declaration::class("com.a.CounterViewModel")
                .marked(Marker::ViewModel)
                .member(
                    MemberSymbol::property("count", ty("kotlinx.coroutines.flow.StateFlow<Int>")),
                    &[Marker::UiState],
                )
                .member(MemberSymbol::function("increment", vec![]), &[Marker::UiAction]),
        )
        .unwrap();

        assert_eq!(entry.qualified_name, "com.a.CounterViewModel");
        assert_eq!(entry.simple_name, "CounterViewModel");
        assert_eq!(entry.state, Some(StateEntry::new("count", "Int")));
        assert_eq!(entry.actions, vec![ActionEntry::new("increment", vec![])]);
    }

    #[test]
    fn no_state_member_yields_none() {
        let entry = build_one(Declaration::class("com.a.Vm").marked(Marker::ViewModel)).unwrap();
        assert_eq!(entry.state, None);
        assert!(entry.actions.is_empty());
    }

    #[test]
    fn two_state_members_fail() {
        let err = build_one(
            Declaration::class("com.a.Vm")
                .marked(Marker::ViewModel)
                .member(MemberSymbol::property("a", ty("StateFlow<Int>")), &[Marker::UiState])
                .member(MemberSymbol::property("b", ty("StateFlow<Int>")), &[Marker::UiState]),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ScanError::MultipleStateMarkers {
                symbol: "com.a.Vm".to_owned(),
                properties: vec!["a".to_owned(), "b".to_owned()],
            }
        );
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn wrong_container_is_invalid_shape() {
        for written in ["kotlinx.coroutines.flow.Flow<Int>", "Int", "MutableStateFlow<Int>"] {
            let err = build_one(
                Declaration::class("com.a.Vm")
                    .marked(Marker::ViewModel)
                    .member(MemberSymbol::property("state", ty(written)), &[Marker::UiState]),
            )
            .unwrap_err();
            assert_eq!(err.code(), "InvalidStateShape", "for {written}");
        }
    }

    #[test]
    fn configured_container_is_accepted() {
        let table = SymbolTable::new().with(
            Declaration::class("com.a.Vm")
                .marked(Marker::ViewModel)
                .member(
                    MemberSymbol::property("state", ty("MutableStateFlow<String>")),
                    &[Marker::UiState],
                ),
        );
        let config = ScanConfig {
            state_containers: vec![
                "kotlinx.coroutines.flow.StateFlow".to_owned(),
                "kotlinx.coroutines.flow.MutableStateFlow".to_owned(),
            ],
        };

        let scanned = scan(&table);
        let entry = EntryBuilder::new(&table, &config).build(&scanned[0]).unwrap();
        assert_eq!(entry.state.unwrap().type_simple_name, "String");
    }

    #[test]
    fn state_without_usable_argument_is_missing_type_argument() {
        for written in ["StateFlow", "StateFlow<*>", "StateFlow<com.a.Unknown>"] {
            let err = build_one(
                Declaration::class("com.a.Vm")
                    .marked(Marker::ViewModel)
                    .member(MemberSymbol::property("state", ty(written)), &[Marker::UiState]),
            )
            .unwrap_err();
            assert_eq!(err.code(), "MissingStateTypeArgument", "for {written}");
        }
    }

    #[test]
    fn state_with_two_arguments_is_invalid_shape() {
        let err = build_one(
            Declaration::class("com.a.Vm")
                .marked(Marker::ViewModel)
                .member(
                    MemberSymbol::property("state", ty("StateFlow<Int, Int>")),
                    &[Marker::UiState],
                ),
        )
        .unwrap_err();
        assert_eq!(err.code(), "InvalidStateShape");
    }

    #[test]
    fn state_value_type_uses_declared_simple_name() {
        let entry = build_one(
            Declaration::class("com.a.Vm")
                .marked(Marker::ViewModel)
                .member(
                    MemberSymbol::property("uiState", ty("StateFlow<com.a.CounterState>")),
                    &[Marker::UiState],
                ),
        )
        .unwrap();
        assert_eq!(entry.state.unwrap().type_simple_name, "CounterState");
    }

    #[test]
    fn unnamed_params_get_positional_labels() {
        let entry = build_one(
            Declaration::class("com.a.Vm").marked(Marker::ViewModel).member(
                MemberSymbol::function(
                    "select",
                    vec![
                        ParamSymbol { name: None, type_use: ty("Int") },
                        ParamSymbol { name: Some("label".to_owned()), type_use: ty("String") },
                        ParamSymbol { name: None, type_use: ty("com.a.CounterState") },
                    ],
                ),
                &[Marker::UiAction],
            ),
        )
        .unwrap();

        assert_eq!(
            entry.actions[0].params,
            vec![
                ActionParamEntry::new("p0", "Int"),
                ActionParamEntry::new("label", "String"),
                ActionParamEntry::new("p2", "CounterState"),
            ]
        );
    }

    #[test]
    fn action_order_follows_declaration_order() {
        let entry = build_one(
            Declaration::class("com.a.Vm")
                .marked(Marker::ViewModel)
                .member(MemberSymbol::function("submit", vec![]), &[Marker::UiAction])
                .member(MemberSymbol::function("retry", vec![]), &[Marker::UiAction])
                .member(MemberSymbol::function("cancel", vec![]), &[Marker::UiAction]),
        )
        .unwrap();

        let names: Vec<&str> = entry.actions.iter().map(|a| a.function.as_str()).collect();
        assert_eq!(names, vec!["submit", "retry", "cancel"]);
    }

    #[test]
    fn action_marker_on_property_is_ignored() {
        let entry = build_one(
            Declaration::class("com.a.Vm")
                .marked(Marker::ViewModel)
                .member(MemberSymbol::property("notAnAction", ty("Int")), &[Marker::UiAction]),
        )
        .unwrap();
        assert!(entry.actions.is_empty());
    }

    #[test]
    fn local_class_is_unresolvable() {
        let err = build_one(
            Declaration::local("local#1", SymbolKind::Class, "LocalVm").marked(Marker::ViewModel),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScanError::UnresolvableSymbol {
                symbol: "LocalVm".to_owned()
            }
        );
    }

    #[test]
    fn marker_on_function_is_invalid_target() {
        let err = build_one(
            Declaration::class("com.a.makeVm")
                .with_kind(SymbolKind::Function)
                .marked(Marker::ViewModel),
        )
        .unwrap_err();
        assert_eq!(err.code(), "InvalidMarkerTarget");
        assert_eq!(err.symbol(), "com.a.makeVm");
    }
}
