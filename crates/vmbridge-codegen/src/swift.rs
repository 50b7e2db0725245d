//! Manifest to Swift wrapper generation.
//!
//! Each [`ViewModelEntry`] becomes one unit: an `ObservableObject` class that
//! owns the shared view-model, mirrors its state stream into a `@Published`
//! property, and forwards each action. Generation is pure and deterministic;
//! writing units to disk is [`crate::output`]'s job.
//!
//! Failures are entry-scoped. An entry with a type that has no generation
//! rule, or with a name that is not a single identifier, is reported in
//! [`Generation::failures`] and every other entry still produces its unit.
//! Names are checked before they reach source text or a file name.

use std::collections::HashMap;

use vmbridge_manifest::{ActionEntry, Manifest, StateEntry, ViewModelEntry};

use crate::config::GeneratorConfig;
use crate::rules::{check_type, escape, is_identifier};
use crate::writer::SourceWriter;
use crate::GenerateError;

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    /// Qualified name of the view-model this unit wraps.
    pub qualified_name: String,
    /// Name of the generated wrapper class.
    pub type_name: String,
    /// File name relative to the output directory.
    pub file_name: String,
    /// Full file contents, ending with a newline.
    pub source: String,
}

/// Result of generating a whole manifest.
#[derive(Debug, Default)]
pub struct Generation {
    /// Units in manifest order.
    pub units: Vec<GeneratedUnit>,
    /// Entries that could not be generated.
    pub failures: Vec<GenerateError>,
}

impl Generation {
    /// Whether every entry produced a unit.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Generate one unit per manifest entry.
pub fn generate(manifest: &Manifest, config: &GeneratorConfig) -> Generation {
    let mut simple_name_counts: HashMap<&str, usize> = HashMap::new();
    for entry in &manifest.view_models {
        *simple_name_counts.entry(entry.simple_name.as_str()).or_default() += 1;
    }

    let mut generation = Generation::default();
    for entry in &manifest.view_models {
        let key = if simple_name_counts[entry.simple_name.as_str()] > 1 {
            entry.qualified_name.replace('.', "_")
        } else {
            entry.simple_name.clone()
        };
        let type_name = format!("{}{key}", config.wrapper_prefix);

        match render_entry(entry, &type_name, config) {
            Ok(source) => generation.units.push(GeneratedUnit {
                qualified_name: entry.qualified_name.clone(),
                file_name: format!("{type_name}.swift"),
                type_name,
                source,
            }),
            Err(e) => {
                tracing::warn!(view_model = %entry.qualified_name, error = %e, "entry skipped");
                generation.failures.push(e);
            }
        }
    }

    tracing::info!(
        units = generation.units.len(),
        failures = generation.failures.len(),
        "generation complete"
    );
    generation
}

/// Render the wrapper class for one entry.
pub fn render_entry(
    entry: &ViewModelEntry,
    type_name: &str,
    config: &GeneratorConfig,
) -> Result<String, GenerateError> {
    check_entry(entry, type_name)?;

    let mut w = SourceWriter::new();
    if !config.header.is_empty() {
        w.block(&config.header);
        w.line("");
    }
    if !config.imports.is_empty() {
        for module in &config.imports {
            w.line(format!("import {module}"));
        }
        w.line("");
    }

    w.line("@MainActor");
    w.line(format!("final class {type_name}: ObservableObject {{"));
    w.indent(|w| {
        w.line(format!("private let viewModel: {}", entry.simple_name));
        if let Some(state) = &entry.state {
            w.line(format!(
                "private var {}Subscription: {}?",
                state.property, config.subscription_type
            ));
            w.line("");
            w.line(format!(
                "@Published private(set) var {}: {}",
                escape(&state.property),
                state.type_simple_name
            ));
        }

        w.line("");
        write_init(w, entry, config);

        if let Some(state) = &entry.state {
            w.line("");
            w.line("deinit {");
            w.indent(|w| {
                w.line(format!(
                    "{}Subscription?.{}()",
                    state.property, config.close_method
                ))
            });
            w.line("}");
        }

        for action in &entry.actions {
            w.line("");
            write_action(w, action);
        }
    });
    w.line("}");

    let mut source = w.render();
    source.push('\n');
    Ok(source)
}

fn check_entry(entry: &ViewModelEntry, type_name: &str) -> Result<(), GenerateError> {
    let named = |name: &str, usage: String| {
        if is_identifier(name) {
            Ok(())
        } else {
            Err(GenerateError::InvalidName {
                qualified_name: entry.qualified_name.clone(),
                name: name.to_owned(),
                usage,
            })
        }
    };
    named(type_name, "wrapper class name".to_owned())?;
    named(&entry.simple_name, "view-model simple name".to_owned())?;

    let unsupported = |type_name: &str, usage: String| {
        check_type(type_name).map_err(|reason| GenerateError::UnsupportedType {
            qualified_name: entry.qualified_name.clone(),
            type_name: type_name.to_owned(),
            usage,
            reason,
        })
    };

    if let Some(StateEntry {
        property,
        type_simple_name,
    }) = &entry.state
    {
        named(property, "state property".to_owned())?;
        unsupported(type_simple_name, format!("state property '{property}'"))?;
    }
    for action in &entry.actions {
        named(&action.function, "action".to_owned())?;
        for param in &action.params {
            named(
                &param.param_label,
                format!("parameter label of action '{}'", action.function),
            )?;
            unsupported(
                &param.type_simple_name,
                format!(
                    "parameter '{}' of action '{}'",
                    param.param_label, action.function
                ),
            )?;
        }
    }
    Ok(())
}

fn write_init(w: &mut SourceWriter, entry: &ViewModelEntry, config: &GeneratorConfig) {
    w.line(format!("init(_ viewModel: {}) {{", entry.simple_name));
    w.indent(|w| {
        w.line("self.viewModel = viewModel");
        let Some(state) = &entry.state else {
            return;
        };
        let property = escape(&state.property);
        let value_type = &state.type_simple_name;
        w.line(format!(
            "self.{property} = viewModel.{property}.value as! {value_type}"
        ));
        w.line(format!(
            "self.{}Subscription = viewModel.{property}.{} {{ [weak self] value in",
            state.property, config.subscribe_method
        ));
        w.indent(|w| {
            w.line("DispatchQueue.main.async {");
            w.indent(|w| w.line(format!("self?.{property} = value as! {value_type}")));
            w.line("}");
        });
        w.line("}");
    });
    w.line("}");
}

fn write_action(w: &mut SourceWriter, action: &ActionEntry) {
    let function = escape(&action.function);
    let params: Vec<String> = action
        .params
        .iter()
        .map(|p| format!("{}: {}", escape(&p.param_label), p.type_simple_name))
        .collect();
    let args: Vec<String> = action
        .params
        .iter()
        .map(|p| {
            let label = escape(&p.param_label);
            format!("{label}: {label}")
        })
        .collect();

    w.line(format!("func {function}({}) {{", params.join(", ")));
    w.indent(|w| w.line(format!("viewModel.{function}({})", args.join(", "))));
    w.line("}");
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
