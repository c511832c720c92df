//! Load/run session: the host-facing entry points
//!
//! `Session::load` registers declarations in order, closes the registry,
//! builds the capability table and runs the checker. All diagnostics of the
//! load are collected before it fails. A successful load yields a
//! `CompiledProgram`, which can run entry functions and answer member
//! resolution queries.

use crate::feedback::ProgramStats;
use crate::frontend::ast::{Item, TypeExpr};
use crate::interp::{Interpreter, OutputSink, Value};
use crate::semantic::{Analysis, Binding, CapabilityTable, Checker, Registry, RegistryBuilder, TypeResolver};
use crate::types::ResolvedType;
use crate::utils::{Diagnostic, Diagnostics, Error, Result};

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Zero-argument function invoked by `Session::run`
    pub entry: String,
    /// Fail the load when any warning is reported
    pub deny_warnings: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { entry: "foo".to_string(), deny_warnings: false }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    options: Options,
}

impl Session {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Load a program. Declarations are registered in the given order.
    pub fn load(&self, items: Vec<Item>) -> std::result::Result<CompiledProgram, Diagnostics> {
        let mut diagnostics = Diagnostics::new();
        let mut builder = RegistryBuilder::new();
        for item in items {
            let origin = item.describe();
            if let Err(error) = builder.register(item) {
                diagnostics.push_error(&origin, &error);
            }
        }
        let registry = builder.close();
        let capabilities = CapabilityTable::build(&registry);

        let (analysis, checked) = Checker::new(&registry, &capabilities).check();
        diagnostics.extend(checked);

        if diagnostics.has_errors() || (self.options.deny_warnings && diagnostics.warning_count() > 0) {
            log::debug!("load failed: {}", diagnostics);
            return Err(diagnostics);
        }

        let warnings: Vec<Diagnostic> = diagnostics.warnings().cloned().collect();
        log::debug!(
            "loaded program: {} receiver type(s) with capabilities, {} warning(s)",
            capabilities.type_count(),
            warnings.len()
        );
        Ok(CompiledProgram { registry, capabilities, analysis, warnings })
    }

    /// Run the configured entry function of a loaded program
    pub fn run(&self, program: &CompiledProgram, sink: &mut dyn OutputSink) -> Result<Value> {
        program.run(&self.options.entry, sink)
    }
}

/// A loaded, checked program. Read-only from here on.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    registry: Registry,
    capabilities: CapabilityTable,
    analysis: Analysis,
    warnings: Vec<Diagnostic>,
}

impl CompiledProgram {
    /// Invoke the zero-argument function `entry`
    pub fn run(&self, entry: &str, sink: &mut dyn OutputSink) -> Result<Value> {
        log::debug!("running {}", entry);
        self.interpreter(sink).call_function(entry, Vec::new())
    }

    /// Invoke a member on a host-supplied receiver value
    pub fn call_member(
        &self,
        receiver: Value,
        member: &str,
        args: Vec<Value>,
        sink: &mut dyn OutputSink,
    ) -> Result<Value> {
        let ty = receiver.runtime_type();
        self.interpreter(sink).call_member(receiver, &ty, member, args)
    }

    /// Invoke a member on a host-supplied receiver, dispatching on its static
    /// type. Parts the value cannot show (the payload type of a bare `None`)
    /// are taken from `receiver_type`.
    pub fn call_member_as(
        &self,
        receiver_type: &TypeExpr,
        receiver: Value,
        member: &str,
        args: Vec<Value>,
        sink: &mut dyn OutputSink,
    ) -> Result<Value> {
        let declared = TypeResolver::new(&self.registry).resolve_type(receiver_type)?;
        let actual = receiver.runtime_type();
        let ty = declared.unify(&actual).ok_or_else(|| Error::RuntimeTypeMismatch {
            expected: declared.to_string(),
            got: actual.to_string(),
            span: receiver_type.span,
        })?;
        self.interpreter(sink).call_member(receiver, &ty, member, args)
    }

    /// Resolve `member` for a receiver type written as a type expression
    pub fn resolve_for(&self, receiver: &TypeExpr, member: &str) -> Result<Binding> {
        let ty = TypeResolver::new(&self.registry).resolve_type(receiver)?;
        self.resolve(&ty, member)
    }

    pub fn resolve(&self, receiver: &ResolvedType, member: &str) -> Result<Binding> {
        self.capabilities.lookup(receiver, member)
    }

    /// The capability table as pretty JSON
    pub fn capabilities_json(&self) -> String {
        serde_json::to_string_pretty(&self.capabilities).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    /// Warnings reported by a successful load
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn stats(&self) -> ProgramStats {
        ProgramStats {
            structs: self.registry.structs().count(),
            traits: self.registry.traits().count(),
            impls: self.registry.impls().count(),
            extensions: self.registry.extensions().count(),
            functions: self.registry.functions().count(),
            matches: self.analysis.match_count(),
        }
    }

    fn interpreter<'p, 's>(&'p self, sink: &'s mut dyn OutputSink) -> Interpreter<'p, 's> {
        Interpreter::new(&self.registry, &self.capabilities, &self.analysis, sink)
    }
}
