//! Import registry for generated modules.
//!
//! Every type referenced by generated source goes through [`ImportRegistry::get_usage`],
//! which returns the text to write at the use site and records the imports that
//! make that text resolve. The registry guarantees:
//!
//! - one usage string per type identity, stable for the registry's lifetime
//! - collision-free identifiers: the first claimant of a base name keeps it,
//!   later ones get `_2`, `_3`, ... in first-seen order
//! - reserved identifiers (parameter names, method names, ...) push colliding
//!   imports onto the renaming path from their first occurrence
//! - imports only needed inside annotations are tracked separately so they
//!   can be emitted under `if TYPE_CHECKING:`

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use tracing::debug;

use crate::types::{Builtin, LiteralValue, NamedType, TypeExpr};
use crate::utils::dq_str_repr;

/// One import statement target.
///
/// `name == None` is `import module [as alias]`, otherwise
/// `from module import name [as alias]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImportRef {
    /// Module path
    pub module: String,
    /// Imported symbol, `None` for a module import
    pub name: Option<String>,
    /// Local alias when the bound identifier differs from the imported one
    pub alias: Option<String>,
}

/// What an identifier in the generated module is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum BindingTarget {
    /// A definition emitted into the generated module
    Local(String),
    /// `import module`
    Module(String),
    /// `from module import name`
    Symbol { module: String, name: String },
}

/// Cached rendering of one type identity.
#[derive(Debug, Clone)]
struct RegistryEntry {
    usage: String,
    only_for_type_checking: bool,
    imports: Vec<ImportRef>,
    children: Vec<TypeExpr>,
}

/// Deduplicates and names every external symbol used by a generated module.
#[derive(Debug)]
pub struct ImportRegistry {
    barriers: Vec<String>,
    taken: HashSet<String>,
    counters: HashMap<String, usize>,
    bindings: IndexMap<BindingTarget, String>,
    entries: IndexMap<TypeExpr, RegistryEntry>,
    imports: IndexMap<ImportRef, bool>,
    stream_container: NamedType,
}

impl Default for ImportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportRegistry {
    /// Create an empty registry rendering streams as `collections.abc.Iterator`.
    pub fn new() -> Self {
        Self {
            barriers: Vec::new(),
            taken: HashSet::new(),
            counters: HashMap::new(),
            bindings: IndexMap::new(),
            entries: IndexMap::new(),
            imports: IndexMap::new(),
            stream_container: NamedType::new("collections.abc", "Iterator"),
        }
    }

    /// Set the nominal type used to render [`TypeExpr::SequenceOf`].
    pub fn set_stream_container(&mut self, container: NamedType) {
        self.stream_container = container;
    }

    /// Register module paths under which types are imported relative to the
    /// barrier rather than from their defining module.
    ///
    /// Usages computed before the call are not affected.
    pub fn add_barrier<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            let path = path.into();
            let path = path.trim_matches('.').to_string();
            if !path.is_empty() && !self.barriers.contains(&path) {
                self.barriers.push(path);
            }
        }
    }

    /// Pre-claim an identifier so imports that would bind it get renamed.
    pub fn add_reserved_ident(&mut self, name: impl Into<String>) {
        self.taken.insert(name.into());
    }

    /// Claim an identifier for a definition emitted into the generated module.
    ///
    /// Returns the identifier to define, which differs from `name` on collision.
    /// Claiming the same name twice returns the same identifier.
    pub fn claim_local(&mut self, name: &str) -> String {
        self.bind(BindingTarget::Local(name.to_string()))
    }

    /// Bind `import module` and return the identifier to use for it.
    pub fn import_module(&mut self, module: &str, only_for_type_checking: bool) -> String {
        let ident = self.bind(BindingTarget::Module(module.to_string()));
        let import = module_import(module, &ident);
        self.record_import(import, !only_for_type_checking);
        ident
    }

    /// Usage text for `ty`, recording the imports it needs.
    ///
    /// The first request decides the identifiers involved. A type first
    /// requested for type checking only is returned quoted as a forward
    /// reference while one of its imports is type-checking only. A runtime
    /// request upgrades it and the upgrade is never reverted.
    pub fn get_usage(&mut self, ty: &TypeExpr, only_for_type_checking: bool) -> String {
        let usage = self.resolve(ty, only_for_type_checking);
        let quoted = self.entries.get(ty).is_some_and(|entry| {
            entry.only_for_type_checking
                && entry
                    .imports
                    .iter()
                    .any(|import| !self.imports.get(import).copied().unwrap_or(false))
        });
        if quoted { dq_str_repr(&usage) } else { usage }
    }

    /// Imports in first-use order.
    ///
    /// With `only_for_type_checking`, only the imports no runtime usage needs.
    pub fn imports(&self, only_for_type_checking: bool) -> Vec<ImportRef> {
        self.imports
            .iter()
            .filter(|(_, runtime)| !only_for_type_checking || !**runtime)
            .map(|(import, _)| import.clone())
            .collect()
    }

    fn resolve(&mut self, ty: &TypeExpr, only_for_type_checking: bool) -> String {
        if let Some(entry) = self.entries.get(ty) {
            let usage = entry.usage.clone();
            if !only_for_type_checking && entry.only_for_type_checking {
                self.mark_runtime(ty);
            }
            return usage;
        }

        let mut imports = Vec::new();
        let usage = self.render(ty, only_for_type_checking, &mut imports);
        debug!(usage = %usage, imports = imports.len(), "Registered type usage.");
        for import in &imports {
            self.record_import(import.clone(), !only_for_type_checking);
        }
        self.entries.insert(
            ty.clone(),
            RegistryEntry {
                usage: usage.clone(),
                only_for_type_checking,
                imports,
                children: ty.children().into_iter().cloned().collect(),
            },
        );
        usage
    }

    fn mark_runtime(&mut self, ty: &TypeExpr) {
        let Some(entry) = self.entries.get_mut(ty) else {
            return;
        };
        if !entry.only_for_type_checking {
            return;
        }
        entry.only_for_type_checking = false;
        let imports = entry.imports.clone();
        let children = entry.children.clone();
        for import in imports {
            self.record_import(import, true);
        }
        for child in &children {
            self.mark_runtime(child);
        }
    }

    fn record_import(&mut self, import: ImportRef, runtime: bool) {
        let needed_at_runtime = self.imports.entry(import).or_insert(runtime);
        *needed_at_runtime |= runtime;
    }

    /// Resolve a child and merge its imports into the parent's list.
    fn child(
        &mut self,
        ty: &TypeExpr,
        only_for_type_checking: bool,
        imports: &mut Vec<ImportRef>,
    ) -> String {
        let usage = self.resolve(ty, only_for_type_checking);
        if let Some(entry) = self.entries.get(ty) {
            for import in &entry.imports {
                if !imports.contains(import) {
                    imports.push(import.clone());
                }
            }
        }
        usage
    }

    fn render(
        &mut self,
        ty: &TypeExpr,
        only_for_type_checking: bool,
        imports: &mut Vec<ImportRef>,
    ) -> String {
        match ty {
            TypeExpr::Builtin { name } => self.render_builtin(*name, imports),
            TypeExpr::Named(named) => self.render_named(named, imports),
            TypeExpr::Generic { base, args } => {
                let base = self.child(base, only_for_type_checking, imports);
                if args.is_empty() {
                    return base;
                }
                let args = args
                    .iter()
                    .map(|arg| self.child(arg, only_for_type_checking, imports))
                    .collect::<Vec<_>>();
                format!("{base}[{}]", args.join(", "))
            }
            TypeExpr::Union { members } => members
                .iter()
                .map(|member| self.child(member, only_for_type_checking, imports))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeExpr::Literal { value } => {
                let literal = self.child(
                    &TypeExpr::named("typing", "Literal"),
                    only_for_type_checking,
                    imports,
                );
                let value = match value {
                    LiteralValue::Bool(true) => "True".to_string(),
                    LiteralValue::Bool(false) => "False".to_string(),
                    LiteralValue::Int(n) => n.to_string(),
                    LiteralValue::Str(s) => dq_str_repr(s),
                    LiteralValue::None => "None".to_string(),
                    LiteralValue::EnumMember { enum_type, member } => {
                        let enum_usage = self.child(
                            &TypeExpr::Named(enum_type.clone()),
                            only_for_type_checking,
                            imports,
                        );
                        format!("{enum_usage}.{member}")
                    }
                };
                format!("{literal}[{value}]")
            }
            TypeExpr::SequenceOf { item } => {
                let container = TypeExpr::Named(self.stream_container.clone());
                let container = self.child(&container, only_for_type_checking, imports);
                let item = self.child(item, only_for_type_checking, imports);
                format!("{container}[{item}]")
            }
        }
    }

    fn render_builtin(&mut self, builtin: Builtin, imports: &mut Vec<ImportRef>) -> String {
        let name = builtin.as_str();
        if !builtin.is_shadowable() || !self.taken.contains(name) {
            return name.to_string();
        }
        let ident = self.bind(BindingTarget::Module("builtins".to_string()));
        imports.push(module_import("builtins", &ident));
        format!("{ident}.{name}")
    }

    fn render_named(&mut self, named: &NamedType, imports: &mut Vec<ImportRef>) -> String {
        let tail = named.tail().map(|tail| format!(".{tail}")).unwrap_or_default();
        if named.is_local() {
            let ident = self.bind(BindingTarget::Local(named.head().to_string()));
            return format!("{ident}{tail}");
        }

        let (target, path) = match self.barrier_for(&named.module) {
            Some(barrier) if barrier == named.module => (
                BindingTarget::Symbol {
                    module: barrier,
                    name: named.head().to_string(),
                },
                String::new(),
            ),
            Some(barrier) => {
                let rest = &named.module[barrier.len() + 1..];
                let (submodule, deeper) = match rest.split_once('.') {
                    Some((submodule, deeper)) => (submodule.to_string(), format!(".{deeper}")),
                    None => (rest.to_string(), String::new()),
                };
                (
                    BindingTarget::Symbol {
                        module: barrier,
                        name: submodule,
                    },
                    format!("{deeper}.{}", named.head()),
                )
            }
            None => (
                BindingTarget::Symbol {
                    module: named.module.clone(),
                    name: named.head().to_string(),
                },
                String::new(),
            ),
        };

        let ident = self.bind(target.clone());
        if let BindingTarget::Symbol { module, name } = &target {
            imports.push(ImportRef {
                module: module.clone(),
                name: Some(name.clone()),
                alias: (ident != *name).then(|| ident.clone()),
            });
        }
        format!("{ident}{path}{tail}")
    }

    /// The most specific barrier containing `module`.
    fn barrier_for(&self, module: &str) -> Option<String> {
        self.barriers
            .iter()
            .filter(|barrier| {
                module == barrier.as_str()
                    || module
                        .strip_prefix(barrier.as_str())
                        .is_some_and(|rest| rest.starts_with('.'))
            })
            .max_by_key(|barrier| barrier.len())
            .cloned()
    }

    fn bind(&mut self, target: BindingTarget) -> String {
        if let Some(ident) = self.bindings.get(&target) {
            return ident.clone();
        }
        let base = match &target {
            BindingTarget::Local(name) | BindingTarget::Symbol { name, .. } => name.clone(),
            BindingTarget::Module(module) => {
                module.rsplit('.').next().unwrap_or(module).to_string()
            }
        };
        let ident = self.allocate(&base);
        self.bindings.insert(target, ident.clone());
        ident
    }

    fn allocate(&mut self, base: &str) -> String {
        if self.taken.insert(base.to_string()) {
            return base.to_string();
        }
        let counter = self.counters.entry(base.to_string()).or_insert(1);
        loop {
            *counter += 1;
            let candidate = format!("{base}_{counter}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

fn module_import(module: &str, ident: &str) -> ImportRef {
    ImportRef {
        module: module.to_string(),
        name: None,
        alias: (ident != module).then(|| ident.to_string()),
    }
}
