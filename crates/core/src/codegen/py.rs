//! Python AST for generated clients.
//!
//! Only the shapes the generator produces are modeled:
//! - PyModule: header comment, import block, `TYPE_CHECKING` block, items
//! - PyClass / PyFunction: the client class and its methods
//! - PyExpr / PyStmt: method bodies delegating to the support base
//!
//! Support definitions are carried as raw text.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::registry::ImportRef;
use crate::utils::dq_str_repr;

/// A generated module.
#[derive(Debug, Clone, Default)]
pub struct PyModule {
    /// Comment lines written at the top, without the leading `#`
    pub header: Vec<String>,
    /// Runtime imports
    pub imports: Vec<PyImport>,
    /// Identifier bound to `typing.TYPE_CHECKING`, set when `type_checking_imports` is non-empty
    pub type_checking_guard: Option<String>,
    /// Imports only needed by annotations
    pub type_checking_imports: Vec<PyImport>,
    /// Top-level items, separated by two blank lines
    pub body: Vec<PyItem>,
}

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PyImport {
    /// `import module [as alias]`
    Module {
        /// Module path
        module: String,
        /// Local alias
        alias: Option<String>,
    },
    /// `from module import a, b as c`
    From {
        /// Module path
        module: String,
        /// Imported names, already sorted
        names: Vec<ImportName>,
    },
}

/// One name of a `from` import.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImportName {
    /// Imported symbol
    pub name: String,
    /// Local alias
    pub alias: Option<String>,
}

impl PyImport {
    /// Group import refs into statements.
    ///
    /// `import` statements come first, sorted by module; `from` statements
    /// follow, one per module, with names ordered constants, classes, then
    /// functions.
    pub fn group(refs: &[ImportRef]) -> Vec<PyImport> {
        let mut modules = Vec::new();
        let mut from: BTreeMap<&str, Vec<ImportName>> = BTreeMap::new();
        for import in refs {
            match &import.name {
                None => modules.push(PyImport::Module {
                    module: import.module.clone(),
                    alias: import.alias.clone(),
                }),
                Some(name) => {
                    let names = from.entry(import.module.as_str()).or_default();
                    let item = ImportName {
                        name: name.clone(),
                        alias: import.alias.clone(),
                    };
                    if !names.contains(&item) {
                        names.push(item);
                    }
                }
            }
        }
        modules.sort();
        modules.dedup();

        let from = from.into_iter().map(|(module, mut names)| {
            names.sort_by_key(|n| (name_category(&n.name), n.name.clone(), n.alias.clone()));
            PyImport::From {
                module: module.to_string(),
                names,
            }
        });
        modules.into_iter().chain(from).collect()
    }
}

/// Sort class of an imported name: CONSTANTS, then Classes, then functions.
fn name_category(name: &str) -> u8 {
    let trimmed = name.trim_start_matches('_');
    if trimmed.len() > 1 && trimmed.chars().all(|c| !c.is_lowercase()) {
        0
    } else if trimmed.chars().next().is_some_and(char::is_uppercase) {
        1
    } else {
        2
    }
}

/// Top-level module item.
#[derive(Debug, Clone)]
pub enum PyItem {
    /// Pre-rendered code
    Raw(String),
    /// A class definition
    Class(PyClass),
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct PyClass {
    /// Class name
    pub name: String,
    /// Base class expressions
    pub bases: Vec<String>,
    /// Class docstring
    pub docstring: Option<String>,
    /// Methods in order
    pub methods: Vec<PyFunction>,
}

/// A function or method definition.
#[derive(Debug, Clone)]
pub struct PyFunction {
    /// Function name
    pub name: String,
    /// Decorator expressions, without `@`
    pub decorators: Vec<String>,
    /// `async def`
    pub is_async: bool,
    /// Parameters
    pub params: Vec<PyParam>,
    /// Return annotation as union members; empty for none
    pub returns: Vec<String>,
    /// Docstring
    pub docstring: Option<String>,
    /// Body statements
    pub body: Vec<PyStmt>,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyParam {
    /// Named parameter
    Named {
        /// Parameter name
        name: String,
        /// Annotation text
        annotation: Option<String>,
        /// Default expression text
        default: Option<String>,
    },
    /// Bare `*` separating keyword-only parameters
    KeywordOnlyMarker,
}

impl PyParam {
    /// Unannotated parameter without default (`self`).
    pub fn bare(name: impl Into<String>) -> Self {
        PyParam::Named {
            name: name.into(),
            annotation: None,
            default: None,
        }
    }
}

/// A statement.
#[derive(Debug, Clone)]
pub enum PyStmt {
    /// `return expr`
    Return(PyExpr),
    /// `...`
    Ellipsis,
    /// Pre-rendered statement lines
    Raw(String),
}

/// An expression.
#[derive(Debug, Clone)]
pub enum PyExpr {
    /// Identifier or dotted name
    Ident(String),
    /// Literal value
    Literal(PyLiteral),
    /// Call
    Call {
        /// Callee
        callee: Box<PyExpr>,
        /// Arguments
        args: Vec<PyArg>,
    },
    /// `object.attr`
    Attribute {
        /// Object
        object: Box<PyExpr>,
        /// Attribute name
        attr: String,
    },
    /// `{key: value, ...}`
    Dict(Vec<(PyExpr, PyExpr)>),
    /// `await expr`
    Await(Box<PyExpr>),
    /// Pre-rendered expression text
    Raw(String),
}

impl PyExpr {
    /// Identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        PyExpr::Ident(name.into())
    }

    /// String literal expression.
    pub fn str(value: impl Into<String>) -> Self {
        PyExpr::Literal(PyLiteral::Str(value.into()))
    }

    /// Attribute access on this expression.
    pub fn attribute(self, attr: impl Into<String>) -> Self {
        PyExpr::Attribute {
            object: Box::new(self),
            attr: attr.into(),
        }
    }

    /// Call this expression with `args`.
    pub fn call(self, args: Vec<PyArg>) -> Self {
        PyExpr::Call {
            callee: Box::new(self),
            args,
        }
    }
}

/// A call argument.
#[derive(Debug, Clone)]
pub enum PyArg {
    /// Positional argument
    Positional(PyExpr),
    /// `name=value`
    Keyword {
        /// Keyword
        name: String,
        /// Value
        value: PyExpr,
    },
}

impl PyArg {
    /// Keyword argument.
    pub fn keyword(name: impl Into<String>, value: PyExpr) -> Self {
        PyArg::Keyword {
            name: name.into(),
            value,
        }
    }
}

/// A Python literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyLiteral {
    /// String, rendered double-quoted
    Str(String),
    /// Integer
    Int(i64),
    /// Float, rendered with the JSON spelling
    Float(String),
    /// `True` / `False`
    Bool(bool),
    /// `None`
    None,
}

impl PyLiteral {
    /// Literal for a scalar JSON value; `None` for arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        let literal = match value {
            Value::Null => PyLiteral::None,
            Value::Bool(b) => PyLiteral::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => PyLiteral::Int(i),
                None => PyLiteral::Float(n.to_string()),
            },
            Value::String(s) => PyLiteral::Str(s.clone()),
            Value::Array(_) | Value::Object(_) => return None,
        };
        Some(literal)
    }

    /// Python source text.
    pub fn render(&self) -> String {
        match self {
            PyLiteral::Str(s) => dq_str_repr(s),
            PyLiteral::Int(i) => i.to_string(),
            PyLiteral::Float(f) => f.clone(),
            PyLiteral::Bool(true) => "True".to_string(),
            PyLiteral::Bool(false) => "False".to_string(),
            PyLiteral::None => "None".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn from_ref(module: &str, name: &str, alias: Option<&str>) -> ImportRef {
        ImportRef {
            module: module.into(),
            name: Some(name.into()),
            alias: alias.map(Into::into),
        }
    }

    #[test]
    fn test_group_imports() {
        let refs = vec![
            from_ref("typing", "overload", None),
            from_ref("typing", "Literal", None),
            ImportRef {
                module: "httpx".into(),
                name: None,
                alias: None,
            },
            from_ref("typing", "TYPE_CHECKING", None),
            from_ref("app", "Item", Some("Item_2")),
            ImportRef {
                module: "builtins".into(),
                name: None,
                alias: None,
            },
        ];
        let grouped = PyImport::group(&refs);
        assert_eq!(
            grouped,
            vec![
                PyImport::Module {
                    module: "builtins".into(),
                    alias: None
                },
                PyImport::Module {
                    module: "httpx".into(),
                    alias: None
                },
                PyImport::From {
                    module: "app".into(),
                    names: vec![ImportName {
                        name: "Item".into(),
                        alias: Some("Item_2".into())
                    }],
                },
                PyImport::From {
                    module: "typing".into(),
                    names: vec![
                        ImportName {
                            name: "TYPE_CHECKING".into(),
                            alias: None
                        },
                        ImportName {
                            name: "Literal".into(),
                            alias: None
                        },
                        ImportName {
                            name: "overload".into(),
                            alias: None
                        },
                    ],
                },
            ]
        );
    }

    #[test]
    fn test_literal_from_json() {
        assert_eq!(PyLiteral::from_json(&json!(null)).unwrap().render(), "None");
        assert_eq!(PyLiteral::from_json(&json!(true)).unwrap().render(), "True");
        assert_eq!(PyLiteral::from_json(&json!(10)).unwrap().render(), "10");
        assert_eq!(PyLiteral::from_json(&json!(1.5)).unwrap().render(), "1.5");
        assert_eq!(PyLiteral::from_json(&json!("a\"b")).unwrap().render(), "\"a\\\"b\"");
        assert!(PyLiteral::from_json(&json!([1])).is_none());
    }
}
