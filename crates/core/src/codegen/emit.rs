//! Python code emission via the Emit trait.
//!
//! Each AST node renders itself. Expressions and signatures are laid out on
//! one line when they fit in [`LINE_WIDTH`] and exploded one element per line
//! with a trailing comma otherwise.

use super::py::{
    ImportName, PyArg, PyClass, PyExpr, PyFunction, PyImport, PyItem, PyLiteral, PyModule,
    PyParam, PyStmt,
};
use crate::utils::{INDENT, indent};

/// Maximum line width before a construct is exploded.
pub const LINE_WIDTH: usize = 88;

/// Trait for emitting Python code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its Python source representation.
    fn emit(&self) -> String;
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for PyLiteral {
    fn emit(&self) -> String {
        self.render()
    }
}

impl Emit for PyExpr {
    fn emit(&self) -> String {
        match self {
            PyExpr::Ident(name) | PyExpr::Raw(name) => name.clone(),
            PyExpr::Literal(lit) => lit.emit(),
            PyExpr::Call { callee, args } => {
                let args_str = args.iter().map(|a| a.emit()).collect::<Vec<_>>().join(", ");
                format!("{}({})", callee.emit(), args_str)
            }
            PyExpr::Attribute { object, attr } => format!("{}.{}", object.emit(), attr),
            PyExpr::Dict(entries) => {
                let parts = entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.emit(), v.emit()))
                    .collect::<Vec<_>>();
                format!("{{{}}}", parts.join(", "))
            }
            PyExpr::Await(inner) => format!("await {}", inner.emit()),
        }
    }
}

impl PyExpr {
    /// Emit at indentation `depth`, where `used` columns on the line are
    /// already taken by surrounding text.
    pub fn emit_at(&self, depth: usize, used: usize) -> String {
        let flat = self.emit();
        if depth * INDENT.len() + used + flat.len() <= LINE_WIDTH {
            return flat;
        }
        let inner = INDENT.repeat(depth + 1);
        let closing = INDENT.repeat(depth);
        match self {
            PyExpr::Call { callee, args } if !args.is_empty() => {
                let mut output = format!("{}(\n", callee.emit());
                for arg in args {
                    output.push_str(&format!("{inner}{},\n", arg.emit_at(depth + 1)));
                }
                output.push_str(&format!("{closing})"));
                output
            }
            PyExpr::Dict(entries) if !entries.is_empty() => {
                let mut output = "{\n".to_string();
                for (key, value) in entries {
                    let key = key.emit();
                    let value = value.emit_at(depth + 1, key.len() + 3);
                    output.push_str(&format!("{inner}{key}: {value},\n"));
                }
                output.push_str(&format!("{closing}}}"));
                output
            }
            PyExpr::Await(expr) => format!("await {}", expr.emit_at(depth, used + 6)),
            _ => flat,
        }
    }
}

impl Emit for PyArg {
    fn emit(&self) -> String {
        match self {
            PyArg::Positional(expr) => expr.emit(),
            PyArg::Keyword { name, value } => format!("{}={}", name, value.emit()),
        }
    }
}

impl PyArg {
    /// Emit as one line of an exploded call at indentation `depth`.
    pub fn emit_at(&self, depth: usize) -> String {
        match self {
            PyArg::Positional(expr) => expr.emit_at(depth, 1),
            PyArg::Keyword { name, value } => {
                format!("{}={}", name, value.emit_at(depth, name.len() + 2))
            }
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for PyStmt {
    fn emit(&self) -> String {
        self.emit_indented(0)
    }
}

impl PyStmt {
    /// Emit with specified indentation level (4 spaces per level).
    pub fn emit_indented(&self, depth: usize) -> String {
        let prefix = INDENT.repeat(depth);
        match self {
            PyStmt::Return(expr) => format!("{prefix}return {}\n", expr.emit_at(depth, 7)),
            PyStmt::Ellipsis => format!("{prefix}...\n"),
            PyStmt::Raw(code) => {
                let mut output = indent(code, depth);
                if !output.ends_with('\n') {
                    output.push('\n');
                }
                output
            }
        }
    }
}

// =============================================================================
// Functions and classes
// =============================================================================

impl Emit for PyParam {
    fn emit(&self) -> String {
        match self {
            PyParam::KeywordOnlyMarker => "*".to_string(),
            PyParam::Named {
                name,
                annotation,
                default,
            } => match (annotation, default) {
                (Some(annotation), Some(default)) => format!("{name}: {annotation} = {default}"),
                (Some(annotation), None) => format!("{name}: {annotation}"),
                (None, Some(default)) => format!("{name}={default}"),
                (None, None) => name.clone(),
            },
        }
    }
}

/// Render a docstring body at `depth`.
fn emit_docstring(doc: &str, depth: usize) -> String {
    let prefix = INDENT.repeat(depth);
    let escaped = doc.replace('\\', "\\\\").replace("\"\"\"", "\\\"\\\"\\\"");
    let escaped = escaped.trim();
    if escaped.contains('\n') {
        let body = indent(escaped, depth);
        format!("{prefix}\"\"\"{}\n{prefix}\"\"\"\n", body.trim_start())
    } else {
        format!("{prefix}\"\"\"{escaped}\"\"\"\n")
    }
}

impl Emit for PyFunction {
    fn emit(&self) -> String {
        self.emit_indented(0)
    }
}

impl PyFunction {
    /// Emit with specified indentation level.
    pub fn emit_indented(&self, depth: usize) -> String {
        let prefix = INDENT.repeat(depth);
        let inner = INDENT.repeat(depth + 1);
        let mut output = String::new();

        for decorator in &self.decorators {
            output.push_str(&format!("{prefix}@{decorator}\n"));
        }

        let async_str = if self.is_async { "async " } else { "" };
        output.push_str(&format!("{prefix}{async_str}def {}(", self.name));

        let params = self.params.iter().map(|p| p.emit()).collect::<Vec<_>>();
        let flat_returns = self.returns.join(" | ");
        let flat_signature = format!(
            "{prefix}{async_str}def {}({}){}:",
            self.name,
            params.join(", "),
            if self.returns.is_empty() {
                String::new()
            } else {
                format!(" -> {flat_returns}")
            }
        );

        if params.len() <= 1 && flat_signature.len() <= LINE_WIDTH {
            output.push_str(&params.join(", "));
            output.push(')');
        } else {
            output.push('\n');
            for param in &params {
                output.push_str(&format!("{inner}{param},\n"));
            }
            output.push_str(&format!("{prefix})"));
        }

        match self.returns.as_slice() {
            [] => output.push_str(":\n"),
            [single] => output.push_str(&format!(" -> {single}:\n")),
            members => {
                if prefix.len() + flat_returns.len() + 6 <= LINE_WIDTH {
                    output.push_str(&format!(" -> {flat_returns}:\n"));
                } else {
                    output.push_str(" -> (\n");
                    for (i, member) in members.iter().enumerate() {
                        let bar = if i == 0 { "" } else { "| " };
                        output.push_str(&format!("{inner}{bar}{member}\n"));
                    }
                    output.push_str(&format!("{prefix}):\n"));
                }
            }
        }

        if let Some(doc) = &self.docstring {
            output.push_str(&emit_docstring(doc, depth + 1));
        }
        if self.body.is_empty() {
            output.push_str(&format!("{inner}...\n"));
        }
        for stmt in &self.body {
            output.push_str(&stmt.emit_indented(depth + 1));
        }
        output
    }
}

impl Emit for PyClass {
    fn emit(&self) -> String {
        let bases = if self.bases.is_empty() {
            String::new()
        } else {
            format!("({})", self.bases.join(", "))
        };
        let mut output = format!("class {}{}:\n", self.name, bases);
        let mut sections = Vec::new();
        if let Some(doc) = &self.docstring {
            sections.push(emit_docstring(doc, 1));
        }
        for method in &self.methods {
            sections.push(method.emit_indented(1));
        }
        if sections.is_empty() {
            sections.push(format!("{INDENT}pass\n"));
        }
        output.push_str(&sections.join("\n"));
        output
    }
}

// =============================================================================
// Imports
// =============================================================================

impl Emit for ImportName {
    fn emit(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.name, alias),
            None => self.name.clone(),
        }
    }
}

impl Emit for PyImport {
    fn emit(&self) -> String {
        match self {
            PyImport::Module {
                module,
                alias: Some(alias),
            } => format!("import {module} as {alias}\n"),
            PyImport::Module {
                module,
                alias: None,
            } => format!("import {module}\n"),
            PyImport::From { module, names } => {
                let names = names.iter().map(|n| n.emit()).collect::<Vec<_>>();
                let line = format!("from {module} import {}", names.join(", "));
                if line.len() <= LINE_WIDTH {
                    return format!("{line}\n");
                }
                let mut output = format!("from {module} import (\n");
                for name in names {
                    output.push_str(&format!("{INDENT}{name},\n"));
                }
                output.push_str(")\n");
                output
            }
        }
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for PyItem {
    fn emit(&self) -> String {
        match self {
            PyItem::Raw(code) => code.clone(),
            PyItem::Class(class) => class.emit(),
        }
    }
}

impl Emit for PyModule {
    fn emit(&self) -> String {
        let mut sections = Vec::new();

        if !self.header.is_empty() {
            sections.push(
                self.header
                    .iter()
                    .map(|line| format!("# {line}\n"))
                    .collect::<String>(),
            );
        }

        if !self.imports.is_empty() {
            sections.push(self.imports.iter().map(|i| i.emit()).collect::<String>());
        }

        if let Some(guard) = &self.type_checking_guard
            && !self.type_checking_imports.is_empty()
        {
            let imports = self
                .type_checking_imports
                .iter()
                .map(|i| i.emit())
                .collect::<String>();
            sections.push(format!("if {guard}:\n{}", indent(&imports, 1)));
        }

        let mut output = sections.join("\n");
        for item in &self.body {
            let code = item.emit();
            let code = code.trim_matches('\n');
            if code.is_empty() {
                continue;
            }
            if !output.is_empty() {
                output.push_str("\n\n");
            }
            output.push_str(code);
            output.push('\n');
        }
        output
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn named(name: &str, annotation: &str, default: Option<&str>) -> PyParam {
        PyParam::Named {
            name: name.into(),
            annotation: Some(annotation.into()),
            default: default.map(Into::into),
        }
    }

    #[test]
    fn test_emit_short_call_inline() {
        let call = PyExpr::ident("self")
            .attribute("_request")
            .call(vec![PyArg::keyword("method", PyExpr::str("GET"))]);
        assert_eq!(call.emit(), "self._request(method=\"GET\")");
        assert_eq!(
            PyStmt::Return(call).emit_indented(2),
            "        return self._request(method=\"GET\")\n"
        );
    }

    #[test]
    fn test_emit_long_call_exploded() {
        let dict = PyExpr::Dict(vec![(
            PyExpr::str("q"),
            PyExpr::ident("q"),
        )]);
        let call = PyExpr::ident("self").attribute("_request").call(vec![
            PyArg::keyword("method", PyExpr::str("GET")),
            PyArg::keyword("path", PyExpr::str("/a/very/long/path/that/keeps/going/{and_going}")),
            PyArg::keyword("query_params", dict),
        ]);
        let expected = concat!(
            "        return self._request(\n",
            "            method=\"GET\",\n",
            "            path=\"/a/very/long/path/that/keeps/going/{and_going}\",\n",
            "            query_params={\"q\": q},\n",
            "        )\n",
        );
        assert_eq!(PyStmt::Return(call).emit_indented(2), expected);
    }

    #[test]
    fn test_emit_await_exploded() {
        let call = PyExpr::ident("self").attribute("_request").call(vec![
            PyArg::keyword("method", PyExpr::str("POST")),
            PyArg::keyword("path", PyExpr::str("/items/{item_id}/sub/resources/with/a/long/name")),
        ]);
        let out = PyStmt::Return(PyExpr::Await(Box::new(call))).emit_indented(2);
        assert!(out.starts_with("        return await self._request(\n"));
        assert!(out.ends_with("        )\n"));
    }

    #[test]
    fn test_emit_function_signature() {
        let func = PyFunction {
            name: "get_foo".into(),
            decorators: vec![],
            is_async: false,
            params: vec![
                PyParam::bare("self"),
                named("q", "str", None),
                PyParam::KeywordOnlyMarker,
                named("client_exts", "ClientExts | None", Some("None")),
            ],
            returns: vec!["ClientResult[Literal[HTTPStatus.OK], str]".into()],
            docstring: Some("Get foo.".into()),
            body: vec![PyStmt::Ellipsis],
        };
        let expected = concat!(
            "    def get_foo(\n",
            "        self,\n",
            "        q: str,\n",
            "        *,\n",
            "        client_exts: ClientExts | None = None,\n",
            "    ) -> ClientResult[Literal[HTTPStatus.OK], str]:\n",
            "        \"\"\"Get foo.\"\"\"\n",
            "        ...\n",
        );
        assert_eq!(func.emit_indented(1), expected);
    }

    #[test]
    fn test_emit_union_return_exploded() {
        let func = PyFunction {
            name: "get_foo".into(),
            decorators: vec!["overload".into()],
            is_async: true,
            params: vec![PyParam::bare("self"), named("q", "str", None)],
            returns: vec![
                "ClientResult[Literal[HTTPStatus.OK], str]".into(),
                "ClientResult[Literal[HTTPStatus.CREATED], int]".into(),
            ],
            docstring: None,
            body: vec![],
        };
        let expected = concat!(
            "    @overload\n",
            "    async def get_foo(\n",
            "        self,\n",
            "        q: str,\n",
            "    ) -> (\n",
            "        ClientResult[Literal[HTTPStatus.OK], str]\n",
            "        | ClientResult[Literal[HTTPStatus.CREATED], int]\n",
            "    ):\n",
            "        ...\n",
        );
        assert_eq!(func.emit_indented(1), expected);
    }

    #[test]
    fn test_emit_multiline_docstring() {
        let out = emit_docstring("Summary.\n\nDetails with \"\"\" quotes.", 1);
        assert_eq!(
            out,
            "    \"\"\"Summary.\n\n    Details with \\\"\\\"\\\" quotes.\n    \"\"\"\n"
        );
    }

    #[test]
    fn test_emit_imports() {
        let import = PyImport::From {
            module: "typing".into(),
            names: vec![
                ImportName { name: "Any".into(), alias: None },
                ImportName { name: "Literal".into(), alias: Some("Literal_2".into()) },
            ],
        };
        assert_eq!(import.emit(), "from typing import Any, Literal as Literal_2\n");
        let module = PyImport::Module { module: "builtins".into(), alias: None };
        assert_eq!(module.emit(), "import builtins\n");
    }

    #[test]
    fn test_emit_long_from_import() {
        let names = (0..12)
            .map(|i| ImportName { name: format!("LongSymbolName{i}"), alias: None })
            .collect();
        let import = PyImport::From { module: "app.models".into(), names };
        let out = import.emit();
        assert!(out.starts_with("from app.models import (\n    LongSymbolName0,\n"));
        assert!(out.ends_with("    LongSymbolName11,\n)\n"));
    }

    #[test]
    fn test_emit_module_layout() {
        let module = PyModule {
            header: vec!["Generated.".into()],
            imports: vec![PyImport::Module { module: "httpx".into(), alias: None }],
            type_checking_guard: Some("TYPE_CHECKING".into()),
            type_checking_imports: vec![PyImport::From {
                module: "app".into(),
                names: vec![ImportName { name: "Item".into(), alias: None }],
            }],
            body: vec![
                PyItem::Raw("X = 1\n".into()),
                PyItem::Class(PyClass {
                    name: "Api".into(),
                    bases: vec![],
                    docstring: None,
                    methods: vec![],
                }),
            ],
        };
        let expected = concat!(
            "# Generated.\n",
            "\n",
            "import httpx\n",
            "\n",
            "if TYPE_CHECKING:\n",
            "    from app import Item\n",
            "\n\n",
            "X = 1\n",
            "\n\n",
            "class Api:\n",
            "    pass\n",
        );
        assert_eq!(module.emit(), expected);
    }
}
