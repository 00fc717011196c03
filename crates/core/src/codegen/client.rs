//! Rendering of one route contract into client methods.
//!
//! A route becomes one method, preceded by two `@overload`s when it has more
//! than one response variant: the first narrows the return type to the
//! default variant when `raise_if_not_default_status` is literally `True`.

use tracing::debug;

use super::py::{PyArg, PyExpr, PyFunction, PyLiteral, PyParam, PyStmt};
use super::support::{CallingConvention, SupportRefs};
use crate::registry::ImportRegistry;
use crate::route::{Binding, DefaultValue, ParameterSpec, RouteContract};
use crate::types::{Builtin, LiteralValue, NamedType, TypeExpr};
use crate::utils::http_status_name;

/// Per-run rendering settings shared by every route.
#[derive(Debug, Clone, Copy)]
pub struct RouteRenderContext<'a> {
    /// Support definitions
    pub support: &'a SupportRefs,
    /// Calling convention of the client class
    pub convention: CallingConvention,
    /// Default of `raise_if_not_default_status`
    pub raise_default: bool,
}

/// `Literal[HTTPStatus.NAME]`, or `Literal[code]` for non-standard codes.
pub fn status_literal(status: u16) -> TypeExpr {
    let value = match http_status_name(status) {
        Some(member) => LiteralValue::EnumMember {
            enum_type: NamedType::new("http", "HTTPStatus"),
            member: member.to_string(),
        },
        None => LiteralValue::Int(i64::from(status)),
    };
    TypeExpr::literal(value)
}

/// `ClientResult[Literal[status], schema]`
fn result_type(support: &SupportRefs, status: u16, schema: &TypeExpr) -> TypeExpr {
    TypeExpr::generic(
        support.result.clone(),
        vec![status_literal(status), schema.clone()],
    )
}

/// Render a route into its methods (overloads first).
pub fn render_route(
    contract: &RouteContract,
    registry: &mut ImportRegistry,
    ctx: RouteRenderContext<'_>,
) -> Vec<PyFunction> {
    // Responses are needed at runtime and go first so their names are settled
    // before annotation-only uses.
    let mut variants = Vec::new();
    let mut response_models = Vec::new();
    for (status, response) in &contract.responses {
        variants.push(registry.get_usage(&result_type(ctx.support, *status, &response.schema), false));
        let model = match &response.schema {
            TypeExpr::SequenceOf { item } if contract.streaming && *status == contract.default_status => {
                item.as_ref()
            }
            schema => schema,
        };
        response_models.push((*status, registry.get_usage(model, false)));
    }
    let default_variant = contract
        .responses
        .get_index_of(&contract.default_status)
        .and_then(|i| variants.get(i))
        .cloned();

    let mut params = vec![PyParam::bare("self")];
    let mut marker_written = false;
    for param in &contract.parameters {
        if param.keyword_only && !marker_written {
            params.push(PyParam::KeywordOnlyMarker);
            marker_written = true;
        }
        params.push(render_param(param, registry, ctx.support));
    }
    if !marker_written {
        params.push(PyParam::KeywordOnlyMarker);
    }
    let exts = registry.get_usage(&TypeExpr::optional(ctx.support.exts.clone()), true);
    params.push(PyParam::Named {
        name: "client_exts".to_string(),
        annotation: Some(exts),
        default: Some("None".to_string()),
    });

    let bool_usage = registry.get_usage(&TypeExpr::builtin(Builtin::Bool), true);
    let raise_default = PyLiteral::Bool(ctx.raise_default).render();
    let raise_param = |annotation: String, default: Option<String>| PyParam::Named {
        name: "raise_if_not_default_status".to_string(),
        annotation: Some(annotation),
        default,
    };

    let docstring = docstring(contract);
    let is_async = ctx.convention == CallingConvention::Async;
    let mut functions = Vec::new();

    if variants.len() > 1
        && let Some(default_variant) = default_variant
    {
        let overload = registry.get_usage(&TypeExpr::named("typing", "overload"), false);
        let literal_true =
            registry.get_usage(&TypeExpr::literal(LiteralValue::Bool(true)), true);

        let mut narrowed = params.clone();
        narrowed.push(raise_param(
            literal_true,
            ctx.raise_default.then(|| raise_default.clone()),
        ));
        functions.push(PyFunction {
            name: contract.name.clone(),
            decorators: vec![overload.clone()],
            is_async,
            params: narrowed,
            returns: vec![default_variant],
            docstring: None,
            body: vec![PyStmt::Ellipsis],
        });

        let mut general = params.clone();
        general.push(raise_param(bool_usage.clone(), Some(raise_default.clone())));
        functions.push(PyFunction {
            name: contract.name.clone(),
            decorators: vec![overload],
            is_async,
            params: general,
            returns: variants.clone(),
            docstring: None,
            body: vec![PyStmt::Ellipsis],
        });
    }

    params.push(raise_param(bool_usage, Some(raise_default)));
    let call = request_call(contract, &response_models);
    let call = if is_async {
        PyExpr::Await(Box::new(call))
    } else {
        call
    };
    functions.push(PyFunction {
        name: contract.name.clone(),
        decorators: Vec::new(),
        is_async,
        params,
        returns: variants,
        docstring,
        body: vec![PyStmt::Return(call)],
    });

    debug!(route = %contract.name, methods = functions.len(), "Rendered route.");
    functions
}

fn render_param(
    param: &ParameterSpec,
    registry: &mut ImportRegistry,
    support: &SupportRefs,
) -> PyParam {
    let annotation = registry.get_usage(&param.ty, true);
    let default = match &param.default {
        None => None,
        Some(DefaultValue::Literal(value)) => Some(
            PyLiteral::from_json(value)
                .map_or_else(|| registry.get_usage(&support.unset, false), |lit| lit.render()),
        ),
        Some(DefaultValue::Unset) => Some(registry.get_usage(&support.unset, false)),
    };
    PyParam::Named {
        name: param.name.clone(),
        annotation: Some(annotation),
        default,
    }
}

fn docstring(contract: &RouteContract) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(summary) = contract.summary.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        parts.push(summary.to_string());
    }
    if let Some(description) = contract
        .description
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        parts.push(description.to_string());
    }
    if contract.deprecated {
        parts.push("Deprecated: this endpoint may be removed by the service.".to_string());
    }
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

/// Keyword arguments mapping wire names to parameter names.
fn binding_dict(contract: &RouteContract, binding: Binding) -> Option<PyExpr> {
    let entries: Vec<_> = contract
        .params_with(binding)
        .map(|p| (PyExpr::str(&p.wire_name), PyExpr::ident(&p.name)))
        .collect();
    (!entries.is_empty()).then_some(PyExpr::Dict(entries))
}

fn request_call(contract: &RouteContract, response_models: &[(u16, String)]) -> PyExpr {
    let mut args = vec![
        PyArg::keyword("method", PyExpr::str(contract.http_method.as_str())),
        PyArg::keyword("path", PyExpr::str(&contract.path_template)),
        PyArg::keyword(
            "responses",
            PyExpr::Dict(
                response_models
                    .iter()
                    .map(|(status, model)| {
                        (
                            PyExpr::Literal(PyLiteral::Int(i64::from(*status))),
                            PyExpr::ident(model),
                        )
                    })
                    .collect(),
            ),
        ),
        PyArg::keyword(
            "default_status",
            PyExpr::Literal(PyLiteral::Int(i64::from(contract.default_status))),
        ),
    ];

    for (keyword, binding) in [
        ("path_params", Binding::Path),
        ("query_params", Binding::Query),
        ("header_params", Binding::Header),
        ("cookie_params", Binding::Cookie),
        ("body_fields", Binding::BodyEmbedded),
    ] {
        if let Some(dict) = binding_dict(contract, binding) {
            args.push(PyArg::keyword(keyword, dict));
        }
    }
    if let Some(body) = contract.params_with(Binding::BodyUnembedded).next() {
        args.push(PyArg::keyword("body", PyExpr::ident(&body.name)));
    }
    if contract.streaming {
        args.push(PyArg::keyword("stream", PyExpr::Literal(PyLiteral::Bool(true))));
    }
    args.push(PyArg::keyword("client_exts", PyExpr::ident("client_exts")));
    args.push(PyArg::keyword(
        "raise_if_not_default_status",
        PyExpr::ident("raise_if_not_default_status"),
    ));

    PyExpr::ident("self").attribute("_request").call(args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::description::EndpointDescription;
    use crate::route::RouteTranslator;
    use serde_json::json;

    fn contract(value: serde_json::Value) -> RouteContract {
        let endpoint: EndpointDescription = serde_json::from_value(value).unwrap();
        RouteTranslator::new(TypeExpr::local("ClientHTTPValidationError"))
            .translate(&endpoint)
            .unwrap()
    }

    fn render(contract: &RouteContract, convention: CallingConvention, raise: bool) -> String {
        let support = SupportRefs::inline();
        let mut registry = ImportRegistry::new();
        let ctx = RouteRenderContext {
            support: &support,
            convention,
            raise_default: raise,
        };
        render_route(contract, &mut registry, ctx)
            .iter()
            .map(|f| f.emit_indented(1))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_status_literal() {
        assert_eq!(
            status_literal(201),
            TypeExpr::literal(LiteralValue::EnumMember {
                enum_type: NamedType::new("http", "HTTPStatus"),
                member: "CREATED".into(),
            })
        );
        assert_eq!(status_literal(599), TypeExpr::literal(LiteralValue::Int(599)));
    }

    #[test]
    fn test_single_response_has_no_overloads() {
        let c = contract(json!({"name": "ping", "path": "/ping", "methods": ["GET"],
            "response_model": {"kind": "builtin", "name": "str"}}));
        let out = render(&c, CallingConvention::Blocking, false);
        let expected = concat!(
            "    def ping(\n",
            "        self,\n",
            "        *,\n",
            "        client_exts: ClientExts | None = None,\n",
            "        raise_if_not_default_status: bool = False,\n",
            "    ) -> ClientResult[Literal[HTTPStatus.OK], str]:\n",
            "        return self._request(\n",
            "            method=\"GET\",\n",
            "            path=\"/ping\",\n",
            "            responses={200: str},\n",
            "            default_status=200,\n",
            "            client_exts=client_exts,\n",
            "            raise_if_not_default_status=raise_if_not_default_status,\n",
            "        )\n",
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_overloads_narrow_on_literal_true() {
        let c = contract(json!({"name": "get_foo", "path": "/foo", "methods": ["GET"],
            "response_model": {"kind": "builtin", "name": "str"},
            "responses": [{"status": 201, "model": {"kind": "builtin", "name": "int"}}],
            "parameters": [{"name": "q", "in": "query", "type": {"kind": "builtin", "name": "str"}}]}));
        let out = render(&c, CallingConvention::Blocking, false);
        assert_eq!(out.matches("@overload").count(), 2);
        assert!(out.contains(
            "        raise_if_not_default_status: Literal[True],\n    ) -> ClientResult[Literal[HTTPStatus.OK], str]:\n        ...\n"
        ));
        assert!(out.contains(concat!(
            "    ) -> (\n",
            "        ClientResult[Literal[HTTPStatus.OK], str]\n",
            "        | ClientResult[Literal[HTTPStatus.CREATED], int]\n",
            "        | ClientResult[Literal[HTTPStatus.UNPROCESSABLE_CONTENT], ClientHTTPValidationError]\n",
            "    ):\n",
        )));
        assert!(out.contains("responses={200: str, 201: int, 422: ClientHTTPValidationError},"));
        assert!(out.contains("query_params={\"q\": q},"));
    }

    #[test]
    fn test_raise_default_true() {
        let c = contract(json!({"name": "get_foo", "path": "/foo", "methods": ["GET"],
            "responses": [{"status": 404}]}));
        let out = render(&c, CallingConvention::Blocking, true);
        assert!(out.contains("raise_if_not_default_status: Literal[True] = True,"));
        assert!(out.contains("raise_if_not_default_status: bool = True,"));
    }

    #[test]
    fn test_async_awaits_request() {
        let c = contract(json!({"name": "ping", "path": "/ping", "methods": ["GET"]}));
        let out = render(&c, CallingConvention::Async, false);
        assert!(out.contains("    async def ping(\n"));
        assert!(out.contains("        return await self._request(\n"));
    }

    #[test]
    fn test_body_arguments() {
        let single = contract(json!({"name": "create", "path": "/items", "methods": ["POST"],
            "parameters": [{"name": "item", "in": "body", "type": {"kind": "named", "module": "app", "name": "Item"}}]}));
        let out = render(&single, CallingConvention::Blocking, false);
        assert!(out.contains("        item: \"Item\",\n"));
        assert!(out.contains("            body=item,\n"));

        let multi = contract(json!({"name": "create", "path": "/items", "methods": ["POST"],
            "parameters": [
                {"name": "param1", "in": "body", "type": {"kind": "builtin", "name": "str"}},
                {"name": "param2", "in": "body", "type": {"kind": "builtin", "name": "int"}, "required": false}
            ]}));
        let out = render(&multi, CallingConvention::Blocking, false);
        assert!(out.contains("        self,\n        *,\n        param1: str,\n        param2: int = UNSET,\n"));
        assert!(out.contains("body_fields={\"param1\": param1, \"param2\": param2},"));
    }

    #[test]
    fn test_streaming_uses_element_model() {
        let c = contract(json!({"name": "events", "path": "/events", "methods": ["GET"],
            "streaming": true,
            "response_model": {"kind": "generic", "base": {"kind": "builtin", "name": "list"}, "args": [{"kind": "builtin", "name": "int"}]}}));
        let out = render(&c, CallingConvention::Blocking, false);
        assert!(out.contains("-> ClientResult[Literal[HTTPStatus.OK], Iterator[int]]:"));
        assert!(out.contains("responses={200: int},"));
        assert!(out.contains("stream=True,"));
    }

    #[test]
    fn test_docstring_and_defaults() {
        let c = contract(json!({"name": "search", "path": "/search", "methods": ["GET"],
            "summary": "Search items.", "description": "Full text search.", "deprecated": true,
            "parameters": [
                {"name": "limit", "in": "query", "type": {"kind": "builtin", "name": "int"}, "default": 10},
                {"name": "tag", "in": "query", "type": {"kind": "builtin", "name": "str"}, "required": false},
                {"name": "x_trace", "in": "header", "type": {"kind": "builtin", "name": "str"}, "default": null}
            ]}));
        let out = render(&c, CallingConvention::Blocking, false);
        assert!(out.contains("        limit: int = 10,\n"));
        assert!(out.contains("        tag: str = UNSET,\n"));
        assert!(out.contains("        x_trace: str | None = None,\n"));
        assert!(out.contains("header_params={\"x-trace\": x_trace},"));
        assert!(out.contains("        \"\"\"Search items.\n\n        Full text search.\n\n        Deprecated:"));
    }
}
