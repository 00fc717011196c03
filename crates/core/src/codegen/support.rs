//! Support definitions shared by every generated client.
//!
//! The result wrapper, the non-default-status error, the validation error
//! models, per-call options and the transport base classes. They are rendered
//! from tera templates whose variables are the identifiers the import registry
//! assigned, so user types can never shadow them.

use tera::{Context, Tera};

use crate::error::GenerateError;
use crate::registry::ImportRegistry;
use crate::types::TypeExpr;

/// Calling convention of a generated client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConvention {
    /// Plain blocking methods on `httpx.Client`
    #[default]
    Blocking,
    /// `async def` methods on `httpx.AsyncClient`
    Async,
}

/// Public support definitions referenced by client classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRefs {
    /// `ClientResult[StatusT, DataT]`
    pub result: TypeExpr,
    /// `ClientNotDefaultStatusError`
    pub not_default_status_error: TypeExpr,
    /// `ClientHTTPValidationError`
    pub http_validation_error: TypeExpr,
    /// `ClientExts`
    pub exts: TypeExpr,
    /// `UNSET`
    pub unset: TypeExpr,
    /// `ClientBase`
    pub client_base: TypeExpr,
    /// `AsyncClientBase`
    pub async_client_base: TypeExpr,
}

impl SupportRefs {
    /// References to definitions emitted into the generated module.
    pub fn inline() -> Self {
        Self::from_module("")
    }

    /// References to definitions imported from a shared support module.
    pub fn from_module(module: &str) -> Self {
        let named = |name: &str| TypeExpr::named(module, name);
        Self {
            result: named("ClientResult"),
            not_default_status_error: named("ClientNotDefaultStatusError"),
            http_validation_error: named("ClientHTTPValidationError"),
            exts: named("ClientExts"),
            unset: named("UNSET"),
            client_base: named("ClientBase"),
            async_client_base: named("AsyncClientBase"),
        }
    }

    /// Base class of a client with the given convention.
    pub fn base_for(&self, convention: CallingConvention) -> &TypeExpr {
        match convention {
            CallingConvention::Blocking => &self.client_base,
            CallingConvention::Async => &self.async_client_base,
        }
    }
}

/// A template section with the names it defines and imports.
struct Section {
    template: &'static str,
    locals: &'static [&'static str],
    modules: &'static [&'static str],
    symbols: &'static [(&'static str, &'static str)],
}

static COMMON: Section = Section {
    template: COMMON_TEMPLATE,
    locals: &[
        "ClientValidationError",
        "ClientHTTPValidationError",
        "ClientExts",
        "_Unset",
        "UNSET",
        "ClientResult",
        "ClientNotDefaultStatusError",
        "_to_status",
        "_build_request",
        "_decode",
        "_make_result",
    ],
    modules: &["httpx", "warnings"],
    symbols: &[
        ("collections.abc", "Mapping"),
        ("dataclasses", "dataclass"),
        ("http", "HTTPStatus"),
        ("typing", "Any"),
        ("typing", "TypedDict"),
        ("urllib.parse", "quote"),
        ("pydantic", "BaseModel"),
        ("pydantic", "TypeAdapter"),
        ("pydantic_core", "to_json"),
        ("pydantic_core", "to_jsonable_python"),
    ],
};

static BLOCKING: Section = Section {
    template: BLOCKING_TEMPLATE,
    locals: &["_iter_json_lines", "ClientBase"],
    modules: &[],
    symbols: &[("collections.abc", "Iterator"), ("typing", "Self")],
};

static ASYNC: Section = Section {
    template: ASYNC_TEMPLATE,
    locals: &["_aiter_json_lines", "AsyncClientBase"],
    modules: &[],
    symbols: &[("collections.abc", "AsyncIterator"), ("typing", "Self")],
};

/// Template variable for a name; tera variables cannot start with `_`.
fn var_name(name: &str) -> &str {
    name.trim_start_matches('_')
}

/// Render support definitions for `conventions` into `registry`'s module.
///
/// Claims every defined name and records every import as needed at runtime.
/// `raise_default` is the default of `raise_if_not_default_status`.
pub fn render_support(
    registry: &mut ImportRegistry,
    conventions: &[CallingConvention],
    raise_default: bool,
) -> Result<String, GenerateError> {
    let mut sections = vec![&COMMON];
    let mut seen = Vec::new();
    for convention in conventions {
        if seen.contains(convention) {
            continue;
        }
        seen.push(*convention);
        sections.push(match convention {
            CallingConvention::Blocking => &BLOCKING,
            CallingConvention::Async => &ASYNC,
        });
    }

    let mut context = Context::new();
    context.insert("raise_default", if raise_default { "True" } else { "False" });
    for section in &sections {
        for local in section.locals {
            context.insert(var_name(local), &registry.claim_local(local));
        }
    }
    for section in &sections {
        for module in section.modules {
            context.insert(*module, &registry.import_module(module, false));
        }
        for (module, name) in section.symbols {
            let usage = registry.get_usage(&TypeExpr::named(*module, *name), false);
            context.insert(*name, &usage);
        }
    }

    let mut rendered = Vec::new();
    for section in sections {
        let code = Tera::one_off(section.template, &context, false)
            .map_err(|err| GenerateError::Template(err.to_string()))?;
        rendered.push(code.trim_matches('\n').to_string());
    }
    Ok(rendered.join("\n\n\n") + "\n")
}

const COMMON_TEMPLATE: &str = r#"
class {{ ClientValidationError }}({{ BaseModel }}):
    loc: list[str | int]
    msg: str
    type: str


class {{ ClientHTTPValidationError }}({{ BaseModel }}):
    detail: list[{{ ClientValidationError }}] | None = None


class {{ ClientExts }}({{ TypedDict }}, total=False):
    """Per-call transport overrides."""

    timeout: float | None
    headers: {{ Mapping }}[str, str]
    extensions: dict[str, {{ Any }}]


class {{ Unset }}:
    """Marker for arguments the caller did not supply."""

    def __repr__(self) -> str:
        return "UNSET"

    def __bool__(self) -> bool:
        return False


{{ UNSET }}: {{ Any }} = {{ Unset }}()


@{{ dataclass }}(frozen=True, slots=True)
class {{ ClientResult }}[StatusT: int, DataT]:
    """Outcome of one call: status, decoded data, the response model and the raw response."""

    status: StatusT
    data: DataT
    model: {{ Any }}
    response: {{ httpx }}.Response


class {{ ClientNotDefaultStatusError }}(Exception):
    """Raised when a call that requires the default status received another one."""

    def __init__(
        self, default_status: int, result: {{ ClientResult }}[{{ Any }}, {{ Any }}]
    ) -> None:
        super().__init__(f"Expected status {default_status}, got {int(result.status)}")
        self.default_status = default_status
        self.result = result


def {{ to_status }}(code: int) -> int:
    try:
        return {{ HTTPStatus }}(code)
    except ValueError:
        return code


def {{ build_request }}(
    client: {{ httpx }}.Client | {{ httpx }}.AsyncClient,
    *,
    method: str,
    path: str,
    path_params: {{ Mapping }}[str, {{ Any }}] | None,
    query_params: {{ Mapping }}[str, {{ Any }}] | None,
    header_params: {{ Mapping }}[str, {{ Any }}] | None,
    cookie_params: {{ Mapping }}[str, {{ Any }}] | None,
    body: {{ Any }},
    body_fields: {{ Mapping }}[str, {{ Any }}] | None,
    client_exts: {{ ClientExts }} | None,
) -> {{ httpx }}.Request:
    if path_params:
        path = path.format_map(
            {
                key: {{ quote }}(str({{ to_jsonable_python }}(value)), safe="")
                for key, value in path_params.items()
            }
        )
    pairs: list[tuple[str, {{ Any }}]] = []
    for key, value in (query_params or {}).items():
        if value is {{ UNSET }} or value is None:
            continue
        value = {{ to_jsonable_python }}(value)
        if isinstance(value, dict):
            pairs.extend((name, item) for name, item in value.items() if item is not None)
        else:
            pairs.append((key, value))
    params = [
        (key, item)
        for key, value in pairs
        for item in (value if isinstance(value, list) else [value])
    ]
    headers = {
        key: str({{ to_jsonable_python }}(value))
        for key, value in (header_params or {}).items()
        if value is not {{ UNSET }} and value is not None
    }
    cookies = {
        key: str({{ to_jsonable_python }}(value))
        for key, value in (cookie_params or {}).items()
        if value is not {{ UNSET }} and value is not None
    }
    if cookies:
        {{ warnings }}.warn(
            "Setting per-request cookies is deprecated; set cookies on the client instead.",
            DeprecationWarning,
            stacklevel=4,
        )
        headers["cookie"] = "; ".join(f"{key}={value}" for key, value in cookies.items())
    exts = client_exts or {}
    headers.update(exts.get("headers", {}))
    content = None
    if body_fields is not None:
        fields = {key: value for key, value in body_fields.items() if value is not {{ UNSET }}}
        if fields:
            content = {{ to_json }}(fields)
    elif body is not {{ UNSET }}:
        content = {{ to_json }}(body)
    if content is not None:
        headers.setdefault("content-type", "application/json")
    return client.build_request(
        method,
        path,
        params=params,
        headers=headers,
        content=content,
        timeout=exts["timeout"] if "timeout" in exts else {{ httpx }}.USE_CLIENT_DEFAULT,
        extensions=exts.get("extensions"),
    )


def {{ decode }}(response: {{ httpx }}.Response, model: {{ Any }}) -> {{ Any }}:
    if not response.content:
        return None
    if model is {{ Any }}:
        try:
            return response.json()
        except ValueError:
            return response.text
    return {{ TypeAdapter }}(model).validate_json(response.content)


def {{ make_result }}(
    response: {{ httpx }}.Response,
    data: {{ Any }},
    *,
    model: {{ Any }},
    default_status: int,
    raise_if_not_default_status: bool,
) -> {{ ClientResult }}[{{ Any }}, {{ Any }}]:
    result = {{ ClientResult }}(
        status={{ to_status }}(response.status_code), data=data, model=model, response=response
    )
    if raise_if_not_default_status and response.status_code != default_status:
        raise {{ ClientNotDefaultStatusError }}(default_status, result)
    return result
"#;

const BLOCKING_TEMPLATE: &str = r#"
def {{ iter_json_lines }}(response: {{ httpx }}.Response, model: {{ Any }}) -> {{ Iterator }}[{{ Any }}]:
    adapter = {{ TypeAdapter }}(model)
    try:
        for line in response.iter_lines():
            if line.strip():
                yield adapter.validate_json(line)
    finally:
        response.close()


class {{ ClientBase }}:
    """Transport plumbing shared by blocking clients."""

    def __init__(self, client: {{ httpx }}.Client) -> None:
        self._client = client

    @classmethod
    def from_base_url(cls, base_url: str, **kwargs: {{ Any }}) -> {{ Self }}:
        return cls({{ httpx }}.Client(base_url=base_url, **kwargs))

    def close(self) -> None:
        self._client.close()

    def __enter__(self) -> {{ Self }}:
        return self

    def __exit__(self, *exc_info: object) -> None:
        self.close()

    def _request(
        self,
        *,
        method: str,
        path: str,
        responses: {{ Mapping }}[int, {{ Any }}],
        default_status: int,
        path_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        query_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        header_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        cookie_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        body: {{ Any }} = {{ UNSET }},
        body_fields: {{ Mapping }}[str, {{ Any }}] | None = None,
        stream: bool = False,
        client_exts: {{ ClientExts }} | None = None,
        raise_if_not_default_status: bool = {{ raise_default }},
    ) -> {{ Any }}:
        request = {{ build_request }}(
            self._client,
            method=method,
            path=path,
            path_params=path_params,
            query_params=query_params,
            header_params=header_params,
            cookie_params=cookie_params,
            body=body,
            body_fields=body_fields,
            client_exts=client_exts,
        )
        response = self._client.send(request, stream=stream)
        model = responses.get(response.status_code, {{ Any }})
        if stream and response.status_code == default_status:
            data = {{ iter_json_lines }}(response, model)
        else:
            if stream:
                response.read()
                response.close()
            data = {{ decode }}(response, model)
        return {{ make_result }}(
            response,
            data,
            model=model,
            default_status=default_status,
            raise_if_not_default_status=raise_if_not_default_status,
        )
"#;

const ASYNC_TEMPLATE: &str = r#"
async def {{ aiter_json_lines }}(
    response: {{ httpx }}.Response, model: {{ Any }}
) -> {{ AsyncIterator }}[{{ Any }}]:
    adapter = {{ TypeAdapter }}(model)
    try:
        async for line in response.aiter_lines():
            if line.strip():
                yield adapter.validate_json(line)
    finally:
        await response.aclose()


class {{ AsyncClientBase }}:
    """Transport plumbing shared by asynchronous clients."""

    def __init__(self, client: {{ httpx }}.AsyncClient) -> None:
        self._client = client

    @classmethod
    def from_base_url(cls, base_url: str, **kwargs: {{ Any }}) -> {{ Self }}:
        return cls({{ httpx }}.AsyncClient(base_url=base_url, **kwargs))

    async def aclose(self) -> None:
        await self._client.aclose()

    async def __aenter__(self) -> {{ Self }}:
        return self

    async def __aexit__(self, *exc_info: object) -> None:
        await self.aclose()

    async def _request(
        self,
        *,
        method: str,
        path: str,
        responses: {{ Mapping }}[int, {{ Any }}],
        default_status: int,
        path_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        query_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        header_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        cookie_params: {{ Mapping }}[str, {{ Any }}] | None = None,
        body: {{ Any }} = {{ UNSET }},
        body_fields: {{ Mapping }}[str, {{ Any }}] | None = None,
        stream: bool = False,
        client_exts: {{ ClientExts }} | None = None,
        raise_if_not_default_status: bool = {{ raise_default }},
    ) -> {{ Any }}:
        request = {{ build_request }}(
            self._client,
            method=method,
            path=path,
            path_params=path_params,
            query_params=query_params,
            header_params=header_params,
            cookie_params=cookie_params,
            body=body,
            body_fields=body_fields,
            client_exts=client_exts,
        )
        response = await self._client.send(request, stream=stream)
        model = responses.get(response.status_code, {{ Any }})
        if stream and response.status_code == default_status:
            data = {{ aiter_json_lines }}(response, model)
        else:
            if stream:
                await response.aread()
                await response.aclose()
            data = {{ decode }}(response, model)
        return {{ make_result }}(
            response,
            data,
            model=model,
            default_status=default_status,
            raise_if_not_default_status=raise_if_not_default_status,
        )
"#;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_blocking_support() {
        let mut registry = ImportRegistry::new();
        let code = render_support(&mut registry, &[CallingConvention::Blocking], false).unwrap();
        assert!(code.contains("class ClientResult[StatusT: int, DataT]:"));
        assert!(code.contains("class ClientBase:"));
        assert!(!code.contains("class AsyncClientBase:"));
        assert!(code.contains("raise_if_not_default_status: bool = False,"));
        assert!(!code.contains("{{"));
        let modules: Vec<_> = registry.imports(false).into_iter().map(|i| i.module).collect();
        assert!(modules.contains(&"httpx".to_string()));
        assert!(modules.contains(&"pydantic".to_string()));
        assert!(registry.imports(true).is_empty());
    }

    #[test]
    fn test_render_both_conventions() {
        let mut registry = ImportRegistry::new();
        let code = render_support(
            &mut registry,
            &[CallingConvention::Blocking, CallingConvention::Async],
            true,
        )
        .unwrap();
        assert!(code.contains("class ClientBase:"));
        assert!(code.contains("class AsyncClientBase:"));
        assert!(code.contains("async def _aiter_json_lines("));
        assert!(code.contains("raise_if_not_default_status: bool = True,"));
    }

    #[test]
    fn test_request_builder_flattens_query_models_and_warns_on_cookies() {
        let mut registry = ImportRegistry::new();
        let code = render_support(&mut registry, &[CallingConvention::Blocking], false).unwrap();
        assert!(code.contains("        if isinstance(value, dict):\n"));
        assert!(code.contains("pairs.extend((name, item) for name, item in value.items()"));
        assert!(code.contains("    if cookies:\n        warnings.warn(\n"));
        assert!(code.contains("            DeprecationWarning,\n"));
    }

    #[test]
    fn test_reserved_names_rename_support_definitions() {
        let mut registry = ImportRegistry::new();
        registry.add_reserved_ident("ClientResult");
        registry.add_reserved_ident("quote");
        let code = render_support(&mut registry, &[CallingConvention::Async], false).unwrap();
        assert!(code.contains("class ClientResult_2[StatusT: int, DataT]:"));
        assert!(code.contains("quote_2(str("));
        assert!(!code.contains("class ClientResult["));
    }

    #[test]
    fn test_support_refs() {
        let refs = SupportRefs::from_module("shared.support");
        assert_eq!(refs.result, TypeExpr::named("shared.support", "ClientResult"));
        assert_eq!(
            refs.base_for(CallingConvention::Async),
            &TypeExpr::named("shared.support", "AsyncClientBase")
        );
        assert_eq!(SupportRefs::inline().exts, TypeExpr::local("ClientExts"));
    }
}
