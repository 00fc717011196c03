//! Client generation entry point.
//!
//! Drives one run: translate every route, reserve identifiers, emit support
//! definitions, render each route, then build the import block from the
//! registry's final state.

use tracing::{debug, warn};

use crate::codegen::client::{RouteRenderContext, render_route};
use crate::codegen::emit::Emit;
use crate::codegen::py::{PyClass, PyImport, PyItem, PyModule};
use crate::codegen::support::{CallingConvention, SupportRefs, render_support};
use crate::description::{ServiceDescription, flatten_parameters};
use crate::error::{GenerateError, GenerationWarning};
use crate::registry::ImportRegistry;
use crate::route::{CONTROL_PARAMS, RouteTranslator};
use crate::types::{NamedType, TypeExpr};
use crate::utils::{is_identifier, to_upper_camel_case};

/// Default dotted path of the shared support module.
pub const DEFAULT_SUPPORT_MODULE: &str = "typed_client_support";

/// Class name used when the description carries no title.
const FALLBACK_CLASS_NAME: &str = "ApiClient";

const GENERATED_HEADER: &str = "This file was generated by typed-client. Do not edit by hand.";

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Overrides the description title
    pub title: Option<String>,
    /// Blocking or async methods
    pub convention: CallingConvention,
    /// Module paths types are imported relative to
    pub import_barriers: Vec<String>,
    /// Import support definitions from `support_module` instead of inlining them
    pub import_client_base: bool,
    /// Dotted path of the shared support module
    pub support_module: String,
    /// Default of every method's `raise_if_not_default_status`
    pub raise_if_not_default_status: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            title: None,
            convention: CallingConvention::Blocking,
            import_barriers: Vec::new(),
            import_client_base: false,
            support_module: DEFAULT_SUPPORT_MODULE.to_string(),
            raise_if_not_default_status: false,
        }
    }
}

/// Output of a generation run.
#[derive(Debug, Clone)]
pub struct GeneratedClient {
    /// Name of the generated class
    pub class_name: String,
    /// Python module source
    pub source: String,
    /// Non-fatal observations collected while translating routes
    pub warnings: Vec<GenerationWarning>,
}

/// Class name for a title: `birthday app` becomes `BirthdayAppClient`.
pub fn class_name_for(title: Option<&str>) -> Result<String, GenerateError> {
    let Some(title) = title.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(FALLBACK_CLASS_NAME.to_string());
    };
    let mut name = to_upper_camel_case(title);
    if !name.ends_with("Client") {
        name.push_str("Client");
    }
    if !is_identifier(&name) {
        return Err(GenerateError::InvalidTitle {
            title: title.to_string(),
        });
    }
    Ok(name)
}

/// Generate a client module from a JSON service description.
pub fn generate_from_json(
    json: &str,
    options: &GenerateOptions,
) -> Result<GeneratedClient, GenerateError> {
    let description = ServiceDescription::from_json(json)?;
    generate(&description, options)
}

/// Generate a client module.
///
/// Any fatal error aborts the run before rendering starts.
pub fn generate(
    description: &ServiceDescription,
    options: &GenerateOptions,
) -> Result<GeneratedClient, GenerateError> {
    if description.endpoints.is_empty() {
        return Err(GenerateError::NoEndpoints);
    }
    let class_name = class_name_for(options.title.as_deref().or(description.title.as_deref()))?;

    let support = if options.import_client_base {
        SupportRefs::from_module(&options.support_module)
    } else {
        SupportRefs::inline()
    };

    let mut translator = RouteTranslator::new(support.http_validation_error.clone());
    let contracts = description
        .endpoints
        .iter()
        .map(|endpoint| translator.translate(endpoint))
        .collect::<Result<Vec<_>, _>>()?;

    let mut registry = ImportRegistry::new();
    if options.convention == CallingConvention::Async {
        registry.set_stream_container(NamedType::new("collections.abc", "AsyncIterator"));
    }
    registry.add_barrier(options.import_barriers.iter().cloned());
    registry.add_reserved_ident("self");
    registry.add_reserved_ident(class_name.clone());
    for name in CONTROL_PARAMS {
        registry.add_reserved_ident(name);
    }
    for endpoint in &description.endpoints {
        registry.add_reserved_ident(endpoint.name.clone());
        for param in flatten_parameters(endpoint) {
            registry.add_reserved_ident(param.name.clone());
        }
    }

    let mut body = Vec::new();
    if !options.import_client_base {
        let code = render_support(
            &mut registry,
            &[options.convention],
            options.raise_if_not_default_status,
        )?;
        body.push(PyItem::Raw(code));
    }
    registry.get_usage(&support.result, false);
    registry.get_usage(&support.http_validation_error, false);

    let base = registry.get_usage(support.base_for(options.convention), false);
    let ctx = RouteRenderContext {
        support: &support,
        convention: options.convention,
        raise_default: options.raise_if_not_default_status,
    };
    let mut methods = Vec::new();
    for contract in &contracts {
        methods.extend(render_route(contract, &mut registry, ctx));
    }

    let title = options
        .title
        .as_deref()
        .or(description.title.as_deref())
        .unwrap_or("the service");
    body.push(PyItem::Class(PyClass {
        name: class_name.clone(),
        bases: vec![base],
        docstring: Some(format!("Typed client for {title}.")),
        methods,
    }));

    let type_checking = registry.imports(true);
    let type_checking_guard = (!type_checking.is_empty())
        .then(|| registry.get_usage(&TypeExpr::named("typing", "TYPE_CHECKING"), false));
    let runtime: Vec<_> = registry
        .imports(false)
        .into_iter()
        .filter(|import| !type_checking.contains(import))
        .collect();

    let module = PyModule {
        header: vec![GENERATED_HEADER.to_string()],
        imports: PyImport::group(&runtime),
        type_checking_guard,
        type_checking_imports: PyImport::group(&type_checking),
        body,
    };

    let warnings: Vec<_> = contracts
        .into_iter()
        .flat_map(|contract| contract.warnings)
        .collect();
    for warning in &warnings {
        warn!(route = %warning.route, "{warning}");
    }
    debug!(
        class = %class_name,
        routes = description.endpoints.len(),
        warnings = warnings.len(),
        "Generated client."
    );

    Ok(GeneratedClient {
        class_name,
        source: module.emit(),
        warnings,
    })
}

/// Source of the shared support module, with both calling conventions.
pub fn support_module_source(raise_if_not_default_status: bool) -> Result<String, GenerateError> {
    let mut registry = ImportRegistry::new();
    let code = render_support(
        &mut registry,
        &[CallingConvention::Blocking, CallingConvention::Async],
        raise_if_not_default_status,
    )?;
    let module = PyModule {
        header: vec![GENERATED_HEADER.to_string()],
        imports: PyImport::group(&registry.imports(false)),
        type_checking_guard: None,
        type_checking_imports: Vec::new(),
        body: vec![PyItem::Raw(code)],
    };
    Ok(module.emit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn description(value: serde_json::Value) -> ServiceDescription {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_class_name_for() {
        assert_eq!(class_name_for(Some("BirthdayApp")).unwrap(), "BirthdayAppClient");
        assert_eq!(class_name_for(Some("birthday app")).unwrap(), "BirthdayAppClient");
        assert_eq!(class_name_for(Some("PetClient")).unwrap(), "PetClient");
        assert_eq!(class_name_for(None).unwrap(), "ApiClient");
        assert_eq!(class_name_for(Some("  ")).unwrap(), "ApiClient");
        assert!(matches!(
            class_name_for(Some("123")),
            Err(GenerateError::InvalidTitle { .. })
        ));
    }

    #[test]
    fn test_no_endpoints() {
        let desc = description(json!({"title": "Empty", "endpoints": []}));
        assert!(matches!(
            generate(&desc, &GenerateOptions::default()),
            Err(GenerateError::NoEndpoints)
        ));
    }

    #[test]
    fn test_first_error_aborts() {
        let desc = description(json!({"endpoints": [
            {"name": "ok", "path": "/ok", "methods": ["GET"]},
            {"name": "bad", "path": "/bad", "methods": ["GET", "POST"]}
        ]}));
        assert!(matches!(
            generate(&desc, &GenerateOptions::default()),
            Err(GenerateError::MethodCount { count: 2, .. })
        ));
    }

    #[test]
    fn test_inline_support_precedes_class() {
        let desc = description(json!({"title": "Pets", "endpoints": [
            {"name": "list_pets", "path": "/pets", "methods": ["GET"]}
        ]}));
        let out = generate(&desc, &GenerateOptions::default()).unwrap();
        assert_eq!(out.class_name, "PetsClient");
        let support = out.source.find("class ClientResult").unwrap();
        let class = out.source.find("class PetsClient(ClientBase):").unwrap();
        assert!(support < class);
        assert!(out.source.starts_with("# This file was generated by typed-client."));
        assert!(!out.source.contains("AsyncClientBase"));
    }

    #[test]
    fn test_type_checking_block() {
        let desc = description(json!({"endpoints": [
            {"name": "create", "path": "/items", "methods": ["POST"],
             "parameters": [{"name": "item", "in": "body",
                             "type": {"kind": "named", "module": "app.models", "name": "Item"}}]}
        ]}));
        let out = generate(&desc, &GenerateOptions::default()).unwrap();
        assert!(out.source.contains("if TYPE_CHECKING:\n    from app.models import Item\n"));
        assert!(out.source.contains("        item: \"Item\",\n"));
    }

    #[test]
    fn test_warnings_are_collected() {
        let desc = description(json!({"endpoints": [
            {"name": "me", "path": "/me", "methods": ["GET"],
             "parameters": [{"name": "session", "in": "cookie", "type": {"kind": "builtin", "name": "str"}}]}
        ]}));
        let out = generate(&desc, &GenerateOptions::default()).unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert_eq!(out.warnings[0].route, "me");
    }

    #[test]
    fn test_support_module_source() {
        let source = support_module_source(false).unwrap();
        assert!(source.contains("class ClientBase:"));
        assert!(source.contains("class AsyncClientBase:"));
        assert_eq!(source.matches("class ClientResult").count(), 1);
    }
}
