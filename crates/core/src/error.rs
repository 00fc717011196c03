//! Generation and call errors, and non-fatal generation warnings.

use std::fmt;

use thiserror::Error;

use crate::runtime::ApiResult;

/// Fatal problems found while translating or rendering a service description.
///
/// Any of these aborts the whole run; nothing is written.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The description could not be parsed.
    #[error("Failed to parse service description: {0}")]
    Description(#[from] serde_json::Error),

    /// The description has no endpoints at all.
    #[error("Service description has no endpoints")]
    NoEndpoints,

    /// A route declares zero or several HTTP methods.
    #[error("Route '{route}' must declare exactly one HTTP method, found {count}")]
    MethodCount {
        /// Route name
        route: String,
        /// Number of declared methods
        count: usize,
    },

    /// A route uses a method outside the supported set.
    #[error("Route '{route}' uses unsupported HTTP method '{method}'")]
    UnsupportedMethod {
        /// Route name
        route: String,
        /// Offending method
        method: String,
    },

    /// A route has an empty path template.
    #[error("Route '{route}' has an empty path")]
    EmptyPath {
        /// Route name
        route: String,
    },

    /// The route name cannot be used as a method name.
    #[error("Route name '{name}' is not a valid identifier")]
    InvalidRouteName {
        /// Offending name
        name: String,
    },

    /// The route name collides with a member of the client base class.
    #[error("Route name '{name}' is reserved by the client base class")]
    ReservedRouteName {
        /// Offending name
        name: String,
    },

    /// Two routes share a name.
    #[error("Duplicate route name '{name}'")]
    DuplicateRouteName {
        /// Offending name
        name: String,
    },

    /// A parameter name cannot be used as a Python parameter.
    #[error("Parameter '{name}' of route '{route}' is not a valid identifier")]
    InvalidParameterName {
        /// Route name
        route: String,
        /// Offending name
        name: String,
    },

    /// A parameter uses a name reserved for call-time controls.
    #[error("Parameter '{name}' of route '{route}' collides with a reserved call option")]
    ReservedParameterName {
        /// Route name
        route: String,
        /// Offending name
        name: String,
    },

    /// Two parameters share a name after merging dependencies and bindings.
    #[error("Route '{route}' has duplicate parameter '{name}'")]
    DuplicateParameter {
        /// Route name
        route: String,
        /// Offending name
        name: String,
    },

    /// The client class name is not a valid identifier.
    #[error("Client title '{title}' is not a valid identifier")]
    InvalidTitle {
        /// Offending title
        title: String,
    },

    /// Rendering the support template failed.
    #[error("Failed to render support code: {0}")]
    Template(String),
}

/// A non-fatal observation made while translating a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationWarning {
    /// Route the warning belongs to
    pub route: String,
    /// What was observed
    pub kind: WarningKind,
}

/// Kinds of non-fatal observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// Cookie parameters are set per request, which the transport discourages.
    CookieParameter {
        /// Parameter name
        name: String,
    },
    /// Validation metadata that has no place in the annotation was dropped.
    UnsupportedConstraints {
        /// Parameter name
        name: String,
    },
    /// A default that cannot be written as a literal; the parameter uses `UNSET`.
    NonScalarDefault {
        /// Parameter name
        name: String,
    },
    /// A path placeholder with no matching path parameter.
    UnknownPlaceholder {
        /// Placeholder name
        placeholder: String,
    },
}

impl fmt::Display for GenerationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.route)?;
        match &self.kind {
            WarningKind::CookieParameter { name } => write!(
                f,
                "cookie parameter '{name}' is sent per request; prefer cookies on the client"
            ),
            WarningKind::UnsupportedConstraints { name } => write!(
                f,
                "constraints on parameter '{name}' are not expressible and were dropped"
            ),
            WarningKind::NonScalarDefault { name } => write!(
                f,
                "default of parameter '{name}' is not a literal; the server default applies"
            ),
            WarningKind::UnknownPlaceholder { placeholder } => write!(
                f,
                "path placeholder '{{{placeholder}}}' has no matching path parameter"
            ),
        }
    }
}

/// Errors raised while calling a route through the Rust runtime.
#[derive(Debug, Error)]
pub enum CallError {
    /// The call asked for the default status and received another one.
    #[error("Expected status {default_status}, got {}", result.status)]
    NotDefaultStatus {
        /// Status the route normally returns
        default_status: u16,
        /// The full result, for inspection
        result: Box<ApiResult>,
    },

    /// A required argument was not supplied and has no default.
    #[error("Route '{route}' is missing required argument '{name}'")]
    MissingArgument {
        /// Route name
        route: String,
        /// Parameter name
        name: String,
    },

    /// An argument cannot be carried by its binding.
    #[error("Argument '{name}' cannot be sent: {reason}")]
    InvalidArgument {
        /// Parameter name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// The base URL or the resolved path is not a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be sent or the response not read.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A streamed line or request body could not be (de)serialized.
    #[error("Failed to decode JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a streamed body failed.
    #[error("Failed to read response stream: {0}")]
    Io(#[from] std::io::Error),
}
