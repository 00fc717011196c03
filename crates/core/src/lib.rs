#![forbid(unsafe_code)]
#![deny(warnings, unused_must_use, dead_code, missing_debug_implementations)]
#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Typed HTTP client generation.
//!
//! A JSON service description goes through four stages:
//!
//! 1. [`description`]: the endpoints as the service framework reports them
//! 2. [`route`]: one [`RouteContract`] per endpoint (parameters, bindings,
//!    response variants, default status)
//! 3. [`generator`] + [`codegen`]: a Python module with one typed method per
//!    route, every external name resolved through the [`ImportRegistry`]
//! 4. [`runtime`]: the same contracts called from Rust with reqwest

pub mod codegen;
pub mod description;
pub mod error;
pub mod generator;
pub mod registry;
pub mod route;
pub mod runtime;
pub mod types;
pub mod utils;

pub use codegen::CallingConvention;
pub use description::{EndpointDescription, ParamDescription, ServiceDescription};
pub use error::{CallError, GenerateError, GenerationWarning, WarningKind};
pub use generator::{
    DEFAULT_SUPPORT_MODULE, GenerateOptions, GeneratedClient, generate, generate_from_json,
    support_module_source,
};
pub use registry::{ImportRef, ImportRegistry};
pub use route::{Binding, RouteContract, RouteTranslator};
pub use runtime::{ApiResult, AsyncRouteCaller, CallOptions, RawResponse, RouteCaller, StreamData};
pub use types::{Builtin, LiteralValue, NamedType, TypeExpr};
