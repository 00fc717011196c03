//! Python source generation.
//!
//! - `py`: the Python AST the generator builds
//! - `emit`: rendering of that AST to source text
//! - `support`: shared runtime definitions (result wrapper, base classes)
//! - `client`: per-route method rendering

pub mod client;
pub mod emit;
pub mod py;
pub mod support;

pub use client::{RouteRenderContext, render_route, status_literal};
pub use emit::Emit;
pub use py::{PyClass, PyFunction, PyImport, PyItem, PyModule};
pub use support::{CallingConvention, SupportRefs, render_support};
