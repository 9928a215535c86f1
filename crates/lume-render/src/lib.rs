//! Rendering layer for lume: compiler, components, and the app runtime.
//!
//! The [`Compiler`] turns parsed templates into live node trees wired
//! with fine-grained effects; the [`ComponentRegistry`] resolves custom
//! tags to [`ComponentDef`]s; an [`App`] owns the mount lifecycle of one
//! template over one host element.

mod app;
mod compiler;
mod component;
mod error;

pub use app::{App, AppOptions, AppState, MethodFn};
pub use compiler::Compiler;
pub use component::{ComponentDef, ComponentRegistry, Emitter, Props, SetupContext, SetupFn};
pub use error::RenderError;
