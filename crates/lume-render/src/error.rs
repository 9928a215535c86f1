use thiserror::Error;

use lume_template::TemplateError;

/// Errors raised while registering components, constructing an app, or
/// compiling a template into the document.
#[derive(Debug, Error)]
pub enum RenderError {
	#[error(transparent)]
	Template(#[from] TemplateError),

	#[error("structural directive (v-if/v-for) is not allowed on a root element")]
	RootStructuralDirective,

	#[error("mount target `{0}` not found")]
	MountTargetNotFound(String),

	#[error("unknown component <{0}>")]
	UnknownComponent(String),

	#[error("component `{0}` is already registered")]
	DuplicateComponent(String),
}
