//! Error type shared by the diagram renderer and the static content loader.

use thiserror::Error;

/// Errors surfaced by diagram mounting and definition loading.
#[derive(Error, Debug)]
pub enum DiagramError {
	/// The mount target does not exist on the page.
	#[error("diagram container `{0}` not found")]
	ContainerNotFound(String),

	/// The platform could not provide a drawing surface for the container.
	#[error("could not create drawing surface: {0}")]
	Surface(String),

	/// A link names a node id that is not part of the diagram (strict mode only).
	#[error("link {from} -> {to} references a missing node")]
	DanglingLink {
		/// Link source id as authored.
		from: String,
		/// Link target id as authored.
		to: String,
	},

	/// A static diagram definition is not valid JSON for the expected shape.
	#[error("invalid diagram definition: {0}")]
	Definition(#[from] serde_json::Error),
}
