//! Static diagram definitions bundled with the app.

use crate::components::force_graph::DiagramDefinition;
use crate::error::DiagramError;

const ONTOLOGY: &str = include_str!("../assets/diagrams/ontology.json");
const COMPONENTS: &str = include_str!("../assets/diagrams/components.json");
const VISUAL_STYLE: &str = include_str!("../assets/diagrams/visual_style.json");

/// The diagrams shown on the home page, one per tab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagramKind {
	/// Platform concepts and their relationships.
	Ontology,
	/// Main, sub and cross component links.
	Components,
	/// Visual language cards.
	VisualStyle,
}

impl DiagramKind {
	/// Tab order.
	pub const ALL: [DiagramKind; 3] = [
		DiagramKind::Ontology,
		DiagramKind::Components,
		DiagramKind::VisualStyle,
	];

	/// Tab caption.
	pub fn caption(self) -> &'static str {
		match self {
			DiagramKind::Ontology => "Platform Ontology",
			DiagramKind::Components => "Component Ontology",
			DiagramKind::VisualStyle => "Visual Language & Style",
		}
	}

	fn source(self) -> &'static str {
		match self {
			DiagramKind::Ontology => ONTOLOGY,
			DiagramKind::Components => COMPONENTS,
			DiagramKind::VisualStyle => VISUAL_STYLE,
		}
	}
}

/// Parses the embedded definition for `kind`.
pub fn load(kind: DiagramKind) -> Result<DiagramDefinition, DiagramError> {
	Ok(serde_json::from_str(kind.source())?)
}
