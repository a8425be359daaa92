use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::config::DiagramStyle;

/// Radius used for nodes that do not specify one.
pub const DEFAULT_NODE_RADIUS: f64 = 18.0;

/// A node as authored in a static diagram definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramNode {
	/// Unique key within one diagram.
	pub id: String,
	/// Color/style bucket.
	#[serde(default)]
	pub group: u32,
	/// Display text; the id is shown when absent.
	#[serde(default)]
	pub label: Option<String>,
	/// Display size; [`DEFAULT_NODE_RADIUS`] when absent.
	#[serde(default)]
	pub radius: Option<f64>,
	/// Initial position hint, as an offset from the viewport center.
	#[serde(default)]
	pub position: Option<(f64, f64)>,
	/// Font and charge tier; 1 is the root.
	#[serde(default)]
	pub level: Option<u32>,
}

impl DiagramNode {
	/// A node with only an id and a group.
	pub fn new(id: impl Into<String>, group: u32) -> Self {
		Self {
			id: id.into(),
			group,
			label: None,
			radius: None,
			position: None,
			level: None,
		}
	}

	/// Sets the level tier.
	pub fn with_level(mut self, level: u32) -> Self {
		self.level = Some(level);
		self
	}

	/// Sets the display radius.
	pub fn with_radius(mut self, radius: f64) -> Self {
		self.radius = Some(radius);
		self
	}

	/// Text drawn on the node.
	pub fn label(&self) -> &str {
		self.label.as_deref().unwrap_or(&self.id)
	}

	/// Display radius, or [`DEFAULT_NODE_RADIUS`].
	pub fn radius(&self) -> f64 {
		self.radius.unwrap_or(DEFAULT_NODE_RADIUS)
	}
}

/// Relationship category of a link; picks its color and arrow tint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
	/// Contains or is part of.
	#[default]
	Hierarchy,
	/// Data moves from source to target.
	DataFlow,
	/// Functional dependency.
	Functional,
	/// Theoretical grounding.
	Theoretical,
	/// Interactive relationship.
	Interaction,
	/// Semantic or structural association.
	Association,
	/// Conceptual relationship between ideas.
	Conceptual,
	/// Root-to-branch link in the component ontology.
	Main,
	/// Branch-to-leaf link in the component ontology.
	Sub,
	/// Link across branches.
	Cross,
	/// Any type name not listed above.
	#[serde(other)]
	Unknown,
}

impl LinkType {
	/// All known types, in legend order.
	pub const ALL: [LinkType; 10] = [
		LinkType::Hierarchy,
		LinkType::DataFlow,
		LinkType::Functional,
		LinkType::Theoretical,
		LinkType::Interaction,
		LinkType::Association,
		LinkType::Conceptual,
		LinkType::Main,
		LinkType::Sub,
		LinkType::Cross,
	];

	/// Short name shown in the legend.
	pub fn label(self) -> &'static str {
		match self {
			LinkType::Hierarchy => "Hierarchy",
			LinkType::DataFlow => "Data Flow",
			LinkType::Functional => "Functional",
			LinkType::Theoretical => "Theoretical",
			LinkType::Interaction => "Interaction",
			LinkType::Association => "Association",
			LinkType::Conceptual => "Conceptual",
			LinkType::Main => "Main",
			LinkType::Sub => "Sub",
			LinkType::Cross => "Cross",
			LinkType::Unknown => "Other",
		}
	}

	/// Text shown in the link tooltip.
	pub fn description(self) -> &'static str {
		match self {
			LinkType::Hierarchy => "Hierarchical relationship (contains/is part of)",
			LinkType::DataFlow => "Data flows from source to target",
			LinkType::Functional => "Functional dependency between components",
			LinkType::Theoretical => "Theoretical guidance and support",
			LinkType::Interaction => "Interactive relationship between components",
			LinkType::Association => "Semantic or structural association",
			LinkType::Conceptual => "Conceptual relationship between ideas",
			LinkType::Main => "Main branch of the platform",
			LinkType::Sub => "Sub-component of a branch",
			LinkType::Cross => "Cross-link between branches",
			LinkType::Unknown => "Unknown relationship type",
		}
	}
}

fn default_link_value() -> f64 {
	1.0
}

/// A directed link between two node ids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagramLink {
	/// Id of the node the link starts at.
	pub source: String,
	/// Id of the node the arrow points to.
	pub target: String,
	/// Relationship type, authored as `type`.
	#[serde(rename = "type", default)]
	pub kind: LinkType,
	/// Positive weight scaling stroke width and rest length.
	#[serde(default = "default_link_value")]
	pub value: f64,
}

impl DiagramLink {
	/// A link of weight 1.
	pub fn new(source: impl Into<String>, target: impl Into<String>, kind: LinkType) -> Self {
		Self {
			source: source.into(),
			target: target.into(),
			kind,
			value: 1.0,
		}
	}

	/// Sets the link weight.
	pub fn with_value(mut self, value: f64) -> Self {
		self.value = value;
		self
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// Nodes and the links between them.
pub struct GraphData {
	/// Nodes in draw order.
	pub nodes: Vec<DiagramNode>,
	/// Links by node id; unresolved ones are dropped at mount.
	pub links: Vec<DiagramLink>,
}

/// Popup content for one node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDescription {
	/// Badge text, e.g. "Module".
	pub category: String,
	/// Popup heading.
	pub title: String,
	/// Popup body.
	pub description: String,
}

/// Popup content keyed by node id or label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DescriptionCatalog(HashMap<String, NodeDescription>);

impl DescriptionCatalog {
	/// Adds or replaces the entry for a node id or label.
	pub fn insert(&mut self, key: impl Into<String>, entry: NodeDescription) {
		self.0.insert(key.into(), entry);
	}

	/// Looks up by id first, then by label.
	pub fn lookup(&self, node: &DiagramNode) -> Option<&NodeDescription> {
		self.0.get(&node.id).or_else(|| self.0.get(node.label()))
	}

	/// Number of entries.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether the catalog has no entries.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

/// Everything needed to mount one static diagram.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDefinition {
	/// Human-readable name.
	pub title: String,
	/// Shape, palette and force overrides.
	#[serde(default)]
	pub style: DiagramStyle,
	/// Nodes and links, flattened into the top level of the JSON.
	#[serde(flatten)]
	pub data: GraphData,
	/// Popup content, keyed by node id or label.
	#[serde(default)]
	pub descriptions: DescriptionCatalog,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn label_and_radius_fall_back_to_defaults() {
		let node = DiagramNode::new("ECI", 3);
		assert_eq!(node.label(), "ECI");
		assert_eq!(node.radius(), DEFAULT_NODE_RADIUS);
	}

	#[test]
	fn catalog_lookup_prefers_id_then_label() {
		let entry = |title: &str| NodeDescription {
			category: "Component".into(),
			title: title.into(),
			description: String::new(),
		};
		let mut catalog = DescriptionCatalog::default();
		catalog.insert("Trade", entry("by label"));

		let mut node = DiagramNode::new("BilateralTrade", 1);
		node.label = Some("Trade".into());
		assert_eq!(catalog.lookup(&node).map(|e| e.title.as_str()), Some("by label"));

		catalog.insert("BilateralTrade", entry("by id"));
		assert_eq!(catalog.lookup(&node).map(|e| e.title.as_str()), Some("by id"));
		assert!(catalog.lookup(&DiagramNode::new("Other", 0)).is_none());
	}

	#[test]
	fn links_deserialize_with_defaults() {
		let link: DiagramLink =
			serde_json::from_str(r#"{"source":"A","target":"B","type":"dataflow"}"#).unwrap();
		assert_eq!(link.kind, LinkType::DataFlow);
		assert_eq!(link.value, 1.0);

		let odd: DiagramLink =
			serde_json::from_str(r#"{"source":"A","target":"B","type":"mystery"}"#).unwrap();
		assert_eq!(odd.kind, LinkType::Unknown);
		assert_eq!(odd.kind.description(), "Unknown relationship type");
	}
}
