//! Renderer options and the styling carried by static definitions.

use std::fmt;
use std::rc::Rc;

use log::warn;
use serde::{Deserialize, Serialize};

use super::types::{DiagramLink, DiagramNode, LinkType};

/// Default group palette (dark gray root, then blue, orange, purple, green).
pub const GROUP_PALETTE: &[&str] = &["#4a4a4a", "#1a75ff", "#ff9933", "#b366ff", "#66cc66"];

/// Color for groups outside the palette.
pub const FALLBACK_COLOR: &str = "#999999";

/// Extra radius added to every node for collision avoidance.
pub const DEFAULT_COLLISION_PADDING: f64 = 10.0;

/// Zoom limits applied when none are configured.
pub const DEFAULT_ZOOM_RANGE: (f64, f64) = (0.2, 3.0);

/// Rest length per unit of link value.
pub const LINK_DISTANCE_PER_VALUE: f64 = 80.0;

/// Stroke color for a relationship type.
pub fn default_link_color(kind: LinkType) -> &'static str {
	match kind {
		LinkType::Hierarchy => "#1f77b4",
		LinkType::DataFlow => "#ff7f0e",
		LinkType::Functional => "#9467bd",
		LinkType::Theoretical => "#2ca02c",
		LinkType::Interaction => "#d62728",
		LinkType::Association => "#17becf",
		LinkType::Conceptual => "#8c564b",
		LinkType::Main => "#bbbbbb",
		LinkType::Sub => "#3a86ff",
		LinkType::Cross => "#ff5ca7",
		LinkType::Unknown => FALLBACK_COLOR,
	}
}

/// Charge tiered by level: the root repels most.
pub fn default_charge(node: &DiagramNode) -> f64 {
	match node.level {
		Some(1) => -800.0,
		Some(2) => -400.0,
		_ => -200.0,
	}
}

/// How nodes are drawn and hit-tested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
	/// Filled circle of the node's radius with the label centered on it.
	#[default]
	Circle,
	/// Label inside a padded rounded rectangle.
	Card,
}

/// Styling and force settings that can be authored alongside diagram data.
/// Unset force fields keep the [`DiagramConfig`] defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramStyle {
	/// How nodes are drawn.
	pub shape: NodeShape,
	/// Node color per group, indexed by group number.
	pub palette: Vec<String>,
	/// Color for groups past the end of the palette.
	pub fallback_color: String,
	/// Rest length for every link, instead of one scaled by link value.
	pub link_distance: Option<f64>,
	/// Charge for every node, instead of one tiered by level.
	pub charge: Option<f64>,
	/// Extra collision radius around each node.
	pub collision_padding: Option<f64>,
	/// Stroke for every link, instead of one per relationship type.
	pub link_color: Option<String>,
	/// Draw the relationship type legend.
	pub legend: bool,
}

impl Default for DiagramStyle {
	fn default() -> Self {
		Self {
			shape: NodeShape::Circle,
			palette: GROUP_PALETTE.iter().map(|c| c.to_string()).collect(),
			fallback_color: FALLBACK_COLOR.into(),
			link_distance: None,
			charge: None,
			collision_padding: None,
			link_color: None,
			legend: false,
		}
	}
}

type LinkFn = Rc<dyn Fn(&DiagramLink) -> f64>;
type NodeFn = Rc<dyn Fn(&DiagramNode) -> f64>;
type ClickFn = Rc<dyn Fn(&DiagramNode)>;
type GroupColorFn = Rc<dyn Fn(u32) -> String>;
type LinkColorFn = Rc<dyn Fn(LinkType) -> String>;

/// Options recognized by [`DiagramRenderer::mount`](super::DiagramRenderer::mount).
#[derive(Clone)]
pub struct DiagramConfig {
	/// Rest length of a link.
	pub link_distance: LinkFn,
	/// Many-body strength of a node; negative repels.
	pub charge_strength: NodeFn,
	/// Added to each node's radius for collision avoidance.
	pub collision_padding: f64,
	/// Minimum and maximum zoom factor.
	pub zoom_scale_range: (f64, f64),
	/// Called with the clicked node, before any popup opens.
	pub on_node_click: Option<ClickFn>,
	/// Fill color for a node group.
	pub color_for_group: GroupColorFn,
	/// Stroke and arrow color for a relationship type.
	pub color_for_link_type: LinkColorFn,
	/// How nodes are drawn and hit-tested.
	pub node_shape: NodeShape,
	/// Fail the mount on a link whose endpoint is missing instead of dropping it.
	pub strict_links: bool,
	/// Draw a legend of the relationship types present in the diagram.
	pub show_legend: bool,
}

impl Default for DiagramConfig {
	fn default() -> Self {
		Self::from_style(&DiagramStyle::default())
	}
}

impl fmt::Debug for DiagramConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DiagramConfig")
			.field("collision_padding", &self.collision_padding)
			.field("zoom_scale_range", &self.zoom_scale_range)
			.field("on_node_click", &self.on_node_click.is_some())
			.field("node_shape", &self.node_shape)
			.field("strict_links", &self.strict_links)
			.field("show_legend", &self.show_legend)
			.finish_non_exhaustive()
	}
}

impl DiagramConfig {
	/// Defaults with the style's palette, shape and force overrides applied.
	pub fn from_style(style: &DiagramStyle) -> Self {
		let (palette, fallback) = (style.palette.clone(), style.fallback_color.clone());
		let link_distance: LinkFn = match style.link_distance {
			Some(distance) => Rc::new(move |_: &DiagramLink| distance),
			None => Rc::new(|link: &DiagramLink| LINK_DISTANCE_PER_VALUE * link.value),
		};
		let charge_strength: NodeFn = match style.charge {
			Some(charge) => Rc::new(move |_: &DiagramNode| charge),
			None => Rc::new(default_charge),
		};
		let color_for_link_type: LinkColorFn = match style.link_color.clone() {
			Some(color) => Rc::new(move |_: LinkType| color.clone()),
			None => Rc::new(|kind: LinkType| default_link_color(kind).to_string()),
		};
		Self {
			link_distance,
			charge_strength,
			collision_padding: style.collision_padding.unwrap_or(DEFAULT_COLLISION_PADDING),
			zoom_scale_range: DEFAULT_ZOOM_RANGE,
			on_node_click: None,
			color_for_group: Rc::new(move |group| match palette.get(group as usize) {
				Some(color) => color.clone(),
				None => {
					warn!("group {group} has no palette color, using {fallback}");
					fallback.clone()
				}
			}),
			color_for_link_type,
			node_shape: style.shape,
			strict_links: false,
			show_legend: style.legend,
		}
	}

	/// Replaces the rest length function.
	pub fn with_link_distance(mut self, f: impl Fn(&DiagramLink) -> f64 + 'static) -> Self {
		self.link_distance = Rc::new(f);
		self
	}

	/// Replaces the per-node charge.
	pub fn with_charge_strength(mut self, f: impl Fn(&DiagramNode) -> f64 + 'static) -> Self {
		self.charge_strength = Rc::new(f);
		self
	}

	/// Sets `collision_padding`.
	pub fn with_collision_padding(mut self, padding: f64) -> Self {
		self.collision_padding = padding;
		self
	}

	/// Sets the zoom limits; the order of `min` and `max` does not matter.
	pub fn with_zoom_scale_range(mut self, min: f64, max: f64) -> Self {
		self.zoom_scale_range = (min.min(max), min.max(max));
		self
	}

	/// Sets `on_node_click`.
	pub fn with_on_node_click(mut self, f: impl Fn(&DiagramNode) + 'static) -> Self {
		self.on_node_click = Some(Rc::new(f));
		self
	}

	/// Sets `color_for_group`.
	pub fn with_color_for_group(mut self, f: impl Fn(u32) -> String + 'static) -> Self {
		self.color_for_group = Rc::new(f);
		self
	}

	/// Sets `color_for_link_type`.
	pub fn with_color_for_link_type(mut self, f: impl Fn(LinkType) -> String + 'static) -> Self {
		self.color_for_link_type = Rc::new(f);
		self
	}

	/// Sets `node_shape`.
	pub fn with_node_shape(mut self, shape: NodeShape) -> Self {
		self.node_shape = shape;
		self
	}

	/// Makes a link to a missing node fail the mount.
	pub fn with_strict_links(mut self, strict: bool) -> Self {
		self.strict_links = strict;
		self
	}

	/// Sets `show_legend`.
	pub fn with_legend(mut self, show: bool) -> Self {
		self.show_legend = show;
		self
	}

	/// Zoom limits with a reversed range normalized.
	pub fn zoom_limits(&self) -> (f64, f64) {
		let (a, b) = self.zoom_scale_range;
		(a.min(b), a.max(b))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn out_of_range_group_uses_fallback() {
		let config = DiagramConfig::default();
		assert_eq!((config.color_for_group)(1), "#1a75ff");
		assert_eq!((config.color_for_group)(42), FALLBACK_COLOR);
	}

	#[test]
	fn defaults_scale_distance_and_charge() {
		let config = DiagramConfig::default();
		let link = DiagramLink::new("a", "b", LinkType::DataFlow).with_value(1.5);
		assert_eq!((config.link_distance)(&link), 120.0);

		let root = DiagramNode::new("root", 0).with_level(1);
		let leaf = DiagramNode::new("leaf", 1).with_level(3);
		assert!((config.charge_strength)(&root) < (config.charge_strength)(&leaf));
		assert_eq!(config.zoom_limits(), (0.2, 3.0));
	}

	#[test]
	fn reversed_zoom_range_is_normalized() {
		let mut config = DiagramConfig::default();
		config.zoom_scale_range = (4.0, 0.5);
		assert_eq!(config.zoom_limits(), (0.5, 4.0));
		assert_eq!(config.with_zoom_scale_range(2.0, 1.0).zoom_scale_range, (1.0, 2.0));
	}

	#[test]
	fn style_overrides_replace_force_defaults() {
		let style = DiagramStyle {
			link_distance: Some(100.0),
			charge: Some(-250.0),
			collision_padding: Some(4.0),
			link_color: Some("#aaaaaa".into()),
			legend: true,
			..DiagramStyle::default()
		};
		let config = DiagramConfig::from_style(&style);

		let heavy = DiagramLink::new("a", "b", LinkType::Hierarchy).with_value(2.0);
		assert_eq!((config.link_distance)(&heavy), 100.0);
		for level in [1, 2, 3] {
			let node = DiagramNode::new("n", 0).with_level(level);
			assert_eq!((config.charge_strength)(&node), -250.0);
		}
		assert_eq!(config.collision_padding, 4.0);
		for kind in LinkType::ALL {
			assert_eq!((config.color_for_link_type)(kind), "#aaaaaa");
		}
		assert!(config.show_legend);
	}

	#[test]
	fn unset_style_fields_keep_defaults() {
		let style: DiagramStyle = serde_json::from_str(r#"{"shape":"card"}"#).unwrap();
		let config = DiagramConfig::from_style(&style);
		assert_eq!(config.node_shape, NodeShape::Card);
		assert_eq!(config.collision_padding, DEFAULT_COLLISION_PADDING);
		assert_eq!((config.color_for_link_type)(LinkType::Cross), "#ff5ca7");
		assert!(!config.show_legend);
	}
}
