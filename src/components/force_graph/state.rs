use std::collections::{HashMap, HashSet};

use log::warn;

use super::config::{DiagramConfig, NodeShape};
use super::simulation::{DRAG_ALPHA_TARGET, ForceInputs, SimLink, SimNode, Simulation};
use super::types::{DiagramNode, GraphData, LinkType};
use crate::error::DiagramError;

/// Screen-space distance a press may travel and still count as a click.
pub const CLICK_SLOP: f64 = 3.0;
/// World-space tolerance for hovering a link.
pub const LINK_HIT_TOLERANCE: f64 = 6.0;
/// Scale applied to the hovered node.
pub const HOVER_SCALE: f64 = 0.15;
/// Energy restored after a resize.
pub const RESIZE_REHEAT: f64 = 0.3;

const CARD_CHAR_WIDTH: f64 = 0.6;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	pub const IDENTITY: ViewTransform = ViewTransform {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	/// Set once the pointer leaves the click slop; the following click is swallowed.
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	pub link: Option<usize>,
	delay_t: f64,
}

/// Layout metrics for one node, derived from its shape and level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeMetrics {
	pub radius: f64,
	pub font_px: f64,
	/// Half extents of the card; equal to the radius for circles.
	pub half_w: f64,
	pub half_h: f64,
	pub corner: f64,
}

impl NodeMetrics {
	pub fn for_node(node: &DiagramNode, shape: NodeShape) -> Self {
		let radius = node.radius();
		match shape {
			NodeShape::Circle => Self {
				radius,
				font_px: match node.level {
					Some(1) => 12.0,
					Some(2) => 10.0,
					_ => 8.0,
				},
				half_w: radius,
				half_h: radius,
				corner: radius,
			},
			NodeShape::Card => {
				let root = node.level == Some(1);
				let font_px = if root { 20.0 } else { 13.0 };
				let (pad_x, pad_y) = if root { (32.0, 18.0) } else { (14.0, 8.0) };
				let text_w = node.label().chars().count() as f64 * font_px * CARD_CHAR_WIDTH;
				let half_w = text_w / 2.0 + pad_x;
				let half_h = (font_px + pad_y) / 2.0;
				Self {
					radius: half_w.max(half_h),
					font_px,
					half_w,
					half_h,
					corner: if root { 20.0 } else { 12.0 },
				}
			}
		}
	}
}

/// Live state of one mounted diagram.
pub struct ForceGraphState {
	pub simulation: Simulation,
	pub config: DiagramConfig,
	pub metrics: Vec<NodeMetrics>,
	pub node_colors: Vec<String>,
	pub link_colors: Vec<String>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	/// Links dropped because an endpoint did not resolve.
	pub dropped_links: usize,
	/// Relationship types to list in the legend, with their colors.
	pub legend: Vec<(LinkType, String)>,
}

impl ForceGraphState {
	pub fn new(
		data: &GraphData,
		config: DiagramConfig,
		width: f64,
		height: f64,
	) -> Result<Self, DiagramError> {
		let mut id_to_idx = HashMap::new();
		let mut nodes = Vec::with_capacity(data.nodes.len());
		for node in &data.nodes {
			if id_to_idx.contains_key(&node.id) {
				warn!("duplicate node id `{}` ignored", node.id);
				continue;
			}
			id_to_idx.insert(node.id.clone(), nodes.len());
			nodes.push(node.clone());
		}

		let mut links = Vec::with_capacity(data.links.len());
		let mut distances = Vec::with_capacity(data.links.len());
		let mut link_colors = Vec::with_capacity(data.links.len());
		let mut dropped_links = 0;
		for link in &data.links {
			match (id_to_idx.get(&link.source), id_to_idx.get(&link.target)) {
				(Some(&src), Some(&tgt)) => {
					links.push((src, tgt, link.kind, link.value));
					distances.push((config.link_distance)(link));
					link_colors.push((config.color_for_link_type)(link.kind));
				}
				_ if config.strict_links => {
					return Err(DiagramError::DanglingLink {
						from: link.source.clone(),
						to: link.target.clone(),
					});
				}
				_ => {
					warn!(
						"dropping link {} -> {}: endpoint not found",
						link.source, link.target
					);
					dropped_links += 1;
				}
			}
		}

		let legend = if config.show_legend {
			LinkType::ALL
				.into_iter()
				.filter(|kind| links.iter().any(|&(_, _, k, _)| k == *kind))
				.map(|kind| (kind, (config.color_for_link_type)(kind)))
				.collect()
		} else {
			Vec::new()
		};

		let metrics: Vec<NodeMetrics> = nodes
			.iter()
			.map(|n| NodeMetrics::for_node(n, config.node_shape))
			.collect();
		let node_colors = nodes.iter().map(|n| (config.color_for_group)(n.group)).collect();
		let inputs = ForceInputs {
			charges: nodes.iter().map(|n| (config.charge_strength)(n)).collect(),
			collide_radii: metrics
				.iter()
				.map(|m| m.radius + config.collision_padding)
				.collect(),
			link_distances: distances,
		};
		let simulation = Simulation::new(nodes, links, inputs, (width / 2.0, height / 2.0));

		Ok(Self {
			simulation,
			config,
			metrics,
			node_colors,
			link_colors,
			transform: ViewTransform::IDENTITY,
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			dropped_links,
			legend,
		})
	}

	pub fn nodes(&self) -> &[SimNode] {
		self.simulation.nodes()
	}

	pub fn links(&self) -> &[SimLink] {
		self.simulation.links()
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		(
			gx * self.transform.k + self.transform.x,
			gy * self.transform.k + self.transform.y,
		)
	}

	/// Topmost node under a screen point.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let shape = self.config.node_shape;
		self.nodes()
			.iter()
			.zip(&self.metrics)
			.enumerate()
			.rev()
			.find(|(_, (node, m))| {
				let (dx, dy) = (node.x - gx, node.y - gy);
				match shape {
					NodeShape::Circle => (dx * dx + dy * dy).sqrt() <= m.radius,
					NodeShape::Card => dx.abs() <= m.half_w && dy.abs() <= m.half_h,
				}
			})
			.map(|(idx, _)| idx)
	}

	/// Closest link within [`LINK_HIT_TOLERANCE`] of a screen point.
	pub fn link_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let nodes = self.nodes();
		let tolerance = LINK_HIT_TOLERANCE / self.transform.k;
		self.links()
			.iter()
			.enumerate()
			.map(|(idx, link)| {
				let (a, b) = (&nodes[link.source], &nodes[link.target]);
				(idx, distance_to_segment(gx, gy, a.x, a.y, b.x, b.y))
			})
			.filter(|&(_, d)| d <= tolerance)
			.min_by(|a, b| a.1.total_cmp(&b.1))
			.map(|(idx, _)| idx)
	}

	pub fn set_hover(&mut self, node: Option<usize>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Keep the previous highlight around so it can fade out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for link in self.simulation.links() {
				if link.source == idx {
					self.hover.neighbors.insert(link.target);
				} else if link.target == idx {
					self.hover.neighbors.insert(link.source);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Pins the node under the pointer, or starts a pan on empty canvas.
	pub fn begin_press(&mut self, sx: f64, sy: f64) -> Option<usize> {
		self.take_drag_marker();
		match self.node_at_position(sx, sy) {
			Some(idx) => {
				self.drag = DragState {
					active: true,
					node_idx: Some(idx),
					start_x: sx,
					start_y: sy,
					moved: false,
				};
				let node = &self.nodes()[idx];
				let (x, y) = (node.x, node.y);
				self.simulation.pin(idx, x, y);
				self.simulation.alpha_target = DRAG_ALPHA_TARGET;
				self.simulation.reheat(DRAG_ALPHA_TARGET);
				Some(idx)
			}
			None => {
				self.pan = PanState {
					active: true,
					start_x: sx,
					start_y: sy,
					transform_start_x: self.transform.x,
					transform_start_y: self.transform.y,
					moved: false,
				};
				None
			}
		}
	}

	/// Moves the pinned node or the viewport. Returns true if either moved.
	pub fn drag_to(&mut self, sx: f64, sy: f64) -> bool {
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				if exceeds_slop(self.drag.start_x, self.drag.start_y, sx, sy) {
					self.drag.moved = true;
				}
				let (gx, gy) = self.screen_to_graph(sx, sy);
				self.simulation.pin(idx, gx, gy);
				return true;
			}
		} else if self.pan.active {
			if exceeds_slop(self.pan.start_x, self.pan.start_y, sx, sy) {
				self.pan.moved = true;
			}
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			return true;
		}
		false
	}

	/// Releases any pin and ends a pan.
	pub fn end_press(&mut self) {
		if self.drag.active {
			if let Some(idx) = self.drag.node_idx {
				self.simulation.unpin(idx);
			}
			self.simulation.alpha_target = 0.0;
		}
		self.drag.active = false;
		self.drag.node_idx = None;
		self.pan.active = false;
	}

	/// Consumes the "this press was a drag" marker left by the last press.
	pub fn take_drag_marker(&mut self) -> bool {
		let moved = self.drag.moved || self.pan.moved;
		self.drag.moved = false;
		self.pan.moved = false;
		moved
	}

	/// Zooms around a screen point, clamped to the configured range.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let (min, max) = self.config.zoom_limits();
		let new_k = (self.transform.k * factor).clamp(min, max);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn reset_view(&mut self) {
		self.transform = ViewTransform::IDENTITY;
	}

	/// Advances the layout one step and the hover fade by `dt` seconds.
	/// Returns whether the layout moved.
	pub fn tick(&mut self, dt: f64) -> bool {
		let stepped = self.simulation.step();

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
		stepped
	}

	/// Moves the centering target, reheats the layout and resets the viewport.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		self.simulation.set_center(width / 2.0, height / 2.0);
		self.simulation.reheat(RESIZE_REHEAT);
		self.reset_view();
	}
}

fn exceeds_slop(x0: f64, y0: f64, x1: f64, y1: f64) -> bool {
	(x1 - x0).hypot(y1 - y0) > CLICK_SLOP
}

fn distance_to_segment(px: f64, py: f64, ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
	let (dx, dy) = (bx - ax, by - ay);
	let len2 = dx * dx + dy * dy;
	if len2 == 0.0 {
		return (px - ax).hypot(py - ay);
	}
	let t = (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0);
	(px - (ax + t * dx)).hypot(py - (ay + t * dy))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::types::{DiagramLink, LinkType};

	fn two_nodes() -> GraphData {
		let mut a = DiagramNode::new("A", 0);
		let mut b = DiagramNode::new("B", 1);
		a.position = Some((-100.0, 0.0));
		b.position = Some((100.0, 0.0));
		GraphData {
			nodes: vec![a, b],
			links: vec![DiagramLink::new("A", "B", LinkType::Hierarchy)],
		}
	}

	fn state(data: &GraphData) -> ForceGraphState {
		ForceGraphState::new(data, DiagramConfig::default(), 800.0, 600.0).unwrap()
	}

	#[test]
	fn dangling_links_are_dropped() {
		let mut data = two_nodes();
		data.links.push(DiagramLink::new("A", "Z", LinkType::Hierarchy));
		let s = state(&data);
		assert_eq!(s.links().len(), 1);
		assert_eq!(s.dropped_links, 1);
	}

	#[test]
	fn strict_mode_rejects_dangling_links() {
		let mut data = two_nodes();
		data.links.push(DiagramLink::new("Z", "A", LinkType::Hierarchy));
		let config = DiagramConfig::default().with_strict_links(true);
		let err = ForceGraphState::new(&data, config, 800.0, 600.0).err();
		assert!(matches!(err, Some(DiagramError::DanglingLink { ref from, .. }) if from == "Z"));
	}

	#[test]
	fn duplicate_ids_keep_first_node() {
		let mut data = two_nodes();
		data.nodes.push(DiagramNode::new("A", 4));
		let s = state(&data);
		assert_eq!(s.nodes().len(), 2);
		assert_eq!(s.nodes()[0].node.group, 0);
	}

	#[test]
	fn hit_tests_respect_transform() {
		let mut s = state(&two_nodes());
		assert_eq!(s.node_at_position(300.0, 300.0), Some(0));
		assert_eq!(s.node_at_position(400.0, 300.0), None);
		assert_eq!(s.link_at_position(400.0, 302.0), Some(0));

		s.transform = ViewTransform {
			x: 50.0,
			y: 0.0,
			k: 2.0,
		};
		assert_eq!(s.node_at_position(650.0, 600.0), Some(0));
	}

	#[test]
	fn drag_pins_to_pointer_and_release_unpins() {
		let mut s = state(&two_nodes());
		assert_eq!(s.begin_press(300.0, 300.0), Some(0));
		assert!(s.nodes()[0].is_pinned());

		for (x, y) in [(320.0, 310.0), (340.0, 350.0)] {
			assert!(s.drag_to(x, y));
			s.tick(0.016);
			assert_eq!((s.nodes()[0].x, s.nodes()[0].y), (x, y));
		}

		s.end_press();
		assert!(!s.nodes()[0].is_pinned());
		assert!(s.take_drag_marker());
		s.tick(0.016);
		assert_ne!((s.nodes()[0].x, s.nodes()[0].y), (340.0, 350.0));
	}

	#[test]
	fn pan_and_zoom_stay_in_range() {
		let mut s = state(&two_nodes());
		assert_eq!(s.begin_press(10.0, 10.0), None);
		s.drag_to(30.0, 40.0);
		s.end_press();
		assert_eq!((s.transform.x, s.transform.y), (20.0, 30.0));

		for _ in 0..100 {
			s.zoom_at(0.0, 0.0, 1.1);
		}
		assert_eq!(s.transform.k, 3.0);
		for _ in 0..100 {
			s.zoom_at(0.0, 0.0, 0.9);
		}
		assert_eq!(s.transform.k, 0.2);
	}

	#[test]
	fn hover_collects_neighbors() {
		let mut s = state(&two_nodes());
		s.set_hover(Some(0));
		assert!(s.is_highlighted(1));
		s.set_hover(None);
		assert_eq!(s.hover.prev_node, Some(0));
		for _ in 0..400 {
			s.tick(0.016);
		}
		assert!(!s.has_active_highlight());
	}

	#[test]
	fn resize_recenters_and_resets_view() {
		let mut s = state(&two_nodes());
		s.transform.k = 2.0;
		s.resize(1000.0, 400.0);
		assert_eq!(s.simulation.center(), (500.0, 200.0));
		assert_eq!(s.transform, ViewTransform::IDENTITY);
		assert!(s.simulation.is_active());
	}

	#[test]
	fn cards_are_sized_from_labels() {
		let short = NodeMetrics::for_node(&DiagramNode::new("API", 5), NodeShape::Card);
		let long = NodeMetrics::for_node(
			&DiagramNode::new("Economic Complexity Theory", 5),
			NodeShape::Card,
		);
		assert!(long.half_w > short.half_w);
		assert_eq!(short.half_h, long.half_h);
	}
}
