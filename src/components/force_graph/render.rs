use super::state::{ForceGraphState, HOVER_SCALE};
use super::surface::{DrawSurface, LegendEntry, LinkVisual, NodeVisual};

const LINK_ALPHA: f64 = 0.6;
const LINK_WIDTH_PER_VALUE: f64 = 1.2;
const HOVERED_LINK_WIDTH_PER_VALUE: f64 = 2.0;
const ARROW_SIZE: f64 = 8.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Emits one frame: every resolved link, then every node, highlighted nodes
/// last, then the legend if the diagram has one.
pub fn render(state: &ForceGraphState, surface: &mut impl DrawSurface) {
	surface.begin_frame(state.width, state.height, &state.transform);
	draw_links(state, surface);
	draw_nodes(state, surface);
	if !state.legend.is_empty() {
		let entries: Vec<LegendEntry<'_>> = state
			.legend
			.iter()
			.map(|(kind, color)| LegendEntry {
				label: kind.label(),
				color,
			})
			.collect();
		surface.draw_legend(&entries);
	}
	surface.end_frame();
}

fn draw_links(state: &ForceGraphState, surface: &mut impl DrawSurface) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();
	let nodes = state.nodes();

	for (idx, link) in state.links().iter().enumerate() {
		let (src, tgt) = (&nodes[link.source], &nodes[link.target]);
		let (dx, dy) = (tgt.x - src.x, tgt.y - src.y);
		let dist = (dx * dx + dy * dy).sqrt();
		let (ux, uy) = if dist < 0.001 {
			(0.0, 0.0)
		} else {
			(dx / dist, dy / dist)
		};
		let (rs, rt) = (
			state.metrics[link.source].radius,
			state.metrics[link.target].radius,
		);

		let hovered = state.hover.link == Some(idx);
		// t=0: every link at base alpha; t=1: links between highlighted nodes
		// brighten and the rest dim
		let (alpha, width_per_value) = if hovered {
			(1.0, HOVERED_LINK_WIDTH_PER_VALUE)
		} else if !has_highlight {
			(LINK_ALPHA, LINK_WIDTH_PER_VALUE)
		} else if state.is_highlighted(link.source) && state.is_highlighted(link.target) {
			(LINK_ALPHA + 0.3 * t, LINK_WIDTH_PER_VALUE * (1.0 + 0.3 * t))
		} else {
			(LINK_ALPHA - 0.45 * t, LINK_WIDTH_PER_VALUE * (1.0 - 0.3 * t))
		};

		surface.draw_link(&LinkVisual {
			index: idx,
			from: (src.x + ux * rs, src.y + uy * rs),
			to: (tgt.x - ux * rt, tgt.y - uy * rt),
			color: &state.link_colors[idx],
			width: link.value * width_per_value,
			alpha,
			arrow_size: ARROW_SIZE,
		});
	}
}

fn draw_nodes(state: &ForceGraphState, surface: &mut impl DrawSurface) {
	let (has_highlight, t) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
	);

	let visual = move |idx: usize| {
		let node = &state.nodes()[idx];
		let m = state.metrics[idx];
		NodeVisual {
			index: idx,
			x: node.x,
			y: node.y,
			shape: state.config.node_shape,
			radius: m.radius,
			half_w: m.half_w,
			half_h: m.half_h,
			corner: m.corner,
			color: &state.node_colors[idx],
			label: node.node.label(),
			font_px: m.font_px,
			alpha: 1.0,
			glow: 0.0,
			glow_alpha: 0.0,
			ring_alpha: 0.0,
		}
	};

	let count = state.nodes().len();
	for idx in 0..count {
		if has_highlight && state.is_highlighted(idx) {
			continue;
		}
		let mut v = visual(idx);
		v.alpha = 1.0 - 0.7 * t;
		surface.draw_node(&v);
	}

	if !has_highlight {
		return;
	}

	for idx in (0..count).filter(|&idx| state.is_highlighted(idx)) {
		let mut v = visual(idx);
		let scale = if state.is_hovered(idx) {
			v.glow = v.radius * (1.8 + 1.2 * t);
			v.glow_alpha = 0.35 * t;
			v.ring_alpha = 0.7 * t;
			1.0 + HOVER_SCALE
		} else {
			v.glow = v.radius * (1.4 + 0.6 * t);
			v.glow_alpha = 0.2 * t;
			1.0
		};
		v.radius *= scale;
		v.half_w *= scale;
		v.half_h *= scale;
		surface.draw_node(&v);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::force_graph::config::DiagramConfig;
	use crate::components::force_graph::state::ViewTransform;
	use crate::components::force_graph::surface::testing::MemoryTarget;
	use crate::components::force_graph::surface::MountTarget;
	use crate::components::force_graph::types::{DiagramLink, DiagramNode, GraphData, LinkType};

	fn triangle() -> GraphData {
		GraphData {
			nodes: ["a", "b", "c"]
				.iter()
				.map(|id| DiagramNode::new(*id, 1))
				.collect(),
			links: vec![
				DiagramLink::new("a", "b", LinkType::Hierarchy),
				DiagramLink::new("b", "c", LinkType::Association),
			],
		}
	}

	#[test]
	fn every_node_and_link_is_drawn_once() {
		let mut target = MemoryTarget::new(800.0, 600.0);
		let mut surface = target.create_surface(800.0, 600.0).unwrap();
		let mut state = ForceGraphState::new(&triangle(), DiagramConfig::default(), 800.0, 600.0)
			.unwrap();

		render(&state, &mut surface);
		state.set_hover(Some(0));
		state.tick(0.5);
		render(&state, &mut surface);

		let log = target.log();
		assert_eq!(log.frames.len(), 2);
		for frame in &log.frames {
			assert_eq!(frame.nodes.len(), 3);
			assert_eq!(frame.links, vec!["#1f77b4", "#17becf"]);
		}
		// highlighted nodes come last
		assert_eq!(log.frames[1].nodes, vec!["c", "a", "b"]);
	}

	#[test]
	fn hovered_node_grows() {
		struct Sizes(Vec<(usize, f64)>);
		impl DrawSurface for Sizes {
			fn begin_frame(&mut self, _: f64, _: f64, _: &ViewTransform) {}
			fn draw_link(&mut self, _: &LinkVisual<'_>) {}
			fn draw_node(&mut self, node: &NodeVisual<'_>) {
				self.0.push((node.index, node.radius));
			}
			fn draw_legend(&mut self, _: &[LegendEntry<'_>]) {}
			fn end_frame(&mut self) {}
		}

		let mut state = ForceGraphState::new(&triangle(), DiagramConfig::default(), 800.0, 600.0)
			.unwrap();
		state.set_hover(Some(2));
		let mut sizes = Sizes(Vec::new());
		render(&state, &mut sizes);
		let hovered = sizes.0.iter().find(|(idx, _)| *idx == 2).map(|(_, r)| *r);
		assert_eq!(hovered, Some(18.0 * (1.0 + HOVER_SCALE)));
	}

	#[test]
	fn legend_lists_each_present_type_once() {
		let mut data = triangle();
		data.links.push(DiagramLink::new("c", "a", LinkType::Hierarchy));
		data.links.push(DiagramLink::new("a", "c", LinkType::DataFlow));
		let config = DiagramConfig::default().with_legend(true);
		let state = ForceGraphState::new(&data, config, 800.0, 600.0).unwrap();
		let mut target = MemoryTarget::new(800.0, 600.0);
		let mut surface = target.create_surface(800.0, 600.0).unwrap();

		render(&state, &mut surface);
		let legend: Vec<(String, String)> = [
			("Hierarchy", "#1f77b4"),
			("Data Flow", "#ff7f0e"),
			("Association", "#17becf"),
		]
		.iter()
		.map(|(l, c)| (l.to_string(), c.to_string()))
		.collect();
		assert_eq!(target.last_frame().legend, legend);
	}

	#[test]
	fn legend_is_off_by_default() {
		let state = ForceGraphState::new(&triangle(), DiagramConfig::default(), 800.0, 600.0)
			.unwrap();
		let mut target = MemoryTarget::new(800.0, 600.0);
		let mut surface = target.create_surface(800.0, 600.0).unwrap();
		render(&state, &mut surface);
		assert!(target.last_frame().legend.is_empty());
	}
}
