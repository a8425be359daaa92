//! Force-directed layout engine.
//!
//! Positions are integrated in discrete steps under four forces: springs along
//! links, pairwise charge, a centering shift and circle collision. A decaying
//! energy parameter (`alpha`) scales every force so the layout cools down after
//! each disturbance.

use std::f64::consts::PI;

use super::types::{DiagramNode, LinkType};

pub const ALPHA_MIN: f64 = 0.001;
pub const VELOCITY_DECAY: f64 = 0.4;
/// Energy target held while a node is being dragged.
pub const DRAG_ALPHA_TARGET: f64 = 0.3;
const DISTANCE_MIN2: f64 = 1.0;
const INITIAL_RING_RADIUS: f64 = 100.0;

/// Decay that takes alpha from 1 to `ALPHA_MIN` in about 300 steps.
pub fn default_alpha_decay() -> f64 {
	1.0 - ALPHA_MIN.powf(1.0 / 300.0)
}

/// A node owned by the simulation.
#[derive(Clone, Debug)]
pub struct SimNode {
	pub node: DiagramNode,
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	/// User-held position; the engine leaves pinned nodes where they are put.
	pub pin: Option<(f64, f64)>,
	charge: f64,
	collide_radius: f64,
}

impl SimNode {
	pub fn id(&self) -> &str {
		&self.node.id
	}

	pub fn is_pinned(&self) -> bool {
		self.pin.is_some()
	}

	pub fn charge(&self) -> f64 {
		self.charge
	}

	/// Radius other nodes are kept outside of.
	pub fn collide_radius(&self) -> f64 {
		self.collide_radius
	}
}

/// A link with both endpoints resolved to node indices.
#[derive(Clone, Debug, PartialEq)]
pub struct SimLink {
	pub source: usize,
	pub target: usize,
	pub kind: LinkType,
	pub value: f64,
	distance: f64,
	strength: f64,
	bias: f64,
}

impl SimLink {
	/// Rest length the link pulls toward.
	pub fn distance(&self) -> f64 {
		self.distance
	}
}

/// Per-node and per-link force inputs, precomputed by the caller.
pub struct ForceInputs {
	pub charges: Vec<f64>,
	pub collide_radii: Vec<f64>,
	pub link_distances: Vec<f64>,
}

pub struct Simulation {
	nodes: Vec<SimNode>,
	links: Vec<SimLink>,
	center: (f64, f64),
	pub alpha: f64,
	pub alpha_min: f64,
	pub alpha_decay: f64,
	pub alpha_target: f64,
	pub velocity_decay: f64,
	seed: u32,
}

impl Simulation {
	/// `links` hold already-resolved `(source, target, kind, value)` indices.
	pub fn new(
		nodes: Vec<DiagramNode>,
		links: Vec<(usize, usize, LinkType, f64)>,
		inputs: ForceInputs,
		center: (f64, f64),
	) -> Self {
		let n = nodes.len();
		let nodes: Vec<SimNode> = nodes
			.into_iter()
			.enumerate()
			.map(|(i, node)| {
				let (x, y) = match node.position {
					Some((dx, dy)) => (center.0 + dx, center.1 + dy),
					None => {
						let angle = (i as f64) * 2.0 * PI / n.max(1) as f64;
						(
							center.0 + INITIAL_RING_RADIUS * angle.cos(),
							center.1 + INITIAL_RING_RADIUS * angle.sin(),
						)
					}
				};
				SimNode {
					x,
					y,
					vx: 0.0,
					vy: 0.0,
					pin: None,
					charge: inputs.charges.get(i).copied().unwrap_or(-30.0),
					collide_radius: inputs.collide_radii.get(i).copied().unwrap_or(1.0),
					node,
				}
			})
			.collect();

		let mut degree = vec![0usize; n];
		for &(s, t, _, _) in &links {
			degree[s] += 1;
			degree[t] += 1;
		}
		let links = links
			.into_iter()
			.enumerate()
			.map(|(i, (source, target, kind, value))| {
				let (ds, dt) = (degree[source] as f64, degree[target] as f64);
				SimLink {
					source,
					target,
					kind,
					value,
					distance: inputs.link_distances.get(i).copied().unwrap_or(30.0),
					strength: 1.0 / ds.min(dt),
					bias: ds / (ds + dt),
				}
			})
			.collect();

		Self {
			nodes,
			links,
			center,
			alpha: 1.0,
			alpha_min: ALPHA_MIN,
			alpha_decay: default_alpha_decay(),
			alpha_target: 0.0,
			velocity_decay: VELOCITY_DECAY,
			seed: 1,
		}
	}

	pub fn nodes(&self) -> &[SimNode] {
		&self.nodes
	}

	pub fn links(&self) -> &[SimLink] {
		&self.links
	}

	pub fn center(&self) -> (f64, f64) {
		self.center
	}

	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	/// Whether another step would still move anything.
	pub fn is_active(&self) -> bool {
		self.alpha >= self.alpha_min || self.alpha_target > 0.0
	}

	/// Raises the energy to at least `alpha` without touching positions.
	pub fn reheat(&mut self, alpha: f64) {
		self.alpha = self.alpha.max(alpha);
	}

	/// Drops all energy; the next [`step`](Self::step) is a no-op.
	pub fn stop(&mut self) {
		self.alpha = 0.0;
		self.alpha_target = 0.0;
	}

	pub fn pin(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.pin = Some((x, y));
			node.x = x;
			node.y = y;
			node.vx = 0.0;
			node.vy = 0.0;
		}
	}

	pub fn unpin(&mut self, idx: usize) {
		if let Some(node) = self.nodes.get_mut(idx) {
			node.pin = None;
		}
	}

	/// Advances the layout by one step. Returns false when the engine is at rest.
	pub fn step(&mut self) -> bool {
		if !self.is_active() {
			return false;
		}
		self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
		if self.alpha < self.alpha_min && self.alpha_target <= 0.0 {
			self.alpha = 0.0;
			return false;
		}

		self.apply_links();
		self.apply_charge();
		self.apply_center();
		self.apply_collide();

		let keep = 1.0 - self.velocity_decay;
		for node in &mut self.nodes {
			match node.pin {
				Some((fx, fy)) => {
					node.x = fx;
					node.y = fy;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				None => {
					node.vx *= keep;
					node.vy *= keep;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}
		true
	}

	fn jiggle(&mut self) -> f64 {
		self.seed = self.seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
		((self.seed as f64) / (u32::MAX as f64) - 0.5) * 1e-6
	}

	fn apply_links(&mut self) {
		for i in 0..self.links.len() {
			let (s, t, distance, strength, bias) = {
				let l = &self.links[i];
				(l.source, l.target, l.distance, l.strength, l.bias)
			};
			let (src, tgt) = (&self.nodes[s], &self.nodes[t]);
			let mut dx = tgt.x + tgt.vx - src.x - src.vx;
			let mut dy = tgt.y + tgt.vy - src.y - src.vy;
			if dx == 0.0 {
				dx = self.jiggle();
			}
			if dy == 0.0 {
				dy = self.jiggle();
			}
			let len = (dx * dx + dy * dy).sqrt();
			let k = (len - distance) / len * self.alpha * strength;
			let (fx, fy) = (dx * k, dy * k);
			self.nodes[t].vx -= fx * bias;
			self.nodes[t].vy -= fy * bias;
			self.nodes[s].vx += fx * (1.0 - bias);
			self.nodes[s].vy += fy * (1.0 - bias);
		}
	}

	fn apply_charge(&mut self) {
		let n = self.nodes.len();
		for i in 0..n {
			for j in 0..n {
				if i == j {
					continue;
				}
				let mut dx = self.nodes[j].x - self.nodes[i].x;
				let mut dy = self.nodes[j].y - self.nodes[i].y;
				if dx == 0.0 {
					dx = self.jiggle();
				}
				if dy == 0.0 {
					dy = self.jiggle();
				}
				let mut l2 = dx * dx + dy * dy;
				if l2 < DISTANCE_MIN2 {
					l2 = (DISTANCE_MIN2 * l2).sqrt();
				}
				let w = self.nodes[j].charge * self.alpha / l2;
				self.nodes[i].vx += dx * w;
				self.nodes[i].vy += dy * w;
			}
		}
	}

	fn apply_center(&mut self) {
		if self.nodes.is_empty() {
			return;
		}
		let n = self.nodes.len() as f64;
		let (sx, sy) = self
			.nodes
			.iter()
			.fold((0.0, 0.0), |(ax, ay), node| (ax + node.x, ay + node.y));
		let (shift_x, shift_y) = (sx / n - self.center.0, sy / n - self.center.1);
		for node in &mut self.nodes {
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	fn apply_collide(&mut self) {
		let n = self.nodes.len();
		for i in 0..n {
			let (xi, yi, ri) = {
				let a = &self.nodes[i];
				(a.x + a.vx, a.y + a.vy, a.collide_radius)
			};
			let ri2 = ri * ri;
			for j in (i + 1)..n {
				let rj = self.nodes[j].collide_radius;
				let r = ri + rj;
				let mut dx = xi - self.nodes[j].x - self.nodes[j].vx;
				let mut dy = yi - self.nodes[j].y - self.nodes[j].vy;
				let mut l2 = dx * dx + dy * dy;
				if l2 >= r * r {
					continue;
				}
				if dx == 0.0 {
					dx = self.jiggle();
					l2 += dx * dx;
				}
				if dy == 0.0 {
					dy = self.jiggle();
					l2 += dy * dy;
				}
				let len = l2.sqrt();
				let k = (r - len) / len;
				let (px, py) = (dx * k, dy * k);
				let share = rj * rj / (ri2 + rj * rj);
				self.nodes[i].vx += px * share;
				self.nodes[i].vy += py * share;
				self.nodes[j].vx -= px * (1.0 - share);
				self.nodes[j].vy -= py * (1.0 - share);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sim(nodes: Vec<DiagramNode>, links: Vec<(usize, usize, LinkType, f64)>) -> Simulation {
		let inputs = ForceInputs {
			charges: nodes.iter().map(|_| -200.0).collect(),
			collide_radii: nodes.iter().map(|n| n.radius() + 10.0).collect(),
			link_distances: links.iter().map(|l| l.3 * 80.0).collect(),
		};
		Simulation::new(nodes, links, inputs, (400.0, 300.0))
	}

	fn distance(a: &SimNode, b: &SimNode) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn position_hints_are_offsets_from_center() {
		let mut hinted = DiagramNode::new("a", 0);
		hinted.position = Some((-200.0, 150.0));
		let s = sim(vec![hinted, DiagramNode::new("b", 0)], vec![]);
		assert_eq!((s.nodes()[0].x, s.nodes()[0].y), (200.0, 450.0));
	}

	#[test]
	fn link_pulls_endpoints_toward_rest_length() {
		let mut a = DiagramNode::new("a", 0);
		let mut b = DiagramNode::new("b", 0);
		a.position = Some((-300.0, 0.0));
		b.position = Some((300.0, 0.0));
		let mut s = sim(vec![a, b], vec![(0, 1, LinkType::Hierarchy, 1.0)]);
		let before = distance(&s.nodes()[0], &s.nodes()[1]);
		for _ in 0..50 {
			s.step();
		}
		assert!(distance(&s.nodes()[0], &s.nodes()[1]) < before);
	}

	#[test]
	fn collision_separates_coincident_nodes() {
		let mut s = sim(vec![DiagramNode::new("a", 0), DiagramNode::new("b", 0)], vec![]);
		for node in [0, 1] {
			let n = &mut s.nodes[node];
			n.x = 400.0;
			n.y = 300.0;
		}
		for _ in 0..100 {
			s.step();
		}
		assert!(distance(&s.nodes()[0], &s.nodes()[1]) > 20.0);
	}

	#[test]
	fn centering_keeps_mean_at_center() {
		let mut s = sim((0..5).map(|i| DiagramNode::new(i.to_string(), 0)).collect(), vec![]);
		s.set_center(100.0, 50.0);
		s.reheat(1.0);
		for _ in 0..20 {
			s.step();
		}
		let n = s.nodes().len() as f64;
		let mx: f64 = s.nodes().iter().map(|n| n.x).sum::<f64>() / n;
		let my: f64 = s.nodes().iter().map(|n| n.y).sum::<f64>() / n;
		assert!((mx - 100.0).abs() < 1e-3, "mean x {mx}");
		assert!((my - 50.0).abs() < 1e-3, "mean y {my}");
	}

	#[test]
	fn pinned_node_ignores_forces() {
		let mut s = sim(
			vec![DiagramNode::new("a", 0), DiagramNode::new("b", 0)],
			vec![(0, 1, LinkType::Hierarchy, 1.0)],
		);
		s.pin(0, 10.0, 20.0);
		for _ in 0..10 {
			s.step();
		}
		assert_eq!((s.nodes()[0].x, s.nodes()[0].y), (10.0, 20.0));
	}

	#[test]
	fn energy_decays_to_rest() {
		let mut s = sim(vec![DiagramNode::new("a", 0)], vec![]);
		let mut steps = 0;
		while s.step() {
			steps += 1;
			assert!(steps < 1000, "simulation never cooled");
		}
		assert!(!s.is_active());
		assert!(steps > 200);

		s.alpha_target = DRAG_ALPHA_TARGET;
		assert!(s.is_active());
		s.alpha_target = 0.0;
		s.reheat(0.3);
		assert!(s.step());
	}
}
