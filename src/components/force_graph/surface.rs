//! Platform seams: where a diagram is mounted and what it draws on.

use super::config::NodeShape;
use super::overlay::{Overlay, OverlayElement};
use super::state::ViewTransform;
use crate::error::DiagramError;

/// One link as drawn in a frame (world coordinates).
#[derive(Clone, Debug, PartialEq)]
pub struct LinkVisual<'a> {
	pub index: usize,
	/// Start point on the source node's edge.
	pub from: (f64, f64),
	/// Arrow tip on the target node's edge.
	pub to: (f64, f64),
	pub color: &'a str,
	pub width: f64,
	pub alpha: f64,
	pub arrow_size: f64,
}

/// One node as drawn in a frame (world coordinates).
#[derive(Clone, Debug, PartialEq)]
pub struct NodeVisual<'a> {
	pub index: usize,
	pub x: f64,
	pub y: f64,
	pub shape: NodeShape,
	/// Circle radius, or card half extents in `half_w`/`half_h`.
	pub radius: f64,
	pub half_w: f64,
	pub half_h: f64,
	pub corner: f64,
	pub color: &'a str,
	pub label: &'a str,
	pub font_px: f64,
	pub alpha: f64,
	/// Halo radius around highlighted nodes, zero for none.
	pub glow: f64,
	pub glow_alpha: f64,
	/// Outline alpha for the hovered node, zero for none.
	pub ring_alpha: f64,
}

/// One row of the relationship legend.
#[derive(Clone, Debug, PartialEq)]
pub struct LegendEntry<'a> {
	pub label: &'a str,
	pub color: &'a str,
}

/// Receives the node and link visuals of each frame.
pub trait DrawSurface {
	fn begin_frame(&mut self, width: f64, height: f64, transform: &ViewTransform);
	fn draw_link(&mut self, link: &LinkVisual<'_>);
	fn draw_node(&mut self, node: &NodeVisual<'_>);
	/// Draws the legend card in screen coordinates, unaffected by pan and zoom.
	fn draw_legend(&mut self, entries: &[LegendEntry<'_>]);
	fn end_frame(&mut self);
}

/// A container a diagram can be mounted into.
pub trait MountTarget {
	type Surface: DrawSurface;

	/// Human-readable name used in errors and logs.
	fn describe(&self) -> String;

	/// Current size, or `None` when the container is gone.
	fn size(&self) -> Option<(f64, f64)>;

	/// Clears the container and creates a fresh surface of the given size.
	fn create_surface(&mut self, width: f64, height: f64) -> Result<Self::Surface, DiagramError>;

	fn resize_surface(&mut self, surface: &mut Self::Surface, width: f64, height: f64);

	fn remove_surface(&mut self, surface: Self::Surface);

	/// Builds the element for an overlay; the overlay slot decides its lifetime.
	fn create_overlay(&mut self, overlay: &Overlay) -> Box<dyn OverlayElement>;
}
