//! Mount lifecycle and pointer handling for one diagram instance.

use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use super::config::DiagramConfig;
use super::overlay::{self, InstanceId, Overlay, OverlayKind};
use super::render;
use super::simulation::{SimLink, SimNode};
use super::state::{ForceGraphState, ViewTransform};
use super::surface::MountTarget;
use super::types::{DescriptionCatalog, GraphData};
use crate::error::DiagramError;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Wheel notch zoom factors.
const ZOOM_IN: f64 = 1.1;
const ZOOM_OUT: f64 = 0.9;

/// Entry point for mounting diagrams.
pub struct DiagramRenderer;

impl DiagramRenderer {
	/// Creates a diagram inside `target`, replacing anything drawn there before.
	///
	/// Fails only when the container does not exist (or the platform refuses a
	/// surface, or strict link mode finds a dangling link). Links whose
	/// endpoints are unknown are otherwise dropped with a warning.
	pub fn mount<T: MountTarget>(
		mut target: T,
		data: &GraphData,
		catalog: DescriptionCatalog,
		config: DiagramConfig,
	) -> Result<DiagramHandle<T>, DiagramError> {
		let (width, height) = target
			.size()
			.ok_or_else(|| DiagramError::ContainerNotFound(target.describe()))?;
		let state = ForceGraphState::new(data, config, width, height)?;
		let surface = target.create_surface(width, height)?;
		let id = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
		debug!(
			"mounted diagram #{id} in {} ({} nodes, {} links, {} dropped)",
			target.describe(),
			state.nodes().len(),
			state.links().len(),
			state.dropped_links
		);
		Ok(DiagramHandle {
			id,
			target,
			surface: Some(surface),
			state,
			catalog,
		})
	}
}

/// A mounted diagram. Dropping the handle unmounts it.
pub struct DiagramHandle<T: MountTarget> {
	id: InstanceId,
	target: T,
	surface: Option<T::Surface>,
	state: ForceGraphState,
	catalog: DescriptionCatalog,
}

impl<T: MountTarget> DiagramHandle<T> {
	/// Process-unique id of this mount; owns the overlays it opens.
	pub fn id(&self) -> InstanceId {
		self.id
	}

	/// False once [`unmount`](Self::unmount) has run.
	pub fn is_mounted(&self) -> bool {
		self.surface.is_some()
	}

	/// Live node positions, owned by the layout engine.
	pub fn nodes(&self) -> &[SimNode] {
		self.state.nodes()
	}

	/// Links whose endpoints resolved, in authored order.
	pub fn links(&self) -> &[SimLink] {
		self.state.links()
	}

	/// Current pan and zoom.
	pub fn transform(&self) -> &ViewTransform {
		&self.state.transform
	}

	/// Layout, viewport and pointer state.
	pub fn state(&self) -> &ForceGraphState {
		&self.state
	}

	/// The container this diagram is mounted in.
	pub fn target(&self) -> &T {
		&self.target
	}

	/// Advances the layout one step and redraws from the positions of that step.
	/// Returns false once unmounted.
	pub fn tick(&mut self, dt: f64) -> bool {
		let Some(surface) = self.surface.as_mut() else {
			return false;
		};
		self.state.tick(dt);
		render::render(&self.state, surface);
		true
	}

	/// Follows the container's current size: recenters the layout, reheats it
	/// and resets pan/zoom. A no-op when unmounted or the container is gone.
	pub fn resize(&mut self) {
		let Some(surface) = self.surface.as_mut() else {
			return;
		};
		let Some((width, height)) = self.target.size() else {
			return;
		};
		self.target.resize_surface(surface, width, height);
		self.state.resize(width, height);
		debug!("resized diagram #{} to {width}x{height}", self.id);
	}

	/// Stops the layout and removes the surface and any overlays this instance
	/// opened. Safe to call repeatedly.
	pub fn unmount(&mut self) {
		let Some(surface) = self.surface.take() else {
			return;
		};
		self.state.simulation.stop();
		self.state.end_press();
		self.target.remove_surface(surface);
		overlay::release(self.id);
		debug!("unmounted diagram #{}", self.id);
	}

	/// Press at container `(x, y)`: grabs the node under the pointer or starts a pan.
	pub fn pointer_down(&mut self, x: f64, y: f64) {
		if !self.is_mounted() {
			return;
		}
		// Neither a drag nor a pan updates hover, so a link tooltip would go stale.
		self.state.begin_press(x, y);
		self.hide_tooltip();
	}

	/// Pointer moved to container `(x, y)` / page `(page_x, page_y)`.
	pub fn pointer_move(&mut self, x: f64, y: f64, page_x: f64, page_y: f64) {
		if !self.is_mounted() {
			return;
		}
		if self.state.drag_to(x, y) {
			return;
		}

		let node = self.state.node_at_position(x, y);
		self.state.set_hover(node);
		let link = match node {
			Some(_) => None,
			None => self.state.link_at_position(x, y),
		};

		match (link, self.state.hover.link) {
			(Some(idx), Some(prev)) if idx == prev => overlay::move_tooltip(self.id, page_x, page_y),
			(Some(idx), _) => {
				self.state.hover.link = Some(idx);
				let kind = self.state.links()[idx].kind;
				let tooltip = Overlay::tooltip(kind.description(), page_x, page_y);
				let element = self.target.create_overlay(&tooltip);
				overlay::open(self.id, tooltip, element);
			}
			(None, Some(_)) => self.hide_tooltip(),
			(None, None) => {}
		}
	}

	/// Ends a drag or pan.
	pub fn pointer_up(&mut self) {
		self.state.end_press();
	}

	/// The pointer left the container: ends any press and clears hover state.
	pub fn pointer_leave(&mut self) {
		self.state.end_press();
		self.state.set_hover(None);
		self.hide_tooltip();
	}

	/// A click at container `(x, y)`. Clicks ending a drag are ignored; a click
	/// on a node notifies `on_node_click` and opens its popup, a click on empty
	/// canvas closes the popup.
	pub fn click(&mut self, x: f64, y: f64) {
		if !self.is_mounted() || self.state.take_drag_marker() {
			return;
		}
		let Some(idx) = self.state.node_at_position(x, y) else {
			self.dismiss_popup();
			return;
		};
		let node = &self.state.nodes()[idx];
		if let Some(on_click) = self.state.config.on_node_click.clone() {
			on_click(&node.node);
		}
		let Some(entry) = self.catalog.lookup(&node.node) else {
			return;
		};
		let (sx, sy) = self.state.graph_to_screen(node.x, node.y);
		let (px, py) = overlay::popup_anchor(sx, sy, self.state.width, self.state.height);
		let popup = Overlay::Popup {
			node_id: node.node.id.clone(),
			entry: entry.clone(),
			x: px,
			y: py,
		};
		let element = self.target.create_overlay(&popup);
		overlay::open(self.id, popup, element);
	}

	/// Resets pan and zoom.
	pub fn double_click(&mut self) {
		if self.is_mounted() {
			self.state.reset_view();
		}
	}

	/// Wheel at container `(x, y)`; positive `delta_y` zooms out.
	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		if !self.is_mounted() {
			return;
		}
		let factor = if delta_y > 0.0 { ZOOM_OUT } else { ZOOM_IN };
		self.state.zoom_at(x, y, factor);
	}

	/// Closes the page popup, whichever diagram opened it.
	pub fn dismiss_popup(&mut self) {
		overlay::close(OverlayKind::Popup, None);
	}

	fn hide_tooltip(&mut self) {
		self.state.hover.link = None;
		overlay::close(OverlayKind::Tooltip, Some(self.id));
	}
}

impl<T: MountTarget> Drop for DiagramHandle<T> {
	fn drop(&mut self) {
		self.unmount();
	}
}
