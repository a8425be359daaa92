//! The page-wide overlay slot.
//!
//! At most one popup and one tooltip exist at a time across every mounted
//! diagram. Opening either replaces the previous one of the same kind, whoever
//! owned it, and an instance's overlays are released when it unmounts.

use std::cell::RefCell;

use super::types::NodeDescription;

pub const POPUP_WIDTH: f64 = 400.0;
pub const POPUP_HEIGHT: f64 = 300.0;
const POPUP_OFFSET: f64 = 20.0;
const POPUP_MARGIN: f64 = 10.0;
const TOOLTIP_OFFSET: (f64, f64) = (10.0, -10.0);

/// Identifies the diagram instance that opened an overlay.
pub type InstanceId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayKind {
	Popup,
	Tooltip,
}

/// What an overlay shows and where, in the coordinates its element expects.
#[derive(Clone, Debug, PartialEq)]
pub enum Overlay {
	/// Card with a node's catalog entry, positioned inside the diagram container.
	Popup {
		node_id: String,
		entry: NodeDescription,
		x: f64,
		y: f64,
	},
	/// Link relationship text, positioned in page coordinates.
	Tooltip { text: String, x: f64, y: f64 },
}

impl Overlay {
	pub fn kind(&self) -> OverlayKind {
		match self {
			Overlay::Popup { .. } => OverlayKind::Popup,
			Overlay::Tooltip { .. } => OverlayKind::Tooltip,
		}
	}

	/// Tooltip anchored next to a page-space pointer position.
	pub fn tooltip(text: impl Into<String>, page_x: f64, page_y: f64) -> Self {
		Overlay::Tooltip {
			text: text.into(),
			x: page_x + TOOLTIP_OFFSET.0,
			y: page_y + TOOLTIP_OFFSET.1,
		}
	}
}

/// Places a popup beside a node at `(node_x, node_y)` (container space),
/// flipping left and clamping vertically to stay inside the container.
pub fn popup_anchor(node_x: f64, node_y: f64, width: f64, height: f64) -> (f64, f64) {
	let mut x = node_x + POPUP_OFFSET;
	let mut y = node_y - POPUP_HEIGHT / 2.0;
	if x + POPUP_WIDTH > width {
		x = node_x - POPUP_WIDTH - POPUP_OFFSET;
	}
	if y < 0.0 {
		y = POPUP_MARGIN;
	}
	if y + POPUP_HEIGHT > height {
		y = height - POPUP_HEIGHT - POPUP_MARGIN;
	}
	(x, y)
}

/// A materialized overlay owned by the slot.
pub trait OverlayElement {
	/// Moves the element to new coordinates (tooltips follow the pointer).
	fn move_to(&mut self, x: f64, y: f64);
	/// Detaches the element from the page.
	fn remove(self: Box<Self>);
}

struct Entry {
	owner: InstanceId,
	overlay: Overlay,
	element: Box<dyn OverlayElement>,
}

#[derive(Default)]
struct Slot {
	popup: Option<Entry>,
	tooltip: Option<Entry>,
}

impl Slot {
	fn lane(&mut self, kind: OverlayKind) -> &mut Option<Entry> {
		match kind {
			OverlayKind::Popup => &mut self.popup,
			OverlayKind::Tooltip => &mut self.tooltip,
		}
	}
}

thread_local! {
	static SLOT: RefCell<Slot> = RefCell::new(Slot::default());
}

fn take(kind: OverlayKind, owner: Option<InstanceId>) -> Option<Entry> {
	SLOT.with(|slot| {
		let mut slot = slot.borrow_mut();
		let lane = slot.lane(kind);
		let foreign = matches!(
			(lane.as_ref(), owner),
			(Some(entry), Some(owner)) if entry.owner != owner
		);
		if foreign { None } else { lane.take() }
	})
}

/// Shows `overlay`, removing whatever occupied its lane first.
pub fn open(owner: InstanceId, overlay: Overlay, element: Box<dyn OverlayElement>) {
	let kind = overlay.kind();
	// Elements are removed outside the borrow so they may touch the slot again.
	if let Some(old) = take(kind, None) {
		old.element.remove();
	}
	SLOT.with(|slot| {
		*slot.borrow_mut().lane(kind) = Some(Entry {
			owner,
			overlay,
			element,
		});
	});
}

/// Moves the tooltip if `owner` holds it.
pub fn move_tooltip(owner: InstanceId, page_x: f64, page_y: f64) {
	SLOT.with(|slot| {
		let mut slot = slot.borrow_mut();
		if let Some(entry) = slot.tooltip.as_mut().filter(|e| e.owner == owner) {
			let Overlay::Tooltip { text, .. } = &entry.overlay else {
				return;
			};
			let moved = Overlay::tooltip(text.clone(), page_x, page_y);
			if let Overlay::Tooltip { x, y, .. } = moved {
				entry.element.move_to(x, y);
			}
			entry.overlay = moved;
		}
	});
}

/// Closes the overlay of `kind`; with an owner, only if that owner holds it.
pub fn close(kind: OverlayKind, owner: Option<InstanceId>) -> bool {
	match take(kind, owner) {
		Some(entry) => {
			entry.element.remove();
			true
		}
		None => false,
	}
}

/// Closes every overlay `owner` holds.
pub fn release(owner: InstanceId) {
	close(OverlayKind::Popup, Some(owner));
	close(OverlayKind::Tooltip, Some(owner));
}

/// The overlay currently shown in a lane, with its owner.
pub fn current(kind: OverlayKind) -> Option<(InstanceId, Overlay)> {
	SLOT.with(|slot| {
		let mut slot = slot.borrow_mut();
		slot.lane(kind)
			.as_ref()
			.map(|e| (e.owner, e.overlay.clone()))
	})
}

#[cfg(test)]
pub(crate) mod testing {
	use std::cell::RefCell;
	use std::rc::Rc;

	use super::OverlayElement;

	/// Counts live elements and records their last position.
	#[derive(Clone, Default)]
	pub struct ElementLog {
		pub live: Rc<RefCell<usize>>,
		pub last_move: Rc<RefCell<Option<(f64, f64)>>>,
	}

	pub struct FakeElement(pub ElementLog);

	impl ElementLog {
		pub fn element(&self) -> Box<dyn OverlayElement> {
			*self.live.borrow_mut() += 1;
			Box::new(FakeElement(self.clone()))
		}

		pub fn live(&self) -> usize {
			*self.live.borrow()
		}
	}

	impl OverlayElement for FakeElement {
		fn move_to(&mut self, x: f64, y: f64) {
			*self.0.last_move.borrow_mut() = Some((x, y));
		}

		fn remove(self: Box<Self>) {
			*self.0.live.borrow_mut() -= 1;
		}
	}
}
