//! Browser bindings: DOM containers, overlay elements, the frame loop and
//! listener bookkeeping for mounted diagrams.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Document, Element, Event, EventTarget, HtmlCanvasElement,
	HtmlElement, MouseEvent, WheelEvent,
};

use super::canvas::CanvasSurface;
use super::config::DiagramConfig;
use super::overlay::{InstanceId, Overlay, OverlayElement, POPUP_WIDTH};
use super::renderer::{DiagramHandle, DiagramRenderer};
use super::surface::MountTarget;
use super::types::{DescriptionCatalog, GraphData};
use crate::error::DiagramError;

/// Seconds per animation frame fed to the hover fade.
const FRAME_DT: f64 = 0.016;
const FALLBACK_SIZE: (f64, f64) = (800.0, 600.0);

pub const POPUP_CLASS: &str = "node-popup";
pub const POPUP_CLOSE_CLASS: &str = "popup-close";
pub const TOOLTIP_CLASS: &str = "diagram-tooltip";

const POPUP_STYLE: &str = "position: absolute; background: linear-gradient(135deg, #ffffff 0%, #f8f9fa 100%); \
	border-radius: 15px; padding: 20px; box-shadow: 0 15px 40px rgba(0, 0, 0, 0.2); z-index: 1000; \
	border: 1px solid rgba(255, 255, 255, 0.3); pointer-events: auto;";
const CATEGORY_STYLE: &str = "background: linear-gradient(135deg, #ff9933 0%, #ff8c00 100%); color: white; \
	padding: 6px 12px; border-radius: 15px; font-size: 10px; font-weight: 600; text-align: center; \
	margin-bottom: 12px; text-transform: uppercase; letter-spacing: 0.5px;";
const TITLE_STYLE: &str = "font-size: 18px; font-weight: 700; color: #2a2a2a; margin-bottom: 12px; \
	line-height: 1.3; text-align: center;";
const DESCRIPTION_STYLE: &str = "font-size: 13px; line-height: 1.5; color: #4a4a4a; margin-bottom: 15px; \
	max-height: 120px; overflow-y: auto; text-align: center;";
const CLOSE_STYLE: &str = "background: linear-gradient(135deg, #ff9933 0%, #ff8c00 100%); color: white; \
	border: none; padding: 8px 16px; border-radius: 20px; font-size: 12px; font-weight: 600; \
	cursor: pointer; display: block; margin: 0 auto;";
const TOOLTIP_STYLE: &str = "position: absolute; background: rgba(0, 0, 0, 0.8); color: white; \
	padding: 8px 12px; border-radius: 6px; font-size: 12px; pointer-events: none; z-index: 1000;";

fn document() -> Option<Document> {
	web_sys::window().and_then(|w| w.document())
}

enum Container {
	Id(String),
	Element(HtmlElement),
}

/// A DOM element a diagram mounts into, looked up afresh on every use.
pub struct WebTarget {
	container: Container,
}

impl WebTarget {
	/// The element with this id, resolved at each use.
	pub fn by_id(id: impl Into<String>) -> Self {
		Self {
			container: Container::Id(id.into()),
		}
	}

	/// A container already in hand, such as a Leptos `NodeRef`.
	pub fn from_element(element: HtmlElement) -> Self {
		Self {
			container: Container::Element(element),
		}
	}

	/// The container, if it is still part of the document.
	pub fn element(&self) -> Option<HtmlElement> {
		match &self.container {
			Container::Id(id) => document()?
				.get_element_by_id(id)?
				.dyn_into::<HtmlElement>()
				.ok(),
			Container::Element(el) => el.is_connected().then(|| el.clone()),
		}
	}
}

impl MountTarget for WebTarget {
	type Surface = CanvasSurface;

	fn describe(&self) -> String {
		match &self.container {
			Container::Id(id) => format!("#{id}"),
			Container::Element(el) => format!("<{}>", el.tag_name().to_lowercase()),
		}
	}

	fn size(&self) -> Option<(f64, f64)> {
		let el = self.element()?;
		let (w, h) = (el.client_width() as f64, el.client_height() as f64);
		Some((
			if w > 0.0 { w } else { FALLBACK_SIZE.0 },
			if h > 0.0 { h } else { FALLBACK_SIZE.1 },
		))
	}

	fn create_surface(&mut self, width: f64, height: f64) -> Result<CanvasSurface, DiagramError> {
		let container = self
			.element()
			.ok_or_else(|| DiagramError::ContainerNotFound(self.describe()))?;
		let doc = document().ok_or_else(|| DiagramError::Surface("no document".into()))?;
		container.set_inner_html("");
		let style = container.style();
		if style.get_property_value("position").unwrap_or_default().is_empty() {
			let _ = style.set_property("position", "relative");
		}

		let canvas: HtmlCanvasElement = doc
			.create_element("canvas")
			.and_then(|el| el.dyn_into::<HtmlCanvasElement>().map_err(JsValue::from))
			.map_err(|_| DiagramError::Surface("cannot create canvas".into()))?;
		let _ = canvas.set_attribute("style", "display: block; cursor: grab;");
		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|ctx| ctx.dyn_into().ok())
			.ok_or_else(|| DiagramError::Surface("2d context unavailable".into()))?;
		container
			.append_child(&canvas)
			.map_err(|_| DiagramError::Surface("cannot attach canvas".into()))?;

		let surface = CanvasSurface::new(canvas, ctx);
		surface.set_size(width, height);
		Ok(surface)
	}

	fn resize_surface(&mut self, surface: &mut CanvasSurface, width: f64, height: f64) {
		surface.set_size(width, height);
	}

	fn remove_surface(&mut self, surface: CanvasSurface) {
		surface.canvas.remove();
	}

	fn create_overlay(&mut self, overlay: &Overlay) -> Box<dyn OverlayElement> {
		let element = match overlay {
			Overlay::Popup { entry, .. } => self.element().and_then(|container| {
				let popup = build_popup(&entry.category, &entry.title, &entry.description)?;
				container.append_child(&popup).ok()?;
				Some(popup)
			}),
			Overlay::Tooltip { text, .. } => document().and_then(|doc| {
				let tooltip = doc.create_element("div").ok()?;
				tooltip.set_class_name(TOOLTIP_CLASS);
				let _ = tooltip.set_attribute("style", TOOLTIP_STYLE);
				tooltip.set_text_content(Some(text));
				doc.body()?.append_child(&tooltip).ok()?;
				Some(tooltip)
			}),
		};
		let mut element = WebOverlay(element);
		match overlay {
			Overlay::Popup { x, y, .. } | Overlay::Tooltip { x, y, .. } => element.move_to(*x, *y),
		}
		Box::new(element)
	}
}

fn build_popup(category: &str, title: &str, description: &str) -> Option<Element> {
	let doc = document()?;
	let part = |tag: &str, class: &str, style: &str, text: &str| -> Option<Element> {
		let el = doc.create_element(tag).ok()?;
		el.set_class_name(class);
		let _ = el.set_attribute("style", style);
		el.set_text_content(Some(text));
		Some(el)
	};

	let popup = doc.create_element("div").ok()?;
	popup.set_class_name(POPUP_CLASS);
	let _ = popup.set_attribute("style", &format!("{POPUP_STYLE} width: {POPUP_WIDTH}px;"));
	for child in [
		part("div", "popup-category", CATEGORY_STYLE, category)?,
		part("h3", "popup-title", TITLE_STYLE, title)?,
		part("p", "popup-description", DESCRIPTION_STYLE, description)?,
		part("button", POPUP_CLOSE_CLASS, CLOSE_STYLE, "×")?,
	] {
		popup.append_child(&child).ok()?;
	}
	Some(popup)
}

/// A popup or tooltip element; `None` if the page refused to create it.
struct WebOverlay(Option<Element>);

impl OverlayElement for WebOverlay {
	fn move_to(&mut self, x: f64, y: f64) {
		if let Some(el) = self.0.as_ref().and_then(|el| el.dyn_ref::<HtmlElement>()) {
			let style = el.style();
			let _ = style.set_property("left", &format!("{x}px"));
			let _ = style.set_property("top", &format!("{y}px"));
		}
	}

	fn remove(self: Box<Self>) {
		if let Some(el) = self.0 {
			el.remove();
		}
	}
}

/// An event listener removed from its target on drop.
struct Listener {
	target: EventTarget,
	event: &'static str,
	callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
	fn attach(target: &EventTarget, event: &'static str, f: impl FnMut(Event) + 'static) -> Option<Self> {
		let callback = Closure::<dyn FnMut(Event)>::new(f);
		match target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref()) {
			Ok(()) => Some(Self {
				target: target.clone(),
				event,
				callback,
			}),
			Err(err) => {
				warn!("could not listen for `{event}`: {err:?}");
				None
			}
		}
	}
}

impl Drop for Listener {
	fn drop(&mut self) {
		let _ = self
			.target
			.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
	}
}

type Shared = Rc<RefCell<DiagramHandle<WebTarget>>>;

/// A diagram running in the page: its handle, frame loop and listeners.
pub struct MountedDiagram {
	id: InstanceId,
	handle: Shared,
	stopped: Rc<Cell<bool>>,
	frame: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
	raf_id: Rc<Cell<Option<i32>>>,
	listeners: Vec<Listener>,
}

fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

impl MountedDiagram {
	pub fn mount(
		target: WebTarget,
		data: &GraphData,
		catalog: DescriptionCatalog,
		config: DiagramConfig,
	) -> Result<Self, DiagramError> {
		let handle = DiagramRenderer::mount(target, data, catalog, config)?;
		let id = handle.id();
		let handle: Shared = Rc::new(RefCell::new(handle));
		let mut mounted = Self {
			id,
			handle,
			stopped: Rc::new(Cell::new(false)),
			frame: Rc::new(RefCell::new(None)),
			raf_id: Rc::new(Cell::new(None)),
			listeners: Vec::new(),
		};
		mounted.listen();
		mounted.start_frames();
		Ok(mounted)
	}

	pub fn id(&self) -> InstanceId {
		self.id
	}

	fn listen(&mut self) {
		let Some(canvas) = self.canvas() else {
			return;
		};
		let target: &EventTarget = canvas.as_ref();

		let on_mouse = |handle: Shared, canvas: HtmlCanvasElement, f: fn(&mut DiagramHandle<WebTarget>, &MouseEvent, (f64, f64))| {
			move |ev: Event| {
				if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
					let point = canvas_point(&canvas, ev);
					f(&mut handle.borrow_mut(), ev, point);
				}
			}
		};

		let canvas_events: [(&'static str, fn(&mut DiagramHandle<WebTarget>, &MouseEvent, (f64, f64))); 6] = [
			("mousedown", |h, _, (x, y)| h.pointer_down(x, y)),
			("mousemove", |h, ev, (x, y)| {
				h.pointer_move(x, y, ev.page_x() as f64, ev.page_y() as f64)
			}),
			("mouseup", |h, _, _| h.pointer_up()),
			("mouseleave", |h, _, _| h.pointer_leave()),
			("click", |h, ev, (x, y)| {
				// Keep the document listener from treating this as an outside click.
				ev.stop_propagation();
				h.click(x, y);
			}),
			("dblclick", |h, ev, _| {
				ev.prevent_default();
				h.double_click();
			}),
		];
		for (event, f) in canvas_events {
			self.listeners.extend(Listener::attach(
				target,
				event,
				on_mouse(self.handle.clone(), canvas.clone(), f),
			));
		}

		let (handle, wheel_canvas) = (self.handle.clone(), canvas.clone());
		self.listeners.extend(Listener::attach(target, "wheel", move |ev: Event| {
			if let Some(ev) = ev.dyn_ref::<WheelEvent>() {
				ev.prevent_default();
				let (x, y) = canvas_point(&wheel_canvas, ev);
				handle.borrow_mut().wheel(x, y, ev.delta_y());
			}
		}));

		if let Some(doc) = document() {
			let handle = self.handle.clone();
			self.listeners.extend(Listener::attach(doc.as_ref(), "click", move |ev: Event| {
				let inside_popup = ev
					.target()
					.and_then(|t| t.dyn_into::<Element>().ok())
					.map(|el| {
						let in_popup = el.closest(&format!(".{POPUP_CLASS}")).ok().flatten().is_some();
						let on_close = el.closest(&format!(".{POPUP_CLOSE_CLASS}")).ok().flatten().is_some();
						in_popup && !on_close
					})
					.unwrap_or(false);
				if !inside_popup {
					handle.borrow_mut().dismiss_popup();
				}
			}));
		}

		if let Some(window) = web_sys::window() {
			let handle = self.handle.clone();
			self.listeners.extend(Listener::attach(window.as_ref(), "resize", move |_| {
				handle.borrow_mut().resize();
			}));
		}
	}

	fn canvas(&self) -> Option<HtmlCanvasElement> {
		let handle = self.handle.borrow();
		let container = handle.target().element()?;
		container
			.query_selector("canvas")
			.ok()
			.flatten()
			.and_then(|el| el.dyn_into().ok())
	}

	fn start_frames(&self) {
		let (handle, stopped, raf_id, next) = (
			self.handle.clone(),
			self.stopped.clone(),
			self.raf_id.clone(),
			self.frame.clone(),
		);
		*self.frame.borrow_mut() = Some(Closure::new(move || {
			if stopped.get() {
				return;
			}
			if !handle.borrow_mut().tick(FRAME_DT) {
				return;
			}
			if let (Some(window), Some(cb)) = (web_sys::window(), next.borrow().as_ref()) {
				raf_id.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		}));
		if let (Some(window), Some(cb)) = (web_sys::window(), self.frame.borrow().as_ref()) {
			self.raf_id
				.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
		}
	}

	/// Stops the frame loop, detaches every listener and unmounts the diagram.
	pub fn unmount(&mut self) {
		if self.stopped.replace(true) {
			return;
		}
		if let (Some(id), Some(window)) = (self.raf_id.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		// Breaks the closure's reference to itself.
		self.frame.borrow_mut().take();
		self.listeners.clear();
		self.handle.borrow_mut().unmount();
		debug!("diagram #{} detached from page", self.id);
	}
}

impl Drop for MountedDiagram {
	fn drop(&mut self) {
		self.unmount();
	}
}

thread_local! {
	static MOUNTED: RefCell<HashMap<InstanceId, MountedDiagram>> = RefCell::new(HashMap::new());
}

/// Keeps a mounted diagram alive until [`release`] is called with its id.
pub fn keep(diagram: MountedDiagram) -> InstanceId {
	let id = diagram.id();
	MOUNTED.with(|m| m.borrow_mut().insert(id, diagram));
	id
}

/// Unmounts a diagram previously passed to [`keep`].
pub fn release(id: InstanceId) {
	let diagram = MOUNTED.with(|m| m.borrow_mut().remove(&id));
	drop(diagram);
}
