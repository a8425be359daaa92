#![cfg(target_arch = "wasm32")]

use oec_diagrams::components::force_graph::{
	DescriptionCatalog, DiagramConfig, DiagramLink, DiagramNode, DiagramRenderer, GraphData,
	LinkType, WebTarget,
};
use oec_diagrams::error::DiagramError;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::HtmlElement;

wasm_bindgen_test_configure!(run_in_browser);

fn container(id: &str) -> HtmlElement {
	let doc = web_sys::window().unwrap().document().unwrap();
	let div: HtmlElement = doc.create_element("div").unwrap().dyn_into().unwrap();
	div.set_id(id);
	div.style().set_property("width", "640px").unwrap();
	div.style().set_property("height", "480px").unwrap();
	doc.body().unwrap().append_child(&div).unwrap();
	div
}

fn pair() -> GraphData {
	GraphData {
		nodes: vec![DiagramNode::new("a", 0), DiagramNode::new("b", 1)],
		links: vec![DiagramLink::new("a", "b", LinkType::Hierarchy)],
	}
}

fn canvases(el: &HtmlElement) -> u32 {
	el.query_selector_all("canvas").unwrap().length()
}

#[wasm_bindgen_test]
fn missing_container_is_reported() {
	let result = DiagramRenderer::mount(
		WebTarget::by_id("no-such-diagram"),
		&pair(),
		DescriptionCatalog::default(),
		DiagramConfig::default(),
	);
	assert!(matches!(result, Err(DiagramError::ContainerNotFound(name)) if name == "#no-such-diagram"));
}

#[wasm_bindgen_test]
fn remount_replaces_the_canvas() {
	let el = container("remount-diagram");
	let mount = || {
		DiagramRenderer::mount(
			WebTarget::by_id("remount-diagram"),
			&pair(),
			DescriptionCatalog::default(),
			DiagramConfig::default(),
		)
		.unwrap()
	};

	let mut first = mount();
	assert!(first.tick(0.016));
	assert_eq!(canvases(&el), 1);

	let mut second = mount();
	assert_eq!(canvases(&el), 1);

	first.unmount();
	assert_eq!(canvases(&el), 1);
	second.unmount();
	assert_eq!(canvases(&el), 0);
	el.remove();
}
