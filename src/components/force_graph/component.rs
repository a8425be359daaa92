use std::sync::{Arc, Mutex};

use leptos::prelude::*;
use log::error;
use web_sys::HtmlElement;

use super::config::DiagramConfig;
use super::dom::{self, MountedDiagram, WebTarget};
use super::overlay::InstanceId;
use super::types::DiagramDefinition;

/// Mounts a diagram definition into a container `<div>` and keeps it running
/// until the component is disposed. A new definition replaces the running
/// diagram.
#[component]
pub fn ForceGraphCanvas(
	/// The diagram to draw.
	#[prop(into)]
	definition: Signal<DiagramDefinition>,
	/// Receives the id of a clicked node.
	#[prop(optional)]
	on_node_click: Option<Callback<String>>,
	/// Class of the container `<div>`.
	#[prop(default = "diagram-container")]
	class: &'static str,
) -> impl IntoView {
	let container_ref = NodeRef::<leptos::html::Div>::new();
	let mounted: Arc<Mutex<Option<InstanceId>>> = Arc::new(Mutex::new(None));
	let mounted_effect = mounted.clone();

	Effect::new(move |_| {
		let Some(container) = container_ref.get() else {
			return;
		};
		let definition = definition.get();
		let mut config = DiagramConfig::from_style(&definition.style);
		if let Some(callback) = on_node_click {
			config = config.with_on_node_click(move |node| callback.run(node.id.clone()));
		}

		let Ok(mut slot) = mounted_effect.lock() else {
			return;
		};
		if let Some(previous) = slot.take() {
			dom::release(previous);
		}
		let container: HtmlElement = container.into();
		match MountedDiagram::mount(
			WebTarget::from_element(container),
			&definition.data,
			definition.descriptions,
			config,
		) {
			Ok(diagram) => *slot = Some(dom::keep(diagram)),
			Err(err) => error!("could not mount `{}`: {err}", definition.title),
		}
	});

	on_cleanup(move || {
		if let Some(id) = mounted.lock().ok().and_then(|mut slot| slot.take()) {
			dom::release(id);
		}
	});

	view! { <div node_ref=container_ref class=class></div> }
}
