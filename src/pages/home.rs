use leptos::prelude::*;

use crate::components::force_graph::ForceGraphCanvas;
use crate::content::{self, DiagramKind};

/// Default Home Page: one tab per diagram, only the visible one mounted.
#[component]
pub fn Home() -> impl IntoView {
	let active = RwSignal::new(DiagramKind::Ontology);
	let selected = RwSignal::new(None::<String>);
	let on_node_click = Callback::new(move |id: String| selected.set(Some(id)));

	let tabs = DiagramKind::ALL
		.into_iter()
		.map(|kind| {
			view! {
				<button
					class="tab-button"
					class:active=move || active.get() == kind
					on:click=move |_| {
						selected.set(None);
						active.set(kind);
					}
				>
					{kind.caption()}
				</button>
			}
		})
		.collect_view();

	let diagram = move || {
		content::load(active.get()).map(|definition| {
			view! {
				<ForceGraphCanvas
					definition=Signal::stored(definition)
					on_node_click=on_node_click
				/>
			}
		})
	};

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>
			<div class="diagram-page">
				<nav class="tab-bar">{tabs}</nav>
				<div class="tab-content">{diagram}</div>
				<p class="subtitle">
					{move || match selected.get() {
						Some(id) => format!("Selected: {id}"),
						None => {
							"Drag nodes to reposition. Scroll to zoom. Click a node for details."
								.to_string()
						}
					}}
				</p>
			</div>
		</ErrorBoundary>
	}
}
