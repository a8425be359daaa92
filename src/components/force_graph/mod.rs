//! Force-directed node-link diagrams drawn on a canvas.
//!
//! The layout, interaction state and overlay bookkeeping are platform free and
//! reach the page only through the `MountTarget` and `DrawSurface` seams in
//! `surface`.

mod canvas;
mod component;
mod config;
mod dom;
mod overlay;
mod render;
mod renderer;
mod simulation;
mod state;
mod surface;
mod types;

pub use component::ForceGraphCanvas;
pub use config::{DiagramConfig, DiagramStyle, NodeShape};
pub use dom::WebTarget;
pub use renderer::{DiagramHandle, DiagramRenderer};
pub use types::{
	DescriptionCatalog, DiagramDefinition, DiagramLink, DiagramNode, GraphData, LinkType,
	NodeDescription,
};
