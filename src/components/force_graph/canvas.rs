use std::f64::consts::PI;

use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::config::NodeShape;
use super::state::ViewTransform;
use super::surface::{DrawSurface, LegendEntry, LinkVisual, NodeVisual};

const BACKGROUND: &str = "#ffffff";
const CARD_BORDER: &str = "#d0d4da";
const LABEL_SHADOW: &str = "rgba(0, 0, 0, 0.5)";
const CARD_LABEL: &str = "#2a2a2a";

const LEGEND_ORIGIN: (f64, f64) = (20.0, 20.0);
const LEGEND_WIDTH: f64 = 200.0;
const LEGEND_ROW: f64 = 28.0;

/// Label fill and optional text shadow: dark on light cards, shadowed white
/// on filled circles.
fn label_style(shape: NodeShape) -> (&'static str, Option<&'static str>) {
	match shape {
		NodeShape::Card => (CARD_LABEL, None),
		NodeShape::Circle => ("white", Some(LABEL_SHADOW)),
	}
}

/// A `<canvas>` element and its 2D context.
pub struct CanvasSurface {
	pub canvas: HtmlCanvasElement,
	ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
	pub fn new(canvas: HtmlCanvasElement, ctx: CanvasRenderingContext2d) -> Self {
		Self { canvas, ctx }
	}

	pub fn set_size(&self, width: f64, height: f64) {
		self.canvas.set_width(width.max(0.0) as u32);
		self.canvas.set_height(height.max(0.0) as u32);
	}

	fn rounded_rect(&self, x: f64, y: f64, w: f64, h: f64, r: f64) {
		let ctx = &self.ctx;
		let r = r.min(w / 2.0).min(h / 2.0);
		ctx.begin_path();
		ctx.move_to(x + r, y);
		let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
		let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
		let _ = ctx.arc_to(x, y + h, x, y, r);
		let _ = ctx.arc_to(x, y, x + w, y, r);
		ctx.close_path();
	}

	fn draw_glow(&self, node: &NodeVisual<'_>) {
		let ctx = &self.ctx;
		let (x, y) = (node.x, node.y);
		let Ok(gradient) = ctx.create_radial_gradient(x, y, node.radius * 0.3, x, y, node.glow) else {
			return;
		};
		let alpha = node.glow_alpha;
		let _ = gradient.add_color_stop(0.0, &format!("rgba(120, 160, 255, {})", alpha));
		let _ = gradient.add_color_stop(0.6, &format!("rgba(120, 160, 255, {})", alpha * 0.3));
		let _ = gradient.add_color_stop(1.0, "rgba(120, 160, 255, 0)");
		ctx.begin_path();
		let _ = ctx.arc(x, y, node.glow, 0.0, 2.0 * PI);
		#[allow(deprecated)]
		ctx.set_fill_style(&gradient);
		ctx.fill();
	}
}

impl DrawSurface for CanvasSurface {
	fn begin_frame(&mut self, width: f64, height: f64, transform: &ViewTransform) {
		let ctx = &self.ctx;
		ctx.set_global_alpha(1.0);
		ctx.set_fill_style_str(BACKGROUND);
		ctx.fill_rect(0.0, 0.0, width, height);
		ctx.save();
		let _ = ctx.translate(transform.x, transform.y);
		let _ = ctx.scale(transform.k, transform.k);
	}

	fn draw_link(&mut self, link: &LinkVisual<'_>) {
		let ctx = &self.ctx;
		let ((x1, y1), (x2, y2)) = (link.from, link.to);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let arrow = link.arrow_size.min(dist);

		ctx.set_global_alpha(link.alpha.clamp(0.0, 1.0));
		ctx.set_stroke_style_str(link.color);
		ctx.set_line_width(link.width);
		ctx.set_line_cap("round");
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2 - ux * arrow, y2 - uy * arrow);
		ctx.stroke();

		ctx.set_fill_style_str(link.color);
		let (back_x, back_y) = (x2 - ux * arrow, y2 - uy * arrow);
		let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);
		ctx.begin_path();
		ctx.move_to(x2, y2);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
		ctx.set_global_alpha(1.0);
	}

	fn draw_node(&mut self, node: &NodeVisual<'_>) {
		if node.glow > 0.0 && node.glow_alpha > 0.01 {
			self.draw_glow(node);
		}

		let ctx = &self.ctx;
		let (x, y) = (node.x, node.y);
		ctx.set_global_alpha(node.alpha.clamp(0.0, 1.0));
		match node.shape {
			NodeShape::Circle => {
				ctx.begin_path();
				let _ = ctx.arc(x, y, node.radius, 0.0, 2.0 * PI);
			}
			NodeShape::Card => {
				self.rounded_rect(
					x - node.half_w,
					y - node.half_h,
					node.half_w * 2.0,
					node.half_h * 2.0,
					node.corner,
				);
			}
		}
		ctx.set_fill_style_str(node.color);
		ctx.fill();
		if node.shape == NodeShape::Card {
			ctx.set_stroke_style_str(CARD_BORDER);
			ctx.set_line_width(1.5);
			ctx.stroke();
		}

		if node.ring_alpha > 0.01 {
			ctx.begin_path();
			let _ = ctx.arc(x, y, node.radius + 2.0, 0.0, 2.0 * PI);
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", node.ring_alpha));
			ctx.set_line_width(1.5);
			ctx.stroke();
		}

		ctx.set_font(&format!("600 {}px Inter, Arial, sans-serif", node.font_px));
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		let (fill, shadow) = label_style(node.shape);
		if let Some(shadow) = shadow {
			ctx.set_shadow_color(shadow);
			ctx.set_shadow_blur(2.0);
		}
		ctx.set_fill_style_str(fill);
		let _ = ctx.fill_text(node.label, x, y);
		ctx.set_shadow_blur(0.0);
		ctx.set_shadow_color("transparent");
		ctx.set_global_alpha(1.0);
	}

	fn draw_legend(&mut self, entries: &[LegendEntry<'_>]) {
		let ctx = &self.ctx;
		let (ox, oy) = LEGEND_ORIGIN;
		ctx.save();
		let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
		ctx.set_global_alpha(1.0);

		self.rounded_rect(ox, oy, LEGEND_WIDTH, entries.len() as f64 * LEGEND_ROW + 35.0, 12.0);
		ctx.set_shadow_color("rgba(0, 0, 0, 0.15)");
		ctx.set_shadow_blur(20.0);
		ctx.set_fill_style_str("rgba(255, 255, 255, 0.98)");
		ctx.fill();
		ctx.set_shadow_blur(0.0);
		ctx.set_shadow_color("transparent");
		ctx.set_stroke_style_str("rgba(0, 0, 0, 0.08)");
		ctx.set_line_width(1.5);
		ctx.stroke();

		ctx.set_text_baseline("alphabetic");
		ctx.set_text_align("center");
		ctx.set_font("700 13px Inter, Arial, sans-serif");
		ctx.set_fill_style_str("#2a2a2a");
		let _ = ctx.fill_text("Relationship Types", ox + LEGEND_WIDTH / 2.0, oy + 22.0);

		ctx.set_text_align("left");
		ctx.set_font("500 12px Inter, Arial, sans-serif");
		for (i, entry) in entries.iter().enumerate() {
			let (x, y) = (ox + 20.0, oy + 40.0 + i as f64 * LEGEND_ROW);
			ctx.set_stroke_style_str(entry.color);
			ctx.set_line_width(3.5);
			ctx.set_line_cap("round");
			ctx.begin_path();
			ctx.move_to(x, y);
			ctx.line_to(x + 20.0, y);
			ctx.stroke();

			ctx.set_fill_style_str(entry.color);
			ctx.begin_path();
			ctx.move_to(x + 25.0, y);
			ctx.line_to(x + 20.0, y - 4.0);
			ctx.line_to(x + 20.0, y + 4.0);
			ctx.close_path();
			ctx.fill();

			ctx.set_fill_style_str("#4a4a4a");
			let _ = ctx.fill_text(entry.label, x + 35.0, y + 4.0);
		}
		ctx.restore();
	}

	fn end_frame(&mut self) {
		self.ctx.restore();
	}
}
