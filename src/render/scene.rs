use std::collections::HashMap;
use std::fmt::Write as _;

use kurbo::{Affine, BezPath, Shape as _};
use serde::Deserialize as _;

use crate::foundation::core::{Canvas, Rgba8};
use crate::foundation::error::{ConvertError, ConvertResult};
use crate::foundation::math::unit_to_u8;
use crate::render::environment::RenderEnvironment;
use crate::render::lottie::{
    FillShape, GroupShape, Layer, LayerKind, LottieDocument, ShapeItem, StrokeShape,
};
use crate::timeline::Animation;

const PATH_TOLERANCE: f64 = 0.1;
const MAX_PARENT_DEPTH: usize = 64;

/// Built-in rendering environment for simple shape animations.
///
/// Evaluates shape, solid and null layers with linear/hold keyframes and serializes the still
/// at the playhead as SVG sized to the output canvas.
#[derive(Debug, Default)]
pub struct SceneEnvironment {
    loaded: Option<LoadedScene>,
    frame: f64,
}

#[derive(Debug)]
struct LoadedScene {
    doc: LottieDocument,
    canvas: Canvas,
}

impl SceneEnvironment {
    /// Empty environment; call `load` before seeking.
    pub fn new() -> Self {
        Self::default()
    }

    fn scene(&self) -> ConvertResult<&LoadedScene> {
        self.loaded
            .as_ref()
            .ok_or_else(|| ConvertError::rasterize("no animation loaded into scene environment"))
    }
}

impl RenderEnvironment for SceneEnvironment {
    fn load(&mut self, animation: &Animation) -> ConvertResult<()> {
        let doc = LottieDocument::deserialize(&*animation.document)
            .map_err(|e| ConvertError::rasterize(format!("animation content: {e}")))?;

        let skipped = doc.unsupported_count();
        if skipped > 0 {
            tracing::warn!(skipped, "unsupported layers/shapes will not be drawn");
        }

        self.frame = animation.descriptor.in_point;
        self.loaded = Some(LoadedScene {
            doc,
            canvas: animation.descriptor.canvas,
        });
        Ok(())
    }

    fn seek(&mut self, frame: f64) -> ConvertResult<()> {
        self.scene()?;
        if !frame.is_finite() {
            return Err(ConvertError::rasterize(format!("cannot seek to frame {frame}")));
        }
        self.frame = frame;
        Ok(())
    }

    fn extract_svg(&mut self) -> ConvertResult<String> {
        let scene = self.scene()?;
        Ok(scene_to_svg(&scene.doc, scene.canvas, self.frame))
    }
}

fn scene_to_svg(doc: &LottieDocument, canvas: Canvas, frame: f64) -> String {
    let view_w = doc.w.filter(|w| *w > 0.0).unwrap_or(f64::from(canvas.width));
    let view_h = doc.h.filter(|h| *h > 0.0).unwrap_or(f64::from(canvas.height));

    let mut out = String::with_capacity(1024);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
        canvas.width,
        canvas.height,
        num(view_w),
        num(view_h)
    );

    let by_index: HashMap<i64, &Layer> = doc
        .layers
        .iter()
        .filter_map(|l| l.ind.map(|ind| (ind, l)))
        .collect();

    // First layer in the document is drawn on top.
    for layer in doc.layers.iter().rev() {
        if !layer.visible_at(frame) {
            continue;
        }
        match layer.kind() {
            LayerKind::Shape | LayerKind::Solid => emit_layer(&mut out, layer, &by_index, frame),
            LayerKind::Null | LayerKind::Unsupported(_) => {}
        }
    }

    out.push_str("</svg>");
    out
}

fn emit_layer(out: &mut String, layer: &Layer, by_index: &HashMap<i64, &Layer>, frame: f64) {
    let t = layer.local_time(frame);
    let transform = layer_transform(layer, by_index, frame);
    let opacity = layer.ks.opacity_at(t);
    if opacity <= 0.0 {
        return;
    }

    open_group(out, transform, opacity);
    match layer.kind() {
        LayerKind::Solid => {
            let color = layer
                .sc
                .as_deref()
                .and_then(|sc| Rgba8::from_hex(sc).ok())
                .unwrap_or(Rgba8::new(0, 0, 0, 255));
            let _ = write!(
                out,
                r#"<rect width="{}" height="{}" fill="rgb({},{},{})" fill-opacity="{}"/>"#,
                num(layer.sw.unwrap_or(0.0)),
                num(layer.sh.unwrap_or(0.0)),
                color.r,
                color.g,
                color.b,
                num(f64::from(color.a) / 255.0)
            );
        }
        _ => emit_items(out, &layer.shapes, t),
    }
    out.push_str("</g>");
}

/// Parent chain transform. Parents only contribute their transform, never their opacity.
fn layer_transform(layer: &Layer, by_index: &HashMap<i64, &Layer>, frame: f64) -> Affine {
    let mut m = layer.ks.affine_at(layer.local_time(frame));
    let mut parent = layer.parent;
    let mut depth = 0;
    while let Some(ind) = parent {
        let Some(p) = by_index.get(&ind) else {
            break;
        };
        depth += 1;
        if depth > MAX_PARENT_DEPTH {
            tracing::warn!(ind, "layer parent chain too deep, truncated");
            break;
        }
        m = p.ks.affine_at(p.local_time(frame)) * m;
        parent = p.parent;
    }
    m
}

/// Draw a shape item list. A fill or stroke paints the geometry listed before it in the same
/// list; later entries are drawn underneath earlier ones.
fn emit_items(out: &mut String, items: &[ShapeItem], t: f64) {
    let mut geometry = BezPath::new();
    let mut draws: Vec<String> = Vec::new();

    for item in items {
        match item {
            ShapeItem::Rect(r) if !r.hd => {
                let center = vec_at(r.p.as_ref(), t);
                let size = vec_at(r.s.as_ref(), t);
                let radius = r.r.as_ref().map_or(0.0, |p| p.scalar_at(t, 0.0));
                let rect = kurbo::Rect::from_center_size(center.to_point(), size.to_size());
                if radius > 0.0 {
                    geometry.extend(rect.to_rounded_rect(radius).path_elements(PATH_TOLERANCE));
                } else {
                    geometry.extend(rect.path_elements(PATH_TOLERANCE));
                }
            }
            ShapeItem::Ellipse(e) if !e.hd => {
                let center = vec_at(e.p.as_ref(), t);
                let size = vec_at(e.s.as_ref(), t);
                let ellipse = kurbo::Ellipse::new(center.to_point(), size / 2.0, 0.0);
                geometry.extend(ellipse.path_elements(PATH_TOLERANCE));
            }
            ShapeItem::Path(p) if !p.hd => {
                if let Some(bezier) = p.ks.bezier_at(t) {
                    geometry.extend(bezier.to_bez_path().elements().iter().copied());
                }
            }
            ShapeItem::Fill(f) if !f.hd => {
                if let Some(d) = fill_element(&geometry, f, t) {
                    draws.push(d);
                }
            }
            ShapeItem::Stroke(s) if !s.hd => {
                if let Some(d) = stroke_element(&geometry, s, t) {
                    draws.push(d);
                }
            }
            ShapeItem::Group(g) if !g.hd => {
                let mut nested = String::new();
                emit_group(&mut nested, g, t);
                draws.push(nested);
            }
            _ => {}
        }
    }

    for d in draws.iter().rev() {
        out.push_str(d);
    }
}

fn emit_group(out: &mut String, group: &GroupShape, t: f64) {
    let (transform, opacity) = group
        .transform()
        .map_or((Affine::IDENTITY, 1.0), |tr| (tr.affine_at(t), tr.opacity_at(t)));
    if opacity <= 0.0 {
        return;
    }
    open_group(out, transform, opacity);
    emit_items(out, &group.it, t);
    out.push_str("</g>");
}

fn fill_element(geometry: &BezPath, fill: &FillShape, t: f64) -> Option<String> {
    if geometry.elements().is_empty() {
        return None;
    }
    let (rgb, alpha) = color_at(fill.c.as_ref(), t);
    let opacity = alpha * fill.o.as_ref().map_or(1.0, |o| o.scalar_at(t, 100.0) / 100.0);
    let rule = if fill.r == Some(2) { "evenodd" } else { "nonzero" };
    Some(format!(
        r#"<path d="{}" fill="rgb({},{},{})" fill-opacity="{}" fill-rule="{}"/>"#,
        geometry.to_svg(),
        rgb[0],
        rgb[1],
        rgb[2],
        num(opacity.clamp(0.0, 1.0)),
        rule
    ))
}

fn stroke_element(geometry: &BezPath, stroke: &StrokeShape, t: f64) -> Option<String> {
    if geometry.elements().is_empty() {
        return None;
    }
    let width = stroke.w.as_ref().map_or(1.0, |w| w.scalar_at(t, 1.0));
    if width <= 0.0 {
        return None;
    }
    let (rgb, alpha) = color_at(stroke.c.as_ref(), t);
    let opacity = alpha * stroke.o.as_ref().map_or(1.0, |o| o.scalar_at(t, 100.0) / 100.0);
    let cap = match stroke.lc {
        Some(2) => "round",
        Some(3) => "square",
        _ => "butt",
    };
    let join = match stroke.lj {
        Some(2) => "round",
        Some(3) => "bevel",
        _ => "miter",
    };
    Some(format!(
        r#"<path d="{}" fill="none" stroke="rgb({},{},{})" stroke-opacity="{}" stroke-width="{}" stroke-linecap="{}" stroke-linejoin="{}"/>"#,
        geometry.to_svg(),
        rgb[0],
        rgb[1],
        rgb[2],
        num(opacity.clamp(0.0, 1.0)),
        num(width),
        cap,
        join
    ))
}

/// Lottie colors are `[r, g, b, a?]` in `0..=1`; some exporters write `0..=255`.
fn color_at(prop: Option<&crate::render::lottie::Property>, t: f64) -> ([u8; 3], f64) {
    let Some(prop) = prop else {
        return ([0, 0, 0], 1.0);
    };
    let c = prop.numbers_at(t);
    let scale = if c.iter().take(3).any(|v| *v > 1.0) {
        255.0
    } else {
        1.0
    };
    let ch = |i: usize| unit_to_u8(c.get(i).copied().unwrap_or(0.0) / scale);
    let alpha = c.get(3).map_or(1.0, |a| (a / scale).clamp(0.0, 1.0));
    ([ch(0), ch(1), ch(2)], alpha)
}

fn vec_at(prop: Option<&crate::render::lottie::Property>, t: f64) -> kurbo::Vec2 {
    let v = prop.map(|p| p.numbers_at(t)).unwrap_or_default();
    match v.as_slice() {
        [x, y, ..] => kurbo::Vec2::new(*x, *y),
        [x] => kurbo::Vec2::new(*x, *x),
        [] => kurbo::Vec2::ZERO,
    }
}

fn open_group(out: &mut String, transform: Affine, opacity: f64) {
    let [a, b, c, d, e, f] = transform.as_coeffs();
    let _ = write!(
        out,
        r#"<g transform="matrix({} {} {} {} {} {})""#,
        num(a),
        num(b),
        num(c),
        num(d),
        num(e),
        num(f)
    );
    if opacity < 1.0 {
        let _ = write!(out, r#" opacity="{}""#, num(opacity));
    }
    out.push('>');
}

fn num(v: f64) -> String {
    if v.is_finite() {
        format!("{v}")
    } else {
        "0".to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
