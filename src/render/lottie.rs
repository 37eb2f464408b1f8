//! Typed view over the subset of the Lottie document the built-in scene understands.

use kurbo::{Affine, BezPath, Vec2};
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct LottieDocument {
    #[serde(default)]
    pub w: Option<f64>,
    #[serde(default)]
    pub h: Option<f64>,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl LottieDocument {
    /// Count layers and shape items the scene will skip.
    pub fn unsupported_count(&self) -> usize {
        fn in_items(items: &[ShapeItem]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    ShapeItem::Group(g) => in_items(&g.it),
                    ShapeItem::Unsupported => 1,
                    _ => 0,
                })
                .sum()
        }

        self.layers
            .iter()
            .map(|layer| match layer.kind() {
                LayerKind::Shape => in_items(&layer.shapes),
                LayerKind::Solid | LayerKind::Null => 0,
                LayerKind::Unsupported(_) => 1,
            })
            .sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LayerKind {
    Solid,
    Null,
    Shape,
    Unsupported(u32),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct Layer {
    #[serde(default)]
    pub ty: u32,
    #[serde(default)]
    pub ind: Option<i64>,
    #[serde(default)]
    pub parent: Option<i64>,
    #[serde(default)]
    pub ip: Option<f64>,
    #[serde(default)]
    pub op: Option<f64>,
    #[serde(default)]
    pub st: f64,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub ks: TransformProps,
    #[serde(default)]
    pub shapes: Vec<ShapeItem>,
    #[serde(default)]
    pub sc: Option<String>,
    #[serde(default)]
    pub sw: Option<f64>,
    #[serde(default)]
    pub sh: Option<f64>,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self.ty {
            1 => LayerKind::Solid,
            3 => LayerKind::Null,
            4 => LayerKind::Shape,
            other => LayerKind::Unsupported(other),
        }
    }

    pub fn visible_at(&self, frame: f64) -> bool {
        !self.hd && self.ip.is_none_or(|ip| frame >= ip) && self.op.is_none_or(|op| frame < op)
    }

    /// Layer-local time for property sampling.
    pub fn local_time(&self, frame: f64) -> f64 {
        frame - self.st
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "ty")]
pub(crate) enum ShapeItem {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "fl")]
    Fill(FillShape),
    #[serde(rename = "st")]
    Stroke(StrokeShape),
    #[serde(rename = "tr")]
    Transform(TransformProps),
    #[serde(other)]
    Unsupported,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct GroupShape {
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub it: Vec<ShapeItem>,
}

impl GroupShape {
    pub fn transform(&self) -> Option<&TransformProps> {
        self.it.iter().find_map(|item| match item {
            ShapeItem::Transform(tr) => Some(tr),
            _ => None,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RectShape {
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub p: Option<Property>,
    #[serde(default)]
    pub s: Option<Property>,
    #[serde(default)]
    pub r: Option<Property>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct EllipseShape {
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub p: Option<Property>,
    #[serde(default)]
    pub s: Option<Property>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct PathShape {
    #[serde(default)]
    pub hd: bool,
    pub ks: Property,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct FillShape {
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub c: Option<Property>,
    #[serde(default)]
    pub o: Option<Property>,
    /// 1 = nonzero, 2 = evenodd.
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct StrokeShape {
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub c: Option<Property>,
    #[serde(default)]
    pub o: Option<Property>,
    #[serde(default)]
    pub w: Option<Property>,
    #[serde(default)]
    pub lc: Option<u8>,
    #[serde(default)]
    pub lj: Option<u8>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct TransformProps {
    #[serde(default)]
    pub a: Option<Property>,
    #[serde(default)]
    pub p: Option<Position>,
    #[serde(default)]
    pub s: Option<Property>,
    #[serde(default)]
    pub r: Option<Property>,
    #[serde(default)]
    pub o: Option<Property>,
}

impl TransformProps {
    /// `T(position) * R(rotation) * S(scale) * T(-anchor)`.
    pub fn affine_at(&self, t: f64) -> Affine {
        let anchor = vec2_or(self.a.as_ref(), t, Vec2::ZERO);
        let position = match &self.p {
            Some(Position::Split { x, y }) => Vec2::new(x.scalar_at(t, 0.0), y.scalar_at(t, 0.0)),
            Some(Position::Unified(p)) => vec2_or(Some(p), t, Vec2::ZERO),
            None => Vec2::ZERO,
        };
        let scale = vec2_or(self.s.as_ref(), t, Vec2::new(100.0, 100.0)) / 100.0;
        let rotation = self.r.as_ref().map_or(0.0, |r| r.scalar_at(t, 0.0));

        Affine::translate(position)
            * Affine::rotate(rotation.to_radians())
            * Affine::scale_non_uniform(scale.x, scale.y)
            * Affine::translate(-anchor)
    }

    /// Opacity in `0..=1`.
    pub fn opacity_at(&self, t: f64) -> f64 {
        (self.o.as_ref().map_or(100.0, |o| o.scalar_at(t, 100.0)) / 100.0).clamp(0.0, 1.0)
    }
}

fn vec2_or(prop: Option<&Property>, t: f64, default: Vec2) -> Vec2 {
    let Some(prop) = prop else {
        return default;
    };
    let v = prop.numbers_at(t);
    match v.as_slice() {
        [x, y, ..] => Vec2::new(*x, *y),
        [x] => Vec2::new(*x, *x),
        [] => default,
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Position {
    Split { x: Property, y: Property },
    Unified(Property),
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Keyframe {
    pub t: f64,
    #[serde(default)]
    pub s: Option<Value>,
    #[serde(default)]
    pub e: Option<Value>,
    #[serde(default)]
    pub h: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(default)]
    k: Value,
}

/// A static or keyframed property value.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "RawProperty")]
pub(crate) enum Property {
    Static(Value),
    Animated(Vec<Keyframe>),
}

impl From<RawProperty> for Property {
    fn from(raw: RawProperty) -> Self {
        let is_keyframed = raw
            .k
            .as_array()
            .and_then(|a| a.first())
            .is_some_and(|first| first.get("t").is_some());
        if is_keyframed
            && let Ok(keys) = Vec::<Keyframe>::deserialize(&raw.k)
        {
            return Self::Animated(keys);
        }
        Self::Static(raw.k)
    }
}

/// Value span active at some time: interpolate `from -> to` by `progress`.
struct Span<'a> {
    from: &'a Value,
    to: Option<&'a Value>,
    progress: f64,
}

impl Property {
    fn span_at(&self, t: f64) -> Option<Span<'_>> {
        let keys = match self {
            Self::Static(v) => {
                return Some(Span {
                    from: v,
                    to: None,
                    progress: 0.0,
                });
            }
            Self::Animated(keys) => keys,
        };

        let first = keys.first()?;
        if t <= first.t {
            return first.s.as_ref().map(|from| Span {
                from,
                to: None,
                progress: 0.0,
            });
        }

        for pair in keys.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if t >= b.t {
                continue;
            }
            let from = a.s.as_ref()?;
            if a.h == Some(1) || b.t <= a.t {
                return Some(Span {
                    from,
                    to: None,
                    progress: 0.0,
                });
            }
            return Some(Span {
                from,
                to: a.e.as_ref().or(b.s.as_ref()),
                progress: (t - a.t) / (b.t - a.t),
            });
        }

        // Past the last keyframe. Older exports leave the final `s` empty and carry the
        // value in the previous keyframe's `e`.
        let last = keys.last()?;
        let from = last.s.as_ref().or_else(|| {
            keys.len()
                .checked_sub(2)
                .and_then(|i| keys[i].e.as_ref().or(keys[i].s.as_ref()))
        })?;
        Some(Span {
            from,
            to: None,
            progress: 0.0,
        })
    }

    /// Sample as a numeric vector (scalars come back as one element).
    pub fn numbers_at(&self, t: f64) -> Vec<f64> {
        let Some(span) = self.span_at(t) else {
            return Vec::new();
        };
        let from = numbers(span.from);
        match span.to.map(numbers) {
            Some(to) if to.len() == from.len() => from
                .iter()
                .zip(&to)
                .map(|(a, b)| a + (b - a) * span.progress)
                .collect(),
            _ => from,
        }
    }

    pub fn scalar_at(&self, t: f64, default: f64) -> f64 {
        self.numbers_at(t).first().copied().unwrap_or(default)
    }

    /// Sample as a bezier path shape.
    pub fn bezier_at(&self, t: f64) -> Option<BezierShape> {
        let span = self.span_at(t)?;
        let from = BezierShape::from_value(span.from)?;
        match span.to.and_then(BezierShape::from_value) {
            Some(to) => Some(from.lerp(&to, span.progress)),
            None => Some(from),
        }
    }
}

fn numbers(v: &Value) -> Vec<f64> {
    match v {
        Value::Number(n) => n.as_f64().into_iter().collect(),
        Value::Array(items) => items.iter().filter_map(Value::as_f64).collect(),
        _ => Vec::new(),
    }
}

/// Lottie path data: vertices `v` with relative in/out tangents `i`/`o`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub(crate) struct BezierShape {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec<f64>>,
    #[serde(default)]
    pub o: Vec<Vec<f64>>,
    #[serde(default)]
    pub v: Vec<Vec<f64>>,
}

impl BezierShape {
    fn from_value(v: &Value) -> Option<Self> {
        // Keyframe values wrap the shape in a one-element array.
        let obj = match v {
            Value::Array(items) => items.first()?,
            other => other,
        };
        Self::deserialize(obj).ok()
    }

    fn lerp(&self, to: &Self, t: f64) -> Self {
        let same_topology = self.c == to.c
            && self.v.len() == to.v.len()
            && self.i.len() == to.i.len()
            && self.o.len() == to.o.len();
        if !same_topology {
            return self.clone();
        }
        let mix = |a: &[Vec<f64>], b: &[Vec<f64>]| -> Vec<Vec<f64>> {
            a.iter()
                .zip(b)
                .map(|(pa, pb)| pa.iter().zip(pb).map(|(x, y)| x + (y - x) * t).collect())
                .collect()
        };
        Self {
            c: self.c,
            i: mix(&self.i, &to.i),
            o: mix(&self.o, &to.o),
            v: mix(&self.v, &to.v),
        }
    }

    pub fn to_bez_path(&self) -> BezPath {
        fn pt(v: Option<&Vec<f64>>) -> Vec2 {
            match v.map(Vec::as_slice) {
                Some([x, y, ..]) => Vec2::new(*x, *y),
                _ => Vec2::ZERO,
            }
        }

        let mut path = BezPath::new();
        let n = self.v.len();
        if n == 0 {
            return path;
        }

        path.move_to(pt(self.v.first()).to_point());
        let segments = if self.c { n } else { n - 1 };
        for idx in 0..segments {
            let next = (idx + 1) % n;
            let p0 = pt(self.v.get(idx));
            let p1 = pt(self.v.get(next));
            let c0 = p0 + pt(self.o.get(idx));
            let c1 = p1 + pt(self.i.get(next));
            path.curve_to(c0.to_point(), c1.to_point(), p1.to_point());
        }
        if self.c {
            path.close_path();
        }
        path
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/lottie.rs"]
mod tests;
