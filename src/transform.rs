use egui::{vec2, Rect, Vec2};
use std::fmt;
use std::num::ParseFloatError;
use std::str::FromStr;

use crate::surface::Element;

/// Errors produced while parsing a computed transform value.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TransformError {
    /// The value is a transform function other than `matrix(..)`
    #[error("unsupported transform value `{0}`")]
    Unsupported(String),
    /// `matrix(..)` must have exactly six components
    #[error("expected 6 matrix components, found {0}")]
    ComponentCount(usize),
    /// A component is not a number
    #[error("matrix component {index} is not a number")]
    InvalidComponent {
        /// Position of the offending component
        index: usize,
        /// Underlying parse failure
        #[source]
        source: ParseFloatError,
    },
}

/// A 2D affine transform `[a, b, c, d, tx, ty]`, as reported by a computed
/// `transform` style.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    /// Horizontal scale
    pub a: f32,
    /// Vertical skew
    pub b: f32,
    /// Horizontal skew
    pub c: f32,
    /// Vertical scale
    pub d: f32,
    /// Horizontal translation
    pub tx: f32,
    /// Vertical translation
    pub ty: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    /// The identity transform, `matrix(1,0,0,1,0,0)`.
    pub const IDENTITY: Matrix = Matrix {
        a: 1.,
        b: 0.,
        c: 0.,
        d: 1.,
        tx: 0.,
        ty: 0.,
    };

    /// Build a matrix from its six components.
    pub fn from_parts(parts: [f32; 6]) -> Self {
        let [a, b, c, d, tx, ty] = parts;
        Self { a, b, c, d, tx, ty }
    }

    /// A pure translation.
    pub fn translation(tx: f32, ty: f32) -> Self {
        Self {
            tx,
            ty,
            ..Self::IDENTITY
        }
    }

    /// The six components in serialization order.
    pub fn parts(&self) -> [f32; 6] {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
    }

    /// Horizontal scale, ignoring skew.
    pub fn scale_x(&self) -> f32 {
        self.a
    }

    /// Vertical scale, ignoring skew.
    pub fn scale_y(&self) -> f32 {
        self.d
    }

    /// The translation components as a vector.
    pub fn offset(&self) -> Vec2 {
        vec2(self.tx, self.ty)
    }

    /// Copy of this matrix with its translation replaced.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.tx = offset.x;
        self.ty = offset.y;
        self
    }

    /// Map an untransformed layout box to where this transform paints it.
    ///
    /// The transform origin is the center of the box; skew is ignored.
    pub fn transform_rect(&self, rect: Rect) -> Rect {
        let size = vec2(rect.width() * self.a.abs(), rect.height() * self.d.abs());
        Rect::from_center_size(rect.center() + self.offset(), size)
    }

    /// Read the element's computed transform.
    ///
    /// An unset transform is the identity. Values that do not parse are
    /// logged and treated as the identity as well.
    pub fn read(element: &Element) -> Self {
        let computed = element.computed_transform();
        match computed.parse() {
            Ok(m) => m,
            Err(e) => {
                log::warn!("ignoring transform `{}` on {:?}: {}", computed, element.id(), e);
                Self::IDENTITY
            }
        }
    }

    /// Write this matrix to the element's inline transform.
    pub fn write(&self, element: &Element) {
        element.set_inline_transform(self.to_string());
    }
}

impl FromStr for Matrix {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == "none" {
            return Ok(Self::IDENTITY);
        }
        let inner = trimmed
            .strip_prefix("matrix(")
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| TransformError::Unsupported(trimmed.to_string()))?;

        let fields: Vec<&str> = inner.split(',').map(str::trim).collect();
        if fields.len() != 6 {
            return Err(TransformError::ComponentCount(fields.len()));
        }
        let mut parts = [0f32; 6];
        for (index, (slot, field)) in parts.iter_mut().zip(fields).enumerate() {
            *slot = field
                .parse()
                .map_err(|source| TransformError::InvalidComponent { index, source })?;
        }
        Ok(Self::from_parts(parts))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix({},{},{},{},{},{})",
            self.a, self.b, self.c, self.d, self.tx, self.ty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    #[test]
    fn none_is_identity() {
        assert_eq!("none".parse::<Matrix>(), Ok(Matrix::IDENTITY));
        assert_eq!("".parse::<Matrix>(), Ok(Matrix::IDENTITY));
    }

    #[test]
    fn parses_computed_style_with_spaces() {
        let m: Matrix = "matrix(3.5, 0, 0, 3.5, -60, -49)".parse().unwrap();
        assert_eq!(m, Matrix::from_parts([3.5, 0., 0., 3.5, -60., -49.]));
    }

    #[test]
    fn serializes_without_spaces_or_trailing_zeros() {
        let m = Matrix::from_parts([1., 0., 0., 1., 30., 15.]);
        assert_eq!(m.to_string(), "matrix(1,0,0,1,30,15)");
        assert_eq!(
            Matrix::from_parts([1.5, 0., 0., 2., -0.25, 4.]).to_string(),
            "matrix(1.5,0,0,2,-0.25,4)"
        );
    }

    #[test]
    fn rejects_other_transform_functions() {
        assert!(matches!(
            "translate(10px, 4px)".parse::<Matrix>(),
            Err(TransformError::Unsupported(_))
        ));
        assert_eq!(
            "matrix(1, 0, 0, 1)".parse::<Matrix>(),
            Err(TransformError::ComponentCount(4))
        );
        assert!(matches!(
            "matrix(1, 0, 0, 1, x, 0)".parse::<Matrix>(),
            Err(TransformError::InvalidComponent { index: 4, .. })
        ));
    }

    #[test]
    fn transform_rect_scales_about_center() {
        let m = Matrix::from_parts([2., 0., 0., 1., 10., 0.]);
        let r = m.transform_rect(Rect::from_min_max(pos2(0., 0.), pos2(10., 10.)));
        assert_eq!(r, Rect::from_min_max(pos2(5., 0.), pos2(25., 10.)));
    }
}
