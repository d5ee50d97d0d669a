use std::fmt;

use serde::Serialize;

use crate::path::Lexer;
use crate::types::Point;

/// 2D affine transform in SVG's `matrix(a b c d e f)` layout, applied to column vectors:
///
/// ```text
/// | a c e |   | x |
/// | b d f | * | y |
/// | 0 0 1 |   | 1 |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    pub fn scale(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    pub fn rotate(deg: f32) -> Self {
        let rad = deg.to_radians();
        let s = libm::sinf(rad);
        let c = libm::cosf(rad);
        Self {
            a: c,
            b: s,
            c: -s,
            d: c,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Rotation about `(cx, cy)`: translate, rotate, translate back.
    pub fn rotate_about(deg: f32, cx: f32, cy: f32) -> Self {
        Matrix::translate(cx, cy)
            .mul(Matrix::rotate(deg))
            .mul(Matrix::translate(-cx, -cy))
    }

    /// `self * other`: `other` is applied first.
    pub fn mul(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    pub fn apply_point(self, p: Point) -> Point {
        let (x, y) = self.apply(p.x, p.y);
        Point::new(x, y)
    }

    /// Linear part only; maps direction vectors.
    pub fn apply_vector(self, x: f32, y: f32) -> (f32, f32) {
        (self.a * x + self.c * y, self.b * x + self.d * y)
    }

    pub fn determinant(self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    pub fn scale_factor(self) -> f32 {
        // Area scale -> sqrt(|det|); used for stroke widths and font sizes.
        libm::sqrtf(self.determinant().abs())
    }

    pub fn x_axis_length(self) -> f32 {
        libm::hypotf(self.a, self.b)
    }

    pub fn y_axis_length(self) -> f32 {
        libm::hypotf(self.c, self.d)
    }

    /// Angle of the transformed X axis, in degrees.
    pub fn rotation_deg(self) -> f32 {
        libm::atan2f(self.b, self.a).to_degrees()
    }

    pub fn is_identity(self) -> bool {
        self == Self::IDENTITY
    }
}

/// Maps `(x, y)` through `matrix`.
pub fn apply(x: f32, y: f32, matrix: Matrix) -> Point {
    matrix.apply_point(Point::new(x, y))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformParseError {
    pub input: String,
    pub reason: String,
}

impl fmt::Display for TransformParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transform '{}': {}", self.input, self.reason)
    }
}

impl std::error::Error for TransformParseError {}

/// Parses a transform list and composes it under `parent`.
///
/// Malformed input never fails: the element simply keeps its parent's matrix.
pub fn parse_transform(input: &str, parent: Matrix) -> Matrix {
    match try_parse_transform(input) {
        Ok(local) => parent.mul(local),
        Err(_) => parent,
    }
}

/// Parses a transform list into its local matrix.
///
/// Functions compose left to right, so `translate(10) scale(2)` scales first and
/// translates second when applied to a point. Unknown function names are skipped.
pub fn try_parse_transform(input: &str) -> Result<Matrix, TransformParseError> {
    let err = |reason: &str| TransformParseError {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut out = Matrix::identity();
    let mut s = input.trim();

    while !s.is_empty() {
        let Some(open) = s.find('(') else {
            return Err(err("expected '(' after function name"));
        };
        let name = s[..open].trim();
        if name.is_empty() || !name.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(err("invalid function name"));
        }
        let Some(close) = s[open + 1..].find(')') else {
            return Err(err("missing ')'"));
        };
        let args_str = &s[open + 1..open + 1 + close];
        let args = parse_number_list(args_str).ok_or_else(|| err("non-numeric argument"))?;

        let m = match name {
            "translate" => match args.as_slice() {
                [tx] => Matrix::translate(*tx, 0.0),
                [tx, ty] => Matrix::translate(*tx, *ty),
                _ => return Err(err("translate takes 1 or 2 arguments")),
            },
            "scale" => match args.as_slice() {
                [s] => Matrix::scale(*s, *s),
                [sx, sy] => Matrix::scale(*sx, *sy),
                _ => return Err(err("scale takes 1 or 2 arguments")),
            },
            "rotate" => match args.as_slice() {
                [deg] => Matrix::rotate(*deg),
                [deg, cx, cy] => Matrix::rotate_about(*deg, *cx, *cy),
                _ => return Err(err("rotate takes 1 or 3 arguments")),
            },
            "matrix" => match args.as_slice() {
                [a, b, c, d, e, f] => Matrix::new(*a, *b, *c, *d, *e, *f),
                _ => return Err(err("matrix takes 6 arguments")),
            },
            _ => Matrix::identity(),
        };

        out = out.mul(m);
        s = s[open + 1 + close + 1..].trim_start_matches(|c: char| c.is_whitespace() || c == ',');
    }

    Ok(out)
}

fn parse_number_list(input: &str) -> Option<Vec<f32>> {
    let mut lexer = Lexer::new(input);
    let mut out = Vec::new();
    while !lexer.at_end() {
        out.push(lexer.next_number()?);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        a.approx_eq(b, 1e-4)
    }

    #[test]
    fn translate_defaults_ty_to_zero() {
        let m = try_parse_transform("translate(5)").unwrap();
        assert_eq!(m.apply_point(Point::new(1.0, 1.0)), Point::new(6.0, 1.0));
    }

    #[test]
    fn scale_defaults_sy_to_sx() {
        let m = try_parse_transform("scale(3)").unwrap();
        assert_eq!(m.apply_point(Point::new(1.0, 2.0)), Point::new(3.0, 6.0));
    }

    #[test]
    fn rotate_about_pivot_keeps_pivot_fixed() {
        let m = try_parse_transform("rotate(90, 10, 10)").unwrap();
        assert!(close(m.apply_point(Point::new(10.0, 10.0)), Point::new(10.0, 10.0)));
        assert!(close(m.apply_point(Point::new(20.0, 10.0)), Point::new(10.0, 20.0)));
    }

    #[test]
    fn functions_apply_right_to_left_on_points() {
        // Scale first, then translate.
        let m = try_parse_transform("translate(10,0) scale(2)").unwrap();
        assert!(close(m.apply_point(Point::new(1.0, 1.0)), Point::new(12.0, 2.0)));
    }

    #[test]
    fn nested_parse_matches_manual_premultiplication() {
        let outer = parse_transform("translate(10 20)", Matrix::identity());
        let inner = parse_transform("rotate(30) scale(2,0.5)", outer);
        let manual = Matrix::translate(10.0, 20.0)
            .mul(Matrix::rotate(30.0))
            .mul(Matrix::scale(2.0, 0.5));
        for p in [Point::new(0.0, 0.0), Point::new(3.0, -4.0), Point::new(1e3, 7.5)] {
            assert!(close(inner.apply_point(p), manual.apply_point(p)));
        }
    }

    #[test]
    fn matrix_sets_raw_affine_and_accepts_exponents() {
        let m = try_parse_transform("matrix(1 0 0 1 1e1 -2.5E0)").unwrap();
        assert_eq!(m, Matrix::translate(10.0, -2.5));
    }

    #[test]
    fn unknown_functions_are_ignored() {
        let m = try_parse_transform("skewX(30) translate(1,2)").unwrap();
        assert_eq!(m, Matrix::translate(1.0, 2.0));
    }

    #[test]
    fn malformed_input_falls_back_to_parent() {
        let parent = Matrix::translate(3.0, 4.0);
        assert!(try_parse_transform("translate(1,2").is_err());
        assert!(try_parse_transform("matrix(1,2,3)").is_err());
        assert!(try_parse_transform("scale(abc)").is_err());
        assert_eq!(parse_transform("translate(1,2", parent), parent);
        assert_eq!(parse_transform("", parent), parent);
    }

    #[test]
    fn comma_separated_function_list_is_accepted() {
        let m = try_parse_transform("translate(1,1), scale(2)").unwrap();
        assert_eq!(m.apply_point(Point::new(1.0, 1.0)), Point::new(3.0, 3.0));
    }

    #[test]
    fn apply_is_deterministic() {
        let m = parse_transform("rotate(17) translate(3,9)", Matrix::identity());
        let a = apply(4.25, -1.5, m);
        let b = apply(4.25, -1.5, m);
        assert_eq!(a, b);
    }
}
