use std::fmt;

use serde::Serialize;

use crate::transform::Matrix;
use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CubicSegment {
    pub start: Point,
    pub cp1: Point,
    pub cp2: Point,
    pub end: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadSegment {
    pub start: Point,
    pub cp: Point,
    pub end: Point,
}

impl QuadSegment {
    /// Degree elevation to an equivalent cubic.
    pub fn to_cubic(self) -> CubicSegment {
        CubicSegment {
            start: self.start,
            cp1: self.start.lerp(self.cp, 2.0 / 3.0),
            cp2: self.end.lerp(self.cp, 2.0 / 3.0),
            end: self.end,
        }
    }
}

/// Raw SVG elliptical arc; conversion to curves happens during synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArcSegment {
    pub start: Point,
    pub end: Point,
    pub rx: f32,
    pub ry: f32,
    pub rotation: f32,
    pub large_arc: bool,
    pub sweep: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "segments")]
pub enum PathCommand {
    MoveTo(Vec<Point>),
    LineTo(Vec<Point>),
    CubicCurve(Vec<CubicSegment>),
    QuadraticCurve(Vec<QuadSegment>),
    Arc(Vec<ArcSegment>),
    Close,
}

impl PathCommand {
    /// Final pen position after this command, if it moves the pen.
    pub fn end_point(&self) -> Option<Point> {
        match self {
            PathCommand::MoveTo(points) | PathCommand::LineTo(points) => points.last().copied(),
            PathCommand::CubicCurve(segs) => segs.last().map(|s| s.end),
            PathCommand::QuadraticCurve(segs) => segs.last().map(|s| s.end),
            PathCommand::Arc(segs) => segs.last().map(|s| s.end),
            PathCommand::Close => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathError {
    /// Path data must begin with `M` or `m`.
    MissingMoveTo,
    UnexpectedToken { offset: usize, found: char },
    MissingParameters { offset: usize, command: char },
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathError::MissingMoveTo => write!(f, "path data does not start with a moveto"),
            PathError::UnexpectedToken { offset, found } => {
                write!(f, "unexpected '{}' at offset {}", found, offset)
            }
            PathError::MissingParameters { offset, command } => {
                write!(
                    f,
                    "incomplete parameters for '{}' at offset {}",
                    command, offset
                )
            }
        }
    }
}

impl std::error::Error for PathError {}

/// Parses SVG path data into normalized commands, mapping every emitted point through
/// `transform`.
pub fn parse_path(d: &str, transform: Matrix) -> Result<Vec<PathCommand>, PathError> {
    PathCommands::new(d, transform).collect()
}

/// Lazy, single-pass interpreter over path data. Stops after the first error.
pub struct PathCommands<'a> {
    lexer: Lexer<'a>,
    transform: Matrix,
    // Pen state is kept in untransformed path coordinates.
    current: Point,
    subpath_start: Point,
    last_cubic_cp2: Option<Point>,
    last_quad_cp: Option<Point>,
    started: bool,
    pending: Option<PathCommand>,
    done: bool,
}

impl<'a> PathCommands<'a> {
    pub fn new(d: &'a str, transform: Matrix) -> Self {
        Self {
            lexer: Lexer::new(d),
            transform,
            current: Point::default(),
            subpath_start: Point::default(),
            last_cubic_cp2: None,
            last_quad_cp: None,
            started: false,
            pending: None,
            done: false,
        }
    }

    fn map_point(&self, p: Point) -> Point {
        self.transform.apply_point(p)
    }

    fn resolve(&self, rel: bool, x: f32, y: f32) -> Point {
        if rel {
            Point::new(self.current.x + x, self.current.y + y)
        } else {
            Point::new(x, y)
        }
    }

    fn step(&mut self) -> Result<Option<PathCommand>, PathError> {
        if self.lexer.at_end() {
            return Ok(None);
        }
        let offset = self.lexer.offset();
        let Some(letter) = self.lexer.next_command() else {
            let found = self.lexer.peek_char().unwrap_or('?');
            if !self.started {
                return Err(PathError::MissingMoveTo);
            }
            return Err(PathError::UnexpectedToken { offset, found });
        };
        if !self.started {
            if !matches!(letter, 'M' | 'm') {
                return Err(PathError::MissingMoveTo);
            }
            self.started = true;
        }

        let rel = letter.is_ascii_lowercase();
        let cmd = match letter.to_ascii_uppercase() {
            'M' => self.move_to(rel, letter)?,
            'L' => self.line_to(rel, letter)?,
            'H' => self.axis_line_to(rel, letter, true)?,
            'V' => self.axis_line_to(rel, letter, false)?,
            'C' => self.cubic(rel, letter)?,
            'S' => self.smooth_cubic(rel, letter)?,
            'Q' => self.quadratic(rel, letter)?,
            'T' => self.smooth_quadratic(rel, letter)?,
            'A' => self.arc(rel, letter)?,
            'Z' => self.close(),
            _ => {
                return Err(PathError::UnexpectedToken {
                    offset,
                    found: letter,
                });
            }
        };
        Ok(Some(cmd))
    }

    fn missing(&self, command: char) -> PathError {
        PathError::MissingParameters {
            offset: self.lexer.offset(),
            command,
        }
    }

    /// Reads one group of `N` numbers, or `None` when no further group starts here.
    fn group<const N: usize>(&mut self, command: char) -> Result<Option<[f32; N]>, PathError> {
        if !self.lexer.at_number() {
            return Ok(None);
        }
        let mut out = [0.0; N];
        for slot in out.iter_mut() {
            *slot = self.lexer.next_number().ok_or_else(|| self.missing(command))?;
        }
        Ok(Some(out))
    }

    fn move_to(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        let [x, y] = self.group::<2>(letter)?.ok_or_else(|| self.missing(letter))?;
        let p = self.resolve(rel, x, y);
        self.current = p;
        self.subpath_start = p;
        self.last_cubic_cp2 = None;
        self.last_quad_cp = None;

        // Extra pairs are implicit linetos.
        let mut implicit = Vec::new();
        while let Some([x, y]) = self.group::<2>(letter)? {
            let q = self.resolve(rel, x, y);
            self.current = q;
            implicit.push(self.map_point(q));
        }
        if !implicit.is_empty() {
            self.pending = Some(PathCommand::LineTo(implicit));
        }
        Ok(PathCommand::MoveTo(vec![self.map_point(p)]))
    }

    fn line_to(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        self.last_cubic_cp2 = None;
        self.last_quad_cp = None;
        let mut points = Vec::new();
        while let Some([x, y]) = self.group::<2>(letter)? {
            let p = self.resolve(rel, x, y);
            self.current = p;
            points.push(self.map_point(p));
        }
        if points.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::LineTo(points))
    }

    fn axis_line_to(
        &mut self,
        rel: bool,
        letter: char,
        horizontal: bool,
    ) -> Result<PathCommand, PathError> {
        self.last_cubic_cp2 = None;
        self.last_quad_cp = None;
        let mut points = Vec::new();
        while let Some([v]) = self.group::<1>(letter)? {
            let p = match (horizontal, rel) {
                (true, true) => Point::new(self.current.x + v, self.current.y),
                (true, false) => Point::new(v, self.current.y),
                (false, true) => Point::new(self.current.x, self.current.y + v),
                (false, false) => Point::new(self.current.x, v),
            };
            self.current = p;
            points.push(self.map_point(p));
        }
        if points.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::LineTo(points))
    }

    fn push_cubic(&mut self, segs: &mut Vec<CubicSegment>, cp1: Point, cp2: Point, end: Point) {
        segs.push(CubicSegment {
            start: self.map_point(self.current),
            cp1: self.map_point(cp1),
            cp2: self.map_point(cp2),
            end: self.map_point(end),
        });
        self.current = end;
        self.last_cubic_cp2 = Some(cp2);
    }

    fn cubic(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        self.last_quad_cp = None;
        let mut segs = Vec::new();
        while let Some([x1, y1, x2, y2, x, y]) = self.group::<6>(letter)? {
            let cp1 = self.resolve(rel, x1, y1);
            let cp2 = self.resolve(rel, x2, y2);
            let end = self.resolve(rel, x, y);
            self.push_cubic(&mut segs, cp1, cp2, end);
        }
        if segs.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::CubicCurve(segs))
    }

    fn smooth_cubic(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        self.last_quad_cp = None;
        let mut segs = Vec::new();
        while let Some([x2, y2, x, y]) = self.group::<4>(letter)? {
            let cp1 = match self.last_cubic_cp2 {
                Some(prev) => self.current.reflect(prev),
                None => self.current,
            };
            let cp2 = self.resolve(rel, x2, y2);
            let end = self.resolve(rel, x, y);
            self.push_cubic(&mut segs, cp1, cp2, end);
        }
        if segs.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::CubicCurve(segs))
    }

    fn push_quad(&mut self, segs: &mut Vec<QuadSegment>, cp: Point, end: Point) {
        segs.push(QuadSegment {
            start: self.map_point(self.current),
            cp: self.map_point(cp),
            end: self.map_point(end),
        });
        self.current = end;
        self.last_quad_cp = Some(cp);
    }

    fn quadratic(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        self.last_cubic_cp2 = None;
        let mut segs = Vec::new();
        while let Some([x1, y1, x, y]) = self.group::<4>(letter)? {
            let cp = self.resolve(rel, x1, y1);
            let end = self.resolve(rel, x, y);
            self.push_quad(&mut segs, cp, end);
        }
        if segs.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::QuadraticCurve(segs))
    }

    fn smooth_quadratic(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        self.last_cubic_cp2 = None;
        let mut segs = Vec::new();
        while let Some([x, y]) = self.group::<2>(letter)? {
            let cp = match self.last_quad_cp {
                Some(prev) => self.current.reflect(prev),
                None => self.current,
            };
            let end = self.resolve(rel, x, y);
            self.push_quad(&mut segs, cp, end);
        }
        if segs.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::QuadraticCurve(segs))
    }

    fn arc(&mut self, rel: bool, letter: char) -> Result<PathCommand, PathError> {
        self.last_cubic_cp2 = None;
        self.last_quad_cp = None;
        let rx_scale = self.transform.x_axis_length();
        let ry_scale = self.transform.y_axis_length();
        let rotation_offset = self.transform.rotation_deg();

        let mut segs = Vec::new();
        while self.lexer.at_number() {
            let rx = self.lexer.next_number();
            let ry = self.lexer.next_number();
            let rot = self.lexer.next_number();
            let (Some(rx), Some(ry), Some(rot)) = (rx, ry, rot) else {
                return Err(self.missing(letter));
            };
            let (Some(large), Some(sweep)) = (self.lexer.next_arc_flag(), self.lexer.next_arc_flag())
            else {
                return Err(self.missing(letter));
            };
            let (Some(x), Some(y)) = (self.lexer.next_number(), self.lexer.next_number()) else {
                return Err(self.missing(letter));
            };
            let end = self.resolve(rel, x, y);
            segs.push(ArcSegment {
                start: self.map_point(self.current),
                end: self.map_point(end),
                rx: rx.abs() * rx_scale,
                ry: ry.abs() * ry_scale,
                rotation: rot + rotation_offset,
                large_arc: large,
                sweep,
            });
            self.current = end;
        }
        if segs.is_empty() {
            return Err(self.missing(letter));
        }
        Ok(PathCommand::Arc(segs))
    }

    fn close(&mut self) -> PathCommand {
        self.last_cubic_cp2 = None;
        self.last_quad_cp = None;
        let needs_line = self.current != self.subpath_start;
        self.current = self.subpath_start;
        if needs_line {
            self.pending = Some(PathCommand::Close);
            PathCommand::LineTo(vec![self.map_point(self.subpath_start)])
        } else {
            PathCommand::Close
        }
    }
}

impl Iterator for PathCommands<'_> {
    type Item = Result<PathCommand, PathError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(cmd) = self.pending.take() {
            return Some(Ok(cmd));
        }
        if self.done {
            return None;
        }
        match self.step() {
            Ok(Some(cmd)) => Some(Ok(cmd)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                self.pending = None;
                Some(Err(err))
            }
        }
    }
}

/// Number/command tokenizer shared by path data and transform lists.
pub(crate) struct Lexer<'a> {
    bytes: &'a [u8],
    i: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            i: 0,
        }
    }

    pub(crate) fn offset(&self) -> usize {
        self.i
    }

    fn skip_ws(&mut self) {
        while self.i < self.bytes.len() {
            let b = self.bytes[self.i];
            if b == b' ' || b == b'\n' || b == b'\r' || b == b'\t' || b == b',' {
                self.i += 1;
            } else {
                break;
            }
        }
    }

    pub(crate) fn at_end(&mut self) -> bool {
        self.skip_ws();
        self.i >= self.bytes.len()
    }

    pub(crate) fn peek_char(&mut self) -> Option<char> {
        self.skip_ws();
        self.bytes.get(self.i).map(|b| *b as char)
    }

    /// True when the next token starts a number.
    pub(crate) fn at_number(&mut self) -> bool {
        matches!(
            self.peek_char(),
            Some('0'..='9') | Some('+') | Some('-') | Some('.')
        )
    }

    pub(crate) fn next_command(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        if c.is_ascii_alphabetic() {
            self.i += 1;
            return Some(c);
        }
        None
    }

    pub(crate) fn next_number(&mut self) -> Option<f32> {
        self.skip_ws();
        if self.i >= self.bytes.len() {
            return None;
        }
        let start = self.i;
        let mut has = false;

        if matches!(self.bytes[self.i], b'+' | b'-') {
            self.i += 1;
        }
        while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
            self.i += 1;
            has = true;
        }
        if self.i < self.bytes.len() && self.bytes[self.i] == b'.' {
            self.i += 1;
            while self.i < self.bytes.len() && self.bytes[self.i].is_ascii_digit() {
                self.i += 1;
                has = true;
            }
        }
        if !has {
            self.i = start;
            return None;
        }
        // Exponent only when digits follow, so `1e` stays a number plus a letter.
        if self.i < self.bytes.len() && matches!(self.bytes[self.i], b'e' | b'E') {
            let mut j = self.i + 1;
            if j < self.bytes.len() && matches!(self.bytes[j], b'+' | b'-') {
                j += 1;
            }
            if j < self.bytes.len() && self.bytes[j].is_ascii_digit() {
                while j < self.bytes.len() && self.bytes[j].is_ascii_digit() {
                    j += 1;
                }
                self.i = j;
            }
        }

        let s = std::str::from_utf8(&self.bytes[start..self.i]).ok()?;
        match s.parse::<f32>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                self.i = start;
                None
            }
        }
    }

    /// Arc flags may be packed without separators (`a5 5 0 01 20 20`).
    pub(crate) fn next_arc_flag(&mut self) -> Option<bool> {
        self.skip_ws();
        match self.bytes.get(self.i) {
            Some(b'0') => {
                self.i += 1;
                Some(false)
            }
            Some(b'1') => {
                self.i += 1;
                Some(true)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    fn parse(d: &str) -> Vec<PathCommand> {
        parse_path(d, Matrix::identity()).expect("path should parse")
    }

    #[test]
    fn closed_triangle_normalizes_with_implicit_closing_line() {
        let cmds = parse("M0,0 L10,0 L10,10 Z");
        assert_eq!(
            cmds,
            vec![
                PathCommand::MoveTo(vec![p(0.0, 0.0)]),
                PathCommand::LineTo(vec![p(10.0, 0.0)]),
                PathCommand::LineTo(vec![p(10.0, 10.0)]),
                PathCommand::LineTo(vec![p(0.0, 0.0)]),
                PathCommand::Close,
            ]
        );
    }

    #[test]
    fn close_at_start_point_emits_only_close_marker() {
        let cmds = parse("M0 0 L10 0 L0 0 z");
        assert_eq!(cmds.last(), Some(&PathCommand::Close));
        assert_eq!(cmds[cmds.len() - 2], PathCommand::LineTo(vec![p(0.0, 0.0)]));
        assert_eq!(cmds.len(), 4);
    }

    #[test]
    fn absolute_endpoints_round_trip_exactly() {
        let d = "M 1.5 2.25 L 10.125 -3 C 1 2 3 4 5.5 6.75 Q 7 8 9.5 -10 A 5 5 0 1 0 42.25 17";
        let cmds = parse(d);
        let ends: Vec<Point> = cmds.iter().filter_map(PathCommand::end_point).collect();
        assert_eq!(
            ends,
            vec![
                p(1.5, 2.25),
                p(10.125, -3.0),
                p(5.5, 6.75),
                p(9.5, -10.0),
                p(42.25, 17.0),
            ]
        );
    }

    #[test]
    fn relative_commands_accumulate_from_current_point() {
        let cmds = parse("m10 10 l5 0 h5 v-5 l-10 0");
        let ends: Vec<Point> = cmds.iter().filter_map(PathCommand::end_point).collect();
        assert_eq!(
            ends,
            vec![p(10.0, 10.0), p(15.0, 10.0), p(20.0, 10.0), p(20.0, 5.0), p(10.0, 5.0)]
        );
    }

    #[test]
    fn moveto_extra_pairs_become_lineto() {
        let cmds = parse("M0 0 10 0 10 10");
        assert_eq!(
            cmds,
            vec![
                PathCommand::MoveTo(vec![p(0.0, 0.0)]),
                PathCommand::LineTo(vec![p(10.0, 0.0), p(10.0, 10.0)]),
            ]
        );
    }

    #[test]
    fn repeated_groups_accumulate_into_one_command() {
        let cmds = parse("M0 0 L1 1 2 2 3 3");
        assert_eq!(
            cmds[1],
            PathCommand::LineTo(vec![p(1.0, 1.0), p(2.0, 2.0), p(3.0, 3.0)])
        );
    }

    #[test]
    fn smooth_cubic_reflects_previous_second_control_point() {
        let cmds = parse("M0 0 C 10 0 20 10 30 10 S 50 20 60 20");
        let PathCommand::CubicCurve(c) = &cmds[1] else {
            panic!("expected cubic");
        };
        let PathCommand::CubicCurve(s) = &cmds[2] else {
            panic!("expected smooth cubic");
        };
        let current = c[0].end;
        let expected = p(2.0 * current.x - c[0].cp2.x, 2.0 * current.y - c[0].cp2.y);
        assert!(s[0].cp1.approx_eq(expected, 1e-5));
        assert_eq!(s[0].start, current);
    }

    #[test]
    fn smooth_cubic_without_previous_curve_uses_current_point() {
        let cmds = parse("M5 5 L 10 10 S 20 20 30 10");
        let PathCommand::CubicCurve(s) = &cmds[2] else {
            panic!("expected cubic");
        };
        assert_eq!(s[0].cp1, p(10.0, 10.0));
    }

    #[test]
    fn smooth_quadratic_chains_reflections() {
        let cmds = parse("M0 0 Q 10 10 20 0 T 40 0 T 60 0");
        let PathCommand::QuadraticCurve(first) = &cmds[2] else {
            panic!("expected quadratic");
        };
        let PathCommand::QuadraticCurve(second) = &cmds[3] else {
            panic!("expected second quadratic");
        };
        assert_eq!(first[0].cp, p(30.0, -10.0));
        assert_eq!(second[0].cp, p(50.0, 10.0));
    }

    #[test]
    fn restated_smooth_quadratic_coordinates_share_one_command() {
        let cmds = parse("M0 0 Q 10 10 20 0 T 40 0 60 0");
        assert_eq!(cmds.len(), 3);
        let PathCommand::QuadraticCurve(t) = &cmds[2] else {
            panic!("expected quadratic");
        };
        assert_eq!(t.len(), 2);
        assert_eq!(t[0].cp, p(30.0, -10.0));
        assert_eq!(t[1].cp, p(50.0, 10.0));
    }

    #[test]
    fn quadratic_to_cubic_uses_two_thirds_rule() {
        let q = QuadSegment {
            start: p(0.0, 0.0),
            cp: p(30.0, 30.0),
            end: p(60.0, 0.0),
        };
        let c = q.to_cubic();
        assert!(c.cp1.approx_eq(p(20.0, 20.0), 1e-5));
        assert!(c.cp2.approx_eq(p(40.0, 20.0), 1e-5));
    }

    #[test]
    fn arcs_keep_raw_parameters_and_compact_flags() {
        let cmds = parse("M10 10 A5 6 30 01 20 20");
        let PathCommand::Arc(a) = &cmds[1] else {
            panic!("expected arc");
        };
        assert_eq!(a[0].start, p(10.0, 10.0));
        assert_eq!(a[0].end, p(20.0, 20.0));
        assert_eq!((a[0].rx, a[0].ry, a[0].rotation), (5.0, 6.0, 30.0));
        assert!(!a[0].large_arc);
        assert!(a[0].sweep);
    }

    #[test]
    fn compact_number_forms_tokenize() {
        let cmds = parse("M.5.5L-1-2l1e1-1E0");
        let ends: Vec<Point> = cmds.iter().filter_map(PathCommand::end_point).collect();
        assert_eq!(ends, vec![p(0.5, 0.5), p(-1.0, -2.0), p(9.0, -3.0)]);
    }

    #[test]
    fn emitted_points_pass_through_transform() {
        let m = Matrix::translate(100.0, 0.0).mul(Matrix::scale(2.0, 2.0));
        let cmds = parse_path("M1 1 L2 1 Z", m).unwrap();
        assert_eq!(cmds[0], PathCommand::MoveTo(vec![p(102.0, 2.0)]));
        assert_eq!(cmds[1], PathCommand::LineTo(vec![p(104.0, 2.0)]));
        assert_eq!(cmds[2], PathCommand::LineTo(vec![p(102.0, 2.0)]));
    }

    #[test]
    fn missing_initial_moveto_is_rejected() {
        assert_eq!(
            parse_path("L 10 10", Matrix::identity()),
            Err(PathError::MissingMoveTo)
        );
        assert_eq!(
            parse_path("10 10", Matrix::identity()),
            Err(PathError::MissingMoveTo)
        );
    }

    #[test]
    fn incomplete_parameter_group_is_an_error() {
        let err = parse_path("M0 0 L 10", Matrix::identity()).unwrap_err();
        assert!(matches!(err, PathError::MissingParameters { command: 'L', .. }));
        let err = parse_path("M0 0 X 1 2", Matrix::identity()).unwrap_err();
        assert!(matches!(err, PathError::UnexpectedToken { found: 'X', .. }));
    }

    #[test]
    fn lazy_iterator_matches_collected_form() {
        let d = "M0 0 C1 1 2 2 3 3 S5 5 6 6 Z M10 10 h5";
        let lazy: Vec<PathCommand> = PathCommands::new(d, Matrix::identity())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(lazy, parse(d));
    }

    #[test]
    fn relative_move_after_close_starts_from_subpath_start() {
        let cmds = parse("M10 10 l10 0 z m5 5");
        assert_eq!(cmds.last(), Some(&PathCommand::MoveTo(vec![p(15.0, 15.0)])));
    }

    #[test]
    fn empty_path_data_has_no_commands() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
    }
}
