//! Turtle-graphics interpretation of expanded L-system programs.
//!
//! The turtle starts at the origin heading straight up (+y):
//!
//! - `F`: move forward by `step`, drawing a segment
//! - `+` / `-`: turn left / right by `angle`
//! - `[` / `]`: push / pop position and heading
//! - anything else: no-op
//!
//! A leaf is placed at every branch tip, i.e. at each `]` and at the end of
//! the program when the turtle drew since the last push or pop.

use std::f64::consts::FRAC_PI_2;

use serde::Serialize;

use crate::schema::{FORWARD, POP, PUSH, TURN_LEFT, TURN_RIGHT};

/// A 2D point, y pointing up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A drawn stem segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    /// Bracket nesting depth the segment was drawn at.
    pub depth: usize,
}

impl Segment {
    #[inline]
    pub fn length(&self) -> f64 {
        (self.to.x - self.from.x).hypot(self.to.y - self.from.y)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        Point {
            x: 0.5 * (self.from.x + self.to.x),
            y: 0.5 * (self.from.y + self.to.y),
        }
    }
}

/// Axis-aligned extent of a drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    fn origin() -> Self {
        Self {
            min_x: 0.0,
            max_x: 0.0,
            min_y: 0.0,
            max_y: 0.0,
        }
    }

    fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.max_x = self.max_x.max(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_y = self.max_y.max(p.y);
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Geometry produced by interpreting a program.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawing {
    pub segments: Vec<Segment>,
    /// Leaf centers, one per branch tip.
    pub leaves: Vec<Point>,
    /// Branches (`[...]`) that drew at least one segment.
    pub branch_points: usize,
    pub bounds: Bounds,
}

impl Drawing {
    /// Total drawn stem length.
    pub fn total_length(&self) -> f64 {
        self.segments.iter().map(Segment::length).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// One turtle event.
enum Move {
    Draw(Segment),
    Push,
    /// Branch closed; `drew` tells whether the branch tip carries a leaf.
    Pop { drew: bool, closed_branch: bool },
    Nothing,
}

#[derive(Clone, Copy)]
struct State {
    position: Point,
    heading: f64,
}

struct Turtle {
    state: State,
    stack: Vec<(State, bool)>,
    step: f64,
    angle: f64,
    drew: bool,
    drew_in_branch: bool,
}

impl Turtle {
    fn new(step: f64, angle: f64) -> Self {
        Self {
            state: State {
                position: Point::default(),
                heading: FRAC_PI_2,
            },
            stack: Vec::new(),
            step,
            angle,
            drew: false,
            drew_in_branch: false,
        }
    }

    fn apply(&mut self, symbol: char) -> Move {
        match symbol {
            FORWARD => {
                let from = self.state.position;
                let to = Point {
                    x: from.x + self.step * self.state.heading.cos(),
                    y: from.y + self.step * self.state.heading.sin(),
                };
                self.state.position = to;
                self.drew = true;
                self.drew_in_branch = true;
                Move::Draw(Segment {
                    from,
                    to,
                    depth: self.stack.len(),
                })
            }
            TURN_LEFT => {
                self.state.heading += self.angle;
                Move::Nothing
            }
            TURN_RIGHT => {
                self.state.heading -= self.angle;
                Move::Nothing
            }
            PUSH => {
                self.stack.push((self.state, self.drew_in_branch));
                self.drew = false;
                self.drew_in_branch = false;
                Move::Push
            }
            POP => match self.stack.pop() {
                Some((state, outer_drew)) => {
                    let drew = self.drew;
                    let closed_branch = self.drew_in_branch;
                    self.state = state;
                    self.drew = false;
                    self.drew_in_branch = outer_drew || closed_branch;
                    Move::Pop {
                        drew,
                        closed_branch,
                    }
                }
                None => Move::Nothing,
            },
            _ => Move::Nothing,
        }
    }
}

/// Interpret a program into geometry.
pub fn interpret(code: &str, step: f64, angle: f64) -> Drawing {
    let mut turtle = Turtle::new(step, angle);
    let mut segments = Vec::new();
    let mut leaves = Vec::new();
    let mut branch_points = 0;
    let mut bounds = Bounds::origin();

    for symbol in code.chars() {
        // Leaf position is the tip before the pop restores the parent state.
        let tip = turtle.state.position;
        match turtle.apply(symbol) {
            Move::Draw(segment) => {
                bounds.include(segment.to);
                segments.push(segment);
            }
            Move::Pop {
                drew,
                closed_branch,
            } => {
                if drew {
                    leaves.push(tip);
                }
                if closed_branch {
                    branch_points += 1;
                }
            }
            Move::Push | Move::Nothing => {}
        }
    }
    if turtle.drew {
        leaves.push(turtle.state.position);
    }

    Drawing {
        segments,
        leaves,
        branch_points,
        bounds,
    }
}

/// Compute only the extent of a program, without collecting geometry.
pub fn measure(code: &str, step: f64, angle: f64) -> Bounds {
    let mut turtle = Turtle::new(step, angle);
    let mut bounds = Bounds::origin();
    for symbol in code.chars() {
        if let Move::Draw(segment) = turtle.apply(symbol) {
            bounds.include(segment.to);
        }
    }
    bounds
}
