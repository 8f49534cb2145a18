//! Toroidal food trails and the ant walking them.
use crate::errors::{AntError, Result};

use oxignp::EvaluationId;

use std::fmt;
use std::str::FromStr;

/// Contents of a trail cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Trail,
    Food,
    Eaten,
}

/// A grid of cells, wrapping around at its borders.
///
/// Trails are read from the `.trl` text format: a `"<width> <height>"`
/// header followed by one line per row, where `#` marks food, `.` marks
/// the trail and a space an empty cell. Short or missing rows are
/// padded with empty cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Trail {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    food: usize,
}

impl Trail {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of food cells in the untouched trail.
    pub fn food(&self) -> usize {
        self.food
    }

    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.cells[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.cells[y * self.width + x] = cell;
    }
}

impl FromStr for Trail {
    type Err = AntError;

    fn from_str(text: &str) -> Result<Trail> {
        let mut lines = text.lines();
        let header = lines
            .next()
            .ok_or_else(|| AntError::trail(1, "missing size header"))?;
        let mut size = header.split_whitespace().map(str::parse::<usize>);
        let (width, height) = match (size.next(), size.next()) {
            (Some(Ok(w)), Some(Ok(h))) if w > 0 && h > 0 => (w, h),
            _ => {
                return Err(AntError::trail(
                    1,
                    format!("expected a positive \"<width> <height>\" header, found {:?}", header),
                ))
            }
        };

        let mut trail = Trail {
            width,
            height,
            cells: vec![Cell::Empty; width * height],
            food: 0,
        };
        for (y, line) in lines.take(height).enumerate() {
            let line = line.trim_end_matches('\r');
            if line.chars().count() > width {
                return Err(AntError::trail(y + 2, format!("row is wider than {} cells", width)));
            }
            for (x, c) in line.chars().enumerate() {
                let cell = match c {
                    ' ' => Cell::Empty,
                    '.' => Cell::Trail,
                    '#' => {
                        trail.food += 1;
                        Cell::Food
                    }
                    _ => return Err(AntError::trail(y + 2, format!("bad character {:?}", c))),
                };
                trail.set(x, y, cell);
            }
        }
        Ok(trail)
    }
}

/// Headings, in counter-clockwise order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Heading {
    Up,
    Left,
    Down,
    Right,
}

impl Heading {
    pub fn left(self) -> Heading {
        match self {
            Heading::Up => Heading::Left,
            Heading::Left => Heading::Down,
            Heading::Down => Heading::Right,
            Heading::Right => Heading::Up,
        }
    }

    pub fn right(self) -> Heading {
        match self {
            Heading::Up => Heading::Right,
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
        }
    }
}

/// An ant foraging on its own copy of a trail.
///
/// Every action, turns included, costs one move. Food is only
/// eaten while moves remain.
#[derive(Clone, Debug)]
pub struct Ant {
    trail: Trail,
    visited: Vec<bool>,
    x: usize,
    y: usize,
    heading: Heading,
    moves: usize,
    max_moves: usize,
    eaten: usize,
    rewarded: Vec<EvaluationId>,
}

impl Ant {
    /// Places an ant in the top-left corner, heading right.
    pub fn new(trail: &Trail, max_moves: usize) -> Ant {
        let mut visited = vec![false; trail.width * trail.height];
        visited[0] = true;
        Ant {
            trail: trail.clone(),
            visited,
            x: 0,
            y: 0,
            heading: Heading::Right,
            moves: 0,
            max_moves,
            eaten: 0,
            rewarded: vec![],
        }
    }

    pub fn position(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn eaten(&self) -> usize {
        self.eaten
    }

    /// Whether the ant may keep foraging.
    pub fn active(&self) -> bool {
        self.moves < self.max_moves && self.eaten < self.trail.food
    }

    fn ahead(&self) -> (usize, usize) {
        let (w, h) = (self.trail.width, self.trail.height);
        match self.heading {
            Heading::Up => (self.x, (self.y + h - 1) % h),
            Heading::Left => ((self.x + w - 1) % w, self.y),
            Heading::Down => (self.x, (self.y + 1) % h),
            Heading::Right => ((self.x + 1) % w, self.y),
        }
    }

    pub fn food_ahead(&self) -> bool {
        let (x, y) = self.ahead();
        self.trail.cell(x, y) == Cell::Food
    }

    /// Steps forward, returning whether food was eaten.
    pub fn step(&mut self) -> bool {
        let (x, y) = self.ahead();
        self.x = x;
        self.y = y;
        self.moves += 1;
        self.visited[y * self.trail.width + x] = true;
        if self.trail.cell(x, y) == Cell::Food && self.moves < self.max_moves {
            self.trail.set(x, y, Cell::Eaten);
            self.eaten += 1;
            true
        } else {
            false
        }
    }

    pub fn turn_left(&mut self) {
        self.heading = self.heading.left();
        self.moves += 1;
    }

    pub fn turn_right(&mut self) {
        self.heading = self.heading.right();
        self.moves += 1;
    }

    /// Records an evaluation whose reward is owed.
    pub fn owe_reward(&mut self, evaluation_id: EvaluationId) {
        self.rewarded.push(evaluation_id);
    }

    /// Takes the evaluations owed a reward since the last call.
    pub fn take_owed_rewards(&mut self) -> Vec<EvaluationId> {
        std::mem::take(&mut self.rewarded)
    }
}

/// Renders the trail as walked so far: `#` uneaten food, `@` eaten
/// food, `+` other visited cells, `.` untouched trail.
impl fmt::Display for Ant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.trail.height {
            for x in 0..self.trail.width {
                let c = match self.trail.cell(x, y) {
                    Cell::Food => '#',
                    Cell::Eaten => '@',
                    _ if self.visited[y * self.trail.width + x] => '+',
                    Cell::Trail => '.',
                    Cell::Empty => ' ',
                };
                write!(f, "{}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
