//! libfov enumerations
//!
//! Mirrors the C enums in `fov.h` (`fov_direction_type`, `fov_shape_type`,
//! `fov_corner_peek_type`, `fov_opaque_apply_type`). The discriminants are
//! the values libfov expects, so each enum crosses the FFI boundary as a
//! plain `c_int`.

use serde::{Deserialize, Serialize};
use std::os::raw::c_int;

use crate::error::FovError;

/// Direction a beam is cast towards
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    East = 0,
    NorthEast = 1,
    North = 2,
    NorthWest = 3,
    West = 4,
    SouthWest = 5,
    South = 6,
    SouthEast = 7,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    /// Unit step in grid coordinates (y grows southwards, as in libfov).
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::North => (0, -1),
            Direction::NorthWest => (-1, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::South => (0, 1),
            Direction::SouthEast => (1, 1),
        }
    }
}

impl TryFrom<c_int> for Direction {
    type Error = FovError;

    fn try_from(value: c_int) -> Result<Self, Self::Error> {
        Direction::ALL
            .get(usize::try_from(value).unwrap_or(usize::MAX))
            .copied()
            .ok_or_else(|| FovError::Argument(format!("invalid direction: {value}")))
    }
}

/// Shape of the lit area
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Circle with per-radius height tables cached in the settings block
    #[default]
    CirclePrecalculate = 0,
    Square = 1,
    Circle = 2,
    Octagon = 3,
}

impl TryFrom<c_int> for Shape {
    type Error = FovError;

    fn try_from(value: c_int) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Shape::CirclePrecalculate),
            1 => Ok(Shape::Square),
            2 => Ok(Shape::Circle),
            3 => Ok(Shape::Octagon),
            _ => Err(FovError::Argument(format!("invalid shape: {value}"))),
        }
    }
}

/// Whether light peeks around convex corners
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerPeek {
    #[default]
    NoPeek = 0,
    Peek = 1,
}

impl TryFrom<c_int> for CornerPeek {
    type Error = FovError;

    fn try_from(value: c_int) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CornerPeek::NoPeek),
            1 => Ok(CornerPeek::Peek),
            _ => Err(FovError::Argument(format!("invalid corner peek: {value}"))),
        }
    }
}

/// Whether opaque cells themselves receive lighting
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpaqueApply {
    #[default]
    Apply = 0,
    NoApply = 1,
}

impl TryFrom<c_int> for OpaqueApply {
    type Error = FovError;

    fn try_from(value: c_int) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpaqueApply::Apply),
            1 => Ok(OpaqueApply::NoApply),
            _ => Err(FovError::Argument(format!("invalid opaque apply: {value}"))),
        }
    }
}

/// Integer constants exported to scripts, keyed by their script-visible name.
pub const CONSTANTS: &[(&str, c_int)] = &[
    ("EAST", Direction::East as c_int),
    ("NORTHEAST", Direction::NorthEast as c_int),
    ("NORTH", Direction::North as c_int),
    ("NORTHWEST", Direction::NorthWest as c_int),
    ("WEST", Direction::West as c_int),
    ("SOUTHWEST", Direction::SouthWest as c_int),
    ("SOUTH", Direction::South as c_int),
    ("SOUTHEAST", Direction::SouthEast as c_int),
    ("SHAPE_CIRCLE_PRECALCULATE", Shape::CirclePrecalculate as c_int),
    ("SHAPE_SQUARE", Shape::Square as c_int),
    ("SHAPE_CIRCLE", Shape::Circle as c_int),
    ("SHAPE_OCTAGON", Shape::Octagon as c_int),
    ("CORNER_NOPEEK", CornerPeek::NoPeek as c_int),
    ("CORNER_PEEK", CornerPeek::Peek as c_int),
    ("OPAQUE_APPLY", OpaqueApply::Apply as c_int),
    ("OPAQUE_NOAPPLY", OpaqueApply::NoApply as c_int),
];
