//! Deterministic stand-in for libfov.
//!
//! `circle` visits the eight compass points at Chebyshev distance `radius`
//! from the origin, `passes` times over. `beam` visits the compass points
//! within `angle / 2` of `direction`. Every cell is first tested for opacity
//! and then lit unless it is opaque and the settings say `OPAQUE_NOAPPLY`.
//! Each callback and its answer is recorded in call order.

#![allow(dead_code)]

use std::cell::RefCell;
use std::os::raw::{c_int, c_uint, c_void};

use fov::{Direction, NativeSettings, OpaqueApply, VisibilityEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Record {
    Opacity { x: i32, y: i32, opaque: bool },
    Lighting { x: i32, y: i32, dx: i32, dy: i32 },
}

pub struct FakeEngine {
    passes: usize,
    records: RefCell<Vec<Record>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::with_passes(1)
    }

    pub fn with_passes(passes: usize) -> Self {
        Self {
            passes,
            records: RefCell::new(Vec::new()),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.borrow().clone()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }

    pub fn opacity_records(&self) -> Vec<(i32, i32, bool)> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match *r {
                Record::Opacity { x, y, opaque } => Some((x, y, opaque)),
                Record::Lighting { .. } => None,
            })
            .collect()
    }

    pub fn lighting_records(&self) -> Vec<(i32, i32, i32, i32)> {
        self.records
            .borrow()
            .iter()
            .filter_map(|r| match *r {
                Record::Lighting { x, y, dx, dy } => Some((x, y, dx, dy)),
                Record::Opacity { .. } => None,
            })
            .collect()
    }

    /// Points `circle(x, y, radius)` visits, in visiting order (one pass).
    pub fn circle_points(x: i32, y: i32, radius: u32) -> Vec<(i32, i32)> {
        let r = radius as i32;
        Direction::ALL
            .iter()
            .map(|d| {
                let (dx, dy) = d.offset();
                (x + dx * r, y + dy * r)
            })
            .collect()
    }

    unsafe fn visit(
        &self,
        settings: *mut NativeSettings,
        map: *mut c_void,
        src: *mut c_void,
        origin: (c_int, c_int),
        cells: &[(i32, i32)],
    ) {
        let settings = &*settings;
        let opaque_fn = settings.opacity_test.expect("opacity slot installed");
        let apply_fn = settings.apply_lighting.expect("lighting slot installed");

        for _ in 0..self.passes {
            for &(x, y) in cells {
                // No borrow of `records` is held while calling back; callables
                // may start nested scans on this engine.
                let opaque = opaque_fn(map, x, y);
                self.records.borrow_mut().push(Record::Opacity { x, y, opaque });

                if opaque && settings.opaque_apply == OpaqueApply::NoApply {
                    continue;
                }
                let (dx, dy) = (x - origin.0, y - origin.1);
                apply_fn(map, x, y, dx, dy, src);
                self.records.borrow_mut().push(Record::Lighting { x, y, dx, dy });
            }
        }
    }
}

impl VisibilityEngine for FakeEngine {
    unsafe fn beam(
        &self,
        settings: *mut NativeSettings,
        map: *mut c_void,
        src: *mut c_void,
        x: c_int,
        y: c_int,
        radius: c_uint,
        direction: Direction,
        angle: f32,
    ) {
        let r = radius as i32;
        let cells: Vec<(i32, i32)> = Direction::ALL
            .iter()
            .filter(|d| {
                let steps = (**d as i32 - direction as i32).rem_euclid(8);
                let steps = steps.min(8 - steps);
                (steps * 45) as f32 <= angle / 2.0
            })
            .map(|d| {
                let (dx, dy) = d.offset();
                (x + dx * r, y + dy * r)
            })
            .collect();
        self.visit(settings, map, src, (x, y), &cells);
    }

    unsafe fn circle(
        &self,
        settings: *mut NativeSettings,
        map: *mut c_void,
        src: *mut c_void,
        x: c_int,
        y: c_int,
        radius: c_uint,
    ) {
        let cells = Self::circle_points(x, y, radius);
        self.visit(settings, map, src, (x, y), &cells);
    }
}

/// The 6x6 grid predicate: everything outside `0..=5` is opaque.
pub fn off_grid(x: i32, y: i32) -> bool {
    x < 0 || x > 5 || y < 0 || y > 5
}
