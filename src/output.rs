//! Output layout and coordinate mapping
//!
//! Outputs are placed in one global logical space. This module converts
//! between output-local and global coordinates and answers which output a
//! surface belongs to. Panels reserve strips along output edges; what is
//! left is the usable area that maximized windows fill.

use crate::utils::{area, center};
use serde::{Deserialize, Serialize};
use smithay::utils::{Logical, Point, Rectangle};
use std::fmt;
use tracing::{info, warn};

/// Identifier of an output within one [`OutputLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputId(u32);

impl OutputId {
    pub fn from_raw(raw: u32) -> Self {
        OutputId(raw)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for OutputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Output({})", self.0)
    }
}

/// Space reserved along each edge of an output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Margins {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// A display in the global layout
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub id: OutputId,
    pub name: String,
    /// Position and logical size in global coordinates
    pub geometry: Rectangle<i32, Logical>,
    pub scale: f64,
    pub reserved: Margins,
}

impl Output {
    /// Geometry minus reserved edges, never smaller than 1x1
    pub fn usable_area(&self) -> Rectangle<i32, Logical> {
        let g = self.geometry;
        let r = self.reserved;
        Rectangle::new(
            (g.loc.x + r.left, g.loc.y + r.top).into(),
            (
                (g.size.w - r.left - r.right).max(1),
                (g.size.h - r.top - r.bottom).max(1),
            )
                .into(),
        )
    }
}

/// All outputs known to the shell
#[derive(Debug, Default)]
pub struct OutputLayout {
    outputs: Vec<Output>,
    next_id: u32,
}

impl OutputLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_output(
        &mut self,
        name: impl Into<String>,
        geometry: Rectangle<i32, Logical>,
        scale: f64,
    ) -> OutputId {
        let id = OutputId(self.next_id);
        self.next_id += 1;
        let name = name.into();
        info!(
            "Adding output '{}' as {} at ({}, {}) size {}x{}, scale {}",
            name, id, geometry.loc.x, geometry.loc.y, geometry.size.w, geometry.size.h, scale
        );
        self.outputs.push(Output {
            id,
            name,
            geometry,
            scale,
            reserved: Margins::default(),
        });
        id
    }

    pub fn remove_output(&mut self, id: OutputId) -> Option<Output> {
        let index = self.outputs.iter().position(|o| o.id == id)?;
        Some(self.outputs.remove(index))
    }

    pub fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Output> {
        self.outputs.iter().find(|o| o.name == name)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Move or resize an output; returns the old geometry
    pub fn set_geometry(
        &mut self,
        id: OutputId,
        geometry: Rectangle<i32, Logical>,
    ) -> Option<Rectangle<i32, Logical>> {
        let output = self.outputs.iter_mut().find(|o| o.id == id)?;
        Some(std::mem::replace(&mut output.geometry, geometry))
    }

    pub fn set_reserved(&mut self, id: OutputId, reserved: Margins) {
        match self.outputs.iter_mut().find(|o| o.id == id) {
            Some(output) => output.reserved = reserved,
            None => warn!("Cannot reserve space on unknown {id}"),
        }
    }

    pub fn usable_area(&self, id: OutputId) -> Option<Rectangle<i32, Logical>> {
        self.get(id).map(Output::usable_area)
    }

    pub fn to_global(&self, id: OutputId, local: Point<f64, Logical>) -> Option<Point<f64, Logical>> {
        let loc = self.get(id)?.geometry.loc.to_f64();
        Some(local + loc)
    }

    pub fn to_local(&self, id: OutputId, global: Point<f64, Logical>) -> Option<Point<f64, Logical>> {
        let loc = self.get(id)?.geometry.loc.to_f64();
        Some(global - loc)
    }

    /// Output under a global point
    pub fn output_at(&self, point: Point<f64, Logical>) -> Option<OutputId> {
        self.outputs
            .iter()
            .find(|o| o.geometry.to_f64().contains(point))
            .map(|o| o.id)
    }

    /// Output sharing the largest area with `rect`
    ///
    /// Falls back to the output nearest to the rectangle's center so
    /// off-screen windows still resolve to something.
    pub fn output_for_rect(&self, rect: Rectangle<i32, Logical>) -> Option<OutputId> {
        let best = self
            .outputs
            .iter()
            .filter_map(|o| o.geometry.intersection(rect).map(|i| (o.id, area(&i))))
            .max_by_key(|(_, area)| *area);
        if let Some((id, _)) = best {
            return Some(id);
        }

        let target = center(&rect);
        self.outputs
            .iter()
            .min_by_key(|o| {
                let c = center(&o.geometry);
                let dx = (c.x - target.x) as i64;
                let dy = (c.y - target.y) as i64;
                dx * dx + dy * dy
            })
            .map(|o| o.id)
    }
}
