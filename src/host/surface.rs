use crate::foundation::core::{Point, Rgba8};

/// One retained draw call, in CSS pixels (the backing store scale is applied on export).
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawCmd {
    /// Round-capped stroke through `points`, colour fading from `head` to `tail`.
    Polyline {
        points: Vec<Point>,
        width: f64,
        head: Rgba8,
        tail: Rgba8,
        glow: f64,
    },
    Line {
        from: Point,
        to: Point,
        width: f64,
        color: Rgba8,
        glow: f64,
    },
    Circle {
        center: Point,
        radius: f64,
        color: Rgba8,
        glow: f64,
    },
}

/// A canvas owned by exactly one effect.
#[derive(Clone, Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Surface {
    id: String,
    css_width: f64,
    css_height: f64,
    dpr: f64,
    backing_width: u32,
    backing_height: u32,
    webgl: bool,
    cmds: Vec<DrawCmd>,
}

impl Surface {
    pub fn new(id: impl Into<String>, css_width: f64, css_height: f64, dpr: f64, webgl: bool) -> Self {
        let mut s = Self {
            id: id.into(),
            css_width: 0.0,
            css_height: 0.0,
            dpr: 1.0,
            backing_width: 1,
            backing_height: 1,
            webgl,
            cmds: Vec::new(),
        };
        s.resize(css_width, css_height, dpr);
        s
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_webgl(&self) -> bool {
        self.webgl
    }

    /// Recompute the DPR-scaled backing store. Clears the display list like a real
    /// canvas resize does.
    pub fn resize(&mut self, css_width: f64, css_height: f64, dpr: f64) {
        let dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.css_width = css_width.max(0.0);
        self.css_height = css_height.max(0.0);
        self.dpr = dpr;
        self.backing_width = backing_px(self.css_width, dpr);
        self.backing_height = backing_px(self.css_height, dpr);
        self.cmds.clear();
    }

    pub fn css_size(&self) -> (f64, f64) {
        (self.css_width, self.css_height)
    }

    pub fn backing_size(&self) -> (u32, u32) {
        (self.backing_width, self.backing_height)
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn clear(&mut self) {
        self.cmds.clear();
    }

    pub fn draw(&mut self, cmd: DrawCmd) {
        self.cmds.push(cmd);
    }

    pub fn commands(&self) -> &[DrawCmd] {
        &self.cmds
    }
}

fn backing_px(css: f64, dpr: f64) -> u32 {
    let px = (css * dpr).round();
    if px.is_finite() && px >= 1.0 {
        px.min(f64::from(u32::MAX)) as u32
    } else {
        1
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/surface.rs"]
mod tests;
