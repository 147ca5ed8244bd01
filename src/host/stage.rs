use std::collections::{BTreeMap, BTreeSet};

use crate::foundation::core::{Rect, Viewport};
use crate::host::surface::Surface;

/// A DOM element as the effects see it: identity, layout box, classes, data attributes.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Element {
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    /// Bounding client rect in CSS pixels.
    pub rect: Rect,
    pub data: BTreeMap<String, String>,
}

impl Element {
    pub fn new(rect: Rect) -> Self {
        Self {
            id: None,
            classes: BTreeSet::new(),
            rect,
            data: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.insert(class.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Match a simple `#id` or `.class` selector.
    pub fn matches(&self, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            self.id.as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.classes.contains(class)
        } else {
            false
        }
    }
}

#[derive(Clone, Debug)]
struct CanvasSlot {
    rect: Rect,
    webgl: bool,
    claimed: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct ListenerId(pub u64);

/// The document an effect runs against.
///
/// Effects resolve their targets here at construction; a missing target makes the
/// factory return `None`. Canvases are handed out at most once so every rendering
/// context has exactly one owner.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    viewport: Viewport,
    elements: Vec<Element>,
    canvases: BTreeMap<String, CanvasSlot>,
    listeners: BTreeMap<ListenerId, String>,
    next_listener: u64,
    css_mask_unsupported: bool,
}

impl Stage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// The page the ceremony was designed for: a scene stack with the vial shelf on top,
    /// the basin one screen below, and one canvas per effect.
    pub fn pensieve_page(viewport: Viewport) -> Self {
        let w = viewport.width;
        let h = viewport.height;
        let full = Rect::new(0.0, 0.0, w, h);
        let basin = Rect::new(w * 0.1, h * 0.08, w * 0.9, h * 0.92);

        let mut stage = Self::new(viewport)
            .with_element(Element::new(Rect::new(0.0, 0.0, w, h * 2.0)).with_id("scene-stack"))
            .with_element(Element::new(full).with_class("scene"))
            .with_element(Element::new(basin).with_id("scene-basin"))
            .with_element(Element::new(basin).with_id("memory-layer"))
            .with_element(Element::new(basin).with_id("memory-media"))
            .with_element(Element::new(basin).with_id("memory-caption"))
            .with_element(
                Element::new(Rect::new(0.0, h * 0.1, w, h * 0.7)).with_id("vials-orbit"),
            )
            .with_canvas("basin-canvas", basin, false)
            .with_canvas("basin-water", basin, true)
            .with_canvas("basin-incoming", basin, false)
            .with_canvas("pour-travel", full, false)
            .with_canvas("particles", full, false);

        for n in 1..=3u32 {
            let x = w * (0.25 * f64::from(n)) - 35.0;
            let rect = Rect::new(x, h * 0.3, x + 70.0, h * 0.3 + 190.0);
            stage = stage
                .with_element(
                    Element::new(rect)
                        .with_id(format!("vial-{n}"))
                        .with_class("vial")
                        .with_class("vials__vial")
                        .with_data("memory", n.to_string())
                        .with_data("phase", format!("{}", f64::from(n - 1) / 3.0))
                        .with_data("threads", format!("vial-threads-{n}")),
                )
                .with_canvas(format!("vial-threads-{n}"), rect, false);
        }
        stage
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_canvas(mut self, id: impl Into<String>, rect: Rect, webgl: bool) -> Self {
        self.canvases.insert(
            id.into(),
            CanvasSlot {
                rect,
                webgl,
                claimed: false,
            },
        );
        self
    }

    /// Whether the host can apply CSS mask images.
    pub fn supports_css_mask(&self) -> bool {
        !self.css_mask_unsupported
    }

    pub fn set_css_mask_support(&mut self, supported: bool) {
        self.css_mask_unsupported = !supported;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn query(&self, selector: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.matches(selector))
    }

    pub fn query_all<'a>(&'a self, selector: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.matches(selector))
    }

    pub fn query_mut(&mut self, selector: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.matches(selector))
    }

    pub fn rect_of(&self, selector: &str) -> Option<Rect> {
        self.query(selector).map(|e| e.rect)
    }

    /// Move or resize an element (layout change, resize-observer signal).
    pub fn set_rect(&mut self, selector: &str, rect: Rect) -> bool {
        match self.query_mut(selector) {
            Some(el) => {
                el.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn set_canvas_rect(&mut self, id: &str, rect: Rect) -> bool {
        match self.canvases.get_mut(id) {
            Some(slot) => {
                slot.rect = rect;
                true
            }
            None => false,
        }
    }

    pub fn canvas_rect(&self, id: &str) -> Option<Rect> {
        self.canvases.get(id).map(|c| c.rect)
    }

    pub fn add_class(&mut self, selector: &str, class: &str) -> bool {
        match self.query_mut(selector) {
            Some(el) => el.classes.insert(class.to_owned()),
            None => false,
        }
    }

    pub fn remove_class(&mut self, selector: &str, class: &str) -> bool {
        match self.query_mut(selector) {
            Some(el) => el.classes.remove(class),
            None => false,
        }
    }

    pub fn has_canvas(&self, id: &str) -> bool {
        self.canvases.contains_key(id)
    }

    /// Take exclusive ownership of a 2D canvas.
    pub fn claim_canvas(&mut self, id: &str) -> Option<Surface> {
        self.claim(id, false)
    }

    /// Take exclusive ownership of a WebGL canvas. `None` if the canvas is missing or the
    /// host has no WebGL for it.
    pub fn claim_webgl_canvas(&mut self, id: &str) -> Option<Surface> {
        let slot = self.canvases.get(id)?;
        if !slot.webgl {
            tracing::warn!(canvas = id, "WebGL not available");
            return None;
        }
        self.claim(id, true)
    }

    fn claim(&mut self, id: &str, webgl: bool) -> Option<Surface> {
        let dpr = self.viewport.dpr();
        let slot = self.canvases.get_mut(id)?;
        if slot.claimed {
            tracing::warn!(canvas = id, "canvas already owned by another effect");
            return None;
        }
        slot.claimed = true;
        Some(Surface::new(
            id,
            slot.rect.width(),
            slot.rect.height(),
            dpr,
            webgl,
        ))
    }

    /// Give a canvas back (effect destroyed).
    pub fn release_canvas(&mut self, id: &str) {
        if let Some(slot) = self.canvases.get_mut(id) {
            slot.claimed = false;
        }
    }

    /// Register `owner` for resize dispatch. The orchestrator resizes owners in
    /// registration order; an unlistened owner no longer receives resizes.
    pub fn listen_resize(&mut self, owner: &str) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.insert(id, owner.to_owned());
        id
    }

    pub fn unlisten(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub fn resize_listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn resize_listeners(&self) -> impl Iterator<Item = (ListenerId, &str)> {
        self.listeners.iter().map(|(id, owner)| (*id, owner.as_str()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/stage.rs"]
mod tests;
