use crate::foundation::core::{Point, Rect};
use crate::host::stage::{ListenerId, Stage};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptionOptions {
    /// Gap below the ring's bottom edge.
    pub offset_px: f64,
    /// Breathing room kept at the bottom of the basin.
    pub bottom_padding_px: f64,
    pub max_width_px: f64,
}

impl Default for CaptionOptions {
    fn default() -> Self {
        Self {
            offset_px: 18.0,
            bottom_padding_px: 18.0,
            max_width_px: 560.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VideoOptions {
    pub plays_inline: bool,
    pub muted: bool,
    #[serde(rename = "loop")]
    pub looped: bool,
    pub autoplay: bool,
    pub preload: String,
}

impl Default for VideoOptions {
    fn default() -> Self {
        Self {
            plays_inline: true,
            muted: true,
            looped: true,
            autoplay: true,
            preload: "auto".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryLayerOptions {
    pub basin_selector: String,
    pub layer_id: String,
    pub media_id: String,
    pub caption_id: String,
    /// Ring centre as a fraction of the basin box.
    pub ring_center: Point,
    /// Ring radius as a fraction of the basin's smaller side.
    pub ring_radius: f64,
    pub feather_px: f64,
    pub caption: CaptionOptions,
    pub edge_blur_px: f64,
    pub edge_start_pct: f64,
    pub edge_end_pct: f64,
    pub edge_opacity: f64,
    pub video: VideoOptions,
}

impl Default for MemoryLayerOptions {
    fn default() -> Self {
        Self {
            basin_selector: "#scene-basin".to_owned(),
            layer_id: "memory-layer".to_owned(),
            media_id: "memory-media".to_owned(),
            caption_id: "memory-caption".to_owned(),
            ring_center: Point::new(0.5, 0.56),
            ring_radius: 0.305,
            feather_px: 28.0,
            caption: CaptionOptions::default(),
            edge_blur_px: 12.0,
            edge_start_pct: 55.0,
            edge_end_pct: 82.0,
            edge_opacity: 0.95,
            video: VideoOptions::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaKind {
    Image,
    Video,
}

/// One memory the vials can summon.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryContent {
    pub kind: MediaKind,
    #[serde(alias = "src")]
    pub source_url: String,
    #[serde(default)]
    pub caption: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaState {
    Loading,
    Ready,
    Failed,
}

/// A media element inside the sharp/blurred stack.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaNode {
    pub src: String,
    pub alt: String,
    /// Playback flags, for video nodes.
    pub video: Option<VideoOptions>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountedMemory {
    pub id: String,
    pub kind: MediaKind,
    pub sharp: MediaNode,
    /// Copy under the edge blur. Videos here are always muted.
    pub blurred: MediaNode,
    pub caption: String,
    pub state: MediaState,
}

/// Basin-local layout in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerGeometry {
    pub w: f64,
    pub h: f64,
    pub min_dim: f64,
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    /// Caption top edge, below the ring and inside the basin.
    pub caption_top: f64,
    pub caption_width: f64,
}

impl LayerGeometry {
    /// The media circle's bounding box.
    pub fn media_rect(&self) -> Rect {
        Rect::new(
            self.cx - self.r,
            self.cy - self.r,
            self.cx + self.r,
            self.cy + self.r,
        )
    }
}

/// Mounts a memory's media and caption into the basin, sized to the ring.
///
/// Does not animate; the reveal modules drive its elements.
#[derive(Clone, Debug)]
pub struct MemoryLayer {
    opts: MemoryLayerOptions,
    listener: ListenerId,
    geometry: LayerGeometry,
    mounted: Option<MountedMemory>,
}

impl MemoryLayer {
    /// Owner name of the layer's resize listener.
    pub const LISTENER: &'static str = "memory-layer";

    pub fn create(opts: MemoryLayerOptions, stage: &mut Stage) -> Option<Self> {
        let targets = [
            opts.basin_selector.clone(),
            format!("#{}", opts.layer_id),
            format!("#{}", opts.media_id),
            format!("#{}", opts.caption_id),
        ];
        if targets.iter().any(|sel| stage.query(sel).is_none()) {
            return None;
        }
        let listener = stage.listen_resize(Self::LISTENER);
        let mut layer = Self {
            opts,
            listener,
            geometry: LayerGeometry::default(),
            mounted: None,
        };
        layer.update_layout(stage);
        Some(layer)
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }

    pub fn geometry(&self) -> LayerGeometry {
        self.geometry
    }

    pub fn mounted(&self) -> Option<&MountedMemory> {
        self.mounted.as_ref()
    }

    /// `aria-hidden` of the layer.
    pub fn is_hidden(&self) -> bool {
        self.mounted.is_none()
    }

    /// Recompute ring-relative geometry from the basin box.
    pub fn update_layout(&mut self, stage: &Stage) {
        let Some(basin) = stage.rect_of(&self.opts.basin_selector) else {
            return;
        };
        let w = if basin.width() > 0.0 { basin.width() } else { 1.0 };
        let h = if basin.height() > 0.0 { basin.height() } else { 1.0 };
        let min_dim = w.min(h);
        let cx = w * self.opts.ring_center.x;
        let cy = h * self.opts.ring_center.y;
        let r = min_dim * self.opts.ring_radius;

        let cap = &self.opts.caption;
        let max_top = h - cap.bottom_padding_px - 1.0;
        let caption_top = (cy + r + cap.offset_px).min(max_top).max(0.0);
        let caption_width = cap.max_width_px.min((w * 0.86).floor());

        self.geometry = LayerGeometry {
            w,
            h,
            min_dim,
            cx,
            cy,
            r,
            caption_top,
            caption_width,
        };
    }

    pub fn mount(&mut self, stage: &Stage, id: &str, content: &MemoryContent) {
        self.clear();
        self.update_layout(stage);

        let node = |muted_override: bool| MediaNode {
            src: content.source_url.clone(),
            alt: match content.kind {
                MediaKind::Image => content.caption.clone(),
                MediaKind::Video => String::new(),
            },
            video: match content.kind {
                MediaKind::Image => None,
                MediaKind::Video => Some(VideoOptions {
                    muted: self.opts.video.muted || muted_override,
                    ..self.opts.video.clone()
                }),
            },
        };
        let sharp = node(false);
        let blurred = node(true);

        tracing::debug!(id, kind = ?content.kind, "memory mounted");
        self.mounted = Some(MountedMemory {
            id: id.to_owned(),
            kind: content.kind,
            sharp,
            blurred,
            caption: content.caption.clone(),
            state: MediaState::Loading,
        });
    }

    pub fn clear(&mut self) {
        self.mounted = None;
    }

    pub fn media_loaded(&mut self) {
        if let Some(m) = &mut self.mounted {
            m.state = MediaState::Ready;
        }
    }

    /// The media failed to load. The layer stays mounted with its caption.
    pub fn media_failed(&mut self) {
        if let Some(m) = &mut self.mounted {
            tracing::warn!(src = %m.sharp.src, "memory media failed to load");
            m.state = MediaState::Failed;
        }
    }

    /// Layer CSS custom properties.
    pub fn css_vars(&self) -> Vec<(&'static str, String)> {
        let g = &self.geometry;
        vec![
            ("--mem-cx", format!("{}px", g.cx)),
            ("--mem-cy", format!("{}px", g.cy)),
            ("--mem-r", format!("{}px", g.r)),
            ("--mem-feather", format!("{}px", self.opts.feather_px)),
            ("--edge-blur", format!("{}px", self.opts.edge_blur_px)),
            ("--edge-start", format!("{}%", self.opts.edge_start_pct)),
            ("--edge-end", format!("{}%", self.opts.edge_end_pct)),
            ("--edge-opacity", format!("{}", self.opts.edge_opacity)),
        ]
    }

    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "hidden": self.is_hidden(),
            "geometry": self.geometry,
            "mounted": self.mounted,
            "vars": self.css_vars().into_iter().collect::<std::collections::BTreeMap<_, _>>(),
        })
    }

    pub fn destroy(&mut self, stage: &mut Stage) {
        self.clear();
        stage.unlisten(self.listener);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/memory_layer.rs"]
mod tests;
