use super::*;
use crate::foundation::core::Viewport;

fn page_layer() -> (Stage, MemoryLayer) {
    let mut stage = Stage::pensieve_page(Viewport::new(1000.0, 500.0, 1.0).unwrap());
    let layer = MemoryLayer::create(
        MemoryLayerOptions {
            ring_center: Point::new(0.215, 0.435),
            ring_radius: 0.285,
            feather_px: 20.0,
            caption: CaptionOptions {
                offset_px: 150.0,
                ..CaptionOptions::default()
            },
            ..MemoryLayerOptions::default()
        },
        &mut stage,
    )
    .unwrap();
    (stage, layer)
}

fn image() -> MemoryContent {
    MemoryContent {
        kind: MediaKind::Image,
        source_url: "assets/memories/m1.jpg".to_owned(),
        caption: "Caption number 1".to_owned(),
    }
}

#[test]
fn geometry_follows_basin_box() {
    let (_stage, layer) = page_layer();
    let g = layer.geometry();
    assert!((g.w - 800.0).abs() < 1e-9);
    assert!((g.h - 420.0).abs() < 1e-9);
    assert!((g.r - 420.0 * 0.285).abs() < 1e-9);
    assert!((g.cx - 800.0 * 0.215).abs() < 1e-9);
    // Ring bottom + 150 overflows, so the caption clamps above the bottom padding.
    assert!((g.caption_top - (420.0 - 18.0 - 1.0)).abs() < 1e-9);
    assert_eq!(g.caption_width, 560.0);
    let media = g.media_rect();
    assert!((media.width() - 2.0 * g.r).abs() < 1e-9);
}

#[test]
fn mount_and_clear() {
    let (stage, mut layer) = page_layer();
    assert!(layer.is_hidden());
    layer.mount(&stage, "1", &image());
    let m = layer.mounted().unwrap();
    assert_eq!(m.id, "1");
    assert_eq!(m.sharp.alt, "Caption number 1");
    assert!(m.sharp.video.is_none());
    assert_eq!(m.state, MediaState::Loading);
    assert!(!layer.is_hidden());

    layer.media_failed();
    assert_eq!(layer.mounted().unwrap().state, MediaState::Failed);
    layer.clear();
    assert!(layer.is_hidden());
}

#[test]
fn video_blur_copy_is_always_muted() {
    let mut stage = Stage::pensieve_page(Viewport::default());
    let mut layer = MemoryLayer::create(
        MemoryLayerOptions {
            video: VideoOptions {
                muted: false,
                ..VideoOptions::default()
            },
            ..MemoryLayerOptions::default()
        },
        &mut stage,
    )
    .unwrap();
    let clip = MemoryContent {
        kind: MediaKind::Video,
        ..image()
    };
    layer.mount(&stage, "2", &clip);
    let m = layer.mounted().unwrap();
    assert_eq!(m.sharp.video.as_ref().map(|v| v.muted), Some(false));
    assert_eq!(m.blurred.video.as_ref().map(|v| v.muted), Some(true));
}

#[test]
fn resize_recomputes_layout_and_keeps_mount() {
    let (mut stage, mut layer) = page_layer();
    layer.mount(&stage, "1", &image());
    stage.set_rect("#scene-basin", Rect::new(0.0, 0.0, 400.0, 1000.0));
    layer.update_layout(&stage);
    let g = layer.geometry();
    assert_eq!(g.min_dim, 400.0);
    assert!((g.caption_top - (0.435 * 1000.0 + 400.0 * 0.285 + 150.0)).abs() < 1e-9);
    assert_eq!(g.caption_width, 344.0);
    assert!(layer.mounted().is_some());
}

#[test]
fn missing_target_is_none_without_listener() {
    let mut stage = Stage::new(Viewport::default());
    assert!(MemoryLayer::create(MemoryLayerOptions::default(), &mut stage).is_none());
    assert_eq!(stage.resize_listener_count(), 0);
}

#[test]
fn content_accepts_src_alias() {
    let c: MemoryContent = serde_json::from_value(serde_json::json!({
        "kind": "image", "src": "a.jpg", "caption": "x"
    }))
    .unwrap();
    assert_eq!(c.source_url, "a.jpg");
}
