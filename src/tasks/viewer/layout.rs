use serde::Deserialize;

/// Drawable area available to the presentation, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Where an image lands inside the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outer window placement on the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Window decorations around the drawable area (outer minus inner size).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct WindowChrome {
    pub width: u32,
    pub height: u32,
}

pub fn resize_to_contain(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let cw = canvas_w.max(1) as f32;
    let ch = canvas_h.max(1) as f32;
    let scale = (cw / iw).min(ch / ih).max(0.0);
    let scale = if scale.is_finite() { scale } else { 1.0 };
    let w = (iw * scale).round().clamp(1.0, cw);
    let h = (ih * scale).round().clamp(1.0, ch);
    (w as u32, h as u32)
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (u32, u32) {
    let ox = outer_w.saturating_sub(inner_w) / 2;
    let oy = outer_h.saturating_sub(inner_h) / 2;
    (ox, oy)
}

/// Scale the image to fit entirely inside the viewport and center it.
pub fn fit_to_viewport(image_w: u32, image_h: u32, viewport: Viewport) -> FitRect {
    let (width, height) = resize_to_contain(viewport.width, viewport.height, image_w, image_h);
    let (x, y) = center_offset(width, height, viewport.width, viewport.height);
    FitRect {
        x,
        y,
        width,
        height,
    }
}

/// Resize a standalone window so its drawable area matches the image fitted
/// into `max`, keeping the window centered where it was.
pub fn standalone_window(
    image_w: u32,
    image_h: u32,
    max: Viewport,
    current: WindowRect,
    chrome: WindowChrome,
) -> WindowRect {
    let fit = fit_to_viewport(image_w, image_h, max);
    let width = fit.width.saturating_add(chrome.width);
    let height = fit.height.saturating_add(chrome.height);
    let dx = (i64::from(width) - i64::from(current.width)) / 2;
    let dy = (i64::from(height) - i64::from(current.height)) / 2;
    WindowRect {
        x: clamp_i32(i64::from(current.x) - dx),
        y: clamp_i32(i64::from(current.y) - dy),
        width,
        height,
    }
}

fn clamp_i32(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
