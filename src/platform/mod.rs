//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Share intent (opens a new tab on web, logs the URL natively)
//! - Mapping canvas pixels to world coordinates

use glam::Vec2;

use crate::consts::{WINDOW_HEIGHT, WINDOW_WIDTH};

/// Pre-encoded tweet intent; `{}` is replaced by the score
const SHARE_PREFIX: &str = "https://twitter.com/intent/tweet?text=I%20scored%20";
const SHARE_SUFFIX: &str = "%20points%20in%20Not%20Suika%21%0A%23NotSuika";

/// Tweet intent URL for a finished run
pub fn share_url(score: u64) -> String {
    format!("{}{}{}", SHARE_PREFIX, score, SHARE_SUFFIX)
}

/// Open the share intent (fire-and-forget)
#[cfg(target_arch = "wasm32")]
pub fn share(score: u64) {
    let url = share_url(score);
    match web_sys::window() {
        Some(window) => {
            if window.open_with_url_and_target(&url, "_blank").is_err() {
                log::warn!("Could not open share window");
            }
        }
        None => log::warn!("No window to share from"),
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn share(score: u64) {
    log::info!("Share: {}", share_url(score));
}

/// Convert a position on a canvas of `canvas_size` CSS pixels into world coordinates.
///
/// The world is the logical 800x1200 window with its origin at the center; the
/// canvas is letterboxed to keep that aspect ratio.
pub fn canvas_to_world(pixel: Vec2, canvas_size: Vec2) -> Vec2 {
    let scale = (canvas_size.x / WINDOW_WIDTH).min(canvas_size.y / WINDOW_HEIGHT);
    if scale <= 0.0 {
        return Vec2::ZERO;
    }
    (pixel - canvas_size * 0.5) / scale
}

/// Convert a screen-space point of the logical window (origin top-left) into world coordinates
pub fn screen_to_world(screen: Vec2) -> Vec2 {
    screen - Vec2::new(WINDOW_WIDTH, WINDOW_HEIGHT) * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_url_contains_score() {
        let url = share_url(1234);
        assert!(url.starts_with("https://twitter.com/intent/tweet?text="));
        assert!(url.contains("%201234%20"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_canvas_center_is_world_origin() {
        let size = Vec2::new(400.0, 600.0);
        assert_eq!(canvas_to_world(Vec2::new(200.0, 300.0), size), Vec2::ZERO);
        // Half-size canvas: one pixel is two world units
        assert_eq!(
            canvas_to_world(Vec2::new(300.0, 300.0), size),
            Vec2::new(200.0, 0.0)
        );
    }

    #[test]
    fn test_canvas_letterboxed() {
        // Wider than 2:3, height decides the scale
        let size = Vec2::new(1000.0, 600.0);
        assert_eq!(
            canvas_to_world(Vec2::new(500.0, 0.0), size),
            Vec2::new(0.0, -600.0)
        );
    }

    #[test]
    fn test_screen_to_world() {
        assert_eq!(
            screen_to_world(Vec2::new(700.0, 920.0)),
            Vec2::new(300.0, 320.0)
        );
    }
}
