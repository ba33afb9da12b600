//! Pure calculation functions for dimensions and page layout.
//!
//! All functions here are pure and testable without any I/O or images.

/// Bound used for a side the request leaves unset.
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

/// A4 page size in PDF points (210 × 297 mm).
pub const A4_PAGE_WIDTH: f32 = 595.28;
pub const A4_PAGE_HEIGHT: f32 = 841.89;

/// ICO entries cannot exceed 256 px on either side.
pub const ICO_MAX_DIMENSION: u32 = 256;

/// Resolve the single longer-edge bound from optional width/height limits.
///
/// Width and height are not applied independently: only the larger of the
/// two (each defaulting to [`DEFAULT_MAX_DIMENSION`]) is honored.
///
/// ```
/// # use simple_imgconv::imaging::resolve_max_dimension;
/// assert_eq!(resolve_max_dimension(Some(100), Some(50)), 100);
/// assert_eq!(resolve_max_dimension(None, None), 4096);
/// // An unset side still contributes its default
/// assert_eq!(resolve_max_dimension(Some(100), None), 4096);
/// ```
pub fn resolve_max_dimension(max_width: Option<u32>, max_height: Option<u32>) -> u32 {
    max_width
        .unwrap_or(DEFAULT_MAX_DIMENSION)
        .max(max_height.unwrap_or(DEFAULT_MAX_DIMENSION))
}

/// Fit `source` so its longer edge is at most `bound`, keeping the aspect ratio.
///
/// Never upscales. Each side is at least 1 px.
pub fn fit_within(source: (u32, u32), bound: u32) -> (u32, u32) {
    let (w, h) = source;
    let longest = w.max(h);
    if longest <= bound || longest == 0 {
        return (w, h);
    }
    let scale = bound as f64 / longest as f64;
    let fw = ((w as f64 * scale).round() as u32).max(1);
    let fh = ((h as f64 * scale).round() as u32).max(1);
    (fw, fh)
}

/// Where an image lands on a document page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page_width: f32,
    pub page_height: f32,
    /// Drawn image width; always equals `page_width`.
    pub image_width: f32,
    /// Drawn image height, proportional to the source.
    pub image_height: f32,
    /// `page_width / source_width`.
    pub scale: f32,
}

/// Lay an image out at full page width with proportional height.
///
/// `height = page_width * image_height / image_width`. The page itself keeps
/// its standard size; a very tall image overflows it.
pub fn calculate_page_layout(image: (u32, u32), page: (f32, f32)) -> PageLayout {
    let (img_w, img_h) = image;
    let (page_w, page_h) = page;
    let scale = page_w / img_w.max(1) as f32;
    PageLayout {
        page_width: page_w,
        page_height: page_h,
        image_width: page_w,
        image_height: page_w * img_h as f32 / img_w.max(1) as f32,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // resolve_max_dimension
    // =========================================================================

    #[test]
    fn max_dimension_takes_larger_of_width_and_height() {
        // Regression: 100x50 is one 100px bound, not two independent clamps
        assert_eq!(resolve_max_dimension(Some(100), Some(50)), 100);
        assert_eq!(resolve_max_dimension(Some(50), Some(100)), 100);
    }

    #[test]
    fn max_dimension_defaults_to_4096() {
        assert_eq!(resolve_max_dimension(None, None), 4096);
    }

    #[test]
    fn max_dimension_unset_side_uses_default() {
        assert_eq!(resolve_max_dimension(Some(8000), None), 8000);
        assert_eq!(resolve_max_dimension(None, Some(300)), 4096);
    }

    // =========================================================================
    // fit_within
    // =========================================================================

    #[test]
    fn fit_landscape() {
        assert_eq!(fit_within((4000, 3000), 1000), (1000, 750));
    }

    #[test]
    fn fit_portrait() {
        assert_eq!(fit_within((3000, 4000), 1000), (750, 1000));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_within((640, 480), 4096), (640, 480));
        assert_eq!(fit_within((1000, 1000), 1000), (1000, 1000));
    }

    #[test]
    fn fit_keeps_at_least_one_pixel() {
        assert_eq!(fit_within((10000, 1), 100), (100, 1));
    }

    // =========================================================================
    // calculate_page_layout
    // =========================================================================

    #[test]
    fn page_layout_scales_to_page_width() {
        let layout = calculate_page_layout((1000, 500), (A4_PAGE_WIDTH, A4_PAGE_HEIGHT));
        assert_eq!(layout.image_width, A4_PAGE_WIDTH);
        assert_eq!(layout.scale, A4_PAGE_WIDTH / 1000.0);
        assert_eq!(layout.image_height, A4_PAGE_WIDTH * 500.0 / 1000.0);
    }

    #[test]
    fn page_layout_keeps_page_size() {
        let layout = calculate_page_layout((100, 1000), (A4_PAGE_WIDTH, A4_PAGE_HEIGHT));
        assert_eq!(layout.page_width, A4_PAGE_WIDTH);
        assert_eq!(layout.page_height, A4_PAGE_HEIGHT);
        // Tall image overflows the page rather than shrinking to fit
        assert!(layout.image_height > layout.page_height);
    }

    #[test]
    fn page_layout_square_image() {
        let layout = calculate_page_layout((200, 200), (100.0, 150.0));
        assert_eq!(layout.image_width, 100.0);
        assert_eq!(layout.image_height, 100.0);
        assert_eq!(layout.scale, 0.5);
    }
}
