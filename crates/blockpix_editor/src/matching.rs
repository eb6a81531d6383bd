//! Automatic block placement by nearest-color matching
//!
//! Samples the rectified region of the reference picture down to the block
//! grid's resolution and paints each cell with the enabled block type whose
//! average color is nearest in RGB.

use blockpix_core::BlockBuffer;
use image::imageops::{self, FilterType};
use log::warn;

use crate::reference::{PerspectiveError, ReferencePicture};

/// Fill `blocks` from the rectified picture region.
///
/// Requires a computed warp ([`ReferencePicture::set_perspective`] has run).
/// Mostly-transparent samples clear their cell instead of painting it.
/// Returns the number of cells painted with a block type.
pub fn place_blocks(
    picture: &ReferencePicture,
    blocks: &mut BlockBuffer,
) -> Result<usize, PerspectiveError> {
    let img = picture.warped().ok_or(PerspectiveError::NoWarped)?;
    let wr = picture.warped_rect.ok_or(PerspectiveError::NoWarped)?;

    let palette: Vec<(String, [u8; 3])> = blocks
        .catalog()
        .matchable()
        .map(|t| (t.id.clone(), t.color))
        .collect();
    if palette.is_empty() {
        warn!("place_blocks: no block types enabled for matching");
        return Ok(0);
    }
    if blocks.col == 0 || blocks.row == 0 {
        return Ok(0);
    }

    // Crop the rectified region, clamped to the warped bitmap
    let x0 = (wr.x.round().max(0.0) as u32).min(img.width().saturating_sub(1));
    let y0 = (wr.y.round().max(0.0) as u32).min(img.height().saturating_sub(1));
    let w = (wr.w.round() as u32).clamp(1, img.width() - x0);
    let h = (wr.h.round() as u32).clamp(1, img.height() - y0);
    let cropped = imageops::crop_imm(img, x0, y0, w, h).to_image();

    // One sample per cell
    let sampled = imageops::resize(&cropped, blocks.col, blocks.row, FilterType::Triangle);

    let mut painted = 0;
    for y in 0..blocks.row {
        for x in 0..blocks.col {
            let px = sampled.get_pixel(x, y).0;
            if px[3] < 128 {
                blocks.set_block(x as i32, y as i32, None);
                continue;
            }
            let id = nearest(&palette, [px[0], px[1], px[2]]);
            blocks.set_block(x as i32, y as i32, Some(id));
            painted += 1;
        }
    }
    Ok(painted)
}

/// Id of the palette entry nearest to `rgb` by squared distance. The palette
/// must be non-empty.
fn nearest(palette: &[(String, [u8; 3])], rgb: [u8; 3]) -> &str {
    let mut best = &palette[0];
    let mut best_d = u32::MAX;
    for entry in palette {
        let d: u32 = entry
            .1
            .iter()
            .zip(rgb.iter())
            .map(|(&a, &b)| {
                let diff = a as i32 - b as i32;
                (diff * diff) as u32
            })
            .sum();
        if d < best_d {
            best_d = d;
            best = entry;
        }
    }
    &best.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpix_core::Rect;
    use image::{Rgba, RgbaImage};

    fn solid_picture(w: u32, h: u32, color: [u8; 4]) -> ReferencePicture {
        let mut img = RgbaImage::new(w, h);
        for p in img.pixels_mut() {
            *p = Rgba(color);
        }
        let mut rp = ReferencePicture::new();
        rp.load_picture(img);
        rp.set_perspective(&Rect::new(0.0, 0.0, w as f64, h as f64))
            .unwrap();
        rp
    }

    #[test]
    fn test_exact_palette_color_wins() {
        // White wool's exact catalog color
        let rp = solid_picture(16, 16, [233, 236, 236, 255]);
        let mut bb = BlockBuffer::new(4, 4);
        let painted = place_blocks(&rp, &mut bb).unwrap();
        assert_eq!(painted, 16);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(bb.get_block(x, y), Some("white_wool"));
            }
        }
    }

    #[test]
    fn test_disabled_types_are_skipped() {
        let rp = solid_picture(8, 8, [233, 236, 236, 255]);
        let mut bb = BlockBuffer::new(2, 2);
        bb.catalog_mut().set_type_enabled("white_wool", false);
        place_blocks(&rp, &mut bb).unwrap();
        // Next-nearest to white wool's color
        assert_eq!(bb.get_block(0, 0), Some("white_concrete"));
    }

    #[test]
    fn test_transparent_samples_clear_cells() {
        let rp = solid_picture(8, 8, [255, 0, 0, 0]);
        let mut bb = BlockBuffer::new(2, 2);
        bb.set_block(0, 0, Some("lime_wool"));
        let painted = place_blocks(&rp, &mut bb).unwrap();
        assert_eq!(painted, 0);
        assert_eq!(bb.get_block(0, 0), None);
    }

    #[test]
    fn test_requires_computed_warp() {
        let rp = ReferencePicture::new();
        let mut bb = BlockBuffer::new(2, 2);
        assert_eq!(
            place_blocks(&rp, &mut bb),
            Err(PerspectiveError::NoWarped)
        );
    }

    #[test]
    fn test_empty_palette_places_nothing() {
        let rp = solid_picture(8, 8, [10, 10, 10, 255]);
        let mut bb = BlockBuffer::new(2, 2);
        for name in ["Wool", "Concrete", "Terracotta"] {
            bb.catalog_mut().set_group_enabled(name, false);
        }
        assert_eq!(place_blocks(&rp, &mut bb), Ok(0));
        assert_eq!(bb.get_block(0, 0), None);
    }
}
