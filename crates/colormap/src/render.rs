//! Grid-to-RGBA rendering through a palette, with optional hill-shading.

use crate::palette::Palette;
use crate::scheme::Rgb;
use surveygrid_algorithms::postprocess::shade_factor;
use surveygrid_core::{Error, Grid, Result};

/// Fully transparent pixel used for no-data cells.
pub const NODATA_RGBA: [u8; 4] = [0, 0, 0, 0];

/// Illumination grid and how strongly it darkens colours.
#[derive(Debug, Clone, Copy)]
pub struct Shading<'a> {
    pub illumination: &'a Grid,
    pub intensity: f64,
}

/// Darken `color` by the hill-shade factor for `illumination`.
/// Alpha is not touched.
pub fn apply_shade(color: Rgb, illumination: f64, intensity: f64) -> Rgb {
    if illumination.is_nan() {
        return color;
    }
    color.scaled(shade_factor(illumination, intensity))
}

/// Convert a grid to an RGBA pixel buffer.
///
/// Returns `width * height * 4` bytes, row-major with the northmost row first,
/// so the buffer can be uploaded as an image without flipping. NaN cells are
/// [`NODATA_RGBA`].
pub fn grid_to_rgba(grid: &Grid, palette: &dyn Palette, shading: Option<Shading<'_>>) -> Result<Vec<u8>> {
    let (width, height) = grid.shape();
    if let Some(s) = &shading {
        if s.illumination.shape() != grid.shape() {
            let (w, h) = s.illumination.shape();
            return Err(Error::InvalidDimensions { width: w, height: h });
        }
    }

    let data = grid.data();
    let mut rgba = vec![0u8; width * height * 4];
    for row in 0..height {
        let y = height - 1 - row;
        for x in 0..width {
            let offset = (row * width + x) * 4;
            let value = data[[x, y]];
            if value.is_nan() {
                rgba[offset..offset + 4].copy_from_slice(&NODATA_RGBA);
                continue;
            }

            let mut color = palette.color_at(value);
            if let Some(s) = &shading {
                color = apply_shade(color, s.illumination.data()[[x, y]], s.intensity);
            }
            rgba[offset..offset + 4].copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    Ok(rgba)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::LinearPalette;
    use crate::scheme::Spectrum;
    use ndarray::array;
    use surveygrid_core::{GeoBounds, LatLon, Range};

    fn bounds() -> GeoBounds {
        GeoBounds::new(LatLon::new(0.0, 0.0), LatLon::new(1.0, 1.0))
    }

    #[test]
    fn test_grid_to_rgba_basic() {
        // [x][y]: (0,0)=0.0 (0,1)=0.5 (1,0)=1.0 (1,1)=NaN
        let g = Grid::from_array(array![[0.0, 0.5], [1.0, f64::NAN]], bounds()).unwrap();
        let palette = LinearPalette::new(Spectrum::Grayscale, Range::new(0.0, 1.0));
        let rgba = grid_to_rgba(&g, &palette, None).unwrap();

        assert_eq!(rgba.len(), 16);
        // top row is y = 1: (0,1) gray, (1,1) transparent
        assert_eq!(&rgba[0..4], &[128, 128, 128, 255]);
        assert_eq!(&rgba[4..8], &NODATA_RGBA);
        // bottom row is y = 0: (0,0) black, (1,0) white
        assert_eq!(&rgba[8..12], &[0, 0, 0, 255]);
        assert_eq!(&rgba[12..16], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_shading_darkens() {
        let g = Grid::filled(1, 1, 1.0, bounds()).unwrap();
        let shade = Grid::filled(1, 1, 0.0, bounds()).unwrap();
        let palette = LinearPalette::new(Spectrum::Grayscale, Range::new(0.0, 1.0));
        let rgba = grid_to_rgba(
            &g,
            &palette,
            Some(Shading {
                illumination: &shade,
                intensity: 0.5,
            }),
        )
        .unwrap();
        assert_eq!(rgba, vec![128, 128, 128, 255]);
    }

    #[test]
    fn test_apply_shade() {
        let c = Rgb::new(100, 200, 40);
        assert_eq!(apply_shade(c, 1.0, 0.5), c);
        assert_eq!(apply_shade(c, 0.0, 1.0), Rgb::new(0, 0, 0));
        assert_eq!(apply_shade(c, f64::NAN, 1.0), c);
    }

    #[test]
    fn test_shading_shape_mismatch() {
        let g = Grid::filled(2, 2, 1.0, bounds()).unwrap();
        let shade = Grid::filled(1, 1, 1.0, bounds()).unwrap();
        let palette = LinearPalette::new(Spectrum::Grayscale, Range::new(0.0, 1.0));
        let shading = Shading {
            illumination: &shade,
            intensity: 0.5,
        };
        assert!(grid_to_rgba(&g, &palette, Some(shading)).is_err());
    }
}
