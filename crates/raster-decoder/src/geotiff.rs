//! GeoTIFF container decoding.

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use overlay_common::{BoundingBox, Raster};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeResult};

/// Axis-aligned mapping from pixel space to model (lon/lat) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    /// Model x of the top-left corner of pixel (0, 0)
    pub origin_x: f64,
    /// Model y of the top-left corner of pixel (0, 0)
    pub origin_y: f64,
    /// Model units per pixel along x (positive eastward)
    pub pixel_width: f64,
    /// Model units per pixel along y (positive downward, i.e. southward)
    pub pixel_height: f64,
}

impl Georeference {
    /// Bounding box covered by a `width`×`height` image.
    ///
    /// Edges are normalized so that `west < east` and `south < north`
    /// regardless of the sign of the pixel sizes.
    pub fn bbox(&self, width: usize, height: usize) -> BoundingBox {
        let x1 = self.origin_x;
        let y1 = self.origin_y;
        let x2 = x1 + self.pixel_width * width as f64;
        let y2 = y1 - self.pixel_height * height as f64;

        BoundingBox::new(x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
    }
}

/// Decode a GeoTIFF held in memory.
///
/// Multi-band images yield their first band only.
pub fn decode(bytes: &[u8]) -> DecodeResult<Raster> {
    decode_from_reader(Cursor::new(bytes))
}

/// Read and decode a GeoTIFF file.
pub fn decode_file(path: impl AsRef<Path>) -> DecodeResult<Raster> {
    let bytes = std::fs::read(path.as_ref())?;
    decode(&bytes)
}

fn decode_from_reader<R: Read + Seek>(reader: R) -> DecodeResult<Raster> {
    let mut decoder = Decoder::new(reader)?;

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);

    let samples_per_pixel = decoder
        .find_tag_unsigned::<u16>(Tag::SamplesPerPixel)?
        .unwrap_or(1)
        .max(1) as usize;
    let planar_separate = decoder
        .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
        .map(|p| p == 2)
        .unwrap_or(false);

    let georef = read_georeference(&mut decoder)?;
    let nodata = read_nodata(&mut decoder);

    let values = to_f32(decoder.read_image()?);
    let band = first_band(values, width * height, samples_per_pixel, planar_separate);

    let bbox = georef.bbox(width, height);
    debug!(
        width = width,
        height = height,
        bands = samples_per_pixel,
        bbox = %bbox,
        nodata = ?nodata,
        "Decoded GeoTIFF"
    );

    let raster = Raster::new(band, width, height, bbox)
        .map_err(|e| DecodeError::InvalidRaster(e.to_string()))?;

    Ok(raster.with_nodata(nodata))
}

/// Read the pixel→model mapping from the GeoTIFF tags.
fn read_georeference<R: Read + Seek>(decoder: &mut Decoder<R>) -> DecodeResult<Georeference> {
    let scale = optional_f64_vec(decoder, Tag::ModelPixelScaleTag)?;
    let tiepoint = optional_f64_vec(decoder, Tag::ModelTiepointTag)?;

    if let (Some(scale), Some(tiepoint)) = (scale, tiepoint) {
        if scale.len() < 2 || tiepoint.len() < 6 {
            return Err(DecodeError::MissingGeoreference(format!(
                "expected >= 2 pixel scale and >= 6 tiepoint values, got {} and {}",
                scale.len(),
                tiepoint.len()
            )));
        }

        let (sx, sy) = (scale[0], scale[1]);
        // Tiepoint maps raster (i, j) to model (x, y).
        let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);

        return Ok(Georeference {
            origin_x: x - i * sx,
            origin_y: y + j * sy,
            pixel_width: sx,
            pixel_height: sy,
        });
    }

    if let Some(matrix) = optional_f64_vec(decoder, Tag::ModelTransformationTag)? {
        if matrix.len() < 16 {
            return Err(DecodeError::MissingGeoreference(format!(
                "transformation matrix has {} values, expected 16",
                matrix.len()
            )));
        }
        if matrix[1] != 0.0 || matrix[4] != 0.0 {
            return Err(DecodeError::UnsupportedGeoreference(
                "rotated model transformation".to_string(),
            ));
        }

        return Ok(Georeference {
            origin_x: matrix[3],
            origin_y: matrix[7],
            pixel_width: matrix[0],
            pixel_height: -matrix[5],
        });
    }

    Err(DecodeError::MissingGeoreference(
        "no ModelPixelScale/ModelTiepoint or ModelTransformation tags".to_string(),
    ))
}

fn optional_f64_vec<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    tag: Tag,
) -> DecodeResult<Option<Vec<f64>>> {
    match decoder.find_tag(tag)? {
        Some(value) => Ok(Some(value.into_f64_vec()?)),
        None => Ok(None),
    }
}

/// GDAL stores the nodata value as an ASCII string.
fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    let raw = match decoder.find_tag(Tag::GdalNodata) {
        Ok(Some(value)) => value.into_string().ok()?,
        Ok(None) => return None,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable GDAL_NODATA tag");
            return None;
        }
    };

    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match trimmed.parse::<f32>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(value = %trimmed, "Ignoring non-numeric GDAL_NODATA value");
            None
        }
    }
}

fn to_f32(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::U64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::I32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::I64(v) => v.into_iter().map(|x| x as f32).collect(),
    }
}

/// Extract band 0 from decoded samples.
///
/// Chunky (interleaved) images carry `samples_per_pixel` values per pixel;
/// planar images are already decoded as the first plane only.
fn first_band(
    values: Vec<f32>,
    pixel_count: usize,
    samples_per_pixel: usize,
    planar_separate: bool,
) -> Vec<f32> {
    if samples_per_pixel <= 1 || planar_separate {
        let mut values = values;
        values.truncate(pixel_count);
        return values;
    }

    values
        .chunks_exact(samples_per_pixel)
        .take(pixel_count)
        .map(|pixel| pixel[0])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_georeference_bbox_north_up() {
        let georef = Georeference {
            origin_x: -60.0,
            origin_y: -10.0,
            pixel_width: 0.2,
            pixel_height: 0.3,
        };
        let bbox = georef.bbox(100, 100);
        assert!((bbox.west + 60.0).abs() < 1e-9);
        assert!((bbox.east + 40.0).abs() < 1e-9);
        assert!((bbox.north + 10.0).abs() < 1e-9);
        assert!((bbox.south + 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_first_band_interleaved() {
        let values = vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0];
        assert_eq!(first_band(values, 3, 2, false), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_first_band_planar() {
        let values = vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0];
        assert_eq!(first_band(values, 3, 2, true), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result = decode(b"not a tiff at all");
        assert!(matches!(result, Err(DecodeError::Tiff(_))));
    }
}
