//! In-memory GeoTIFF fixtures.

use std::io::Cursor;

use overlay_common::BoundingBox;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// Builds small float32 GeoTIFFs with tiepoint/pixel-scale georeferencing.
#[derive(Debug, Clone)]
pub struct GeoTiffBuilder {
    width: u32,
    height: u32,
    bbox: BoundingBox,
    data: Vec<f32>,
    nodata: Option<String>,
    georeferenced: bool,
}

impl GeoTiffBuilder {
    /// Start a builder for a `width`×`height` image filled with zeros.
    pub fn new(width: u32, height: u32, bbox: BoundingBox) -> Self {
        Self {
            width,
            height,
            bbox,
            data: vec![0.0; (width * height) as usize],
            nodata: None,
            georeferenced: true,
        }
    }

    /// Fill every sample with `value`.
    pub fn fill(mut self, value: f32) -> Self {
        self.data.iter_mut().for_each(|v| *v = value);
        self
    }

    /// Replace the samples (row-major).
    pub fn data(mut self, data: Vec<f32>) -> Self {
        self.data = data;
        self
    }

    /// Write a GDAL_NODATA tag.
    pub fn nodata(mut self, value: &str) -> Self {
        self.nodata = Some(value.to_string());
        self
    }

    /// Omit the GeoTIFF model tags.
    pub fn without_georeference(mut self) -> Self {
        self.georeferenced = false;
        self
    }

    /// Encode to GeoTIFF bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut buffer).expect("create TIFF encoder");
            let mut image = encoder
                .new_image::<colortype::Gray32Float>(self.width, self.height)
                .expect("create TIFF image");

            if self.georeferenced {
                let scale = [
                    self.bbox.width() / self.width as f64,
                    self.bbox.height() / self.height as f64,
                    0.0,
                ];
                let tiepoint = [0.0, 0.0, 0.0, self.bbox.west, self.bbox.north, 0.0];
                image
                    .encoder()
                    .write_tag(Tag::ModelPixelScaleTag, &scale[..])
                    .expect("write pixel scale");
                image
                    .encoder()
                    .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
                    .expect("write tiepoint");
            }

            if let Some(nodata) = &self.nodata {
                image
                    .encoder()
                    .write_tag(Tag::GdalNodata, nodata.as_str())
                    .expect("write nodata");
            }

            image.write_data(&self.data).expect("write TIFF data");
        }
        buffer.into_inner()
    }
}
