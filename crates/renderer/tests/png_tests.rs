//! Tests for PNG encoding of rendered tiles.
//!
//! Encoded tiles are decoded with the `image` crate to check that indexed
//! and RGBA output carry the same pixels.

use renderer::png::{encode_auto, encode_indexed, encode_rgba, PngError};
use renderer::{render_tile, Color, Palette, RasterAccessor, TransparencyPolicy};
use test_utils::{bbox, east_gradient_raster, uniform_raster};

// ============================================================================
// Helper functions
// ============================================================================

fn decode_rgba(png: &[u8]) -> (u32, u32, Vec<u8>) {
    let img = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("valid PNG")
        .to_rgba8();
    (img.width(), img.height(), img.into_raw())
}

/// IHDR color type byte
fn color_type(png: &[u8]) -> u8 {
    png[25]
}

fn noisy_pixels(width: usize, height: usize) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| [(i % 251) as u8, (i / 251 % 253) as u8, (i * 7 % 255) as u8, 255])
        .collect()
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_overlay_tile_encodes_indexed() {
    let raster = uniform_raster(100, 100, 0.5, bbox::SOUTH_AMERICA);
    // half the tile is outside the raster
    let tile = render_tile(
        &RasterAccessor::new(&raster),
        &overlay_common::BoundingBox::new(-45.0, -30.0, -35.0, -20.0),
        256,
        Palette::Viridis,
        &TransparencyPolicy::default(),
        0.7,
    );

    let png = tile.to_png().unwrap();
    assert_eq!(color_type(&png), 3);

    let (w, h, pixels) = decode_rgba(&png);
    assert_eq!((w, h), (256, 256));
    assert_eq!(pixels, tile.pixels());
}

#[test]
fn test_many_colors_fall_back_to_rgba() {
    let pixels = noisy_pixels(64, 64);
    let png = encode_auto(&pixels, 64, 64).unwrap();
    assert_eq!(color_type(&png), 6);

    let (_, _, decoded) = decode_rgba(&png);
    assert_eq!(decoded, pixels);
}

#[test]
fn test_gradient_tile_round_trips_through_either_encoding() {
    let raster = east_gradient_raster(512, 8, bbox::SOUTH_AMERICA);
    let tile = render_tile(
        &RasterAccessor::new(&raster),
        &bbox::SOUTH_AMERICA,
        256,
        Palette::Cubehelix,
        &TransparencyPolicy::new(0.1),
        1.0,
    );

    let auto = tile.to_png().unwrap();
    let rgba = encode_rgba(tile.pixels(), 256, 256).unwrap();

    assert_eq!(decode_rgba(&auto).2, tile.pixels());
    assert_eq!(decode_rgba(&rgba).2, tile.pixels());
}

#[test]
fn test_indexed_with_transparency() {
    let palette = [Color::TRANSPARENT, Color::rgb(206, 149, 72)];
    let indices = [0, 1, 1, 0];
    let png = encode_indexed(2, 2, &palette, &indices).unwrap();

    let (_, _, decoded) = decode_rgba(&png);
    assert_eq!(
        decoded,
        vec![0, 0, 0, 0, 206, 149, 72, 255, 206, 149, 72, 255, 0, 0, 0, 0]
    );
}

#[test]
fn test_indexed_rejects_oversized_palette() {
    let palette = vec![Color::rgb(0, 0, 0); 257];
    let err = encode_indexed(1, 1, &palette, &[0]).unwrap_err();
    assert!(matches!(err, PngError::PaletteTooLarge(257)));
}

#[test]
fn test_indexed_is_smaller_than_rgba_for_overlay_tiles() {
    let raster = uniform_raster(10, 10, 0.8, bbox::SOUTH_AMERICA);
    let tile = render_tile(
        &RasterAccessor::new(&raster),
        &bbox::INSIDE_SOUTH_AMERICA,
        256,
        Palette::Inferno,
        &TransparencyPolicy::default(),
        1.0,
    );

    let indexed = tile.to_png().unwrap();
    let rgba = encode_rgba(tile.pixels(), 256, 256).unwrap();
    assert!(indexed.len() <= rgba.len());
}
