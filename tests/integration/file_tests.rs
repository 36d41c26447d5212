//! Local file integration tests.
//!
//! Tests verify:
//! - Tiles rendered from a raw file match the in-memory grid
//! - Bitmaps export to PNG with the expected dimensions and pixels

use std::path::PathBuf;

use image::GenericImageView;

use complex_tiles::io::{ByteOrder, FileRangeReader};
use complex_tiles::source::{ComponentType, ContiguousDataset, Datatype};
use complex_tiles::tile::{
    grid_tile, hdf5_tile, BitmapEncoder, ChannelKind, Palette, PixelFormat, TileRenderer,
    TileRequest,
};
use complex_tiles::IoError;

use super::test_utils::{encode_samples, scrambled_grid, storage_layout};

fn temp_path(name: &str, extension: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "complex-tiles-it-{}-{}.{}",
        name,
        std::process::id(),
        extension
    ))
}

#[tokio::test]
async fn test_render_from_raw_file() {
    let grid = scrambled_grid(vec![24, 40]);
    let datatype = Datatype::compound(20, ComponentType::F64, 0, 12)
        .with_byte_order(ByteOrder::BigEndian)
        .with_dimension_order(vec![1, 0]);
    let (shape, samples) = storage_layout(&grid, true);
    let header = 128;

    let path = temp_path("raw", "bin");
    tokio::fs::write(&path, encode_samples(&samples, &datatype, header))
        .await
        .unwrap();

    let reader = FileRangeReader::open(&path).await.unwrap();
    let dataset =
        ContiguousDataset::new(reader, header as u64, shape, datatype.element_size).unwrap();

    for (zoom, origin) in [(0, vec![0, 0]), (0, vec![1, 2]), (1, vec![1, 1]), (2, vec![0, 1])] {
        let request = TileRequest::new(zoom, origin, vec![16, 16], -6.0, 6.0).unwrap();
        let from_grid = grid_tile(&grid, &request, ChannelKind::Imaginary)
            .await
            .unwrap();
        let from_file = hdf5_tile(&dataset, &datatype, &request, ChannelKind::Imaginary)
            .await
            .unwrap();
        assert_eq!(from_grid, from_file, "zoom {}", zoom);
    }

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_truncated_file_is_rejected() {
    let path = temp_path("short", "bin");
    tokio::fs::write(&path, vec![0u8; 100]).await.unwrap();

    let reader = FileRangeReader::open(&path).await.unwrap();
    assert!(ContiguousDataset::new(reader, 0, vec![4, 4], 8).is_err());

    tokio::fs::remove_file(&path).await.unwrap();
}

#[tokio::test]
async fn test_missing_file() {
    let result = FileRangeReader::open(temp_path("missing", "bin")).await;
    assert!(matches!(result, Err(IoError::NotFound(_))));
}

#[tokio::test]
async fn test_png_export() {
    let grid = scrambled_grid(vec![12, 20]);
    let renderer = TileRenderer::with_encoder(BitmapEncoder::new(PixelFormat::Rgba8, Palette::Hot));
    let request = TileRequest::new(0, vec![0, 1], vec![16, 16], -6.0, 6.0).unwrap();
    let bitmap = renderer
        .render_tile(&grid, &request, ChannelKind::Magnitude)
        .await
        .unwrap();

    let path = temp_path("export", "png");
    bitmap.to_image().unwrap().save(&path).unwrap();

    let decoded = image::open(&path).unwrap();
    assert_eq!(decoded.dimensions(), (16, 16));
    let rgba = decoded.to_rgba8();
    assert_eq!(rgba.as_raw().as_slice(), bitmap.as_bytes());

    // Rows 12..16 lie past the grid and are transparent
    assert_eq!(rgba.get_pixel(0, 15).0, [0, 0, 0, 0]);
    assert_eq!(rgba.get_pixel(0, 0).0[3], 255);

    std::fs::remove_file(&path).unwrap();
}
