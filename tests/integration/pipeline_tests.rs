//! End-to-end tile pipeline tests over in-memory grids.
//!
//! Tests verify:
//! - Known intensities for a simple ramp
//! - Boundary tiles match direct extraction inside and background outside
//! - Every pyramid level covers the source exactly once
//! - Renders are deterministic, including under concurrency

use std::sync::Arc;

use complex_tiles::source::{GridSource, Source};
use complex_tiles::tile::{
    extract, imaginary_grid_tile, normalize, quantize, resolve, BitmapEncoder, ChannelKind,
    Palette, PixelFormat, Pyramid, Sample, TileRenderer, TileRequest,
};
use complex_tiles::TileError;

use super::test_utils::{coordinate_grid, scrambled_grid};

fn rgba_renderer() -> TileRenderer {
    TileRenderer::with_encoder(BitmapEncoder::new(PixelFormat::Rgba8, Palette::Cyclic))
}

// =============================================================================
// Known Values
// =============================================================================

#[tokio::test]
async fn test_row_index_ramp() {
    let grid = GridSource::from_fn(vec![4, 4], |i| Sample::new(0.0, i[0] as f64)).unwrap();
    let bitmap = imaginary_grid_tile(&grid, 0, &[0, 0], &[4, 4], 0.0, 3.0)
        .await
        .unwrap();

    // Intensities 0, 1/3, 2/3 and 1 per row
    let expected: Vec<u8> = [0u8, 85, 170, 255]
        .iter()
        .flat_map(|&v| std::iter::repeat(v).take(4))
        .collect();
    assert_eq!(bitmap.as_bytes(), expected.as_slice());
}

#[tokio::test]
async fn test_values_outside_range_are_clamped() {
    let grid = coordinate_grid(1, 8);
    let request = TileRequest::new(0, vec![0, 0], vec![1, 8], 2.0, 5.0).unwrap();
    let bitmap = TileRenderer::new()
        .render_tile(&grid, &request, ChannelKind::Real)
        .await
        .unwrap();

    assert_eq!(bitmap.as_bytes(), &[0, 0, 0, 85, 170, 255, 255, 255]);
}

#[tokio::test]
async fn test_window_shape_ignores_bounds() {
    for zoom in 0..6u32 {
        let window = resolve(zoom, &[3, 5], &[16, 8], &[10, 10]).unwrap();
        assert_eq!(window.stride, 1 << zoom);
        assert_eq!(window.count, vec![16, 8]);
        assert_eq!(window.start, vec![3 << zoom, 5 << zoom]);
    }
}

// =============================================================================
// Boundaries
// =============================================================================

#[tokio::test]
async fn test_boundary_tile_matches_direct_extraction() {
    let grid = scrambled_grid(vec![13, 11]);
    let (zoom, origin, tile) = (1u32, [4usize, 2usize], [4usize, 4usize]);
    let (min, max) = (-6.0, 6.0);

    for channel in ChannelKind::ALL {
        let request = TileRequest::new(zoom as i32, origin.to_vec(), tile.to_vec(), min, max).unwrap();
        let bitmap = TileRenderer::new()
            .render_tile(&grid, &request, channel)
            .await
            .unwrap();
        let window = resolve(zoom, &origin, &tile, grid.shape()).unwrap();

        for y in 0..tile[0] {
            for x in 0..tile[1] {
                let index = [window.source_index(0, y), window.source_index(1, x)];
                let pixel = bitmap.pixel(x, y).unwrap();
                match grid.get(&index) {
                    Some(sample) => {
                        let expected = quantize(normalize(extract(sample, channel), min, max));
                        assert_eq!(pixel, &[expected], "{} at {:?}", channel, index);
                    }
                    None => assert!(bitmap.is_background(x, y), "{:?} outside grid", index),
                }
            }
        }
    }
}

#[tokio::test]
async fn test_full_source_has_no_background() {
    let grid = scrambled_grid(vec![8, 12]);
    let request = TileRequest::new(0, vec![0, 0], vec![8, 12], -6.0, 6.0).unwrap();
    let bitmap = rgba_renderer()
        .render_tile(&grid, &request, ChannelKind::Phase)
        .await
        .unwrap();

    for y in 0..8 {
        for x in 0..12 {
            assert!(!bitmap.is_background(x, y));
        }
    }
}

#[tokio::test]
async fn test_pyramid_levels_cover_source() {
    let grid = scrambled_grid(vec![37, 21]);
    let pyramid = Pyramid::new(grid.shape(), &[8, 8]).unwrap();
    let renderer = rgba_renderer();

    for level in &pyramid.levels {
        let mut covered = 0;
        for ty in 0..level.tiles[0] {
            for tx in 0..level.tiles[1] {
                let origin = pyramid.tile_origin(level.zoom, &[ty, tx]).unwrap();
                let request =
                    TileRequest::new(level.zoom as i32, origin, vec![8, 8], -6.0, 6.0).unwrap();
                let bitmap = renderer
                    .render_tile(&grid, &request, ChannelKind::Magnitude)
                    .await
                    .unwrap();
                for y in 0..8 {
                    for x in 0..8 {
                        if !bitmap.is_background(x, y) {
                            covered += 1;
                        }
                    }
                }
            }
        }
        assert_eq!(covered, level.extent.iter().product::<usize>(), "zoom {}", level.zoom);
    }
}

#[tokio::test]
async fn test_nan_component_is_background() {
    let grid = GridSource::from_fn(vec![3, 3], |i| {
        if i[0] == 1 {
            Sample::new(1.0, f64::NAN)
        } else {
            Sample::new(1.0, 1.0)
        }
    })
    .unwrap();
    let request = TileRequest::new(0, vec![0, 0], vec![3, 3], 0.0, 2.0).unwrap();
    let renderer = rgba_renderer();

    let imaginary = renderer
        .render_tile(&grid, &request, ChannelKind::Imaginary)
        .await
        .unwrap();
    let magnitude = renderer
        .render_tile(&grid, &request, ChannelKind::Magnitude)
        .await
        .unwrap();
    let real = renderer
        .render_tile(&grid, &request, ChannelKind::Real)
        .await
        .unwrap();

    for x in 0..3 {
        assert!(imaginary.is_background(x, 1));
        assert!(magnitude.is_background(x, 1));
        assert!(!real.is_background(x, 1));
        assert!(!imaginary.is_background(x, 0));
    }
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_invalid_requests_fail_fast() {
    let grid = coordinate_grid(4, 4);

    let cases = [
        imaginary_grid_tile(&grid, -2, &[0, 0], &[4, 4], 0.0, 1.0).await,
        imaginary_grid_tile(&grid, 0, &[0, 0], &[0, 4], 0.0, 1.0).await,
        imaginary_grid_tile(&grid, 0, &[0], &[4, 4], 0.0, 1.0).await,
        imaginary_grid_tile(&grid, 0, &[0, 0], &[4, 4], 3.0, 1.0).await,
        imaginary_grid_tile(&grid, 80, &[0, 0], &[4, 4], 0.0, 1.0).await,
        imaginary_grid_tile(&grid, 0, &[usize::MAX, 0], &[4, 4], 0.0, 1.0).await,
        imaginary_grid_tile(&grid, 0, &[0, 0], &[1 << 40, 1 << 40], 0.0, 3.0).await,
    ];
    for result in cases {
        assert!(matches!(result, Err(TileError::InvalidRequest { .. })));
    }
}

// =============================================================================
// Determinism
// =============================================================================

#[tokio::test]
async fn test_concurrent_renders_are_identical() {
    let grid = Arc::new(scrambled_grid(vec![64, 64]));
    let renderer = rgba_renderer();
    let request = TileRequest::new(1, vec![1, 1], vec![16, 16], -6.0, 6.0).unwrap();

    let expected = renderer
        .render_tile(grid.as_ref(), &request, ChannelKind::Phase)
        .await
        .unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let grid = Arc::clone(&grid);
        let request = request.clone();
        handles.push(tokio::spawn(async move {
            renderer
                .render_tile(grid.as_ref(), &request, ChannelKind::Phase)
                .await
        }));
    }

    for handle in handles {
        let bitmap = handle.await.unwrap().unwrap();
        assert_eq!(bitmap, expected);
    }
}
