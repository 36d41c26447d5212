//! Grid and disk-resident backend integration tests.
//!
//! Tests verify:
//! - Both backends render byte-identical bitmaps for the same data
//! - Datatype layouts (precision, compound, byte order, axis order)
//! - Hyperslab reads only touch the rows a tile needs
//! - Shared dataset handles serve concurrent renders
//! - Storage failures surface with the failing window

use std::sync::Arc;

use complex_tiles::io::ByteOrder;
use complex_tiles::source::hdf5::MAX_OVERREAD;
use complex_tiles::source::{
    ComponentType, ContiguousDataset, Datatype, GridSource, Hdf5Source, SharedDataset, Source,
};
use complex_tiles::tile::{
    grid_tile, hdf5_tile, imaginary_grid_tile, imaginary_hdf5_tile, resolve, BitmapEncoder,
    ChannelKind, Palette, PixelFormat, Sample, TileRenderer, TileRequest,
};
use complex_tiles::{LayoutError, TileError};

use super::test_utils::{coordinate_grid, dataset_from_grid, scrambled_grid, FailingReader};

fn layouts() -> Vec<Datatype> {
    vec![
        Datatype::complex64(),
        Datatype::complex128(),
        Datatype::complex128().with_byte_order(ByteOrder::BigEndian),
        Datatype::compound(24, ComponentType::F64, 16, 0),
        Datatype::compound(12, ComponentType::F32, 0, 8).with_byte_order(ByteOrder::BigEndian),
        Datatype::complex64().with_dimension_order(vec![1, 0]),
    ]
}

// =============================================================================
// Backend Equivalence
// =============================================================================

#[tokio::test]
async fn test_imaginary_entry_points_agree() {
    let grid = scrambled_grid(vec![19, 23]);

    for datatype in layouts() {
        let (dataset, _) = dataset_from_grid(&grid, &datatype, 0);
        for (zoom, origin) in [(0, [0, 0]), (0, [2, 3]), (1, [1, 1]), (2, [0, 0]), (3, [1, 0])] {
            let from_grid = imaginary_grid_tile(&grid, zoom, &origin, &[8, 8], -6.0, 6.0)
                .await
                .unwrap();
            let from_disk =
                imaginary_hdf5_tile(&dataset, &datatype, zoom, &origin, &[8, 8], -6.0, 6.0)
                    .await
                    .unwrap();
            assert_eq!(
                from_grid, from_disk,
                "{:?} zoom {} origin {:?}",
                datatype, zoom, origin
            );
        }
    }
}

#[tokio::test]
async fn test_all_channels_agree() {
    let grid = scrambled_grid(vec![16, 16]);
    let datatype = Datatype::compound(16, ComponentType::F32, 12, 4);
    let (dataset, _) = dataset_from_grid(&grid, &datatype, 64);

    for channel in ChannelKind::ALL {
        let (min, max) = channel.natural_range().unwrap_or((-6.0, 6.0));
        let request = TileRequest::new(1, vec![0, 1], vec![8, 8], min, max).unwrap();
        let from_grid = grid_tile(&grid, &request, channel).await.unwrap();
        let from_disk = hdf5_tile(&dataset, &datatype, &request, channel)
            .await
            .unwrap();
        assert_eq!(from_grid, from_disk, "{}", channel);
    }
}

#[tokio::test]
async fn test_color_formats_agree() {
    let grid = scrambled_grid(vec![10, 10]);
    let datatype = Datatype::complex128();
    let (dataset, _) = dataset_from_grid(&grid, &datatype, 0);
    let source = Hdf5Source::new(&dataset, datatype).unwrap();
    let request = TileRequest::new(0, vec![1, 1], vec![8, 8], -6.0, 6.0).unwrap();

    for format in [PixelFormat::Rgb8, PixelFormat::Rgba8] {
        for palette in [Palette::Gray, Palette::Hot, Palette::Cyclic] {
            let renderer = TileRenderer::with_encoder(BitmapEncoder::new(format, palette));
            let from_grid = renderer
                .render_tile(&grid, &request, ChannelKind::Phase)
                .await
                .unwrap();
            let from_disk = renderer
                .render_tile(&source, &request, ChannelKind::Phase)
                .await
                .unwrap();
            assert_eq!(from_grid, from_disk, "{} {}", format, palette);
        }
    }
}

#[tokio::test]
async fn test_stored_nan_components_agree() {
    // Every third sample carries a NaN component
    let grid = GridSource::from_fn(vec![12, 12], |i| match (i[0] * 12 + i[1]) % 3 {
        0 => Sample::new(1.0, f64::NAN),
        1 => Sample::new(f64::NAN, -2.5),
        _ => Sample::new(i[1] as f64 / 4.0, i[0] as f64 / 4.0),
    })
    .unwrap();

    for datatype in layouts() {
        let (dataset, _) = dataset_from_grid(&grid, &datatype, 0);
        let source = Hdf5Source::new(&dataset, datatype.clone()).unwrap();
        let request = TileRequest::new(0, vec![0, 0], vec![8, 16], -3.0, 3.0).unwrap();

        for channel in ChannelKind::ALL {
            let renderer = TileRenderer::with_encoder(BitmapEncoder::new(
                PixelFormat::Rgba8,
                Palette::Hot,
            ));
            let from_grid = renderer.render_tile(&grid, &request, channel).await.unwrap();
            let from_disk = renderer
                .render_tile(&source, &request, channel)
                .await
                .unwrap();
            assert_eq!(from_grid, from_disk, "{:?} {}", datatype, channel);
            // A NaN imaginary part leaves the real channel intact
            if channel == ChannelKind::Real {
                assert!(!from_disk.is_background(0, 0));
            }
            if channel == ChannelKind::Imaginary {
                assert!(from_disk.is_background(0, 0));
            }
        }
    }
}

#[tokio::test]
async fn test_transposed_dataset_reports_logical_shape() {
    let grid = coordinate_grid(5, 9);
    let datatype = Datatype::complex64().with_dimension_order(vec![1, 0]);
    let (dataset, _) = dataset_from_grid(&grid, &datatype, 0);
    let source = Hdf5Source::new(dataset, datatype).unwrap();

    assert_eq!(source.shape(), &[5, 9]);
    assert_eq!(source.index_type(), grid.index_type());
}

// =============================================================================
// Read Patterns
// =============================================================================

#[tokio::test]
async fn test_tile_reads_only_needed_rows() {
    let grid = scrambled_grid(vec![64, 64]);
    let datatype = Datatype::complex64();
    let (dataset, reader) = dataset_from_grid(&grid, &datatype, 0);
    let source = Hdf5Source::new(dataset, datatype).unwrap();

    let window = resolve(0, &[1, 2], &[4, 8], source.shape()).unwrap();
    source.read_window(&window).await.unwrap();

    // One coalesced read per selected row, starting at the selected column
    let requests = reader.get_requests().await;
    assert_eq!(requests.len(), 4);
    for (row, &(offset, len)) in requests.iter().enumerate() {
        let expected = ((1 + row) * 64 + 2) * 8;
        assert_eq!(offset, expected as u64);
        assert_eq!(len, 8 * 8);
    }
}

#[tokio::test]
async fn test_coarse_zoom_overread_is_bounded() {
    let grid = scrambled_grid(vec![512, 512]);
    let datatype = Datatype::complex64();
    let (dataset, reader) = dataset_from_grid(&grid, &datatype, 0);

    let mut seen = 0;
    for (zoom, tile) in [(2, 64usize), (4, 32), (6, 8)] {
        let request = TileRequest::new(zoom, vec![0, 0], vec![tile, tile], -6.0, 6.0).unwrap();
        let from_grid = grid_tile(&grid, &request, ChannelKind::Imaginary).await.unwrap();
        let from_disk = hdf5_tile(&dataset, &datatype, &request, ChannelKind::Imaginary)
            .await
            .unwrap();
        assert_eq!(from_grid, from_disk, "zoom {}", zoom);

        let requests = reader.get_requests().await;
        let read: usize = requests[seen..].iter().map(|&(_, len)| len).sum();
        seen = requests.len();

        let useful = tile * tile * 8;
        assert!(
            read <= useful * MAX_OVERREAD,
            "zoom {} read {} bytes for {} useful",
            zoom,
            read,
            useful
        );
    }
}

#[tokio::test]
async fn test_clipped_tile_reads_in_bounds_part_only() {
    let grid = scrambled_grid(vec![10, 10]);
    let datatype = Datatype::complex128();
    let (dataset, reader) = dataset_from_grid(&grid, &datatype, 32);
    let source = Hdf5Source::new(dataset, datatype).unwrap();

    let window = resolve(0, &[8, 6], &[4, 8], source.shape()).unwrap();
    let samples = source.read_window(&window).await.unwrap();
    assert_eq!(samples.len(), 32);

    let requests = reader.get_requests().await;
    assert_eq!(requests, vec![(32 + (8 * 10 + 6) * 16, 4 * 16), (32 + (9 * 10 + 6) * 16, 4 * 16)]);
}

#[tokio::test]
async fn test_tile_outside_dataset_issues_no_reads() {
    let grid = scrambled_grid(vec![8, 8]);
    let datatype = Datatype::complex64();
    let (dataset, reader) = dataset_from_grid(&grid, &datatype, 0);

    let bitmap = imaginary_hdf5_tile(&dataset, &datatype, 1, &[4, 0], &[4, 4], -6.0, 6.0)
        .await
        .unwrap();

    assert!(bitmap.as_bytes().iter().all(|&b| b == 0));
    assert_eq!(reader.request_count(), 0);
}

// =============================================================================
// Shared Handles
// =============================================================================

#[tokio::test]
async fn test_shared_dataset_concurrent_renders() {
    let grid = Arc::new(scrambled_grid(vec![32, 32]));
    let datatype = Datatype::complex64();
    let (dataset, reader) = dataset_from_grid(&grid, &datatype, 0);
    let shared = SharedDataset::new(dataset);

    let mut handles = Vec::new();
    for i in 0..4 {
        let shared = shared.clone();
        let datatype = datatype.clone();
        let grid = Arc::clone(&grid);
        handles.push(tokio::spawn(async move {
            let request = TileRequest::new(0, vec![i, i], vec![8, 8], -6.0, 6.0).unwrap();
            let from_disk = hdf5_tile(&shared, &datatype, &request, ChannelKind::Real).await?;
            let from_grid = grid_tile(grid.as_ref(), &request, ChannelKind::Real).await?;
            Ok::<_, TileError>((from_grid, from_disk))
        }));
    }

    for handle in handles {
        let (from_grid, from_disk) = handle.await.unwrap().unwrap();
        assert_eq!(from_grid, from_disk);
    }
    assert_eq!(reader.request_count(), 4 * 8);

    // Every guard was released
    let guard = shared.lock().await;
    assert_eq!(guard.reader().request_count(), 4 * 8);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_storage_failure_carries_window() {
    let datatype = Datatype::complex64();
    let dataset = ContiguousDataset::new(FailingReader::new(1 << 16), 0, vec![32, 32], 8).unwrap();
    let request = TileRequest::new(1, vec![1, 1], vec![4, 4], 0.0, 1.0).unwrap();

    match hdf5_tile(&dataset, &datatype, &request, ChannelKind::Imaginary).await {
        Err(TileError::SourceRead { window, .. }) => {
            assert_eq!(window.start, vec![2, 2]);
            assert_eq!(window.stride, 2);
            assert_eq!(window.count, vec![4, 4]);
        }
        other => panic!("Expected SourceRead error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_layout_mismatch_is_rejected() {
    let grid = scrambled_grid(vec![4, 4]);
    let (dataset, reader) = dataset_from_grid(&grid, &Datatype::complex64(), 0);

    let result =
        imaginary_hdf5_tile(&dataset, &Datatype::complex128(), 0, &[0, 0], &[4, 4], 0.0, 1.0).await;
    assert!(matches!(
        result,
        Err(TileError::DataLayout(LayoutError::ElementSize { .. }))
    ));

    let wrong_axes = Datatype::complex64().with_dimension_order(vec![0, 1, 2]);
    let result = imaginary_hdf5_tile(&dataset, &wrong_axes, 0, &[0, 0], &[4, 4], 0.0, 1.0).await;
    assert!(matches!(result, Err(TileError::DataLayout(_))));

    assert_eq!(reader.request_count(), 0);
}
