//! End-to-end detection, consistency filtering and stacking on synthetic frames.

use std::collections::HashSet;

use test_helpers::{add_random_spikes, init_tracing, output_path, PlantedPixel, SyntheticFrame};
use warm_pixels::{
    detect_in_frames, BinAxis, BinScale, DetectionConfig, Frame, PixelLineCollection,
    StackingConfig,
};

const N_FRAMES: usize = 5;
const BAD_COLUMN: usize = 30;

fn planted() -> Vec<PlantedPixel> {
    vec![
        PlantedPixel::new(25, 5, 400.0),
        PlantedPixel::new(60, 12, 400.0),
        PlantedPixel::new(95, 21, 400.0),
        PlantedPixel::new(130, 40, 400.0),
        PlantedPixel::new(40, 45, 1000.0),
        PlantedPixel::new(75, 52, 1000.0),
        PlantedPixel::new(110, 8, 1000.0),
        PlantedPixel::new(150, 35, 1000.0),
    ]
}

/// Frames of one sensor: same warm pixels and column pattern, fresh noise
/// and a few single-frame spikes in each.
fn frames() -> Vec<Frame> {
    let mut builder = SyntheticFrame::new(200, 60)
        .with_noise(100.0, 2.0)
        .with_bad_column(BAD_COLUMN, 200.0);
    for pixel in planted() {
        builder = builder.with_warm_pixel(pixel);
    }

    (0..N_FRAMES)
        .map(|i| {
            let mut image = builder.build(0, 100 + i as u64);
            for (c, mut column) in image.columns_mut().into_iter().enumerate() {
                let offset = 10.0 * (0.7 * c as f64).sin();
                column.mapv_inplace(|v| v + offset);
            }
            add_random_spikes(&mut image, 3, 800.0, 1000 + i as u64);
            Frame::new(image)
                .with_origin(format!("dark_{i}"))
                .with_date(2_459_000.0 + i as f64)
        })
        .collect()
}

fn detection_config() -> DetectionConfig {
    DetectionConfig {
        flux_min: Some(100.0),
        ..Default::default()
    }
}

fn located(collection: &PixelLineCollection) -> HashSet<(usize, usize)> {
    collection
        .locations()
        .into_iter()
        .flatten()
        .map(|[row, col]| (row as usize, col as usize))
        .collect()
}

#[test]
fn test_detection_finds_planted_pixels() {
    init_tracing();
    let lines = detect_in_frames(&frames(), &detection_config());

    let found = located(&lines);
    for pixel in planted() {
        assert!(
            found.contains(&(pixel.row, pixel.col)),
            "warm pixel at ({}, {}) not detected",
            pixel.row,
            pixel.col
        );
    }
    assert!(lines
        .locations()
        .iter()
        .flatten()
        .all(|[_, col]| *col as usize != BAD_COLUMN));
    assert!(lines.lengths().iter().all(|l| *l == Some(9)));
}

#[test]
fn test_consistency_removes_single_frame_spikes() {
    init_tracing();
    let lines = detect_in_frames(&frames(), &detection_config());

    let consistent = lines.subset(&lines.find_consistent_lines(0.8));
    let expected: HashSet<(usize, usize)> = planted().iter().map(|p| (p.row, p.col)).collect();
    assert_eq!(located(&consistent), expected);

    // Every frame contributes to a real warm pixel at most once
    assert!(consistent.n_lines() <= N_FRAMES * expected.len());
    assert!(consistent.n_lines() >= (N_FRAMES - 1) * expected.len());
}

#[test]
fn test_stacking_by_flux() {
    init_tracing();
    let lines = detect_in_frames(&frames(), &detection_config());
    let consistent = lines.subset(&lines.find_consistent_lines(0.8));

    let config = StackingConfig {
        flux: BinAxis::new(2, BinScale::Log).with_range(300.0, 1200.0),
        return_bin_info: true,
        ..Default::default()
    };
    let stacked = consistent.generate_stacked_lines_from_bins(&config).unwrap();

    assert_eq!(stacked.lines.n_lines(), 2);
    let total: usize = stacked.lines.n_stacked().iter().sum();
    assert_eq!(total, consistent.n_lines());

    let faint = &stacked.lines.lines()[0];
    let bright = &stacked.lines.lines()[1];
    for (line, peak) in [(faint, 500.0), (bright, 1100.0)] {
        let data = line.data.as_ref().unwrap();
        assert!((data[0] - peak).abs() < 30.0, "peak {} far from {}", data[0], peak);
        assert!(data[1] < data[0]);
        assert!(data[1] > data[8], "trail should decay");
        assert!(line.noise.is_some());
    }

    let info = stacked.bin_info.unwrap();
    assert_eq!(info.flux.len(), 3);
    assert_eq!(info.flux[0], 300.0);
    assert_eq!(info.flux[2], 1200.0);

    stacked.lines.save(&output_path("stacked_warm_pixels.json")).unwrap();
}

#[test]
fn test_save_and_reload_detections() {
    init_tracing();
    let lines = detect_in_frames(&frames(), &detection_config());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("detections.json");
    lines.save(&path).unwrap();

    let mut restored = PixelLineCollection::new();
    restored.load(&path).unwrap();
    assert_eq!(restored, lines);
    assert_eq!(
        restored.find_consistent_lines(0.8),
        lines.find_consistent_lines(0.8)
    );
}
