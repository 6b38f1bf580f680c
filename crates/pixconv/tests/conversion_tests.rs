//! Pipeline behavior across the format matrix.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use pixconv::format::{self, FormatId};
use pixconv::pipeline::NoopProgress;
use pixconv::{ConversionError, ConversionSettings, ErrorKind};

fn settings(compression_level: u8, remove_background: bool) -> ConversionSettings {
    ConversionSettings {
        compression_level,
        remove_background,
    }
}

#[test]
fn test_every_raster_pair_produces_target_mime() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));

    for &(source, _) in RASTER_INPUTS {
        let input = fixture(source);
        for target in FormatId::ALL {
            if target == source {
                continue;
            }
            let artifact = pipeline
                .convert(&input, source, target, &settings(85, false), &NoopProgress)
                .unwrap_or_else(|e| panic!("{} -> {} failed: {}", source, target, e));

            assert_eq!(
                artifact.mime_type,
                format::mime_for_format(target),
                "{} -> {}",
                source,
                target
            );
            assert!(!artifact.is_empty(), "{} -> {} is empty", source, target);
        }
    }
}

#[test]
fn test_png_at_full_quality_is_lossless() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));
    let original = gradient(32, 20);
    let input = encode(&original, FormatId::Png);

    let artifact = pipeline
        .convert(&input, FormatId::Png, FormatId::Png, &settings(100, false), &NoopProgress)
        .unwrap();

    assert_eq!(decode(&artifact.bytes).to_rgba8(), original);
    assert_eq!(artifact.dimensions, Some((32, 20)));
}

#[test]
fn test_webp_is_lossless() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));
    let original = gradient(32, 20);
    let input = encode(&original, FormatId::Png);

    let artifact = pipeline
        .convert(&input, FormatId::Png, FormatId::Webp, &settings(100, false), &NoopProgress)
        .unwrap();

    assert_eq!(artifact.mime_type, "image/webp");
    assert_eq!(decode(&artifact.bytes).to_rgba8(), original);
}

#[test]
fn test_jpeg_size_grows_with_quality() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));
    let input = encode(&noise(64, 64), FormatId::Png);

    let high = pipeline
        .convert(&input, FormatId::Png, FormatId::Jpeg, &settings(95, false), &NoopProgress)
        .unwrap();
    let low = pipeline
        .convert(&input, FormatId::Png, FormatId::Jpeg, &settings(10, false), &NoopProgress)
        .unwrap();

    assert!(
        high.len() >= low.len(),
        "q95 produced {} bytes, q10 produced {}",
        high.len(),
        low.len()
    );
}

#[test]
fn test_background_removal_reaches_png_output() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));
    let input = fixture(FormatId::Jpeg);

    let artifact = pipeline
        .convert(&input, FormatId::Jpeg, FormatId::Png, &settings(85, true), &NoopProgress)
        .unwrap();

    let out = decode(&artifact.bytes).to_rgba8();
    assert_eq!(out.get_pixel(0, 0)[3], 0);
    assert_eq!(out.get_pixel(out.width() - 1, 0)[3], 255);
}

#[test]
fn test_ico_output_is_square_and_bounded() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));
    let input = encode(&gradient(300, 120), FormatId::Png);

    let artifact = pipeline
        .convert(&input, FormatId::Png, FormatId::Ico, &settings(85, false), &NoopProgress)
        .unwrap();

    let (w, h) = artifact.dimensions.unwrap();
    assert_eq!(w, h);
    assert!(w <= 256);
}

#[test]
fn test_pdf_output_is_marked_degraded() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));

    let artifact = pipeline
        .convert(
            &fixture(FormatId::Bmp),
            FormatId::Bmp,
            FormatId::Pdf,
            &settings(85, false),
            &NoopProgress,
        )
        .unwrap();

    assert!(artifact.bytes.starts_with(b"%PDF"));
    assert!(artifact.degraded);
}

#[test]
fn test_truncated_jpeg_fails_to_decode() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));

    let err = pipeline
        .convert(&truncated_jpeg(), FormatId::Jpeg, FormatId::Png, &settings(85, false), &NoopProgress)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DecodeFailed);
}

#[test]
fn test_svg_passes_through_to_itself_only() {
    let pipeline = pipeline_with(Arc::new(HalfCutout), Duration::from_secs(5));

    let same = pipeline
        .convert(MINIMAL_SVG, FormatId::Svg, FormatId::Svg, &settings(85, false), &NoopProgress)
        .unwrap();
    assert_eq!(same.bytes, MINIMAL_SVG);
    assert_eq!(same.mime_type, "image/svg+xml");

    let err = pipeline
        .convert(MINIMAL_SVG, FormatId::Svg, FormatId::Png, &settings(85, false), &NoopProgress)
        .unwrap_err();
    assert!(matches!(err, ConversionError::UnsupportedConversion { .. }));
}

#[test]
fn test_background_removal_timeout() {
    let pipeline = pipeline_with(
        Arc::new(Stalled(Duration::from_secs(2))),
        Duration::from_millis(50),
    );

    let err = pipeline
        .convert(&fixture(FormatId::Png), FormatId::Png, FormatId::Webp, &settings(85, true), &NoopProgress)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BackgroundRemovalFailed);
}
