use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use mask::{
    collect_images, BatchRunner, ItemOutcome, ItemStage, RawMask, Result, SegmentationPort,
    SegmentationResult,
};

/// Deterministic stand-in for a model: `count` vertical stripes, one per mask.
struct StripeSegmenter {
    count: usize,
}

impl SegmentationPort for StripeSegmenter {
    fn infer(&self, image: &RgbImage, _prompt: &str) -> Result<SegmentationResult> {
        let (width, height) = image.dimensions();
        let masks = (0..self.count)
            .map(|i| RawMask::from_fn(width, height, |x, _| x as usize % self.count == i))
            .collect();
        let scores = (0..self.count).map(|i| 1.0 - i as f32 * 0.1).collect();
        Ok(SegmentationResult::new(masks, scores))
    }
}

fn write_image(dir: &Path, name: &str, seed: u8) {
    let image = RgbImage::from_fn(24, 16, |x, y| {
        Rgb([seed.wrapping_add(x as u8 * 7), (y as u8).wrapping_mul(13), 90])
    });
    image.save(dir.join(name)).unwrap();
}

#[test]
fn corrupt_image_is_skipped_and_batch_completes() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write_image(input.path(), "a.png", 10);
    fs::write(input.path().join("b.jpg"), b"definitely not a jpeg").unwrap();
    write_image(input.path(), "c.bmp", 200);

    let runner = BatchRunner::builder(StripeSegmenter { count: 2 })
        .prompt("stripes")
        .results_dir(output.path())
        .build()
        .unwrap();

    let report = runner.run_directory(input.path()).unwrap();
    assert_eq!(report.len(), 3);
    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.skipped(), 1);

    assert!(report.items[0].outcome.is_done());
    assert_eq!(report.items[1].stem, "b");
    assert_eq!(report.items[1].stage, ItemStage::Pending);
    assert!(matches!(
        report.items[1].outcome,
        ItemOutcome::SkippedLoadFailure { .. }
    ));
    assert!(report.items[2].outcome.is_done());

    assert!(output.path().join("a_result.jpg").is_file());
    assert!(!output.path().join("b_result.jpg").exists());
    assert!(output.path().join("c_result.jpg").is_file());
    assert!(!output.path().join("a_mask_01.png").exists());
}

#[test]
fn seven_masks_export_seven_binary_pngs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_image(input.path(), "scene.png", 0);

    let runner = BatchRunner::builder(StripeSegmenter { count: 7 })
        .prompt("stripes")
        .results_dir(output.path())
        .save_individual_masks(true)
        .build()
        .unwrap();

    let report = runner.run(&collect_images(input.path()).unwrap());
    match &report.items[0].outcome {
        ItemOutcome::Done {
            mask_count, scores, ..
        } => {
            assert_eq!(*mask_count, 7);
            assert_eq!(scores.len(), 7);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    for number in 1..=7usize {
        let path = output.path().join(format!("scene_mask_{:02}.png", number));
        let mask = image::open(&path).unwrap();
        assert_eq!(mask.color(), image::ColorType::L8);

        let gray = mask.to_luma8();
        for (x, _, pixel) in gray.enumerate_pixels() {
            let member = x as usize % 7 == number - 1;
            assert_eq!(pixel[0], if member { 255 } else { 0 });
        }
    }
    assert!(!output.path().join("scene_mask_08.png").exists());
    assert!(output.path().join("scene_result.jpg").is_file());
}

#[test]
fn repeated_runs_are_byte_identical() {
    let input = tempfile::tempdir().unwrap();
    write_image(input.path(), "one.png", 33);
    write_image(input.path(), "two.tif", 99);

    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();

    for out in [first.path(), second.path()] {
        let runner = BatchRunner::builder(StripeSegmenter { count: 3 })
            .prompt("stripes")
            .results_dir(out)
            .build()
            .unwrap();
        let report = runner.run_directory(input.path()).unwrap();
        assert_eq!(report.succeeded(), 2);
    }

    for name in ["one_result.jpg", "two_result.jpg"] {
        let a = fs::read(first.path().join(name)).unwrap();
        let b = fs::read(second.path().join(name)).unwrap();
        assert_eq!(a, b, "{} differs between runs", name);
    }
}

#[test]
fn missing_directory_fails_before_processing() {
    let output = tempfile::tempdir().unwrap();
    let runner = BatchRunner::builder(StripeSegmenter { count: 1 })
        .prompt("stripes")
        .results_dir(output.path())
        .build()
        .unwrap();

    let err = runner
        .run_directory(output.path().join("nope"))
        .unwrap_err();
    assert!(matches!(err, mask::MaskError::DirectoryNotFound { .. }));
}
