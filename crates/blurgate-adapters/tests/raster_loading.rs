//! Integration tests for raster image loading.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use blurgate_adapters::FsImageSource;
use blurgate_core::{ImageInfo, ImageSource, PixelLayout};
use blurgate_test_support::SyntheticFrameBuilder;
use image::{DynamicImage, Rgba, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

/// Writes an 8x8 checkerboard in each raster format into `dir`.
fn write_fixtures(dir: &Path) {
    let rgb = SyntheticFrameBuilder::checkerboard(8, 8).to_dynamic();
    for name in ["test.jpg", "test.png", "test.tiff", "test.bmp"] {
        rgb.save(dir.join(name)).expect("write fixture");
    }
}

fn load_single(path: &Path) -> ImageInfo {
    let source = FsImageSource::new(vec![path.to_path_buf()], false);
    let images: Vec<_> = source.images().collect();
    assert_eq!(images.len(), 1);
    images.into_iter().next().unwrap().expect("should load")
}

#[test]
fn test_load_each_format() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    for name in ["test.jpg", "test.png", "test.tiff", "test.bmp"] {
        let info = load_single(&dir.path().join(name));
        assert_eq!(info.width(), 8, "{name}");
        assert_eq!(info.height(), 8, "{name}");
        assert!(info.path.ends_with(name));
        assert_eq!(info.frame().unwrap().layout(), PixelLayout::Rgb);
    }
}

#[test]
fn test_png_alpha_keeps_rgba_layout() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("alpha.png");
    let img = RgbaImage::from_pixel(6, 4, Rgba([10, 20, 30, 128]));
    DynamicImage::ImageRgba8(img).save(&path).unwrap();

    let info = load_single(&path);
    let frame = info.frame().unwrap();
    assert_eq!(frame.layout(), PixelLayout::Rgba);
    assert_eq!(frame.rgb_at(0, 0), [10, 20, 30]);
}

#[test]
fn test_load_directory_sorted() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    let paths: Vec<String> = source
        .images()
        .map(|r| r.expect("all fixtures should load").path)
        .collect();

    assert_eq!(paths.len(), 4);
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted);
}

#[test]
fn test_count_hint() {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path());

    let source = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    assert_eq!(source.count_hint(), Some(4));
}

#[test]
fn test_recursion_is_opt_in() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    write_fixtures(&nested);

    let flat = FsImageSource::new(vec![dir.path().to_path_buf()], false);
    let deep = FsImageSource::new(vec![dir.path().to_path_buf()], true);

    assert_eq!(flat.count_hint(), Some(0));
    assert_eq!(deep.count_hint(), Some(4));
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"definitely not a png").unwrap();

    let source = FsImageSource::new(vec![path], false);
    let results: Vec<_> = source.images().collect();
    assert_eq!(results.len(), 1);
    assert!(results[0].is_err());
}
