use std::fs;
use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};

use shape_moments_lib::output::{HOG_FILE, HU_FILE, MOMENTS_FILE, REPORT_FILE, ZERNIKE_FILE};
use shape_moments_lib::{
    extract_feature_dataset, generate_mask_dataset, run_dataset, Config, LogBase, Strategy,
    HOG_LENGTH, ZERNIKE_COUNT,
};

/// Green backdrop with a skin-coloured rectangle
fn hand_image(w: u32, h: u32) -> RgbImage {
    RgbImage::from_fn(320, 240, |x, y| {
        let inside = x >= 100 && x < 100 + w && y >= 60 && y < 60 + h;
        if inside { Rgb([205, 150, 130]) } else { Rgb([35, 190, 70]) }
    })
}

fn square_mask(side: u32) -> GrayImage {
    GrayImage::from_fn(256, 256, |x, y| {
        let lo = 128 - side / 2;
        let inside = x >= lo && x < lo + side && y >= lo && y < lo + side;
        Luma([if inside { 255 } else { 0 }])
    })
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let header = reader.headers().unwrap().iter().map(|s| s.to_string()).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
        .collect();
    (header, rows)
}

fn config_for(input: &Path, output: &Path) -> Config {
    let mut config = Config::default();
    config.input_path = input.to_str().unwrap().to_string();
    config.output_base_dir = output.to_str().unwrap().to_string();
    config
}

#[test]
fn run_writes_three_tables_and_skips_corrupt_images() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let rock = input.path().join("rock");
    let paper = input.path().join("paper");
    fs::create_dir_all(&rock).unwrap();
    fs::create_dir_all(&paper).unwrap();
    fs::create_dir_all(input.path().join("scissors")).unwrap();

    hand_image(80, 80).save(rock.join("r1.png")).unwrap();
    hand_image(90, 70).save(rock.join("r2.png")).unwrap();
    hand_image(150, 120).save(paper.join("p1.png")).unwrap();
    fs::write(paper.join("p2.jpg"), b"truncated").unwrap();

    let mut config = config_for(input.path(), output.path());
    config.strategy = Strategy::ChromaKey;
    config.class_aliases.insert("rock".to_string(), "piedra".to_string());
    config.class_aliases.insert("paper".to_string(), "papel".to_string());

    let report = run_dataset(&config).unwrap();
    assert_eq!(report.classes, vec!["papel", "piedra"]);
    assert_eq!(report.skipped.len(), 1);

    let moments = report.count_for(MOMENTS_FILE).unwrap();
    assert_eq!((moments.attempted, moments.produced), (4, 3));
    assert_eq!(report.count_for(HU_FILE).unwrap().produced, 3);
    assert_eq!(report.count_for(ZERNIKE_FILE).unwrap().produced, 3);

    let (header, rows) = read_csv(&output.path().join(MOMENTS_FILE));
    assert_eq!(header.len(), 25);
    assert_eq!(header.first().unwrap(), "m00");
    assert_eq!(header.last().unwrap(), "clase");
    let labels: Vec<_> = rows.iter().map(|r| r[24].as_str()).collect();
    assert_eq!(labels, vec!["papel", "piedra", "piedra"]);

    // m00 is log-scaled: ln(area + 1) for a ~15000 px hand after resizing
    let m00: f64 = rows[0][0].parse().unwrap();
    assert!(m00 > 8.0 && m00 < 10.0, "m00 {}", m00);

    let (zernike_header, _) = read_csv(&output.path().join(ZERNIKE_FILE));
    assert_eq!(zernike_header.len(), ZERNIKE_COUNT + 1);

    assert!(output.path().join("masks").join("piedra").join("r1.png").exists());
    assert!(output.path().join(REPORT_FILE).exists());
}

#[test]
fn extract_omits_zernike_rows_for_empty_masks() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let class_dir = input.path().join("normal");
    fs::create_dir_all(&class_dir).unwrap();
    square_mask(20).save(class_dir.join("a.png")).unwrap();
    square_mask(40).save(class_dir.join("b.png")).unwrap();
    GrayImage::new(256, 256).save(class_dir.join("c.png")).unwrap();

    let mut config = config_for(input.path(), output.path());
    config.log_base = LogBase::Base10;

    let report = extract_feature_dataset(&config).unwrap();
    assert_eq!(report.count_for(MOMENTS_FILE).unwrap().produced, 3);
    assert_eq!(report.count_for(HU_FILE).unwrap().produced, 3);
    let zernike = report.count_for(ZERNIKE_FILE).unwrap();
    assert_eq!((zernike.attempted, zernike.produced), (3, 2));

    let (_, rows) = read_csv(&output.path().join(MOMENTS_FILE));
    let m00: f64 = rows[0][0].parse().unwrap();
    assert!((m00 - 401f64.log10()).abs() < 1e-9);
    // Empty mask: every value falls back to zero
    assert!(rows[2][..24].iter().all(|v| v.parse::<f64>().unwrap() == 0.0));

    let (_, zernike_rows) = read_csv(&output.path().join(ZERNIKE_FILE));
    assert_eq!(zernike_rows.len(), 2);
    assert!(zernike_rows.iter().all(|r| r.len() == ZERNIKE_COUNT + 1));
}

#[test]
fn hog_table_is_written_only_when_enabled() {
    let input = tempfile::tempdir().unwrap();
    let class_dir = input.path().join("normal");
    fs::create_dir_all(&class_dir).unwrap();
    square_mask(30).save(class_dir.join("a.png")).unwrap();
    GrayImage::new(256, 256).save(class_dir.join("b.png")).unwrap();

    let output = tempfile::tempdir().unwrap();
    let mut config = config_for(input.path(), output.path());
    config.extract_hog = true;

    let report = extract_feature_dataset(&config).unwrap();
    let hog = report.count_for(HOG_FILE).unwrap();
    assert_eq!((hog.attempted, hog.produced), (2, 2));

    let (header, rows) = read_csv(&output.path().join(HOG_FILE));
    assert_eq!(header.len(), HOG_LENGTH + 1);
    assert_eq!(header.last().unwrap(), "clase");
    assert_eq!(rows.len(), 2);
    assert!(rows[0][..HOG_LENGTH].iter().any(|v| v.parse::<f64>().unwrap() > 0.0));

    let plain_output = tempfile::tempdir().unwrap();
    let report = extract_feature_dataset(&config_for(input.path(), plain_output.path())).unwrap();
    assert!(report.count_for(HOG_FILE).is_none());
    assert!(!plain_output.path().join(HOG_FILE).exists());
}

#[test]
fn no_classes_is_not_an_error() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    let report = extract_feature_dataset(&config_for(input.path(), output.path())).unwrap();
    assert!(report.classes.is_empty());
    assert_eq!(report.count_for(MOMENTS_FILE).unwrap().produced, 0);
    assert!(!output.path().join(MOMENTS_FILE).exists());
}

#[test]
fn empty_class_directory_produces_no_rows() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::create_dir_all(input.path().join("abnormal")).unwrap();

    let report = run_dataset(&config_for(input.path(), output.path())).unwrap();
    assert!(report.classes.is_empty());
    assert_eq!(report.count_for(HU_FILE).unwrap().attempted, 0);
}

#[test]
fn segment_samples_reproducibly() {
    let input = tempfile::tempdir().unwrap();
    let class_dir = input.path().join("sperm");
    fs::create_dir_all(&class_dir).unwrap();
    for i in 0..6 {
        let image = RgbImage::from_fn(128, 128, |x, y| {
            let dark = (50 + i..80 + i).contains(&x) && (50..75).contains(&y);
            if dark { Rgb([70, 70, 70]) } else { Rgb([185, 185, 185]) }
        });
        image.save(class_dir.join(format!("img{}.bmp", i))).unwrap();
    }

    let list_masks = |seed: u64| {
        let output = tempfile::tempdir().unwrap();
        let mut config = config_for(input.path(), output.path());
        config.samples_per_class = Some(3);
        config.seed = seed;

        let report = generate_mask_dataset(&config).unwrap();
        let count = report.count_for("masks").unwrap();
        assert_eq!((count.attempted, count.produced), (3, 3));

        let mut names: Vec<_> = fs::read_dir(output.path().join("sperm"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_str().unwrap().to_string())
            .collect();
        names.sort();
        names
    };

    let first = list_masks(56);
    assert_eq!(first.len(), 3);
    assert_eq!(first, list_masks(56));
}

#[test]
fn masks_with_the_same_stem_are_counted_once() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let class_dir = input.path().join("normal");
    fs::create_dir_all(&class_dir).unwrap();

    let image = RgbImage::from_fn(64, 64, |x, y| {
        let inside = (20..44).contains(&x) && (20..44).contains(&y);
        if inside { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
    });
    image.save(class_dir.join("a.png")).unwrap();
    image.save(class_dir.join("a.bmp")).unwrap();
    image.save(class_dir.join("b.png")).unwrap();

    let mut config = config_for(input.path(), output.path());
    config.strategy = Strategy::GlobalOtsu;

    let report = generate_mask_dataset(&config).unwrap();
    let count = report.count_for("masks").unwrap();
    assert_eq!((count.attempted, count.produced), (3, 2));
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.ends_with("a.png"));

    let on_disk = fs::read_dir(output.path().join("normal")).unwrap().count();
    assert_eq!(on_disk, count.produced);
}
