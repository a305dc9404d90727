use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use toa_convert::core::{derive_geometry, radiometric_transform, resolve_band, Satellite};
use toa_convert::io::metadata::read_calibration;
use toa_convert::{convert_scene, ToaConfig, ToaError, ToaRequest, NODATA_SENTINEL};

const COLS: usize = 3;
const ROWS: usize = 2;
const GEO_TRANSFORM: [f64; 6] = [500000.0, 1.24, 0.0, 4200000.0, 0.0, -1.24];

const BAND_1: [u16; 6] = [0, 120, 340, 560, 780, 2047];
const BAND_2: [u16; 6] = [15, 0, 0, 415, 1023, 64];

fn scene_xml(satellite: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<isd>
  <IMD>
    <VERSION>28.4</VERSION>
    <IMAGEDESCRIPTOR>ORStandard2A</IMAGEDESCRIPTOR>
    <BANDID>MS1</BANDID>
    <IMAGE>
      <SATID>{}</SATID>
    </IMAGE>
    <BAND_C>
      <ABSCALFACTOR>1.397474000000000e-02</ABSCALFACTOR>
      <EFFECTIVEBANDWIDTH>4.050000000000000e-02</EFFECTIVEBANDWIDTH>
    </BAND_C>
    <BAND_N2>
      <ABSCALFACTOR>9.042234000000000e-03</ABSCALFACTOR>
      <EFFECTIVEBANDWIDTH>9.890000000000000e-02</EFFECTIVEBANDWIDTH>
    </BAND_N2>
  </IMD>
</isd>
"#,
        satellite
    )
}

const SCENE_IMD: &str = r#"BEGIN_GROUP = IMAGE_1
	satId = "WV03";
	firstLineTime = 2021-10-27T11:41:57.133850Z;
	meanSunAz = 160.1;
	meanSunEl = 32.6;
END_GROUP = IMAGE_1
END;
"#;

struct Scene {
    _dir: TempDir,
    request: ToaRequest,
}

fn write_input_raster(path: &Path) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut dataset = driver
        .create_with_band_type::<u16, _>(path, COLS as isize, ROWS as isize, 2)
        .unwrap();
    dataset.set_geo_transform(&GEO_TRANSFORM).unwrap();

    for (index, values) in [(1, BAND_1), (2, BAND_2)] {
        let mut band = dataset.rasterband(index).unwrap();
        band.set_no_data_value(Some(0.0)).unwrap();
        let buffer = Buffer::new((COLS, ROWS), values.to_vec());
        band.write((0, 0), (COLS, ROWS), &buffer).unwrap();
    }
}

fn create_scene(satellite: &str) -> Scene {
    let dir = TempDir::new().unwrap();
    let image = dir.path().join("21OCT27114157-M1BS.TIF");
    let imd = dir.path().join("21OCT27114157-M1BS.IMD");
    let xml = dir.path().join("21OCT27114157-M1BS.XML");

    write_input_raster(&image);
    std::fs::write(&imd, SCENE_IMD).unwrap();
    std::fs::write(&xml, scene_xml(satellite)).unwrap();

    Scene {
        _dir: dir,
        request: ToaRequest { image, imd, xml },
    }
}

fn read_band(path: &Path, band: isize) -> Vec<f32> {
    let dataset = Dataset::open(path).unwrap();
    let raster = dataset.rasterband(band).unwrap();
    raster
        .read_as::<f32>((0, 0), (COLS, ROWS), (COLS, ROWS), None)
        .unwrap()
        .data
}

fn output_path(scene: &Scene, suffix: &str) -> PathBuf {
    scene.request.image.with_file_name(format!("21OCT27114157-M1BS{}", suffix))
}

#[test]
fn test_convert_scene_end_to_end() {
    let _ = env_logger::builder().is_test(true).try_init();
    let scene = create_scene("WV03");

    let outputs = convert_scene(&scene.request, &ToaConfig::default()).unwrap();
    assert_eq!(outputs.radiance_path, output_path(&scene, "_TOA_RADIANCES.TIF"));
    assert_eq!(outputs.reflectance_path, output_path(&scene, "_TOA_REFLECTANCES.TIF"));
    assert_eq!(outputs.satellite, Satellite::WV03);
    assert_eq!(outputs.summary.bands.len(), 2);
    assert_eq!(outputs.summary.bands[0].nodata_pixels, 1);
    assert_eq!(outputs.summary.bands[1].nodata_pixels, 2);

    let geometry = derive_geometry(
        "\tfirstLineTime = 2021-10-27T11:41:57.133850Z;",
        "\tmeanSunEl = 32.6;",
    )
    .unwrap();
    assert_eq!(outputs.geometry, geometry);

    let calibration = read_calibration(&scene.request.imd, &scene.request.xml).unwrap();
    assert!(calibration.mapping.contains_key("1__BAND_C__ABSCALFACTOR"));
    assert!(calibration.mapping.contains_key("2__BAND_N2__ABSCALFACTOR"));
    let irradiances = Satellite::WV03.irradiances();

    for (band, dns) in [(1usize, BAND_1), (2usize, BAND_2)] {
        let cal = resolve_band(band, &calibration.mapping, &irradiances).unwrap();
        let radiance = read_band(&outputs.radiance_path, band as isize);
        let reflectance = read_band(&outputs.reflectance_path, band as isize);

        for (i, &dn) in dns.iter().enumerate() {
            let expected = radiometric_transform(dn as i64, Some(0), &cal, &geometry);
            assert_eq!(radiance[i], expected.radiance, "band {} pixel {}", band, i);
            assert_eq!(reflectance[i], expected.reflectance, "band {} pixel {}", band, i);
        }
    }

    let radiance = read_band(&outputs.radiance_path, 1);
    assert_eq!(radiance[0], NODATA_SENTINEL);

    let dataset = Dataset::open(&outputs.reflectance_path).unwrap();
    assert_eq!(dataset.raster_count(), 2);
    assert_eq!(dataset.raster_size(), (COLS, ROWS));
    assert_eq!(dataset.geo_transform().unwrap(), GEO_TRANSFORM);
}

#[test]
fn test_existing_outputs_are_replaced() {
    let scene = create_scene("WV03");
    let radiance_path = output_path(&scene, "_TOA_RADIANCES.TIF");
    std::fs::write(&radiance_path, b"stale output").unwrap();

    let outputs = convert_scene(&scene.request, &ToaConfig::default()).unwrap();
    assert_eq!(outputs.radiance_path, radiance_path);
    assert!(Dataset::open(&radiance_path).is_ok());
}

#[test]
fn test_no_overwrite_reports_collision() {
    let scene = create_scene("WV03");
    let reflectance_path = output_path(&scene, "_TOA_REFLECTANCES.TIF");
    std::fs::write(&reflectance_path, b"keep me").unwrap();

    let config = ToaConfig {
        overwrite_existing: false,
        ..ToaConfig::default()
    };
    let result = convert_scene(&scene.request, &config);
    assert!(matches!(result, Err(ToaError::OutputCollision { .. })));
    assert_eq!(std::fs::read(&reflectance_path).unwrap(), b"keep me");
}

#[test]
fn test_unknown_satellite_creates_no_outputs() {
    let scene = create_scene("XX99");

    let result = convert_scene(&scene.request, &ToaConfig::default());
    assert!(matches!(result, Err(ToaError::UnknownSatellite(id)) if id == "XX99"));
    assert!(!output_path(&scene, "_TOA_RADIANCES.TIF").exists());
    assert!(!output_path(&scene, "_TOA_REFLECTANCES.TIF").exists());
}

#[test]
fn test_missing_input_file() {
    let scene = create_scene("WV03");
    let request = ToaRequest {
        imd: scene.request.imd.with_extension("missing"),
        ..scene.request.clone()
    };

    match convert_scene(&request, &ToaConfig::default()) {
        Err(ToaError::FileNotFound(path)) => assert_eq!(path, request.imd),
        other => panic!("expected FileNotFound, got {:?}", other.map(|o| o.radiance_path)),
    }
}
