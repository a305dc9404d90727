//! Metadata ingest for DigitalGlobe/Maxar deliveries
//!
//! Calibration fields come from the `.XML` (`isd/IMD/BAND_*`) or, failing that,
//! from the `BEGIN_GROUP = BAND_*` blocks of the `.IMD`. Both are flattened into
//! a [`RawCalibrationMapping`](crate::types::RawCalibrationMapping) keyed `<bandIndex>__<bandTag>__<FIELD>`, with band
//! indices counted from 1 in document order so they line up with GDAL bands.
//! Scalar `IMD` fields whose name mentions a band (`BANDID`) are not counted.

use crate::types::{BandTag, CalibrationMetadata, SceneTiming, ToaError, ToaResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::path::Path;

const TIMESTAMP_KEY: &str = "firstLineTime";
const SUN_ELEVATION_KEY: &str = "meanSunEl";

fn read_text_file(path: &Path) -> ToaResult<String> {
    if !path.exists() {
        return Err(ToaError::FileNotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

fn calibration_key(band_number: usize, band_element: &str, field: &str) -> String {
    format!("{}__{}__{}", band_number, band_element, field)
}

/// Read calibration fields and satellite id from the `.XML` metadata file
pub fn read_xml_calibration<P: AsRef<Path>>(xml_path: P) -> ToaResult<CalibrationMetadata> {
    let xml_path = xml_path.as_ref();
    log::info!("Reading calibration metadata from XML: {}", xml_path.display());
    let content = read_text_file(xml_path)?;
    parse_xml_calibration(&content)
}

fn is_imd_child(path: &[String]) -> bool {
    path.len() == 2 && path[0] == "isd" && path[1] == "IMD"
}

fn is_band_group(path: &[String]) -> bool {
    path.len() >= 3 && path[0] == "isd" && path[1] == "IMD" && path[2].contains("BAND")
}

/// Band element numbering for the `isd/IMD` children.
///
/// Known band tags take a number as soon as they open. Other `*BAND*` elements
/// only take one once a child element appears, so scalar fields such as
/// `<BANDID>MS1</BANDID>` never shift the band groups that follow them.
#[derive(Debug, Default)]
struct BandCounter {
    count: usize,
    current_counted: bool,
}

impl BandCounter {
    fn open_imd_child(&mut self, name: &str) {
        self.current_counted = false;
        if name.parse::<BandTag>().is_ok() {
            self.count += 1;
            self.current_counted = true;
            log::debug!("XML band element {} -> band {}", name, self.count);
        }
    }

    fn open_group_child(&mut self, group: &str) {
        if !self.current_counted {
            self.count += 1;
            self.current_counted = true;
            log::debug!("XML band element {} -> band {}", group, self.count);
        }
    }
}

fn record_value(metadata: &mut CalibrationMetadata, path: &[String], band_number: usize, value: String) {
    if path.len() != 4 || path[0] != "isd" || path[1] != "IMD" {
        return;
    }
    if path[2] == "IMAGE" && path[3] == "SATID" {
        metadata.satellite_id = value;
    } else if path[2].contains("BAND") {
        metadata
            .mapping
            .insert(calibration_key(band_number, &path[2], &path[3]), value);
    }
}

/// Parse the `isd/IMD` section of DigitalGlobe XML metadata
pub fn parse_xml_calibration(xml_content: &str) -> ToaResult<CalibrationMetadata> {
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut bands = BandCounter::default();
    let mut metadata = CalibrationMetadata::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if is_imd_child(&path) {
                    bands.open_imd_child(&name);
                } else if path.len() == 3 && is_band_group(&path) {
                    bands.open_group_child(&path[2]);
                }
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if is_imd_child(&path) {
                    bands.open_imd_child(&name);
                } else if path.len() == 3 && is_band_group(&path) {
                    bands.open_group_child(&path[2]);
                    path.push(name);
                    record_value(&mut metadata, &path, bands.count, String::new());
                    path.pop();
                }
            }
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(text)) => {
                if path.len() != 4 {
                    continue;
                }
                let value = text
                    .unescape()
                    .map_err(|e| ToaError::XmlParsing(format!("invalid text in <{}>: {}", path[3], e)))?
                    .trim()
                    .to_string();
                record_value(&mut metadata, &path, bands.count, value);
            }
            Ok(Event::CData(data)) => {
                if path.len() != 4 {
                    continue;
                }
                let value = String::from_utf8_lossy(&data).trim().to_string();
                record_value(&mut metadata, &path, bands.count, value);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ToaError::XmlParsing(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    log::info!(
        "Parsed {} calibration entries for {} band(s) from XML (satellite: {})",
        metadata.mapping.len(),
        bands.count,
        if metadata.satellite_id.is_empty() { "unknown" } else { metadata.satellite_id.as_str() }
    );
    Ok(metadata)
}

/// Read calibration fields and satellite id from the `.IMD` file
pub fn read_imd_calibration<P: AsRef<Path>>(imd_path: P) -> ToaResult<CalibrationMetadata> {
    let imd_path = imd_path.as_ref();
    log::info!("Reading calibration metadata from IMD: {}", imd_path.display());
    let content = read_text_file(imd_path)?;
    parse_imd_calibration(&content)
}

/// Parse `BEGIN_GROUP = BAND_*` blocks and `satId` from IMD text
pub fn parse_imd_calibration(imd_content: &str) -> ToaResult<CalibrationMetadata> {
    let assignment = Regex::new(r#"^\s*(\w+)\s*=\s*(.*?)\s*;?\s*$"#)
        .map_err(|e| ToaError::MetadataParse(format!("Regex error: {}", e)))?;

    let mut metadata = CalibrationMetadata::default();
    let mut band_number = 0usize;
    let mut current_band: Option<String> = None;

    for line in imd_content.lines() {
        let Some(captures) = assignment.captures(line) else {
            continue;
        };
        let key = &captures[1];
        let value = captures[2].trim_matches('"').trim();

        match key {
            "BEGIN_GROUP" => {
                if value.contains("BAND") {
                    band_number += 1;
                    current_band = Some(value.to_string());
                } else {
                    current_band = None;
                }
            }
            "END_GROUP" => current_band = None,
            "satId" => metadata.satellite_id = value.to_string(),
            field => {
                if let Some(band) = &current_band {
                    metadata.mapping.insert(
                        calibration_key(band_number, band, &field.to_uppercase()),
                        value.to_string(),
                    );
                }
            }
        }
    }

    log::info!(
        "Parsed {} calibration entries for {} band(s) from IMD",
        metadata.mapping.len(),
        band_number
    );
    Ok(metadata)
}

/// Calibration metadata from the XML, falling back to the IMD band groups
pub fn read_calibration<P: AsRef<Path>, Q: AsRef<Path>>(
    imd_path: P,
    xml_path: Q,
) -> ToaResult<CalibrationMetadata> {
    let mut metadata = read_xml_calibration(xml_path.as_ref())?;

    if metadata.band_count() == 0 {
        log::warn!(
            "No band calibration found in {}, using IMD band groups instead",
            xml_path.as_ref().display()
        );
        let imd = read_imd_calibration(imd_path.as_ref())?;
        metadata.mapping = imd.mapping;
        if metadata.satellite_id.is_empty() {
            metadata.satellite_id = imd.satellite_id;
        }
    }

    if metadata.satellite_id.is_empty() {
        return Err(ToaError::MetadataParse(format!(
            "no satellite id (isd/IMD/IMAGE/SATID) in {}",
            xml_path.as_ref().display()
        )));
    }
    if metadata.band_count() == 0 {
        return Err(ToaError::MetadataParse(
            "no band calibration entries in XML or IMD metadata".to_string(),
        ));
    }
    Ok(metadata)
}

/// Read the acquisition time and mean sun elevation lines from the `.IMD` file
pub fn read_scene_timing<P: AsRef<Path>>(imd_path: P) -> ToaResult<SceneTiming> {
    let imd_path = imd_path.as_ref();
    log::info!("Reading scene timing from IMD: {}", imd_path.display());
    let content = read_text_file(imd_path)?;

    parse_scene_timing(&content).map_err(|e| match e {
        ToaError::MetadataParse(msg) => {
            ToaError::MetadataParse(format!("{}: {}", msg, imd_path.display()))
        }
        other => other,
    })
}

/// Last `firstLineTime` and `meanSunEl` lines of IMD text
pub fn parse_scene_timing(imd_content: &str) -> ToaResult<SceneTiming> {
    let mut timestamp_line = None;
    let mut sun_elevation_line = None;

    for line in imd_content.lines() {
        if line.contains(TIMESTAMP_KEY) {
            timestamp_line = Some(line);
        }
        if line.contains(SUN_ELEVATION_KEY) {
            sun_elevation_line = Some(line);
        }
    }

    let timestamp_line = timestamp_line.ok_or_else(|| {
        ToaError::MetadataParse("IMD file does not have first line time".to_string())
    })?;
    let sun_elevation_line = sun_elevation_line.ok_or_else(|| {
        ToaError::MetadataParse("IMD file does not have mean sun elevation".to_string())
    })?;

    log::debug!("Timestamp line: {}", timestamp_line.trim());
    log::debug!("Sun elevation line: {}", sun_elevation_line.trim());

    Ok(SceneTiming {
        timestamp_line: timestamp_line.to_string(),
        sun_elevation_line: sun_elevation_line.to_string(),
    })
}
