//! LAS 1.x reader for point data record formats 1 and 2.
//!
//! The public header block is decoded field by field in file order
//! (little-endian) instead of being transmuted from memory, so struct
//! padding never leaks into the layout.

use super::AxisRemap;
use crate::config::LoaderConfig;
use crate::error::{LoadError, Result};
use crate::types::{Bounds, Point};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{DVec3, Vec3};
use std::io::{self, Cursor, Read, Write};
use tracing::{debug, info};

/// Size of the legacy public header block.
pub const LAS_HEADER_SIZE: usize = 227;

/// Point data record formats this reader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LasPointFormat {
    /// Position, intensity, flags, classification and GPS time. No color.
    Format1,
    /// Position, intensity, flags, classification and 16-bit RGB.
    Format2,
}

impl LasPointFormat {
    /// Bytes of each record this reader needs.
    pub fn min_record_length(&self) -> u16 {
        match self {
            LasPointFormat::Format1 => 12,
            LasPointFormat::Format2 => 26,
        }
    }
}

impl TryFrom<u8> for LasPointFormat {
    type Error = LoadError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(LasPointFormat::Format1),
            2 => Ok(LasPointFormat::Format2),
            other => Err(LoadError::UnsupportedPointFormat(other)),
        }
    }
}

/// The LAS public header block, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct LasHeader {
    pub file_signature: [u8; 4],
    pub file_source_id: u16,
    pub global_encoding: u16,
    pub guid_data_1: u32,
    pub guid_data_2: u16,
    pub guid_data_3: u16,
    pub guid_data_4: [u8; 8],
    pub version_major: u8,
    pub version_minor: u8,
    pub system_identifier: [u8; 32],
    pub generating_software: [u8; 32],
    pub creation_day: u16,
    pub creation_year: u16,
    pub header_size: u16,
    pub offset_to_point_data: u32,
    pub number_of_variable_length_records: u32,
    pub point_data_record_format: u8,
    pub point_data_record_length: u16,
    pub legacy_number_of_point_records: u32,
    pub legacy_number_of_points_by_return: [u32; 5],
    pub scale: DVec3,
    pub offset: DVec3,
    pub max: DVec3,
    pub min: DVec3,
}

impl Default for LasHeader {
    fn default() -> Self {
        Self {
            file_signature: *b"LASF",
            file_source_id: 0,
            global_encoding: 0,
            guid_data_1: 0,
            guid_data_2: 0,
            guid_data_3: 0,
            guid_data_4: [0; 8],
            version_major: 1,
            version_minor: 2,
            system_identifier: [0; 32],
            generating_software: [0; 32],
            creation_day: 0,
            creation_year: 0,
            header_size: LAS_HEADER_SIZE as u16,
            offset_to_point_data: LAS_HEADER_SIZE as u32,
            number_of_variable_length_records: 0,
            point_data_record_format: 1,
            point_data_record_length: 28,
            legacy_number_of_point_records: 0,
            legacy_number_of_points_by_return: [0; 5],
            scale: DVec3::splat(0.01),
            offset: DVec3::ZERO,
            max: DVec3::ZERO,
            min: DVec3::ZERO,
        }
    }
}

impl LasHeader {
    /// Decode the header from the start of a LAS file.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LAS_HEADER_SIZE {
            return Err(LoadError::TruncatedData {
                what: "LAS header",
                expected: LAS_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        let header = Self::read_from(&mut Cursor::new(&bytes[..LAS_HEADER_SIZE]))?;
        if &header.file_signature != b"LASF" {
            return Err(LoadError::InvalidHeader(format!(
                "file signature {:?} is not LASF",
                String::from_utf8_lossy(&header.file_signature)
            )));
        }
        if (header.header_size as usize) < LAS_HEADER_SIZE {
            return Err(LoadError::InvalidHeader(format!(
                "header size {} is smaller than {} bytes",
                header.header_size, LAS_HEADER_SIZE
            )));
        }
        if header.offset_to_point_data < u32::from(header.header_size) {
            return Err(LoadError::InvalidHeader(format!(
                "point data offset {} lies inside the header",
                header.offset_to_point_data
            )));
        }
        Ok(header)
    }

    fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut file_signature = [0u8; 4];
        r.read_exact(&mut file_signature)?;
        let file_source_id = r.read_u16::<LittleEndian>()?;
        let global_encoding = r.read_u16::<LittleEndian>()?;
        let guid_data_1 = r.read_u32::<LittleEndian>()?;
        let guid_data_2 = r.read_u16::<LittleEndian>()?;
        let guid_data_3 = r.read_u16::<LittleEndian>()?;
        let mut guid_data_4 = [0u8; 8];
        r.read_exact(&mut guid_data_4)?;
        let version_major = r.read_u8()?;
        let version_minor = r.read_u8()?;
        let mut system_identifier = [0u8; 32];
        r.read_exact(&mut system_identifier)?;
        let mut generating_software = [0u8; 32];
        r.read_exact(&mut generating_software)?;
        let creation_day = r.read_u16::<LittleEndian>()?;
        let creation_year = r.read_u16::<LittleEndian>()?;
        let header_size = r.read_u16::<LittleEndian>()?;
        let offset_to_point_data = r.read_u32::<LittleEndian>()?;
        let number_of_variable_length_records = r.read_u32::<LittleEndian>()?;
        let point_data_record_format = r.read_u8()?;
        let point_data_record_length = r.read_u16::<LittleEndian>()?;
        let legacy_number_of_point_records = r.read_u32::<LittleEndian>()?;
        let mut legacy_number_of_points_by_return = [0u32; 5];
        r.read_u32_into::<LittleEndian>(&mut legacy_number_of_points_by_return)?;
        let read_dvec3 = |r: &mut R| -> io::Result<DVec3> {
            Ok(DVec3::new(
                r.read_f64::<LittleEndian>()?,
                r.read_f64::<LittleEndian>()?,
                r.read_f64::<LittleEndian>()?,
            ))
        };
        let scale = read_dvec3(r)?;
        let offset = read_dvec3(r)?;
        // Extents are stored as max/min pairs per axis.
        let mut extents = [0f64; 6];
        r.read_f64_into::<LittleEndian>(&mut extents)?;

        Ok(Self {
            file_signature,
            file_source_id,
            global_encoding,
            guid_data_1,
            guid_data_2,
            guid_data_3,
            guid_data_4,
            version_major,
            version_minor,
            system_identifier,
            generating_software,
            creation_day,
            creation_year,
            header_size,
            offset_to_point_data,
            number_of_variable_length_records,
            point_data_record_format,
            point_data_record_length,
            legacy_number_of_point_records,
            legacy_number_of_points_by_return,
            scale,
            offset,
            max: DVec3::new(extents[0], extents[2], extents[4]),
            min: DVec3::new(extents[1], extents[3], extents[5]),
        })
    }

    /// Write the header in its on-disk layout.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.file_signature)?;
        w.write_u16::<LittleEndian>(self.file_source_id)?;
        w.write_u16::<LittleEndian>(self.global_encoding)?;
        w.write_u32::<LittleEndian>(self.guid_data_1)?;
        w.write_u16::<LittleEndian>(self.guid_data_2)?;
        w.write_u16::<LittleEndian>(self.guid_data_3)?;
        w.write_all(&self.guid_data_4)?;
        w.write_u8(self.version_major)?;
        w.write_u8(self.version_minor)?;
        w.write_all(&self.system_identifier)?;
        w.write_all(&self.generating_software)?;
        w.write_u16::<LittleEndian>(self.creation_day)?;
        w.write_u16::<LittleEndian>(self.creation_year)?;
        w.write_u16::<LittleEndian>(self.header_size)?;
        w.write_u32::<LittleEndian>(self.offset_to_point_data)?;
        w.write_u32::<LittleEndian>(self.number_of_variable_length_records)?;
        w.write_u8(self.point_data_record_format)?;
        w.write_u16::<LittleEndian>(self.point_data_record_length)?;
        w.write_u32::<LittleEndian>(self.legacy_number_of_point_records)?;
        for count in self.legacy_number_of_points_by_return {
            w.write_u32::<LittleEndian>(count)?;
        }
        for value in [self.scale, self.offset].iter().flat_map(|v| v.to_array()) {
            w.write_f64::<LittleEndian>(value)?;
        }
        for axis in 0..3 {
            w.write_f64::<LittleEndian>(self.max[axis])?;
            w.write_f64::<LittleEndian>(self.min[axis])?;
        }
        Ok(())
    }

    pub fn system_identifier(&self) -> String {
        fixed_str(&self.system_identifier)
    }

    pub fn generating_software(&self) -> String {
        fixed_str(&self.generating_software)
    }

    /// Header extents in loader axes.
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            AxisRemap::LAS.apply(self.min.to_array()),
            AxisRemap::LAS.apply(self.max.to_array()),
        )
    }

    /// Scale and offset a quantized coordinate triple.
    pub fn to_world(&self, raw: [i32; 3]) -> DVec3 {
        DVec3::new(raw[0] as f64, raw[1] as f64, raw[2] as f64) * self.scale + self.offset
    }
}

fn fixed_str(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).trim_end().to_string()
}

/// Fields of a point record this reader uses.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PointRecord {
    position: [i32; 3],
    rgb: Option<[u16; 3]>,
}

impl PointRecord {
    fn decode(record: &[u8], format: LasPointFormat) -> io::Result<Self> {
        let mut r = Cursor::new(record);
        let mut position = [0i32; 3];
        r.read_i32_into::<LittleEndian>(&mut position)?;

        let rgb = match format {
            LasPointFormat::Format1 => None,
            LasPointFormat::Format2 => {
                let _intensity = r.read_u16::<LittleEndian>()?;
                let _flags = r.read_i8()?;
                let _classification = r.read_u8()?;
                let _scan_angle = r.read_i8()?;
                let _user_data = r.read_u8()?;
                let _point_source_id = r.read_u16::<LittleEndian>()?;
                let mut rgb = [0u16; 3];
                r.read_u16_into::<LittleEndian>(&mut rgb)?;
                Some(rgb)
            }
        };
        Ok(Self { position, rgb })
    }
}

/// Read the header and every point record of a LAS file.
///
/// Records are located at `offset_to_point_data + record_length * i` for
/// both formats, so extra bytes in a record are skipped.
#[tracing::instrument(skip_all, fields(len = bytes.len()))]
pub fn read_las(bytes: &[u8], config: &LoaderConfig) -> Result<(LasHeader, Vec<Point>)> {
    let header = LasHeader::decode(bytes)?;
    let format = LasPointFormat::try_from(header.point_data_record_format)?;

    info!(
        "LAS {}.{} from {:?}: format {}, {} points",
        header.version_major,
        header.version_minor,
        header.generating_software(),
        header.point_data_record_format,
        header.legacy_number_of_point_records
    );

    let record_length = header.point_data_record_length as usize;
    if header.point_data_record_length < format.min_record_length() {
        return Err(LoadError::TruncatedData {
            what: "LAS point record",
            expected: format.min_record_length() as u64,
            actual: record_length as u64,
        });
    }

    let start = header.offset_to_point_data as u64;
    let count = header.legacy_number_of_point_records as u64;
    let end = start + record_length as u64 * count;
    if end > bytes.len() as u64 {
        return Err(LoadError::TruncatedData {
            what: "LAS point data",
            expected: end,
            actual: bytes.len() as u64,
        });
    }

    let data = &bytes[start as usize..end as usize];
    let mut points = Vec::with_capacity(count as usize);
    for record in data.chunks_exact(record_length) {
        let record = PointRecord::decode(record, format)?;
        let position = AxisRemap::LAS.apply(header.to_world(record.position).to_array());
        let color = match record.rgb {
            Some([r, g, b]) => Vec3::new(r as f32, g as f32, b as f32) * config.las_rgb_scale,
            None => config.las_color,
        };
        points.push(Point::new(position, color));
    }

    debug!("Decoded {} LAS records", points.len());
    Ok((header, points))
}


#[cfg(test)]
mod tests {
    use super::test_support::{header, las_file};
    use super::*;

    #[test]
    fn test_header_round_trips_at_fixed_size() {
        let mut original = header(2);
        original.system_identifier[..4].copy_from_slice(b"SCAN");
        original.generating_software[..6].copy_from_slice(b"survey");
        original.creation_year = 2022;
        original.legacy_number_of_points_by_return = [1, 2, 3, 4, 5];
        original.max = DVec3::new(10.0, 20.0, 30.0);
        original.min = DVec3::new(-1.0, -2.0, -3.0);

        let mut bytes = Vec::new();
        original.write_to(&mut bytes).unwrap();
        assert_eq!(bytes.len(), LAS_HEADER_SIZE);

        let decoded = LasHeader::decode(&bytes).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.system_identifier(), "SCAN");
        assert_eq!(decoded.generating_software(), "survey");
    }

    #[test]
    fn test_extents_are_stored_max_then_min() {
        let mut h = header(1);
        h.max = DVec3::new(1.0, 2.0, 3.0);
        h.min = DVec3::new(-1.0, -2.0, -3.0);
        let mut bytes = Vec::new();
        h.write_to(&mut bytes).unwrap();
        // max X sits right after the three scale and three offset doubles
        let max_x = f64::from_le_bytes(bytes[179..187].try_into().unwrap());
        let min_x = f64::from_le_bytes(bytes[187..195].try_into().unwrap());
        assert_eq!((max_x, min_x), (1.0, -1.0));
    }

    #[test]
    fn test_header_bounds_use_las_axes() {
        let mut h = header(1);
        h.min = DVec3::new(1.0, 2.0, 3.0);
        h.max = DVec3::new(4.0, 5.0, 6.0);
        let bounds = h.bounds();
        assert_eq!(bounds.min, Vec3::new(1.0, 3.0, 2.0));
        assert_eq!(bounds.max, Vec3::new(4.0, 6.0, 5.0));
    }

    #[test]
    fn test_format_1_scales_offsets_and_remaps() {
        let mut h = header(1);
        h.scale = DVec3::new(0.1, 0.01, 0.001);
        h.offset = DVec3::new(100.0, 200.0, 300.0);
        let bytes = las_file(&h, &[([10, 20, 30], [0; 3])]);

        let (decoded, points) = read_las(&bytes, &LoaderConfig::default()).unwrap();
        assert_eq!(decoded.legacy_number_of_point_records, 1);
        assert_eq!(points.len(), 1);
        // raw X to X, raw Z to height, raw Y to depth
        let p = points[0].position;
        assert!((p - Vec3::new(101.0, 300.03, 200.2)).abs().max_element() < 1e-3);
        assert_eq!(points[0].color, crate::types::GREEN);
    }

    #[test]
    fn test_format_2_color_uses_fixed_scale() {
        let bytes = las_file(&header(2), &[([0, 0, 0], [65535, 0, 0])]);
        let (_, points) = read_las(&bytes, &LoaderConfig::default()).unwrap();
        let color = points[0].color;
        assert!((color.x - 0.65535).abs() < 1e-4);
        assert_eq!(color.y, 0.0);
        assert_eq!(color.z, 0.0);
    }

    #[test]
    fn test_format_2_honours_record_length_padding() {
        let mut h = header(2);
        h.point_data_record_length = 34;
        let bytes = las_file(&h, &[([100, 0, 0], [0; 3]), ([200, 0, 0], [0, 0, 1000])]);
        let (_, points) = read_las(&bytes, &LoaderConfig::default()).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[1].position.x - 2.0).abs() < 1e-6);
        assert!((points[1].color.z - 0.01).abs() < 1e-6);
    }

    #[test]
    fn test_skips_variable_length_records() {
        let mut h = header(1);
        h.offset_to_point_data = LAS_HEADER_SIZE as u32 + 54;
        h.number_of_variable_length_records = 1;
        let bytes = las_file(&h, &[([500, 600, 700], [0; 3])]);
        let (_, points) = read_las(&bytes, &LoaderConfig::default()).unwrap();
        assert!((points[0].position - Vec3::new(5.0, 7.0, 6.0)).length() < 1e-5);
    }

    #[test]
    fn test_unsupported_format_fails_before_reading_points() {
        let mut h = header(1);
        h.point_data_record_format = 3;
        h.point_data_record_length = 34;
        let bytes = las_file(&h, &[([1, 2, 3], [0; 3])]);
        let err = read_las(&bytes, &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedPointFormat(3)));
    }

    #[test]
    fn test_short_header_is_truncated() {
        let err = LasHeader::decode(&[0u8; 100]).unwrap_err();
        assert!(matches!(
            err,
            LoadError::TruncatedData { what: "LAS header", expected: 227, actual: 100 }
        ));
    }

    #[test]
    fn test_bad_signature() {
        let mut h = header(1);
        h.file_signature = *b"PLY\n";
        let mut bytes = Vec::new();
        h.write_to(&mut bytes).unwrap();
        assert!(matches!(LasHeader::decode(&bytes), Err(LoadError::InvalidHeader(_))));
    }

    #[test]
    fn test_declared_header_size_below_minimum() {
        let mut h = header(1);
        h.header_size = 200;
        let mut bytes = Vec::new();
        h.write_to(&mut bytes).unwrap();
        let err = LasHeader::decode(&bytes).unwrap_err();
        assert!(matches!(err, LoadError::InvalidHeader(msg) if msg.contains("header size 200")));
    }

    #[test]
    fn test_point_data_offset_inside_declared_header() {
        let mut h = header(1);
        h.header_size = 375;
        h.offset_to_point_data = 300;
        let mut bytes = Vec::new();
        h.write_to(&mut bytes).unwrap();
        bytes.resize(400, 0);
        assert!(matches!(LasHeader::decode(&bytes), Err(LoadError::InvalidHeader(_))));
    }

    #[test]
    fn test_point_count_past_end_of_file() {
        let mut bytes = las_file(&header(2), &[([0, 0, 0], [0; 3]), ([1, 1, 1], [0; 3])]);
        bytes.truncate(bytes.len() - 10);
        let err = read_las(&bytes, &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::TruncatedData { what: "LAS point data", .. }));
    }

    #[test]
    fn test_record_length_too_short_for_format() {
        let mut h = header(2);
        h.point_data_record_length = 20;
        let bytes = las_file(&h, &[]);
        let err = read_las(&bytes, &LoaderConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::TruncatedData { what: "LAS point record", .. }));
    }
}
