//! Native GeoTIFF reading and writing on top of the `tiff` crate.
//!
//! Georeferencing is carried through the standard GeoTIFF tags:
//! ModelPixelScale and ModelTiepoint for the grid, the GeoKey directory for
//! the EPSG code, and GeoAsciiParams for a WKT citation when no EPSG code is
//! known. Every raster is written as single-band Float64.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray64Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

// GeoKey entries stored in GeoAsciiParams point at this tag number.
const GEO_ASCII_PARAMS: u16 = 34737;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// No-data value written to the GDAL_NODATA tag. Falls back to the
    /// raster's own no-data value when `None`.
    pub nodata: Option<f64>,
}

/// Read a GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

fn cast_samples<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or(T::default_nodata()))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;
    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let data: Vec<T> = match decoder.read_image()? {
        DecodingResult::U8(buf) => cast_samples(buf),
        DecodingResult::U16(buf) => cast_samples(buf),
        DecodingResult::U32(buf) => cast_samples(buf),
        DecodingResult::U64(buf) => cast_samples(buf),
        DecodingResult::I8(buf) => cast_samples(buf),
        DecodingResult::I16(buf) => cast_samples(buf),
        DecodingResult::I32(buf) => cast_samples(buf),
        DecodingResult::I64(buf) => cast_samples(buf),
        DecodingResult::F32(buf) => cast_samples(buf),
        DecodingResult::F64(buf) => cast_samples(buf),
        #[allow(unreachable_patterns)]
        _ => {
            return Err(Error::UnsupportedDataType(
                "unsupported TIFF sample format".to_string(),
            ))
        }
    };

    // Multi-band files decode interleaved; only the first band is a land-use map.
    if data.len() != rows * cols {
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_crs(read_crs(&mut decoder));
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];

    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<CRS> {
    let keys = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if keys.len() < 4 {
        return None;
    }

    let declared = keys[3] as usize;
    let mut citation = None;
    for entry in keys[4..].chunks_exact(4).take(declared) {
        let (key, location, count, value) = (entry[0], entry[1], entry[2], entry[3]);
        match key {
            GEOGRAPHIC_TYPE | PROJECTED_CS_TYPE
                if location == 0 && value != 0 && value != USER_DEFINED =>
            {
                return Some(CRS::from_epsg(<u32 as From<u16>>::from(value)));
            }
            GT_CITATION if location == GEO_ASCII_PARAMS => {
                citation = Some((
                    <usize as From<u16>>::from(value),
                    <usize as From<u16>>::from(count),
                ));
            }
            _ => {}
        }
    }

    let (offset, count) = citation?;
    let ascii = decoder
        .get_tag_ascii_string(Tag::GeoAsciiParamsTag)
        .ok()?;
    let text = ascii
        .get(offset..(offset + count).min(ascii.len()))?
        .trim_end_matches(['|', '\0'])
        .trim();

    if text.is_empty() {
        None
    } else {
        Some(CRS::from_wkt(text))
    }
}

fn read_nodata<T, R>(decoder: &mut Decoder<R>) -> Option<T>
where
    T: RasterElement,
    R: Read + Seek,
{
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let value: f64 = text.trim_end_matches('\0').trim().parse().ok()?;
    num_traits::cast(value)
}

/// Build the GeoKey directory and the matching GeoAsciiParams string.
fn geokeys(crs: Option<&CRS>) -> (Vec<u16>, Option<String>) {
    let epsg = crs
        .and_then(|c| c.epsg())
        .and_then(|code| u16::try_from(code).ok());
    let geographic = crs.is_some_and(|c| c.is_geographic());

    let model_type = if geographic {
        MODEL_TYPE_GEOGRAPHIC
    } else {
        MODEL_TYPE_PROJECTED
    };

    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE, 0, 1, model_type],
        [GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
    ];
    let mut ascii = None;

    match (epsg, crs.and_then(|c| c.wkt())) {
        (Some(code), _) => {
            let key = if geographic {
                GEOGRAPHIC_TYPE
            } else {
                PROJECTED_CS_TYPE
            };
            entries.push([key, 0, 1, code]);
        }
        (None, Some(wkt)) => {
            let citation = format!("{}|", wkt);
            if let Ok(count) = u16::try_from(citation.len()) {
                entries.push([GT_CITATION, GEO_ASCII_PARAMS, count, 0]);
                ascii = Some(citation);
            }
        }
        (None, None) => {}
    }

    let mut directory = vec![1, 1, 0, entries.len() as u16];
    directory.extend(entries.iter().flatten());
    (directory, ascii)
}

/// Write a Raster to a GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P, options: Option<GeoTiffOptions>) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    encode_geotiff(raster, &mut writer, options.unwrap_or_default())?;
    writer.flush()?;
    Ok(())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>, options: Option<GeoTiffOptions>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), options.unwrap_or_default())?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let gt = raster.transform();
    if gt.has_rotation() {
        return Err(Error::UnsupportedDataType(
            "rotated geotransforms cannot be stored with tiepoint and scale tags".to_string(),
        ));
    }

    let (rows, cols) = raster.shape();
    let data: Vec<f64> = raster
        .data()
        .iter()
        .map(|&v| v.to_f64().unwrap_or(f64::NAN))
        .collect();

    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<Gray64Float>(cols as u32, rows as u32)?;

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])?;

    let (directory, ascii) = geokeys(raster.crs());
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, directory.as_slice())?;
    if let Some(citation) = ascii {
        image
            .encoder()
            .write_tag(Tag::GeoAsciiParamsTag, citation.as_str())?;
    }

    let nodata = options
        .nodata
        .or_else(|| raster.nodata().and_then(|v| v.to_f64()));
    if let Some(value) = nodata {
        let text = value.to_string();
        image
            .encoder()
            .write_tag(Tag::GdalNodata, text.as_str())?;
    }

    image.write_data(&data)?;
    Ok(())
}
