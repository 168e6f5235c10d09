//! Native GeoTIFF reading/writing built on the `tiff` crate.
//!
//! Supports single-band rasters with the ModelPixelScale/ModelTiepoint
//! georeferencing tags and the GDAL_NODATA tag. The GeoKey tags are carried
//! through untouched, so a written mask keeps its source coordinate system.

use crate::error::{Error, Result};
use crate::raster::{GeoKeys, GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;


/// Options for writing GeoTIFF files
#[derive(Debug, Clone, Default)]
pub struct GeoTiffOptions {
    /// Write the raster's no-data value as a GDAL_NODATA tag
    pub write_nodata: bool,
}

/// Read a single-band GeoTIFF file into a Raster
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF from an in-memory buffer into a Raster
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode_geotiff(Cursor::new(data))
}

fn tiff_err(what: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", what, e))
}

/// Cast every sample into `T`, substituting the type's fallback when out of range
macro_rules! cast_samples {
    ($result:expr, $($variant:ident),*) => {
        match $result {
            $(DecodingResult::$variant(buf) => buf
                .into_iter()
                .map(|v| num_traits::cast(v).unwrap_or_else(T::fallback))
                .collect::<Vec<T>>(),)*
            _ => {
                return Err(Error::UnsupportedDataType(
                    "Unsupported TIFF pixel format".to_string(),
                ))
            }
        }
    };
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(tiff_err("Cannot read image data"))?;
    let data = cast_samples!(result, U8, U16, U32, I8, I16, I32, F32, F64);

    if data.len() != rows * cols {
        // Multi-band images decode to rows * cols * bands samples
        return Err(Error::InvalidDimensions {
            width: cols,
            height: rows,
        });
    }

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_nodata(read_nodata(&mut decoder));
    raster.set_geokeys(read_geokeys(&mut decoder));

    Ok(raster)
}

/// GeoTransform from ModelPixelScale + ModelTiepoint, if both are present
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

/// GDAL stores no-data as an ASCII number
fn read_nodata<T: RasterElement, R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<T> {
    let text = decoder.get_tag_ascii_string(Tag::GdalNodata).ok()?;
    let value: f64 = text.trim_matches(char::from(0)).trim().parse().ok()?;
    num_traits::cast(value)
}

/// GeoKeyDirectory and its parameter tags, if the directory is present
fn read_geokeys<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoKeys> {
    let directory = decoder.get_tag_u16_vec(Tag::GeoKeyDirectoryTag).ok()?;
    if directory.len() < 4 {
        return None;
    }

    Some(GeoKeys {
        directory,
        double_params: decoder.get_tag_f64_vec(Tag::GeoDoubleParamsTag).ok(),
        ascii_params: decoder.get_tag_ascii_string(Tag::GeoAsciiParamsTag).ok(),
    })
}

/// Write a Raster to a single-band Float32 GeoTIFF file
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, file, &options.unwrap_or_default())
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T: RasterElement>(
    raster: &Raster<T>,
    options: Option<GeoTiffOptions>,
) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), &options.unwrap_or_default())?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, options: &GeoTiffOptions) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .map_err(tiff_err("Cannot write scale tag"))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(tiff_err("Cannot write tiepoint tag"))?;

    let geokeys = raster.geokeys().cloned().unwrap_or_else(GeoKeys::minimal);
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geokeys.directory[..])
        .map_err(tiff_err("Cannot write geokey tag"))?;
    if let Some(doubles) = &geokeys.double_params {
        image
            .encoder()
            .write_tag(Tag::GeoDoubleParamsTag, &doubles[..])
            .map_err(tiff_err("Cannot write geodouble tag"))?;
    }
    if let Some(ascii) = &geokeys.ascii_params {
        image
            .encoder()
            .write_tag(Tag::GeoAsciiParamsTag, ascii.as_str())
            .map_err(tiff_err("Cannot write geoascii tag"))?;
    }

    if options.write_nodata {
        if let Some(nd) = raster.nodata().and_then(|v| v.to_f64()) {
            let text = nd.to_string();
            image
                .encoder()
                .write_tag(Tag::GdalNodata, text.as_str())
                .map_err(tiff_err("Cannot write nodata tag"))?;
        }
    }

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_preserves_georeferencing() {
        let mut mask: Raster<u8> = Raster::new(3, 4);
        mask.set(1, 2, 1).unwrap();
        mask.set_transform(GeoTransform::new(500.0, 1200.0, 25.0, -25.0));

        let bytes = write_geotiff_to_buffer(&mask, None).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.shape(), (3, 4));
        assert_eq!(back.get(1, 2).unwrap(), 1.0);
        assert_eq!(back.get(0, 0).unwrap(), 0.0);
        assert_eq!(back.transform(), mask.transform());
        assert_eq!(back.nodata(), None);
        assert_eq!(back.geokeys(), Some(&GeoKeys::minimal()));
    }

    #[test]
    fn test_geokeys_copied_to_derived_raster() {
        // EPSG:32633 (WGS 84 / UTM 33N) with a citation and one double param
        let keys = GeoKeys {
            directory: vec![
                1, 1, 0, 4, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, 32633, 1026, 34737, 22, 0,
            ],
            double_params: Some(vec![6378137.0]),
            ascii_params: Some("WGS 84 / UTM zone 33N|".to_string()),
        };
        let mut dem: Raster<f64> = Raster::filled(4, 5, 3.5);
        dem.set_transform(GeoTransform::new(350000.0, 5600000.0, 30.0, -30.0));
        dem.set_geokeys(Some(keys.clone()));

        let bytes = write_geotiff_to_buffer(&dem, None).unwrap();
        let source: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();
        assert_eq!(source.geokeys(), Some(&keys));

        let mask = source.with_same_meta::<u8>();
        let bytes = write_geotiff_to_buffer(&mask, None).unwrap();
        let back: Raster<u8> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.geokeys(), Some(&keys));
        assert_eq!(back.transform(), dem.transform());
    }

    #[test]
    fn test_nodata_tag() {
        let mut dem: Raster<f64> =
            Raster::from_vec(vec![10.0, -9999.0, 12.0, 13.0], 2, 2).unwrap();
        dem.set_nodata(Some(-9999.0));

        let bytes = write_geotiff_to_buffer(
            &dem,
            Some(GeoTiffOptions {
                write_nodata: true,
            }),
        )
        .unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&bytes).unwrap();

        assert_eq!(back.nodata(), Some(-9999.0));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(read_geotiff_from_buffer::<f64>(b"not a tiff").is_err());
    }
}
