//! GeoTIFF coordinate system keys, carried as opaque values

/// The GeoKeyDirectory of a GeoTIFF plus its parameter tags.
///
/// Keys are not interpreted. They are read from a source raster and written
/// back unchanged so derived rasters keep the source coordinate system.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoKeys {
    /// GeoKeyDirectoryTag (34735)
    pub directory: Vec<u16>,
    /// GeoDoubleParamsTag (34736)
    pub double_params: Option<Vec<f64>>,
    /// GeoAsciiParamsTag (34737)
    pub ascii_params: Option<String>,
}

impl GeoKeys {
    /// Minimal directory used when a raster has no keys of its own:
    /// version 1.1.0, GTModelType = Projected, GTRasterType = PixelIsArea
    pub fn minimal() -> Self {
        Self {
            directory: vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1],
            double_params: None,
            ascii_params: None,
        }
    }

    /// Number of keys declared in the directory header
    pub fn key_count(&self) -> usize {
        self.directory.get(3).copied().unwrap_or(0) as usize
    }
}
