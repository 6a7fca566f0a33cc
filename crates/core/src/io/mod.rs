//! I/O operations for reading and writing geospatial data

mod native;

pub use native::{
    GeoTiffReader, RasterInfo, read_geotiff, read_geotiff_from_buffer, read_geotiff_info,
    write_geotiff, write_geotiff_to_buffer,
};
