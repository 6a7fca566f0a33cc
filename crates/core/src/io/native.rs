//! Native GeoTIFF reading/writing on top of the `tiff` crate.
//!
//! Understands the GeoTIFF tags needed for neighborhood queries:
//! ModelPixelScale + ModelTiepoint or ModelTransformation for the affine
//! transform, the GeoKey directory for the CRS, and GDAL_NODATA for the
//! no-data sentinel. Reads go strip by strip (or tile by tile), so a window
//! only decodes the chunks it touches.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, PixelWindow, Raster, RasterElement};
use num_traits::NumCast;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::TiffEncoder;
use tiff::encoder::colortype::Gray32Float;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const MODEL_TRANSFORMATION: Tag = Tag::ModelTransformationTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

// GeoKey ids
const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;
const USER_DEFINED: u16 = 32767;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;

const PLANAR_SEPARATE: u32 = 2;

/// Target size of one written strip, as GDAL does
const STRIP_BYTES: usize = 8192;

/// Georeferencing and layout of a GeoTIFF, without pixel data
#[derive(Debug, Clone)]
pub struct RasterInfo {
    pub width: usize,
    pub height: usize,
    /// Samples per pixel
    pub bands: usize,
    pub transform: GeoTransform,
    pub crs: Option<CRS>,
    /// Sentinel as written in GDAL_NODATA, before any narrowing to the
    /// sample type
    pub nodata: Option<f64>,
}

/// Read one band of a GeoTIFF file into a Raster.
///
/// `band` is 1-based and defaults to 1. The file handle lives only for the
/// duration of this call.
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    GeoTiffReader::open(path)?.read_band(band.unwrap_or(1))
}

/// Read one band of a GeoTIFF held in memory
pub fn read_geotiff_from_buffer<T>(data: &[u8], band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement,
{
    GeoTiffReader::new(Cursor::new(data), "<memory>")?.read_band(band.unwrap_or(1))
}

/// Read only the metadata of a GeoTIFF file
pub fn read_geotiff_info<P: AsRef<Path>>(path: P) -> Result<RasterInfo> {
    GeoTiffReader::open(path).map(|reader| reader.info)
}

/// An open GeoTIFF: parsed metadata plus a decoder on its first image.
///
/// The underlying file stays open for as long as the reader lives.
pub struct GeoTiffReader<R: Read + Seek> {
    decoder: Decoder<R>,
    info: RasterInfo,
    planar: bool,
    source: PathBuf,
}

impl GeoTiffReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::raster_io(path, e))?;
        Self::new(BufReader::new(file), path)
    }
}

impl<R: Read + Seek> GeoTiffReader<R> {
    /// Parse the header of a GeoTIFF; `source` only labels errors
    pub fn new(reader: R, source: impl Into<PathBuf>) -> Result<Self> {
        let source = source.into();
        let mut decoder = Decoder::new(reader)
            .map(|d| d.with_limits(Limits::unlimited()))
            .map_err(|e| Error::raster_io(&source, format!("TIFF decode error: {}", e)))?;
        let info = read_info(&mut decoder, &source)?;
        let planar = info.bands > 1
            && decoder.get_tag_u32(Tag::PlanarConfiguration).unwrap_or(1) == PLANAR_SEPARATE;

        Ok(Self {
            decoder,
            info,
            planar,
            source,
        })
    }

    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    /// Read a whole band (1-based)
    pub fn read_band<T: RasterElement>(&mut self, band: usize) -> Result<Raster<T>> {
        let full = PixelWindow::new(0, 0, self.info.height, self.info.width);
        self.read_window(band, &full)
    }

    /// Read the cells of `band` (1-based) inside `window`.
    ///
    /// Only the strips or tiles intersecting the window are decoded. The
    /// result covers exactly the window: its transform starts at the
    /// window's top-left corner and it carries the file's CRS. The no-data
    /// value is the GDAL_NODATA sentinel rounded to the file's sample type,
    /// so it compares equal to the cells that were written with it.
    pub fn read_window<T: RasterElement>(
        &mut self,
        band: usize,
        window: &PixelWindow,
    ) -> Result<Raster<T>> {
        let RasterInfo {
            width,
            height,
            bands,
            ..
        } = self.info;

        if band == 0 || band > bands {
            return Err(Error::InvalidBand { band, bands });
        }
        if window.row_off + window.height > height || window.col_off + window.width > width {
            return Err(Error::IndexOutOfBounds {
                row: (window.row_off + window.height).saturating_sub(1),
                col: (window.col_off + window.width).saturating_sub(1),
                rows: height,
                cols: width,
            });
        }

        let mut cells = vec![T::default_nodata(); window.len()];
        let mut nodata = self.info.nodata;

        if !window.is_empty() {
            let (chunk_w, chunk_h) = self.decoder.chunk_dimensions();
            let (chunk_w, chunk_h) = (chunk_w as usize, chunk_h as usize);
            if chunk_w == 0 || chunk_h == 0 {
                return Err(Error::raster_io(&self.source, "zero-sized strips or tiles"));
            }

            let across = width.div_ceil(chunk_w);
            let down = height.div_ceil(chunk_h);
            // Separate planes store each band's chunks one after the other
            let (stride, sample, first) = if self.planar {
                (1, 0, (band - 1) * across * down)
            } else {
                (bands, band - 1, 0)
            };

            for ty in window.row_off / chunk_h..=(window.rows().end - 1) / chunk_h {
                for tx in window.col_off / chunk_w..=(window.cols().end - 1) / chunk_w {
                    let index = first + ty * across + tx;
                    let chunk = PixelWindow::new(
                        ty * chunk_h,
                        tx * chunk_w,
                        chunk_h.min(height - ty * chunk_h),
                        chunk_w.min(width - tx * chunk_w),
                    );
                    let decoded = self.decoder.read_chunk(index as u32).map_err(|e| {
                        Error::raster_io(&self.source, format!("cannot read chunk {}: {}", index, e))
                    })?;

                    let layout = ChunkLayout {
                        chunk,
                        window: *window,
                        stride,
                        sample,
                    };
                    nodata = layout.copy_decoded(decoded, self.info.nodata, &mut cells)?;
                }
            }
        }

        let (origin_x, origin_y) = self
            .info
            .transform
            .pixel_to_geo_corner(window.col_off, window.row_off);
        let transform = GeoTransform {
            origin_x,
            origin_y,
            ..self.info.transform
        };

        let mut raster = Raster::from_vec(cells, window.height, window.width)?
            .with_transform(transform);
        raster.set_crs(self.info.crs.clone());
        raster.set_nodata(nodata.and_then(num_traits::cast));

        tracing::debug!(
            source = %self.source.display(),
            band,
            row_off = window.row_off,
            col_off = window.col_off,
            rows = window.height,
            cols = window.width,
            "decoded GeoTIFF window"
        );

        Ok(raster)
    }
}

/// Where a decoded chunk sits relative to the requested window
struct ChunkLayout {
    chunk: PixelWindow,
    window: PixelWindow,
    /// Samples per pixel in the decoded buffer
    stride: usize,
    /// Offset of the wanted band inside a pixel
    sample: usize,
}

impl ChunkLayout {
    /// Copy the wanted band of `decoded` into `out` and return the no-data
    /// sentinel narrowed to the chunk's sample type.
    fn copy_decoded<T: RasterElement>(
        &self,
        decoded: DecodingResult,
        nodata: Option<f64>,
        out: &mut [T],
    ) -> Result<Option<f64>> {
        let nodata = match decoded {
            DecodingResult::U8(buf) => self.copy(&buf, nodata, out),
            DecodingResult::U16(buf) => self.copy(&buf, nodata, out),
            DecodingResult::U32(buf) => self.copy(&buf, nodata, out),
            DecodingResult::U64(buf) => self.copy(&buf, nodata, out),
            DecodingResult::I8(buf) => self.copy(&buf, nodata, out),
            DecodingResult::I16(buf) => self.copy(&buf, nodata, out),
            DecodingResult::I32(buf) => self.copy(&buf, nodata, out),
            DecodingResult::I64(buf) => self.copy(&buf, nodata, out),
            DecodingResult::F32(buf) => self.copy(&buf, nodata, out),
            DecodingResult::F64(buf) => self.copy(&buf, nodata, out),
            #[allow(unreachable_patterns)]
            _ => {
                return Err(Error::UnsupportedDataType(
                    "unsupported TIFF pixel format".to_string(),
                ));
            }
        };
        Ok(nodata)
    }

    fn copy<S, T>(&self, buf: &[S], nodata: Option<f64>, out: &mut [T]) -> Option<f64>
    where
        S: Copy + NumCast,
        T: RasterElement,
    {
        let (chunk, window) = (&self.chunk, &self.window);
        let rows = chunk.row_off.max(window.row_off)..chunk.rows().end.min(window.rows().end);
        let cols = chunk.col_off.max(window.col_off)..chunk.cols().end.min(window.cols().end);

        for row in rows {
            let src_row = (row - chunk.row_off) * chunk.width;
            let dst_row = (row - window.row_off) * window.width;
            for col in cols.clone() {
                let src = (src_row + col - chunk.col_off) * self.stride + self.sample;
                if let Some(&v) = buf.get(src) {
                    out[dst_row + col - window.col_off] =
                        num_traits::cast(v).unwrap_or(T::default_nodata());
                }
            }
        }

        native_nodata::<S>(nodata)
    }
}

/// Round a sentinel through sample type `S`.
///
/// Cells of a Float32 file written with `-9999.9` hold
/// `-9999.900390625`; the sentinel has to take the same detour to match
/// them. A sentinel that `S` cannot hold matches no cell.
fn native_nodata<S: NumCast>(nodata: Option<f64>) -> Option<f64> {
    let nd = nodata?;
    if nd.is_nan() {
        return Some(nd);
    }
    num_traits::cast::<f64, S>(nd).and_then(|s| s.to_f64())
}

fn read_info<R>(decoder: &mut Decoder<R>, source: &Path) -> Result<RasterInfo>
where
    R: Read + Seek,
{
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::raster_io(source, format!("cannot read dimensions: {}", e)))?;

    let bands = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1).max(1) as usize;

    let transform = read_geotransform(decoder).unwrap_or_default();

    let crs = decoder
        .get_tag_u16_vec(GEO_KEY_DIRECTORY)
        .ok()
        .and_then(|keys| crs_from_geokeys(&keys));

    let nodata = decoder
        .get_tag_ascii_string(GDAL_NODATA)
        .ok()
        .and_then(|s| parse_nodata(&s));

    Ok(RasterInfo {
        width: width as usize,
        height: height as usize,
        bands,
        transform,
        crs,
        nodata,
    })
}

fn read_geotransform<R>(decoder: &mut Decoder<R>) -> Option<GeoTransform>
where
    R: Read + Seek,
{
    if let (Ok(scale), Ok(tiepoint)) = (
        decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE),
        decoder.get_tag_f64_vec(MODEL_TIEPOINT),
    ) && let Some(gt) = GeoTransform::from_tiepoint(&scale, &tiepoint)
    {
        return Some(gt);
    }

    decoder
        .get_tag_f64_vec(MODEL_TRANSFORMATION)
        .ok()
        .and_then(|m| GeoTransform::from_model_transformation(&m))
}

/// Resolve a CRS from the GeoKey directory.
///
/// Layout: `[version, revision, minor, count, (key_id, location, count, value)*]`.
/// Only keys stored inline (`location == 0`) are considered.
fn crs_from_geokeys(keys: &[u16]) -> Option<CRS> {
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;

    let mut model_type = None;
    let mut geographic = None;
    let mut projected = None;

    for entry in keys[4..].chunks_exact(4).take(count) {
        let (key_id, location, value) = (entry[0], entry[1], entry[3]);
        if location != 0 {
            continue;
        }
        match key_id {
            GT_MODEL_TYPE => model_type = Some(value),
            GEOGRAPHIC_TYPE if value > 0 && value != USER_DEFINED => geographic = Some(value),
            PROJECTED_CS_TYPE if value > 0 && value != USER_DEFINED => projected = Some(value),
            _ => {}
        }
    }

    match model_type {
        Some(MODEL_TYPE_GEOGRAPHIC) => Some(
            geographic
                .map(|code| CRS::from_epsg(code as u32))
                .unwrap_or_else(|| CRS::from_proj("+proj=longlat +datum=WGS84 +no_defs")),
        ),
        Some(MODEL_TYPE_PROJECTED) => projected.map(|code| CRS::from_epsg(code as u32)),
        _ => projected.or(geographic).map(|code| CRS::from_epsg(code as u32)),
    }
}

fn parse_nodata(raw: &str) -> Option<f64> {
    let s = raw.trim_end_matches('\0').trim();
    if s.eq_ignore_ascii_case("nan") {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

/// GeoKey directory describing `crs` (or only the raster type when unknown)
fn geokeys_for(crs: Option<&CRS>) -> Vec<u16> {
    let code = crs.and_then(|c| c.epsg()).and_then(|c| u16::try_from(c).ok());
    let mut keys = vec![1, 1, 0, 0];
    let mut push = |id: u16, value: u16| keys.extend_from_slice(&[id, 0, 1, value]);

    match (crs, code) {
        (Some(crs), Some(code)) if crs.is_geographic() => {
            push(GT_MODEL_TYPE, MODEL_TYPE_GEOGRAPHIC);
            push(GT_RASTER_TYPE, 1);
            push(GEOGRAPHIC_TYPE, code);
        }
        (Some(_), Some(code)) => {
            push(GT_MODEL_TYPE, MODEL_TYPE_PROJECTED);
            push(GT_RASTER_TYPE, 1);
            push(PROJECTED_CS_TYPE, code);
        }
        _ => push(GT_RASTER_TYPE, 1),
    }

    keys[3] = ((keys.len() - 4) / 4) as u16;
    keys
}

/// Write a Raster to a single-band 32-bit float GeoTIFF file
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::create(path)?;
    encode_geotiff(raster, file, path)
}

/// Write a Raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf), Path::new("<memory>"))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W, target: &Path) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let fail = |what: &str, e: tiff::TiffError| Error::raster_io(PathBuf::from(target), format!("{}: {}", what, e));

    let mut encoder = TiffEncoder::new(writer).map_err(|e| fail("TIFF encoder error", e))?;

    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(|e| fail("cannot create TIFF image", e))?;

    let strip_rows = (STRIP_BYTES / (cols.max(1) * size_of::<f32>())).max(1);
    image
        .rows_per_strip(strip_rows as u32)
        .map_err(|e| fail("cannot set strip size", e))?;

    let gt = raster.transform();

    let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, &scale[..])
        .map_err(|e| fail("cannot write scale tag", e))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, &tiepoint[..])
        .map_err(|e| fail("cannot write tiepoint tag", e))?;

    let geokeys = geokeys_for(raster.crs());
    image
        .encoder()
        .write_tag(GEO_KEY_DIRECTORY, geokeys.as_slice())
        .map_err(|e| fail("cannot write geokey tag", e))?;

    if let Some(nodata) = raster.nodata().and_then(|v| v.to_f64()) {
        let text = format!("{}", nodata);
        image
            .encoder()
            .write_tag(GDAL_NODATA, text.as_str())
            .map_err(|e| fail("cannot write nodata tag", e))?;
    }

    image
        .write_data(&data)
        .map_err(|e| fail("cannot write image data", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_raster() -> Raster<f64> {
        let data: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let mut raster = Raster::from_vec(data, 3, 4)
            .unwrap()
            .with_transform(GeoTransform::new(-49.3, -25.3, 0.001, -0.001))
            .with_crs(CRS::wgs84())
            .with_nodata(-9999.0);
        raster.set(1, 1, -9999.0).unwrap();
        raster
    }

    #[test]
    fn test_buffer_roundtrip_keeps_georeferencing() {
        let raster = sample_raster();
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&bytes, None).unwrap();

        assert_eq!(loaded.shape(), (3, 4));
        assert_eq!(loaded.get(2, 3).unwrap(), 11.0);
        assert_eq!(loaded.nodata(), Some(-9999.0));
        assert!(loaded.is_nodata(loaded.get(1, 1).unwrap()));
        assert_eq!(loaded.crs().and_then(|c| c.epsg()), Some(4326));

        let gt = loaded.transform();
        assert!((gt.origin_x - -49.3).abs() < 1e-12);
        assert!((gt.pixel_height - -0.001).abs() < 1e-12);
    }

    #[test]
    fn test_missing_crs_stays_missing() {
        let raster = Raster::filled(2, 2, 1.0f64);
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&bytes, None).unwrap();
        assert!(loaded.crs().is_none());
        assert_eq!(loaded.nodata(), None);
    }

    #[test]
    fn test_band_out_of_range() {
        let bytes = write_geotiff_to_buffer(&sample_raster()).unwrap();
        let err = read_geotiff_from_buffer::<f64>(&bytes, Some(2)).unwrap_err();
        assert!(matches!(err, Error::InvalidBand { band: 2, bands: 1 }));
        let err = read_geotiff_from_buffer::<f64>(&bytes, Some(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidBand { band: 0, .. }));
    }

    #[test]
    fn test_garbage_is_raster_io_error() {
        let err = read_geotiff_from_buffer::<f64>(b"definitely not a tiff", None).unwrap_err();
        assert!(err.is_raster_io());

        let err = read_geotiff::<f64, _>("/nonexistent/dir/raster.tif", None).unwrap_err();
        assert!(err.is_raster_io());
    }

    /// Three-band Float32 UTM file in 2-row strips; band `b` of cell `i`
    /// (row-major) holds `100 * b + i`
    fn three_band_bytes(rows: u32, cols: u32) -> Vec<u8> {
        use tiff::encoder::colortype::RGB32Float;

        let mut buf = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buf)).unwrap();
            let mut image = encoder.new_image::<RGB32Float>(cols, rows).unwrap();
            image.rows_per_strip(2).unwrap();
            image
                .encoder()
                .write_tag(MODEL_PIXEL_SCALE, &[10.0f64, 10.0, 0.0][..])
                .unwrap();
            image
                .encoder()
                .write_tag(MODEL_TIEPOINT, &[0.0f64, 0.0, 0.0, 670_000.0, 7_190_000.0, 0.0][..])
                .unwrap();
            let geokeys = geokeys_for(Some(&CRS::from_epsg(32722)));
            image
                .encoder()
                .write_tag(GEO_KEY_DIRECTORY, geokeys.as_slice())
                .unwrap();

            let data: Vec<f32> = (0..rows * cols)
                .flat_map(|i| (1..=3).map(move |b| (100 * b + i) as f32))
                .collect();
            image.write_data(&data).unwrap();
        }
        buf
    }

    #[test]
    fn test_multiband_file_reads_requested_band() {
        let bytes = three_band_bytes(5, 4);

        let mut reader = GeoTiffReader::new(Cursor::new(&bytes[..]), "three.tif").unwrap();
        assert_eq!(reader.info().bands, 3);
        assert_eq!(reader.info().crs.as_ref().and_then(|c| c.epsg()), Some(32722));

        let b2: Raster<f64> = reader.read_band(2).unwrap();
        assert_eq!(b2.shape(), (5, 4));
        assert_eq!(b2.get(0, 0).unwrap(), 200.0);
        assert_eq!(b2.get(4, 3).unwrap(), 219.0);

        let b3: Raster<f64> = read_geotiff_from_buffer(&bytes, Some(3)).unwrap();
        assert_eq!(b3.get(2, 1).unwrap(), 309.0);
        assert_eq!(b3.transform().origin_x, 670_000.0);

        assert!(matches!(
            reader.read_band::<f64>(4),
            Err(Error::InvalidBand { band: 4, bands: 3 })
        ));
    }

    #[test]
    fn test_window_spans_strips_and_shifts_origin() {
        let bytes = three_band_bytes(9, 6);
        let mut reader = GeoTiffReader::new(Cursor::new(&bytes[..]), "three.tif").unwrap();

        // Rows 3..7 cross three 2-row strips
        let window = PixelWindow::new(3, 2, 4, 3);
        let w: Raster<f64> = reader.read_window(1, &window).unwrap();

        assert_eq!(w.shape(), (4, 3));
        for r in 0..4 {
            for c in 0..3 {
                let i = (r + 3) * 6 + (c + 2);
                assert_eq!(w.get(r, c).unwrap(), (100 + i) as f64);
            }
        }
        let gt = w.transform();
        assert_eq!((gt.origin_x, gt.origin_y), (670_020.0, 7_189_970.0));
        assert_eq!(w.crs().and_then(|c| c.epsg()), Some(32722));

        let empty: Raster<f64> = reader.read_window(1, &PixelWindow::empty()).unwrap();
        assert!(empty.is_empty());

        assert!(matches!(
            reader.read_window::<f64>(1, &PixelWindow::new(8, 0, 2, 1)),
            Err(Error::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_float32_sentinel_matches_its_cells() {
        // -9999.9 is not representable in f32; cells come back as -9999.900390625
        let raster = Raster::filled(4, 4, -9999.9f64)
            .with_transform(GeoTransform::new(0.0, 0.0, 0.001, -0.001))
            .with_crs(CRS::wgs84())
            .with_nodata(-9999.9);
        let bytes = write_geotiff_to_buffer(&raster).unwrap();
        let loaded: Raster<f64> = read_geotiff_from_buffer(&bytes, None).unwrap();

        let cell = loaded.get(0, 0).unwrap();
        assert_eq!(cell, -9999.9f32 as f64);
        assert_eq!(loaded.nodata(), Some(-9999.9f32 as f64));
        assert!(loaded.data().iter().all(|&v| loaded.is_nodata(v)));
        assert_eq!(loaded.statistics().valid_count, 0);
    }

    #[test]
    fn test_native_nodata() {
        assert_eq!(native_nodata::<f32>(Some(-9999.9)), Some(-9999.9f32 as f64));
        assert_eq!(native_nodata::<f64>(Some(-9999.9)), Some(-9999.9));
        assert_eq!(native_nodata::<i16>(Some(-9999.0)), Some(-9999.0));
        assert_eq!(native_nodata::<u8>(Some(-9999.0)), None);
        assert!(native_nodata::<f32>(Some(f64::NAN)).is_some_and(f64::is_nan));
        assert_eq!(native_nodata::<f32>(None), None);
    }

    #[test]
    fn test_geokeys_projected_wins_for_projected_model() {
        let keys = [
            1, 1, 0, 4, //
            GT_MODEL_TYPE, 0, 1, MODEL_TYPE_PROJECTED, //
            GT_RASTER_TYPE, 0, 1, 1, //
            GEOGRAPHIC_TYPE, 0, 1, 4326, //
            PROJECTED_CS_TYPE, 0, 1, 32722,
        ];
        assert_eq!(crs_from_geokeys(&keys).and_then(|c| c.epsg()), Some(32722));
    }

    #[test]
    fn test_geokeys_user_defined_geographic() {
        let keys = [1, 1, 0, 2, GT_MODEL_TYPE, 0, 1, MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE, 0, 1, USER_DEFINED];
        let crs = crs_from_geokeys(&keys).unwrap();
        assert!(crs.is_geographic());
        assert_eq!(crs.epsg(), None);
    }

    #[test]
    fn test_geokeys_written_for_projected() {
        let keys = geokeys_for(Some(&CRS::from_epsg(32722)));
        assert_eq!(keys[3], 3);
        assert_eq!(crs_from_geokeys(&keys).and_then(|c| c.epsg()), Some(32722));
    }

    #[test]
    fn test_parse_nodata() {
        assert_eq!(parse_nodata("-9999\0"), Some(-9999.0));
        assert!(parse_nodata("nan").is_some_and(f64::is_nan));
        assert_eq!(parse_nodata("none"), None);
    }
}
