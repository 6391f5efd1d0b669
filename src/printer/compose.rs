use std::io::Write;

use image::imageops;
use image::imageops::FilterType;
use image::codecs::jpeg::JpegEncoder;
use image::Rgb;
use image::RgbImage;
use serde::Deserialize;

/// Tile layout of one printed page, in pixels.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PageGeometry {
    pub page_width: u32,
    pub page_height: u32,
    pub columns: u32,
    pub rows: u32,
    pub card_width: u32,
    pub card_height: u32,
    pub margin_left: u32,
    pub margin_top: u32,
    pub gap: u32
}

/// A4 at 300 dpi, 3x3 cards of 59x86mm.
impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width : 2480,
            page_height: 3508,
            columns    : 3,
            rows       : 3,
            card_width : 697,
            card_height: 1016,
            margin_left: 193,
            margin_top : 229,
            gap        : 1
        }
    }
}

impl PageGeometry {
    pub fn per_page(&self) -> usize {
        (self.columns * self.rows).max(1) as usize
    }

    /// Top left corner of the `index`th tile on a page.
    pub fn slot(&self, index: usize) -> (i64, i64) {
        let columns = self.columns.max(1) as usize;
        let (x, y) = ((index % columns) as i64, (index / columns) as i64);
        (self.margin_left as i64 + x * (self.card_width + self.gap) as i64,
         self.margin_top as i64 + y * (self.card_height + self.gap) as i64)
    }
}

/// Lay cards out in reading order, opening a new page whenever one is full.
///
/// A [`None`] keeps its slot blank.
pub fn compose<'a, I>(images: I, geometry: &PageGeometry) -> Vec<RgbImage> where I: IntoIterator<Item = Option<&'a RgbImage>> {
    let images: Vec<Option<&RgbImage>> = images.into_iter().collect();
    images.chunks(geometry.per_page()).map(|chunk| {
        let mut page = RgbImage::from_pixel(geometry.page_width, geometry.page_height, Rgb([255, 255, 255]));
        for (index, image) in chunk.iter().enumerate() {
            let image = match image {
                Some(image) => image,
                None => continue
            };
            let (x, y) = geometry.slot(index);
            if image.dimensions() == (geometry.card_width, geometry.card_height) {
                imageops::overlay(&mut page, *image, x, y);
            } else {
                let tile = imageops::resize(*image, geometry.card_width, geometry.card_height, FilterType::Triangle);
                imageops::overlay(&mut page, &tile, x, y);
            }
        }
        page
    }).collect()
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(image)
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
    Ok(buf)
}

// ==================================================
// Object layout:
// 1           catalog
// 2           page tree
// 3 + 3n      page n
// 4 + 3n      content stream of page n
// 5 + 3n      jpeg of page n
// ==================================================
/// Write pages as a PDF 1.4 document, one full page image per page.
pub fn write_pdf<W: Write>(pages: &[RgbImage], dpi: u32, quality: u8, mut writer: W) -> std::io::Result<()> {
    let mut buf: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();
    let points = |pixel: u32| pixel as f64 * 72.0 / dpi.max(1) as f64;

    buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    offsets.push(buf.len());
    write!(buf, "1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

    let kids = (0..pages.len()).map(|n| format!("{} 0 R", 3 + 3 * n)).collect::<Vec<_>>().join(" ");
    offsets.push(buf.len());
    write!(buf, "2 0 obj\n<< /Type /Pages /Kids [{}] /Count {} >>\nendobj\n", kids, pages.len())?;

    for (n, page) in pages.iter().enumerate() {
        let (page_id, content_id, image_id) = (3 + 3 * n, 4 + 3 * n, 5 + 3 * n);
        let (width, height) = (points(page.width()), points(page.height()));

        offsets.push(buf.len());
        write!(buf, "{} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << /XObject << /Im0 {} 0 R >> >> /Contents {} 0 R >>\nendobj\n",
            page_id, width, height, image_id, content_id)?;

        let content = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q", width, height);
        offsets.push(buf.len());
        write!(buf, "{} 0 obj\n<< /Length {} >>\nstream\n{}\nendstream\nendobj\n", content_id, content.len(), content)?;

        let jpeg = encode_jpeg(page, quality)?;
        offsets.push(buf.len());
        write!(buf, "{} 0 obj\n<< /Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
            image_id, page.width(), page.height(), jpeg.len())?;
        buf.extend_from_slice(&jpeg);
        write!(buf, "\nendstream\nendobj\n")?;
    }

    let xref = buf.len();
    write!(buf, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1)?;
    for offset in offsets.iter() {
        write!(buf, "{:010} 00000 n \n", offset)?;
    }
    write!(buf, "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n", offsets.len() + 1, xref)?;

    writer.write_all(&buf)?;
    writer.flush()
}
