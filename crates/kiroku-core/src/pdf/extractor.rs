//! Page text and scan image extraction using lopdf and pdf-extract.

use std::io::Cursor;

use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use super::{PdfPage, Result};
use crate::error::PdfError;

/// Loaded PDF document.
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
}

impl PdfExtractor {
    /// Parse a PDF from bytes, decrypting empty-password documents.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", document.get_pages().len());
        Ok(Self { document, raw_data })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Load up to `max_pages` pages (0 = all).
    ///
    /// Text or image failures on a page leave that part empty; the page is
    /// still returned so the caller can report it.
    pub fn pages(&self, max_pages: usize) -> Vec<PdfPage> {
        let mut count = self.page_count();
        if max_pages > 0 {
            count = count.min(max_pages as u32);
        }

        (1..=count)
            .map(|number| PdfPage {
                number,
                text: self.page_text(number).unwrap_or_default(),
                image: self.page_image(number).ok(),
            })
            .collect()
    }

    /// Embedded text of one page.
    pub fn page_text(&self, page: u32) -> Result<String> {
        if !self.document.get_pages().contains_key(&page) {
            return Err(PdfError::InvalidPage(page));
        }
        match self.document.extract_text(&[page]) {
            Ok(text) => Ok(text),
            Err(e) if self.page_count() == 1 => {
                trace!("lopdf text extraction failed ({}), using pdf-extract", e);
                pdf_extract::extract_text_from_mem(&self.raw_data)
                    .map_err(|e| PdfError::TextExtraction(e.to_string()))
            }
            Err(e) => Err(PdfError::TextExtraction(e.to_string())),
        }
    }

    /// First decodable scan image of one page, as PNG bytes.
    pub fn page_image(&self, page: u32) -> Result<Vec<u8>> {
        let page_id = *self
            .document
            .get_pages()
            .get(&page)
            .ok_or(PdfError::InvalidPage(page))?;

        let image = self
            .page_resources(page_id)
            .and_then(|resources| self.first_xobject_image(&resources))
            .ok_or_else(|| PdfError::ImageExtraction(format!("no scan image on page {}", page)))?;

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| PdfError::ImageExtraction(e.to_string()))?;
        trace!("Page {} scan re-encoded as {} bytes of PNG", page, png.len());
        Ok(png)
    }

    fn first_xobject_image(&self, resources: &Dictionary) -> Option<DynamicImage> {
        let xobjects = resources.get(b"XObject").ok()?;
        let (_, Object::Dictionary(xobjects)) = self.document.dereference(xobjects).ok()? else {
            return None;
        };
        xobjects.iter().find_map(|(_, reference)| {
            let (_, object) = self.document.dereference(reference).ok()?;
            self.decode_image(object)
        })
    }

    fn decode_image(&self, object: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = object else {
            return None;
        };
        let dict = &stream.dict;
        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);
        if width == 0 || height == 0 {
            return None;
        }

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg).ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok()?.as_name().ok(),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        let pixels = (width as usize).checked_mul(height as usize)?;

        match color_space {
            b"DeviceRGB" | b"RGB" => {
                let len = pixels.checked_mul(3).filter(|&len| data.len() >= len)?;
                RgbImage::from_raw(width, height, data[..len].to_vec())
                    .map(DynamicImage::ImageRgb8)
            }
            b"DeviceGray" | b"G" if data.len() >= pixels => {
                GrayImage::from_raw(width, height, data[..pixels].to_vec())
                    .map(DynamicImage::ImageLuma8)
            }
            _ => {
                trace!(
                    "Could not decode image: {} bytes, colorspace {}",
                    data.len(),
                    String::from_utf8_lossy(color_space)
                );
                None
            }
        }
    }

    /// Resources of a page, following `Parent` inheritance.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Object::Dictionary(dict) = self.document.get_object(node_id).ok()? else {
            return None;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(resources))) = self.document.dereference(resources) {
                return Some(resources.clone());
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Stream};

    #[test]
    fn test_garbage_is_parse_error() {
        let err = PdfExtractor::load(b"definitely not a pdf").err().unwrap();
        assert!(matches!(err, PdfError::Parse(_)));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(PdfExtractor::load(&[]).is_err());
    }

    /// One-page PDF whose only resource is a gray image XObject.
    fn scan_pdf(width: i64, height: i64, pixels: Vec<u8>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8i64,
            },
            pixels,
        ));
        let content_id = doc.add_object(Stream::new(dictionary! {}, b"q Q".to_vec()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "MediaBox" => vec![0i64.into(), 0i64.into(), 595i64.into(), 842i64.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_small_scan_is_extracted() {
        let extractor = PdfExtractor::load(&scan_pdf(2, 2, vec![0, 255, 255, 0])).unwrap();
        let png = extractor.page_image(1).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn test_oversized_scan_dimensions_are_rejected() {
        let extractor = PdfExtractor::load(&scan_pdf(100_000, 100_000, vec![0; 64])).unwrap();
        assert!(matches!(
            extractor.page_image(1),
            Err(PdfError::ImageExtraction(_))
        ));
    }

    #[test]
    fn test_negative_scan_dimensions_are_rejected() {
        let extractor = PdfExtractor::load(&scan_pdf(-1, 4, vec![0; 64])).unwrap();
        assert!(extractor.page_image(1).is_err());
    }
}
