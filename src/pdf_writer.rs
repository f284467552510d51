use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::AssembleError;
use crate::normalize::PageColor;

/// Builds a PDF with one full-bleed JPEG image per page.
///
/// Page geometry maps one pixel to one point, so the media box is the image size.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append a page drawing `jpeg_data` (DCT encoded) over its whole media box.
    pub fn add_jpeg_page(
        &mut self,
        jpeg_data: Vec<u8>,
        width: u32,
        height: u32,
        color: PageColor,
    ) -> ObjectId {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color.pdf_color_space(),
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg_data,
        );
        let image_id = self.doc.add_object(Object::Stream(image));

        let content = Stream::new(dictionary! {}, build_page_content("Im0", width, height));
        let content_id = self.doc.add_object(Object::Stream(content));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(width as i64),
                Object::Integer(height as i64),
            ],
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
            "Contents" => content_id,
        });

        self.kids.push(page_id.into());
        page_id
    }

    /// Close the page tree and serialize. A document without pages is refused.
    pub fn finish(mut self) -> Result<Vec<u8>, AssembleError> {
        if self.kids.is_empty() {
            return Err(AssembleError::Document(
                "refusing to write a PDF without pages".to_string(),
            ));
        }

        let count = self.kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids,
            "Count" => count,
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.doc
            .save_to(&mut buf)
            .map_err(|e| AssembleError::Document(e.to_string()))?;

        Ok(buf)
    }
}

/// `q <w> 0 0 <h> 0 0 cm /<name> Do Q`: scale the unit-square image to the page.
pub fn build_page_content(image_name: &str, width: u32, height: u32) -> Vec<u8> {
    format!("q {width} 0 0 {height} 0 0 cm /{image_name} Do Q").into_bytes()
}
