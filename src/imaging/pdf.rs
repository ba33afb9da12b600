//! Single-page PDF packing with `lopdf`.
//!
//! The page is A4. The JPEG is embedded untouched as a `DCTDecode` image
//! XObject and drawn from the top-left corner at the layout's size:
//!
//! ```text
//! q
//!   image_width 0 0 image_height 0 (page_height - image_height) cm
//!   /Im0 Do
//! Q
//! ```

use super::backend::{BackendError, Dimensions, DocumentPacker};
use super::calculations::{A4_PAGE_HEIGHT, A4_PAGE_WIDTH, PageLayout};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Production [`DocumentPacker`].
#[derive(Debug, Default)]
pub struct PdfPacker;

impl PdfPacker {
    pub fn new() -> Self {
        Self
    }
}

fn pdf_err(e: lopdf::Error) -> BackendError {
    BackendError::ProcessingFailed(format!("PDF write failed: {}", e))
}

/// Image XObject for a JPEG, passed through as-is.
fn jpeg_xobject(jpeg: &[u8], dimensions: Dimensions) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => dimensions.width as i64,
        "Height" => dimensions.height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "DCTDecode",
    };
    // DCT data must not be re-compressed
    Stream::new(dict, jpeg.to_vec()).with_compression(false)
}

impl DocumentPacker for PdfPacker {
    fn page_size(&self) -> (f32, f32) {
        (A4_PAGE_WIDTH, A4_PAGE_HEIGHT)
    }

    fn pack(
        &self,
        image: &[u8],
        dimensions: Dimensions,
        layout: &PageLayout,
    ) -> Result<Vec<u8>, BackendError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let image_id = doc.add_object(jpeg_xobject(image, dimensions));

        let top = layout.page_height - layout.image_height;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        layout.image_width.into(),
                        0.into(),
                        0.into(),
                        layout.image_height.into(),
                        0.into(),
                        top.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().map_err(pdf_err)?,
        ));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
            "MediaBox" => vec![
                0.into(),
                0.into(),
                layout.page_width.into(),
                layout.page_height.into(),
            ],
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| BackendError::ProcessingFailed(format!("PDF write failed: {}", e)))?;
        Ok(out)
    }
}
