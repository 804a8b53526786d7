use std::collections::{BTreeSet, HashMap};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream, StringFormat};

use crate::assets::image::flate_compress;
use crate::assets::{DecodedImage, ImageFilter};
use crate::layout::fonts::encode_win_ansi;
use crate::layout::{Color, DrawOp, FontFace, FontStyle, Page};
use crate::types::RenderError;

use super::document::Document;

const PRODUCER: &str = "auditpress";

fn font_resource(style: FontStyle) -> &'static str {
    match style {
        FontStyle::Regular => "F1",
        FontStyle::Bold => "F2",
    }
}

fn color_operands(color: &Color) -> Vec<Object> {
    vec![color.r.into(), color.g.into(), color.b.into()]
}

/// Serialize a laid-out document to PDF bytes
pub fn write_pdf(document: &Document) -> Result<Vec<u8>, RenderError> {
    let mut pdf = lopdf::Document::with_version("1.7");
    let pages_id = pdf.new_object_id();

    let regular_id = add_font(&mut pdf, &document.fonts.regular)?;
    let bold_id = add_font(&mut pdf, &document.fonts.bold)?;

    // Only images actually drawn are embedded, in key order
    let used: BTreeSet<&str> = document
        .pages
        .iter()
        .flat_map(|page| page.image_keys())
        .collect();
    let mut image_names = HashMap::new();
    let mut xobjects = Dictionary::new();
    for key in used {
        let Some(image) = document.images.get(key) else {
            continue;
        };
        let name = format!("Im{}", image_names.len() + 1);
        let id = add_image(&mut pdf, image);
        xobjects.set(name.clone(), id);
        image_names.insert(key, name);
    }

    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
        "XObject" => xobjects,
    });

    let width = document.geometry.width;
    let height = document.geometry.height;
    let mut kids = Vec::with_capacity(document.pages.len());
    for page in &document.pages {
        let content = Content {
            operations: page_operations(page, height, &image_names),
        };
        let encoded = flate_compress(&content.encode()?)?;
        let content_id = pdf.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            encoded,
        ));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let created = document.info.created.format("D:%Y%m%d%H%M%SZ").to_string();
    let info_id = pdf.add_object(dictionary! {
        "Title" => Object::string_literal(document.info.title.as_str()),
        "Author" => Object::string_literal(document.info.author.as_str()),
        "Producer" => Object::string_literal(PRODUCER),
        "CreationDate" => Object::string_literal(created),
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    pdf.save_to(&mut buffer)?;
    Ok(buffer)
}

fn add_font(pdf: &mut lopdf::Document, face: &FontFace) -> Result<ObjectId, RenderError> {
    let Some(program) = &face.program else {
        return Ok(pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => face.base_name.as_str(),
            "Encoding" => "WinAnsiEncoding",
        }));
    };

    let file_id = pdf.add_object(Stream::new(
        dictionary! {
            "Length1" => program.data.len() as i64,
            "Filter" => "FlateDecode",
        },
        flate_compress(&program.data)?,
    ));
    let (x0, y0, x1, y1) = program.bbox;
    let descriptor_id = pdf.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => face.base_name.as_str(),
        // Nonsymbolic
        "Flags" => 32,
        "FontBBox" => vec![
            Object::Integer(x0 as i64),
            Object::Integer(y0 as i64),
            Object::Integer(x1 as i64),
            Object::Integer(y1 as i64),
        ],
        "ItalicAngle" => program.italic_angle as i64,
        "Ascent" => program.ascent as i64,
        "Descent" => program.descent as i64,
        "CapHeight" => program.cap_height as i64,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    let widths: Vec<Object> = face
        .widths()
        .iter()
        .map(|w| Object::Integer(*w as i64))
        .collect();
    Ok(pdf.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => face.base_name.as_str(),
        "FirstChar" => face.first_char() as i64,
        "LastChar" => face.last_char() as i64,
        "Widths" => widths,
        "Encoding" => "WinAnsiEncoding",
        "FontDescriptor" => descriptor_id,
    }))
}

fn add_image(pdf: &mut lopdf::Document, image: &DecodedImage) -> ObjectId {
    let filter = match image.filter {
        ImageFilter::Dct => "DCTDecode",
        ImageFilter::Flate => "FlateDecode",
    };
    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => image.color_space,
        "BitsPerComponent" => 8,
        "Filter" => filter,
    };
    if let Some(alpha) = &image.alpha {
        let mask_id = pdf.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            alpha.clone(),
        ));
        dict.set("SMask", mask_id);
    }
    pdf.add_object(Stream::new(dict, image.data.clone()))
}

/// Content stream for one page. Draw ops are top-down; PDF user space is
/// bottom-up, so every y is flipped against the page height.
fn page_operations(page: &Page, height: f32, images: &HashMap<&str, String>) -> Vec<Operation> {
    let mut ops = Vec::new();
    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                y,
                text,
                font,
                size,
                color,
            } => {
                if text.is_empty() {
                    continue;
                }
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![font_resource(*font).into(), (*size).into()],
                ));
                ops.push(Operation::new("rg", color_operands(color)));
                ops.push(Operation::new("Td", vec![(*x).into(), (height - y).into()]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            DrawOp::FillRect {
                x,
                y,
                width,
                height: h,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("rg", color_operands(color)));
                ops.push(Operation::new(
                    "re",
                    vec![(*x).into(), (height - y - h).into(), (*width).into(), (*h).into()],
                ));
                ops.push(Operation::new("f", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::StrokeRect {
                x,
                y,
                width,
                height: h,
                color,
                line_width,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("RG", color_operands(color)));
                ops.push(Operation::new("w", vec![(*line_width).into()]));
                ops.push(Operation::new(
                    "re",
                    vec![(*x).into(), (height - y - h).into(), (*width).into(), (*h).into()],
                ));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
                line_width,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new("RG", color_operands(color)));
                ops.push(Operation::new("w", vec![(*line_width).into()]));
                ops.push(Operation::new("m", vec![(*x1).into(), (height - y1).into()]));
                ops.push(Operation::new("l", vec![(*x2).into(), (height - y2).into()]));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::Image {
                x,
                y,
                width,
                height: h,
                key,
            } => {
                let Some(name) = images.get(key.as_str()) else {
                    continue;
                };
                ops.push(Operation::new("q", vec![]));
                ops.push(Operation::new(
                    "cm",
                    vec![
                        (*width).into(),
                        0.into(),
                        0.into(),
                        (*h).into(),
                        (*x).into(),
                        (height - y - h).into(),
                    ],
                ));
                ops.push(Operation::new("Do", vec![name.as_str().into()]));
                ops.push(Operation::new("Q", vec![]));
            }
            DrawOp::Marker(_) => {}
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{bundled, Icon, ResolvedAssets};
    use crate::render::document::{layout_document, DocumentOptions};
    use crate::types::{AuditRecord, Finding, FindingStatus, Severity};

    fn document() -> Document {
        let mut assets = ResolvedAssets::default();
        for icon in Icon::ALL {
            assets.insert(icon.key(), bundled::lookup(icon.name()).unwrap().to_vec());
        }
        let record = AuditRecord {
            name: "Example Token".to_string(),
            slug: "example-token".to_string(),
            findings: vec![Finding {
                id: "F-1".to_string(),
                title: "Unchecked transfer".to_string(),
                severity: Severity::High,
                status: FindingStatus::Detected,
                category: None,
                description: Some("Return value ignored.".to_string()),
                location: None,
                recommendation: None,
                alleviation: None,
            }],
            ..Default::default()
        };
        layout_document(&record, &assets, &DocumentOptions::new("Test Org"), &mut || Ok(()))
            .unwrap()
    }

    #[test]
    fn test_pdf_has_one_page_per_layout_page() {
        let document = document();
        let bytes = write_pdf(&document).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), document.page_count());
    }

    #[test]
    fn test_info_dictionary() {
        let bytes = write_pdf(&document()).unwrap();
        let parsed = lopdf::Document::load_mem(&bytes).unwrap();
        let info_id = parsed.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = parsed.get_dictionary(info_id).unwrap();
        let title = info.get(b"Title").unwrap().as_str().unwrap();
        assert_eq!(title, b"Example Token Security Audit");
        let producer = info.get(b"Producer").unwrap().as_str().unwrap();
        assert_eq!(producer, b"auditpress");
    }

    #[test]
    fn test_y_axis_is_flipped() {
        let mut page = Page::new(crate::layout::PageKind::Body);
        page.ops.push(DrawOp::FillRect {
            x: 10.0,
            y: 20.0,
            width: 30.0,
            height: 40.0,
            color: Color::BLACK,
        });
        let ops = page_operations(&page, 800.0, &HashMap::new());
        let re = ops.iter().find(|op| op.operator == "re").unwrap();
        assert_eq!(re.operands[1].as_float().unwrap(), 740.0);
    }

    #[test]
    fn test_undrawn_images_are_not_embedded() {
        let mut page = Page::new(crate::layout::PageKind::Body);
        page.ops.push(DrawOp::Image {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
            key: "missing".to_string(),
        });
        assert!(page_operations(&page, 800.0, &HashMap::new()).is_empty());
    }
}
