//! Serializes a [`SheetLayout`] into PDF bytes with lopdf.
//!
//! Each fixed page gets its background image stretched over the full
//! MediaBox, with the text runs drawn on top in one of the base-14 fonts.
//! Continuation pages carry text only. The writer adds no timestamps, so
//! identical layouts give identical bytes.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use crate::sheet::assets::{BackgroundImage, SheetAssets};
use crate::sheet::font_metrics::{FontFamily, FontWeight};
use crate::sheet::layout::{PageKind, PageLayout, SheetLayout, TextRun};
use crate::sheet::template::SheetTemplate;
use crate::sheet::SheetError;

const PDF_VERSION: &str = "1.5";
const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";
const BACKGROUND_XOBJECT: &str = "Bg";

/// Renders `layout` to a complete PDF document.
pub fn write_pdf(
    layout: &SheetLayout,
    assets: &SheetAssets,
    template: &SheetTemplate,
    font: FontFamily,
    title: &str,
) -> Result<Vec<u8>, SheetError> {
    let mut doc = Document::with_version(PDF_VERSION);
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font_dictionary(font, FontWeight::Regular));
    let bold_id = doc.add_object(font_dictionary(font, FontWeight::Bold));

    // One XObject per distinct background, shared by every page that uses it.
    let mut backgrounds: [Option<ObjectId>; 3] = [None; 3];
    let mut kids: Vec<Object> = Vec::with_capacity(layout.pages.len());

    for page in &layout.pages {
        let background = match background_index(page.kind) {
            Some(index) => {
                let id = match backgrounds[index] {
                    Some(id) => id,
                    None => {
                        let image = assets.page(index).ok_or_else(|| {
                            SheetError::Pdf(format!("no background for page {}", index + 1))
                        })?;
                        let id = doc.add_object(image_xobject(image));
                        backgrounds[index] = Some(id);
                        id
                    }
                };
                Some(id)
            }
            None => None,
        };

        let operations = page_operations(page, template, background.is_some());
        let content = Content { operations }
            .encode()
            .map_err(|e| SheetError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));

        let mut resources = dictionary! {
            "Font" => dictionary! {
                REGULAR_FONT => regular_id,
                BOLD_FONT => bold_id,
            },
        };
        if let Some(image_id) = background {
            resources.set(
                "XObject",
                dictionary! { BACKGROUND_XOBJECT => image_id },
            );
        }
        let resources_id = doc.add_object(resources);

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            template.page_width.into(),
            template.page_height.into(),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
        "Producer" => Object::string_literal("cavern"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| SheetError::Pdf(e.to_string()))?;
    Ok(bytes)
}

fn background_index(kind: PageKind) -> Option<usize> {
    match kind {
        PageKind::Stats => Some(0),
        PageKind::Background => Some(1),
        PageKind::Spells => Some(2),
        PageKind::Continuation => None,
    }
}

fn font_dictionary(font: FontFamily, weight: FontWeight) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_font(weight),
        "Encoding" => "WinAnsiEncoding",
    }
}

fn image_xobject(image: &BackgroundImage) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => image.width as i64,
        "Height" => image.height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };
    Stream::new(dict, image.rgb.clone())
}

fn page_operations(page: &PageLayout, template: &SheetTemplate, background: bool) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(page.runs.len() * 5 + 4);

    if background {
        ops.push(Operation::new("q", vec![]));
        ops.push(Operation::new(
            "cm",
            vec![
                template.page_width.into(),
                0.into(),
                0.into(),
                template.page_height.into(),
                0.into(),
                0.into(),
            ],
        ));
        ops.push(Operation::new("Do", vec![Object::Name(BACKGROUND_XOBJECT.into())]));
        ops.push(Operation::new("Q", vec![]));
    }

    for run in &page.runs {
        push_text_run(&mut ops, run, template.page_height);
    }
    ops
}

fn push_text_run(ops: &mut Vec<Operation>, run: &TextRun, page_height: f32) {
    let font = match run.weight {
        FontWeight::Regular => REGULAR_FONT,
        FontWeight::Bold => BOLD_FONT,
    };
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.into()), run.size_pt.into()],
    ));
    ops.push(Operation::new(
        "Td",
        vec![run.x.into(), (page_height - run.y).into()],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(encode_win_ansi(&run.text), StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Maps text to WinAnsiEncoding bytes. Characters outside the code page
/// become `?`; control characters become spaces.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            c if c.is_control() => b' ',
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::assets::test_assets;

    fn run(text: &str, weight: FontWeight) -> TextRun {
        TextRun {
            x: 60.0,
            y: 72.0,
            text: text.to_string(),
            size_pt: 12.0,
            weight,
        }
    }

    fn sample_layout() -> SheetLayout {
        SheetLayout {
            pages: vec![
                PageLayout {
                    kind: PageKind::Stats,
                    runs: vec![run("Thrain", FontWeight::Bold), run("28", FontWeight::Regular)],
                },
                PageLayout {
                    kind: PageKind::Background,
                    runs: vec![run("Exiled (long ago)", FontWeight::Regular)],
                },
                PageLayout {
                    kind: PageKind::Spells,
                    runs: vec![],
                },
            ],
            overflowed_regions: vec![],
        }
    }

    fn render(layout: &SheetLayout) -> Vec<u8> {
        write_pdf(
            layout,
            &test_assets(),
            &SheetTemplate::default(),
            FontFamily::Helvetica,
            "Thrain",
        )
        .unwrap()
    }

    #[test]
    fn test_writes_one_pdf_page_per_layout_page() {
        let bytes = render(&sample_layout());
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_continuation_page_has_no_background() {
        let mut layout = sample_layout();
        layout.pages.push(PageLayout {
            kind: PageKind::Continuation,
            runs: vec![run("Skills (cont.)", FontWeight::Bold)],
        });
        let doc = Document::load_mem(&render(&layout)).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 4);

        let resources_id = doc
            .get_dictionary(pages[&4])
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_reference()
            .unwrap();
        let resources = doc.get_dictionary(resources_id).unwrap();
        assert!(resources.get(b"XObject").is_err());
        assert!(resources.get(b"Font").is_ok());
    }

    #[test]
    fn test_output_is_byte_identical_across_runs() {
        let layout = sample_layout();
        assert_eq!(render(&layout), render(&layout));
    }

    #[test]
    fn test_text_is_extractable() {
        let bytes = render(&sample_layout());
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Thrain"));
        assert!(text.contains("28"));
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("Año"), vec![b'A', 0xf1, b'o']);
        assert_eq!(encode_win_ansi("a…b"), vec![b'a', 0x85, b'b']);
        assert_eq!(encode_win_ansi("火"), vec![b'?']);
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
    }
}
