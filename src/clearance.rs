// src/clearance.rs

//! Clearance form generation: write an employee's name, position and
//! department onto one page of the two-page template and return that page
//! as a standalone PDF.

use std::path::PathBuf;
use std::str::FromStr;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

const FONT_KEY: &str = "FClr";
const FONT_SIZE: i64 = 8;
const TOP_OFFSET: f32 = 153.0;
const LINE_SPACING: f32 = 14.0;
const NAME_X: f32 = 126.0;
const POSITION_X: f32 = 126.0;
const DEPARTMENT_X: f32 = 127.0;
/// US Letter height, used when no MediaBox can be found.
const DEFAULT_PAGE_HEIGHT: f32 = 792.0;

#[derive(Debug, thiserror::Error)]
pub enum ClearanceError {
    #[error("clearance template not found at {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("clearance template unusable: {0}")]
    Template(String),
}

impl From<lopdf::Error> for ClearanceError {
    fn from(e: lopdf::Error) -> Self {
        ClearanceError::Template(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearanceType {
    ProjectHire,
    Contractual,
}

impl ClearanceType {
    /// Zero-based template page holding this variant.
    pub fn page_index(self) -> usize {
        match self {
            ClearanceType::ProjectHire => 0,
            ClearanceType::Contractual => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown clearance type '{0}'")]
pub struct UnknownClearanceType(pub String);

impl FromStr for ClearanceType {
    type Err = UnknownClearanceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "project-hire" => Ok(ClearanceType::ProjectHire),
            "contractual" => Ok(ClearanceType::Contractual),
            other => Err(UnknownClearanceType(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClearanceFields {
    pub employee_name: String,
    pub position: String,
    pub department: String,
}

pub struct ClearanceForms {
    template_path: PathBuf,
}

impl ClearanceForms {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
        }
    }

    /// Load the template and render the requested variant.
    pub async fn fill(
        &self,
        kind: ClearanceType,
        fields: &ClearanceFields,
    ) -> Result<Vec<u8>, ClearanceError> {
        let template = match tokio::fs::read(&self.template_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClearanceError::TemplateMissing(self.template_path.clone()))
            }
            Err(e) => return Err(ClearanceError::Template(e.to_string())),
        };
        tracing::debug!(kind = ?kind, template = %self.template_path.display(), "filling clearance form");
        render(&template, kind, fields)
    }
}

/// Overlay the fields on the variant's page and drop every other page.
pub fn render(
    template: &[u8],
    kind: ClearanceType,
    fields: &ClearanceFields,
) -> Result<Vec<u8>, ClearanceError> {
    let mut doc = Document::load_mem(template)?;
    let pages = doc.get_pages();
    let index = kind.page_index();
    let (&page_number, &page_id) = pages.iter().nth(index).ok_or_else(|| {
        ClearanceError::Template(format!(
            "template has {} page(s), page {} requested",
            pages.len(),
            index + 1
        ))
    })?;

    let height = page_height(&doc, page_id);
    let top = height - TOP_OFFSET;
    let lines = [
        (NAME_X, top, fields.employee_name.as_str()),
        (POSITION_X, top - LINE_SPACING, fields.position.as_str()),
        (DEPARTMENT_X, top - LINE_SPACING * 2.0, fields.department.as_str()),
    ];

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources = page_resources(&doc, page_id, font_id)?;
    let contents = page_contents(&mut doc, page_id, &lines)?;

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Resources", resources);
    page.set("Contents", contents);

    let others: Vec<u32> = pages.keys().copied().filter(|n| *n != page_number).collect();
    doc.delete_pages(&others);
    doc.prune_objects();

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ClearanceError::Template(e.to_string()))?;
    Ok(out)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up a page attribute, following `Parent` links for inherited ones.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    // page trees are shallow; the bound stops reference cycles
    for _ in 0..32 {
        if let Ok(value) = node.get(key) {
            return resolve(doc, value);
        }
        let parent = node.get(b"Parent").and_then(Object::as_reference).ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn page_height(doc: &Document, page_id: ObjectId) -> f32 {
    let Some(Ok(media_box)) = inherited(doc, page_id, b"MediaBox").map(Object::as_array) else {
        return DEFAULT_PAGE_HEIGHT;
    };
    let coords: Vec<f32> = media_box
        .iter()
        .filter_map(|o| resolve(doc, o))
        .filter_map(|o| o.as_float().ok())
        .collect();
    match coords.as_slice() {
        [_, lly, _, ury] => (ury - lly).abs(),
        _ => DEFAULT_PAGE_HEIGHT,
    }
}

/// Own copy of the page's resources with the overlay font registered, so
/// pages sharing a resource dictionary are left alone.
fn page_resources(
    doc: &Document,
    page_id: ObjectId,
    font_id: ObjectId,
) -> Result<Dictionary, ClearanceError> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(d)) => d.clone(),
        Some(_) => return Err(ClearanceError::Template("page resources are not a dictionary".into())),
        None => Dictionary::new(),
    };
    let mut fonts = match resources.get(b"Font").ok().and_then(|f| resolve(doc, f)) {
        Some(Object::Dictionary(d)) => d.clone(),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_KEY, Object::Reference(font_id));
    resources.set("Font", fonts);
    Ok(resources)
}

/// Existing content wrapped in `q`/`Q`, followed by the overlay stream.
fn page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    lines: &[(f32, f32, &str)],
) -> Result<Vec<Object>, ClearanceError> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Array(items)) => items.clone(),
        Ok(reference @ Object::Reference(_)) => vec![reference.clone()],
        _ => Vec::new(),
    };

    let save = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
    let restore = doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
    let overlay = doc.add_object(Stream::new(dictionary! {}, overlay_ops(lines).encode()?));

    let mut contents = Vec::with_capacity(existing.len() + 3);
    contents.push(Object::Reference(save));
    contents.extend(existing);
    contents.push(Object::Reference(restore));
    contents.push(Object::Reference(overlay));
    Ok(contents)
}

fn overlay_ops(lines: &[(f32, f32, &str)]) -> Content {
    let black = vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)];
    let mut operations = vec![Operation::new("rg", black)];
    for (x, y, text) in lines {
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec![FONT_KEY.into(), Object::Integer(FONT_SIZE)]));
        operations.push(Operation::new("Td", vec![Object::Real(*x), Object::Real(*y)]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(win_ansi(text))]));
        operations.push(Operation::new("ET", vec![]));
    }
    Content { operations }
}

/// Latin-1 bytes for the standard font; anything outside it becomes `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
