//! Character sheet generation.
//!
//! A sheet is three fixed A4 pages over background artwork: stats and
//! skills, background story, and the nine spell-level sections. Layout is a
//! pure function of the character data ([`layout::layout_sheet`]); the PDF
//! writer turns the positioned runs into bytes.

pub mod assets;
pub mod cache;
pub mod font_metrics;
pub mod handlers;
pub mod layout;
pub mod pdf;
pub mod template;
pub mod wrap;

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{Character, RecordId, Skill, Spell};

pub use assets::SheetAssets;
pub use cache::RenderCache;
pub use layout::{OverflowPolicy, SheetOptions};
pub use template::SheetTemplate;

/// Suffix of every generated file name.
pub const FILENAME_SUFFIX: &str = "_HojaDePersonaje.pdf";
/// Used when the character has no usable name.
pub const FALLBACK_FILENAME_STEM: &str = "personaje";

#[derive(Debug, Error)]
pub enum SheetError {
    #[error("sheet template '{path}' could not be read: {message}")]
    AssetRead { path: String, message: String },

    #[error("sheet template '{name}' could not be decoded: {message}")]
    AssetDecode { name: String, message: String },

    #[error("PDF encoding failed: {0}")]
    Pdf(String),

    #[error("render task failed: {0}")]
    Task(String),
}

/// A finished sheet, shared between the preview and download endpoints.
#[derive(Debug, Clone)]
pub struct SheetDocument {
    pub bytes: Bytes,
    pub page_count: usize,
    pub filename: String,
    pub overflowed_regions: Vec<String>,
}

pub type SheetCache = RenderCache<SheetDocument>;

/// `{name}_HojaDePersonaje.pdf`, with characters unsafe in a file name
/// replaced by `_`.
pub fn sheet_filename(name: Option<&str>) -> String {
    let stem: String = name
        .unwrap_or_default()
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        format!("{FALLBACK_FILENAME_STEM}{FILENAME_SUFFIX}")
    } else {
        format!("{stem}{FILENAME_SUFFIX}")
    }
}

/// Lays out and encodes character sheets. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SheetService {
    assets: Arc<SheetAssets>,
    template: Arc<SheetTemplate>,
    options: SheetOptions,
    cache: Arc<SheetCache>,
}

impl SheetService {
    pub fn new(assets: SheetAssets, template: SheetTemplate, options: SheetOptions) -> Self {
        Self {
            assets: Arc::new(assets),
            template: Arc::new(template),
            options,
            cache: Arc::new(SheetCache::new()),
        }
    }

    pub fn cache(&self) -> &SheetCache {
        &self.cache
    }

    /// Drops the cached sheet of a character after any change to it.
    pub fn invalidate(&self, character_id: &RecordId) {
        self.cache.invalidate(character_id);
    }

    /// Builds the sheet synchronously. CPU-bound; call from a blocking task.
    pub fn render(
        &self,
        character: &Character,
        skills: &[Skill],
        spells: &[Spell],
    ) -> Result<SheetDocument, SheetError> {
        let layout = layout::layout_sheet(character, skills, spells, &self.template, &self.options);
        let filename = sheet_filename(character.name.as_deref());

        if !layout.overflowed_regions.is_empty() {
            warn!(
                character = character.name.as_deref().unwrap_or_default(),
                regions = ?layout.overflowed_regions,
                policy = ?self.options.overflow,
                "Sheet content did not fit its regions"
            );
        }

        let bytes = pdf::write_pdf(
            &layout,
            &self.assets,
            &self.template,
            self.options.font,
            filename.trim_end_matches(".pdf"),
        )?;

        info!(
            filename = %filename,
            pages = layout.pages.len(),
            size_bytes = bytes.len(),
            "Rendered character sheet"
        );

        Ok(SheetDocument {
            bytes: Bytes::from(bytes),
            page_count: layout.pages.len(),
            filename,
            overflowed_regions: layout.overflowed_regions,
        })
    }

    /// Runs [`SheetService::render`] on the blocking pool.
    pub async fn render_blocking(
        &self,
        character: Character,
        skills: Vec<Skill>,
        spells: Vec<Spell>,
    ) -> Result<SheetDocument, SheetError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.render(&character, &skills, &spells))
            .await
            .map_err(|e| SheetError::Task(e.to_string()))?
    }
}
