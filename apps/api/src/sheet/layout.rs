//! Sheet pagination: turns a character, its skills and its spells into
//! positioned text runs on three fixed pages.
//!
//! # Pages
//! - Page 1: scalar stat fields at fixed slots, then the skill list.
//! - Page 2: the free-text background, word-wrapped into one column.
//! - Page 3: nine static sections, one per spell level.
//!
//! # Overflow
//! Every list is flowed into a fixed `TextRegion`. When a region cannot hold
//! all of its lines the `OverflowPolicy` decides what happens:
//! - `Truncate`: keep what fits, reserving the last slot for `...`.
//! - `Continue`: fill every slot and move the rest to continuation pages
//!   appended after page 3.
//!
//! Regions never borrow space from each other. Layout is pure and
//! deterministic; the PDF writer consumes the result.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::models::{Character, Skill, Spell};
use crate::sheet::font_metrics::{get_metrics, FontFamily, FontMetricTable, FontWeight};
use crate::sheet::template::{FieldSlot, SheetTemplate, TextRegion};
use crate::sheet::wrap::wrap_text;

pub const ELLIPSIS: &str = "...";
pub const TEXT_PLACEHOLDER: &str = "N/A";
pub const NUMBER_PLACEHOLDER: &str = "0";

// ────────────────────────────────────────────────────────────────────────────
// Options
// ────────────────────────────────────────────────────────────────────────────

/// What to do with lines that do not fit their region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    Truncate,
    Continue,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "truncate" => Ok(OverflowPolicy::Truncate),
            "continue" => Ok(OverflowPolicy::Continue),
            other => Err(format!("unknown overflow policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetOptions {
    pub overflow: OverflowPolicy,
    pub font: FontFamily,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self {
            overflow: OverflowPolicy::Truncate,
            font: FontFamily::Helvetica,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A single positioned line of text. `y` is the baseline, top-left origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextRun {
    pub x: f32,
    pub y: f32,
    pub text: String,
    pub size_pt: f32,
    pub weight: FontWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PageKind {
    Stats,
    Background,
    Spells,
    Continuation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub kind: PageKind,
    pub runs: Vec<TextRun>,
}

impl PageLayout {
    fn new(kind: PageKind) -> Self {
        Self {
            kind,
            runs: Vec::new(),
        }
    }

    /// True if some run on this page contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.runs.iter().any(|r| r.text.contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetLayout {
    pub pages: Vec<PageLayout>,
    /// Titles of the regions whose content did not fit.
    pub overflowed_regions: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Spell partitioning
// ────────────────────────────────────────────────────────────────────────────

/// Spells grouped into the nine level buckets of page 3.
pub struct SpellBook<'a> {
    buckets: [Vec<&'a Spell>; 9],
    dropped: usize,
}

impl<'a> SpellBook<'a> {
    /// Partitions spells by `level_spell`, keeping input order within a level.
    /// Spells without a level in 1-9 are dropped.
    pub fn partition(spells: &'a [Spell]) -> Self {
        let mut buckets: [Vec<&'a Spell>; 9] = std::array::from_fn(|_| Vec::new());
        let mut dropped = 0;
        for spell in spells {
            match spell.level_spell {
                Some(level @ 1..=9) => buckets[(level - 1) as usize].push(spell),
                other => {
                    debug!(spell = %spell.name, level = ?other, "Dropping spell outside levels 1-9");
                    dropped += 1;
                }
            }
        }
        Self { buckets, dropped }
    }

    /// Spells of `level` (1-9); empty for any other level.
    pub fn level(&self, level: u8) -> &[&'a Spell] {
        match level {
            1..=9 => &self.buckets[(level - 1) as usize],
            _ => &[],
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Lays out the full sheet.
pub fn layout_sheet(
    character: &Character,
    skills: &[Skill],
    spells: &[Spell],
    template: &SheetTemplate,
    options: &SheetOptions,
) -> SheetLayout {
    let metrics = get_metrics(&options.font);
    let mut overflowed_regions = Vec::new();
    let mut continued: Vec<(String, Vec<PendingLine>)> = Vec::new();

    let mut record = |title: String, overflow: Vec<PendingLine>| {
        if overflow.is_empty() {
            return;
        }
        overflowed_regions.push(title.clone());
        if options.overflow == OverflowPolicy::Continue {
            continued.push((title, overflow));
        }
    };

    // Page 1: stat block and skills
    let mut stats = PageLayout::new(PageKind::Stats);
    place_stat_fields(&mut stats, character, template);
    let lines = skill_lines(skills, &template.skills, template.description_indent, metrics);
    let flowed = flow_region(&template.skills, lines, options.overflow);
    stats.runs.extend(flowed.runs);
    record("Skills".to_string(), flowed.overflow);

    // Page 2: background
    let mut story = PageLayout::new(PageKind::Background);
    let flowed = flow_region(
        &template.background,
        background_lines(character, &template.background, metrics),
        options.overflow,
    );
    story.runs.extend(flowed.runs);
    record("Background".to_string(), flowed.overflow);

    // Page 3: spells by level, one independent region per level
    let mut grimoire = PageLayout::new(PageKind::Spells);
    let book = SpellBook::partition(spells);
    for level in 1..=9u8 {
        let Some(region) = template.spell_region(level) else {
            continue;
        };
        let lines = spell_lines(
            book.level(level),
            &region,
            template.description_indent,
            metrics,
        );
        let flowed = flow_region(&region, lines, options.overflow);
        grimoire.runs.extend(flowed.runs);
        record(format!("Spells level {level}"), flowed.overflow);
    }

    let mut pages = vec![stats, story, grimoire];
    pages.extend(continuation_pages(continued, &template.continuation));

    SheetLayout {
        pages,
        overflowed_regions,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Region flow
// ────────────────────────────────────────────────────────────────────────────

/// A line awaiting placement, relative to its region's left edge.
#[derive(Debug, Clone, PartialEq)]
struct PendingLine {
    indent: f32,
    text: String,
    weight: FontWeight,
}

impl PendingLine {
    fn heading(text: String) -> Self {
        Self {
            indent: 0.0,
            text,
            weight: FontWeight::Bold,
        }
    }

    fn body(indent: f32, text: String) -> Self {
        Self {
            indent,
            text,
            weight: FontWeight::Regular,
        }
    }
}

struct Flowed {
    runs: Vec<TextRun>,
    /// Lines that were not placed in the region.
    overflow: Vec<PendingLine>,
}

/// Places lines top to bottom, one per slot, applying the overflow policy.
fn flow_region(region: &TextRegion, mut lines: Vec<PendingLine>, policy: OverflowPolicy) -> Flowed {
    let slots = region.slots();

    let (overflow, ellipsis) = if lines.len() <= slots {
        (Vec::new(), false)
    } else {
        match policy {
            OverflowPolicy::Truncate => {
                let keep = slots.saturating_sub(1);
                (lines.split_off(keep), slots > 0)
            }
            OverflowPolicy::Continue => (lines.split_off(slots), false),
        }
    };

    let mut runs: Vec<TextRun> = lines
        .into_iter()
        .enumerate()
        .filter(|(_, line)| !line.text.is_empty())
        .map(|(slot, line)| TextRun {
            x: region.x + line.indent,
            y: region.baseline(slot),
            text: line.text,
            size_pt: region.size_pt,
            weight: line.weight,
        })
        .collect();

    if ellipsis {
        runs.push(TextRun {
            x: region.x,
            y: region.baseline(slots - 1),
            text: ELLIPSIS.to_string(),
            size_pt: region.size_pt,
            weight: FontWeight::Regular,
        });
    }

    Flowed { runs, overflow }
}

/// Paginates continued blocks into as many full-page columns as needed.
fn continuation_pages(
    blocks: Vec<(String, Vec<PendingLine>)>,
    region: &TextRegion,
) -> Vec<PageLayout> {
    let lines: Vec<PendingLine> = blocks
        .into_iter()
        .flat_map(|(title, lines)| {
            std::iter::once(PendingLine::heading(format!("{title} (cont.)"))).chain(lines)
        })
        .collect();

    let per_page = region.slots().max(1);
    lines
        .chunks(per_page)
        .map(|chunk| {
            let flowed = flow_region(region, chunk.to_vec(), OverflowPolicy::Continue);
            PageLayout {
                kind: PageKind::Continuation,
                runs: flowed.runs,
            }
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Content builders
// ────────────────────────────────────────────────────────────────────────────

fn place_stat_fields(page: &mut PageLayout, character: &Character, template: &SheetTemplate) {
    let f = &template.fields;
    let c = character;
    let fields: [(&FieldSlot, String); 14] = [
        (&f.name, text_or_placeholder(c.name.as_deref())),
        (&f.class, text_or_placeholder(c.class_name.as_deref())),
        (&f.level, number_or_placeholder(c.level)),
        (&f.race, text_or_placeholder(c.race.as_deref())),
        (&f.hit_points, number_or_placeholder(c.hit_points)),
        (&f.armor_class, number_or_placeholder(c.armor_class)),
        (&f.initiative, number_or_placeholder(c.initiative)),
        (&f.speed, number_or_placeholder(c.speed)),
        (&f.strength, number_or_placeholder(c.strength)),
        (&f.dexterity, number_or_placeholder(c.dexterity)),
        (&f.constitution, number_or_placeholder(c.constitution)),
        (&f.intelligence, number_or_placeholder(c.intelligence)),
        (&f.wisdom, number_or_placeholder(c.wisdom)),
        (&f.charisma, number_or_placeholder(c.charisma)),
    ];

    for (slot, text) in fields {
        page.runs.push(TextRun {
            x: slot.x,
            y: slot.y,
            text,
            size_pt: slot.size_pt,
            weight: FontWeight::Regular,
        });
    }
}

fn skill_lines(
    skills: &[Skill],
    region: &TextRegion,
    indent: f32,
    metrics: &FontMetricTable,
) -> Vec<PendingLine> {
    let mut lines = Vec::new();
    for skill in skills {
        let name = text_or_placeholder(Some(skill.name.as_str()));
        let title = match skill.level {
            Some(level) => format!("{name} (lvl {level})"),
            None => name,
        };
        lines.push(PendingLine::heading(fit_one_line(
            &title,
            metrics,
            FontWeight::Bold,
            region.size_pt,
            region.width,
        )));
        lines.extend(described(&skill.description, region, indent, metrics));
    }
    lines
}

fn spell_lines(
    spells: &[&Spell],
    region: &TextRegion,
    indent: f32,
    metrics: &FontMetricTable,
) -> Vec<PendingLine> {
    let mut lines = Vec::new();
    for spell in spells {
        let name = text_or_placeholder(Some(spell.name.as_str()));
        lines.push(PendingLine::heading(fit_one_line(
            &name,
            metrics,
            FontWeight::Bold,
            region.size_pt,
            region.width,
        )));
        lines.extend(described(&spell.description, region, indent, metrics));
    }
    lines
}

fn background_lines(
    character: &Character,
    region: &TextRegion,
    metrics: &FontMetricTable,
) -> Vec<PendingLine> {
    let text = text_or_placeholder(character.background.as_deref());
    wrap_text(&text, metrics, FontWeight::Regular, region.size_pt, region.width)
        .into_iter()
        .map(|line| PendingLine::body(0.0, line))
        .collect()
}

/// Indented, word-wrapped description lines.
fn described(
    description: &str,
    region: &TextRegion,
    indent: f32,
    metrics: &FontMetricTable,
) -> Vec<PendingLine> {
    let width = (region.width - indent).max(1.0);
    wrap_text(description, metrics, FontWeight::Regular, region.size_pt, width)
        .into_iter()
        .map(|line| PendingLine::body(indent, line))
        .collect()
}

/// Clips `text` to one line of `width`, ending in `...` when shortened.
fn fit_one_line(
    text: &str,
    metrics: &FontMetricTable,
    weight: FontWeight,
    size_pt: f32,
    width: f32,
) -> String {
    if metrics.measure_pt(text, weight, size_pt) <= width {
        return text.to_string();
    }
    let budget = width - metrics.measure_pt(ELLIPSIS, weight, size_pt);
    let mut clipped = String::new();
    let mut used = 0.0_f32;
    for c in text.chars() {
        let w = metrics.char_width(c, weight) * size_pt;
        if used + w > budget {
            break;
        }
        clipped.push(c);
        used += w;
    }
    format!("{}{ELLIPSIS}", clipped.trim_end())
}

fn text_or_placeholder(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => TEXT_PLACEHOLDER.to_string(),
    }
}

fn number_or_placeholder(value: Option<i64>) -> String {
    value
        .map(|n| n.to_string())
        .unwrap_or_else(|| NUMBER_PLACEHOLDER.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
