//! Fixed geometry of the three-page character sheet.
//!
//! Coordinates are in PDF points with a top-left origin (y grows downward);
//! the PDF writer flips them. Positions are hand-tuned to the background
//! artwork of the A4 templates.

use serde::{Deserialize, Serialize};

pub const A4_WIDTH_PT: f32 = 595.28;
pub const A4_HEIGHT_PT: f32 = 841.89;

/// Anchor of a single scalar value on page 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSlot {
    pub x: f32,
    pub y: f32,
    pub size_pt: f32,
}

const fn slot(x: f32, y: f32, size_pt: f32) -> FieldSlot {
    FieldSlot { x, y, size_pt }
}

/// Page-1 anchors for every scalar character field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatFieldSlots {
    pub name: FieldSlot,
    pub class: FieldSlot,
    pub level: FieldSlot,
    pub race: FieldSlot,
    pub hit_points: FieldSlot,
    pub armor_class: FieldSlot,
    pub initiative: FieldSlot,
    pub speed: FieldSlot,
    pub strength: FieldSlot,
    pub dexterity: FieldSlot,
    pub constitution: FieldSlot,
    pub intelligence: FieldSlot,
    pub wisdom: FieldSlot,
    pub charisma: FieldSlot,
}

/// A rectangular column that text is flowed into, one line per slot.
///
/// `top` is the baseline of the first line; a line fits while its baseline
/// is at or above `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextRegion {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    pub width: f32,
    pub line_height: f32,
    pub size_pt: f32,
}

impl TextRegion {
    /// Number of line slots the region can hold.
    pub fn slots(&self) -> usize {
        if self.bottom < self.top || self.line_height <= 0.0 {
            return 0;
        }
        ((self.bottom - self.top) / self.line_height).floor() as usize + 1
    }

    /// Baseline of the given slot.
    pub fn baseline(&self, slot: usize) -> f32 {
        self.top + slot as f32 * self.line_height
    }
}

/// Fixed anchor of one spell-level section on page 3.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionPosition {
    pub x: f32,
    pub y: f32,
}

/// Complete sheet geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetTemplate {
    pub page_width: f32,
    pub page_height: f32,
    pub fields: StatFieldSlots,
    pub skills: TextRegion,
    pub background: TextRegion,
    /// Index 0 holds level 1, index 8 holds level 9.
    pub spell_sections: [SectionPosition; 9],
    pub spell_section_width: f32,
    pub spell_section_height: f32,
    pub spell_line_height: f32,
    pub spell_size_pt: f32,
    /// Left indent applied to descriptions under a skill or spell name.
    pub description_indent: f32,
    /// Full-page column used for continuation pages.
    pub continuation: TextRegion,
}

impl SheetTemplate {
    /// The text region of the section holding spells of `level` (1-9).
    pub fn spell_region(&self, level: u8) -> Option<TextRegion> {
        if !(1..=9).contains(&level) {
            return None;
        }
        let anchor = self.spell_sections[(level - 1) as usize];
        Some(TextRegion {
            x: anchor.x,
            top: anchor.y,
            bottom: anchor.y + self.spell_section_height,
            width: self.spell_section_width,
            line_height: self.spell_line_height,
            size_pt: self.spell_size_pt,
        })
    }
}

impl Default for SheetTemplate {
    fn default() -> Self {
        let column_x = [40.0, 222.0, 404.0];
        let row_y = [100.0, 345.0, 590.0];
        let mut spell_sections = [SectionPosition { x: 0.0, y: 0.0 }; 9];
        for (i, section) in spell_sections.iter_mut().enumerate() {
            *section = SectionPosition {
                x: column_x[i % 3],
                y: row_y[i / 3],
            };
        }

        Self {
            page_width: A4_WIDTH_PT,
            page_height: A4_HEIGHT_PT,
            fields: StatFieldSlots {
                name: slot(60.0, 72.0, 16.0),
                class: slot(60.0, 118.0, 11.0),
                level: slot(250.0, 118.0, 11.0),
                race: slot(360.0, 118.0, 11.0),
                hit_points: slot(300.0, 190.0, 14.0),
                armor_class: slot(380.0, 190.0, 14.0),
                initiative: slot(460.0, 190.0, 14.0),
                speed: slot(530.0, 190.0, 14.0),
                strength: slot(62.0, 200.0, 14.0),
                dexterity: slot(62.0, 262.0, 14.0),
                constitution: slot(62.0, 324.0, 14.0),
                intelligence: slot(62.0, 386.0, 14.0),
                wisdom: slot(62.0, 448.0, 14.0),
                charisma: slot(62.0, 510.0, 14.0),
            },
            skills: TextRegion {
                x: 140.0,
                top: 250.0,
                bottom: 800.0,
                width: 415.0,
                line_height: 12.0,
                size_pt: 9.0,
            },
            background: TextRegion {
                x: 50.0,
                top: 110.0,
                bottom: 790.0,
                width: 495.0,
                line_height: 14.0,
                size_pt: 10.0,
            },
            spell_sections,
            spell_section_width: 160.0,
            spell_section_height: 220.0,
            spell_line_height: 11.0,
            spell_size_pt: 8.0,
            description_indent: 8.0,
            continuation: TextRegion {
                x: 50.0,
                top: 70.0,
                bottom: 790.0,
                width: 495.0,
                line_height: 13.0,
                size_pt: 9.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_counts_first_and_last_line() {
        let region = TextRegion {
            x: 0.0,
            top: 100.0,
            bottom: 136.0,
            width: 100.0,
            line_height: 12.0,
            size_pt: 9.0,
        };
        // baselines 100, 112, 124, 136
        assert_eq!(region.slots(), 4);
        assert_eq!(region.baseline(3), 136.0);
    }

    #[test]
    fn test_inverted_region_has_no_slots() {
        let region = TextRegion {
            x: 0.0,
            top: 200.0,
            bottom: 100.0,
            width: 100.0,
            line_height: 12.0,
            size_pt: 9.0,
        };
        assert_eq!(region.slots(), 0);
    }

    #[test]
    fn test_spell_regions_are_disjoint_grid() {
        let template = SheetTemplate::default();
        let first = template.spell_region(1).unwrap();
        let fifth = template.spell_region(5).unwrap();
        let ninth = template.spell_region(9).unwrap();
        assert_eq!((first.x, first.top), (40.0, 100.0));
        assert_eq!((fifth.x, fifth.top), (222.0, 345.0));
        assert_eq!((ninth.x, ninth.top), (404.0, 590.0));
        assert!(first.bottom < template.spell_region(4).unwrap().top);
    }

    #[test]
    fn test_spell_region_rejects_out_of_range_levels() {
        let template = SheetTemplate::default();
        assert!(template.spell_region(0).is_none());
        assert!(template.spell_region(10).is_none());
    }

    #[test]
    fn test_default_regions_fit_on_page() {
        let t = SheetTemplate::default();
        for region in [t.skills, t.background, t.continuation] {
            assert!(region.x + region.width <= t.page_width);
            assert!(region.bottom <= t.page_height);
        }
        for level in 1..=9 {
            let region = t.spell_region(level).unwrap();
            assert!(region.x + region.width <= t.page_width);
            assert!(region.bottom <= t.page_height);
        }
    }
}
