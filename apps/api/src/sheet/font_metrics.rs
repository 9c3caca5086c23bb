//! Static font-metric tables for the PDF standard fonts used on the sheet.
//!
//! Widths are in em units (relative to font size) and come from the AFM
//! files of the base-14 fonts, so no font program has to be embedded.
//! Bold faces are measured with the regular table times `bold_scale`.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32. Accented Latin-1 letters take the width of
//! their base letter.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

/// Body font families available for the sheet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

/// Regular or bold face of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontWeight {
    Regular,
    Bold,
}

impl FontFamily {
    /// PDF base-font name for the given weight.
    pub fn base_font(&self, weight: FontWeight) -> &'static str {
        match (self, weight) {
            (FontFamily::Helvetica, FontWeight::Regular) => "Helvetica",
            (FontFamily::Helvetica, FontWeight::Bold) => "Helvetica-Bold",
            (FontFamily::Times, FontWeight::Regular) => "Times-Roman",
            (FontFamily::Times, FontWeight::Bold) => "Times-Bold",
            (FontFamily::Courier, FontWeight::Regular) => "Courier",
            (FontFamily::Courier, FontWeight::Bold) => "Courier-Bold",
        }
    }
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Ok(FontFamily::Helvetica),
            "times" | "times-roman" => Ok(FontFamily::Times),
            "courier" => Ok(FontFamily::Courier),
            other => Err(format!("unknown font family '{other}'")),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font family.
///
/// Width array slot layout:
/// ```text
/// [0]=sp  [1]=!   [2]="   [3]=#   [4]=$   [5]=%   [6]=&   [7]='
/// [8]=(   [9]=)   [10]=*  [11]=+  [12]=,  [13]=-  [14]=.  [15]=/
/// [16..25]=0-9
/// [26]=:  [27]=;  [28]=<  [29]==  [30]=>  [31]=?  [32]=@
/// [33..58]=A-Z
/// [59]=[  [60]=\  [61]=]  [62]=^  [63]=_  [64]=`
/// [65..90]=a-z
/// [91]={  [92]=|  [93]=}  [94]=~
/// ```
pub struct FontMetricTable {
    pub font: FontFamily,
    widths: [f32; 95],
    /// Fallback width for characters outside printable ASCII.
    pub average_char_width: f32,
    pub space_width: f32,
    /// Multiplier applied to regular widths when measuring the bold face.
    pub bold_scale: f32,
}

impl FontMetricTable {
    /// Width of a single character in em units.
    pub fn char_width(&self, c: char, weight: FontWeight) -> f32 {
        let code = latin1_base(c) as usize;
        let base = if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        };
        match weight {
            FontWeight::Regular => base,
            FontWeight::Bold => base * self.bold_scale,
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str, weight: FontWeight) -> f32 {
        s.chars().map(|c| self.char_width(c, weight)).sum()
    }

    /// Width of one inter-word space in points at `size_pt`.
    pub fn space_pt(&self, weight: FontWeight, size_pt: f32) -> f32 {
        match weight {
            FontWeight::Regular => self.space_width * size_pt,
            FontWeight::Bold => self.space_width * self.bold_scale * size_pt,
        }
    }

    /// Measures the rendered width of a string in points at `size_pt`.
    pub fn measure_pt(&self, s: &str, weight: FontWeight, size_pt: f32) -> f32 {
        self.measure_str(s, weight) * size_pt
    }
}

/// ASCII letter whose glyph width matches `c`, for accented Latin-1 letters
/// and a few punctuation marks. Other characters are returned unchanged.
fn latin1_base(c: char) -> char {
    match c {
        '\u{A0}' => ' ',
        '¡' => '!',
        '¿' => '?',
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

/// Helvetica, the sheet default.
static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Helvetica,
    #[rustfmt::skip]
    widths: [
        // sp    !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.53,
    space_width: 0.278,
    bold_scale: 1.07,
};

/// Times-Roman: narrower serif, fits more description text per column.
static TIMES_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Times,
    #[rustfmt::skip]
    widths: [
        // sp    !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.250, 0.333, 0.408, 0.500, 0.500, 0.833, 0.778, 0.180, 0.333, 0.333, 0.500, 0.564, 0.250, 0.333, 0.250, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500, 0.500,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.564, 0.564, 0.564, 0.444, 0.921,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.667, 0.667, 0.722, 0.611, 0.556, 0.722, 0.722, 0.333, 0.389, 0.722, 0.611, 0.889,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.722, 0.556, 0.722, 0.667, 0.556, 0.611, 0.722, 0.722, 0.944, 0.722, 0.722, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.469, 0.500, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.444, 0.500, 0.444, 0.500, 0.444, 0.333, 0.500, 0.500, 0.278, 0.278, 0.500, 0.278, 0.778,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.500, 0.500, 0.500, 0.500, 0.333, 0.389, 0.278, 0.500, 0.500, 0.722, 0.500, 0.500, 0.444,
        // {      |      }      ~
        0.480, 0.200, 0.480, 0.541,
    ],
    average_char_width: 0.47,
    space_width: 0.250,
    bold_scale: 1.05,
};

/// Courier: monospaced, every glyph is 0.6em in both weights.
static COURIER_TABLE: FontMetricTable = FontMetricTable {
    font: FontFamily::Courier,
    widths: [0.600; 95],
    average_char_width: 0.600,
    space_width: 0.600,
    bold_scale: 1.0,
};

/// Returns the static metric table for a given font family.
pub fn get_metrics(font: &FontFamily) -> &'static FontMetricTable {
    match font {
        FontFamily::Helvetica => &HELVETICA_TABLE,
        FontFamily::Times => &TIMES_TABLE,
        FontFamily::Courier => &COURIER_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
