//! Advance-width tables for the built-in candidate fonts.
//!
//! The core Helvetica, Times, and Courier families ship as static AFM
//! advance tables (thousandths of an em, ASCII 32..=126) so fingerprinting
//! works without any font file on disk. Oblique cuts share their upright
//! table, as in the source metrics.

/// Metrics for one built-in candidate font.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinMetrics {
    pub name: &'static str,
    pub is_bold: bool,
    pub is_italic: bool,
    /// Advance widths for ASCII 32..=126, in 1/1000 em.
    pub widths: &'static [u16; 95],
}

/// Advance for `ch` in ems, when the table covers it.
pub fn table_advance(widths: &[u16; 95], ch: char) -> Option<f64> {
    let code = ch as u32;
    if !(32..=126).contains(&code) {
        return None;
    }
    Some(widths[(code - 32) as usize] as f64 / 1000.0)
}

#[rustfmt::skip]
static HELVETICA: [u16; 95] = [
    // space ! " # $ % & ' ( )
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333,
    // * + , - . /
    389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500,
    667, 556, 833, 722, 778, 667, 778, 722, 667, 611,
    722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222,
    500, 222, 833, 556, 556, 556, 556, 333, 500, 278,
    556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333,
    389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556,
    722, 611, 833, 722, 778, 667, 778, 722, 667, 611,
    722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278,
    556, 278, 889, 611, 611, 611, 611, 389, 556, 333,
    611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
static TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333,
    500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389,
    722, 611, 889, 722, 722, 556, 722, 667, 556, 611,
    722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278,
    500, 278, 778, 500, 500, 500, 500, 333, 389, 278,
    500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333,
    500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500,
    778, 667, 944, 722, 778, 611, 778, 722, 556, 667,
    722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333,
    556, 278, 833, 556, 500, 556, 556, 444, 389, 333,
    556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

#[rustfmt::skip]
static TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333,
    500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 675, 675, 675, 500, 920,
    611, 611, 667, 722, 611, 611, 722, 722, 333, 444,
    667, 556, 833, 667, 722, 611, 722, 611, 500, 556,
    722, 611, 833, 611, 556, 556,
    389, 278, 389, 422, 500, 333,
    500, 500, 444, 500, 444, 278, 500, 500, 278, 278,
    444, 278, 722, 500, 500, 500, 500, 389, 389, 278,
    500, 444, 667, 444, 444, 389,
    400, 275, 400, 541,
];

#[rustfmt::skip]
static TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333,
    500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 832,
    667, 667, 667, 722, 667, 667, 722, 778, 389, 500,
    667, 611, 889, 722, 722, 611, 722, 667, 556, 611,
    722, 667, 889, 667, 611, 611,
    333, 278, 333, 570, 500, 333,
    500, 500, 444, 500, 444, 333, 500, 556, 278, 278,
    500, 278, 778, 556, 500, 500, 500, 389, 389, 278,
    556, 444, 667, 500, 444, 389,
    348, 220, 348, 570,
];

#[rustfmt::skip]
static COURIER: [u16; 95] = [600; 95];

/// The fixed built-in candidate pool.
pub static BUILTIN_FONTS: [BuiltinMetrics; 12] = [
    BuiltinMetrics { name: "Helvetica", is_bold: false, is_italic: false, widths: &HELVETICA },
    BuiltinMetrics { name: "Helvetica Bold", is_bold: true, is_italic: false, widths: &HELVETICA_BOLD },
    BuiltinMetrics { name: "Helvetica Italic", is_bold: false, is_italic: true, widths: &HELVETICA },
    BuiltinMetrics { name: "Helvetica Bold-Italic", is_bold: true, is_italic: true, widths: &HELVETICA_BOLD },
    BuiltinMetrics { name: "Times Roman", is_bold: false, is_italic: false, widths: &TIMES_ROMAN },
    BuiltinMetrics { name: "Times Bold", is_bold: true, is_italic: false, widths: &TIMES_BOLD },
    BuiltinMetrics { name: "Times Italic", is_bold: false, is_italic: true, widths: &TIMES_ITALIC },
    BuiltinMetrics { name: "Times Bold-Italic", is_bold: true, is_italic: true, widths: &TIMES_BOLD_ITALIC },
    BuiltinMetrics { name: "Courier", is_bold: false, is_italic: false, widths: &COURIER },
    BuiltinMetrics { name: "Courier Bold", is_bold: true, is_italic: false, widths: &COURIER },
    BuiltinMetrics { name: "Courier Italic", is_bold: false, is_italic: true, widths: &COURIER },
    BuiltinMetrics { name: "Courier Bold-Italic", is_bold: true, is_italic: true, widths: &COURIER },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_range_is_covered() {
        assert_eq!(table_advance(&HELVETICA, ' '), Some(0.278));
        assert_eq!(table_advance(&HELVETICA, '~'), Some(0.584));
        assert_eq!(table_advance(&HELVETICA, 'é'), None);
    }

    #[test]
    fn courier_is_monospaced() {
        for ch in ' '..='~' {
            assert_eq!(table_advance(&COURIER, ch), Some(0.6));
        }
    }

    #[test]
    fn helvetica_and_times_disagree_on_narrow_letters() {
        // 'i' is the classic discriminator: 222/1000 vs 278/1000.
        assert!(table_advance(&HELVETICA, 'i') < table_advance(&TIMES_ROMAN, 'i'));
        // 'a' goes the other way.
        assert!(table_advance(&HELVETICA, 'a') > table_advance(&TIMES_ROMAN, 'a'));
    }
}
