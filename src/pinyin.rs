//! Hanzi → Hanyu Pinyin (tone diacritics, space-separated), copy non-Chinese as-is.
//!
//! Used to fill in the pronunciation of dictionary entries that ship without one.
//!
//! Example:
//!   输入: "山水"
//!   输出: "shān shuǐ"
use pinyin::ToPinyin;

/// Convert Chinese text into Hanyu Pinyin with tone diacritics, space-separated.
/// Non-Chinese characters are copied as-is.
///
/// Per-character conversion (no word segmentation), so polyphonic characters
/// get their default reading.
pub fn to_pinyin_diacritics(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut last_was_hanzi = false;

    for ch in text.chars() {
        if let Some(py) = ch.to_pinyin() {
            if last_was_hanzi {
                out.push(' ');
            }
            out.push_str(py.with_tone());
            last_was_hanzi = true;
        } else {
            out.push(ch);
            last_was_hanzi = false;
        }
    }

    out
}
