//! 标记文字匹配与多帧投票

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::markers::reading::{Detection, MarkerType};
use crate::core::video::Recognition;

static VFX_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)VFX\s*(.+)").unwrap());
static ADR_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ADR\s*(.+)").unwrap());

fn pattern(marker: MarkerType) -> &'static Regex {
    match marker {
        MarkerType::Vfx => &VFX_LINE,
        MarkerType::Adr => &ADR_LINE,
    }
}

/// Finds the marker cue in one OCR line and normalizes its prefix to upper case.
///
/// `"noise vfx 012 sky"` -> `Some("VFX 012 sky")`
pub fn match_marker_line(line: &str, marker: MarkerType) -> Option<String> {
    let found = pattern(marker).find(line)?;
    let text = found.as_str().trim_end();
    let prefix_len = marker.prefix().len();
    // 前缀为 ASCII，直接按字节切分
    Some(format!(
        "{}{}",
        text[..prefix_len].to_ascii_uppercase(),
        &text[prefix_len..]
    ))
}

/// Splits one OCR result into per-marker detections.
///
/// Every marker gets an entry: OCR ran over the whole text region, so a
/// marker that no line matches is an explicit negative.
pub fn detect_markers(recognition: &Recognition) -> BTreeMap<MarkerType, Detection> {
    MarkerType::ALL
        .iter()
        .map(|&marker| {
            let lines: Vec<String> = recognition
                .lines()
                .filter_map(|line| match_marker_line(line, marker))
                .collect();
            let detection = if lines.is_empty() {
                Detection::absent(recognition.confidence)
            } else {
                Detection::found(recognition.confidence, lines.join("\n"))
            };
            (marker, detection)
        })
        .collect()
}

/// Builds the most likely text from several noisy readings of the same cue.
///
/// Texts are right-padded to equal length, then each column keeps its most
/// frequent character (ties go to the character seen first).
pub fn consensus(texts: &[String]) -> Option<String> {
    let columns: Vec<Vec<char>> = texts.iter().map(|t| t.chars().collect()).collect();
    let width = columns.iter().map(Vec::len).max()?;

    let mut result = String::with_capacity(width);
    for col in 0..width {
        let mut counts: Vec<(char, usize)> = Vec::new();
        for chars in &columns {
            let c = chars.get(col).copied().unwrap_or(' ');
            match counts.iter_mut().find(|(seen, _)| *seen == c) {
                Some((_, n)) => *n += 1,
                None => counts.push((c, 1)),
            }
        }
        let best = counts
            .iter()
            .fold(None::<(char, usize)>, |best, &(c, n)| match best {
                Some((_, bn)) if bn >= n => best,
                _ => Some((c, n)),
            });
        if let Some((c, _)) = best {
            result.push(c);
        }
    }

    let trimmed = result.trim_end();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
