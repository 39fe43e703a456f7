//! Confidence and quality scores.
//!
//! Both are additive point buckets capped at 100. Confidence drives strategy
//! acceptance; quality is informational and lands in the final record's metadata.

use crate::extractor::model::{ExtractedContent, ParsedContent};

const MAX_SCORE: u32 = 100;

fn text_len(value: &str) -> usize {
    value.trim().chars().count()
}

/// Scores a draft and stores the result in `draft.confidence`.
pub fn compute_confidence(draft: &mut ParsedContent) -> u8 {
    let has_title = !draft.title.is_empty();
    let has_body = !draft.content.is_empty();
    let title_len = text_len(&draft.title);
    let body_len = text_len(&draft.content);

    let mut score = match (has_title, has_body) {
        (true, true) => 50,
        (true, false) | (false, true) => 25,
        (false, false) => 0,
    };

    score += if title_len > 10 && body_len > 500 {
        30
    } else if title_len > 0 && body_len > 100 {
        20
    } else if title_len > 0 || body_len > 0 {
        10
    } else {
        0
    };

    let metadata = [
        !draft.author.is_empty(),
        draft.publish_date.is_some(),
        !draft.description.is_empty(),
        !draft.language.is_empty(),
    ];
    score += 5 * metadata.iter().filter(|present| **present).count() as u32;

    draft.confidence = score.min(MAX_SCORE) as u8;
    draft.confidence
}

/// Completeness score of a final record.
pub fn quality_score(content: &ExtractedContent) -> u8 {
    let title_len = text_len(&content.title);
    let body_len = text_len(&content.content);

    let mut score: u32 = if title_len > 10 {
        30
    } else if title_len > 0 {
        15
    } else {
        0
    };

    score += match body_len {
        n if n > 1000 => 40,
        n if n > 500 => 30,
        n if n > 100 => 20,
        n if n > 0 => 10,
        _ => 0,
    };

    if !content.author.is_empty() {
        score += 10;
    }
    if content.publish_date.is_some() {
        score += 10;
    }
    if !content.description.is_empty() {
        score += 5;
    }
    if !content.tags.is_empty() {
        score += 5;
    }

    score.min(MAX_SCORE) as u8
}
