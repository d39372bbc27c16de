use crate::config::{self, LISTING_DROP_KEYS};
use crate::logging::{log, LogLevel};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Swap the style token for the canonical one and absolutize scheme-relative
/// URLs. URLs too short to carry a style segment pass through unchanged.
pub fn rewrite_image_url(url: &str, image_style: &str) -> String {
    let rewritten = match url.split('/').nth(config::STYLE_SEGMENT_INDEX) {
        Some(style) if !style.is_empty() => url.replace(style, image_style),
        _ => url.to_string(),
    };

    if rewritten.starts_with("//") {
        format!("https:{}", rewritten)
    } else {
        rewritten
    }
}

/// Filename used to decide whether two URLs refer to the same asset: trailing
/// path segment, truncated at the first '-' and forced to `.jpg` when a '-'
/// is present.
pub fn dedup_filename(url: &str) -> String {
    let filename = url.rsplit('/').next().unwrap_or(url);
    match filename.split_once('-') {
        Some((stem, _)) => format!("{}.jpg", stem),
        None => filename.to_string(),
    }
}

/// Keep one URL per derived filename, first encountered wins.
pub fn deduplicate_images(images: Vec<String>) -> Vec<String> {
    let mut filenames: HashSet<String> = HashSet::new();
    let mut result = Vec::new();
    for image in images {
        let filename = dedup_filename(&image);
        if !filenames.insert(filename.clone()) {
            log(LogLevel::Debug, &format!("Duplicate image {}", filename));
            continue;
        }
        result.push(image);
    }
    result
}

fn push_src(target: &mut Vec<String>, value: Option<&Value>) {
    if let Some(src) = value
        .and_then(|v| v.get("src"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        target.push(src.to_string());
    }
}

/// Candidate URLs in source order: alternate gallery, primary, alternate.
fn collect_image_candidates(product: &Map<String, Value>) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Some(Value::Array(gallery)) = product.get("alternateGalleryImages") {
        for entry in gallery {
            push_src(&mut candidates, Some(entry));
        }
    }
    push_src(&mut candidates, product.get("primaryImage"));
    push_src(&mut candidates, product.get("alternateImage"));
    candidates
}

/// Normalize one raw listing record in place: rewrite and deduplicate its
/// image URLs into `images`, then strip the presentation-only fields.
pub fn normalize_listing(product: &mut Map<String, Value>, image_style: &str) {
    let rewritten: Vec<String> = collect_image_candidates(product)
        .iter()
        .map(|url| rewrite_image_url(url, image_style))
        .collect();
    let images = deduplicate_images(rewritten);

    product.insert(
        "images".to_string(),
        Value::Array(images.into_iter().map(Value::String).collect()),
    );
    for key in LISTING_DROP_KEYS.iter() {
        product.remove(*key);
    }
}
