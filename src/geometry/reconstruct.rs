use crate::chunker::{Chunk, TOKEN_LEN_KEY};
use crate::document::{BoundingBox, Document, DocumentNode};
use crate::tokenizer::{join_text, RichToken};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

/// Build a `Chunk` from a token slice
///
/// `index` becomes the chunk id (`c_<index>`). With `with_geom` unset the
/// chunk carries no geometry. Pure: equal inputs give equal chunks.
pub fn get_chunk(tokens: &[RichToken], index: usize, doc: &Document, with_geom: bool) -> Chunk {
    let geometry = if with_geom {
        reconstruct_geometry(tokens, doc)
    } else {
        Vec::new()
    };

    let mut metadata = Map::new();
    metadata.insert(TOKEN_LEN_KEY.to_string(), Value::from(tokens.len() as u64));

    Chunk {
        id: format!("c_{}", index),
        content: join_text(tokens).trim().to_string(),
        metadata,
        geometry,
    }
}

/// Bounding boxes of the page regions covered by a token slice
///
/// Nodes contribute in the order they first appear in the slice. A node
/// only partly covered by the slice has its boxes cropped vertically along
/// their line spans.
pub fn reconstruct_geometry(tokens: &[RichToken], doc: &Document) -> Vec<BoundingBox> {
    let mut boxes = Vec::new();

    for (element_id, (min_idx, max_idx)) in token_ranges(tokens) {
        match doc.get(element_id) {
            Some(node) => boxes.extend(node_boxes(node, min_idx, max_idx)),
            None => debug!(element_id, "token refers to unknown node, no geometry"),
        }
    }

    boxes
}

/// Lowest and highest token index per origin node, in first-seen order
fn token_ranges(tokens: &[RichToken]) -> IndexMap<&str, (usize, usize)> {
    let mut ranges: IndexMap<&str, (usize, usize)> = IndexMap::new();

    for token in tokens {
        ranges
            .entry(token.element_id.as_str())
            .and_modify(|(min, max)| {
                *min = (*min).min(token.token_index);
                *max = (*max).max(token.token_index);
            })
            .or_insert((token.token_index, token.token_index));
    }

    ranges
}

fn node_boxes(node: &DocumentNode, min_idx: usize, max_idx: usize) -> Vec<BoundingBox> {
    if node.geom_count() == 0 {
        return Vec::new();
    }

    let Some(tokens_per_geom) = node.tokens_per_geom().filter(|n| *n > 0.0) else {
        debug!(id = %node.id, "no token count recorded, keeping whole boxes");
        return node.geometry.iter().map(BoundingBox::outline).collect();
    };

    let (min_idx, max_idx) = (min_idx as f64, max_idx as f64);

    node.geometry
        .iter()
        .enumerate()
        .filter_map(|(i, bbox)| {
            // Box i owns tokens [start, end) under uniform density
            let box_start = i as f64 * tokens_per_geom;
            let box_end = box_start + tokens_per_geom;

            if max_idx < box_start || min_idx >= box_end {
                return None;
            }

            let contained = min_idx <= box_start && max_idx + 1.0 >= box_end;
            if contained || bbox.spans.len() < 2 {
                return Some(bbox.outline());
            }

            Some(crop_box(bbox, box_start, box_end, tokens_per_geom, min_idx, max_idx))
        })
        .collect()
}

/// Vertically crop a partly covered box to the lines holding the tokens
///
/// Each cropped edge is pushed one line outward so the crop never cuts into
/// covered text. Horizontal edges are kept.
fn crop_box(
    bbox: &BoundingBox,
    box_start: f64,
    box_end: f64,
    tokens_per_geom: f64,
    min_idx: f64,
    max_idx: f64,
) -> BoundingBox {
    let line_count = bbox.spans.len();
    let tokens_per_line = tokens_per_geom / line_count as f64;
    let mut cropped = bbox.outline();

    if min_idx > box_start {
        let frac_lines = (min_idx - box_start) / tokens_per_line;
        let top_line = (frac_lines.floor() as usize)
            .saturating_sub(1)
            .min(line_count - 1);
        cropped.top = bbox.spans[top_line].top.max(bbox.top);
    }

    if max_idx + 1.0 < box_end {
        let frac_lines = (box_end - max_idx) / tokens_per_line;
        let bottom_line = (line_count + 1)
            .saturating_sub(frac_lines.ceil() as usize)
            .min(line_count - 1);
        cropped.bottom = bbox.spans[bottom_line].bottom.min(bbox.bottom);
    }

    if cropped.top > cropped.bottom || !cropped.top.is_finite() || !cropped.bottom.is_finite() {
        debug!(page = bbox.page, "inconsistent line spans, keeping whole box");
        return bbox.outline();
    }

    cropped
}
