//! Source resolution for grounded search results.
//!
//! Grounding chunks carry long redirect URLs. Each distinct URL gets a short
//! handle that is cheap to pass through prompts and is swapped back for the
//! real URL when the final answer is written.
//!
//! Handles have the shape `{HANDLE_BASE}/{run}/{sequence}-{index}/`. Every
//! component is closed by a `/`, so no handle is a substring of another and
//! a literal replace of one handle never touches a different one.

use crate::llm::client::{GroundingChunk, GroundingMetadata};
use crate::types::{SourceCitation, TextSpan};
use std::collections::HashMap;

pub const HANDLE_BASE: &str = "https://grounding.prosearch.invalid/id";

/// A span of result text with the sources backing it
#[derive(Debug, Clone, PartialEq)]
pub struct Citation {
    pub start_index: usize,
    pub end_index: usize,
    pub segments: Vec<CitationSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CitationSegment {
    pub label: String,
    pub short_handle: String,
    pub value: String,
}

pub fn short_handle(run_id: &str, sequence_id: usize, index: usize) -> String {
    format!("{}/{}/{}-{}/", HANDLE_BASE, run_id, sequence_id, index)
}

/// Map each distinct chunk URL to a short handle, numbered in first-seen order.
pub fn resolve_urls(
    chunks: &[GroundingChunk],
    run_id: &str,
    sequence_id: usize,
) -> HashMap<String, String> {
    let mut resolved: HashMap<String, String> = HashMap::new();
    for chunk in chunks {
        if chunk.uri.is_empty() || resolved.contains_key(&chunk.uri) {
            continue;
        }
        let index = resolved.len();
        resolved.insert(chunk.uri.clone(), short_handle(run_id, sequence_id, index));
    }
    resolved
}

/// Build citations from grounding supports.
///
/// Supports whose chunks cannot be resolved are skipped.
pub fn get_citations(
    metadata: &GroundingMetadata,
    resolved: &HashMap<String, String>,
) -> Vec<Citation> {
    metadata
        .supports
        .iter()
        .filter(|support| support.end_index >= support.start_index)
        .filter_map(|support| {
            let segments: Vec<CitationSegment> = support
                .chunk_indices
                .iter()
                .filter_map(|&idx| {
                    let chunk = metadata.chunks.get(idx)?;
                    let handle = resolved.get(&chunk.uri)?;
                    Some(CitationSegment {
                        label: chunk_label(chunk),
                        short_handle: handle.clone(),
                        value: chunk.uri.clone(),
                    })
                })
                .collect();

            if segments.is_empty() {
                None
            } else {
                Some(Citation {
                    start_index: support.start_index,
                    end_index: support.end_index,
                    segments,
                })
            }
        })
        .collect()
}

/// Site-style label from a chunk title: `"nature.com"` becomes `"nature"`.
fn chunk_label(chunk: &GroundingChunk) -> String {
    let title = chunk.title.trim();
    let label = title.split('.').next().unwrap_or_default().trim();
    if label.is_empty() {
        "source".to_string()
    } else {
        label.to_string()
    }
}

/// Splice ` [label](handle)` markers after each cited span.
///
/// Citations are applied from the end of the text backwards so earlier
/// offsets stay valid while inserting.
pub fn insert_citation_markers(text: &str, citations: &[Citation]) -> String {
    let mut ordered: Vec<&Citation> = citations.iter().collect();
    ordered.sort_by(|a, b| {
        b.end_index
            .cmp(&a.end_index)
            .then(b.start_index.cmp(&a.start_index))
    });

    let mut modified = text.to_string();
    for citation in ordered {
        let marker: String = citation
            .segments
            .iter()
            .map(|segment| format!(" [{}]({})", segment.label, segment.short_handle))
            .collect();
        let at = floor_char_boundary(&modified, citation.end_index);
        modified.insert_str(at, &marker);
    }
    modified
}

/// One [`SourceCitation`] per distinct handle, with every span attributed to it.
pub fn collect_sources(citations: &[Citation]) -> Vec<SourceCitation> {
    let mut sources: Vec<SourceCitation> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for citation in citations {
        let span = TextSpan {
            start: citation.start_index,
            end: citation.end_index,
        };
        for segment in &citation.segments {
            match positions.get(&segment.short_handle) {
                Some(&pos) => {
                    if !sources[pos].segments.contains(&span) {
                        sources[pos].segments.push(span);
                    }
                }
                None => {
                    positions.insert(segment.short_handle.clone(), sources.len());
                    sources.push(SourceCitation {
                        short_handle: segment.short_handle.clone(),
                        original_value: segment.value.clone(),
                        label: segment.label.clone(),
                        segments: vec![span],
                    });
                }
            }
        }
    }

    sources
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut at = index.min(text.len());
    while !text.is_char_boundary(at) {
        at -= 1;
    }
    at
}
