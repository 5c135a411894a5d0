use crate::types::{Candidate, PipelineError, Result};
use chrono::Utc;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;

/// Parse an RSS/Atom document into candidates, preserving the feed's order.
/// Duplicate guids within one payload are collapsed to a single candidate so
/// one poll counts as one sighting.
pub fn parse_feed(content: &str) -> Result<Vec<Candidate>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| PipelineError::Parse(format!("unparseable feed payload: {}", e)))?;

    let feed_title = feed.title.map(|t| t.content).unwrap_or_default();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for entry in feed.entries {
        let Some(candidate) = parse_entry(entry, &feed_title) else {
            continue;
        };
        if seen.insert(candidate.guid.clone()) {
            candidates.push(candidate);
        } else {
            debug!("Skipping duplicate entry within payload: {}", candidate.guid);
        }
    }

    debug!("Parsed {} candidates", candidates.len());
    Ok(candidates)
}

fn parse_entry(entry: feed_rs::model::Entry, feed_title: &str) -> Option<Candidate> {
    // An entry without a link cannot be announced, and the link doubles as
    // the fallback identifier for feeds that carry no guid.
    let link = entry.links.first()?.href.clone();

    let guid = if entry.id.is_empty() {
        link.clone()
    } else {
        entry.id.clone()
    };

    let title = entry
        .title
        .map(|t| t.content)
        .unwrap_or_else(|| "Untitled".to_string());

    let source = entry
        .authors
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| feed_title.to_string());

    let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));

    Some(Candidate {
        guid,
        title,
        link,
        source,
        published_at,
    })
}
