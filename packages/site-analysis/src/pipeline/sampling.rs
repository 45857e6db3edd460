//! Collection sampling: large groups of similar pages are reduced to a few
//! representatives.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::crawlers::url::{collection_key, ROOT_COLLECTION};
use crate::types::config::SamplingConfig;
use crate::types::page::{ExclusionCategory, ExclusionRecord};

/// Result of sampling a URL list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampledUrls {
    /// URLs to analyse, in input order
    pub selected: Vec<String>,
    /// Members of sampled collections that were left out, in input order
    pub excluded: Vec<ExclusionRecord>,
}

/// Group URLs by their first path segment (`root` for bare domains).
pub fn group_by_collection(urls: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for url in urls {
        groups
            .entry(collection_key(url))
            .or_default()
            .push(url.clone());
    }
    groups
}

/// Reduce every collection larger than the threshold to a random sample.
pub fn sample_collections(
    urls: &[String],
    config: &SamplingConfig,
    rng: &mut impl Rng,
) -> SampledUrls {
    let groups = group_by_collection(urls);

    let mut dropped: BTreeMap<String, (String, usize)> = BTreeMap::new();
    for (key, members) in &groups {
        if members.len() <= config.group_threshold {
            continue;
        }

        let keep = config.sample_size.min(members.len());
        let kept: HashSet<&String> = members.choose_multiple(rng, keep).collect();
        debug!(
            collection = %key,
            size = members.len(),
            kept = keep,
            "Sampling collection"
        );

        for url in members.iter().filter(|u| !kept.contains(u)) {
            dropped.insert(url.clone(), (key.clone(), members.len()));
        }
    }

    let mut sampled = SampledUrls::default();
    for url in urls {
        match dropped.get(url) {
            Some((key, size)) => sampled.excluded.push(ExclusionRecord {
                url: url.clone(),
                category: ExclusionCategory::Redundant,
                reason: exclusion_reason(key, *size),
            }),
            None => sampled.selected.push(url.clone()),
        }
    }
    sampled
}

fn exclusion_reason(key: &str, size: usize) -> String {
    if key == ROOT_COLLECTION {
        format!("Part of a collection of {size} pages at the site root")
    } else {
        format!("Part of a collection of {size} pages with pattern '/{key}/'")
    }
}
