//! Merge per-index hits into one score per developer.

use std::collections::HashMap;

use super::store::Hit;
use super::{Candidate, SubIndex};
use crate::config::SearchWeights;
use crate::developers::Experience;

/// Raw hits from each sub-index for one query.
#[derive(Debug, Clone, Default)]
pub struct SubIndexResults {
    pub profiles: Vec<Hit>,
    pub skills: Vec<Hit>,
    pub experience: Vec<Hit>,
}

impl SubIndexResults {
    fn by_index(&self) -> [(SubIndex, &[Hit]); 3] {
        [
            (SubIndex::Profiles, self.profiles.as_slice()),
            (SubIndex::Skills, self.skills.as_slice()),
            (SubIndex::Experience, self.experience.as_slice()),
        ]
    }
}

impl SearchWeights {
    pub fn for_index(&self, index: SubIndex) -> f32 {
        match index {
            SubIndex::Profiles => self.profile,
            SubIndex::Skills => self.skills,
            SubIndex::Experience => self.experience,
        }
    }
}

/// Every hit adds `(1 - distance) * weight` to its developer's total. A
/// developer missing from an index just never receives that term.
///
/// Metadata comes from the first hit seen for a developer, profiles first.
/// Each experience hit is also attached to its developer, duplicates
/// included. The result is sorted by total score, highest first, with ties
/// in order of first sighting.
pub fn fuse(results: &SubIndexResults, weights: &SearchWeights) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (index, hits) in results.by_index() {
        let weight = weights.for_index(index);

        for hit in hits {
            let (Some(developer_id), Some(similarity)) = (hit.developer_id(), hit.similarity())
            else {
                log::debug!("skipping {index} hit without developer id or distance: {}", hit.id);
                continue;
            };

            let position = *positions
                .entry(developer_id.to_string())
                .or_insert_with(|| {
                    candidates.push(Candidate {
                        developer_id: developer_id.to_string(),
                        metadata: hit.metadata.clone(),
                        ..Default::default()
                    });
                    candidates.len() - 1
                });
            let candidate = &mut candidates[position];

            let weighted = similarity * weight;
            candidate.scores.add(index, weighted);
            candidate.total_score += weighted;

            if index == SubIndex::Experience {
                candidate
                    .experience
                    .push(Experience::from_metadata(&hit.metadata));
            }
        }
    }

    candidates.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
    log::debug!("fused {} candidates", candidates.len());
    candidates
}
