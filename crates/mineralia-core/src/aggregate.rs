use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::models::{RelatedMineral, RelationRecord, StatusAssignment, StatusGroupSummary};

/// Relation type id of the canonical "is-a" relation.
pub const CANONICAL_RELATION_TYPE: i64 = 1;

/// Whether a relation row may redirect a reader to its target mineral.
///
/// Legacy rows may lack the type or the direct flag; a missing value never
/// disqualifies a row: `(type = 1 OR type IS NULL) AND (direct OR direct IS NULL)`.
#[must_use]
pub fn relation_is_eligible(relation: &RelationRecord) -> bool {
    matches!(relation.relation_type_id, None | Some(CANONICAL_RELATION_TYPE))
        && relation.direct_relation.unwrap_or(true)
}

#[derive(Debug, Default)]
struct GroupAccumulator {
    summaries: Vec<StatusGroupSummary>,
    by_name: HashMap<String, usize>,
    related_ids: Vec<HashSet<Uuid>>,
}

impl GroupAccumulator {
    fn slot(&mut self, group_id: i64, group: &str, description: &str) -> usize {
        if let Some(&idx) = self.by_name.get(group) {
            let summary = &mut self.summaries[idx];
            if !summary.description.iter().any(|seen| seen == description) {
                summary.description.push(description.to_string());
            }
            return idx;
        }
        let idx = self.summaries.len();
        self.summaries.push(StatusGroupSummary {
            id: group_id,
            group: group.to_string(),
            description: vec![description.to_string()],
            relations: None,
        });
        self.by_name.insert(group.to_string(), idx);
        self.related_ids.push(HashSet::new());
        idx
    }

    fn attach_relations<'a>(
        &mut self,
        idx: usize,
        relations: impl Iterator<Item = &'a RelationRecord>,
    ) {
        let related = self.summaries[idx].relations.get_or_insert_with(Vec::new);
        let seen = &mut self.related_ids[idx];
        for relation in relations {
            if seen.insert(relation.mineral_id) {
                related.push(RelatedMineral {
                    mineral_id: relation.mineral_id,
                    mineral_name: relation.mineral_name.clone(),
                });
            }
        }
    }
}

/// Fold a mineral's status assignments into one summary per status group.
///
/// Groups keep the order in which their first status appears. Related
/// minerals are attached only for statuses in a redirecting band.
pub fn aggregate_status_groups(
    assignments: &[StatusAssignment],
) -> Result<Vec<StatusGroupSummary>> {
    let mut acc = GroupAccumulator::default();
    for assignment in assignments {
        let group = assignment.group.as_ref().ok_or_else(|| {
            CatalogError::DataIntegrity(format!(
                "status {} has no status group",
                assignment.status_id
            ))
        })?;
        let idx = acc.slot(group.id, &group.name, &assignment.description_short);
        if assignment.status_id.band().surfaces_relations() {
            acc.attach_relations(
                idx,
                assignment
                    .relations
                    .iter()
                    .filter(|relation| relation_is_eligible(relation)),
            );
        }
    }
    Ok(acc.summaries)
}

/// Drop relation lists, as listings show statuses without cross references.
#[must_use]
pub fn without_relations(mut summaries: Vec<StatusGroupSummary>) -> Vec<StatusGroupSummary> {
    for summary in &mut summaries {
        summary.relations = None;
    }
    summaries
}

/// Minerals surfaced by the status groups followed by hierarchy children, deduplicated.
#[must_use]
pub fn related_mineral_ids(
    mineral_id: Uuid,
    summaries: &[StatusGroupSummary],
    children: &[Uuid],
) -> Vec<Uuid> {
    let mut seen = HashSet::from([mineral_id]);
    let surfaced = summaries
        .iter()
        .filter_map(|summary| summary.relations.as_ref())
        .flatten()
        .map(|related| related.mineral_id);
    surfaced
        .chain(children.iter().copied())
        .filter(|id| seen.insert(*id))
        .collect()
}
