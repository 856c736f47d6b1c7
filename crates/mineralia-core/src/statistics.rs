use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CatalogError, Result};
use crate::models::{
    CrystalStructure, ElementCount, FieldRange, MineralStatistics, StatusCount, StatusCountGroup,
    StatusCountMode, StatusCountReport, StatusCountRow, StructureStatistics,
};

/// Rare-earth elements are curated as a single `REE` token.
static ELEMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"REE|[A-Z][a-z]?").expect("element pattern"));

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn field_range(values: impl Iterator<Item = Option<f64>>) -> Option<FieldRange> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;
    let mut count = 0_u32;
    for value in values.flatten().filter(|value| value.is_finite()) {
        min = min.min(value);
        max = max.max(value);
        sum += value;
        count += 1;
    }
    if count == 0 {
        return None;
    }
    Some(FieldRange {
        min: round4(min),
        max: round4(max),
        avg: round4(sum / f64::from(count)),
    })
}

/// Element symbols in a formula, in order of first appearance.
#[must_use]
pub fn formula_elements(formula: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    ELEMENT_RE
        .find_iter(formula)
        .map(|token| token.as_str())
        .filter(|symbol| seen.insert(*symbol))
        .map(ToString::to_string)
        .collect()
}

/// Min/max/avg cell parameters over distinct structures, or `None` without structures.
#[must_use]
pub fn structure_statistics(structures: &[CrystalStructure]) -> Option<StructureStatistics> {
    let distinct = distinct_structures(structures);
    if distinct.is_empty() {
        return None;
    }
    let range = |field: fn(&CrystalStructure) -> Option<f64>| {
        field_range(distinct.iter().map(|structure| field(structure)))
    };
    Some(StructureStatistics {
        count: distinct.len(),
        a: range(|s| s.a),
        b: range(|s| s.b),
        c: range(|s| s.c),
        alpha: range(|s| s.alpha),
        beta: range(|s| s.beta),
        gamma: range(|s| s.gamma),
        volume: range(|s| s.volume),
    })
}

/// How many distinct structures mention each element, most frequent first.
#[must_use]
pub fn element_counts(structures: &[CrystalStructure]) -> Vec<ElementCount> {
    let mut counts = HashMap::<String, usize>::new();
    for structure in distinct_structures(structures) {
        let Some(formula) = structure.formula.as_deref() else {
            continue;
        };
        for element in formula_elements(formula) {
            *counts.entry(element).or_default() += 1;
        }
    }
    let mut out: Vec<_> = counts
        .into_iter()
        .map(|(element, count)| ElementCount { element, count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.element.cmp(&b.element)));
    out
}

#[must_use]
pub fn mineral_statistics(structures: &[CrystalStructure]) -> MineralStatistics {
    let elements = element_counts(structures);
    MineralStatistics {
        structures: structure_statistics(structures),
        elements: (!elements.is_empty()).then_some(elements),
    }
}

fn distinct_structures(structures: &[CrystalStructure]) -> Vec<&CrystalStructure> {
    let mut seen = HashSet::new();
    structures
        .iter()
        .filter(|structure| seen.insert(structure.id))
        .collect()
}

/// Turn store rows into the status-count report for `mode`.
///
/// Grouped reports are sorted by group name; statuses keep code order.
pub fn status_count_report(
    rows: Vec<StatusCountRow>,
    mode: StatusCountMode,
    grouped: bool,
) -> Result<StatusCountReport> {
    let mut counts = Vec::with_capacity(rows.len());
    for row in rows {
        if mode == StatusCountMode::Basic && !row.status_id.band().is_basic() {
            continue;
        }
        let group = row.group.ok_or_else(|| {
            CatalogError::DataIntegrity(format!("status {} has no status group", row.status_id))
        })?;
        counts.push(StatusCount {
            status_id: row.status_id,
            description: row.description,
            group,
            count: row.count,
        });
    }
    counts.sort_by_key(|count| count.status_id);

    if !grouped {
        return Ok(StatusCountReport::Flat(counts));
    }
    let mut by_group = BTreeMap::<String, Vec<StatusCount>>::new();
    for count in counts {
        by_group.entry(count.group.clone()).or_default().push(count);
    }
    Ok(StatusCountReport::Grouped(
        by_group
            .into_iter()
            .map(|(group, statuses)| StatusCountGroup { group, statuses })
            .collect(),
    ))
}
