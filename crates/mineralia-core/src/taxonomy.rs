use std::sync::LazyLock;

use regex::Regex;

use crate::models::{
    ClassificationKind, HistoryRecord, HistorySummary, MineralRecord, NsClassification,
    NsClassificationData, NsLevel, NsLookup,
};

const MISSING_CODE: char = '0';

static SUBSCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_").expect("subscript pattern"));
static SUPERSCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\^([^\^]+)\^").expect("superscript pattern"));

/// Dotted Nickel-Strunz index `"{class}.{subclass}{family}.{species}"`.
///
/// Only the last character of the subclass and family codes is used. A
/// mineral without a class is unclassified and gets no index at all.
#[must_use]
pub fn format_taxonomic_index(
    class_id: Option<i64>,
    subclass: Option<&str>,
    family: Option<&str>,
    species: Option<&str>,
) -> Option<String> {
    let class_id = class_id?;
    let subclass = last_char_or_zero(subclass);
    let family = last_char_or_zero(family);
    let species = species
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("0");
    Some(format!("{class_id}.{subclass}{family}.{species}"))
}

#[must_use]
pub fn mineral_ns_index(mineral: &MineralRecord) -> Option<String> {
    format_taxonomic_index(
        mineral.ns_class,
        mineral.ns_subclass.as_deref(),
        mineral.ns_family.as_deref(),
        mineral.ns_mineral.as_deref(),
    )
}

fn last_char_or_zero(code: Option<&str>) -> char {
    code.and_then(|value| value.trim().chars().last())
        .unwrap_or(MISSING_CODE)
}

/// Render a curated formula as HTML: `_x_` becomes a subscript and `^x^` a superscript.
#[must_use]
pub fn formula_html(formula: &str) -> String {
    let escaped = formula
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    let with_sub = SUBSCRIPT_RE.replace_all(&escaped, "<sub>$1</sub>");
    SUPERSCRIPT_RE
        .replace_all(&with_sub, "<sup>$1</sup>")
        .into_owned()
}

/// Discovery year as shown to readers: a single year, or `"min-max"` for a range.
#[must_use]
pub fn discovery_year(min: Option<i32>, max: Option<i32>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) if min != max => Some(format!("{min}-{max}")),
        (Some(year), _) | (None, Some(year)) => Some(year.to_string()),
        (None, None) => None,
    }
}

#[must_use]
pub fn summarize_history(history: &HistoryRecord) -> HistorySummary {
    HistorySummary {
        discovery_year: discovery_year(history.discovery_year_min, history.discovery_year_max),
        discovery_year_note: history.discovery_year_note.clone(),
        ima_year: history.ima_year,
        publication_year: history.publication_year,
    }
}

/// Nickel-Strunz section for a mineral, or `None` when it has no class.
#[must_use]
pub fn ns_classification(mineral: &MineralRecord, lookup: &NsLookup) -> Option<NsClassification> {
    let index = mineral_ns_index(mineral)?;
    let class = mineral.ns_class.map(|class_id| NsLevel {
        code: class_id.to_string(),
        description: lookup.class_description.clone(),
    });
    let subclass = mineral.ns_subclass.as_ref().map(|code| NsLevel {
        code: code.clone(),
        description: lookup.subclass_description.clone(),
    });
    let family = mineral.ns_family.as_ref().map(|code| NsLevel {
        code: code.clone(),
        description: lookup.family_description.clone(),
    });
    Some(NsClassification::new(
        ClassificationKind::Ns,
        NsClassificationData {
            index,
            class,
            subclass,
            family,
        },
    ))
}
