use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use uuid::Uuid;

use crate::error::{CatalogError, Result};
use crate::models::{
    CountryCount, CountryCountFilter, CrystalStructure, CrystallographyRecord, HierarchyEdge,
    HistoryRecord, MineralNode, MineralRecord, NsLookup, RelationRecord, StatusAssignment,
    StatusCountRow, StatusGroupRef, YearCount, YearRange,
};
use crate::status::StatusCode;

use super::EntityStore;

const MINERAL_COLUMNS: &str = "m.id, m.name, m.formula, m.note, m.ns_class, m.ns_subclass, \
                               m.ns_family, m.ns_mineral, m.created_at, m.updated_at";

#[derive(Clone)]
pub struct SqliteCatalogStore {
    pub(super) conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteCatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCatalogStore").finish_non_exhaustive()
    }
}

impl SqliteCatalogStore {
    pub(super) fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| CatalogError::mutex_poisoned("sqlite"))?;
        f(&conn)
    }

    pub(super) fn with_tx<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| CatalogError::mutex_poisoned("sqlite"))?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        drop(conn);
        Ok(value)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.migrate()?;
        Ok(store)
    }
}

impl EntityStore for SqliteCatalogStore {
    fn mineral(&self, id: Uuid) -> Result<Option<MineralRecord>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    &format!("SELECT {MINERAL_COLUMNS} FROM mineral m WHERE m.id = ?1"),
                    params![id.to_string()],
                    mineral_from_row,
                )
                .optional()?;
            Ok(record)
        })
    }

    fn mineral_by_name(&self, name: &str) -> Result<Option<MineralRecord>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    &format!(
                        "SELECT {MINERAL_COLUMNS} FROM mineral m WHERE m.name = ?1 COLLATE NOCASE"
                    ),
                    params![name.trim()],
                    mineral_from_row,
                )
                .optional()?;
            Ok(record)
        })
    }

    fn list_minerals(
        &self,
        name_prefix: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<MineralRecord>> {
        let pattern = name_prefix
            .map(str::trim)
            .filter(|prefix| !prefix.is_empty())
            .map(|prefix| format!("{}%", escape_like(prefix)));
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                r"
                SELECT {MINERAL_COLUMNS}
                FROM mineral m
                WHERE ?1 IS NULL OR m.name LIKE ?1 ESCAPE '\'
                ORDER BY m.name ASC
                LIMIT ?2 OFFSET ?3
                "
            ))?;
            let rows = stmt.query_map(
                params![
                    pattern,
                    usize_to_i64_saturating(limit),
                    usize_to_i64_saturating(offset)
                ],
                mineral_from_row,
            )?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn minerals_with_statuses(&self, ids: &[Uuid]) -> Result<Vec<MineralNode>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = ids.iter().map(Uuid::to_string).collect();
        let marks = placeholders(keys.len());
        self.with_conn(|conn| {
            let mut status_stmt = conn.prepare(&format!(
                r"
                SELECT mineral_id, status_id
                FROM mineral_status
                WHERE mineral_id IN ({marks})
                ORDER BY id ASC
                "
            ))?;
            let status_rows = status_stmt.query_map(params_from_iter(keys.iter()), |row| {
                Ok((uuid_at(row, 0)?, row.get::<_, f64>(1)?))
            })?;
            let mut statuses = HashMap::<Uuid, Vec<StatusCode>>::new();
            for row in status_rows {
                let (mineral_id, raw) = row?;
                statuses
                    .entry(mineral_id)
                    .or_default()
                    .push(StatusCode::from_f64(raw)?);
            }

            let mut mineral_stmt = conn.prepare(&format!(
                "SELECT {MINERAL_COLUMNS} FROM mineral m WHERE m.id IN ({marks}) ORDER BY m.name ASC"
            ))?;
            let rows = mineral_stmt.query_map(params_from_iter(keys.iter()), mineral_from_row)?;
            let mut out = Vec::new();
            for row in rows {
                let mineral = row?;
                let statuses = statuses.remove(&mineral.id).unwrap_or_default();
                out.push(MineralNode { mineral, statuses });
            }
            Ok(out)
        })
    }

    fn hierarchy_edges_reachable_from(&self, mineral_id: Uuid) -> Result<Vec<HierarchyEdge>> {
        self.with_conn(|conn| {
            // UNION (not UNION ALL) drops repeated rows, so cyclic parent links terminate.
            let mut stmt = conn.prepare(
                r"
                WITH RECURSIVE reachable(id, mineral_id, parent_id) AS (
                    SELECT id, mineral_id, parent_id
                    FROM mineral_hierarchy
                    WHERE mineral_id = ?1
                    UNION
                    SELECT h.id, h.mineral_id, h.parent_id
                    FROM mineral_hierarchy h
                    JOIN reachable r ON h.mineral_id = r.parent_id
                )
                SELECT id, mineral_id, parent_id
                FROM reachable
                ORDER BY id ASC
                ",
            )?;
            let rows = stmt.query_map(params![mineral_id.to_string()], |row| {
                Ok(HierarchyEdge {
                    id: row.get(0)?,
                    mineral_id: uuid_at(row, 1)?,
                    parent_id: optional_uuid_at(row, 2)?,
                })
            })?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn hierarchy_children(&self, mineral_id: Uuid) -> Result<Vec<Uuid>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r"
                SELECT mineral_id
                FROM mineral_hierarchy
                WHERE parent_id = ?1
                GROUP BY mineral_id
                ORDER BY MIN(id) ASC
                ",
            )?;
            let rows = stmt.query_map(params![mineral_id.to_string()], |row| uuid_at(row, 0))?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn status_assignments(&self, mineral_id: Uuid) -> Result<Vec<StatusAssignment>> {
        let key = mineral_id.to_string();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r"
                SELECT ms.id, s.id, s.description_short, sg.id, sg.name, ms.direct_status
                FROM mineral_status ms
                JOIN status s ON s.id = ms.status_id
                LEFT JOIN status_group sg ON sg.id = s.status_group_id
                WHERE ms.mineral_id = ?1
                ORDER BY ms.id ASC
                ",
            )?;
            let rows = stmt.query_map(params![key], |row| {
                let group_id: Option<i64> = row.get(3)?;
                let group_name: Option<String> = row.get(4)?;
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, String>(2)?,
                    group_id
                        .zip(group_name)
                        .map(|(id, name)| StatusGroupRef { id, name }),
                    row.get::<_, bool>(5)?,
                ))
            })?;
            let mut assignments = Vec::new();
            let mut slot_by_assignment = HashMap::<i64, usize>::new();
            for row in rows {
                let (assignment_id, raw_status, description_short, group, direct_status) = row?;
                slot_by_assignment.insert(assignment_id, assignments.len());
                assignments.push(StatusAssignment {
                    assignment_id,
                    status_id: StatusCode::from_f64(raw_status)?,
                    group,
                    description_short,
                    direct_status,
                    relations: Vec::new(),
                });
            }
            if assignments.is_empty() {
                return Ok(assignments);
            }

            let mut relation_stmt = conn.prepare(
                r"
                SELECT mr.mineral_status_id, mr.relation_id, m.name,
                       mr.relation_type_id, mr.direct_relation, mr.relation_note
                FROM mineral_relation mr
                JOIN mineral m ON m.id = mr.relation_id
                WHERE mr.mineral_id = ?1
                ORDER BY mr.id ASC
                ",
            )?;
            let relation_rows = relation_stmt.query_map(params![key], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    RelationRecord {
                        mineral_id: uuid_at(row, 1)?,
                        mineral_name: row.get(2)?,
                        relation_type_id: row.get(3)?,
                        direct_relation: row.get(4)?,
                        note: row.get(5)?,
                    },
                ))
            })?;
            for row in relation_rows {
                let (assignment_id, relation) = row?;
                if let Some(&slot) = slot_by_assignment.get(&assignment_id) {
                    assignments[slot].relations.push(relation);
                }
            }
            Ok(assignments)
        })
    }

    fn crystal_structures(&self, mineral_ids: &[Uuid]) -> Result<Vec<CrystalStructure>> {
        if mineral_ids.is_empty() {
            return Ok(Vec::new());
        }
        let keys: Vec<String> = mineral_ids.iter().map(Uuid::to_string).collect();
        let marks = placeholders(keys.len());
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                r"
                SELECT id, mineral_id, formula, a, b, c, alpha, beta, gamma, volume
                FROM mineral_structure
                WHERE mineral_id IN ({marks})
                ORDER BY id ASC
                "
            ))?;
            let rows = stmt.query_map(params_from_iter(keys.iter()), |row| {
                Ok(CrystalStructure {
                    id: row.get(0)?,
                    mineral_id: uuid_at(row, 1)?,
                    formula: row.get(2)?,
                    a: row.get(3)?,
                    b: row.get(4)?,
                    c: row.get(5)?,
                    alpha: row.get(6)?,
                    beta: row.get(7)?,
                    gamma: row.get(8)?,
                    volume: row.get(9)?,
                })
            })?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn status_counts(&self) -> Result<Vec<StatusCountRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r"
                SELECT s.id, s.description_short, sg.name, COUNT(DISTINCT ms.mineral_id)
                FROM mineral_status ms
                JOIN status s ON s.id = ms.status_id
                LEFT JOIN status_group sg ON sg.id = s.status_group_id
                GROUP BY s.id, s.description_short, sg.name
                ORDER BY s.id ASC
                ",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, f64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (raw_status, description, group, count) = row?;
                out.push(StatusCountRow {
                    status_id: StatusCode::from_f64(raw_status)?,
                    description,
                    group,
                    count: i64_to_u64_saturating(count),
                });
            }
            Ok(out)
        })
    }

    fn discovery_year_counts(&self, range: YearRange) -> Result<Vec<YearCount>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r"
                SELECT year, COUNT(DISTINCT mineral_id)
                FROM (
                    SELECT mineral_id, COALESCE(discovery_year_min, discovery_year_max) AS year
                    FROM mineral_history
                )
                WHERE year IS NOT NULL
                  AND year >= ?1
                  AND (?2 IS NULL OR year <= ?2)
                GROUP BY year
                ORDER BY year ASC
                ",
            )?;
            let rows = stmt.query_map(params![range.min, range.max], |row| {
                Ok(YearCount {
                    year: row.get(0)?,
                    count: i64_to_u64_saturating(row.get(1)?),
                })
            })?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn discovery_country_counts(&self, filter: &CountryCountFilter) -> Result<Vec<CountryCount>> {
        let keys: Vec<String> = filter
            .mineral_ids
            .iter()
            .flatten()
            .map(Uuid::to_string)
            .collect();
        if filter.mineral_ids.is_some() && keys.is_empty() {
            return Ok(Vec::new());
        }
        let where_clause = if keys.is_empty() {
            String::new()
        } else {
            format!("WHERE mc.mineral_id IN ({})", placeholders(keys.len()))
        };
        let limit_clause = filter
            .limit
            .map(|limit| format!("LIMIT {}", usize_to_i64_saturating(limit)))
            .unwrap_or_default();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                r"
                SELECT c.id, c.name, c.iso_code, COUNT(DISTINCT mc.mineral_id) AS mineral_count
                FROM mineral_country mc
                JOIN country c ON c.id = mc.country_id
                {where_clause}
                GROUP BY c.id, c.name, c.iso_code
                ORDER BY mineral_count DESC, c.name ASC
                {limit_clause}
                "
            ))?;
            let rows = stmt.query_map(params_from_iter(keys.iter()), |row| {
                Ok(CountryCount {
                    country_id: row.get(0)?,
                    name: row.get(1)?,
                    iso_code: row.get(2)?,
                    count: i64_to_u64_saturating(row.get(3)?),
                })
            })?;

            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        })
    }

    fn history(&self, mineral_id: Uuid) -> Result<Option<HistoryRecord>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    r"
                    SELECT discovery_year_min, discovery_year_max, discovery_year_note,
                           ima_year, publication_year
                    FROM mineral_history
                    WHERE mineral_id = ?1
                    ",
                    params![mineral_id.to_string()],
                    |row| {
                        Ok(HistoryRecord {
                            discovery_year_min: row.get(0)?,
                            discovery_year_max: row.get(1)?,
                            discovery_year_note: row.get(2)?,
                            ima_year: row.get(3)?,
                            publication_year: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
    }

    fn crystallography(&self, mineral_id: Uuid) -> Result<Option<CrystallographyRecord>> {
        self.with_conn(|conn| {
            let record = conn
                .query_row(
                    r"
                    SELECT crystal_system, crystal_class, space_group, note
                    FROM mineral_crystallography
                    WHERE mineral_id = ?1
                    ",
                    params![mineral_id.to_string()],
                    |row| {
                        Ok(CrystallographyRecord {
                            crystal_system: row.get(0)?,
                            crystal_class: row.get(1)?,
                            space_group: row.get(2)?,
                            note: row.get(3)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
    }

    fn ns_lookup(&self, mineral: &MineralRecord) -> Result<NsLookup> {
        self.with_conn(|conn| {
            let class_description = match mineral.ns_class {
                Some(class_id) => conn
                    .query_row(
                        "SELECT description FROM ns_class WHERE id = ?1",
                        params![class_id],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?,
                None => None,
            };
            let subclass_description = match mineral.ns_subclass.as_deref() {
                Some(code) => conn
                    .query_row(
                        "SELECT description FROM ns_subclass WHERE code = ?1",
                        params![code],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?,
                None => None,
            };
            let family_description = match mineral.ns_family.as_deref() {
                Some(code) => conn
                    .query_row(
                        "SELECT description FROM ns_family WHERE code = ?1",
                        params![code],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?,
                None => None,
            };
            Ok(NsLookup {
                class_description,
                subclass_description,
                family_description,
            })
        })
    }
}

fn mineral_from_row(row: &Row<'_>) -> rusqlite::Result<MineralRecord> {
    Ok(MineralRecord {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        formula: row.get(2)?,
        note: row.get(3)?,
        ns_class: row.get(4)?,
        ns_subclass: row.get(5)?,
        ns_family: row.get(6)?,
        ns_mineral: row.get(7)?,
        created_at: timestamp_at(row, 8)?,
        updated_at: timestamp_at(row, 9)?,
    })
}

fn uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn optional_uuid_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        Uuid::parse_str(&raw).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
        })
    })
    .transpose()
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub(super) fn usize_to_i64_saturating(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn i64_to_u64_saturating(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
