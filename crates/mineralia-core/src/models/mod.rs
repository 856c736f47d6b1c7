mod classification;
mod mineral;
mod statistics;

pub use classification::{
    Classification, ClassificationKind, ClassificationNode, ClassificationSection,
    GroupsClassification, NsClassification, NsClassificationData, NsLevel, RelatedMineral,
    StatusGroupSummary,
};
pub use mineral::{
    CrystalStructure, CrystallographyRecord, HierarchyEdge, HistoryRecord, HistorySummary,
    MineralDetail, MineralListItem, MineralListQuery, MineralNode, MineralRecord, NsLookup,
    RelationRecord, StatusAssignment, StatusGroupRef,
};
pub use statistics::{
    CountryCount, CountryCountFilter, ElementCount, FieldRange, MineralStatistics, StatusCount,
    StatusCountGroup, StatusCountMode, StatusCountReport, StatusCountRow, StructureStatistics,
    YearCount, YearRange,
};
