use crate::config::RelationConfig;
use crate::error::GraphError;
use crate::ir::{Edge, Graph, Node};
use crate::parser::{Table, parse_table, parse_table_bytes};
use crate::relation::{SynonymTable, normalize_relation, stronger_relation};
use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};
use tracing::debug;

type PairKey = (String, String);

/// Winning response for a pair in the raw view.
#[derive(Debug, Clone)]
struct RawChoice {
    raw: String,
    norm: String,
}

/// Parses survey text and builds its graph, rejecting empty results.
pub fn parse_relations(input: &str, relations: &RelationConfig) -> Result<Graph, GraphError> {
    let table = parse_table(input)?;
    non_empty(build_graph(&table, relations))
}

pub fn parse_relations_bytes(input: &[u8], relations: &RelationConfig) -> Result<Graph, GraphError> {
    let table = parse_table_bytes(input)?;
    non_empty(build_graph(&table, relations))
}

fn non_empty(graph: Graph) -> Result<Graph, GraphError> {
    if graph.is_empty() {
        return Err(GraphError::Empty);
    }
    Ok(graph)
}

/// Folds every row into the node set and the merged/raw edge maps.
///
/// Missing respondents skip the row; missing or blank cells are no answer.
pub fn build_graph(table: &Table, relations: &RelationConfig) -> Graph {
    let synonyms = SynonymTable::from_groups(&relations.relation_groups);
    let hierarchy = relations.hierarchy.as_slice();

    let mut nodes: IndexSet<String> = IndexSet::new();
    let mut merged: IndexMap<PairKey, String> = IndexMap::new();
    let mut raw: IndexMap<PairKey, RawChoice> = IndexMap::new();

    let Some(respondent_column) = table.respondent_column() else {
        return Graph::new();
    };

    let mut skipped_rows = 0usize;
    for row in &table.rows {
        let source = row.get(respondent_column).map(str::trim).unwrap_or_default();
        if source.is_empty() {
            skipped_rows += 1;
            continue;
        }
        nodes.insert(source.to_string());

        for column in table.target_columns() {
            let target = column.cleaned.as_str();
            if target.is_empty() || target == source {
                continue;
            }
            nodes.insert(target.to_string());

            let raw_label = row.get(column).map(str::trim).unwrap_or_default();
            if raw_label.is_empty() {
                continue;
            }
            let Some(normalized) = normalize_relation(Some(raw_label), &synonyms) else {
                continue;
            };
            let key = (source.to_string(), target.to_string());

            let chosen = stronger_relation(
                merged.get(&key).map(String::as_str),
                Some(normalized.as_str()),
                hierarchy,
            )
            .unwrap_or(normalized.as_str())
            .to_string();
            merged.insert(key.clone(), chosen);

            match raw.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(RawChoice {
                        raw: raw_label.to_string(),
                        norm: normalized,
                    });
                }
                Entry::Occupied(mut slot) => {
                    let current = slot.get_mut();
                    let stronger = stronger_relation(
                        Some(current.norm.as_str()),
                        Some(normalized.as_str()),
                        hierarchy,
                    );
                    // Only swap the label when the chosen category actually changes.
                    if stronger != Some(current.norm.as_str()) {
                        *current = RawChoice {
                            raw: raw_label.to_string(),
                            norm: normalized,
                        };
                    }
                }
            }
        }
    }

    let edges_merged: Vec<Edge> = merged
        .into_iter()
        .map(|((from, to), label)| Edge {
            color: relations.color_for(&label).to_string(),
            from,
            to,
            label,
        })
        .collect();
    let edges_raw: Vec<Edge> = raw
        .into_iter()
        .map(|((from, to), choice)| Edge {
            color: relations.color_for(&choice.norm).to_string(),
            from,
            to,
            label: choice.raw,
        })
        .collect();

    debug!(
        rows = table.rows.len(),
        skipped_rows,
        nodes = nodes.len(),
        edges = edges_merged.len(),
        "relation graph built"
    );

    Graph {
        nodes: nodes.into_iter().map(Node::new).collect(),
        edges_merged,
        edges_raw,
    }
}
