use crate::dto::{Record, RecordResult};
use crate::lsh::SimilarityGraph;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Connected components of a similarity graph.
///
/// Component ids are positions in discovery order; members are listed in the
/// order the traversal reached them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Components {
    groups: Vec<Vec<usize>>,
}

/// Breadth-first connected components.
///
/// Vertices are scanned in index order. Each unvisited vertex opens a new
/// component; neighbours are marked visited and appended to that component
/// when first reached, before their own expansion.
pub fn connected_components(graph: &SimilarityGraph) -> Components {
    let n = graph.num_vertices();
    let mut visited = vec![false; n];
    let mut groups = Vec::new();
    let mut queue = VecDeque::new();
    for root in 0..n {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        let mut group = vec![root];
        queue.push_back(root);
        while let Some(vertex) = queue.pop_front() {
            for &neighbor in graph.neighbors(vertex) {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    group.push(neighbor);
                    queue.push_back(neighbor);
                }
            }
        }
        groups.push(group);
    }
    Components { groups }
}

impl Components {
    /// One singleton component per record.
    pub fn singletons(records: usize) -> Self {
        Components {
            groups: (0..records).map(|idx| vec![idx]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn members(&self, component: usize) -> Option<&[usize]> {
        self.groups.get(component).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.groups
            .iter()
            .enumerate()
            .map(|(id, group)| (id, group.as_slice()))
    }

    /// Total number of records across all components.
    pub fn record_count(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Component id of every record, indexed by record.
    pub fn assignment(&self) -> Vec<usize> {
        let mut assignment = vec![0; self.record_count()];
        for (id, group) in self.iter() {
            for &record in group {
                assignment[record] = id;
            }
        }
        assignment
    }

    /// Members replaced by the ids of `records`, keyed by component id.
    pub fn labelled<'r>(&self, records: &'r [Record]) -> BTreeMap<usize, Vec<&'r str>> {
        self.iter()
            .map(|(id, group)| {
                let ids = group.iter().map(|&idx| records[idx].id.as_str()).collect();
                (id, ids)
            })
            .collect()
    }

    /// One row per record with a `"{component}-{size}"` cluster label.
    pub fn record_results(&self, records: &[Record]) -> Vec<RecordResult> {
        self.iter()
            .flat_map(|(id, group)| {
                let cluster_id = format!("{id}-{}", group.len());
                group.iter().map(move |&idx| RecordResult {
                    id: records[idx].id.clone(),
                    cluster_id: cluster_id.clone(),
                })
            })
            .collect()
    }

    pub fn summary(&self) -> ComponentSummary {
        let mut sizes: Vec<usize> = self.groups.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        let singletons = sizes.iter().filter(|&&size| size < 2).count();
        let average = if sizes.is_empty() {
            0.0
        } else {
            self.record_count() as f64 / sizes.len() as f64
        };
        ComponentSummary {
            groups: sizes.len() - singletons,
            singletons,
            largest: sizes.last().copied().unwrap_or(0),
            average,
            median: median(&sizes),
        }
    }
}

fn median(sorted: &[usize]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        len if len % 2 == 1 => sorted[len / 2] as f64,
        len => (sorted[len / 2 - 1] + sorted[len / 2]) as f64 / 2.0,
    }
}

/// Size statistics over a set of components.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComponentSummary {
    /// Components with two or more members
    pub groups: usize,
    /// Components with a single member
    pub singletons: usize,
    pub largest: usize,
    pub average: f64,
    pub median: f64,
}
