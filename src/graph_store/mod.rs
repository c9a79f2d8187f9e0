//! Knowledge graph store for Blikk.
//!
//! An entity/relation graph linking extracted concepts to the chunks that
//! mention them, persisted as a single node-link JSON document. The whole
//! graph is loaded eagerly at open and rewritten wholesale on save.

use crate::error::{BlikkError, Result};
use crate::extraction::{Entity, Relation};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

/// A node in the knowledge graph. The canonical key is the lowercased,
/// trimmed entity name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Chunk ids where this entity was mentioned, in discovery order,
    /// duplicates suppressed.
    pub chunks: Vec<Uuid>,
}

/// An undirected labeled edge of the node-link document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    pub relation: String,
}

/// Node/edge counts for status output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
}

#[derive(Default, Serialize, Deserialize)]
struct GraphDocument {
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
}

/// The full node/edge set for one video.
pub struct KnowledgeGraphStore {
    path: Option<PathBuf>,
    nodes: Vec<GraphNode>,
    /// Canonical name -> position in `nodes`.
    by_name: HashMap<String, usize>,
    /// Unordered canonical pair -> relation label. No multi-edges: adding the
    /// same pair again overwrites the label.
    edges: HashMap<(String, String), String>,
}

/// Canonicalize an entity name: lowercase and trim.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

fn edge_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl KnowledgeGraphStore {
    /// Open the graph, eagerly loading the existing document if present.
    /// A missing document starts an empty graph.
    pub fn open(path: &Path) -> Result<Self> {
        let mut store = Self {
            path: Some(path.to_path_buf()),
            nodes: Vec::new(),
            by_name: HashMap::new(),
            edges: HashMap::new(),
        };

        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| BlikkError::Storage(format!("reading {}: {e}", path.display())))?;
            let doc: GraphDocument = serde_json::from_str(&content)
                .map_err(|e| BlikkError::Storage(format!("parsing {}: {e}", path.display())))?;

            for node in doc.nodes {
                store.by_name.insert(node.name.clone(), store.nodes.len());
                store.nodes.push(node);
            }
            for link in doc.links {
                store
                    .edges
                    .insert(edge_key(&link.source, &link.target), link.relation);
            }
            debug!(
                "Loaded knowledge graph: {} nodes, {} edges",
                store.nodes.len(),
                store.edges.len()
            );
        }

        Ok(store)
    }

    /// Create a graph with no backing document (used in tests).
    pub fn in_memory() -> Self {
        Self {
            path: None,
            nodes: Vec::new(),
            by_name: HashMap::new(),
            edges: HashMap::new(),
        }
    }

    /// Merge one chunk's extraction into the graph.
    ///
    /// Entities create nodes on first sight and append the chunk id otherwise
    /// (idempotent per chunk). Relations are added only when both canonical
    /// endpoints already exist as nodes; anything else is silently dropped —
    /// a policy choice, not a failure.
    pub fn add_knowledge(&mut self, entities: &[Entity], relations: &[Relation], chunk_id: Uuid) {
        for entity in entities {
            let name = canonical_name(&entity.name);
            if name.is_empty() {
                continue;
            }

            match self.by_name.get(&name) {
                Some(&idx) => {
                    let node = &mut self.nodes[idx];
                    if !node.chunks.contains(&chunk_id) {
                        node.chunks.push(chunk_id);
                    }
                }
                None => {
                    self.by_name.insert(name.clone(), self.nodes.len());
                    self.nodes.push(GraphNode {
                        name,
                        entity_type: entity.entity_type.clone(),
                        chunks: vec![chunk_id],
                    });
                }
            }
        }

        for relation in relations {
            let source = canonical_name(&relation.source);
            let target = canonical_name(&relation.target);

            if self.by_name.contains_key(&source) && self.by_name.contains_key(&target) {
                self.edges
                    .insert(edge_key(&source, &target), relation.relation.clone());
            }
        }
    }

    /// Collect the chunk ids reachable from the given entity names.
    ///
    /// For each entity present as a node, its own chunk list contributes
    /// (0-hop) and, if `hops >= 1`, so do the chunk lists of directly
    /// adjacent nodes. The neighborhood radius is fixed at one: larger `hops`
    /// values are clamped. Unknown entities contribute nothing.
    pub fn retrieve_context(&self, entities: &[String], hops: usize) -> HashSet<Uuid> {
        let hops = hops.min(1);
        let mut chunk_ids = HashSet::new();

        for entity in entities {
            let name = canonical_name(entity);
            let Some(&idx) = self.by_name.get(&name) else {
                continue;
            };

            chunk_ids.extend(self.nodes[idx].chunks.iter().copied());

            if hops >= 1 {
                for neighbor in self.neighbors(&name) {
                    if let Some(&n_idx) = self.by_name.get(&neighbor) {
                        chunk_ids.extend(self.nodes[n_idx].chunks.iter().copied());
                    }
                }
            }
        }

        chunk_ids
    }

    fn neighbors(&self, name: &str) -> Vec<String> {
        self.edges
            .keys()
            .filter_map(|(a, b)| {
                if a == name {
                    Some(b.clone())
                } else if b == name {
                    Some(a.clone())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Node/edge counts.
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            node_count: self.nodes.len(),
            edge_count: self.edges.len(),
        }
    }

    /// Rewrite the whole node-link document.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| BlikkError::Storage(format!("creating {}: {e}", parent.display())))?;
        }

        let doc = GraphDocument {
            nodes: self.nodes.clone(),
            links: self
                .edges
                .iter()
                .map(|((source, target), relation)| GraphLink {
                    source: source.clone(),
                    target: target.clone(),
                    relation: relation.clone(),
                })
                .collect(),
        };

        let content = serde_json::to_string(&doc)?;
        std::fs::write(path, content)
            .map_err(|e| BlikkError::Storage(format!("writing {}: {e}", path.display())))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, entity_type: &str) -> Entity {
        Entity {
            name: name.to_string(),
            entity_type: entity_type.to_string(),
        }
    }

    fn relation(source: &str, target: &str, label: &str) -> Relation {
        Relation {
            source: source.to_string(),
            target: target.to_string(),
            relation: label.to_string(),
        }
    }

    #[test]
    fn test_add_knowledge_is_idempotent_per_chunk() {
        let mut graph = KnowledgeGraphStore::in_memory();
        let chunk = Uuid::new_v4();
        let entities = [entity("Alice", "Person")];

        graph.add_knowledge(&entities, &[], chunk);
        graph.add_knowledge(&entities, &[], chunk);

        let chunks = graph.retrieve_context(&["alice".to_string()], 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(graph.stats().node_count, 1);
    }

    #[test]
    fn test_canonical_names_merge() {
        let mut graph = KnowledgeGraphStore::in_memory();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        graph.add_knowledge(&[entity("  Alice ", "Person")], &[], first);
        graph.add_knowledge(&[entity("ALICE", "Person")], &[], second);

        assert_eq!(graph.stats().node_count, 1);
        let chunks = graph.retrieve_context(&["Alice".to_string()], 0);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_relation_with_missing_endpoint_is_dropped() {
        let mut graph = KnowledgeGraphStore::in_memory();
        let chunk = Uuid::new_v4();

        graph.add_knowledge(
            &[entity("Alice", "Person")],
            &[relation("Alice", "Bob", "talks to")],
            chunk,
        );

        assert_eq!(graph.stats().edge_count, 0);
    }

    #[test]
    fn test_relation_overwrites_previous_label() {
        let mut graph = KnowledgeGraphStore::in_memory();
        let chunk = Uuid::new_v4();
        let entities = [entity("Alice", "Person"), entity("Bob", "Person")];

        graph.add_knowledge(&entities, &[relation("Alice", "Bob", "greets")], chunk);
        graph.add_knowledge(&entities, &[relation("Bob", "Alice", "argues with")], chunk);

        assert_eq!(graph.stats().edge_count, 1);
    }

    #[test]
    fn test_one_hop_retrieval() {
        let mut graph = KnowledgeGraphStore::in_memory();
        let chunk_a = Uuid::new_v4();
        let chunk_b = Uuid::new_v4();

        graph.add_knowledge(&[entity("Alice", "Person")], &[], chunk_a);
        graph.add_knowledge(
            &[entity("Alice", "Person"), entity("Bob", "Person")],
            &[relation("Alice", "Bob", "talks to")],
            chunk_b,
        );

        // Bob alone at 0 hops: only chunk_b
        let zero = graph.retrieve_context(&["Bob".to_string()], 0);
        assert_eq!(zero, HashSet::from([chunk_b]));

        // Bob at 1 hop pulls in Alice's chunks too
        let one = graph.retrieve_context(&["Bob".to_string()], 1);
        assert_eq!(one, HashSet::from([chunk_a, chunk_b]));

        // hops beyond 1 are clamped to the same neighborhood
        let clamped = graph.retrieve_context(&["Bob".to_string()], 5);
        assert_eq!(clamped, one);
    }

    #[test]
    fn test_unknown_entity_contributes_nothing() {
        let graph = KnowledgeGraphStore::in_memory();
        assert!(graph.retrieve_context(&["ghost".to_string()], 1).is_empty());
    }

    #[test]
    fn test_persistence_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_graph.json");
        let chunk = Uuid::new_v4();

        {
            let mut graph = KnowledgeGraphStore::open(&path).unwrap();
            graph.add_knowledge(
                &[entity("Alice", "Person"), entity("Bob", "Person")],
                &[relation("Alice", "Bob", "talks to")],
                chunk,
            );
            graph.save().unwrap();
        }

        let reloaded = KnowledgeGraphStore::open(&path).unwrap();
        assert_eq!(reloaded.stats().node_count, 2);
        assert_eq!(reloaded.stats().edge_count, 1);
        assert_eq!(
            reloaded.retrieve_context(&["alice".to_string()], 0),
            HashSet::from([chunk])
        );
    }

    #[test]
    fn test_load_missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let graph = KnowledgeGraphStore::open(&dir.path().join("absent.json")).unwrap();
        assert_eq!(graph.stats().node_count, 0);
    }
}
