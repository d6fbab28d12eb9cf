//! Node maps: every node of an expanded document, indexed by graph and id.
//!
//! Embedded nodes are replaced by references, blank node labels are
//! relabelled through a [`BlankNodeIssuer`], and re-encountered subjects are
//! merged into one entry.

use crate::error::{ErrorKind, JsonLdError, Result};
use crate::iri;
use crate::issuer::BlankNodeIssuer;
use crate::model::{Item, List, Node};
use std::collections::BTreeMap;

/// Name of the default graph in a [`NodeMap`].
pub const DEFAULT_GRAPH: &str = "@default";

/// Graph name → subject id → node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeMap {
    graphs: BTreeMap<String, BTreeMap<String, Node>>,
}

impl NodeMap {
    pub fn new() -> Self {
        let mut graphs = BTreeMap::new();
        graphs.insert(DEFAULT_GRAPH.to_string(), BTreeMap::new());
        Self { graphs }
    }

    pub fn graph(&self, name: &str) -> Option<&BTreeMap<String, Node>> {
        self.graphs.get(name)
    }

    pub fn default_graph(&self) -> &BTreeMap<String, Node> {
        static EMPTY: BTreeMap<String, Node> = BTreeMap::new();
        self.graphs.get(DEFAULT_GRAPH).unwrap_or(&EMPTY)
    }

    /// Graphs in name order; the default graph sorts first.
    pub fn graphs(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, Node>)> {
        self.graphs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_graphs(self) -> BTreeMap<String, BTreeMap<String, Node>> {
        self.graphs
    }

    fn graph_mut(&mut self, name: &str) -> &mut BTreeMap<String, Node> {
        self.graphs.entry(name.to_string()).or_default()
    }

    fn node_mut(&mut self, graph: &str, id: &str) -> &mut Node {
        self.graph_mut(graph)
            .entry(id.to_string())
            .or_insert_with(|| Node::with_id(id))
    }
}

/// What a value being visited hangs off.
#[derive(Debug, Clone, Copy)]
enum Subject<'s> {
    None,
    Id(&'s str),
    /// Visiting the value of a reverse property; the referencing node.
    Reverse(&'s str),
}

/// Builds a [`NodeMap`] from expanded items.
pub struct NodeMapBuilder<'i> {
    issuer: &'i mut BlankNodeIssuer,
    map: NodeMap,
}

impl<'i> NodeMapBuilder<'i> {
    pub fn new(issuer: &'i mut BlankNodeIssuer) -> Self {
        Self {
            issuer,
            map: NodeMap::new(),
        }
    }

    /// Add `items` to the default graph.
    pub fn add_items(&mut self, items: &[Item]) -> Result<()> {
        for item in items {
            self.generate(item, DEFAULT_GRAPH, Subject::None, None, None)?;
        }
        Ok(())
    }

    pub fn finish(self) -> NodeMap {
        self.map
    }

    fn relabel(&mut self, label: &str) -> String {
        if iri::is_blank(label) {
            self.issuer.issue(Some(label))
        } else {
            label.to_string()
        }
    }

    fn generate(
        &mut self,
        element: &Item,
        graph: &str,
        subject: Subject<'_>,
        property: Option<&str>,
        list: Option<&mut Vec<Item>>,
    ) -> Result<()> {
        match element {
            Item::Null => Ok(()),
            Item::Value(_) => {
                match (list, subject, property) {
                    (Some(list), _, _) => list.push(element.clone()),
                    (None, Subject::Id(id), Some(p)) => {
                        self.map.node_mut(graph, id).add_unique(p, element.clone());
                    }
                    _ => {}
                }
                Ok(())
            }
            Item::List(source) => {
                let mut items = Vec::with_capacity(source.items.len());
                for item in &source.items {
                    self.generate(item, graph, subject, property, Some(&mut items))?;
                }
                let flattened = Item::List(List {
                    items,
                    index: source.index.clone(),
                });
                match (list, subject, property) {
                    (Some(list), _, _) => list.push(flattened),
                    (None, Subject::Id(id), Some(p)) => {
                        self.map
                            .node_mut(graph, id)
                            .properties
                            .entry(p.to_string())
                            .or_default()
                            .push(flattened);
                    }
                    _ => {}
                }
                Ok(())
            }
            Item::Node(node) => self.generate_node(node, graph, subject, property, list),
        }
    }

    fn generate_node(
        &mut self,
        node: &Node,
        graph: &str,
        subject: Subject<'_>,
        property: Option<&str>,
        list: Option<&mut Vec<Item>>,
    ) -> Result<()> {
        let id = match &node.id {
            Some(id) => self.relabel(id),
            None => self.issuer.issue(None),
        };
        self.map.node_mut(graph, &id);
        let reference = Item::reference(id.clone());

        match (subject, property) {
            (Subject::Reverse(referencing), Some(p)) => {
                self.map
                    .node_mut(graph, &id)
                    .add_unique(p, Item::reference(referencing));
            }
            (_, Some(p)) => match list {
                Some(list) => list.push(reference),
                None => {
                    if let Subject::Id(subject_id) = subject {
                        self.map.node_mut(graph, subject_id).add_unique(p, reference);
                    }
                }
            },
            _ => {}
        }

        for t in &node.types {
            let t = self.relabel(t);
            self.map.node_mut(graph, &id).add_type(&t);
        }

        if let Some(index) = &node.index {
            let entry = self.map.node_mut(graph, &id);
            match &entry.index {
                Some(existing) if existing != index => {
                    return Err(JsonLdError::flatten(
                        ErrorKind::ConflictingIndexes,
                        format!("node {} has conflicting indexes", id),
                    ));
                }
                _ => entry.index = Some(index.clone()),
            }
        }

        for (reverse_property, values) in &node.reverse {
            for value in values {
                self.generate(
                    value,
                    graph,
                    Subject::Reverse(&id),
                    Some(reverse_property),
                    None,
                )?;
            }
        }

        if let Some(graph_items) = &node.graph {
            self.map.graph_mut(&id);
            for item in graph_items {
                self.generate(item, &id, Subject::None, None, None)?;
            }
        }

        if let Some(included) = &node.included {
            for item in included {
                self.generate(item, graph, Subject::None, None, None)?;
            }
        }

        for (p, values) in &node.properties {
            let p = self.relabel(p);
            self.map
                .node_mut(graph, &id)
                .properties
                .entry(p.clone())
                .or_default();
            for value in values {
                self.generate(value, graph, Subject::Id(&id), Some(&p), None)?;
            }
        }
        Ok(())
    }
}

/// Node map of `items`, relabelling blank nodes through `issuer`.
pub fn build_node_map(items: &[Item], issuer: &mut BlankNodeIssuer) -> Result<NodeMap> {
    let mut builder = NodeMapBuilder::new(issuer);
    builder.add_items(items)?;
    Ok(builder.finish())
}

/// Union of all graphs of `map` into one subject map.
pub fn merge_node_maps(map: &NodeMap) -> BTreeMap<String, Node> {
    let mut merged: BTreeMap<String, Node> = BTreeMap::new();
    for (_, graph) in map.graphs() {
        for (id, node) in graph {
            let target = merged.entry(id.clone()).or_insert_with(|| Node::with_id(id.clone()));
            for t in &node.types {
                target.add_type(t);
            }
            if node.index.is_some() {
                target.index = node.index.clone();
            }
            for (property, values) in &node.properties {
                let entry = target.properties.entry(property.clone()).or_default();
                for value in values {
                    crate::model::add_unique(entry, value.clone());
                }
            }
        }
    }
    merged
}

/// Flattened form of expanded `items`: default graph nodes sorted by id,
/// with each named graph attached to the node named after it.
pub fn flatten_items(items: &[Item], issuer: &mut BlankNodeIssuer) -> Result<Vec<Item>> {
    let mut graphs = build_node_map(items, issuer)?.into_graphs();
    let mut default_graph = graphs.remove(DEFAULT_GRAPH).unwrap_or_default();

    for (name, graph) in graphs {
        let nodes: Vec<Item> = graph
            .into_values()
            .filter(|n| !n.is_reference())
            .map(Item::Node)
            .collect();
        default_graph
            .entry(name.clone())
            .or_insert_with(|| Node::with_id(name))
            .graph = Some(nodes);
    }

    let flattened: Vec<Item> = default_graph
        .into_values()
        .filter(|n| !n.is_reference())
        .map(Item::Node)
        .collect();
    tracing::debug!(nodes = flattened.len(), "flattened document");
    Ok(flattened)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand_document;
    use crate::model::items_to_json;
    use crate::options::JsonLdOptions;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value as JsonValue};

    fn expanded(doc: JsonValue) -> Vec<Item> {
        expand_document(&doc, &JsonLdOptions::default()).unwrap()
    }

    #[test]
    fn test_embedded_nodes_become_references() {
        let items = expanded(json!({
            "@id": "http://example.com/a",
            "http://example.com/knows": {
                "@id": "http://example.com/b",
                "http://example.com/name": "B"
            }
        }));
        let mut issuer = BlankNodeIssuer::default();
        let map = build_node_map(&items, &mut issuer).unwrap();
        let default_graph = map.default_graph();

        assert_eq!(default_graph.len(), 2);
        let a = &default_graph["http://example.com/a"];
        assert_eq!(
            a.properties["http://example.com/knows"],
            vec![Item::reference("http://example.com/b")]
        );
    }

    #[test]
    fn test_blank_nodes_are_relabelled_and_merged() {
        let items = expanded(json!([
            {"@id": "_:x", "http://example.com/p": "one"},
            {"@id": "_:x", "http://example.com/p": ["one", "two"]},
            {"http://example.com/p": "anonymous"}
        ]));
        let mut issuer = BlankNodeIssuer::default();
        let out = flatten_items(&items, &mut issuer).unwrap();

        assert_eq!(
            items_to_json(&out),
            json!([
                {"@id": "_:b0", "http://example.com/p": [{"@value": "one"}, {"@value": "two"}]},
                {"@id": "_:b1", "http://example.com/p": [{"@value": "anonymous"}]}
            ])
        );
    }

    #[test]
    fn test_named_graphs_attach_to_their_node() {
        let items = expanded(json!({
            "@id": "http://example.com/g",
            "@graph": [{"@id": "http://example.com/s", "http://example.com/p": "o"}]
        }));
        let mut issuer = BlankNodeIssuer::default();
        let out = flatten_items(&items, &mut issuer).unwrap();

        assert_eq!(
            items_to_json(&out),
            json!([{
                "@id": "http://example.com/g",
                "@graph": [{"@id": "http://example.com/s", "http://example.com/p": [{"@value": "o"}]}]
            }])
        );
    }

    #[test]
    fn test_reverse_properties_become_forward_edges() {
        let items = expanded(json!({
            "@id": "http://example.com/kid",
            "@reverse": {"http://example.com/parentOf": {"@id": "http://example.com/mom"}}
        }));
        let mut issuer = BlankNodeIssuer::default();
        let map = build_node_map(&items, &mut issuer).unwrap();

        let mom = &map.default_graph()["http://example.com/mom"];
        assert_eq!(
            mom.properties["http://example.com/parentOf"],
            vec![Item::reference("http://example.com/kid")]
        );
    }

    #[test]
    fn test_conflicting_indexes() {
        let items = expanded(json!([
            {"@id": "http://example.com/a", "@index": "one", "http://example.com/p": "x"},
            {"@id": "http://example.com/a", "@index": "two", "http://example.com/p": "y"}
        ]));
        let mut issuer = BlankNodeIssuer::default();
        let err = build_node_map(&items, &mut issuer).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConflictingIndexes);
    }

    #[test]
    fn test_repeated_occurrences_keep_one_copy_of_each_value() {
        let items = expanded(json!([
            {
                "@id": "http://example.com/a",
                "http://example.com/name": "A",
                "http://example.com/knows": {"@id": "http://example.com/b"}
            },
            {
                "@id": "http://example.com/a",
                "http://example.com/name": ["A", "Alpha"],
                "http://example.com/knows": {"@id": "http://example.com/b"}
            }
        ]));
        let mut issuer = BlankNodeIssuer::default();
        let map = build_node_map(&items, &mut issuer).unwrap();
        let a = &map.default_graph()["http://example.com/a"];
        assert_eq!(a.properties["http://example.com/name"].len(), 2);
        assert_eq!(
            a.properties["http://example.com/knows"],
            vec![Item::reference("http://example.com/b")]
        );
    }

    #[test]
    fn test_lists_are_appended_not_merged() {
        let items = expanded(json!([
            {"@id": "http://example.com/a", "http://example.com/l": {"@list": [1]}},
            {"@id": "http://example.com/a", "http://example.com/l": {"@list": [1]}}
        ]));
        let mut issuer = BlankNodeIssuer::default();
        let map = build_node_map(&items, &mut issuer).unwrap();
        let a = &map.default_graph()["http://example.com/a"];
        assert_eq!(a.properties["http://example.com/l"].len(), 2);
    }

    #[test]
    fn test_merge_node_maps_unions_graphs() {
        let items = expanded(json!([
            {"@id": "http://example.com/s", "http://example.com/p": "default"},
            {
                "@id": "http://example.com/g",
                "@graph": {"@id": "http://example.com/s", "http://example.com/p": "named"}
            }
        ]));
        let mut issuer = BlankNodeIssuer::default();
        let map = build_node_map(&items, &mut issuer).unwrap();
        let merged = merge_node_maps(&map);

        assert_eq!(merged["http://example.com/s"].properties["http://example.com/p"].len(), 2);
    }
}
