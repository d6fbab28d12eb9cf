//! Embedding matched subjects into the framed output.
//!
//! Output nodes live in an arena inside [`FrameState`] so an `@last` embed
//! can be found again and swapped for a reference after later matches.
//! The arena is turned into [`Item`]s once framing is done.

use super::matcher::{filter_subject, value_matches, Subjects};
use super::pattern::{Flags, Frame, Pattern, TypePattern};
use crate::error::{ErrorKind, JsonLdError, Result};
use crate::iri;
use crate::model::{Item, List, Node};
use crate::node_map::DEFAULT_GRAPH;
use crate::options::{Embed, JsonLdOptions};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Name of the graph holding the union of all graphs.
pub(crate) const MERGED_GRAPH: &str = "@merged";

/// Deepest chain of nested embeds before framing gives up.
pub const MAX_FRAME_DEPTH: usize = 256;

#[derive(Debug, Clone)]
enum Slot {
    Node(usize),
    List(usize),
    Value(Item),
}

/// Which entry of an output node a slot sits in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Edge {
    Property(String),
    Reverse(String),
    Graph,
    Included,
}

/// Where an output node is attached.
#[derive(Debug, Clone)]
pub(crate) enum Parent {
    Root,
    Node(usize, Edge),
    List(usize),
}

#[derive(Debug, Default)]
struct OutNode {
    id: String,
    types: Vec<String>,
    index: Option<String>,
    properties: BTreeMap<String, Vec<Slot>>,
    reverse: BTreeMap<String, Vec<Slot>>,
    graph: Option<Vec<Slot>>,
    included: Option<Vec<Slot>>,
}

impl OutNode {
    fn slots_mut(&mut self, edge: &Edge) -> &mut Vec<Slot> {
        match edge {
            Edge::Property(p) => self.properties.entry(p.clone()).or_default(),
            Edge::Reverse(p) => self.reverse.entry(p.clone()).or_default(),
            Edge::Graph => self.graph.get_or_insert_with(Vec::new),
            Edge::Included => self.included.get_or_insert_with(Vec::new),
        }
    }
}

#[derive(Debug, Default)]
struct OutList {
    items: Vec<Slot>,
    index: Option<String>,
}

/// Call-scoped framing state: the output arena, the subject stack, and
/// the link and unique-embed maps of every graph visited.
#[derive(Debug)]
pub(crate) struct FrameState {
    graph: String,
    embedded: bool,
    link: HashMap<String, HashMap<String, usize>>,
    unique_embeds: HashMap<String, HashMap<String, Parent>>,
    subject_stack: Vec<(String, String)>,
    nodes: Vec<OutNode>,
    lists: Vec<OutList>,
    roots: Vec<Slot>,
    blank_uses: HashMap<String, usize>,
}

impl FrameState {
    pub(crate) fn new(graph: &str) -> Self {
        Self {
            graph: graph.to_string(),
            embedded: false,
            link: HashMap::new(),
            unique_embeds: HashMap::new(),
            subject_stack: Vec::new(),
            nodes: Vec::new(),
            lists: Vec::new(),
            roots: Vec::new(),
            blank_uses: HashMap::new(),
        }
    }

    fn count_blank(&mut self, id: &str) {
        if iri::is_blank(id) {
            *self.blank_uses.entry(id.to_string()).or_default() += 1;
        }
    }

    fn new_node(&mut self, id: &str) -> usize {
        self.count_blank(id);
        self.new_reference(id)
    }

    /// A reference node that does not count as a use of a blank id.
    fn new_reference(&mut self, id: &str) -> usize {
        self.nodes.push(OutNode {
            id: id.to_string(),
            ..Default::default()
        });
        self.nodes.len() - 1
    }

    fn new_list(&mut self, index: Option<String>) -> usize {
        self.lists.push(OutList {
            items: Vec::new(),
            index,
        });
        self.lists.len() - 1
    }

    fn add_output(&mut self, parent: &Parent, slot: Slot) {
        match parent {
            Parent::Root => self.roots.push(slot),
            Parent::Node(n, edge) => self.nodes[*n].slots_mut(edge).push(slot),
            Parent::List(l) => self.lists[*l].items.push(slot),
        }
    }

    fn creates_cycle(&self, id: &str) -> bool {
        self.subject_stack
            .iter()
            .rev()
            .any(|(s, g)| s == id && *g == self.graph)
    }

    fn unique_embeds(&mut self) -> &mut HashMap<String, Parent> {
        self.unique_embeds.entry(self.graph.clone()).or_default()
    }

    fn slot_has_id(&self, slot: &Slot, id: &str) -> bool {
        matches!(slot, Slot::Node(n) if self.nodes[*n].id == id)
    }

    /// Replace the earlier embed of `id` by a reference and forget the
    /// embeds that hung off it.
    fn remove_embed(&mut self, id: &str) {
        let Some(parent) = self.unique_embeds().get(id).cloned() else {
            return;
        };
        let reference = Slot::Node(self.new_reference(id));
        match &parent {
            Parent::Root | Parent::List(_) => {
                let position = {
                    let slots = match &parent {
                        Parent::List(l) => &self.lists[*l].items,
                        _ => &self.roots,
                    };
                    slots.iter().position(|s| self.slot_has_id(s, id))
                };
                if let Some(position) = position {
                    match &parent {
                        Parent::List(l) => self.lists[*l].items[position] = reference,
                        _ => self.roots[position] = reference,
                    }
                }
            }
            Parent::Node(n, edge) => {
                let drained: Vec<Slot> = self.nodes[*n].slots_mut(edge).drain(..).collect();
                let kept: Vec<Slot> = drained
                    .into_iter()
                    .filter(|s| !self.slot_has_id(s, id))
                    .collect();
                let slots = self.nodes[*n].slots_mut(edge);
                *slots = kept;
                slots.push(reference);
            }
        }
        self.remove_dependents(id);
    }

    fn remove_dependents(&mut self, id: &str) {
        let nodes = &self.nodes;
        let Some(embeds) = self.unique_embeds.get_mut(&self.graph) else {
            return;
        };
        let dependents: Vec<String> = embeds
            .iter()
            .filter(|(_, parent)| matches!(parent, Parent::Node(n, _) if nodes[*n].id == id))
            .map(|(next, _)| next.clone())
            .collect();
        for next in &dependents {
            embeds.remove(next);
        }
        for next in dependents {
            self.remove_dependents(&next);
        }
    }

    /// Run `f` with the current graph and embedded flag replaced.
    fn scoped<T>(
        &mut self,
        graph: Option<&str>,
        embedded: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved_graph = graph.map(|g| std::mem::replace(&mut self.graph, g.to_string()));
        let saved_embedded = std::mem::replace(&mut self.embedded, embedded);
        let result = f(self);
        if let Some(g) = saved_graph {
            self.graph = g;
        }
        self.embedded = saved_embedded;
        result
    }

    /// The framed output as expanded items. Blank node ids used only once
    /// are dropped when `prune_blank_ids` is set.
    pub(crate) fn into_items(self, prune_blank_ids: bool) -> Vec<Item> {
        let pruned: HashSet<&str> = if prune_blank_ids {
            self.blank_uses
                .iter()
                .filter(|(_, uses)| **uses == 1)
                .map(|(id, _)| id.as_str())
                .collect()
        } else {
            HashSet::new()
        };
        let mut stack = Vec::new();
        self.roots
            .iter()
            .map(|slot| self.materialize(slot, &pruned, &mut stack))
            .collect()
    }

    fn materialize(&self, slot: &Slot, pruned: &HashSet<&str>, stack: &mut Vec<usize>) -> Item {
        match slot {
            Slot::Value(item) => item.clone(),
            Slot::List(l) => {
                let list = &self.lists[*l];
                Item::List(List {
                    items: self.materialize_all(&list.items, pruned, stack),
                    index: list.index.clone(),
                })
            }
            Slot::Node(n) => {
                let out = &self.nodes[*n];
                let id = (!pruned.contains(out.id.as_str())).then(|| out.id.clone());
                // a linked node reachable from itself is written as a reference
                if stack.contains(n) {
                    return Item::Node(Node {
                        id,
                        ..Default::default()
                    });
                }
                stack.push(*n);
                let node = Node {
                    id,
                    types: out.types.clone(),
                    index: out.index.clone(),
                    graph: out
                        .graph
                        .as_ref()
                        .map(|slots| self.materialize_all(slots, pruned, stack)),
                    included: out
                        .included
                        .as_ref()
                        .map(|slots| self.materialize_all(slots, pruned, stack)),
                    reverse: out
                        .reverse
                        .iter()
                        .map(|(p, slots)| (p.clone(), self.materialize_all(slots, pruned, stack)))
                        .collect(),
                    properties: out
                        .properties
                        .iter()
                        .map(|(p, slots)| (p.clone(), self.materialize_all(slots, pruned, stack)))
                        .collect(),
                };
                stack.pop();
                Item::Node(node)
            }
        }
    }

    fn materialize_all(&self, slots: &[Slot], pruned: &HashSet<&str>, stack: &mut Vec<usize>) -> Vec<Item> {
        slots
            .iter()
            .map(|slot| self.materialize(slot, pruned, stack))
            .collect()
    }
}

/// One frame level being applied.
struct Level<'f> {
    frame: &'f Frame,
    flags: Flags,
    /// Frame for values whose property the frame does not mention.
    implicit: Frame,
    subject_ids: &'f [String],
}

/// Embeds subjects of a node map into the output of a [`FrameState`].
pub(crate) struct Framer<'a> {
    options: &'a JsonLdOptions,
    graphs: &'a BTreeMap<String, Subjects>,
}

impl<'a> Framer<'a> {
    pub(crate) fn new(options: &'a JsonLdOptions, graphs: &'a BTreeMap<String, Subjects>) -> Self {
        Self { options, graphs }
    }

    /// Frame the subjects `subject_ids` of the current graph of `state`
    /// against `frame`, adding the output under `parent`.
    pub(crate) fn frame(
        &self,
        state: &mut FrameState,
        subject_ids: &[String],
        frame: &Frame,
        parent: Parent,
    ) -> Result<()> {
        let flags = frame.flags.resolve(self.options);
        let Some(subjects) = self.graphs.get(&state.graph) else {
            return Ok(());
        };

        let mut matches: Vec<(&String, &Node)> = subject_ids
            .iter()
            .filter_map(|id| subjects.get_key_value(id))
            .filter(|(id, node)| filter_subject(subjects, id, node, frame, flags.require_all))
            .collect();
        matches.sort_by(|a, b| a.0.cmp(b.0));
        matches.dedup_by(|a, b| a.0 == b.0);
        tracing::trace!(graph = state.graph.as_str(), matches = matches.len(), "frame level");

        let level = Level {
            frame,
            flags,
            implicit: Frame::implicit(&flags),
            subject_ids,
        };
        for (id, node) in matches {
            let graph = state.graph.clone();
            if matches!(parent, Parent::Root) {
                state.unique_embeds = HashMap::from([(graph.clone(), HashMap::new())]);
            } else {
                state.unique_embeds();
            }

            if flags.embed == Embed::Link {
                let linked = state.link.get(&graph).and_then(|l| l.get(id)).copied();
                if let Some(linked) = linked {
                    state.add_output(&parent, Slot::Node(linked));
                    continue;
                }
            }

            let out = state.new_node(id);
            state.link.entry(graph.clone()).or_default().insert(id.clone(), out);

            let already_embedded = state.unique_embeds().contains_key(id);
            if !state.embedded && already_embedded {
                continue;
            }
            if state.embedded && (flags.embed == Embed::Never || state.creates_cycle(id)) {
                state.add_output(&parent, Slot::Node(out));
                continue;
            }
            if state.embedded && flags.embed == Embed::Once && already_embedded {
                state.add_output(&parent, Slot::Node(out));
                continue;
            }
            if flags.embed == Embed::Last && already_embedded {
                state.remove_embed(id);
            }
            state.unique_embeds().insert(id.clone(), parent.clone());

            if state.subject_stack.len() >= MAX_FRAME_DEPTH {
                return Err(JsonLdError::frame(
                    ErrorKind::FrameStackTooDeep,
                    format!("more than {} nested embeds", MAX_FRAME_DEPTH),
                ));
            }
            state.subject_stack.push((id.clone(), graph.clone()));
            self.embed_subject(state, &level, id, node, out)?;
            state.add_output(&parent, Slot::Node(out));
            state.subject_stack.pop();
        }
        Ok(())
    }

    fn embed_subject(
        &self,
        state: &mut FrameState,
        level: &Level<'_>,
        id: &str,
        node: &Node,
        out: usize,
    ) -> Result<()> {
        let Level {
            frame,
            flags,
            implicit,
            ..
        } = level;
        let implicit: &Frame = implicit;

        if let Some(named) = self.graphs.get(id) {
            let default_frame = Frame::default();
            let (recurse, subframe) = match &frame.graph {
                None => (state.graph != MERGED_GRAPH, &default_frame),
                Some(sub) => (id != MERGED_GRAPH && id != DEFAULT_GRAPH, sub.as_ref()),
            };
            if recurse {
                let ids: Vec<String> = named.keys().cloned().collect();
                state.scoped(Some(id), false, |state| {
                    self.frame(state, &ids, subframe, Parent::Node(out, Edge::Graph))
                })?;
            }
        }

        if let Some(included) = &frame.included {
            state.scoped(None, false, |state| {
                self.frame(state, level.subject_ids, included, Parent::Node(out, Edge::Included))
            })?;
        }

        let types = node.types.clone();
        for t in &types {
            state.count_blank(t);
        }
        state.nodes[out].types = types;
        state.nodes[out].index = node.index.clone();

        for (property, values) in &node.properties {
            let pattern = frame.properties.get(property);
            if flags.explicit && pattern.is_none() {
                continue;
            }
            let subframe = pattern.and_then(Pattern::node_frame).unwrap_or(implicit);
            let edge = Edge::Property(property.clone());
            for value in values {
                match value {
                    Item::List(list) => {
                        let list_frame = match pattern {
                            Some(Pattern::List(Some(inner))) => inner.node_frame().unwrap_or(implicit),
                            _ => implicit,
                        };
                        let l = state.new_list(list.index.clone());
                        state.add_output(&Parent::Node(out, edge.clone()), Slot::List(l));
                        for item in &list.items {
                            match item.id().filter(|_| item.is_node()) {
                                Some(ref_id) => {
                                    let ids = vec![ref_id.to_string()];
                                    state.scoped(None, true, |state| {
                                        self.frame(state, &ids, list_frame, Parent::List(l))
                                    })?;
                                }
                                None => state.add_output(&Parent::List(l), Slot::Value(item.clone())),
                            }
                        }
                    }
                    item if item.is_node() => {
                        let ids: Vec<String> = item.id().map(str::to_string).into_iter().collect();
                        state.scoped(None, true, |state| {
                            self.frame(state, &ids, subframe, Parent::Node(out, edge.clone()))
                        })?;
                    }
                    other => {
                        if value_matches(pattern, other) {
                            state.add_output(&Parent::Node(out, edge.clone()), Slot::Value(other.clone()));
                        }
                    }
                }
            }
        }

        self.add_defaults(state, out, frame);

        for (property, subframe) in &frame.reverse {
            let Some(subjects) = self.graphs.get(&state.graph) else {
                break;
            };
            let referrers: Vec<String> = subjects
                .iter()
                .filter(|(_, s)| {
                    s.properties
                        .get(property)
                        .is_some_and(|vs| vs.iter().any(|v| v.id() == Some(id)))
                })
                .map(|(sid, _)| sid.clone())
                .collect();
            for referrer in referrers {
                let edge = Edge::Reverse(property.clone());
                state.nodes[out].slots_mut(&edge);
                state.scoped(None, true, |state| {
                    self.frame(state, &[referrer], subframe, Parent::Node(out, edge))
                })?;
            }
        }
        Ok(())
    }

    /// Placeholders for frame properties the subject has no output for:
    /// the property frame's `@default`, or null. `@omitDefault` is read
    /// from the property frame itself, then the options; the enclosing
    /// frame's flag does not apply.
    fn add_defaults(&self, state: &mut FrameState, out: usize, frame: &Frame) {
        for (property, pattern) in &frame.properties {
            let omit_default = pattern
                .node_frame()
                .and_then(|f| f.flags.omit_default)
                .unwrap_or(self.options.omit_default);
            if omit_default || state.nodes[out].properties.contains_key(property) {
                continue;
            }
            let default = pattern.default_value().unwrap_or(&[Item::Null]);
            let slots = default.iter().cloned().map(Slot::Value).collect();
            state.nodes[out].properties.insert(property.clone(), slots);
        }

        if let Some(TypePattern::Values {
            default: Some(default),
            ..
        }) = &frame.types
        {
            if !self.options.omit_default && state.nodes[out].types.is_empty() {
                state.nodes[out].types.push(default.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::pattern::{FrameFlags, IdPattern};
    use crate::model::Literal;
    use pretty_assertions::assert_eq;

    const KNOWS: &str = "http://example.com/knows";

    fn graphs() -> BTreeMap<String, Subjects> {
        let mut a = Node::with_id("http://example.com/a");
        a.properties.insert(KNOWS.to_string(), vec![Item::reference("http://example.com/b")]);
        let mut b = Node::with_id("http://example.com/b");
        b.properties.insert(KNOWS.to_string(), vec![Item::reference("http://example.com/a")]);
        b.properties.insert(
            "http://example.com/name".to_string(),
            vec![Item::Value(Literal::string("B"))],
        );

        let mut subjects = Subjects::new();
        subjects.insert("http://example.com/a".to_string(), a);
        subjects.insert("http://example.com/b".to_string(), b);
        BTreeMap::from([(DEFAULT_GRAPH.to_string(), subjects)])
    }

    fn run_on(
        graphs: &BTreeMap<String, Subjects>,
        frame: &Frame,
        ids: &[&str],
        options: &JsonLdOptions,
    ) -> Result<Vec<Item>> {
        let mut state = FrameState::new(DEFAULT_GRAPH);
        let ids: Vec<String> = ids.iter().map(|s| s.to_string()).collect();
        Framer::new(options, graphs).frame(&mut state, &ids, frame, Parent::Root)?;
        Ok(state.into_items(true))
    }

    fn run(frame: &Frame, ids: &[&str], options: &JsonLdOptions) -> Vec<Item> {
        run_on(&graphs(), frame, ids, options).unwrap()
    }

    fn knows(item: &Item) -> &Item {
        &item.as_node().unwrap().properties[KNOWS][0]
    }

    #[test]
    fn test_cycle_becomes_reference_under_always() {
        let options = JsonLdOptions::default().with_embed(Embed::Always);
        let out = run(&Frame::default(), &["http://example.com/a"], &options);

        assert_eq!(out.len(), 1);
        let b = knows(&out[0]);
        assert_eq!(b.id(), Some("http://example.com/b"));
        assert!(!b.is_reference());
        let back = knows(b);
        assert!(back.is_reference());
        assert_eq!(back.id(), Some("http://example.com/a"));
    }

    #[test]
    fn test_never_only_references() {
        let options = JsonLdOptions::default().with_embed(Embed::Never);
        let out = run(&Frame::default(), &["http://example.com/a"], &options);
        assert!(knows(&out[0]).is_reference());
    }

    #[test]
    fn test_link_shares_output_without_looping() {
        let options = JsonLdOptions::default().with_embed(Embed::Link);
        let out = run(
            &Frame::default(),
            &["http://example.com/a", "http://example.com/b"],
            &options,
        );
        assert_eq!(out.len(), 2);
        let b = knows(&out[0]);
        assert_eq!(b.id(), Some("http://example.com/b"));
        assert!(!b.is_reference());
    }

    #[test]
    fn test_defaults_fill_missing_properties() {
        let mut nick = Frame::default();
        nick.default = Some(vec![Item::Value(Literal::string("none"))]);
        let mut frame = Frame {
            id: Some(IdPattern::Values(vec!["http://example.com/b".to_string()])),
            ..Default::default()
        };
        frame
            .properties
            .insert("http://example.com/nick".to_string(), Pattern::Node(nick));
        frame
            .properties
            .insert("http://example.com/age".to_string(), Pattern::Node(Frame::default()));

        let out = run(&frame, &["http://example.com/b"], &JsonLdOptions::default());
        let node = out[0].as_node().unwrap();
        assert_eq!(
            node.properties["http://example.com/nick"][0]
                .as_literal()
                .and_then(|l| l.value.as_str()),
            Some("none")
        );
        assert_eq!(node.properties["http://example.com/age"], vec![Item::Null]);
        assert!(node.properties.contains_key("http://example.com/name"));
    }

    #[test]
    fn test_last_replaces_earlier_embed() {
        let mut a = Node::with_id("http://example.com/a");
        a.properties.insert("http://example.com/p1".to_string(), vec![Item::reference("http://example.com/b")]);
        a.properties.insert("http://example.com/p2".to_string(), vec![Item::reference("http://example.com/b")]);
        let mut b = Node::with_id("http://example.com/b");
        b.properties.insert(
            "http://example.com/name".to_string(),
            vec![Item::Value(Literal::string("B"))],
        );
        let graphs = BTreeMap::from([(
            DEFAULT_GRAPH.to_string(),
            Subjects::from([("http://example.com/a".to_string(), a), ("http://example.com/b".to_string(), b)]),
        )]);

        let frame_with = |embed| {
            let options = JsonLdOptions::default().with_embed(embed);
            let mut state = FrameState::new(DEFAULT_GRAPH);
            Framer::new(&options, &graphs)
                .frame(&mut state, &["http://example.com/a".to_string()], &Frame::default(), Parent::Root)
                .unwrap();
            let out = state.into_items(true);
            let node = out[0].as_node().unwrap().clone();
            let p1 = node.properties["http://example.com/p1"][0].is_reference();
            let p2 = node.properties["http://example.com/p2"][0].is_reference();
            (p1, p2)
        };

        assert_eq!(frame_with(Embed::Once), (false, true));
        assert_eq!(frame_with(Embed::Last), (true, false));
        assert_eq!(frame_with(Embed::Always), (false, false));
    }

    // =========================================================================
    // Reverse properties, named graphs, @included
    // =========================================================================

    #[test]
    fn test_reverse_referrer_already_embedded_is_referenced() {
        let mut frame = Frame {
            id: Some(IdPattern::Values(vec!["http://example.com/a".to_string()])),
            ..Default::default()
        };
        frame.reverse.insert(KNOWS.to_string(), Frame::default());

        let options = JsonLdOptions::default().with_embed(Embed::Once);
        let out = run(&frame, &["http://example.com/a", "http://example.com/b"], &options);
        assert_eq!(out.len(), 1);
        let a = out[0].as_node().unwrap();

        // b is embedded under knows first, so the reverse entry links back to it
        assert!(!knows(&out[0]).is_reference());
        let referrers = &a.reverse[KNOWS];
        assert_eq!(referrers.len(), 1);
        assert!(referrers[0].is_reference());
        assert_eq!(referrers[0].id(), Some("http://example.com/b"));
    }

    #[test]
    fn test_reverse_referrer_embedded_when_not_seen() {
        let mut frame = Frame {
            id: Some(IdPattern::Values(vec!["http://example.com/a".to_string()])),
            flags: FrameFlags {
                explicit: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        frame.reverse.insert(KNOWS.to_string(), Frame::default());

        let out = run(&frame, &["http://example.com/a"], &JsonLdOptions::default());
        let referrer = &out[0].as_node().unwrap().reverse[KNOWS][0];
        let b = referrer.as_node().unwrap();
        assert_eq!(b.id.as_deref(), Some("http://example.com/b"));
        assert!(b.properties.contains_key("http://example.com/name"));
        // a is still on the stack
        assert!(b.properties[KNOWS][0].is_reference());
    }

    #[test]
    fn test_named_graph_subjects_start_unembedded() {
        let mut member = Node::with_id("http://example.com/s");
        member.properties.insert(
            "http://example.com/name".to_string(),
            vec![Item::Value(Literal::string("S"))],
        );
        let graphs = BTreeMap::from([
            (
                DEFAULT_GRAPH.to_string(),
                Subjects::from([(
                    "http://example.com/g".to_string(),
                    Node::with_id("http://example.com/g"),
                )]),
            ),
            (
                "http://example.com/g".to_string(),
                Subjects::from([("http://example.com/s".to_string(), member)]),
            ),
        ]);

        let options = JsonLdOptions::default().with_embed(Embed::Never);
        let out = run_on(&graphs, &Frame::default(), &["http://example.com/g"], &options).unwrap();
        let graph = out[0].as_node().unwrap().graph.as_ref().unwrap();
        assert_eq!(graph.len(), 1);
        assert!(!graph[0].is_reference());
        assert!(graph[0]
            .as_node()
            .unwrap()
            .properties
            .contains_key("http://example.com/name"));
    }

    #[test]
    fn test_included_subjects_start_unembedded() {
        let frame = Frame {
            id: Some(IdPattern::Values(vec!["http://example.com/a".to_string()])),
            included: Some(Box::new(Frame::default())),
            ..Default::default()
        };
        let options = JsonLdOptions::default().with_embed(Embed::Never);
        let out = run(&frame, &["http://example.com/a", "http://example.com/b"], &options);

        let a = out[0].as_node().unwrap();
        let included = a.included.as_ref().unwrap();
        assert_eq!(included.len(), 1);
        let b = included[0].as_node().unwrap();
        assert_eq!(b.id.as_deref(), Some("http://example.com/b"));
        assert!(b.properties.contains_key("http://example.com/name"));
        assert!(knows(&out[0]).is_reference());
    }

    // =========================================================================
    // @omitDefault and depth limit
    // =========================================================================

    #[test]
    fn test_omit_default_not_inherited_from_enclosing_frame() {
        let mut frame = Frame {
            id: Some(IdPattern::Values(vec!["http://example.com/b".to_string()])),
            flags: FrameFlags {
                omit_default: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        frame
            .properties
            .insert("http://example.com/age".to_string(), Pattern::Node(Frame::default()));

        let out = run(&frame, &["http://example.com/b"], &JsonLdOptions::default());
        assert_eq!(
            out[0].as_node().unwrap().properties["http://example.com/age"],
            vec![Item::Null]
        );

        let options = JsonLdOptions::default().with_omit_default(true);
        let out = run(&frame, &["http://example.com/b"], &options);
        assert!(!out[0]
            .as_node()
            .unwrap()
            .properties
            .contains_key("http://example.com/age"));
    }

    #[test]
    fn test_deep_embed_chain_is_rejected() {
        let chain = 300;
        let mut subjects = Subjects::new();
        for i in 0..chain {
            let mut node = Node::with_id(format!("http://example.com/n{}", i));
            node.properties.insert(
                KNOWS.to_string(),
                vec![Item::reference(format!("http://example.com/n{}", i + 1))],
            );
            subjects.insert(format!("http://example.com/n{}", i), node);
        }
        let graphs = BTreeMap::from([(DEFAULT_GRAPH.to_string(), subjects)]);

        // debug builds recurse with large frames
        let err = std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(move || {
                let options = JsonLdOptions::default().with_embed(Embed::Always);
                run_on(&graphs, &Frame::default(), &["http://example.com/n0"], &options).unwrap_err()
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::FrameStackTooDeep);
    }
}
