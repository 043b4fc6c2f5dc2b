// The precedence relation: a directed graph of "strictly higher precedence
// than" edges between token numbers, with equivalence-class grouping,
// transitive reduction, and DOT emission (spec.md §4.4).
use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use crate::diagnostics::DiagnosticSink;
use crate::symbol::{Assoc, Symbol};

#[derive(Debug, Clone, Default)]
struct PrecNode {
    id: u32,
    succ: Vec<u32>,
    pred: Vec<u32>,
    is_group: bool,
    group_members: Vec<u32>,
    member_of: Option<u32>,
}

impl PrecNode {
    fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }
}

fn insert_sorted(list: &mut Vec<u32>, value: u32) -> bool {
    match list.binary_search(&value) {
        Ok(_) => false,
        Err(pos) => {
            list.insert(pos, value);
            true
        }
    }
}

fn remove_sorted(list: &mut Vec<u32>, value: u32) {
    if let Ok(pos) = list.binary_search(&value) {
        list.remove(pos);
    }
}

/// A pair of node ids that a DOT edge connects; remembers whether either
/// endpoint is a group so `ltail`/`lhead` can be emitted.
#[derive(Debug, Clone, Copy)]
pub struct Edge {
    pub from: u32,
    pub to: u32,
}

pub struct PrecedenceGraph {
    nodes: Vec<PrecNode>,
    used_assoc: Vec<bool>,
}

impl PrecedenceGraph {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            used_assoc: Vec::new(),
        }
    }

    fn ensure(&mut self, id: u32) {
        while (self.nodes.len() as u32) <= id {
            let next_id = self.nodes.len() as u32;
            self.nodes.push(PrecNode::new(next_id));
        }
    }

    fn ensure_assoc(&mut self, id: u32) {
        while (self.used_assoc.len() as u32) <= id {
            self.used_assoc.push(false);
        }
    }

    /// `register_precedence(hi, lo)`: `hi` has strictly higher precedence
    /// than `lo`. Duplicate registrations are no-ops.
    pub fn register_precedence(&mut self, hi: u32, lo: u32) {
        self.ensure(hi.max(lo));
        if insert_sorted(&mut self.nodes[hi as usize].succ, lo) {
            insert_sorted(&mut self.nodes[lo as usize].pred, hi);
        }
    }

    pub fn register_assoc(&mut self, i: u32, j: u32) {
        self.ensure_assoc(i.max(j));
        self.used_assoc[i as usize] = true;
        self.used_assoc[j as usize] = true;
    }

    fn used_assoc_of(&self, number: u32) -> bool {
        self.used_assoc.get(number as usize).copied().unwrap_or(false)
    }

    pub fn warn_unused(&self, sink: &Rc<dyn DiagnosticSink>, symbols: &[Symbol]) {
        for symbol in symbols {
            if !symbol.is_token() {
                continue;
            }
            let number = match symbol.number() {
                Some(n) => n,
                None => continue,
            };
            if symbol.prec() != 0 {
                let node = self.nodes.get(number as usize);
                let no_edges = node.map_or(true, |n| n.succ.is_empty() && n.pred.is_empty());
                if no_edges && symbol.assoc() == Assoc::Precedence {
                    sink.warn_precedence(
                        &symbol.location(),
                        &format!("useless precedence for \"{}\"", symbol.name()),
                    );
                }
            }
            if symbol.assoc() != Assoc::Undef
                && symbol.assoc() != Assoc::Precedence
                && !self.used_assoc_of(number)
            {
                sink.warn_other(
                    Some(&symbol.location()),
                    &format!("useless associativity for \"{}\"", symbol.name()),
                );
            }
        }
    }

    fn roots(&self) -> Vec<u32> {
        self.nodes
            .iter()
            .filter(|n| !n.is_group && n.pred.is_empty() && !n.succ.is_empty())
            .map(|n| n.id)
            .collect()
    }

    fn filtered(&self, list: &[u32], group_candidate: &HashSet<u32>) -> Vec<u32> {
        list.iter()
            .copied()
            .filter(|id| !group_candidate.contains(id))
            .collect()
    }

    fn equivalent(&self, a: u32, b: u32, group_candidate: &HashSet<u32>) -> bool {
        self.filtered(&self.nodes[a as usize].succ, group_candidate)
            == self.filtered(&self.nodes[b as usize].succ, group_candidate)
            && self.filtered(&self.nodes[a as usize].pred, group_candidate)
                == self.filtered(&self.nodes[b as usize].pred, group_candidate)
    }

    /// Collapses nodes with identical successor/predecessor multisets
    /// (ignoring edges among the candidate members) into group nodes.
    /// Only the first DFS pass runs; the reference source's second,
    /// intra-group-edges-allowed pass is unconditionally skipped (spec.md
    /// §9 Open Question 1).
    pub fn group_relations(&mut self) {
        let roots = self.roots();
        let mut visited = HashSet::new();
        for root in roots {
            self.dfs_group(root, &mut visited);
        }
    }

    fn dfs_group(&mut self, n: u32, visited: &mut HashSet<u32>) {
        if visited.contains(&n) {
            return;
        }
        visited.insert(n);
        let succs = self.nodes[n as usize].succ.clone();
        let mut grouped: HashSet<u32> = HashSet::new();
        for &s in &succs {
            if grouped.contains(&s) || self.nodes[s as usize].member_of.is_some() {
                continue;
            }
            let mut candidate: HashSet<u32> = HashSet::new();
            candidate.insert(s);
            let mut class = vec![s];
            for &t in &succs {
                if t == s || grouped.contains(&t) || candidate.contains(&t) {
                    continue;
                }
                if self.equivalent(s, t, &candidate) {
                    candidate.insert(t);
                    class.push(t);
                }
            }
            if class.len() > 1 {
                self.make_group(&class);
                for &m in &class {
                    grouped.insert(m);
                }
            }
        }
        for &s in &succs {
            if !visited.contains(&s) {
                self.dfs_group(s, visited);
            }
        }
    }

    fn make_group(&mut self, members: &[u32]) {
        let candidate: HashSet<u32> = members.iter().copied().collect();
        let template = members[0];
        let succ = self.filtered(&self.nodes[template as usize].succ, &candidate);
        let pred = self.filtered(&self.nodes[template as usize].pred, &candidate);
        let group_id = self.nodes.len() as u32;
        let mut group = PrecNode::new(group_id);
        group.is_group = true;
        group.group_members = members.to_vec();
        group.succ = succ.clone();
        group.pred = pred.clone();
        self.nodes.push(group);

        for &p in &pred {
            for &m in members {
                remove_sorted(&mut self.nodes[p as usize].succ, m);
            }
            insert_sorted(&mut self.nodes[p as usize].succ, group_id);
        }
        for &s in &succ {
            for &m in members {
                remove_sorted(&mut self.nodes[s as usize].pred, m);
            }
            insert_sorted(&mut self.nodes[s as usize].pred, group_id);
        }
        for &m in members {
            self.nodes[m as usize].succ.clear();
            self.nodes[m as usize].pred.clear();
            self.nodes[m as usize].member_of = Some(group_id);
        }
    }

    fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for node in &self.nodes {
            for &s in &node.succ {
                edges.push(Edge { from: node.id, to: s });
            }
        }
        edges
    }

    /// Warshall's algorithm over the `n = nsyms + ngroups` node matrix,
    /// returning the minimal edge set whose closure equals the full
    /// closure (spec.md §4.4 "Transitive reduction").
    pub fn transitive_reduction(&self) -> Vec<Edge> {
        let n = self.nodes.len();
        let mut closure = vec![vec![false; n]; n];
        for node in &self.nodes {
            for &s in &node.succ {
                closure[node.id as usize][s as usize] = true;
            }
        }
        for k in 0..n {
            for i in 0..n {
                if closure[i][k] {
                    for j in 0..n {
                        if closure[k][j] {
                            closure[i][j] = true;
                        }
                    }
                }
            }
        }
        let mut via_intermediate = vec![vec![false; n]; n];
        for i in 0..n {
            for j in 0..n {
                if closure[i][j] {
                    for k in 0..n {
                        if closure[j][k] {
                            via_intermediate[i][k] = true;
                        }
                    }
                }
            }
        }
        let mut reduced = Vec::new();
        for i in 0..n {
            for k in 0..n {
                if closure[i][k] && !via_intermediate[i][k] {
                    reduced.push(Edge {
                        from: i as u32,
                        to: k as u32,
                    });
                }
            }
        }
        reduced
    }

    fn edge_color(&self, edge: &Edge) -> &'static str {
        let from_solo = self.nodes[edge.from as usize].succ.len() == 1;
        let to_solo = self.nodes[edge.to as usize].pred.len() == 1;
        match (from_solo, to_solo) {
            (true, true) => "red",
            (true, false) => "blue",
            (false, true) => "green",
            (false, false) => "black",
        }
    }

    fn node_label(&self, id: u32, symbols: &[Symbol]) -> String {
        symbols
            .iter()
            .find(|s| s.number() == Some(id))
            .map(|s| s.name())
            .unwrap_or_else(|| format!("n{}", id))
    }

    /// Emits the full relation graph: a `digraph` with a legend cluster,
    /// every group rendered as its own `subgraph cluster_<id>`, declared
    /// (by descending node id) before the members it contains.
    pub fn write_rel_dot_code<W: Write>(&self, symbols: &[Symbol], wtr: &mut W) -> io::Result<()> {
        self.write_dot_code(symbols, &self.edges(), wtr)
    }

    pub fn write_transitive_reduction_code<W: Write>(
        &self,
        symbols: &[Symbol],
        wtr: &mut W,
    ) -> io::Result<()> {
        self.write_dot_code(symbols, &self.transitive_reduction(), wtr)
    }

    fn write_dot_code<W: Write>(&self, symbols: &[Symbol], edges: &[Edge], wtr: &mut W) -> io::Result<()> {
        writeln!(wtr, "digraph precedence {{")?;
        writeln!(wtr, "  subgraph cluster_legend {{")?;
        writeln!(wtr, "    label=\"legend\";")?;
        writeln!(wtr, "    legend_red [label=\"mutual\", color=red];")?;
        writeln!(wtr, "    legend_blue [label=\"one-sided (out)\", color=blue];")?;
        writeln!(wtr, "    legend_green [label=\"one-sided (in)\", color=green];")?;
        writeln!(wtr, "  }}")?;

        let mut ids: Vec<u32> = self.nodes.iter().map(|n| n.id).collect();
        ids.sort_unstable_by(|a, b| b.cmp(a));
        for id in ids {
            let node = &self.nodes[id as usize];
            if node.is_group {
                writeln!(wtr, "  subgraph cluster_{} {{", id)?;
                for &m in &node.group_members {
                    writeln!(wtr, "    n{} [label=\"{}\"];", m, self.node_label(m, symbols))?;
                }
                writeln!(wtr, "  }}")?;
            } else if node.member_of.is_none() {
                writeln!(wtr, "  n{} [label=\"{}\"];", id, self.node_label(id, symbols))?;
            }
        }

        for edge in edges {
            let from = &self.nodes[edge.from as usize];
            let to = &self.nodes[edge.to as usize];
            let mut attrs = Vec::new();
            if from.is_group {
                attrs.push(format!("ltail=cluster_{}", from.id));
            }
            if to.is_group {
                attrs.push(format!("lhead=cluster_{}", to.id));
            }
            attrs.push(format!("color={}", self.edge_color(edge)));
            let from_anchor = from.group_members.first().copied().unwrap_or(from.id);
            let to_anchor = to.group_members.first().copied().unwrap_or(to.id);
            writeln!(wtr, "  n{} -> n{} [{}];", from_anchor, to_anchor, attrs.join(", "))?;
        }

        writeln!(wtr, "}}")
    }

    pub fn write_rel_dot_to_file(&self, symbols: &[Symbol], path: &Path) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_rel_dot_code(symbols, &mut file)
    }

    pub fn write_transitive_reduction_to_file(&self, symbols: &[Symbol], path: &Path) -> io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        self.write_transitive_reduction_code(symbols, &mut file)
    }

    #[cfg(test)]
    pub(crate) fn group_of(&self, member: u32) -> Option<u32> {
        self.nodes[member as usize].member_of
    }

    #[cfg(test)]
    pub(crate) fn successors(&self, id: u32) -> &[u32] {
        &self.nodes[id as usize].succ
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registering_an_edge_twice_is_idempotent() {
        let mut graph = PrecedenceGraph::new();
        graph.register_precedence(0, 1);
        graph.register_precedence(0, 1);
        assert_eq!(graph.successors(0), &[1]);
    }

    #[test]
    fn identical_successor_sets_form_a_group() {
        // A>X, A>Y, B>X, B>Y: A and B share {X, Y} so they group.
        let mut graph = PrecedenceGraph::new();
        let (a, b, x, y) = (0u32, 1u32, 2u32, 3u32);
        graph.register_precedence(a, x);
        graph.register_precedence(a, y);
        graph.register_precedence(b, x);
        graph.register_precedence(b, y);
        graph.group_relations();
        let group_a = graph.group_of(a).expect("A grouped");
        let group_b = graph.group_of(b).expect("B grouped");
        assert_eq!(group_a, group_b);
        assert_eq!(graph.successors(group_a), &[x, y]);
    }

    #[test]
    fn transitive_reduction_drops_the_shortcut_edge() {
        let mut graph = PrecedenceGraph::new();
        graph.register_precedence(0, 1);
        graph.register_precedence(1, 2);
        graph.register_precedence(0, 2);
        let reduced: HashSet<(u32, u32)> = graph
            .transitive_reduction()
            .into_iter()
            .map(|e| (e.from, e.to))
            .collect();
        assert!(reduced.contains(&(0, 1)));
        assert!(reduced.contains(&(1, 2)));
        assert!(!reduced.contains(&(0, 2)));
    }
}
