//! Facilities to generate a DOT representation of a DFA.

use super::{Dfa, StateId};

/// An edge is a transition, labelled with its alphabet symbol.
type Edge = (StateId, char, StateId);

impl<'a> dot::Labeller<'a, StateId, Edge> for Dfa {
    fn graph_id(&'a self) -> dot::Id<'a> {
        dot::Id::new("automaton").unwrap()
    }

    fn node_id(&'a self, n: &StateId) -> dot::Id<'a> {
        dot::Id::new(format!("q{}", n)).unwrap()
    }

    fn node_shape(&'a self, node: &StateId) -> Option<dot::LabelText<'a>> {
        if self.is_final(*node) {
            return Some(dot::LabelText::LabelStr("doublecircle".into()));
        }

        None
    }

    fn node_label(&'a self, n: &StateId) -> dot::LabelText<'a> {
        if *n == 0 {
            return dot::LabelText::LabelStr(format!("{} (Init)", self.node_id(n).name()).into());
        }
        dot::LabelText::LabelStr(self.node_id(n).name())
    }

    fn edge_label(&'a self, e: &Edge) -> dot::LabelText<'a> {
        dot::LabelText::LabelStr(e.1.to_string().into())
    }

    fn kind(&self) -> dot::Kind {
        dot::Kind::Digraph
    }
}

impl<'a> dot::GraphWalk<'a, StateId, Edge> for Dfa {
    fn nodes(&'a self) -> dot::Nodes<'a, StateId> {
        (0..self.num_states()).collect::<Vec<_>>().into()
    }

    fn edges(&'a self) -> dot::Edges<'a, Edge> {
        let mut edges: Vec<Edge> = vec![];
        for q in 0..self.num_states() {
            for (symbol, &c) in self.alphabet().iter().enumerate() {
                if let Some(to) = self.transition(q, symbol) {
                    edges.push((q, c, to));
                }
            }
        }
        edges.into()
    }

    fn source(&'a self, edge: &Edge) -> StateId {
        edge.0
    }

    fn target(&'a self, edge: &Edge) -> StateId {
        edge.2
    }
}

impl Dfa {
    /// Returns the DOT representation of the automaton.
    /// The DOT representation can be used to visualize the automaton using Graphviz.
    pub fn dot(&self) -> String {
        let mut buf = Vec::new();
        dot::render(self, &mut buf).unwrap();
        String::from_utf8(buf).expect("Failed to convert DOT to string")
    }
}
