use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt;

use log::{debug, trace};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};

use super::tableau::{build_tableau, Branch};
use super::{Limit, Mode, Params, TableauErr, TableauResult};
use crate::calculus::{Calculus, CloseMsg};
use crate::logic::{canonicalize, AgentId, Formula};
use crate::parse::parse_formula_list;
use crate::tamper_protect::{seal, ProtectedState};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    /// Temporal successor.
    Next,
    /// Accessibility relation of an agent.
    Agent(AgentId),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Next => write!(f, "n"),
            Label::Agent(a) => write!(f, "R{a}"),
        }
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "n" {
            return Ok(Label::Next);
        }
        match s.strip_prefix('R') {
            Some(id) if id.chars().all(|c| c.is_ascii_digit()) => {
                Ok(Label::Agent(AgentId::new(id)))
            }
            _ => Err(de::Error::custom(format!("Invalid edge label '{s}'"))),
        }
    }
}

/// The formula content of a saturated open branch, sorted and free of
/// duplicates. Two states are the same node iff their contents are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State(Vec<Formula>);

impl State {
    pub fn from_branch(branch: &Branch) -> Self {
        let mut formulae: Vec<Formula> = branch.formulae().cloned().collect();
        formulae.sort();
        formulae.dedup();
        State(formulae)
    }

    pub fn formulae(&self) -> &[Formula] {
        &self.0
    }

    pub fn contains(&self, f: &Formula) -> bool {
        self.0.binary_search(f).is_ok()
    }

    fn digest(&self) -> StateDigest {
        let mut hasher = Sha3_256::new();
        for f in &self.0 {
            hasher.update(f.to_string());
            hasher.update(b"\n");
        }
        StateDigest(hasher.finalize().into())
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fs: Vec<String> = self.0.iter().map(|x| x.to_string()).collect();
        write!(f, "{{{}}}", fs.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StateDigest([u8; 32]);

#[derive(Debug, Clone, Copy, Default)]
struct Visited {
    knowledge: bool,
    belief: bool,
    next: bool,
}

#[derive(Debug)]
struct GraphNode {
    state: State,
    visited: Vec<Visited>,
    contract_visited: bool,
    negated_agents: BTreeSet<AgentId>,
    edges: BTreeSet<(usize, Label)>,
    removed: bool,
}

impl GraphNode {
    fn new(state: State) -> Self {
        let visited = vec![Visited::default(); state.0.len()];
        Self {
            state,
            visited,
            contract_visited: false,
            negated_agents: BTreeSet::new(),
            edges: BTreeSet::new(),
            removed: false,
        }
    }

    fn has_successor<P: Fn(&State) -> bool>(
        &self,
        nodes: &[GraphNode],
        label: &Label,
        pred: P,
    ) -> bool {
        self.edges
            .iter()
            .any(|(to, l)| l == label && !nodes[*to].removed && pred(&nodes[*to].state))
    }
}

/// Reason a node does not survive contraction.
#[derive(Debug)]
enum Defect<'a> {
    Eventuality(&'a Formula),
    NoNext(&'a Formula),
    NoWitness(&'a Formula),
}

impl<'a> fmt::Display for Defect<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Defect::Eventuality(x) => write!(f, "eventuality {x} is never fulfilled"),
            Defect::NoNext(x) => write!(f, "{x} has no temporal successor"),
            Defect::NoWitness(x) => write!(f, "{x} has no accessible witness"),
        }
    }
}

struct GraphBuilder<'p> {
    params: &'p Params,
    nodes: Vec<GraphNode>,
    index: HashMap<StateDigest, usize>,
    modified: bool,
}

impl<'p> GraphBuilder<'p> {
    fn new(params: &'p Params) -> Self {
        Self {
            params,
            nodes: vec![],
            index: HashMap::new(),
            modified: false,
        }
    }

    /// Returns the node holding `state`, creating it if necessary.
    fn add_state(&mut self, state: State) -> TableauResult<usize> {
        let digest = state.digest();
        if let Some(&id) = self.index.get(&digest) {
            return Ok(id);
        }

        let max = self.params.budget.max_nodes;
        if self.nodes.len() >= max {
            debug!("pseudo-model exceeded {max} states");
            return Err(TableauErr::BudgetExceeded(Limit::Nodes, max));
        }

        let id = self.nodes.len();
        trace!("new state {id}: {state}");
        self.nodes.push(GraphNode::new(state));
        self.index.insert(digest, id);
        self.modified = true;
        Ok(id)
    }

    fn add_edge(&mut self, from: usize, to: usize, label: Label) {
        if self.nodes[from].edges.insert((to, label)) {
            self.modified = true;
        }
    }

    /// Saturates `seed` and links every resulting state as a successor of `from`.
    fn link_successors(&mut self, from: usize, seed: &[Formula], label: Label) -> TableauResult<()> {
        let branches = match build_tableau(seed, self.params) {
            Ok(branches) => branches,
            Err(TableauErr::Unsatisfiable) => {
                trace!("{label} successor of {from} is unsatisfiable");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        for b in &branches {
            let to = self.add_state(State::from_branch(b))?;
            self.add_edge(from, to, label.clone());
        }
        Ok(())
    }

    fn build(&mut self) -> TableauResult<()> {
        self.modified = true;
        while self.modified {
            self.modified = false;
            self.build_knowledge_successors()?;
            self.build_temporal_successors()?;
        }
        debug!("graph construction produced {} states", self.nodes.len());
        Ok(())
    }

    fn build_knowledge_successors(&mut self) -> TableauResult<()> {
        let mut n = 0;
        while n < self.nodes.len() {
            for i in 0..self.nodes[n].visited.len() {
                if self.nodes[n].visited[i].knowledge {
                    continue;
                }
                self.nodes[n].visited[i].knowledge = true;

                let state = &self.nodes[n].state;
                let Some((agent, body)) = state.0[i].negated_knowledge() else {
                    continue;
                };
                let agent = agent.clone();
                let seed = negated_knowledge_seed(state, &agent, body);
                self.nodes[n].negated_agents.insert(agent.clone());
                self.link_successors(n, &seed, Label::Agent(agent))?;
            }

            match self.params.mode {
                Mode::Belief => self.build_belief_successors(n)?,
                Mode::Knowledge => self.add_reflexive_edges(n),
            }
            n += 1;
        }
        Ok(())
    }

    fn build_belief_successors(&mut self, n: usize) -> TableauResult<()> {
        for i in 0..self.nodes[n].visited.len() {
            if self.nodes[n].visited[i].belief {
                continue;
            }
            self.nodes[n].visited[i].belief = true;

            let node = &self.nodes[n];
            let agent = match node.state.0[i].knowledge() {
                Some((agent, _)) if !node.negated_agents.contains(agent) => agent.clone(),
                _ => continue,
            };
            let seed = knowledge_seed(&node.state, &agent);
            self.link_successors(n, &seed, Label::Agent(agent))?;
        }
        Ok(())
    }

    fn add_reflexive_edges(&mut self, n: usize) {
        let agents: BTreeSet<AgentId> = self.nodes[n]
            .state
            .0
            .iter()
            .filter_map(|f| f.knowledge().or_else(|| f.negated_knowledge()))
            .map(|(a, _)| a.clone())
            .collect();
        for a in agents {
            self.add_edge(n, n, Label::Agent(a));
        }
    }

    fn build_temporal_successors(&mut self) -> TableauResult<()> {
        let mut n = 0;
        while n < self.nodes.len() {
            let node = &mut self.nodes[n];
            let mut seed = vec![];
            let mut pending = false;
            for (f, v) in node.state.0.iter().zip(node.visited.iter_mut()) {
                if let Some(op) = f.next_operand() {
                    seed.push(op.clone());
                    pending |= !v.next;
                    v.next = true;
                }
            }
            if pending {
                self.link_successors(n, &seed, Label::Next)?;
            }
            n += 1;
        }
        Ok(())
    }

    fn contract(&mut self) {
        let mut modified = true;
        while modified {
            modified = false;
            for n in 0..self.nodes.len() {
                if self.nodes[n].removed || self.nodes[n].contract_visited {
                    continue;
                }
                if let Some(defect) = self.defect(n) {
                    debug!("removing state {n}: {defect}");
                    self.remove_node(n);
                    modified = true;
                    break;
                }
                self.nodes[n].contract_visited = true;
            }
        }
    }

    fn defect(&self, n: usize) -> Option<Defect<'_>> {
        let node = &self.nodes[n];
        for f in node.state.formulae() {
            if let Some(target) = f.eventuality_target() {
                if !self.fulfils(n, target) {
                    return Some(Defect::Eventuality(f));
                }
            }
            if f.next_operand().is_some() && !node.has_successor(&self.nodes, &Label::Next, |_| true)
            {
                return Some(Defect::NoNext(f));
            }
            if let Some((agent, body)) = f.negated_knowledge() {
                let witness = canonicalize(&Formula::not(body.clone()));
                let label = Label::Agent(agent.clone());
                if !node.has_successor(&self.nodes, &label, |s| s.contains(&witness)) {
                    return Some(Defect::NoWitness(f));
                }
            }
            if self.params.mode.is_belief() {
                if let Some((agent, body)) = f.knowledge() {
                    let label = Label::Agent(agent.clone());
                    if !node.negated_agents.contains(agent)
                        && !node.has_successor(&self.nodes, &label, |s| s.contains(body))
                    {
                        return Some(Defect::NoWitness(f));
                    }
                }
            }
        }
        None
    }

    /// Breadth-first search along temporal edges, starting at `n` itself.
    fn fulfils(&self, n: usize, target: &Formula) -> bool {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([n]);
        seen[n] = true;

        while let Some(cur) = queue.pop_front() {
            let node = &self.nodes[cur];
            if node.state.contains(target) {
                return true;
            }
            for (to, label) in &node.edges {
                if *label == Label::Next && !seen[*to] && !self.nodes[*to].removed {
                    seen[*to] = true;
                    queue.push_back(*to);
                }
            }
        }
        false
    }

    fn remove_node(&mut self, n: usize) {
        let digest = self.nodes[n].state.digest();
        self.index.remove(&digest);

        let node = &mut self.nodes[n];
        node.removed = true;
        node.edges.clear();

        for node in &mut self.nodes {
            node.edges.retain(|(to, _)| *to != n);
            node.contract_visited = false;
        }
    }

    fn into_graph(self) -> Graph {
        let mut ids = vec![None; self.nodes.len()];
        let mut next = 0;
        for (i, node) in self.nodes.iter().enumerate() {
            if !node.removed {
                ids[i] = Some(next);
                next += 1;
            }
        }

        let mut states = vec![];
        let mut edges = vec![];
        let mut agents = BTreeSet::new();
        for (i, node) in self.nodes.into_iter().enumerate() {
            let Some(source) = ids[i] else {
                continue;
            };
            for (to, label) in node.edges {
                if let Some(target) = ids[to] {
                    edges.push(Edge {
                        source,
                        target,
                        label,
                    });
                }
            }
            agents.extend(
                node.state
                    .0
                    .iter()
                    .filter_map(|f| f.knowledge().or_else(|| f.negated_knowledge()))
                    .map(|(a, _)| a.clone()),
            );
            states.push(node.state);
        }

        Graph {
            states,
            edges,
            agents,
        }
    }
}

fn knowledge_seed(state: &State, agent: &AgentId) -> Vec<Formula> {
    let mut seed = vec![];
    for f in state.formulae() {
        if let Some((a, body)) = f.knowledge() {
            if a == agent {
                seed.push(f.clone());
                seed.push(body.clone());
            }
        }
    }
    seed
}

fn negated_knowledge_seed(state: &State, agent: &AgentId, body: &Formula) -> Vec<Formula> {
    let mut seed = vec![canonicalize(&Formula::not(body.clone()))];
    seed.extend(knowledge_seed(state, agent));
    seed.extend(
        state
            .formulae()
            .iter()
            .filter(|f| matches!(f.negated_knowledge(), Some((a, _)) if a == agent))
            .cloned(),
    );
    seed
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub label: Label,
}

/// A contracted pseudo-model. Node ids index into `states`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    states: Vec<State>,
    edges: Vec<Edge>,
    agents: BTreeSet<AgentId>,
}

impl Graph {
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn agents(&self) -> &BTreeSet<AgentId> {
        &self.agents
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn successors<'a>(&'a self, node: usize, label: &'a Label) -> impl Iterator<Item = usize> + 'a {
        self.edges
            .iter()
            .filter(move |e| e.source == node && e.label == *label)
            .map(|e| e.target)
    }
}

/// Builds and contracts the pseudo-model for the given open branches.
pub fn build_graph(branches: &[Branch], params: &Params) -> TableauResult<Graph> {
    let mut builder = GraphBuilder::new(params);
    for b in branches {
        builder.add_state(State::from_branch(b))?;
    }
    builder.build()?;
    builder.contract();

    let graph = builder.into_graph();
    debug!(
        "{} pseudo-model: {} states, {} edges",
        params.mode,
        graph.states.len(),
        graph.edges.len()
    );
    if graph.is_empty() {
        Err(TableauErr::Unsatisfiable)
    } else {
        Ok(graph)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GraphState {
    formulae: Vec<Formula>,
    mode: Mode,
    graph: Option<Graph>,
    seal: String,
}

impl ProtectedState for GraphState {
    fn compute_seal_info(&self) -> String {
        let formulae = self
            .formulae
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let graph = match &self.graph {
            Some(g) => {
                let states = g
                    .states
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("|");
                let edges = g
                    .edges
                    .iter()
                    .map(|e| format!("({},{},{})", e.source, e.target, e.label))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("[{states}]|[{edges}]")
            }
            None => "null".to_string(),
        };
        format!(
            "tableau|{}|{}|{}",
            self.mode.to_string().to_uppercase(),
            formulae,
            graph
        )
    }
}

impl GraphState {
    pub fn new(formulae: Vec<Formula>, mode: Mode, graph: Option<Graph>) -> Self {
        let mut state = Self {
            formulae,
            mode,
            graph,
            seal: String::new(),
        };
        state.seal = seal(state.compute_seal_info());
        state
    }

    pub fn formulae(&self) -> &[Formula] {
        &self.formulae
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }
}

/// The full decision procedure: tableau followed by pseudo-model construction.
pub struct GraphTableau<'f> {
    _f: &'f str,
}

impl<'f> Calculus<'f> for GraphTableau<'f> {
    type Params = Params;
    type State = GraphState;
    type Error = TableauErr;

    fn parse_formula(formula: &'f str, params: Option<Self::Params>) -> TableauResult<Self::State> {
        let params = params.unwrap_or_default();
        let formulae: Vec<Formula> = parse_formula_list(formula)?
            .iter()
            .map(canonicalize)
            .collect();

        let graph = match build_tableau(&formulae, &params).and_then(|b| build_graph(&b, &params)) {
            Ok(graph) => Some(graph),
            Err(TableauErr::Unsatisfiable) => None,
            Err(e) => return Err(e),
        };
        Ok(GraphState::new(formulae, params.mode, graph))
    }

    fn validate(state: Self::State) -> bool {
        state.verify_seal(&state.seal)
    }

    fn check_close(state: Self::State) -> CloseMsg {
        match state.graph {
            None => CloseMsg {
                closed: true,
                msg: format!(
                    "The formula set is unsatisfiable in {}",
                    state.mode
                ),
            },
            Some(g) => CloseMsg {
                closed: false,
                msg: format!(
                    "The formula set is satisfiable in {}, the pseudo-model has {} states",
                    state.mode,
                    g.states.len()
                ),
            },
        }
    }
}
