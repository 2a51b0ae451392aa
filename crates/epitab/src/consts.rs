/// Upper bound for the number of live branches of a single tableau run.
pub const MAX_BRANCHES: usize = 1 << 14;

/// Upper bound for the number of states in a pseudo-model under construction.
pub const MAX_NODES: usize = 1 << 12;
