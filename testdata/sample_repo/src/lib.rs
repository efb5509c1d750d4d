mod graph;

use crate::graph::Graph;
use std::collections::HashMap;

pub fn build() -> Graph {
    let mut seen: HashMap<u32, u32> = HashMap::new();
    seen.insert(1, 2);
    graph::Graph::new()
}
