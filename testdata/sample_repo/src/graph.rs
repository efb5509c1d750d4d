pub struct Graph {
    nodes: Vec<u32>,
}

impl Graph {
    pub fn new() -> Self {
        Graph { nodes: Vec::new() }
    }
}
