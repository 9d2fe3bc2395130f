use super::{Canvas, Primitive, TextSpec};

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Begin(String),
    End,
    Draw(Primitive),
}

/// Canvas that keeps every call for inspection in tests.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub calls: Vec<Recorded>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of all groups, in the order they were opened.
    pub fn groups(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Recorded::Begin(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Primitives drawn directly or indirectly inside every group named `id`.
    pub fn primitives_in(&self, id: &str) -> Vec<&Primitive> {
        let mut depth = 0usize;
        let mut inside = 0usize;
        let mut found = Vec::new();
        for call in &self.calls {
            match call {
                Recorded::Begin(group) => {
                    depth += 1;
                    if group == id && inside == 0 {
                        inside = depth;
                    }
                }
                Recorded::End => {
                    if inside == depth {
                        inside = 0;
                    }
                    depth = depth.saturating_sub(1);
                }
                Recorded::Draw(primitive) => {
                    if inside > 0 {
                        found.push(primitive);
                    }
                }
            }
        }
        found
    }

    pub fn texts_in(&self, id: &str) -> Vec<&TextSpec> {
        self.primitives_in(id)
            .into_iter()
            .filter_map(|p| match p {
                Primitive::Text(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    pub fn all_primitives(&self) -> Vec<&Primitive> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Recorded::Draw(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

impl Canvas for RecordingCanvas {
    fn begin_group(&mut self, id: &str) {
        self.calls.push(Recorded::Begin(id.to_string()));
    }

    fn end_group(&mut self) {
        self.calls.push(Recorded::End);
    }

    fn draw(&mut self, primitive: Primitive) {
        self.calls.push(Recorded::Draw(primitive));
    }
}
