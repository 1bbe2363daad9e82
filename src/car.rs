use std::fmt;

/// A client of the station. Created by the arrival loop and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Car {
    name: String,
    id: usize,
}

impl Car {
    pub fn new(name: impl Into<String>, id: usize) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    /// The car with sequence number `id`, named the way the arrival loop names it.
    pub fn numbered(id: usize) -> Self {
        Self::new(format!("Car {id}"), id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn id(&self) -> usize {
        self.id
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
