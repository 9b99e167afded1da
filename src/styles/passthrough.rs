use crate::{error::Result, styles::Style, video::types::Frame};

/// Grades that leave frames untouched (cinematic, none)
pub struct PassthroughStyle {
    name: String,
}

impl PassthroughStyle {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl Style for PassthroughStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "No color treatment"
    }

    fn apply_effect(&self, _frame: &mut Frame) -> Result<()> {
        Ok(())
    }

    fn is_identity(&self) -> bool {
        true
    }
}
