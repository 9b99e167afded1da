use std::collections::HashMap;
use std::sync::Arc;

use crate::styles::{CyberpunkStyle, NoirStyle, PassthroughStyle, Style, StyleGrade, VintageStyle};

/// Lookup table from grade to its implementation
///
/// Every grade always has an entry, so resolving a tag never fails.
pub struct StyleRegistry {
    styles: HashMap<StyleGrade, Arc<dyn Style>>,
}

impl StyleRegistry {
    /// Create a registry with all built-in grades
    pub fn new() -> Self {
        let mut registry = Self {
            styles: HashMap::new(),
        };
        registry.register_builtin_styles();
        registry
    }

    fn register_builtin_styles(&mut self) {
        self.register(StyleGrade::Noir, Arc::new(NoirStyle::new()));
        self.register(StyleGrade::Cyberpunk, Arc::new(CyberpunkStyle::new()));
        self.register(StyleGrade::Vintage, Arc::new(VintageStyle::new()));
        self.register(StyleGrade::Cinematic, Arc::new(PassthroughStyle::new("cinematic")));
        self.register(StyleGrade::None, Arc::new(PassthroughStyle::new("none")));
    }

    /// Replace the implementation behind a grade
    pub fn register(&mut self, grade: StyleGrade, style: Arc<dyn Style>) {
        self.styles.insert(grade, style);
    }

    pub fn get(&self, grade: StyleGrade) -> Arc<dyn Style> {
        match self.styles.get(&grade) {
            Some(style) => Arc::clone(style),
            None => Arc::new(PassthroughStyle::new(grade.name())),
        }
    }

    /// Classify a free-text tag and return its style
    pub fn resolve(&self, tag: &str) -> (StyleGrade, Arc<dyn Style>) {
        let grade = StyleGrade::classify(tag);
        (grade, self.get(grade))
    }

    /// Get all available grade names
    pub fn available_styles(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.styles.keys().map(|g| g.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
