//! Expansion providers: where a trigger's replacement text comes from.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;

/// Zero-argument text producer
pub type Producer = Arc<dyn Fn() -> Result<String> + Send + Sync>;

/// Text that is cheap to produce on the matching thread.
#[derive(Clone)]
pub enum StaticText {
    Literal(String),
    /// Evaluated at expansion time (dates, counters)
    Computed(Producer),
}

impl StaticText {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn() -> Result<String> + Send + Sync + 'static,
    {
        StaticText::Computed(Arc::new(f))
    }

    pub fn produce(&self) -> Result<String> {
        match self {
            StaticText::Literal(text) => Ok(text.clone()),
            StaticText::Computed(producer) => producer(),
        }
    }
}

impl From<&str> for StaticText {
    fn from(text: &str) -> Self {
        StaticText::Literal(text.to_string())
    }
}

impl From<String> for StaticText {
    fn from(text: String) -> Self {
        StaticText::Literal(text)
    }
}

#[derive(Clone)]
pub enum ExpansionProvider {
    /// Produced inline on the dispatcher thread
    Static(StaticText),
    /// May block; always produced on a worker
    Async(Producer),
}

impl ExpansionProvider {
    pub fn is_async(&self) -> bool {
        matches!(self, ExpansionProvider::Async(_))
    }

    /// Short description for listings
    pub fn kind(&self) -> &'static str {
        match self {
            ExpansionProvider::Static(StaticText::Literal(_)) => "literal",
            ExpansionProvider::Static(StaticText::Computed(_)) => "computed",
            ExpansionProvider::Async(_) => "async",
        }
    }
}

impl fmt::Debug for ExpansionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionProvider::Static(StaticText::Literal(text)) => {
                f.debug_tuple("Literal").field(&text.len()).finish()
            }
            _ => f.write_str(self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_computed_produce() {
        let literal = StaticText::from("Best regards");
        assert_eq!(literal.produce().unwrap(), "Best regards");

        let computed = StaticText::computed(|| Ok(format!("{}-{}", 1, 2)));
        assert_eq!(computed.produce().unwrap(), "1-2");
    }

    #[test]
    fn kind_and_async_flag() {
        let p = ExpansionProvider::Static("x".into());
        assert_eq!(p.kind(), "literal");
        assert!(!p.is_async());

        let p = ExpansionProvider::Async(Arc::new(|| Ok(String::new())));
        assert_eq!(p.kind(), "async");
        assert!(p.is_async());
    }
}
