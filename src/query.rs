//! Queries and field-selection shapes.
//!
//! Query-language parsing lives outside this crate; the engine only needs a
//! stable operation name (cache addressing), the raw query text (handed to
//! the transport untouched), and the declarative selection shape the
//! denormalizer checks completeness against.

/// Which fields, and subfields, a query wants.
///
/// An empty nested selection marks a scalar leaf.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    fields: Vec<FieldSelection>,
}

/// One requested field with its own subselection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    name: String,
    selection: SelectionSet,
}

impl FieldSelection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// A leaf carries no subselection and must resolve to a scalar or null.
    pub fn is_leaf(&self) -> bool {
        self.selection.is_empty()
    }
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a scalar leaf field.
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldSelection {
            name: name.into(),
            selection: SelectionSet::new(),
        });
        self
    }

    /// Select an object field with its own subselection.
    pub fn object(mut self, name: impl Into<String>, selection: SelectionSet) -> Self {
        self.fields.push(FieldSelection {
            name: name.into(),
            selection,
        });
        self
    }

    pub fn fields(&self) -> &[FieldSelection] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A query as seen by the cache engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    operation_name: String,
    text: String,
    selection: SelectionSet,
}

impl Query {
    pub fn new(
        operation_name: impl Into<String>,
        text: impl Into<String>,
        selection: SelectionSet,
    ) -> Self {
        Self {
            operation_name: operation_name.into(),
            text: text.into(),
            selection,
        }
    }

    pub fn operation_name(&self) -> &str {
        &self.operation_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Path under which this query's non-identifiable root keys.
    pub fn root_path(&self) -> String {
        format!("query:{}", self.operation_name)
    }
}
