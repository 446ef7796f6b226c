//! Target template
//!
//! The empty otoole layout derived from a schema: one table per set and per
//! parameter. Results are solver outputs and have no input table.

use indexmap::IndexMap;
use sand_schema::{FieldKind, SchemaDocument};

/// One table of the target layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    name: String,
    kind: FieldKind,
    indices: Vec<String>,
    short_name: Option<String>,
}

impl TemplateField {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[String] {
        &self.indices
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> Option<&str> {
        self.short_name.as_deref()
    }
}

/// Layout to populate, in schema declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TargetTemplate {
    fields: IndexMap<String, TemplateField>,
}

impl TargetTemplate {
    /// Derive the layout of every set and parameter in `schema`
    ///
    /// A name declared in several sections appears once, with the shape of
    /// its first declaration.
    #[must_use]
    pub fn from_schema(schema: &SchemaDocument) -> Self {
        let mut fields = IndexMap::new();
        for descriptor in schema.fields() {
            if !descriptor.kind().is_input() || fields.contains_key(descriptor.name()) {
                continue;
            }
            let field = TemplateField {
                name: descriptor.name().to_string(),
                kind: descriptor.kind(),
                indices: schema
                    .index_names(descriptor)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                short_name: descriptor.short_name().map(str::to_string),
            };
            fields.insert(field.name.clone(), field);
        }
        tracing::debug!(fields = fields.len(), "derived target template");
        Self { fields }
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&TemplateField> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = &TemplateField> {
        self.fields.values()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sand_test_utils::sample_schema;

    #[test]
    fn results_have_no_table() {
        let template = TargetTemplate::from_schema(&sample_schema());
        assert!(template.field("NewCapacity").is_none());
        assert!(template.field("CapitalCost").is_some());
        assert!(template.fields().all(|f| f.kind().is_input()));
    }

    #[test]
    fn fields_keep_schema_order_and_indices() {
        let template = TargetTemplate::from_schema(&sample_schema());
        let first: Vec<_> = template.fields().take(3).map(TemplateField::name).collect();
        assert_eq!(first, vec!["REGION", "TECHNOLOGY", "FUEL"]);
        assert_eq!(
            template.field("CapitalCost").unwrap().indices(),
            ["REGION", "TECHNOLOGY", "YEAR"]
        );
    }

    #[test]
    fn sectioned_fields_carry_short_names() {
        let template = TargetTemplate::from_schema(&sample_schema());
        let field = template.field("TechnologyToStorage").unwrap();
        assert_eq!(field.short_name(), Some("TechToStorage"));
        assert_eq!(field.kind(), FieldKind::Param);
    }

    #[test]
    fn repeated_name_keeps_first_shape() {
        let schema = SchemaDocument::from_yaml_str(
            r"
STORAGE:
  type: set
storage:
  STORAGE:
    type: param
    indices: [STORAGE]
",
        )
        .unwrap();
        let template = TargetTemplate::from_schema(&schema);
        assert_eq!(template.len(), 1);
        assert_eq!(template.field("STORAGE").unwrap().kind(), FieldKind::Set);
    }
}
