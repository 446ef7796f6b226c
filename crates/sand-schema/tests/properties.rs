//! Property tests for classification and reconciliation.
//!
//! Schemas are generated from a small name pool so that names collide across
//! sections and interfaces overlap the schema in interesting ways.

use proptest::prelude::*;
use sand_schema::{
    index_independent_fields, non_required_fields, reconcile, FieldKind, IndexSetPolicy,
    SchemaDocument,
};
use std::collections::{BTreeMap, BTreeSet};

const NAMES: [&str; 8] = [
    "REGION",
    "TECHNOLOGY",
    "YEAR",
    "STORAGE",
    "CapitalCost",
    "DiscountRate",
    "SpecifiedAnnualDemand",
    "NewCapacity",
];
const SETS: [&str; 4] = ["REGION", "TECHNOLOGY", "YEAR", "STORAGE"];
const SECTIONS: [&str; 2] = ["storage", "results"];

#[derive(Debug, Clone)]
struct GenField {
    section: Option<usize>,
    name: usize,
    kind: FieldKind,
    indices: Vec<usize>,
}

fn kind_strategy() -> impl Strategy<Value = FieldKind> {
    prop_oneof![
        Just(FieldKind::Set),
        Just(FieldKind::Param),
        Just(FieldKind::Result),
    ]
}

fn field_strategy() -> impl Strategy<Value = GenField> {
    (
        prop::option::of(0..SECTIONS.len()),
        0..NAMES.len(),
        kind_strategy(),
        prop::collection::btree_set(0..SETS.len(), 0..3),
    )
        .prop_map(|(section, name, kind, indices)| GenField {
            section,
            name,
            kind,
            indices: indices.into_iter().collect(),
        })
}

/// Render generated fields as YAML; later duplicates within a section win.
fn render(fields: &[GenField]) -> String {
    let mut sections: BTreeMap<Option<usize>, BTreeMap<usize, &GenField>> = BTreeMap::new();
    for field in fields {
        sections.entry(field.section).or_default().insert(field.name, field);
    }

    let mut yaml = String::new();
    for (section, entries) in &sections {
        let indent = if let Some(s) = section {
            yaml.push_str(&format!("{}:\n", SECTIONS[*s]));
            "  "
        } else {
            ""
        };
        for field in entries.values() {
            yaml.push_str(&format!("{indent}{}:\n", NAMES[field.name]));
            yaml.push_str(&format!("{indent}  type: {}\n", field.kind));
            if !field.indices.is_empty() {
                let indices: Vec<_> = field.indices.iter().map(|i| SETS[*i]).collect();
                yaml.push_str(&format!("{indent}  indices: [{}]\n", indices.join(", ")));
            }
        }
    }
    yaml
}

fn schema_strategy() -> impl Strategy<Value = SchemaDocument> {
    prop::collection::vec(field_strategy(), 1..12)
        .prop_map(|fields| SchemaDocument::from_yaml_str(&render(&fields)).unwrap())
}

fn interface_strategy() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set(0..NAMES.len(), 0..NAMES.len())
        .prop_map(|ids| ids.into_iter().map(|i| NAMES[i].to_string()).collect())
}

proptest! {
    #[test]
    fn reconcile_is_idempotent(schema in schema_strategy(), interface in interface_strategy()) {
        let once = reconcile(&schema, &interface);
        let twice = reconcile(&once, &interface);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn classification_is_deterministic(schema in schema_strategy(), interface in interface_strategy()) {
        prop_assert_eq!(
            non_required_fields(&schema, &interface),
            non_required_fields(&schema, &interface)
        );
        for policy in [IndexSetPolicy::Exclude, IndexSetPolicy::Include] {
            prop_assert_eq!(
                index_independent_fields(&schema, "YEAR", policy),
                index_independent_fields(&schema, "YEAR", policy)
            );
        }
    }

    #[test]
    fn results_are_never_non_required(schema in schema_strategy(), interface in interface_strategy()) {
        let result_only: BTreeSet<&str> = schema
            .fields()
            .filter(|f| f.kind() == FieldKind::Result)
            .map(|f| f.name())
            .filter(|name| {
                schema
                    .fields()
                    .all(|f| f.name() != *name || f.kind() == FieldKind::Result)
            })
            .collect();

        for name in non_required_fields(&schema, &interface) {
            prop_assert!(!result_only.contains(name.as_str()));
        }
    }

    #[test]
    fn results_survive_reconciliation(schema in schema_strategy(), interface in interface_strategy()) {
        let results = |doc: &SchemaDocument| {
            doc.fields().filter(|f| f.kind() == FieldKind::Result).count()
        };
        prop_assert_eq!(results(&reconcile(&schema, &interface)), results(&schema));
    }

    #[test]
    fn absent_inputs_are_fully_purged(schema in schema_strategy(), interface in interface_strategy()) {
        let reconciled = reconcile(&schema, &interface);
        let removed: BTreeSet<String> = non_required_fields(&schema, &interface).into_iter().collect();

        for field in reconciled.fields() {
            if field.kind().is_input() {
                prop_assert!(!removed.contains(field.name()));
            }
        }
    }

    #[test]
    fn non_required_counts_every_occurrence(schema in schema_strategy(), interface in interface_strategy()) {
        let listed = non_required_fields(&schema, &interface);
        for name in &listed {
            let occurrences = schema
                .fields()
                .filter(|f| f.name() == name && f.kind().is_input())
                .count();
            prop_assert_eq!(listed.iter().filter(|n| *n == name).count(), occurrences);
        }
    }

    #[test]
    fn independent_fields_have_no_duplicates(schema in schema_strategy()) {
        let fields = index_independent_fields(&schema, "YEAR", IndexSetPolicy::Include);
        let unique: BTreeSet<_> = fields.iter().collect();
        prop_assert_eq!(unique.len(), fields.len());
    }

    #[test]
    fn yaml_round_trip(schema in schema_strategy()) {
        let yaml = schema.to_yaml_string().unwrap();
        prop_assert_eq!(SchemaDocument::from_yaml_str(&yaml).unwrap(), schema);
    }
}

#[test]
fn worked_example() {
    let schema = SchemaDocument::from_yaml_str(
        r"
YEAR:
  type: set
DiscountRate:
  type: param
Conversionls:
  indices: [YEAR]
  type: param
NewCapacity:
  indices: [YEAR]
  type: result
",
    )
    .unwrap();

    // The index's own SET is left out unless asked for.
    assert_eq!(
        index_independent_fields(&schema, "YEAR", IndexSetPolicy::Exclude),
        vec!["DiscountRate"]
    );
    assert_eq!(
        index_independent_fields(&schema, "YEAR", IndexSetPolicy::Include),
        vec!["YEAR", "DiscountRate"]
    );

    let interface: BTreeSet<String> = ["YEAR", "DiscountRate"].map(String::from).into();
    assert_eq!(non_required_fields(&schema, &interface), vec!["Conversionls"]);
    assert!(reconcile(&schema, &interface).field("NewCapacity").is_some());
}
