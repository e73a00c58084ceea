//! Validation of a built [`super::FeatureTable`] against spec.md §3.2's invariants.

use super::feature::AltSetSubn;
use super::FeatureTable;
use crate::alerts::AlertRegistry;
use crate::make_error;
use eyre::Report;
use std::collections::HashMap;

pub(super) fn validate(table: &FeatureTable, registry: Option<&AlertRegistry>) -> Result<(), Report> {
  let mut failures = Vec::new();

  for (idx, ftr) in table.features.iter().enumerate() {
    if ftr.coords.max() > table.model_length {
      failures.push(format!(
        "feature #{idx} ({}): coords '{}' exceed model length {}",
        ftr.ftr_type, ftr.coords, table.model_length
      ));
    }
    if let Some(parent_idx) = ftr.parent_idx {
      match table.features.get(parent_idx) {
        None => failures.push(format!("feature #{idx}: parent_idx {parent_idx} does not exist")),
        Some(_) if parent_idx == idx => failures.push(format!("feature #{idx}: parent_idx refers to itself")),
        Some(parent) if parent.parent_idx.is_some() => {
          failures.push(format!("feature #{idx}: parent #{parent_idx} itself has a parent (no grandparents allowed)"));
        }
        Some(_) => {}
      }
    }
  }

  validate_alternative_sets(table, &mut failures);
  validate_alternative_subn(table, &mut failures);

  if let Some(registry) = registry {
    validate_exceptions(table, registry, &mut failures);
  }

  if failures.is_empty() {
    Ok(())
  } else {
    make_error!("Feature table validation failed:\n{}", failures.join("\n"))
  }
}

fn validate_alternative_sets(table: &FeatureTable, failures: &mut Vec<String>) {
  let mut sets: HashMap<&str, Vec<usize>> = HashMap::new();
  for (idx, ftr) in table.features.iter().enumerate() {
    if let Some(name) = ftr.alternative_ftr_set.as_deref() {
      sets.entry(name).or_default().push(idx);
    }
  }
  for (name, members) in sets {
    if members.len() < 2 {
      failures.push(format!("alternative_ftr_set '{name}' has fewer than 2 members"));
      continue;
    }
    let with_parent: Vec<usize> = members.iter().filter_map(|&idx| table.features[idx].parent_idx).collect();
    if let Some(first_parent) = with_parent.first() {
      if !with_parent.iter().all(|p| p == first_parent) {
        failures.push(format!("alternative_ftr_set '{name}': members disagree on shared parent"));
      }
    }
  }
}

fn validate_alternative_subn(table: &FeatureTable, failures: &mut Vec<String>) {
  for (idx, ftr) in table.features.iter().enumerate() {
    let Some(subn) = &ftr.alternative_ftr_set_subn else { continue };
    match subn {
      AltSetSubn::Index(target) => {
        if *target == idx || table.features.get(*target).is_none() {
          failures.push(format!("feature #{idx}: alternative_ftr_set_subn index {target} is invalid"));
        }
      }
      AltSetSubn::Literal { set_name, k } => {
        if ftr.alternative_ftr_set.as_deref() == Some(set_name.as_str()) {
          failures.push(format!(
            "feature #{idx}: alternative_ftr_set_subn set '{set_name}' must differ from the feature's own set"
          ));
          continue;
        }
        let members: Vec<usize> = table
          .features
          .iter()
          .enumerate()
          .filter(|(_, f)| f.alternative_ftr_set.as_deref() == Some(set_name.as_str()))
          .map(|(i, _)| i)
          .collect();
        match members.get(k - 1) {
          Some(&target) if target != idx => {}
          _ => failures.push(format!(
            "feature #{idx}: alternative_ftr_set_subn '{set_name}.{k}' does not resolve to a distinct feature"
          )),
        }
      }
    }
  }
}

fn validate_exceptions(table: &FeatureTable, registry: &AlertRegistry, failures: &mut Vec<String>) {
  for (idx, ftr) in table.features.iter().enumerate() {
    for (code, value) in &ftr.exceptions {
      match registry.exc_type_for(code) {
        None => failures.push(format!("feature #{idx}: exception key '{code}_exc' is not a registered alert code")),
        Some(exc_type) => {
          if let Err(err) = crate::alerts::parse_exception(value, exc_type) {
            failures.push(format!("feature #{idx}: exception value for '{code}_exc' is malformed: {err}"));
          }
        }
      }
    }
  }
}
