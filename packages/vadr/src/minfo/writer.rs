//! `.minfo` file serialization (spec.md §4.4): the inverse of
//! [`super::reader::parse_model_info`], with derived keys omitted.

use super::reader::ModelEntry;
use indexmap::IndexMap;

/// Keys that are always computed from other state and so are never written
/// out, even if present in an entry's fields map (spec.md §4.4).
const DERIVED_KEYS: &[&str] = &["length", "3pa_ftr_idx", "outname", "5p_sgm_idx", "3p_sgm_idx", "location"];

/// Leading keys of a feature line, emitted in this order when present, ahead
/// of every other key (spec.md §4.4: "type, coords, parent_idx_str, then
/// remaining keys in stable order").
const FEATURE_KEY_ORDER: &[&str] = &["type", "coords", "parent_idx_str"];

/// Serializes `entries` back into `.minfo` text.
#[must_use]
pub fn write_model_info(entries: &[ModelEntry]) -> String {
  let mut out = String::new();
  for entry in entries {
    out.push_str("MODEL ");
    out.push_str(&entry.name);
    write_fields(&mut out, &entry.model_fields, &[]);
    out.push('\n');

    for ftr_fields in &entry.features {
      out.push_str("FEATURE ");
      out.push_str(&entry.name);
      write_fields(&mut out, ftr_fields, FEATURE_KEY_ORDER);
      out.push('\n');
    }
  }
  out
}

fn write_fields(out: &mut String, fields: &IndexMap<String, String>, leading_order: &[&str]) {
  for &key in leading_order {
    if let Some(value) = fields.get(key) {
      write_one(out, key, value);
    }
  }
  for (key, value) in fields {
    if leading_order.contains(&key.as_str()) || DERIVED_KEYS.contains(&key.as_str()) {
      continue;
    }
    write_one(out, key, value);
  }
}

fn write_one(out: &mut String, key: &str, value: &str) {
  out.push(' ');
  out.push_str(key);
  out.push_str(":\"");
  out.push_str(value);
  out.push('"');
}
