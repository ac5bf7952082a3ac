//! Schema validation, run once when an I/O factory is built.
//!
//! Checks, in order:
//!
//! 1. Every referenced data type resolves and no reservation was left unfilled.
//! 2. Structural rules: fields target simple or complex types (a complex field is
//!    flattened into the parent record and so cannot own records), records target
//!    complex types with a prefix or lists without one, list members are complex.
//! 3. Field cycles: no object type may reach itself (or a related type) through
//!    fields alone. Sub-records and list items start a fresh path, so a type may
//!    hold records or lists of itself.
//! 4. Prefix lengths: all prefixes in one sibling context share one length.
//! 5. Contextual uniqueness: walking siblings in declared order, a record's prefix
//!    must not occur among the prefixes of the siblings before it, including their
//!    whole subtrees. List members are siblings of each other.

use super::{ComplexTypeMapping, EntryPoint, ListTypeMapping, TypeMapping, TypeMappingRegistry};
use crate::{Error, Result};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Validates a schema against the entry points a factory will use.
///
/// Returns the data type names of every complex type reachable from the entry
/// points, in discovery order.
///
/// # Errors
///
/// Returns [`Error::Configuration`] describing the first violation found.
pub fn validate_schema<'a>(
    registry: &'a TypeMappingRegistry,
    entry_points: &[EntryPoint],
) -> Result<Vec<&'a ComplexTypeMapping>> {
    if let Some(name) = registry.reserved_names().next() {
        return Err(Error::configuration(format!(
            "data type {} was reserved but never registered",
            name
        )));
    }
    check_entry_points(registry, entry_points)?;

    let reachable = reachable_complex_types(registry, entry_points)?;
    for mapping in &reachable {
        check_structure(registry, mapping)?;
    }
    for mapping in &reachable {
        let mut path = vec![mapping.object_type().to_string()];
        check_field_cycles(registry, mapping, &mut path)?;
    }
    for mapping in &reachable {
        check_record_prefixes(registry, mapping)?;
    }
    Ok(reachable)
}

fn check_entry_points(registry: &TypeMappingRegistry, entry_points: &[EntryPoint]) -> Result<()> {
    if entry_points.is_empty() {
        return Err(Error::configuration("at least one entry point is required"));
    }
    let prefixed = entry_points.iter().any(|e| e.prefix.is_some());
    if prefixed {
        if let Some(missing) = entry_points.iter().find(|e| e.prefix.is_none()) {
            return Err(Error::configuration(format!(
                "entry point {} has no prefix but the stream is prefixed",
                missing.data_type_name
            )));
        }
    } else if entry_points.len() > 1 {
        return Err(Error::configuration(
            "several entry points require a prefix on each of them",
        ));
    }

    for entry in entry_points {
        let mapping = registry.resolve_complex(&entry.data_type_name)?;
        if !prefixed && !mapping.records().is_empty() {
            return Err(Error::configuration(format!(
                "entry point {} declares records and requires a prefix",
                entry.data_type_name
            )));
        }
    }

    if prefixed {
        let prefixes: Vec<&str> = entry_points
            .iter()
            .filter_map(|e| e.prefix.as_deref())
            .collect();
        check_prefix_lengths("entry points", &prefixes)?;

        // Top-level records come in any order, so an entry prefix may not appear below
        // any entry point, its own included.
        let mut below = HashSet::new();
        for entry in entry_points {
            let mapping = registry.resolve_complex(&entry.data_type_name)?;
            collect_subtree_prefixes(registry, mapping, &mut below, &mut HashSet::new())?;
        }

        let mut seen = HashSet::new();
        for entry in entry_points {
            let prefix = entry.prefix.as_deref().unwrap_or_default();
            if !seen.insert(prefix) || below.contains(prefix) {
                return Err(Error::configuration(format!(
                    "prefix {} of entry point {} is not unique",
                    prefix, entry.data_type_name
                )));
            }
        }
    }
    Ok(())
}

/// Collects the complex types reachable from the entry points through fields,
/// records and list members.
fn reachable_complex_types<'a>(
    registry: &'a TypeMappingRegistry,
    entry_points: &[EntryPoint],
) -> Result<Vec<&'a ComplexTypeMapping>> {
    let mut seen: IndexSet<&str> = IndexSet::new();
    let mut found = Vec::new();
    let mut pending: Vec<&'a ComplexTypeMapping> = Vec::new();

    for entry in entry_points {
        let mapping = registry.resolve_complex(&entry.data_type_name)?;
        if seen.insert(mapping.data_type_name()) {
            pending.push(mapping);
        }
    }

    while let Some(mapping) = pending.pop() {
        found.push(mapping);
        let field_targets = mapping.fields().iter().map(|f| f.data_type_name.as_str());
        let record_targets = mapping.records().iter().map(|r| r.data_type_name.as_str());
        for name in field_targets.chain(record_targets) {
            match registry.resolve(name)? {
                TypeMapping::Simple(_) => {}
                TypeMapping::Complex(child) => {
                    if seen.insert(child.data_type_name()) {
                        pending.push(child);
                    }
                }
                TypeMapping::List(list) => {
                    for item in list.items() {
                        let child = registry.resolve_complex(&item.data_type_name)?;
                        if seen.insert(child.data_type_name()) {
                            pending.push(child);
                        }
                    }
                }
            }
        }
    }
    Ok(found)
}

fn check_structure(registry: &TypeMappingRegistry, mapping: &ComplexTypeMapping) -> Result<()> {
    for field in mapping.fields() {
        match registry.resolve(&field.data_type_name)? {
            TypeMapping::Simple(_) => {}
            TypeMapping::Complex(target) if !target.records().is_empty() => {
                return Err(Error::configuration(format!(
                    "field {}.{} embeds {}, which declares records and cannot be flattened into a field",
                    mapping.data_type_name(),
                    field.field_name,
                    target.data_type_name()
                )));
            }
            TypeMapping::Complex(_) => {}
            TypeMapping::List(_) => {
                return Err(Error::configuration(format!(
                    "field {}.{} targets list {}; lists must be declared as records",
                    mapping.data_type_name(),
                    field.field_name,
                    field.data_type_name
                )));
            }
        }
    }

    for record in mapping.records() {
        let location = format!("{}.{}", mapping.data_type_name(), record.field_name);
        match (registry.resolve(&record.data_type_name)?, record.prefix.as_deref()) {
            (TypeMapping::Complex(_), Some(prefix)) if !prefix.is_empty() => {}
            (TypeMapping::Complex(_), _) => {
                return Err(Error::configuration(format!(
                    "record {} requires a non-empty prefix",
                    location
                )));
            }
            (TypeMapping::List(list), None) => check_list(list)?,
            (TypeMapping::List(_), Some(_)) => {
                return Err(Error::configuration(format!(
                    "record {} is a list; its prefixes belong to the list members",
                    location
                )));
            }
            (TypeMapping::Simple(_), _) => {
                return Err(Error::configuration(format!(
                    "record {} targets simple type {}",
                    location, record.data_type_name
                )));
            }
        }
    }
    Ok(())
}

fn check_list(list: &ListTypeMapping) -> Result<()> {
    if list.items().is_empty() {
        return Err(Error::configuration(format!(
            "list {} declares no member types",
            list.data_type_name()
        )));
    }
    if let Some(item) = list.items().iter().find(|i| i.prefix.is_empty()) {
        return Err(Error::configuration(format!(
            "member {} of list {} requires a non-empty prefix",
            item.data_type_name,
            list.data_type_name()
        )));
    }
    Ok(())
}

/// Walks fields depth-first, keeping the object types on the current path.
fn check_field_cycles(
    registry: &TypeMappingRegistry,
    mapping: &ComplexTypeMapping,
    path: &mut Vec<String>,
) -> Result<()> {
    for field in mapping.fields() {
        let target = match registry.resolve(&field.data_type_name)? {
            TypeMapping::Complex(target) => target,
            _ => continue,
        };
        if path
            .iter()
            .any(|on_path| registry.is_related(on_path, target.object_type()))
        {
            path.push(target.object_type().to_string());
            return Err(Error::configuration(format!(
                "cyclic field {}.{}: {}",
                mapping.data_type_name(),
                field.field_name,
                path.join(" -> ")
            )));
        }
        path.push(target.object_type().to_string());
        check_field_cycles(registry, target, path)?;
        path.pop();
    }
    Ok(())
}

/// Checks the sibling context formed by one complex type's records.
fn check_record_prefixes(registry: &TypeMappingRegistry, mapping: &ComplexTypeMapping) -> Result<()> {
    let mut lengths = Vec::new();
    let mut used: HashSet<String> = HashSet::new();

    for record in mapping.records() {
        match registry.resolve(&record.data_type_name)? {
            TypeMapping::Complex(child) => {
                let prefix = record.prefix.as_deref().unwrap_or_default();
                lengths.push(prefix);
                if !used.insert(prefix.to_string()) {
                    return Err(duplicate_prefix(prefix, mapping, &record.field_name));
                }
                collect_subtree_prefixes(registry, child, &mut used, &mut HashSet::new())?;
            }
            TypeMapping::List(list) => {
                for item in list.items() {
                    lengths.push(item.prefix.as_str());
                    if !used.insert(item.prefix.clone()) {
                        return Err(duplicate_prefix(&item.prefix, mapping, &record.field_name));
                    }
                    let child = registry.resolve_complex(&item.data_type_name)?;
                    collect_subtree_prefixes(registry, child, &mut used, &mut HashSet::new())?;
                }
            }
            TypeMapping::Simple(_) => {}
        }
    }

    check_prefix_lengths(mapping.data_type_name(), &lengths)
}

fn duplicate_prefix(prefix: &str, mapping: &ComplexTypeMapping, field: &str) -> Error {
    Error::configuration(format!(
        "prefix {} of record {}.{} is not contextually unique",
        prefix,
        mapping.data_type_name(),
        field
    ))
}

/// Adds every prefix below `mapping` to `used`.
fn collect_subtree_prefixes(
    registry: &TypeMappingRegistry,
    mapping: &ComplexTypeMapping,
    used: &mut HashSet<String>,
    visited: &mut HashSet<String>,
) -> Result<()> {
    if !visited.insert(mapping.data_type_name().to_string()) {
        return Ok(());
    }
    for record in mapping.records() {
        match registry.resolve(&record.data_type_name)? {
            TypeMapping::Complex(child) => {
                if let Some(prefix) = &record.prefix {
                    used.insert(prefix.clone());
                }
                collect_subtree_prefixes(registry, child, used, visited)?;
            }
            TypeMapping::List(list) => {
                for item in list.items() {
                    used.insert(item.prefix.clone());
                    let child = registry.resolve_complex(&item.data_type_name)?;
                    collect_subtree_prefixes(registry, child, used, visited)?;
                }
            }
            TypeMapping::Simple(_) => {}
        }
    }
    Ok(())
}

fn check_prefix_lengths(context: &str, prefixes: &[&str]) -> Result<()> {
    let mut lengths = prefixes.iter().map(|p| (p, p.chars().count()));
    if let Some((_, expected)) = lengths.next() {
        if let Some((prefix, _)) = lengths.find(|(_, len)| *len != expected) {
            return Err(Error::configuration(format!(
                "prefix {} in {} differs in length from its siblings ({} characters expected)",
                prefix, context, expected
            )));
        }
    }
    Ok(())
}
