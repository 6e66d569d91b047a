use std::collections::HashSet;

use super::*;

#[test]
fn all_tools_match_required_keys_table() {
    let tools = all_tools();
    assert_eq!(tools.len(), 6);

    let find = |name: &str| tools.iter().find(|t| t.name == name).unwrap();
    assert_eq!(find("read_file").input_schema.required, vec!["path"]);
    assert_eq!(find("search_files").input_schema.required, vec!["query"]);
    assert!(find("list_directory").input_schema.required.is_empty());
    assert_eq!(find("write_file").input_schema.required, vec!["path", "content"]);
    assert_eq!(find("edit_file").input_schema.required, vec!["path", "old_text", "new_text"]);
    assert_eq!(find("run_command").input_schema.required, vec!["command"]);
}

#[test]
fn categories_match_spec_table() {
    let tools = all_tools();
    let find = |name: &str| tools.iter().find(|t| t.name == name).unwrap().category;
    assert_eq!(find("read_file"), ToolCategory::Read);
    assert_eq!(find("search_files"), ToolCategory::Read);
    assert_eq!(find("list_directory"), ToolCategory::Read);
    assert_eq!(find("write_file"), ToolCategory::Write);
    assert_eq!(find("edit_file"), ToolCategory::Write);
    assert_eq!(find("run_command"), ToolCategory::Exec);
}

#[test]
fn name_to_category_defaults_unknown_to_read() {
    assert_eq!(name_to_category("frobnicate"), ToolCategory::Read);
    assert_eq!(name_to_category("run_command"), ToolCategory::Exec);
}

#[test]
fn build_catalog_read_only_restricts_to_read_category() {
    let catalog = build_catalog(&CatalogFilter { read_only: true, ..Default::default() });
    assert_eq!(catalog.len(), 3);
    assert!(catalog.iter().all(|t| t.category == ToolCategory::Read));
}

#[test]
fn build_catalog_include_intersects() {
    let include: HashSet<String> = ["read_file".to_string(), "run_command".to_string()].into_iter().collect();
    let catalog = build_catalog(&CatalogFilter {
        include: Some(include),
        ..Default::default()
    });
    let names: HashSet<&str> = catalog.iter().map(|t| t.name).collect();
    assert_eq!(names, HashSet::from(["read_file", "run_command"]));
}

#[test]
fn build_catalog_unknown_include_name_yields_empty_intersection() {
    let include: HashSet<String> = ["does_not_exist".to_string()].into_iter().collect();
    let catalog = build_catalog(&CatalogFilter {
        include: Some(include),
        ..Default::default()
    });
    assert!(catalog.is_empty());
}

#[test]
fn build_catalog_exclude_subtracts() {
    let exclude: HashSet<String> = ["run_command".to_string()].into_iter().collect();
    let catalog = build_catalog(&CatalogFilter {
        exclude: Some(exclude),
        ..Default::default()
    });
    assert_eq!(catalog.len(), 5);
    assert!(catalog.iter().all(|t| t.name != "run_command"));
}

#[test]
fn build_catalog_read_only_and_exclude_compose() {
    let exclude: HashSet<String> = ["list_directory".to_string()].into_iter().collect();
    let catalog = build_catalog(&CatalogFilter {
        read_only: true,
        exclude: Some(exclude),
        ..Default::default()
    });
    let names: HashSet<&str> = catalog.iter().map(|t| t.name).collect();
    assert_eq!(names, HashSet::from(["read_file", "search_files"]));
}
