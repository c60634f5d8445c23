//! Creator discovery from the OAuth granted-resources payload.
//!
//! The resources document has changed shape more than once, so discovery is
//! a best-effort recursive scan for group grants rather than a typed parse.
//! The logged-in user is always offered first.

use std::collections::HashSet;

use serde_json::Value;

use crate::types::Creator;

/// A creator the session may publish under, with a display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorChoice {
    pub creator: Creator,
    pub label: String,
}

impl CreatorChoice {
    pub fn key(&self) -> String {
        self.creator.key()
    }
}

/// List the creators a session is authorized for: the user themselves,
/// then every group grant found in the resources payload, deduplicated.
pub fn discover_creators(user: Option<&Value>, resources: Option<&Value>) -> Vec<CreatorChoice> {
    let mut choices = Vec::new();
    let mut seen = HashSet::new();

    if let Some(user) = user {
        if let Some(id) = string_field(user, &["sub", "userId", "id"]) {
            let label = string_field(user, &["preferred_username", "name"])
                .unwrap_or_else(|| "User".to_string());
            let creator = Creator::user(id);
            seen.insert(creator.key());
            choices.push(CreatorChoice {
                creator,
                label: format!("{label} (You)"),
            });
        }
    }

    if let Some(resources) = resources {
        let mut groups = Vec::new();
        collect_group_candidates(resources, &mut groups);
        for (id, name) in groups {
            let creator = Creator::group(id);
            if seen.insert(creator.key()) {
                choices.push(CreatorChoice {
                    label: format!("{name} (Group)"),
                    creator,
                });
            }
        }

        // Known shapes checked explicitly in case the scan found nothing.
        for path in [
            &["resources", "groups"][..],
            &["resources", "group"][..],
            &["groups"][..],
        ] {
            let Some(list) = lookup(resources, path).and_then(Value::as_array) else {
                continue;
            };
            for entry in list {
                let Some(id) = string_field(entry, &["groupId", "id"]) else {
                    continue;
                };
                let name = string_field(entry, &["name", "groupName"])
                    .unwrap_or_else(|| format!("Group {id}"));
                let creator = Creator::group(id);
                if seen.insert(creator.key()) {
                    choices.push(CreatorChoice {
                        label: format!("{name} (Group)"),
                        creator,
                    });
                }
            }
        }
    }

    choices
}

/// Depth-first scan for objects that look like a group grant.
fn collect_group_candidates(node: &Value, out: &mut Vec<(String, String)>) {
    match node {
        Value::Array(items) => {
            for item in items {
                collect_group_candidates(item, out);
            }
        }
        Value::Object(map) => {
            let looks_like_group = map.contains_key("groupId")
                || map.contains_key("group")
                || map.contains_key("groupName")
                || map.contains_key("group_id");
            if looks_like_group {
                let id = string_field(node, &["groupId", "id"])
                    .or_else(|| map.get("group").and_then(|g| string_field(g, &["id"])));
                if let Some(id) = id {
                    let name = string_field(node, &["groupName", "name"])
                        .or_else(|| map.get("group").and_then(|g| string_field(g, &["name"])))
                        .unwrap_or_else(|| format!("Group {id}"));
                    out.push((id, name));
                }
            }
            for value in map.values() {
                collect_group_candidates(value, out);
            }
        }
        _ => {}
    }
}

fn lookup<'a>(node: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(node, |node, key| node.get(key))
}

/// First of the named fields present as a string or number.
fn string_field(node: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match node.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}
