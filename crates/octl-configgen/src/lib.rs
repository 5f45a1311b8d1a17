//! The Config Generator (§4.5): scans the operation descriptor table,
//! buckets methods by verb prefix, and emits the `Entity`/`Alias` values
//! consumed at runtime by the Alias Engine.

use octl_types::alias::{Alias, AliasFlag, CommandToken, Prompt, PromptAction};
use octl_types::config::{Config, ContentEntry};
use octl_types::entity::{Column, Entity};
use octl_types::field::{FieldDef, FieldShape};
use octl_types::flag::normalize_flag_name;
use octl_types::operation::Operation;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Read,
    Create,
    Update,
    Delete,
}

fn classify(name: &str) -> Option<(Verb, &str)> {
    for (verb, prefix) in [
        (Verb::Read, "Read"),
        (Verb::Create, "Create"),
        (Verb::Update, "Update"),
        (Verb::Delete, "Delete"),
    ] {
        if let Some(rest) = name.strip_prefix(prefix) {
            if !rest.is_empty() {
                return Some((verb, rest));
            }
        }
    }
    None
}

/// De-pluralizes a PascalCase noun per §4.5: `ies → y`, trailing `s`
/// dropped. Case is preserved so the result can still be used to guess
/// field names like `<Entity>Id`.
fn singularize_pascal(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ies") {
        format!("{stem}y")
    } else if let Some(stem) = word.strip_suffix('s') {
        stem.to_string()
    } else {
        word.to_string()
    }
}

fn record_fields(shape: &FieldShape) -> &[FieldDef] {
    match shape {
        FieldShape::Record { fields, .. } => fields,
        _ => &[],
    }
}

fn element_shape_of_slice(shape: &FieldShape) -> Option<&FieldShape> {
    match shape {
        FieldShape::SliceOfRecord { element } => Some(element),
        _ => None,
    }
}

const RESERVED_RESPONSE_FIELDS: [&str; 2] = ["NextPageToken", "ResponseContext"];
const PRIORITY_COLUMNS: &[(&str, &[&str])] = &[
    ("State", &["State"]),
    ("PublicIp", &["PublicIp"]),
    ("PrivateIp", &["PrivateIp"]),
    ("NetId", &["NetId"]),
    ("SubnetId", &["SubnetId"]),
    ("IpRange", &["IpRange"]),
    ("Subregion", &["SubregionName", "SubregionNames", "Subregion", "Subregions"]),
    ("Size", &["Size"]),
    ("Iops", &["Iops"]),
];

fn build_columns(element_fields: &[FieldDef], singular_pascal: &str) -> Vec<Column> {
    let mut columns = Vec::new();
    let mut used = std::collections::HashSet::new();
    let has_field = |name: &str| element_fields.iter().any(|f| f.name == name);

    let id_field = format!("{singular_pascal}Id");
    if has_field(&id_field) {
        columns.push(Column::new("Id", format!(".{id_field}")));
        used.insert(id_field);
    }

    let name_field = format!("{singular_pascal}Name");
    if has_field(&name_field) {
        columns.push(Column::new("Name", format!(".{name_field}")));
        used.insert(name_field);
    } else if has_field("Tags") {
        columns.push(Column::new("Name", "find(Tags, #?.Key == \"Name\")?.Value"));
    }

    let type_field = format!("{singular_pascal}Type");
    if has_field(&type_field) {
        columns.push(Column::new("Type", format!(".{type_field}")));
        used.insert(type_field);
    }

    for (title, candidates) in PRIORITY_COLUMNS {
        if let Some(found) = candidates
            .iter()
            .find(|c| has_field(c) && !used.contains(**c))
        {
            columns.push(Column::new(*title, format!(".{found}")));
            used.insert((*found).to_string());
        }
    }

    columns
}

fn tokens(words: &[&str]) -> Vec<CommandToken> {
    words.iter().map(|w| CommandToken::parse(w)).collect()
}

/// Locates the id-filter field name inside `fields` for a `Read*` alias's
/// `describe`: try `<Entity>Ids`, falling back to `<Entity>Names`.
fn read_id_filter_field(filters_fields: &[FieldDef], singular_pascal: &str) -> Option<String> {
    let ids = format!("{singular_pascal}Ids");
    let names = format!("{singular_pascal}Names");
    if filters_fields.iter().any(|f| f.name == ids) {
        Some(ids)
    } else if filters_fields.iter().any(|f| f.name == names) {
        Some(names)
    } else {
        None
    }
}

/// Locates the id field on a flat `Update*`/`Delete*` request: try
/// `<Entity>Id`, `Ids`, `Name`, `Names` in that order (§4.5).
fn write_id_field(request_fields: &[FieldDef], singular_pascal: &str) -> Option<String> {
    for candidate in [format!("{singular_pascal}Id"), "Ids".to_string(), "Name".to_string(), "Names".to_string()] {
        if request_fields.iter().any(|f| f.name == candidate) {
            return Some(candidate);
        }
    }
    None
}

struct GenContext {
    config: Config,
    describe_tokens: HashMap<String, Vec<String>>,
    guesses: Vec<String>,
}

/// Runs the generator over every operation in `operations`, returning the
/// derived config plus a diagnostic list of response-field guesses made
/// where `<Plural>` was absent from a `Read*` response (§8's
/// config-generator property: "the guess is recorded").
pub fn generate(operations: &[Operation]) -> (Config, Vec<String>) {
    let mut ctx = GenContext {
        config: Config::new(),
        describe_tokens: HashMap::new(),
        guesses: Vec::new(),
    };

    for op in operations {
        if let Some((Verb::Read, rest)) = classify(&op.name) {
            handle_read(op, rest, &mut ctx);
        }
    }
    for op in operations {
        match classify(&op.name) {
            Some((Verb::Create, rest)) => handle_create(op, rest, &mut ctx),
            Some((Verb::Update, rest)) => handle_update(op, rest, &mut ctx),
            Some((Verb::Delete, rest)) => handle_delete(op, rest, &mut ctx),
            _ => {}
        }
    }

    (ctx.config, ctx.guesses)
}

fn handle_read(op: &Operation, plural: &str, ctx: &mut GenContext) {
    let singular_pascal = singularize_pascal(plural);
    let singular = singular_pascal.to_lowercase();

    let output_fields = record_fields(&op.output);
    let content_field = output_fields
        .iter()
        .find(|f| f.name == plural)
        .or_else(|| {
            let guessed = output_fields
                .iter()
                .find(|f| !RESERVED_RESPONSE_FIELDS.contains(&f.name.as_str()));
            if let Some(g) = guessed {
                ctx.guesses
                    .push(format!("{}: guessed content field {:?} (no field named {plural:?})", op.name, g.name));
            }
            guessed
        });

    let element_fields = content_field
        .and_then(|f| element_shape_of_slice(&f.shape))
        .map(record_fields)
        .unwrap_or(&[]);

    let mut entity = Entity::new(singular.clone(), plural.to_lowercase());
    entity.columns = build_columns(element_fields, &singular_pascal);

    let filters_fields = record_fields(&op.input)
        .iter()
        .find(|f| f.name == "Filters")
        .map(|f| record_fields(&f.shape))
        .unwrap_or(&[]);
    let id_filter = read_id_filter_field(filters_fields, &singular_pascal);

    let list_command = tokens(&["api", &op.name, "-o", "table"]);
    ctx.config.aliases.push(Alias {
        entity: singular.clone(),
        group: "service".to_string(),
        r#use: "list".to_string(),
        aliases: vec!["ls".to_string()],
        short: format!("List {}", plural.to_lowercase()),
        command: list_command,
        flags: Vec::new(),
        prompt: None,
    });

    if let Some(id_filter) = id_filter {
        let filter_flag = format!("--{}", normalize_flag_name(&format!("Filters.{id_filter}")));
        let describe_tokens = vec![
            "api".to_string(),
            op.name.clone(),
            filter_flag.clone(),
            "%1".to_string(),
            "-o".to_string(),
            "yaml,single".to_string(),
        ];
        ctx.config.aliases.push(Alias {
            entity: singular.clone(),
            group: "service".to_string(),
            r#use: "describe".to_string(),
            aliases: vec!["desc".to_string()],
            short: format!("Describe a {singular}"),
            command: describe_tokens.iter().map(|t| CommandToken::parse(t)).collect(),
            flags: Vec::new(),
            prompt: None,
        });
        ctx.describe_tokens.insert(singular.clone(), describe_tokens);
    }

    ctx.config.contents.entry(op.name.clone()).or_insert(ContentEntry {
        content: "table".to_string(),
        entity: Some(singular.clone()),
    });
    ctx.config.entities.entry(singular).or_insert(entity);
}

fn handle_create(op: &Operation, rest: &str, ctx: &mut GenContext) {
    let singular = singularize_pascal(rest).to_lowercase();
    ctx.config.aliases.push(Alias {
        entity: singular.clone(),
        group: "service".to_string(),
        r#use: "create".to_string(),
        aliases: Vec::new(),
        short: format!("Create a {singular}"),
        command: tokens(&["api", &op.name, "-o", "yaml"]),
        flags: Vec::new(),
        prompt: None,
    });
}

fn handle_update(op: &Operation, rest: &str, ctx: &mut GenContext) {
    let singular_pascal = singularize_pascal(rest);
    let singular = singular_pascal.to_lowercase();
    let Some(id_field) = write_id_field(record_fields(&op.input), &singular_pascal) else {
        return;
    };
    let flag = format!("--{}", normalize_flag_name(&id_field));
    ctx.config.aliases.push(Alias {
        entity: singular.clone(),
        group: "service".to_string(),
        r#use: "update".to_string(),
        aliases: Vec::new(),
        short: format!("Update a {singular}"),
        command: tokens(&["api", &op.name, &flag, "%1", "-o", "yaml"]),
        flags: Vec::new(),
        prompt: None,
    });
}

fn handle_delete(op: &Operation, rest: &str, ctx: &mut GenContext) {
    let singular_pascal = singularize_pascal(rest);
    let singular = singular_pascal.to_lowercase();
    let Some(id_field) = write_id_field(record_fields(&op.input), &singular_pascal) else {
        return;
    };
    let flag = format!("--{}", normalize_flag_name(&id_field));

    let display = ctx.describe_tokens.get(&singular).map(|describe| {
        describe
            .iter()
            .map(|t| if t == "yaml,single" { "table,single".to_string() } else { t.clone() })
            .collect::<Vec<_>>()
            .join(" ")
    });

    ctx.config.aliases.push(Alias {
        entity: singular.clone(),
        group: "service".to_string(),
        r#use: "delete".to_string(),
        aliases: vec!["del".to_string(), "rm".to_string()],
        short: format!("Delete a {singular}"),
        command: tokens(&["api", &op.name, &flag, "%1"]),
        flags: Vec::<AliasFlag>::new(),
        prompt: Some(Prompt {
            action: PromptAction::Delete,
            display,
        }),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn singularizes_per_rules() {
        assert_eq!(singularize_pascal("Volumes"), "Volume");
        assert_eq!(singularize_pascal("Vms"), "Vm");
        assert_eq!(singularize_pascal("Subnet"), "Subnet");
    }

    #[test]
    fn generates_volume_entity_with_expected_columns() {
        let ops = octl_client::descriptor::all();
        let (config, guesses) = generate(&ops);
        assert!(guesses.is_empty(), "unexpected guesses: {guesses:?}");

        let volume = &config.entities["volume"];
        let titles: Vec<_> = volume.columns.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Id", "Name", "Type", "State", "Subregion", "Size"]);

        assert!(config
            .aliases
            .iter()
            .any(|a| a.entity == "volume" && a.r#use == "list"));
        assert!(config
            .aliases
            .iter()
            .any(|a| a.entity == "volume" && a.r#use == "describe"));
        assert!(config
            .aliases
            .iter()
            .any(|a| a.entity == "volume" && a.r#use == "create"));
        assert!(config
            .aliases
            .iter()
            .any(|a| a.entity == "volume" && a.r#use == "update"));

        let delete = config
            .aliases
            .iter()
            .find(|a| a.entity == "volume" && a.r#use == "delete")
            .expect("delete alias");
        let prompt = delete.prompt.as_ref().expect("delete prompt");
        assert_eq!(prompt.action, octl_types::alias::PromptAction::Delete);
        assert!(prompt.display.as_ref().unwrap().contains("table,single"));
    }

    #[test]
    fn read_operations_get_a_contents_entry_pointing_at_their_entity() {
        let ops = octl_client::descriptor::all();
        let (config, _) = generate(&ops);
        let entry = config.contents.get("ReadVolumes").expect("ReadVolumes contents entry");
        assert_eq!(entry.entity.as_deref(), Some("volume"));
    }

    #[test]
    fn vm_entity_gets_block_device_mapping_backed_columns() {
        let ops = octl_client::descriptor::all();
        let (config, _) = generate(&ops);
        let vm = &config.entities["vm"];
        assert!(vm.columns.iter().any(|c| c.title == "Id"));
    }
}
