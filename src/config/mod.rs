//! Master configuration file and the property files it points to.
//!
//! The master file holds `prop = relative/path` lines. Each property file
//! starts with a header naming its kind, followed by tab separated
//! `attribute value...` lines. Lines starting with `#` are comments.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{debug, info};

use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, DrawError, ResourceError};

pub mod props;

pub use props::{
    BootstrapProps, CollapseProps, ContourProps, LabelProps, LineageProps, SymbolProps, TreeProps,
};

const MASTER: &str = "Config";

const KNOWN_PROPS: [&str; 7] = [
    "tree_props",
    "collapse_props",
    "bootstrap_props",
    "contour_props",
    "lineage_props",
    "label_props",
    "symbol_props",
];

/// One `attribute value...` line of a property file.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub line: usize,
    pub attribute: String,
    pub values: Vec<String>,
}

impl Entry {
    fn arity_error(&self, component: &'static str, expected: usize) -> ConfigError {
        ConfigError::WrongArity {
            component,
            field: self.attribute.clone(),
            expected,
            found: self.values.len(),
        }
    }

    pub fn first(&self, component: &'static str) -> Result<&str, ConfigError> {
        self.values
            .first()
            .map(String::as_str)
            .ok_or_else(|| self.arity_error(component, 1))
    }

    /// All values, checked against the accepted counts.
    pub fn exactly(&self, component: &'static str, counts: &[usize]) -> Result<&[String], ConfigError> {
        if counts.contains(&self.values.len()) {
            Ok(&self.values)
        } else {
            Err(self.arity_error(component, counts.first().copied().unwrap_or(0)))
        }
    }

    pub fn flag(&self, component: &'static str) -> Result<bool, ConfigError> {
        parse_bool(component, &self.attribute, self.first(component)?)
    }

    pub fn number(&self, component: &'static str) -> Result<f64, ConfigError> {
        parse_number(component, &self.attribute, self.first(component)?)
    }

    pub fn parse<T>(&self, component: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr<Err = ConfigError>,
    {
        self.first(component)?.parse()
    }
}

pub fn parse_bool(component: &'static str, field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "True" | "true" | "TRUE" => Ok(true),
        "False" | "false" | "FALSE" => Ok(false),
        _ => Err(ConfigError::invalid_value(component, field, value)),
    }
}

pub fn parse_number(component: &'static str, field: &str, value: &str) -> Result<f64, ConfigError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::invalid_number(component, field, value))
}

/// A parsed property file.
#[derive(Debug, Clone)]
pub struct PropertyFile {
    pub path: PathBuf,
    pub component: &'static str,
    pub entries: Vec<Entry>,
}

impl PropertyFile {
    pub fn read(path: &Path, component: &'static str, header: &'static str) -> Result<Self, DrawError> {
        if !path.exists() {
            return Err(ResourceError::Missing {
                what: component,
                path: path.to_path_buf(),
            }
            .into());
        }
        let raw = fs::read_to_string(path).map_err(|source| ResourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&raw, path, component, header)?)
    }

    pub fn parse(
        raw: &str,
        path: &Path,
        component: &'static str,
        header: &'static str,
    ) -> Result<Self, ConfigError> {
        let mut lines = raw.lines().enumerate();
        let found = lines
            .next()
            .map(|(_, line)| line.trim())
            .ok_or_else(|| ConfigError::EmptyFile {
                component,
                path: path.to_path_buf(),
            })?;
        if found != header {
            return Err(ConfigError::UnexpectedHeader {
                component,
                expected: header,
                found: found.to_string(),
                path: path.to_path_buf(),
            });
        }

        let entries = lines
            .filter_map(|(index, line)| parse_entry(index + 1, line))
            .collect();
        Ok(Self {
            path: path.to_path_buf(),
            component,
            entries,
        })
    }

    pub fn has(&self, attribute: &str) -> bool {
        self.entries.iter().any(|entry| entry.attribute == attribute)
    }

    /// Fail on the first of `fields` that this file never sets.
    pub fn require(&self, fields: &[&'static str]) -> Result<(), ConfigError> {
        match fields.iter().find(|field| !self.has(field)) {
            Some(&field) => Err(ConfigError::MissingField {
                component: self.component,
                field,
            }),
            None => Ok(()),
        }
    }

    /// Resolve a path named inside this file against the file's directory.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        base.join(relative)
    }
}

fn parse_entry(line: usize, raw: &str) -> Option<Entry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let mut fields: Vec<String> = if trimmed.contains('\t') {
        trimmed
            .split('\t')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        trimmed.split_whitespace().map(str::to_string).collect()
    };
    let attribute = fields.remove(0);
    Some(Entry {
        line,
        attribute,
        values: fields,
    })
}

/// Record an attribute that no property kind recognises.
pub fn unexpected_attribute(file: &PropertyFile, entry: &Entry, diag: &mut Diagnostics) {
    diag.warn(
        file.component,
        format!(
            "unexpected attribute '{}' on line {} of {}",
            entry.attribute,
            entry.line,
            file.path.display()
        ),
    );
}

/// Read the master file into a map from property kind to absolute path.
pub fn read_master(
    path: &Path,
    diag: &mut Diagnostics,
) -> Result<BTreeMap<String, PathBuf>, DrawError> {
    if !path.exists() {
        return Err(ResourceError::Missing {
            what: "configuration",
            path: path.to_path_buf(),
        }
        .into());
    }
    let raw = fs::read_to_string(path).map_err(|source| ResourceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let mut files = BTreeMap::new();
    for (index, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((prop, file)) = line.split_once('=') else {
            return Err(ResourceError::Malformed {
                path: path.to_path_buf(),
                line: index + 1,
                message: "expected 'prop = file'".to_string(),
            }
            .into());
        };
        let (prop, file) = (prop.trim(), file.trim());
        if !KNOWN_PROPS.contains(&prop) {
            diag.warn(MASTER, format!("unexpected property file type: {prop}"));
            continue;
        }
        debug!("{prop} -> {file}");
        files.insert(prop.to_string(), base.join(file));
    }
    Ok(files)
}

/// Everything needed to draw one figure.
#[derive(Debug, Clone)]
pub struct Config {
    pub tree: TreeProps,
    pub collapse: Option<CollapseProps>,
    pub bootstrap: Option<BootstrapProps>,
    pub contour: Option<ContourProps>,
    pub lineage: Option<LineageProps>,
    pub labels: Option<LabelProps>,
    pub symbols: Option<SymbolProps>,
}

impl Config {
    pub fn load(path: &Path, diag: &mut Diagnostics) -> Result<Self, DrawError> {
        info!("Reading configuration from {}.", path.display());
        let files = read_master(path, diag)?;

        let tree_path = files.get("tree_props").ok_or(ConfigError::MissingField {
            component: MASTER,
            field: "tree_props",
        })?;
        let tree = TreeProps::parse(&PropertyFile::read(tree_path, "TreeProps", "TREE")?, diag)?;

        let collapse = load_optional(&files, COLLAPSE_PROPS, diag, CollapseProps::parse)?;
        let bootstrap = load_optional(&files, BOOTSTRAP_PROPS, diag, BootstrapProps::parse)?;
        let contour = load_optional(&files, CONTOUR_PROPS, diag, ContourProps::parse)?;
        let lineage = load_optional(&files, LINEAGE_PROPS, diag, LineageProps::parse)?;
        let labels = load_optional(&files, LABEL_PROPS, diag, LabelProps::parse)?;
        let symbols = load_optional(&files, SYMBOL_PROPS, diag, SymbolProps::parse)?;

        Ok(Self {
            tree,
            collapse,
            bootstrap,
            contour,
            lineage,
            labels,
            symbols,
        })
    }
}

/// Master key, component name and expected header of a property file.
type PropKind = (&'static str, &'static str, &'static str);

const COLLAPSE_PROPS: PropKind = ("collapse_props", "CollapseProps", "COLLAPSE");
const BOOTSTRAP_PROPS: PropKind = ("bootstrap_props", "BootstrapProps", "BOOTSTRAP");
const CONTOUR_PROPS: PropKind = ("contour_props", "ContourProps", "CONTOURS");
const LINEAGE_PROPS: PropKind = ("lineage_props", "LineageProps", "LINEAGES");
const LABEL_PROPS: PropKind = ("label_props", "LabelProps", "LABELS");
const SYMBOL_PROPS: PropKind = ("symbol_props", "SymbolProps", "SYMBOLS");

fn load_optional<T>(
    files: &BTreeMap<String, PathBuf>,
    (key, component, header): PropKind,
    diag: &mut Diagnostics,
    parse: fn(&PropertyFile, &mut Diagnostics) -> Result<T, ConfigError>,
) -> Result<Option<T>, DrawError> {
    let Some(path) = files.get(key) else {
        return Ok(None);
    };
    let file = PropertyFile::read(path, component, header)?;
    Ok(Some(parse(&file, diag)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Result<PropertyFile, ConfigError> {
        PropertyFile::parse(raw, Path::new("/tmp/props.tsv"), "TreeProps", "TREE")
    }

    #[test]
    fn entries_skip_comments_and_blank_lines() {
        let file = parse("TREE\n# comment\n\nwidth\t0.8\nlineage\tp__Big\tred\t0.5\t2\n").unwrap();
        assert_eq!(file.entries.len(), 2);
        assert_eq!(file.entries[0].attribute, "width");
        assert_eq!(file.entries[0].number("TreeProps").unwrap(), 0.8);
        assert_eq!(file.entries[1].values, vec!["p__Big", "red", "0.5", "2"]);
        assert_eq!(file.entries[1].line, 5);
    }

    #[test]
    fn tab_separated_values_keep_spaces() {
        let file = parse("TREE\nlineage\tp__Big\tBig clade\tred\t0.5\t2\n").unwrap();
        assert_eq!(file.entries[0].values[1], "Big clade");
    }

    #[test]
    fn wrong_header_is_fatal() {
        let err = parse("CONTOURS\nwidth\t1\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnexpectedHeader { .. }));
        assert!(err.to_string().contains("TreeProps"));
        assert!(matches!(parse("").unwrap_err(), ConfigError::EmptyFile { .. }));
    }

    #[test]
    fn value_parsers_name_the_field() {
        let file = parse("TREE\nshow_tree\tyes\nwidth\twide\nrotation\n").unwrap();
        let err = file.entries[0].flag("TreeProps").unwrap_err();
        assert!(err.to_string().contains("show_tree"));
        assert!(matches!(
            file.entries[1].number("TreeProps").unwrap_err(),
            ConfigError::InvalidNumber { .. }
        ));
        assert!(matches!(
            file.entries[2].number("TreeProps").unwrap_err(),
            ConfigError::WrongArity { .. }
        ));
    }

    #[test]
    fn require_names_the_first_absent_field() {
        let file = parse("TREE\nwidth\t0.8\n").unwrap();
        assert!(file.require(&["width"]).is_ok());
        let err = file.require(&["width", "height", "arc"]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingField {
                component: "TreeProps",
                field: "height"
            }
        ));
    }

    #[test]
    fn relative_paths_resolve_next_to_the_file() {
        let file = parse("TREE\n").unwrap();
        assert_eq!(file.resolve("values.tsv"), PathBuf::from("/tmp/values.tsv"));
    }
}
