//! Class-map classifiers and their terms.
//!
//! A `match-all` class map is one term named `all`; a `match-any` class map
//! has one term per `match` statement, numbered from 1.

use crate::model::{Classifier, Term};
use regex::Regex;
use std::sync::LazyLock;
use translate::{ConfigPath, ListReader, Normalize, ReadContext, Result, extract};

const SH_CLASS_MAPS: &str = "show running-config class-map | include ^class-map";

static CLASS_MAP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^class-map match-(?<type>\S+) (?<name>\S+)").expect("class-map regex")
});
static MATCH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*match ").expect("match regex"));

pub const MATCH_ALL_TERM: &str = "all";

pub struct ClassifierReader;

impl ListReader<Classifier> for ClassifierReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let output = ctx.read(path, SH_CLASS_MAPS)?;
        Ok(extract::extract_keys(&output, Normalize::None, &CLASS_MAP, "name"))
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Classifier,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.name = path.require_key("classifier")?.to_string();
        Ok(())
    }
}

pub struct TermReader;

impl ListReader<Term> for TermReader {
    fn list_keys(&self, path: &ConfigPath, ctx: &ReadContext<'_>) -> Result<Vec<String>> {
        let name = path.require_key("classifier")?;
        let command = format!("show running-config class-map {name} | include match");
        let output = ctx.read(path, &command)?;
        let Some(kind) = extract::extract_first(&output, Normalize::None, &CLASS_MAP, |caps| {
            (&caps["name"] == name).then(|| caps["type"].to_string())
        }) else {
            return Ok(Vec::new());
        };

        if kind == "all" {
            return Ok(vec![MATCH_ALL_TERM.to_string()]);
        }
        let statements = output.lines().filter(|line| MATCH.is_match(line)).count();
        Ok((1..=statements).map(|n| n.to_string()).collect())
    }

    fn populate(
        &self,
        path: &ConfigPath,
        builder: &mut Term,
        _ctx: &ReadContext<'_>,
    ) -> Result<()> {
        builder.id = path.require_key("term")?.to_string();
        Ok(())
    }
}
