//! Page data and template rendering.

use crate::data::{Collection, Database, ExternalSite, Tag, Technology, WorkOneLang};
use crate::expr::{Context, ExpressionEngine, Value};
use crate::hydration::Hydration;
use crate::layout::LaidOutElement;
use anyhow::{Result, anyhow};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static RE_INTERPOLATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(.+?)\s*\}\}").unwrap());

/// Everything a template can see, as written with `emit_data`.
#[derive(Debug, Serialize)]
pub struct PageData<'a> {
    pub language: &'a str,
    /// `work`, `tag`... or `None` for pages without a subject.
    pub subject: Option<&'static str>,
    pub subject_id: String,
    pub work: Option<WorkOneLang>,
    pub layout: Vec<LaidOutElement>,
    /// Public works, most recent first.
    pub works: Vec<WorkOneLang>,
    pub tags: &'a [Tag],
    pub technologies: &'a [Technology],
    pub sites: &'a [ExternalSite],
    pub collections: &'a [Collection],
}

/// A page about to be rendered: its data plus the expression variables.
#[derive(Debug)]
pub struct PageContext<'a> {
    pub data: PageData<'a>,
    pub variables: Context,
}

impl<'a> PageContext<'a> {
    pub fn new(
        hydration: &Hydration<'a>,
        database: &'a Database,
        layout: Vec<LaidOutElement>,
    ) -> Self {
        let mut variables = hydration.context();
        let records: Vec<Value> = layout
            .iter()
            .map(|element| element.to_record().into())
            .collect();
        variables.insert("layout".into(), Value::List(records));

        let data = PageData {
            language: hydration.language,
            subject: hydration.subject.kind().map(|kind| kind.name()),
            subject_id: hydration.subject.id(),
            work: hydration.work().map(|work| work.in_language(hydration.language)),
            layout,
            works: database.works_in(hydration.language),
            tags: &database.tags,
            technologies: &database.technologies,
            sites: &database.sites,
            collections: &database.collections,
        };

        Self { data, variables }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }
}

pub trait Renderer: Sync {
    fn render(&self, template: &str, page: &PageContext) -> Result<String>;
}

/// Replaces `{{ expression }}` with its value.
pub struct InterpolationRenderer<'e> {
    engine: &'e ExpressionEngine,
}

impl<'e> InterpolationRenderer<'e> {
    pub const fn new(engine: &'e ExpressionEngine) -> Self {
        Self { engine }
    }
}

impl Renderer for InterpolationRenderer<'_> {
    fn render(&self, template: &str, page: &PageContext) -> Result<String> {
        let mut output = String::with_capacity(template.len());
        let mut last = 0;

        for caps in RE_INTERPOLATION.captures_iter(template) {
            let (Some(whole), Some(expression)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = self.engine.eval(expression.as_str(), &page.variables)?;
            let text = value.stringify().ok_or_else(|| {
                anyhow!(
                    "cannot interpolate `{}`: a {} has no text form",
                    expression.as_str(),
                    value.type_name()
                )
            })?;
            output.push_str(&template[last..whole.start()]);
            output.push_str(&text);
            last = whole.end();
        }

        output.push_str(&template[last..]);
        Ok(output)
    }
}
