//! One function per subcommand. Each loads its inputs, runs the core
//! operation and hands the resulting tree back to the caller.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tracing::{info, info_span, warn};

use recform_core::{
    AlignError, MatchMatrix, MemoryTermRegistry, Normalizer, StaticConceptResolver, add, align,
    build_match_matrix, formatize, metaplate, subtract, translate,
};
use recform_ingest::{DirectorySchemaResolver, JsonTermRegistry, load_document, write_document};
use recform_model::{FormatOptions, Node, NormalizeOptions, Schema, TermRecord, TermRegistry};
use recform_rules::Converters;

/// Inputs of a normalization run.
#[derive(Debug, Clone, Default)]
pub struct NormalizeRequest {
    pub input: PathBuf,
    /// Schema document; without one the data root's `*` names the schema.
    pub schema: Option<PathBuf>,
    /// Directory searched for schemas named by the data.
    pub schema_dir: Option<PathBuf>,
    /// JSON file that receives slug registrations.
    pub terms: Option<PathBuf>,
    pub options: NormalizeOptions,
}

impl NormalizeRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<PathBuf>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    #[must_use]
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_terms(mut self, terms: impl Into<PathBuf>) -> Self {
        self.terms = Some(terms.into());
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeOutcome {
    pub tree: Node,
    /// Every term the registry holds after the run.
    pub terms: Vec<TermRecord>,
}

#[derive(Debug, Clone)]
pub struct AlignOutcome {
    pub matrix: MatchMatrix,
    /// Sources that contributed a probe, in matrix column order.
    pub columns: Vec<PathBuf>,
    pub records: Vec<Node>,
}

fn load(path: &Path) -> Result<Node> {
    load_document(path).with_context(|| format!("load {}", path.display()))
}

pub fn run_template(input: &Path) -> Result<Node> {
    let _span = info_span!("template", input = %input.display()).entered();
    let data = load(input)?;
    let schema = metaplate(&data);
    info!(fields = schema.fields().map_or(0, BTreeMap::len), "template derived");
    Ok(schema.to_node())
}

pub fn run_normalize(request: &NormalizeRequest) -> Result<NormalizeOutcome> {
    let _span = info_span!("normalize", input = %request.input.display()).entered();
    let start = Instant::now();
    let data = load(&request.input)?;
    let schema = request
        .schema
        .as_deref()
        .map(load)
        .transpose()?
        .map(|document| Schema::from_node(&document));

    let resolver = request.schema_dir.as_ref().map(DirectorySchemaResolver::new);
    let terms = match &request.terms {
        Some(path) => Terms::File(
            JsonTermRegistry::open(path)
                .with_context(|| format!("open term registry {}", path.display()))?,
        ),
        None => Terms::Memory(MemoryTermRegistry::new()),
    };

    let mut normalizer = Normalizer::new()
        .with_options(request.options)
        .with_registry(terms.registry());
    if let Some(resolver) = &resolver {
        normalizer = normalizer.with_resolver(resolver);
    }
    if schema.is_none() && resolver.is_none() {
        warn!("no schema given and no schema directory to resolve one from");
    }
    let tree = normalizer.normalize(&data, schema.as_ref());

    let terms = terms.records();
    info!(
        terms = terms.len(),
        duration_ms = start.elapsed().as_millis(),
        "normalize complete"
    );
    Ok(NormalizeOutcome { tree, terms })
}

enum Terms {
    File(JsonTermRegistry),
    Memory(MemoryTermRegistry),
}

impl Terms {
    fn registry(&self) -> &dyn TermRegistry {
        match self {
            Self::File(registry) => registry,
            Self::Memory(registry) => registry,
        }
    }

    fn records(&self) -> Vec<TermRecord> {
        match self {
            Self::File(registry) => registry.records(),
            Self::Memory(registry) => registry.records(),
        }
    }
}

pub fn run_format(input: &Path, options: &FormatOptions) -> Result<Node> {
    let _span = info_span!("format", input = %input.display()).entered();
    let data = load(input)?;
    Ok(formatize(&data, &Converters::default(), options))
}

pub fn run_merge(left: &Path, right: &Path) -> Result<Node> {
    let _span = info_span!("merge", left = %left.display(), right = %right.display()).entered();
    Ok(add(&load(left)?, &load(right)?))
}

pub fn run_diff(left: &Path, right: &Path) -> Result<Node> {
    let _span = info_span!("diff", left = %left.display(), right = %right.display()).entered();
    Ok(subtract(&load(left)?, &load(right)?))
}

/// Aligns the records of several documents. A document that is a single
/// map counts as a source with one record.
pub fn run_align(sources: &[PathBuf]) -> Result<AlignOutcome> {
    let _span = info_span!("align", sources = sources.len()).entered();
    if sources.is_empty() {
        bail!("align needs at least one source");
    }
    let mut loaded = Vec::with_capacity(sources.len());
    for path in sources {
        loaded.push(records_of(load(path)?));
    }

    let columns: Vec<PathBuf> = sources
        .iter()
        .zip(&loaded)
        .filter(|(_, records)| !records.is_empty())
        .map(|(path, _)| path.clone())
        .collect();
    let probes: Vec<&Node> = loaded.iter().filter_map(|records| records.first()).collect();
    let matrix = build_match_matrix(&probes);

    let records = align(&loaded).map_err(|error| {
        let source = sources
            .get(error_source(&error))
            .map_or_else(String::new, |path| path.display().to_string());
        anyhow::Error::new(error).context(format!("align {source}"))
    })?;
    info!(
        fields = matrix.len(),
        records = records.len(),
        "align complete"
    );
    Ok(AlignOutcome {
        matrix,
        columns,
        records,
    })
}

fn error_source(error: &AlignError) -> usize {
    match error {
        AlignError::Shape { source_index, .. } => *source_index,
    }
}

fn records_of(document: Node) -> Vec<Node> {
    match document {
        Node::Array(records) => records,
        Node::Null => Vec::new(),
        other => vec![other],
    }
}

pub fn run_translate(input: &Path, lang: &str, concepts: &Path, refresh: bool) -> Result<Node> {
    let _span = info_span!("translate", input = %input.display(), lang).entered();
    let table = load(concepts)?;
    let resolver = StaticConceptResolver::from_node(&table)
        .with_context(|| format!("read concepts from {}", concepts.display()))?;
    Ok(translate(&load(input)?, lang, &resolver, refresh))
}

pub fn converter_names() -> Vec<String> {
    let mut names: Vec<String> = Converters::default().names().map(str::to_string).collect();
    names.sort();
    names
}

/// Writes `tree` to `output` (format by extension) or pretty JSON to stdout.
pub fn emit(tree: &Node, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_document(path, tree).with_context(|| format!("write {}", path.display()))?;
            info!(output = %path.display(), "wrote output");
        }
        None => println!("{}", serde_json::to_string_pretty(tree).context("render output")?),
    }
    Ok(())
}
