//! Metric descriptors and options.

use std::fmt;

use super::error::{MetricsError, Result};

/// The four metric kinds understood by the exposition format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
    Histogram,
}

impl MetricKind {
    /// Lower-case name used on `# TYPE` lines.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Summary => "summary",
            MetricKind::Histogram => "histogram",
        }
    }

    /// Label name reserved by the kind's expanded exposition lines.
    fn reserved_label(self) -> Option<&'static str> {
        match self {
            MetricKind::Histogram => Some("le"),
            MetricKind::Summary => Some("quantile"),
            MetricKind::Counter | MetricKind::Gauge => None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Name and help text shared by every metric kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opts {
    pub name: String,
    pub help: String,
}

impl Opts {
    pub fn new(name: impl Into<String>, help: impl Into<String>) -> Self {
        Opts {
            name: name.into(),
            help: help.into(),
        }
    }
}

/// Immutable identity of a registered metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    name: String,
    help: String,
    kind: MetricKind,
    label_names: Vec<String>,
}

impl Desc {
    /// Builds and validates a descriptor.
    pub fn new(opts: &Opts, kind: MetricKind, label_names: &[&str]) -> Result<Self> {
        if !is_valid_metric_name(&opts.name) {
            return Err(MetricsError::InvalidDescriptor(format!(
                "'{}' is not a valid metric name",
                opts.name
            )));
        }

        let mut names: Vec<String> = Vec::with_capacity(label_names.len());
        for label in label_names {
            if !is_valid_label_name(label) {
                return Err(MetricsError::InvalidDescriptor(format!(
                    "'{}' is not a valid label name for metric '{}'",
                    label, opts.name
                )));
            }
            if kind.reserved_label() == Some(*label) {
                return Err(MetricsError::InvalidDescriptor(format!(
                    "label '{}' is reserved for {} metric '{}'",
                    label, kind, opts.name
                )));
            }
            if names.iter().any(|n| n == label) {
                return Err(MetricsError::InvalidDescriptor(format!(
                    "label '{}' is repeated in metric '{}'",
                    label, opts.name
                )));
            }
            names.push((*label).to_string());
        }

        Ok(Desc {
            name: opts.name.clone(),
            help: opts.help.clone(),
            kind,
            label_names: names,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Checks positional label values against the descriptor's arity.
    pub(crate) fn resolve_values(&self, values: &[&str]) -> Result<Vec<String>> {
        if values.len() != self.label_names.len() {
            return Err(self.shape_error(values.iter().map(|v| v.to_string()).collect()));
        }
        Ok(values.iter().map(|v| v.to_string()).collect())
    }

    /// Orders `(name, value)` pairs by the descriptor's label names.
    ///
    /// The pairs may come in any order but must name every label exactly once.
    pub(crate) fn resolve_pairs(&self, pairs: &[(&str, &str)]) -> Result<Vec<String>> {
        let given = || -> Vec<String> {
            pairs.iter().map(|(name, _)| name.to_string()).collect()
        };
        if pairs.len() != self.label_names.len() {
            return Err(self.shape_error(given()));
        }

        let mut values = Vec::with_capacity(pairs.len());
        for label in &self.label_names {
            match pairs.iter().find(|(name, _)| *name == label.as_str()) {
                Some((_, value)) => values.push(value.to_string()),
                None => return Err(self.shape_error(given())),
            }
        }
        Ok(values)
    }

    fn shape_error(&self, got: Vec<String>) -> MetricsError {
        MetricsError::UnknownLabelSetShape {
            name: self.name.clone(),
            expected: self.label_names.clone(),
            got,
        }
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
