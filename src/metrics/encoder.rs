//! Text exposition format, version 0.0.4.

use std::fmt::{self, Write};

use super::snapshot::{LabelSet, MetricFamily, SeriesValue};

/// Content type served alongside encoded output.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Renders metric families as text. Identical input always yields identical bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextEncoder;

impl TextEncoder {
    pub fn new() -> Self {
        TextEncoder
    }

    pub fn content_type(&self) -> &'static str {
        TEXT_CONTENT_TYPE
    }

    pub fn encode<W: Write>(&self, families: &[MetricFamily], out: &mut W) -> fmt::Result {
        for family in families {
            encode_family(family, out)?;
        }
        Ok(())
    }

    pub fn encode_to_string(&self, families: &[MetricFamily]) -> String {
        let mut out = String::new();
        let _ = self.encode(families, &mut out);
        out
    }
}

fn encode_family<W: Write>(family: &MetricFamily, out: &mut W) -> fmt::Result {
    let name = family.desc.name();
    writeln!(out, "# HELP {} {}", name, escape_help(family.desc.help()))?;
    writeln!(out, "# TYPE {} {}", name, family.desc.kind())?;

    for sample in &family.samples {
        let labels = &sample.labels;
        match &sample.value {
            SeriesValue::Counter(v) | SeriesValue::Gauge(v) => {
                write_line(out, name, "", labels, None, &format_float(*v))?;
            }
            SeriesValue::Histogram(h) => {
                for (bound, count) in &h.buckets {
                    let le = ("le", format_float(*bound));
                    write_line(out, name, "_bucket", labels, Some(le), &count.to_string())?;
                }
                let inf = ("le", "+Inf".to_string());
                write_line(out, name, "_bucket", labels, Some(inf), &h.count.to_string())?;
                write_line(out, name, "_sum", labels, None, &format_float(h.sum))?;
                write_line(out, name, "_count", labels, None, &h.count.to_string())?;
            }
            SeriesValue::Summary(s) => {
                for (q, v) in &s.quantiles {
                    let quantile = ("quantile", format_float(*q));
                    write_line(out, name, "", labels, Some(quantile), &format_float(*v))?;
                }
                write_line(out, name, "_sum", labels, None, &format_float(s.sum))?;
                write_line(out, name, "_count", labels, None, &s.count.to_string())?;
            }
        }
    }
    Ok(())
}

fn write_line<W: Write>(
    out: &mut W,
    name: &str,
    suffix: &str,
    labels: &LabelSet,
    extra: Option<(&str, String)>,
    value: &str,
) -> fmt::Result {
    out.write_str(name)?;
    out.write_str(suffix)?;

    let mut pairs = labels
        .pairs()
        .iter()
        .map(|(n, v)| (n.as_str(), v.as_str()))
        .chain(extra.as_ref().map(|(n, v)| (*n, v.as_str())))
        .peekable();

    if pairs.peek().is_some() {
        out.write_char('{')?;
        for (i, (label, label_value)) in pairs.enumerate() {
            if i > 0 {
                out.write_char(',')?;
            }
            write!(out, "{}=\"{}\"", label, escape_label_value(label_value))?;
        }
        out.write_char('}')?;
    }

    writeln!(out, " {}", value)
}

/// Formats a sample value or bound the way scrapers expect special floats.
pub fn format_float(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v == f64::INFINITY {
        "+Inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        v.to_string()
    }
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{HistogramOpts, Opts, Registry, SummaryOpts};

    #[test]
    fn renders_counter_and_labels() {
        let registry = Registry::new();
        let total = registry
            .register_counter(Opts::new("requests_total", "Total requests."))
            .unwrap();
        let codes = registry
            .register_counter_vec(Opts::new("status_codes", "Codes."), &["code", "method"])
            .unwrap();
        total.inc_by(3000.0).unwrap();
        codes.with_label_values(&["200", "GET"]).unwrap().inc();

        let expected = "\
# HELP requests_total Total requests.
# TYPE requests_total counter
requests_total 3000
# HELP status_codes Codes.
# TYPE status_codes counter
status_codes{code=\"200\",method=\"GET\"} 1
";
        assert_eq!(registry.render(), expected);
    }

    #[test]
    fn renders_histogram_buckets_sum_and_count() {
        let registry = Registry::new();
        let h = registry
            .register_histogram(
                HistogramOpts::new("latency_ms", "Latency.").buckets(vec![0.0, 10.0, 20.0]),
            )
            .unwrap();
        for v in [5.0, 15.0, 25.0] {
            h.observe(v).unwrap();
        }

        let expected = "\
# HELP latency_ms Latency.
# TYPE latency_ms histogram
latency_ms_bucket{le=\"0\"} 0
latency_ms_bucket{le=\"10\"} 1
latency_ms_bucket{le=\"20\"} 2
latency_ms_bucket{le=\"+Inf\"} 3
latency_ms_sum 45
latency_ms_count 3
";
        assert_eq!(registry.render(), expected);
    }

    #[test]
    fn renders_labeled_summary() {
        let registry = Registry::new();
        let s = registry
            .register_summary_vec(
                SummaryOpts::new("work_ms", "Work.").objectives(vec![(0.5, 0.05)]),
                &["job"],
            )
            .unwrap();
        s.with_label_values(&["import"]).unwrap().observe(4.0).unwrap();

        let expected = "\
# HELP work_ms Work.
# TYPE work_ms summary
work_ms{job=\"import\",quantile=\"0.5\"} 4
work_ms_sum{job=\"import\"} 4
work_ms_count{job=\"import\"} 1
";
        assert_eq!(registry.render(), expected);
    }

    #[test]
    fn escapes_help_and_label_values() {
        let registry = Registry::new();
        let g = registry
            .register_gauge_vec(Opts::new("odd", "line one\nback\\slash"), &["v"])
            .unwrap();
        g.with_label_values(&["say \"hi\"\n"]).unwrap().set(f64::NEG_INFINITY);

        let rendered = registry.render();
        assert!(rendered.contains("# HELP odd line one\\nback\\\\slash\n"));
        assert!(rendered.contains("odd{v=\"say \\\"hi\\\"\\n\"} -Inf\n"));
    }

    #[test]
    fn family_without_series_renders_only_headers() {
        let registry = Registry::new();
        registry
            .register_counter_vec(Opts::new("unused_total", "Never touched."), &["x"])
            .unwrap();
        assert_eq!(
            registry.render(),
            "# HELP unused_total Never touched.\n# TYPE unused_total counter\n"
        );
    }

    #[test]
    fn special_floats() {
        assert_eq!(format_float(f64::NAN), "NaN");
        assert_eq!(format_float(f64::INFINITY), "+Inf");
        assert_eq!(format_float(0.25), "0.25");
        assert_eq!(format_float(190.0), "190");
    }
}
