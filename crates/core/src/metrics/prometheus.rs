//! Prometheus text exposition of the registry

use std::fmt::Write;

use crate::metrics::{MetricsRegistry, SUCCESS_LABEL};

/// Export every registered series in Prometheus text format
pub fn export_prometheus(registry: &MetricsRegistry) -> String {
    let mut output = String::new();

    for series in registry.series() {
        let name = series.name();
        let dest_label = &series.opts().destination_label;
        let _ = writeln!(&mut output, "# HELP {name} {}", escape_help(&series.opts().help));
        let _ = writeln!(&mut output, "# TYPE {name} histogram");

        for (destination, success, histogram) in series.children() {
            let labels = format!(
                "{dest_label}=\"{}\",{SUCCESS_LABEL}=\"{success}\"",
                escape_label(&destination)
            );
            let snapshot = histogram.snapshot();
            for (bound, cumulative) in &snapshot.buckets {
                let _ = writeln!(
                    &mut output,
                    "{name}_bucket{{{labels},le=\"{bound}\"}} {cumulative}"
                );
            }
            let _ = writeln!(
                &mut output,
                "{name}_bucket{{{labels},le=\"+Inf\"}} {}",
                snapshot.count
            );
            let _ = writeln!(&mut output, "{name}_sum{{{labels}}} {}", snapshot.sum);
            let _ = writeln!(&mut output, "{name}_count{{{labels}}} {}", snapshot.count);
        }
    }

    output
}

/// JSON snapshot of the registry for logging
pub fn create_metrics_snapshot(registry: &MetricsRegistry) -> serde_json::Value {
    registry
        .series()
        .into_iter()
        .map(|series| {
            let children: Vec<_> = series
                .children()
                .into_iter()
                .map(|(destination, success, histogram)| {
                    let snapshot = histogram.snapshot();
                    let mut entry = serde_json::Map::new();
                    entry.insert(series.opts().destination_label.clone(), destination.into());
                    entry.insert(SUCCESS_LABEL.to_string(), success.into());
                    entry.insert("count".to_string(), snapshot.count.into());
                    entry.insert("sum".to_string(), snapshot.sum.into());
                    serde_json::Value::Object(entry)
                })
                .collect();
            (series.name().to_string(), serde_json::Value::Array(children))
        })
        .collect::<serde_json::Map<_, _>>()
        .into()
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_help(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\n', "\\n")
}
