//! Renderer contract
//!
//! Renderers are pure presentation: Resource in, strings out. No I/O,
//! and no failures: missing data renders as a dash, type mismatches
//! fall back to defaults.

use super::navigate::NavTarget;
use super::resource::{Resource, Tags};

/// Pure column getter. Plain function pointers keep renderers cheap to
/// construct on every frame.
pub type Getter = fn(&dyn Resource) -> String;

/// One table column: header, preferred width, and a drop priority used
/// under narrow terminals. Priority 0 is never dropped; higher numbers
/// go first.
pub struct Column {
    pub name: &'static str,
    pub width: u16,
    pub priority: u8,
    pub get: Getter,
}

impl Column {
    pub fn new(name: &'static str, width: u16, priority: u8, get: Getter) -> Self {
        Self {
            name,
            width,
            priority,
            get,
        }
    }
}

/// Label/value pair for the header summary panel
pub struct SummaryEntry {
    pub label: &'static str,
    pub value: String,
}

/// Maps a [`Resource`] to table rows, a detail view, and a header
/// summary. Implementations override only what differs from the
/// defaults.
pub trait Renderer: Send + Sync {
    fn columns(&self) -> Vec<Column>;

    fn render_row(&self, resource: &dyn Resource) -> Vec<String> {
        self.columns()
            .iter()
            .map(|c| (c.get)(resource))
            .collect()
    }

    fn render_detail(&self, resource: &dyn Resource) -> String {
        let mut out = detail_section(
            "Identity",
            &[
                ("ID", resource.id().to_string()),
                ("Name", resource.name().to_string()),
                ("ARN", resource.arn().to_string()),
            ],
        );

        let tags = resource.tags();
        if !tags.is_empty() {
            out.push('\n');
            out.push_str(&detail_section(
                "Tags",
                &tags
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.clone()))
                    .collect::<Vec<_>>(),
            ));
        }

        out.push('\n');
        out.push_str("Raw\n");
        out.push_str(
            &serde_json::to_string_pretty(resource.raw()).unwrap_or_else(|_| "{}".to_string()),
        );
        out
    }

    fn render_summary(&self, resource: &dyn Resource) -> Vec<SummaryEntry> {
        let mut entries = vec![
            SummaryEntry {
                label: "ID",
                value: resource.id().to_string(),
            },
            SummaryEntry {
                label: "Name",
                value: resource.name().to_string(),
            },
        ];
        if !resource.arn().is_empty() {
            entries.push(SummaryEntry {
                label: "ARN",
                value: resource.arn().to_string(),
            });
        }
        entries
    }

    /// Cross-resource jump: the view this resource models, if any.
    fn navigate(&self, _resource: &dyn Resource) -> Option<NavTarget> {
        None
    }

    /// Child view to enter on this resource (stack -> stack resources).
    fn drill(&self, _resource: &dyn Resource) -> Option<NavTarget> {
        None
    }
}

/// Pick the columns that fit a terminal of `width` cells.
///
/// Drops the highest-priority-number columns first until the remaining
/// widths (plus one separator cell each) fit; the first column always
/// survives. Returns kept indices in their original order.
pub fn fit_columns(columns: &[Column], width: u16) -> Vec<usize> {
    let total = |kept: &[usize]| -> u32 {
        kept.iter()
            .map(|&i| columns[i].width as u32 + 1)
            .sum::<u32>()
    };

    let mut kept: Vec<usize> = (0..columns.len()).collect();

    while kept.len() > 1 && total(&kept) > width as u32 {
        // Drop the least important remaining column, right-most on ties.
        let drop_pos = kept
            .iter()
            .enumerate()
            .skip(1)
            .max_by_key(|(_, &i)| columns[i].priority)
            .map(|(pos, _)| pos);
        match drop_pos {
            Some(pos) => {
                kept.remove(pos);
            }
            None => break,
        }
    }

    kept
}

/// Empty values display as a dash.
pub fn or_dash(value: String) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value
    }
}

/// Tags as a single `k=v, k=v` cell.
pub fn format_tags(tags: &Tags) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }
    tags.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(", ")
}

/// One titled block of aligned label/value lines.
pub fn detail_section(title: &str, entries: &[(&str, String)]) -> String {
    let label_width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);

    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for (label, value) in entries {
        out.push_str(&format!(
            "  {:<width$}  {}\n",
            label,
            or_dash(value.clone()),
            width = label_width
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::resource::JsonResource;
    use serde_json::json;

    fn id_getter(r: &dyn Resource) -> String {
        r.id().to_string()
    }

    fn columns() -> Vec<Column> {
        vec![
            Column::new("ID", 20, 0, id_getter),
            Column::new("Name", 20, 1, id_getter),
            Column::new("State", 10, 2, id_getter),
            Column::new("AZ", 15, 3, id_getter),
        ]
    }

    #[test]
    fn wide_terminal_keeps_everything() {
        assert_eq!(fit_columns(&columns(), 120), vec![0, 1, 2, 3]);
    }

    #[test]
    fn narrow_terminal_drops_low_priority_first() {
        // 68 cells fits ID+Name+State (53) but not AZ too (69).
        assert_eq!(fit_columns(&columns(), 68), vec![0, 1, 2]);
    }

    #[test]
    fn first_column_always_survives() {
        assert_eq!(fit_columns(&columns(), 5), vec![0]);
    }

    #[test]
    fn default_row_applies_getters_in_order() {
        struct R;
        impl Renderer for R {
            fn columns(&self) -> Vec<Column> {
                vec![
                    Column::new("ID", 10, 0, |r| r.id().to_string()),
                    Column::new("Name", 10, 1, |r| r.name().to_string()),
                ]
            }
        }

        let resource = JsonResource::new(json!({"id": "r-1", "name": "web"}), "id", "name", "");
        assert_eq!(R.render_row(&resource), vec!["r-1", "web"]);
    }

    #[test]
    fn tags_format_deterministically() {
        let mut tags = Tags::new();
        tags.insert("env".into(), "prod".into());
        tags.insert("app".into(), "api".into());
        assert_eq!(format_tags(&tags), "app=api, env=prod");
        assert_eq!(format_tags(&Tags::new()), "-");
    }
}
