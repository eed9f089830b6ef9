use crate::graph::Reached;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct ReachedRow {
    #[tabled(rename = "Depth")]
    pub depth: usize,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "File")]
    pub path: String,
}

impl From<&Reached> for ReachedRow {
    fn from(reached: &Reached) -> Self {
        Self {
            depth: reached.depth,
            kind: reached.id.kind.to_string(),
            path: reached.id.path.clone(),
        }
    }
}

pub fn stats_table(stats: &[(&str, String)]) -> String {
    let rows: Vec<TableRow> = stats
        .iter()
        .map(|(label, value)| TableRow {
            metric: label.to_string(),
            value: value.clone(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(&rows).with(Style::rounded()).to_string()
}

/// Nodes found by a graph walk, nearest first
pub fn reached_table(reached: &[Reached]) -> String {
    let rows: Vec<ReachedRow> = reached.iter().map(ReachedRow::from).collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::NodeKind;
    use crate::node::NodeId;

    #[test]
    fn test_stats_table() {
        assert!(stats_table(&[]).is_empty());
        let table = stats_table(&[("Style sheets", "2".to_string())]);
        assert!(table.contains("Metric"));
        assert!(table.contains("Style sheets"));
    }

    #[test]
    fn test_reached_table() {
        let reached = vec![Reached {
            id: NodeId::new(NodeKind::Style, "/p/base.css"),
            depth: 2,
        }];
        let table = reached_table(&reached);
        assert!(table.contains("/p/base.css"));
        assert!(table.contains("style"));
    }
}
