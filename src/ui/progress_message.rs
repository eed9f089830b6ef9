use crate::kind::NodeKind;

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressMessage {
    /// A sweep pass over `phase` nodes began
    Started {
        phase: NodeKind,
        pass: usize,
        total: usize,
    },
    /// One file of the current pass was scanned
    Progress {
        phase: NodeKind,
        file: Option<String>,
    },
    /// The kind reached its fixed point
    Finished {
        phase: NodeKind,
        passes: usize,
    },
    Error(String),
}
