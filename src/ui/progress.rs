use crate::graph::GraphStats;
use crate::kind::NodeKind;
use crate::ui::progress_message::ProgressMessage;
use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, MultiProgress, ProgressBar};
use owo_colors::OwoColorize;
use std::thread;
use std::time::Duration;

/// One spinner per node kind, driven by scanner messages
pub struct ProgressManager {
    mp: MultiProgress,
    _handle: thread::JoinHandle<()>,
}

impl ProgressManager {
    pub fn new(visible: bool) -> (Self, crossbeam::channel::Sender<ProgressMessage>) {
        let (tx, rx) = crossbeam::channel::unbounded::<ProgressMessage>();

        let mp = MultiProgress::new();
        let show = visible && console::Term::stdout().is_term();
        let spinners: Vec<(NodeKind, ProgressBar)> = NodeKind::all()
            .iter()
            .map(|kind| {
                let pb = if show {
                    mp.add(ProgressBar::new_spinner())
                } else {
                    ProgressBar::hidden()
                };
                pb.set_message(format!("Waiting for {} files", kind));
                (*kind, pb)
            })
            .collect();

        let mp_clone = mp.clone();
        let handle = thread::spawn(move || {
            let spinner = |kind: NodeKind| {
                spinners
                    .iter()
                    .find(|(k, _)| *k == kind)
                    .map(|(_, pb)| pb)
            };

            for msg in rx {
                match msg {
                    ProgressMessage::Started { phase, pass, total } => {
                        if let Some(pb) = spinner(phase) {
                            pb.enable_steady_tick(Duration::from_millis(100));
                            pb.set_length(total as u64);
                            pb.set_position(0);
                            pb.set_message(format!("Scanning {} files (pass {}, {} queued)", phase, pass, total));
                        }
                    }
                    ProgressMessage::Progress { phase, file } => {
                        if let Some(pb) = spinner(phase) {
                            pb.inc(1);
                            if let Some(ref f) = file {
                                pb.set_message(format!("Scanning: {}", f));
                            }
                        }
                    }
                    ProgressMessage::Finished { phase, passes } => {
                        if let Some(pb) = spinner(phase) {
                            pb.finish_with_message(format!("{} done ({} passes)", phase, passes));
                        }
                    }
                    ProgressMessage::Error(e) => {
                        if show {
                            mp_clone
                                .println(format!("{} {}", Icons::WARN, e.style(theme().warn.clone())))
                                .ok();
                        }
                    }
                }
            }
        });

        (Self { mp, _handle: handle }, tx)
    }

    pub fn clear(&self) {
        self.mp.clear().ok();
    }

    pub fn finish_with_summary(&self, duration: Duration, stats: &GraphStats) {
        self.clear();
        println!();
        println!(
            "{} {}",
            Icons::CHECK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}  {} {}",
            Icons::FILE.style(theme().info.clone()),
            stats.markup + stats.style + stats.script,
            Icons::LINK.style(theme().info.clone()),
            stats.edges,
            Icons::CROSS.style(theme().info.clone()),
            stats.unreadable
        );
    }
}
