//! Plain text rendering of simulation records.

use std::fmt::{self, Write};

use scheduler::{FinalReport, Pid, ReportSink, TickEvent};

/// Collects the text of a run: optional per-tick lines and the final table
#[derive(Debug)]
pub struct TextSink {
    trace: bool,
    out: String,
    /// First formatting failure, reported by `into_text`
    status: fmt::Result,
}

impl TextSink {
    pub fn new(trace: bool) -> TextSink {
        TextSink {
            trace,
            out: String::new(),
            status: Ok(()),
        }
    }

    pub fn into_text(self) -> Result<String, fmt::Error> {
        self.status.map(|()| self.out)
    }
}

fn pids(list: &[Pid]) -> String {
    if list.is_empty() {
        return "-".to_owned();
    }
    list.iter()
        .map(Pid::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `[P1 P2] [P3]`, one group per priority level
fn levels(ready: &[Vec<Pid>]) -> String {
    if let [single] = ready {
        return pids(single);
    }
    ready
        .iter()
        .map(|level| format!("[{}]", pids(level)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One trace line, without the newline
pub fn write_tick(out: &mut impl Write, event: &TickEvent) -> fmt::Result {
    let running = event
        .running
        .map_or_else(|| "idle".to_owned(), |pid| pid.to_string());

    write!(
        out,
        "t={:<5} running: {:<5} ready: {}  waiting: {}",
        event.tick.get(),
        running,
        levels(&event.ready),
        pids(&event.waiting)
    )?;
    if !event.transitions.is_empty() {
        let applied: Vec<String> = event
            .transitions
            .iter()
            .map(|record| format!("{} {}", record.transition, record.pid))
            .collect();
        write!(out, "  ({})", applied.join(", "))?;
    }
    Ok(())
}

pub fn write_report(out: &mut impl Write, report: &FinalReport) -> fmt::Result {
    writeln!(out, "== {} ==", report.policy)?;
    if !report.complete {
        writeln!(out, "(stopped at the horizon, figures are partial)")?;
    }
    writeln!(
        out,
        "{:<6}{:>9}{:>9}{:>9}{:>12}{:>10}{:>13}",
        "pid", "waiting", "cpu", "io", "turnaround", "response", "termination"
    )?;

    let optional = |value: Option<usize>| value.map_or_else(|| "-".to_owned(), |v| v.to_string());
    for stats in &report.processes {
        writeln!(
            out,
            "{:<6}{:>9}{:>9}{:>9}{:>12}{:>10}{:>13}",
            stats.pid.to_string(),
            stats.waiting_time,
            stats.cpu_time,
            stats.io_time,
            stats.turnaround,
            optional(stats.response_time),
            optional(stats.termination_time)
        )?;
    }

    writeln!(
        out,
        "average waiting {:.2}, turnaround {:.2}, response {:.2}",
        report.averages.waiting_time, report.averages.turnaround, report.averages.response_time
    )?;
    writeln!(
        out,
        "total time {}, idle {}, cpu utilization {:.2}%",
        report.total_ticks, report.idle_ticks, report.cpu_utilization
    )?;
    writeln!(out, "termination order: {}", pids(&report.termination_order))
}

impl ReportSink for TextSink {
    fn tick(&mut self, event: &TickEvent) {
        if self.trace && self.status.is_ok() {
            self.status = write_tick(&mut self.out, event).and_then(|()| writeln!(self.out));
        }
    }

    fn finish(&mut self, report: &FinalReport) {
        if self.status.is_err() {
            return;
        }
        if self.trace {
            self.out.push('\n');
        }
        self.status = write_report(&mut self.out, report);
    }
}
