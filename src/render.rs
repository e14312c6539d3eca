//! Terminal rendering for agenda-core types.
//!
//! Extension traits that add colored output with owo_colors.

use agenda_core::contacts::KnownContact;
use agenda_core::{ParsedMeeting, Reply, ScheduleOutcome};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ParsedMeeting {
    fn render(&self) -> String {
        let mut lines = vec![format!("  📅 {}", self.title.bold())];

        let when = match (&self.date_label, self.start_time, self.end_time) {
            (label, Some(start), Some(end)) if !label.is_empty() => {
                format!("{} · {}–{}", label, start.format("%H:%M"), end.format("%H:%M"))
            }
            (label, _, _) if !label.is_empty() => label.clone(),
            (_, Some(start), Some(end)) => format!("{}–{}", start.format("%H:%M"), end.format("%H:%M")),
            _ => String::new(),
        };
        if !when.is_empty() {
            lines.push(format!("     {}", when));
        }

        for (email, name) in self.attendees() {
            lines.push(format!("     👥 {} {}", name, format!("<{}>", email).dimmed()));
        }
        if !self.description.is_empty() {
            lines.push(format!("     {}", self.description.dimmed()));
        }
        lines.join("\n")
    }
}

impl Render for Reply {
    fn render(&self) -> String {
        match self {
            Reply::Proposal(meeting) => format!("{}\n\n{}", indent(self.text()), meeting.render()),
            Reply::FollowUp { message, .. } => indent(&bold_markdown(message)),
            Reply::Message(text) => indent(&bold_markdown(text)),
        }
    }
}

impl Render for ScheduleOutcome {
    fn render(&self) -> String {
        if self.is_success() {
            let mut lines = vec![format!(
                "  {}",
                self.message.as_deref().unwrap_or("Reunião agendada").green()
            )];
            if let Some(link) = &self.conferencing_link {
                lines.push(format!("  🔗 {}", link.cyan()));
            }
            if let Some(id) = &self.calendar_event_id {
                lines.push(format!("  {}", format!("evento {}", id).dimmed()));
            }
            lines.join("\n")
        } else {
            format!(
                "  {}",
                format!(
                    "Não foi possível agendar: {}",
                    self.message.as_deref().unwrap_or("erro desconhecido")
                )
                .red()
            )
        }
    }
}

impl Render for KnownContact {
    fn render(&self) -> String {
        format!(
            "  {} {}  {}",
            self.name,
            format!("<{}>", self.email).dimmed(),
            format!("{} reunião(ões)", self.meeting_count).dimmed()
        )
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("  {}", line) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render `**bold**` spans from model and follow-up text in bold.
fn bold_markdown(text: &str) -> String {
    text.split("**")
        .enumerate()
        .map(|(i, part)| if i % 2 == 1 { part.bold().to_string() } else { part.to_string() })
        .collect()
}
