use std::path::Path;

use iced::{
    widget::{button, column, pick_list, progress_bar, row, scrollable, text, text_input, Column, Space},
    Element, Length,
};

use crate::domain::{CatalogEntry, FetchError, FetchEvent, FetchPhase, Progress};
use crate::utils::{clock_stamp, format_bytes, get_timestamp};

/// Lines kept in the activity pane
const ACTIVITY_LIMIT: usize = 200;
/// Percentage step between progress lines in the activity pane
const LOG_STEP_PERCENT: f32 = 5.0;

/// Main view state
pub struct DownloadView {
    pub entries: Vec<CatalogEntry>,
    pub selected: Option<CatalogEntry>,
    pub destination: String,
    pub status_message: String,
    pub phase: FetchPhase,
    pub progress: Option<Progress>,
    pub activity: Vec<String>,
    next_log_percent: f32,
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    EntrySelected(CatalogEntry),
    DestinationChanged(String),
    BrowsePressed,
    DownloadPressed,
    CancelPressed,
}

impl DownloadView {
    pub fn new(entries: &[CatalogEntry]) -> Self {
        Self {
            entries: entries.to_vec(),
            selected: entries.first().copied(),
            destination: String::new(),
            status_message: "Pick a download and a destination folder".to_string(),
            phase: FetchPhase::Idle,
            progress: None,
            activity: Vec::new(),
            next_log_percent: LOG_STEP_PERCENT,
        }
    }

    pub fn is_downloading(&self) -> bool {
        self.phase.is_active()
    }

    pub fn can_start(&self) -> bool {
        !self.is_downloading() && self.selected.is_some() && !self.destination.trim().is_empty()
    }

    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::EntrySelected(entry) => {
                self.selected = Some(entry);
            }
            DownloadMessage::DestinationChanged(destination) => {
                self.destination = destination;
            }
            DownloadMessage::BrowsePressed
            | DownloadMessage::DownloadPressed
            | DownloadMessage::CancelPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn log(&mut self, message: impl Into<String>) {
        let line = format!("{} {}", clock_stamp(get_timestamp()), message.into());
        self.activity.push(line);
        if self.activity.len() > ACTIVITY_LIMIT {
            let excess = self.activity.len() - ACTIVITY_LIMIT;
            self.activity.drain(..excess);
        }
    }

    /// Reset per-fetch state when a new fetch is launched
    pub fn begin(&mut self, entry: &CatalogEntry, destination: &Path) {
        self.phase = FetchPhase::Validating;
        self.progress = None;
        self.next_log_percent = LOG_STEP_PERCENT;
        self.status_message = format!("Retrieving: {}", entry.name);
        self.log(format!("Starting download: {}", entry.name));
        self.log(format!("Target directory: {}", destination.display()));
    }

    pub fn apply(&mut self, event: &FetchEvent) {
        match event {
            FetchEvent::Phase(phase) => {
                self.phase = *phase;
                match phase {
                    FetchPhase::Connecting => {
                        self.status_message = "Connecting...".to_string();
                    }
                    FetchPhase::Transferring => {
                        self.status_message = "Downloading...".to_string();
                    }
                    _ => {}
                }
            }
            FetchEvent::Progress(progress) => {
                self.progress = Some(*progress);
                match progress.fraction() {
                    Some(fraction) => {
                        let percent = fraction * 100.0;
                        self.status_message = format!("Downloading... {:.1}%", percent);
                        if percent >= self.next_log_percent {
                            self.log(format!("Downloading... {:.1}%", percent));
                            while self.next_log_percent <= percent {
                                self.next_log_percent += LOG_STEP_PERCENT;
                            }
                        }
                    }
                    None => {
                        self.status_message =
                            format!("Downloading... {}", format_bytes(progress.received));
                    }
                }
            }
            FetchEvent::Finished(result) => {
                self.phase = FetchPhase::from_result(result);
                self.status_message = match result {
                    Ok(done) => format!(
                        "Saved: {} ({})",
                        done.path.display(),
                        format_bytes(done.bytes_written)
                    ),
                    Err(FetchError::Cancelled) => "Download cancelled".to_string(),
                    Err(err) => format!("Download failed: {}", err),
                };
                let line = self.status_message.clone();
                self.log(line);
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let busy = self.is_downloading();

        let progress: Element<'_, DownloadMessage> = match self.progress {
            Some(progress) => match progress.fraction() {
                Some(fraction) => progress_bar(0.0..=1.0, fraction).into(),
                None => text(format!("{} received", format_bytes(progress.received)))
                    .size(14)
                    .into(),
            },
            None => progress_bar(0.0..=1.0, 0.0).into(),
        };

        let activity = Column::with_children(
            self.activity
                .iter()
                .map(|line| Element::from(text(line).size(12))),
        )
        .spacing(2);

        column![
            text("Catalog Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("Download:").size(16),
            pick_list(
                self.entries.as_slice(),
                self.selected,
                DownloadMessage::EntrySelected
            )
            .placeholder("Pick a download...")
            .width(Length::Fill),
            text("Destination folder:").size(16),
            row![
                text_input("Choose a folder...", &self.destination)
                    .on_input_maybe((!busy).then_some(DownloadMessage::DestinationChanged))
                    .padding(10)
                    .width(Length::Fill),
                button("Browse...")
                    .on_press_maybe((!busy).then_some(DownloadMessage::BrowsePressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            progress,
            text(&self.status_message).size(14),
            row![
                button("Download")
                    .on_press_maybe(self.can_start().then_some(DownloadMessage::DownloadPressed))
                    .padding([10, 20]),
                button("Cancel")
                    .on_press_maybe(busy.then_some(DownloadMessage::CancelPressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
            Space::new().height(Length::Fixed(10.0)),
            text("Activity").size(16),
            scrollable(activity).height(Length::Fill),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
