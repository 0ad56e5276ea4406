use std::path::PathBuf;

use futures::StreamExt;
use iced::{window, Subscription, Task};
use tracing::{debug, info};

use crate::application::{CancelHandle, Downloader};
use crate::domain::{Catalog, FetchEvent};
use crate::ui::{DownloadMessage, DownloadView};

pub struct DownloadApp {
    view: DownloadView,
    downloader: Downloader,
    // Cancel handle of the fetch in flight, if any
    active: Option<CancelHandle>,
    // Window waiting for the active fetch to wind down before closing
    close_after_fetch: Option<window::Id>,
}

impl DownloadApp {
    pub fn new(catalog: Catalog, downloader: Downloader) -> Self {
        Self {
            view: DownloadView::new(catalog.entries()),
            downloader,
            active: None,
            close_after_fetch: None,
        }
    }

    fn start_download(&mut self) -> Task<Message> {
        if self.active.is_some() || !self.view.can_start() {
            return Task::none();
        }
        let Some(entry) = self.view.selected else {
            return Task::none();
        };

        let destination = PathBuf::from(self.view.destination.trim());
        self.view.begin(&entry, &destination);

        // The fetch runs on the executor; its events come back as messages.
        let handle = self.downloader.start(entry, destination);
        self.active = Some(handle.cancel);
        Task::stream(handle.events.map(Message::Fetch))
    }

    fn cancel_download(&mut self) {
        if let Some(cancel) = &self.active {
            info!("cancellation requested");
            cancel.cancel();
            self.view.status_message = "Cancelling...".to_string();
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    /// Folder chosen in the picker, `None` if the dialog was dismissed
    DestinationPicked(Option<PathBuf>),
    Fetch(FetchEvent),
    CloseRequested(window::Id),
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::BrowsePressed if !app.view.is_downloading() => {
                    let initial = if app.view.destination.trim().is_empty() {
                        std::env::current_dir().unwrap_or_default()
                    } else {
                        PathBuf::from(app.view.destination.trim())
                    };

                    return Task::perform(
                        async move {
                            rfd::AsyncFileDialog::new()
                                .set_directory(&initial)
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::DestinationPicked,
                    );
                }
                DownloadMessage::DownloadPressed => return app.start_download(),
                DownloadMessage::CancelPressed => app.cancel_download(),
                _ => {}
            }
        }
        Message::DestinationPicked(Some(path)) => {
            app.view.destination = path.display().to_string();
            app.view.status_message = "Ready".to_string();
        }
        Message::DestinationPicked(None) => {
            debug!("folder picker dismissed");
        }
        Message::Fetch(event) => {
            app.view.apply(&event);

            if app.view.phase.is_terminal() {
                app.active = None;
                if let Some(id) = app.close_after_fetch.take() {
                    return window::close(id);
                }
            }
        }
        Message::CloseRequested(id) => {
            if app.active.is_some() {
                // Let the fetch clean up its partial file first.
                app.close_after_fetch = Some(id);
                app.cancel_download();
            } else {
                return window::close(id);
            }
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

pub fn subscription(_app: &DownloadApp) -> Subscription<Message> {
    window::close_requests().map(Message::CloseRequested)
}
