use std::path::PathBuf;
use std::sync::Arc;

use iced::widget::{button, column, image as iced_image, row, text};
use iced::{Alignment::Center, Element, Length, Task, Theme};
use rfd::AsyncFileDialog;

use super::Message;
use super::widgets::{card, image_or_placeholder};
use crate::model::{ModelSlot, ReplayModel};
use crate::models::ImageId;
use crate::orchestrator::{Event, Orchestrator, Phase};
use crate::config::RenderStyle;
use crate::render::Annotator;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"];

/// Run the desktop app. Predictions are replayed from `predictions`.
pub fn run(style: RenderStyle, predictions: PathBuf) -> iced::Result {
    iced::application(
        move || DetectApp::new(style.clone(), predictions.clone()),
        DetectApp::update,
        DetectApp::view,
    )
    .title(|_state: &DetectApp| "Object Detection".to_string())
    .theme(|_state: &DetectApp| Theme::Dark)
    .run()
}

pub struct DetectApp {
    orchestrator: Option<Orchestrator<ReplayModel>>,
    startup_error: Option<String>,
    preview: Option<(ImageId, iced_image::Handle)>,
    annotated: Option<iced_image::Handle>,
}

impl DetectApp {
    fn new(style: RenderStyle, predictions: PathBuf) -> (Self, Task<Message>) {
        let (orchestrator, startup_error) = match Annotator::new(style) {
            Ok(annotator) => (Some(Orchestrator::new(annotator).with_surface()), None),
            Err(err) => (None, Some(err.to_string())),
        };
        let app = Self {
            orchestrator,
            startup_error,
            preview: None,
            annotated: None,
        };
        let load = Task::perform(load_model(predictions), |loaded| {
            Message::Pipeline(Event::ModelLoaded(loaded))
        });
        (app, load)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenImage => Task::perform(
                AsyncFileDialog::new()
                    .set_title("Select an image")
                    .add_filter("Image", IMAGE_EXTENSIONS)
                    .pick_file(),
                |handle| match handle {
                    Some(file) => {
                        Message::Pipeline(Event::FileSelected(file.path().to_path_buf()))
                    }
                    None => Message::None,
                },
            ),
            Message::DetectObjects => self.dispatch(Event::DetectRequested),
            Message::Pipeline(event) => self.dispatch(event),
            Message::None => Task::none(),
        }
    }

    fn dispatch(&mut self, event: Event<ReplayModel>) -> Task<Message> {
        let Some(orchestrator) = self.orchestrator.as_mut() else {
            return Task::none();
        };
        let jobs = orchestrator.handle(event);
        self.refresh_handles();
        Task::batch(
            jobs.into_iter()
                .map(|job| Task::perform(job.run(), Message::Pipeline)),
        )
    }

    fn refresh_handles(&mut self) {
        let Some(orchestrator) = self.orchestrator.as_ref() else {
            return;
        };

        match orchestrator.phase().image() {
            Some(image) if self.preview.as_ref().map(|(id, _)| *id) != Some(image.id) => {
                let rgba = image.pixels.to_rgba8();
                let handle =
                    iced_image::Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw());
                self.preview = Some((image.id, handle));
            }
            Some(_) => {}
            None => self.preview = None,
        }

        self.annotated = orchestrator
            .surface()
            .filter(|s| s.dimensions() != (0, 0))
            .map(|s| {
                let (width, height) = s.dimensions();
                iced_image::Handle::from_rgba(width, height, s.pixels().clone().into_raw())
            });
    }

    fn status(&self) -> String {
        let Some(orchestrator) = self.orchestrator.as_ref() else {
            return self
                .startup_error
                .clone()
                .unwrap_or_else(|| "Renderer unavailable".to_string());
        };
        if let Some(err) = orchestrator.last_error() {
            return format!("{}: {}", err.kind(), err);
        }
        match (orchestrator.model(), orchestrator.phase()) {
            (ModelSlot::Loading, Phase::NoImage) => "Loading model...".to_string(),
            (_, Phase::NoImage) => "Select an image to start".to_string(),
            (_, Phase::ImageLoading { .. }) => "Loading image...".to_string(),
            (_, Phase::ImageReady { .. }) => "Image ready".to_string(),
            (_, Phase::Detecting { .. }) => "Detecting objects...".to_string(),
            (_, Phase::Detected { detections, .. }) => {
                format!("{} objects detected", detections.len())
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        let controls = row![
            button("Open Image").on_press(Message::OpenImage),
            button("Detect Objects").on_press(Message::DetectObjects),
        ]
        .spacing(20)
        .align_y(Center);

        let name = self
            .orchestrator
            .as_ref()
            .and_then(|o| o.phase().image())
            .map(|image| format!("Image Name: {}", image.name))
            .unwrap_or_default();

        let preview_handle = self.preview.as_ref().map(|(_, h)| h.clone());
        let cards = row![
            card(
                "Image Preview",
                column![
                    image_or_placeholder(&preview_handle, "No image"),
                    text(name).size(14),
                ]
                .spacing(10),
            ),
            card(
                "Object Detection",
                image_or_placeholder(&self.annotated, "Nothing detected yet"),
            ),
        ]
        .spacing(20);

        column![controls, text(self.status()).size(14), cards]
            .spacing(20)
            .padding(20)
            .align_x(Center)
            .width(Length::Fill)
            .into()
    }
}

async fn load_model(path: PathBuf) -> Result<Arc<ReplayModel>, String> {
    ReplayModel::load(path)
        .await
        .map(Arc::new)
        .map_err(|e| format!("{:#}", e))
}
