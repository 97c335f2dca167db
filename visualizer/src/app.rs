use crate::editor_view::{can_reset, settings_form, FormInputs};
use crate::feed::{self, FeedEvent, FeedSource};
use crate::panels::metrics_panel;
use iced::{
    time,
    widget::{button, column, image, row, scrollable, text, Column, Container},
    Alignment, Color, Element, Length, Subscription, Task,
};
use log::debug;
use pathocore::api::{ActiveSettings, MetricsSnapshot, PipelineDescriptor, PipelineList};
use pathocore::client::RegistryClient;
use pathocore::config::ConsoleConfig;
use pathocore::metrics::{dispatch, SequenceGate, Ticket};
use pathocore::settings::{ParamEdit, SettingsEditor};
use pathocore::telemetry::ActivityLog;
use std::fmt;

const BANNER: Color = Color::from_rgb(0.95, 0.35, 0.3);

/// Parameter name and sequence index of a numeric input.
pub type InputKey = (String, Option<usize>);

/// Entry of the pipeline picker.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineChoice {
    pub name: String,
    pub display_name: String,
}

impl From<&PipelineDescriptor> for PipelineChoice {
    fn from(descriptor: &PipelineDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            display_name: descriptor.display_name.clone(),
        }
    }
}

impl fmt::Display for PipelineChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    CatalogLoaded(Result<PipelineList, String>),
    ActiveLoaded(Result<ActiveSettings, String>),
    PipelineSelected(PipelineChoice),
    ParamEdited(String, ParamEdit),
    NumberInput(String, Option<usize>, String),
    Apply,
    Applied(Result<ActiveSettings, String>),
    Reset,
    DismissApplyError,
    Tick,
    MetricsFetched(Ticket, Result<MetricsSnapshot, String>),
    ToggleMetrics,
    Feed(FeedEvent),
}

/// Composition root: owns the active settings and routes them to the
/// settings editor and the metrics panel.
pub struct Console {
    client: RegistryClient,
    config: ConsoleConfig,
    editor: SettingsEditor,
    inputs: FormInputs,
    active: Option<ActiveSettings>,
    applying: bool,
    load_error: Option<String>,
    apply_error: Option<String>,
    gate: SequenceGate,
    snapshot: Option<MetricsSnapshot>,
    frame: Option<image::Handle>,
    feed_status: String,
    activity: ActivityLog,
}

impl Console {
    pub fn boot(client: RegistryClient, config: ConsoleConfig) -> (Self, Task<Message>) {
        let mut state = Console {
            activity: ActivityLog::with_limit(config.history_limit),
            client,
            config,
            editor: SettingsEditor::default(),
            inputs: FormInputs::default(),
            active: None,
            applying: false,
            load_error: None,
            apply_error: None,
            gate: SequenceGate::default(),
            snapshot: None,
            frame: None,
            feed_status: "Connecting to video feed...".into(),
        };
        state.gate.activate();

        let catalog_client = state.client.clone();
        let active_client = state.client.clone();
        let startup = Task::batch([
            Task::perform(
                async move { catalog_client.list_pipelines().await.map_err(|e| e.to_string()) },
                Message::CatalogLoaded,
            ),
            Task::perform(
                async move { active_client.active_settings().await.map_err(|e| e.to_string()) },
                Message::ActiveLoaded,
            ),
            state.poll(),
        ]);
        (state, startup)
    }

    pub fn title(&self) -> String {
        match &self.active {
            Some(active) => format!("PathoAssist Console - {}", active.name),
            None => "PathoAssist Console".into(),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        let video = Subscription::run_with(
            FeedSource {
                base_url: self.config.base_url.clone(),
                timeout_ms: self.config.request_timeout_ms,
            },
            feed::connect,
        )
        .map(Message::Feed);

        if self.gate.is_active() {
            Subscription::batch([
                time::every(self.config.poll_interval()).map(|_| Message::Tick),
                video,
            ])
        } else {
            video
        }
    }

    pub fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::CatalogLoaded(Ok(catalog)) => {
                state
                    .activity
                    .record(format!("Loaded {} pipelines", catalog.pipelines.len()));
                state.editor.set_catalog(catalog);
                Task::none()
            }
            Message::CatalogLoaded(Err(err)) => {
                state.fail_load(format!("Failed to load pipelines: {err}"));
                Task::none()
            }
            Message::ActiveLoaded(Ok(active)) => {
                state
                    .activity
                    .record(format!("Active pipeline: {}", active.name));
                state.replace_active(active);
                Task::none()
            }
            Message::ActiveLoaded(Err(err)) => {
                state.fail_load(format!("Failed to load active settings: {err}"));
                Task::none()
            }
            Message::PipelineSelected(choice) => {
                if let Err(err) = state.editor.select_pipeline(&choice.name) {
                    debug!("pipeline selection rejected: {}", err);
                }
                state.inputs.clear();
                Task::none()
            }
            Message::ParamEdited(param, edit) => {
                if let Err(err) = state.editor.edit(&param, edit) {
                    debug!("edit rejected: {}", err);
                }
                Task::none()
            }
            Message::NumberInput(param, index, raw) => {
                let edit = match index {
                    Some(index) => ParamEdit::Element(index, raw.clone()),
                    None => ParamEdit::Number(raw.clone()),
                };
                let accepted = match state.editor.edit(&param, edit) {
                    Ok(()) => true,
                    Err(err) => {
                        debug!("edit rejected: {}", err);
                        false
                    }
                };
                state.inputs.record((param, index), raw, accepted);
                Task::none()
            }
            Message::Apply => {
                if state.inputs.has_rejections() {
                    return Task::none();
                }
                let Some(settings) = state.editor.submission(state.applying) else {
                    return Task::none();
                };
                state.applying = true;
                state.apply_error = None;
                let client = state.client.clone();
                Task::perform(
                    async move {
                        client
                            .apply_settings(&settings)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::Applied,
                )
            }
            Message::Applied(Ok(applied)) => {
                state.applying = false;
                state.activity.record(format!(
                    "Applied {} ({} parameters)",
                    applied.name,
                    applied.params.len()
                ));
                state.replace_active(applied);
                Task::none()
            }
            Message::Applied(Err(err)) => {
                state.applying = false;
                state.activity.record(format!("Apply failed: {err}"));
                state.apply_error = Some(format!("Failed to apply settings: {err}"));
                Task::none()
            }
            Message::Reset => {
                if can_reset(&state.editor, &state.inputs, state.applying) {
                    state.editor.reset();
                    state.inputs.clear();
                }
                Task::none()
            }
            Message::DismissApplyError => {
                state.apply_error = None;
                Task::none()
            }
            Message::Tick => state.poll(),
            Message::MetricsFetched(ticket, Ok(snapshot)) => {
                if state.gate.accept(ticket) {
                    state.snapshot = Some(snapshot);
                }
                Task::none()
            }
            Message::MetricsFetched(ticket, Err(err)) => {
                state.gate.record_failure(ticket, &err);
                Task::none()
            }
            Message::ToggleMetrics => {
                if state.gate.is_active() {
                    state.gate.deactivate();
                    state.activity.record("Metrics paused");
                    Task::none()
                } else {
                    state.gate.activate();
                    state.activity.record("Metrics resumed");
                    state.poll()
                }
            }
            Message::Feed(FeedEvent::Connected) => {
                state.feed_status = "Live".into();
                Task::none()
            }
            Message::Feed(FeedEvent::Frame(bytes)) => {
                state.frame = Some(image::Handle::from_bytes(bytes));
                Task::none()
            }
            Message::Feed(FeedEvent::Lost(reason)) => {
                state.feed_status = format!("Video feed unavailable: {reason}");
                Task::none()
            }
        }
    }

    pub fn view(state: &Self) -> Element<'_, Message> {
        let mut settings_column = Column::new().spacing(10);
        settings_column = settings_column.push(text("Pipeline Settings").size(26));
        if let Some(err) = &state.load_error {
            settings_column = settings_column.push(text(err.as_str()).size(14).color(BANNER));
        }
        if let Some(err) = &state.apply_error {
            settings_column = settings_column.push(
                row![
                    text(err.as_str()).size(14).color(BANNER),
                    button("Dismiss").on_press(Message::DismissApplyError).padding(4),
                ]
                .spacing(8)
                .align_y(Alignment::Center),
            );
        }
        let settings_column = settings_column
            .push(scrollable(settings_form(&state.editor, &state.inputs, state.applying)))
            .padding(16)
            .width(Length::Fixed(380.0));

        let video: Element<'_, Message> = match &state.frame {
            Some(handle) => image(handle.clone()).width(Length::Fill).into(),
            None => Container::new(text("No video yet").size(14))
                .height(Length::Fixed(240.0))
                .center_y(Length::Fixed(240.0))
                .into(),
        };

        let visualization = dispatch(
            state.active.as_ref().map(|active| active.name.as_str()),
            state.snapshot.as_ref().map(|snapshot| &snapshot.metrics),
        );
        let heading = match &state.snapshot {
            Some(snapshot) if snapshot.timestamp > 0.0 => {
                format!("Metrics (frame at {:.1}s)", snapshot.timestamp)
            }
            _ => "Metrics".to_string(),
        };
        let pause_label = if state.gate.is_active() {
            "Pause metrics"
        } else {
            "Resume metrics"
        };

        let history_list = if state.activity.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .activity
                .newest_first()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry).size(12))
                })
        };

        let telemetry_column = column![
            text("Live Feed").size(26),
            text(state.feed_status.as_str()).size(12),
            video,
            row![
                text(heading).size(20),
                button(pause_label).on_press(Message::ToggleMetrics).padding(6),
            ]
            .spacing(16)
            .align_y(Alignment::Center),
            text(state.gate.stats().to_string()).size(12),
            metrics_panel(visualization),
            text("Activity log").size(16),
            Container::new(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fill);

        let layout = row![settings_column, scrollable(telemetry_column)]
            .spacing(20)
            .align_y(Alignment::Start)
            .padding(20);

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Issues a metrics request if polling is active.
    fn poll(&mut self) -> Task<Message> {
        let Some(ticket) = self.gate.issue() else {
            return Task::none();
        };
        let client = self.client.clone();
        Task::perform(
            async move { client.latest_metrics().await.map_err(|e| e.to_string()) },
            move |result| Message::MetricsFetched(ticket, result),
        )
    }

    fn replace_active(&mut self, active: ActiveSettings) {
        self.editor.seed(active.clone());
        self.inputs.clear();
        self.active = Some(active);
    }

    fn fail_load(&mut self, message: String) {
        self.activity.record(message.clone());
        self.load_error.get_or_insert(message);
    }
}
