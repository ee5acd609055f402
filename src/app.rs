//! Core application state and Iced Application implementation
//!
//! The window is the host form: every configured picker, the room and
//! arrival option editors and the reservation table. Opening a picker shows
//! its search panel in place of the form until it is confirmed or closed.

use iced::keyboard::{self, Key};
use iced::widget::{
    button, checkbox, column, container, pick_list, row, scrollable, text, text_input, Column,
    Space,
};
use iced::{Element, Event, Length, Subscription, Task, Theme};
use std::sync::Arc;

use crate::backend::api::{BackendClient, Catalog, HttpCatalog};
use crate::backend::types::StatusResponse;
use crate::config::AppConfig;
use crate::error::SubmitError;
use crate::picker::list_editor::{room_cells, Cell, ListEditor, RoomType, RowKey, RowToggle};
use crate::picker::model::{FormField, RecordId};
use crate::picker::reservations::{PendingChange, ReservationDraft, ReservationTable};
use crate::picker::{run_search, EntityPicker, SearchResponse, SearchTicket};
use crate::render;
use crate::ui::search_bar;
use crate::ui::theme::{self, DarkTheme};

// ============================================================================
// Application State
// ============================================================================

pub struct PickerApp {
    config: Arc<AppConfig>,
    backend: Arc<BackendClient>,
    pickers: Vec<EntityPicker>,
    catalogs: Vec<Arc<dyn Catalog>>,
    /// Picker whose search panel is showing
    active: Option<usize>,
    rooms: ListEditor,
    room_beds: String,
    room_type: Option<RoomType>,
    arrival_options: ListEditor,
    arrival_input: String,
    reservations: ReservationTable,
    editor_error: Option<String>,
    submitting: bool,
    status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationField {
    Description,
    Slots,
    Email,
}

impl ReservationField {
    fn apply(self, draft: &mut ReservationDraft, value: String) {
        match self {
            ReservationField::Description => draft.description = value,
            ReservationField::Slots => draft.slots = value,
            ReservationField::Email => draft.email = value,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    OpenPicker(usize),
    ClosePicker,
    FilterChanged(usize, usize, String),
    Search(usize),
    Retry(usize),
    SearchFinished(usize, SearchResponse),
    ToggleCandidate(usize, RecordId),
    ConfirmSelection(usize),
    RemoveSelection(usize, RecordId),
    RoomBedsChanged(String),
    RoomTypeSelected(RoomType),
    AddRoom,
    RemoveRoom(RowKey),
    ArrivalOptionChanged(String),
    AddArrivalOption,
    RemoveArrivalOption(RowKey),
    BeginAddReservation,
    NewReservationChanged(ReservationField, String),
    SubmitNewReservation,
    CancelNewReservation,
    EditReservation(usize),
    EditReservationChanged(ReservationField, String),
    SaveReservation,
    CancelEditReservation,
    RemoveReservation(usize),
    ReservationAnswered(PendingChange, Result<StatusResponse, SubmitError>),
    SubmitForm,
    FormSubmitted(Result<(), SubmitError>),
    CopyFormHtml,
    ResetForm,
    IcedEvent(Event),
}

impl PickerApp {
    pub fn new(config: Arc<AppConfig>, backend: Arc<BackendClient>) -> (Self, Task<Message>) {

        let pickers: Vec<EntityPicker> = config
            .pickers
            .iter()
            .cloned()
            .map(EntityPicker::new)
            .collect();
        let catalogs: Vec<Arc<dyn Catalog>> = config
            .pickers
            .iter()
            .map(|p| Arc::new(HttpCatalog::new(backend.clone(), p.clone())) as Arc<dyn Catalog>)
            .collect();

        let reservations = ReservationTable::new(config.reservations.clone());

        tracing::info!(
            pickers = pickers.len(),
            reservations = reservations.rows().len(),
            base_url = %config.base_url,
            "Form initialised"
        );

        let app = Self {
            config,
            backend,
            pickers,
            catalogs,
            active: None,
            rooms: ListEditor::rooms(),
            room_beds: String::new(),
            room_type: Some(RoomType::Flex),
            arrival_options: ListEditor::arrival_options(),
            arrival_input: String::new(),
            reservations,
            editor_error: None,
            submitting: false,
            status: None,
        };
        (app, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenPicker(index) => {
                if self.active != Some(index) {
                    self.close_active();
                }
                if let Some(picker) = self.pickers.get_mut(index) {
                    picker.open();
                    self.active = Some(index);
                }
                Task::none()
            }

            Message::ClosePicker => {
                self.close_active();
                Task::none()
            }

            Message::FilterChanged(index, field, value) => {
                if let Some(picker) = self.pickers.get_mut(index) {
                    picker.set_filter(field, value);
                }
                Task::none()
            }

            Message::Search(index) => match self.pickers.get_mut(index) {
                Some(picker) => {
                    let ticket = picker.begin_search();
                    self.dispatch_search(index, ticket)
                }
                None => Task::none(),
            },

            Message::Retry(index) => {
                match self.pickers.get_mut(index).and_then(EntityPicker::retry) {
                    Some(ticket) => self.dispatch_search(index, ticket),
                    None => Task::none(),
                }
            }

            Message::SearchFinished(index, response) => {
                if let Some(picker) = self.pickers.get_mut(index) {
                    picker.finish_search(response);
                }
                Task::none()
            }

            Message::ToggleCandidate(index, id) => {
                if let Some(picker) = self.pickers.get_mut(index) {
                    picker.toggle_checked(&id);
                }
                Task::none()
            }

            Message::ConfirmSelection(index) => {
                if let Some(picker) = self.pickers.get_mut(index) {
                    picker.confirm_selection();
                }
                self.active = None;
                Task::none()
            }

            Message::RemoveSelection(index, id) => {
                if let Some(picker) = self.pickers.get_mut(index) {
                    picker.remove_selection(&id);
                }
                Task::none()
            }

            Message::RoomBedsChanged(value) => {
                self.room_beds = value;
                Task::none()
            }

            Message::RoomTypeSelected(room_type) => {
                self.room_type = Some(room_type);
                Task::none()
            }

            Message::AddRoom => {
                let room_type = self.room_type.unwrap_or(RoomType::Flex);
                let result = room_cells(&self.room_beds, room_type)
                    .and_then(|cells| self.rooms.toggle_row(RowToggle::Add(cells)));
                match result {
                    Ok(()) => {
                        self.room_beds.clear();
                        self.editor_error = None;
                    }
                    Err(err) => self.editor_error = Some(err.to_string()),
                }
                Task::none()
            }

            Message::RemoveRoom(key) => {
                let _ = self.rooms.toggle_row(RowToggle::Remove(key));
                Task::none()
            }

            Message::ArrivalOptionChanged(value) => {
                self.arrival_input = value;
                Task::none()
            }

            Message::AddArrivalOption => {
                let cells = vec![Cell::plain(self.arrival_input.as_str())];
                // blank input is silently ignored
                if self.arrival_options.toggle_row(RowToggle::Add(cells)).is_ok() {
                    self.arrival_input.clear();
                }
                Task::none()
            }

            Message::RemoveArrivalOption(key) => {
                let _ = self.arrival_options.toggle_row(RowToggle::Remove(key));
                Task::none()
            }

            Message::BeginAddReservation => {
                self.reservations.begin_add();
                Task::none()
            }

            Message::NewReservationChanged(field, value) => {
                if let Some(draft) = self.reservations.new_entry_mut() {
                    field.apply(draft, value);
                }
                Task::none()
            }

            Message::SubmitNewReservation => {
                let change = self.reservations.submit_add();
                self.dispatch_reservation(change)
            }

            Message::CancelNewReservation => {
                self.reservations.cancel_add();
                Task::none()
            }

            Message::EditReservation(index) => {
                self.reservations.begin_edit(index);
                Task::none()
            }

            Message::EditReservationChanged(field, value) => {
                if let Some(draft) = self.reservations.edit_draft_mut() {
                    field.apply(draft, value);
                }
                Task::none()
            }

            Message::SaveReservation => {
                let change = self.reservations.save_edit();
                self.dispatch_reservation(change)
            }

            Message::CancelEditReservation => {
                self.reservations.cancel_edit();
                Task::none()
            }

            Message::RemoveReservation(index) => {
                let change = self.reservations.request_remove(index);
                self.dispatch_reservation(Ok(change))
            }

            Message::ReservationAnswered(change, result) => {
                self.reservations.apply_response(change, result);
                Task::none()
            }

            Message::SubmitForm => {
                if self.submitting {
                    return Task::none();
                }
                self.submitting = true;
                self.status = None;
                let fields = self.form_fields();
                let backend = self.backend.clone();
                Task::perform(
                    async move { backend.submit_form(&fields).await },
                    Message::FormSubmitted,
                )
            }

            Message::FormSubmitted(result) => {
                self.submitting = false;
                match result {
                    Ok(()) => {
                        self.reset_form();
                        self.status = Some("Saved".to_string());
                    }
                    Err(err) => {
                        tracing::error!("Form submission failed: {}", err);
                        self.status = Some(format!("Saving failed: {}", err));
                    }
                }
                Task::none()
            }

            Message::CopyFormHtml => {
                let csrf = self
                    .config
                    .csrf_token
                    .as_ref()
                    .map(|token| FormField::new(self.config.csrf_field.as_str(), token.as_str()));
                let html = render::host_form(
                    &self.config.form_action,
                    &self.pickers,
                    &[&self.rooms, &self.arrival_options],
                    csrf.as_ref(),
                );
                self.status = Some("Form HTML copied to clipboard".to_string());
                iced::clipboard::write(html)
            }

            Message::ResetForm => {
                self.reset_form();
                self.status = None;
                Task::none()
            }

            Message::IcedEvent(event) => {
                if let Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) = event {
                    if key == Key::Named(keyboard::key::Named::Escape) {
                        return self.update(Message::ClosePicker);
                    }
                }
                Task::none()
            }
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::event::listen().map(Message::IcedEvent)
    }

    pub fn theme(&self) -> Theme {
        Theme::Dark
    }

    // ========================================================================
    // Business Logic
    // ========================================================================

    fn close_active(&mut self) {
        if let Some(picker) = self.active.take().and_then(|i| self.pickers.get_mut(i)) {
            picker.close();
        }
    }

    fn dispatch_search(&self, index: usize, ticket: SearchTicket) -> Task<Message> {
        let Some(catalog) = self.catalogs.get(index).cloned() else {
            return Task::none();
        };
        let timeout = self.config.search_timeout();
        Task::perform(run_search(catalog, ticket, timeout), move |response| {
            Message::SearchFinished(index, response)
        })
    }

    fn dispatch_reservation(
        &mut self,
        change: Result<Option<PendingChange>, crate::error::ListEditError>,
    ) -> Task<Message> {
        let change = match change {
            Ok(Some(change)) => change,
            Ok(None) => return Task::none(),
            Err(err) => {
                self.editor_error = Some(err.to_string());
                return Task::none();
            }
        };
        self.editor_error = None;

        let Some(event_id) = self.config.event_id.clone() else {
            tracing::warn!("No event configured, reservation change dropped");
            return Task::none();
        };
        let backend = self.backend.clone();
        Task::perform(
            async move {
                let result = match &change {
                    PendingChange::Add(reservation) => {
                        backend.add_reservation(&event_id, reservation).await
                    }
                    PendingChange::Edit {
                        original_description,
                        reservation,
                    } => {
                        backend
                            .edit_reservation(&event_id, original_description, reservation)
                            .await
                    }
                    PendingChange::Remove { description } => {
                        backend.remove_reservation(&event_id, description).await
                    }
                };
                (change, result)
            },
            |(change, result)| Message::ReservationAnswered(change, result),
        )
    }

    /// Every hidden field of the host form
    fn form_fields(&self) -> Vec<FormField> {
        self.pickers
            .iter()
            .flat_map(EntityPicker::form_fields)
            .chain(self.rooms.form_fields())
            .chain(self.arrival_options.form_fields())
            .collect()
    }

    fn reset_form(&mut self) {
        self.active = None;
        for picker in &mut self.pickers {
            picker.reset();
        }
        self.rooms.clear();
        self.arrival_options.clear();
        self.editor_error = None;
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn view(&self) -> Element<'_, Message> {
        let content = match self.active.and_then(|i| self.pickers.get(i).map(|p| (i, p))) {
            Some((index, picker)) => self.view_picker(index, picker),
            None => self.view_form(),
        };

        container(content)
            .padding(16)
            .width(Length::Fill)
            .height(Length::Fill)
            .style(theme::window)
            .into()
    }

    fn view_form(&self) -> Element<'_, Message> {
        let mut sections: Vec<Element<'_, Message>> = self
            .pickers
            .iter()
            .enumerate()
            .map(|(index, picker)| section(&picker.config().label, self.view_selection(index, picker)))
            .collect();

        sections.push(section("Rooms", self.view_rooms()));
        sections.push(section("Arrival options", self.view_arrival_options()));
        if self.config.event_id.is_some() {
            sections.push(section("Reservations", self.view_reservations()));
        }
        if let Some(err) = &self.editor_error {
            sections.push(text(err).size(13).color(DarkTheme::DANGER).into());
        }

        let footer = row![
            button(text("Save"))
                .on_press_maybe((!self.submitting).then_some(Message::SubmitForm))
                .padding(10),
            button(text("Copy form HTML"))
                .on_press(Message::CopyFormHtml)
                .style(button::secondary)
                .padding(10),
            button(text("Reset"))
                .on_press(Message::ResetForm)
                .style(button::secondary)
                .padding(10),
            Space::with_width(Length::Fill),
            text(self.status.as_deref().unwrap_or(""))
                .size(13)
                .color(DarkTheme::TEXT_MUTED)
        ]
        .spacing(8)
        .align_y(iced::Alignment::Center);

        column![
            scrollable(Column::with_children(sections).spacing(12)).height(Length::Fill),
            Space::with_height(Length::Fixed(12.0)),
            footer
        ]
        .into()
    }

    fn view_selection<'a>(&'a self, index: usize, picker: &'a EntityPicker) -> Element<'a, Message> {
        let items: Vec<Element<'a, Message>> = picker
            .selection()
            .iter()
            .map(|entry| {
                row![
                    column![
                        text(&entry.title).size(15).color(DarkTheme::TEXT),
                        text(&entry.description).size(12).color(DarkTheme::TEXT_MUTED)
                    ]
                    .spacing(2)
                    .width(Length::Fill),
                    button(text("Remove"))
                        .on_press(Message::RemoveSelection(index, entry.id.clone()))
                        .style(button::danger)
                ]
                .spacing(12)
                .align_y(iced::Alignment::Center)
                .into()
            })
            .collect();

        column![
            Column::with_children(items).spacing(6),
            button(text("Add…"))
                .on_press(Message::OpenPicker(index))
                .style(button::secondary)
        ]
        .spacing(8)
        .into()
    }

    fn view_picker<'a>(&'a self, index: usize, picker: &'a EntityPicker) -> Element<'a, Message> {
        let filters = search_bar::view(
            picker,
            move |field, value| Message::FilterChanged(index, field, value),
            Message::Search(index),
        );

        let indicator: Element<'a, Message> = if picker.is_searching() {
            text("Searching…").size(13).color(DarkTheme::TEXT_MUTED).into()
        } else if let Some(err) = picker.error() {
            row![
                text(err.to_string()).size(13).color(DarkTheme::DANGER),
                button(text("Retry")).on_press(Message::Retry(index))
            ]
            .spacing(12)
            .align_y(iced::Alignment::Center)
            .into()
        } else if picker.show_no_results() {
            text("No matching records").size(13).color(DarkTheme::TEXT_MUTED).into()
        } else {
            Space::with_height(Length::Fixed(0.0)).into()
        };

        let rows: Vec<Element<'a, Message>> = picker
            .candidates()
            .iter()
            .map(|candidate| {
                let checked = picker.is_checked(&candidate.id);
                let id = candidate.id.clone();
                let item = row![
                    checkbox("", checked)
                        .on_toggle(move |_| Message::ToggleCandidate(index, id.clone())),
                    column![
                        text(&candidate.title).size(15).color(DarkTheme::TEXT),
                        text(candidate.details.join("  ·  "))
                            .size(12)
                            .color(DarkTheme::TEXT_MUTED)
                    ]
                    .spacing(2)
                ]
                .spacing(12)
                .align_y(iced::Alignment::Center);

                container(item)
                    .padding([8, 12])
                    .width(Length::Fill)
                    .style(theme::row(checked))
                    .into()
            })
            .collect();

        let footer = row![
            Space::with_width(Length::Fill),
            button(text("Cancel"))
                .on_press(Message::ClosePicker)
                .style(button::secondary),
            button(text("Add selected")).on_press(Message::ConfirmSelection(index))
        ]
        .spacing(8);

        container(
            column![
                text(&picker.config().label).size(20).color(DarkTheme::TEXT),
                filters,
                indicator,
                scrollable(Column::with_children(rows).spacing(4)).height(Length::Fill),
                footer
            ]
            .spacing(12),
        )
        .padding(16)
        .width(Length::Fill)
        .height(Length::Fill)
        .style(theme::panel)
        .into()
    }

    fn view_rooms(&self) -> Element<'_, Message> {
        let rows: Vec<Element<'_, Message>> = self
            .rooms
            .rows()
            .iter()
            .map(|r| {
                let label = r
                    .cells
                    .iter()
                    .map(|c| c.display.as_str())
                    .collect::<Vec<_>>()
                    .join(" beds, ");
                editor_row(label, Message::RemoveRoom(r.key))
            })
            .collect();

        let inputs = row![
            text_input("Beds", &self.room_beds)
                .on_input(Message::RoomBedsChanged)
                .on_submit(Message::AddRoom)
                .style(theme::input)
                .width(Length::Fixed(100.0)),
            pick_list(RoomType::ALL.to_vec(), self.room_type, Message::RoomTypeSelected),
            button(text("Add room")).on_press(Message::AddRoom)
        ]
        .spacing(8);

        column![Column::with_children(rows).spacing(4), inputs]
            .spacing(8)
            .into()
    }

    fn view_arrival_options(&self) -> Element<'_, Message> {
        let rows: Vec<Element<'_, Message>> = self
            .arrival_options
            .rows()
            .iter()
            .map(|r| {
                let label = r.cells.first().map(|c| c.display.clone()).unwrap_or_default();
                editor_row(label, Message::RemoveArrivalOption(r.key))
            })
            .collect();

        let inputs = row![
            text_input("Arrival option", &self.arrival_input)
                .on_input(Message::ArrivalOptionChanged)
                .on_submit(Message::AddArrivalOption)
                .style(theme::input)
                .width(Length::Fill),
            button(text("Add")).on_press(Message::AddArrivalOption)
        ]
        .spacing(8);

        column![Column::with_children(rows).spacing(4), inputs]
            .spacing(8)
            .into()
    }

    fn view_reservations(&self) -> Element<'_, Message> {
        let table = &self.reservations;
        let mut rows: Vec<Element<'_, Message>> = Vec::new();

        for (index, reservation) in table.rows().iter().enumerate() {
            let editing = table
                .edit_draft()
                .filter(|_| table.editing_index() == Some(index));
            let row_view: Element<'_, Message> = match editing {
                Some(draft) => draft_inputs(
                    draft,
                    Message::EditReservationChanged,
                    Message::SaveReservation,
                    Message::CancelEditReservation,
                ),
                None => row![
                    text(&reservation.description).width(Length::FillPortion(6)),
                    text(reservation.slots.to_string()).width(Length::FillPortion(2)),
                    text(&reservation.email).width(Length::FillPortion(3)),
                    button(text("Edit"))
                        .on_press(Message::EditReservation(index))
                        .style(button::secondary),
                    button(text("Remove"))
                        .on_press(Message::RemoveReservation(index))
                        .style(button::danger)
                ]
                .spacing(8)
                .align_y(iced::Alignment::Center)
                .into(),
            };
            rows.push(row_view);
        }

        match table.new_entry() {
            Some(draft) => rows.push(draft_inputs(
                draft,
                Message::NewReservationChanged,
                Message::SubmitNewReservation,
                Message::CancelNewReservation,
            )),
            None => rows.push(
                button(text("New reservation"))
                    .on_press(Message::BeginAddReservation)
                    .style(button::secondary)
                    .into(),
            ),
        }

        if let Some(slots) = table.slots_available() {
            rows.push(
                text(format!("Only {} slots left", slots))
                    .size(13)
                    .color(DarkTheme::DANGER)
                    .into(),
            );
        }
        if let Some(err) = table.transmission_error() {
            rows.push(
                text(format!("Reservation could not be saved: {}", err))
                    .size(13)
                    .color(DarkTheme::DANGER)
                    .into(),
            );
        }

        Column::with_children(rows).spacing(6).into()
    }
}

fn section<'a>(title: &'a str, body: Element<'a, Message>) -> Element<'a, Message> {
    container(
        column![text(title).size(16).color(DarkTheme::PRIMARY), body].spacing(8),
    )
    .padding(12)
    .width(Length::Fill)
    .style(theme::panel)
    .into()
}

fn editor_row<'a>(label: String, on_remove: Message) -> Element<'a, Message> {
    row![
        text(label).width(Length::Fill).color(DarkTheme::TEXT),
        button(text("Remove")).on_press(on_remove).style(button::danger)
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}

fn draft_inputs<'a>(
    draft: &'a ReservationDraft,
    on_change: fn(ReservationField, String) -> Message,
    on_save: Message,
    on_cancel: Message,
) -> Element<'a, Message> {
    row![
        text_input("Description", &draft.description)
            .on_input(move |v| on_change(ReservationField::Description, v))
            .style(theme::input)
            .width(Length::FillPortion(6)),
        text_input("Slots", &draft.slots)
            .on_input(move |v| on_change(ReservationField::Slots, v))
            .style(theme::input)
            .width(Length::FillPortion(2)),
        text_input("Contact e-mail", &draft.email)
            .on_input(move |v| on_change(ReservationField::Email, v))
            .style(theme::input)
            .width(Length::FillPortion(3)),
        button(text("Save")).on_press(on_save),
        button(text("Cancel"))
            .on_press(on_cancel)
            .style(button::secondary)
    ]
    .spacing(8)
    .align_y(iced::Alignment::Center)
    .into()
}
