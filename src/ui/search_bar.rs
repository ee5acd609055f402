//! Filter inputs of a picker

use iced::widget::{button, row, text, text_input, Row};
use iced::{Element, Length};

use crate::picker::EntityPicker;
use crate::ui::theme;

/// One text input per configured filter field, followed by the search button
pub fn view<'a, Message: Clone + 'a>(
    picker: &'a EntityPicker,
    on_input: impl Fn(usize, String) -> Message + Clone + 'a,
    on_submit: Message,
) -> Element<'a, Message> {
    let inputs: Vec<Element<'a, Message>> = picker
        .config()
        .filter_fields
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let on_input = on_input.clone();
            text_input(&field.label, picker.filter_value(index))
                .on_input(move |value| on_input(index, value))
                .on_submit(on_submit.clone())
                .padding(10)
                .size(15)
                .style(theme::input)
                .width(Length::Fill)
                .into()
        })
        .collect();

    row![
        Row::with_children(inputs).spacing(8).width(Length::Fill),
        button(text("Search")).on_press(on_submit).padding(10)
    ]
    .spacing(8)
    .into()
}
