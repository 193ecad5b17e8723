use iced::widget::{column, container, image as iced_image, text};
use iced::{Element, Length};

/// A titled, bordered card like the preview and detection panels.
pub fn card<'a, Message: 'a>(
    title: &'a str,
    body: impl Into<Element<'a, Message>>,
) -> Element<'a, Message> {
    container(column![text(title).size(20), body.into()].spacing(10))
        .padding(10)
        .width(Length::FillPortion(1))
        .style(container::bordered_box)
        .into()
}

pub fn image_or_placeholder<'a, Message: 'a>(
    handle: &Option<iced_image::Handle>,
    placeholder: &'a str,
) -> Element<'a, Message> {
    match handle {
        Some(h) => iced_image(h.clone()).width(Length::Fill).into(),
        None => container(text(placeholder).size(16))
            .center_x(Length::Fill)
            .center_y(Length::Fixed(200.0))
            .into(),
    }
}
