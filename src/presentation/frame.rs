//! Frame markup rendering.
//!
//! Every interpolated value goes through askama's HTML escaping, so titles and
//! URLs cannot break out of the `content` attribute.

use askama::Template;
use axum::{http::StatusCode, response::Response};

use crate::domain::frame::{FRAME_VERSION, FrameDescriptor};

use super::views::render_template_response;

struct ButtonTagView<'a> {
    index: usize,
    label: &'a str,
    action: Option<&'static str>,
    target: Option<&'a str>,
    post_url: Option<&'a str>,
}

#[derive(Template)]
#[template(path = "frame.html")]
struct FrameTemplate<'a> {
    title: &'a str,
    image_url: &'a str,
    description: Option<&'a str>,
    version: &'static str,
    post_url: &'a str,
    buttons: Vec<ButtonTagView<'a>>,
    input_placeholder: Option<&'a str>,
}

impl<'a> FrameTemplate<'a> {
    fn new(frame: &'a FrameDescriptor) -> Self {
        let buttons = frame
            .indexed_buttons()
            .map(|(index, button)| ButtonTagView {
                index,
                label: &button.label,
                action: button.action.action_name(),
                target: button.action.target(),
                post_url: button.action.callback(),
            })
            .collect();

        Self {
            title: &frame.title,
            image_url: &frame.image_url,
            description: frame.description.as_deref(),
            version: FRAME_VERSION,
            post_url: &frame.post_url,
            buttons,
            input_placeholder: frame.text_input.as_ref().map(|input| input.placeholder.as_str()),
        }
    }
}

/// Render a frame descriptor into its HTML document.
pub fn render_frame(frame: &FrameDescriptor) -> Result<String, askama::Error> {
    FrameTemplate::new(frame).render()
}

pub fn frame_response(frame: &FrameDescriptor) -> Response {
    render_template_response(FrameTemplate::new(frame), StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::frame::ButtonSpec;

    fn tags(markup: &str) -> Vec<&str> {
        markup
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("<meta"))
            .collect()
    }

    #[test]
    fn minimal_frame_emits_required_tags_only() {
        let frame = FrameDescriptor::builder("Yup Score", "https://h/img", "https://h/frame/score")
            .build()
            .unwrap();
        let markup = render_frame(&frame).unwrap();

        assert_eq!(
            tags(&markup),
            vec![
                r#"<meta property="og:title" content="Yup Score" />"#,
                r#"<meta property="og:image" content="https://h/img" />"#,
                r#"<meta property="fc:frame" content="vNext" />"#,
                r#"<meta property="fc:frame:image" content="https://h/img" />"#,
                r#"<meta property="fc:frame:post_url" content="https://h/frame/score" />"#,
            ]
        );
        assert!(!markup.contains("og:description"));
        assert!(!markup.contains("fc:frame:input:text"));
    }

    #[test]
    fn buttons_are_numbered_densely_in_order() {
        let frame = FrameDescriptor::builder("Roast", "https://h/i", "https://h/p")
            .description("desc")
            .button(ButtonSpec::navigate("Roast Another Profile"))
            .button(ButtonSpec::link("Author", "https://warpcast.com/andrei0x309"))
            .button(ButtonSpec::tx("Donate", "https://h/tx", "https://h/frame/donate"))
            .text_input("Enter Github Profile")
            .build()
            .unwrap();
        let markup = render_frame(&frame).unwrap();
        let tags = tags(&markup);

        let labels: Vec<_> = tags
            .iter()
            .filter_map(|tag| tag.strip_prefix(r#"<meta property="fc:frame:button:"#))
            .filter_map(|rest| rest.split_once('"'))
            .filter(|(key, _)| !key.contains(':'))
            .map(|(key, _)| key)
            .collect();
        assert_eq!(labels, vec!["1", "2", "3"]);

        assert!(tags.contains(&r#"<meta property="og:description" content="desc" />"#));
        assert!(tags.contains(&r#"<meta property="fc:frame:button:2:action" content="link" />"#));
        assert!(tags.contains(&r#"<meta property="fc:frame:button:3:action" content="tx" />"#));
        assert!(tags.contains(&r#"<meta property="fc:frame:button:3:post_url" content="https://h/frame/donate" />"#));
        assert!(tags.contains(&r#"<meta property="fc:frame:input:text" content="Enter Github Profile" />"#));
        assert!(!markup.contains("fc:frame:button:1:action"));
    }

    #[test]
    fn link_button_emits_exactly_one_target() {
        let frame = FrameDescriptor::builder("t", "https://h/i", "https://h/p")
            .button(ButtonSpec::link("Author", "https://warpcast.com/andrei0x309"))
            .build()
            .unwrap();
        let markup = render_frame(&frame).unwrap();

        let targets: Vec<_> = tags(&markup)
            .into_iter()
            .filter(|tag| tag.contains(":target"))
            .collect();
        assert_eq!(
            targets,
            vec![r#"<meta property="fc:frame:button:1:target" content="https://warpcast.com/andrei0x309" />"#]
        );
    }

    #[test]
    fn interpolated_values_are_escaped() {
        let frame = FrameDescriptor::builder(r#""><script>x</script>"#, "https://h/i?a=1&b=2", "https://h/p")
            .build()
            .unwrap();
        let markup = render_frame(&frame).unwrap();

        assert!(!markup.contains("<script>"));
        assert!(markup.contains("https://h/i?a=1&amp;b=2"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let frame = FrameDescriptor::builder("t", "https://h/i", "https://h/p")
            .button(ButtonSpec::navigate("go"))
            .build()
            .unwrap();
        assert_eq!(render_frame(&frame).unwrap(), render_frame(&frame).unwrap());
    }
}
