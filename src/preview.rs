use std::fmt;
use std::sync::Arc;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaFit {
    Crop,
    Clip,
    Fill,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct MediaDimensions {
    pub width: u32,
    pub height: u32,
    pub aspect: f64,
    pub fit: MediaFit,
}

impl Default for MediaDimensions {
    fn default() -> Self {
        Self {
            width: 80,
            height: 80,
            aspect: 1.0,
            fit: MediaFit::Crop,
        }
    }
}

pub type MediaRenderer = Arc<dyn Fn(MediaDimensions) -> AnyView + Send + Sync>;

/// Media slot of a preview, picked explicitly by the caller.
#[derive(Clone, Default)]
pub enum MediaContent {
    Text(String),
    Render(MediaRenderer),
    #[default]
    None,
}

impl MediaContent {
    pub fn render<F>(f: F) -> Self
    where
        F: Fn(MediaDimensions) -> AnyView + Send + Sync + 'static,
    {
        Self::Render(Arc::new(f))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    fn into_view(self, dimensions: MediaDimensions) -> AnyView {
        match self {
            Self::Text(text) => view! { <span>{text}</span> }.into_any(),
            Self::Render(render) => render(dimensions),
            Self::None => ().into_any(),
        }
    }
}

impl fmt::Debug for MediaContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Render(_) => f.write_str("Render(..)"),
            Self::None => f.write_str("None"),
        }
    }
}

pub fn create_link_title(title: &str, subtitle: Option<&str>) -> String {
    match subtitle {
        Some(subtitle) if !subtitle.is_empty() => format!("Create new {title} ({subtitle})"),
        _ => format!("Create new {title}"),
    }
}

#[component]
pub fn DocumentPreview(
    #[prop(optional, into)] title: Option<String>,
    #[prop(optional, into)] subtitle: Option<String>,
    #[prop(optional, into)] description: Option<String>,
    #[prop(optional)] media: MediaContent,
    #[prop(optional)] media_dimensions: Option<MediaDimensions>,
    #[prop(optional)] is_placeholder: bool,
) -> impl IntoView {
    let show_media = !media.is_none();

    if is_placeholder {
        return view! {
            <div class="document-preview document-preview--placeholder" style="display: flex; align-items: flex-start; padding: 1rem;">
                <div style="flex: 1; display: flex; flex-direction: column; gap: 0.75rem;">
                    <h2 style="margin: 0; font-size: 1rem;">"Loading…"</h2>
                    <p style="margin: 0; font-size: 0.85rem;">"Loading…"</p>
                </div>
                {show_media.then(|| view! { <div style="padding: 0.5rem;"></div> })}
            </div>
        }
        .into_any();
    }

    let title = title.unwrap_or_else(|| UNTITLED.to_string());
    let link_title = create_link_title(&title, subtitle.as_deref());
    let dimensions = media_dimensions.unwrap_or_default();

    view! {
        <div class="document-preview" title=link_title style="display: flex; align-items: flex-start; padding: 1rem; border: 1px solid var(--border-color); border-radius: var(--radius-md);">
            <div style="flex: 1; display: flex; flex-direction: column; gap: 0.75rem;">
                <h2 style="margin: 0; font-size: 1rem; white-space: break-spaces;">{title}</h2>
                {subtitle.map(|subtitle| view! {
                    <p style="margin: 0; font-size: 0.85rem; overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{subtitle}</p>
                })}
                {description.map(|description| view! {
                    <p style="margin: 0; font-size: 0.85rem; white-space: break-spaces;">{description}</p>
                })}
            </div>
            {show_media.then(|| view! {
                <div style="display: flex; align-items: flex-start; padding-left: 0.5rem; font-size: 2rem;">
                    {media.into_view(dimensions)}
                </div>
            })}
        </div>
    }
    .into_any()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn default_dimensions_are_square_crop() {
        let dims = MediaDimensions::default();
        assert_eq!((dims.width, dims.height), (80, 80));
        assert_eq!(dims.aspect, 1.0);
        assert_eq!(dims.fit, MediaFit::Crop);
    }

    #[test]
    fn link_title_mentions_subtitle_when_present() {
        assert_eq!(create_link_title("Author", None), "Create new Author");
        assert_eq!(
            create_link_title("Author", Some("Guest")),
            "Create new Author (Guest)"
        );
        assert_eq!(create_link_title("Author", Some("")), "Create new Author");
    }

    #[test]
    fn media_variant_is_explicit() {
        assert!(MediaContent::default().is_none());
        assert!(!MediaContent::Text("📄".into()).is_none());
        assert_eq!(
            format!("{:?}", MediaContent::Text("x".into())),
            "Text(\"x\")"
        );
    }

    #[test]
    fn dimensions_deserialize_lowercase_fit() {
        let dims: MediaDimensions =
            serde_json::from_str(r#"{"width": 40, "height": 30, "aspect": 1.5, "fit": "clip"}"#)
                .unwrap();
        assert_eq!(dims.fit, MediaFit::Clip);
        assert_eq!(dims.width, 40);
    }

    #[test]
    fn renderer_receives_requested_dimensions() {
        let seen = Arc::new(Mutex::new(None));
        let media = {
            let seen = Arc::clone(&seen);
            MediaContent::render(move |dims| {
                *seen.lock().unwrap() = Some(dims);
                ().into_any()
            })
        };
        assert!(!media.is_none());
        assert_eq!(format!("{media:?}"), "Render(..)");

        let _ = media.into_view(MediaDimensions::default());
        assert_eq!(*seen.lock().unwrap(), Some(MediaDimensions::default()));
    }
}
