use leptos::prelude::*;
use serde::{Deserialize, Serialize};

pub const MENU_TITLE: &str = "Show validation issues";
const VALIDATION_KIND: &str = "validation";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MarkerLevel {
    Error,
    Warning,
    Info,
}

impl MarkerLevel {
    fn tone(self) -> &'static str {
        match self {
            Self::Warning => "caution",
            _ => "critical",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Error => "⊘",
            Self::Warning => "⚠",
            Self::Info => "",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

pub type MarkerPath = Vec<PathSegment>;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerItem {
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Marker {
    #[serde(rename = "type")]
    pub kind: String,
    pub level: MarkerLevel,
    #[serde(default)]
    pub path: MarkerPath,
    #[serde(default)]
    pub item: MarkerItem,
}

impl Marker {
    pub fn validation(level: MarkerLevel, path: &[&str], message: &str) -> Self {
        Self {
            kind: VALIDATION_KIND.to_string(),
            level,
            path: path
                .iter()
                .map(|segment| PathSegment::Field(segment.to_string()))
                .collect(),
            item: MarkerItem {
                message: message.to_string(),
            },
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind == VALIDATION_KIND
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub title: Option<String>,
}

/// Title of the schema field named by the first path segment, or empty.
pub fn resolve_path_title(fields: &[SchemaField], path: &[PathSegment]) -> String {
    let Some(PathSegment::Field(name)) = path.first() else {
        return String::new();
    };
    fields
        .iter()
        .find(|field| &field.name == name)
        .and_then(|field| field.title.clone())
        .unwrap_or_default()
}

/// Errors first, then warnings, each in their original order. Other
/// levels are dropped.
pub fn ordered_issues(markers: &[Marker]) -> Vec<&Marker> {
    let of_level = |level: MarkerLevel| markers.iter().filter(move |marker| marker.level == level);
    of_level(MarkerLevel::Error)
        .chain(of_level(MarkerLevel::Warning))
        .collect()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IssueCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl IssueCounts {
    pub fn of(markers: &[Marker]) -> Self {
        markers
            .iter()
            .filter(|marker| marker.is_validation())
            .fold(Self::default(), |mut counts, marker| {
                match marker.level {
                    MarkerLevel::Error => counts.errors += 1,
                    MarkerLevel::Warning => counts.warnings += 1,
                    MarkerLevel::Info => {}
                }
                counts
            })
    }

    pub fn has_issues(self) -> bool {
        self.errors + self.warnings > 0
    }
}

#[component]
fn IssueRow(
    marker: Marker,
    title: String,
    truncate: bool,
    on_click: Callback<MarkerPath>,
) -> impl IntoView {
    let Marker { level, path, item, .. } = marker;
    let message_style = if truncate {
        "margin: 0; font-size: 0.8rem; color: var(--text-muted); overflow: hidden; text-overflow: ellipsis; white-space: nowrap;"
    } else {
        "margin: 0; font-size: 0.8rem; color: var(--text-muted); white-space: initial;"
    };

    view! {
        <button
            class="validation-item"
            data-tone=level.tone()
            on:click=move |_| on_click.run(path.clone())
            style="display: flex; gap: 0.75rem; width: 100%; padding: 0.5rem; border: none; border-radius: 3px; background: transparent; color: var(--text-primary); cursor: pointer; text-align: left;"
        >
            <span style="font-size: 0.8rem;">{level.icon()}</span>
            <div style="flex: 1; min-width: 0; display: flex; flex-direction: column; gap: 0.25rem;">
                {(!title.is_empty()).then(|| view! {
                    <p style="margin: 0; font-size: 0.8rem; font-weight: 600; white-space: initial;">{title}</p>
                })}
                {(!item.message.is_empty()).then(|| view! {
                    <p style=message_style>{item.message}</p>
                })}
            </div>
        </button>
    }
}

/// Errors followed by warnings. Renders nothing when there are neither.
/// Clicking an issue focuses its path and then closes the list.
#[component]
pub fn ValidationList(
    #[prop(into)] markers: Signal<Vec<Marker>>,
    #[prop(optional, into)] fields: Option<Signal<Vec<SchemaField>>>,
    #[prop(optional)] on_focus: Option<Callback<MarkerPath>>,
    #[prop(optional)] on_close: Option<Callback<()>>,
    #[prop(optional)] truncate: bool,
) -> impl IntoView {
    let fields = fields.unwrap_or_else(|| Signal::derive(Vec::new));
    let on_click = Callback::new(move |path: MarkerPath| {
        if let Some(on_focus) = on_focus {
            on_focus.run(path);
        }
        if let Some(on_close) = on_close {
            on_close.run(());
        }
    });

    move || {
        let rows = markers.with(|markers| {
            fields.with(|fields| {
                ordered_issues(markers)
                    .into_iter()
                    .map(|marker| (resolve_path_title(fields, &marker.path), marker.clone()))
                    .collect::<Vec<_>>()
            })
        });
        (!rows.is_empty()).then(|| {
            view! {
                <div class="validation-list" style="max-width: 250px; max-height: 60vh; overflow: auto;">
                    {rows
                        .into_iter()
                        .map(|(title, marker)| view! {
                            <IssueRow marker=marker title=title truncate=truncate on_click=on_click />
                        })
                        .collect::<Vec<_>>()}
                </div>
            }
        })
    }
}

/// Menu button over the document's validation markers, shown only while
/// errors or warnings exist.
#[component]
pub fn ValidationMenu(
    #[prop(into)] markers: Signal<Vec<Marker>>,
    #[prop(optional, into)] fields: Option<Signal<Vec<SchemaField>>>,
    #[prop(optional)] on_focus: Option<Callback<MarkerPath>>,
) -> impl IntoView {
    let fields = fields.unwrap_or_else(|| Signal::derive(Vec::new));
    let open = RwSignal::new(false);
    let validation = Signal::derive(move || {
        markers.with(|markers| {
            markers
                .iter()
                .filter(|marker| marker.is_validation())
                .cloned()
                .collect::<Vec<_>>()
        })
    });
    let counts = Memo::new(move |_| validation.with(|markers| IssueCounts::of(markers)));
    let on_close = Callback::new(move |()| open.set(false));

    move || {
        counts.get().has_issues().then(|| {
            view! {
                <div class="validation-menu" style="position: relative;">
                    <button
                        title=MENU_TITLE
                        data-tone="critical"
                        on:click=move |_| open.update(|open| *open = !*open)
                        style="background: transparent; border: 1px solid var(--border-color); border-radius: 4px; padding: 0.25rem 0.5rem; cursor: pointer; color: var(--text-muted);"
                    >
                        {move || {
                            let counts = counts.get();
                            format!("⊘ {} / ⚠ {}", counts.errors, counts.warnings)
                        }}
                    </button>
                    <Show when=move || open.get()>
                        <div style="position: absolute; right: 0; top: 100%; z-index: 10; padding: 0.25rem; background: var(--bg-secondary); border: 1px solid var(--border-color); border-radius: 4px;">
                            {match on_focus {
                                Some(on_focus) => view! {
                                    <ValidationList markers=validation fields=fields on_focus=on_focus on_close=on_close />
                                }.into_any(),
                                None => view! {
                                    <ValidationList markers=validation fields=fields on_close=on_close />
                                }.into_any(),
                            }}
                        </div>
                    </Show>
                </div>
            }
        })
    }
}
