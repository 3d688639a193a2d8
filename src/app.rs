use std::time::Duration;

use leptos::ev;
use leptos::html;
use leptos::prelude::*;
use wasm_bindgen::JsCast;

use crate::asset::{AssetRecord, AssetRow, DeleteRequest, Permission};
use crate::config::{listen_for_updates, OverlayConfig};
use crate::geometry::Rect;
use crate::intersection::{ClassifiedEntry, Position, TrackedItem};
use crate::overlay::StickyOverlay;
use crate::presence::{FieldPresence, PresenceStack, PresenceUser, DEFAULT_MAX_AVATARS};
use crate::preview::{DocumentPreview, MediaContent, MediaDimensions, MediaFit};
use crate::validation::{Marker, MarkerLevel, MarkerPath, PathSegment, SchemaField, ValidationMenu};

const FIELD_ATTR: &str = "data-field-id";
const SELECTED_ASSET: &str = "file-cover";
const LOCKED_ASSET: &str = "file-brief";
const SIMULATED_DELETE: Duration = Duration::from_millis(600);

#[derive(Clone, Copy)]
enum FieldKind {
    Line,
    Text { rows: u32 },
}

struct FieldSpec {
    id: &'static str,
    label: &'static str,
    kind: FieldKind,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec { id: "title", label: "Title", kind: FieldKind::Line },
    FieldSpec { id: "slug", label: "Slug", kind: FieldKind::Line },
    FieldSpec { id: "lead", label: "Lead", kind: FieldKind::Text { rows: 4 } },
    FieldSpec { id: "body", label: "Body", kind: FieldKind::Text { rows: 24 } },
    FieldSpec { id: "author", label: "Author", kind: FieldKind::Line },
    FieldSpec { id: "tags", label: "Tags", kind: FieldKind::Line },
    FieldSpec { id: "seo", label: "SEO description", kind: FieldKind::Text { rows: 6 } },
    FieldSpec { id: "footnotes", label: "Footnotes", kind: FieldKind::Text { rows: 10 } },
];

fn user(id: &str, display_name: &str, color: &str) -> PresenceUser {
    PresenceUser {
        id: id.to_string(),
        display_name: display_name.to_string(),
        color: color.to_string(),
    }
}

fn sample_presence() -> Vec<FieldPresence> {
    let ada = user("ada", "Ada Lovelace", "#6366f1");
    let grace = user("grace", "Grace Hopper", "#db2777");
    let linus = user("linus", "Linus Torvalds", "#059669");
    let margaret = user("margaret", "Margaret Hamilton", "#d97706");
    let barbara = user("barbara", "Barbara Liskov", "#0891b2");

    [
        (ada.clone(), "title", 30),
        (grace.clone(), "lead", 20),
        (linus, "body", 10),
        (margaret.clone(), "body", 40),
        (barbara, "body", 25),
        (ada, "footnotes", 50),
        (grace, "footnotes", 60),
        (margaret, "seo", 5),
    ]
    .into_iter()
    .map(|(user, path, last_active_at)| FieldPresence {
        user,
        path: path.to_string(),
        last_active_at,
    })
    .collect()
}

fn schema_fields() -> Vec<SchemaField> {
    FIELDS
        .iter()
        .map(|field| SchemaField {
            name: field.id.to_string(),
            title: Some(field.label.to_string()),
        })
        .collect()
}

fn sample_markers() -> Vec<Marker> {
    vec![
        Marker::validation(MarkerLevel::Warning, &["seo"], "Longer than 160 characters"),
        Marker::validation(MarkerLevel::Error, &["slug"], "Required"),
        Marker::validation(MarkerLevel::Error, &["author"], "Must reference a person"),
    ]
}

fn sample_assets() -> Vec<AssetRecord> {
    [
        (SELECTED_ASSET, "cover.pdf", "application/pdf", 1_337_000),
        (LOCKED_ASSET, "spring-issue-editorial-brief-final-v3-approved.docx", "application/msword", 48_200),
        ("file-notes", "notes.txt", "text/plain", 812),
    ]
    .into_iter()
    .map(|(id, filename, mime_type, size)| AssetRecord {
        id: id.to_string(),
        original_filename: Some(filename.to_string()),
        mime_type: mime_type.to_string(),
        size,
        created_at: "2021-03-01".to_string(),
    })
    .collect()
}

/// Stand-in asset client: answers after a delay, refusing assets that are
/// still referenced.
fn simulate_delete(request: DeleteRequest) {
    let DeleteRequest { id, done } = request;
    set_timeout(
        move || {
            let result = if id == LOCKED_ASSET {
                Err("referenced by 2 documents".to_string())
            } else {
                Ok(())
            };
            done.run(result);
        },
        SIMULATED_DELETE,
    );
}

fn focus_field(tracker: &web_sys::Element, path: &[PathSegment]) {
    let Some(PathSegment::Field(id)) = path.first() else {
        return;
    };
    match tracker.query_selector(&format!("[{FIELD_ATTR}=\"{id}\"]")) {
        Ok(Some(field)) => field.scroll_into_view(),
        Ok(None) => log::debug!("no field for path {id}"),
        Err(err) => log::warn!("could not look up field {id}: {err:?}"),
    }
}

fn cover_art(dims: MediaDimensions) -> AnyView {
    let fit = match dims.fit {
        MediaFit::Crop => "cover",
        MediaFit::Clip => "contain",
        MediaFit::Fill => "fill",
    };
    let style = format!(
        "display: flex; align-items: center; justify-content: center; width: {}px; height: {}px; border-radius: var(--radius-md); background: var(--bg-secondary); object-fit: {fit};",
        dims.width, dims.height
    );
    view! { <div style=style>"📰"</div> }.into_any()
}

fn measure_fields(tracker: &web_sys::Element) -> Vec<TrackedItem> {
    let Ok(nodes) = tracker.query_selector_all(&format!("[{FIELD_ATTR}]")) else {
        return Vec::new();
    };
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .filter_map(|el| {
            let id = el.get_attribute(FIELD_ATTR)?;
            Some(TrackedItem::new(
                id,
                Rect::new(
                    f64::from(el.offset_left()),
                    f64::from(el.offset_top()),
                    f64::from(el.offset_width()),
                    f64::from(el.offset_height()),
                ),
            ))
        })
        .collect()
}

fn presence_for<'a>(
    presence: &'a [FieldPresence],
    entries: &'a [ClassifiedEntry],
    position: Position,
) -> impl Iterator<Item = (&'a ClassifiedEntry, Vec<FieldPresence>)> + 'a {
    entries
        .iter()
        .filter(move |entry| entry.position == position)
        .map(move |entry| {
            let here = presence
                .iter()
                .filter(|p| p.path == entry.item.id)
                .cloned()
                .collect::<Vec<_>>();
            (entry, here)
        })
        .filter(|(_, here)| !here.is_empty())
}

fn edge_presence(presence: &[FieldPresence], entries: &[ClassifiedEntry], position: Position) -> Vec<FieldPresence> {
    presence_for(presence, entries, position)
        .flat_map(|(_, here)| here)
        .collect()
}

#[component]
pub fn App() -> impl IntoView {
    let (config, set_config) = signal(OverlayConfig::load());
    listen_for_updates(set_config);

    let (items, set_items) = signal(Vec::<TrackedItem>::new());
    let tracker_ref = NodeRef::<html::Div>::new();
    let presence = StoredValue::new(sample_presence());

    let measure = move || {
        let Some(tracker) = tracker_ref.get_untracked() else {
            return;
        };
        let measured = measure_fields(&tracker);
        log::debug!("measured {} fields", measured.len());
        set_items.set(measured);
    };

    Effect::new(move |_| {
        if tracker_ref.get().is_some() {
            measure();
        }
    });
    let resize = window_event_listener(ev::resize, move |_| measure());
    on_cleanup(move || resize.remove());

    let markers = Signal::derive(sample_markers);
    let fields = Signal::derive(schema_fields);
    let on_focus = Callback::new(move |path: MarkerPath| {
        if let Some(tracker) = tracker_ref.get_untracked() {
            focus_field(&tracker, &path);
        }
    });

    let (assets, set_assets) = signal(sample_assets());
    let (can_delete, set_can_delete) = signal(true);
    let permission = Signal::derive(move || Permission {
        granted: can_delete.get(),
    });
    let delete = Callback::new(simulate_delete);
    let on_delete_finished = Callback::new(move |id: String| {
        log::info!("deleted asset {id}");
        set_assets.update(|assets| assets.retain(|asset| asset.id != id));
    });

    let render = move |entries: Vec<ClassifiedEntry>| {
        presence.with_value(|presence| {
            let above = edge_presence(presence, &entries, Position::Top);
            let below = edge_presence(presence, &entries, Position::Bottom);
            let inside = presence_for(presence, &entries, Position::Inside)
                .map(|(entry, here)| {
                    let style = format!(
                        "position: absolute; top: {}px; right: 1rem;",
                        entry.item.rect.top()
                    );
                    view! {
                        <div style=style>
                            <PresenceStack presence=here position=Position::Inside />
                        </div>
                    }
                })
                .collect::<Vec<_>>();

            view! {
                <div style="position: sticky; top: 0.5rem; display: flex; justify-content: flex-end; padding-right: 1rem; z-index: 2;">
                    {(!above.is_empty()).then(|| view! {
                        <PresenceStack presence=above max_avatars=DEFAULT_MAX_AVATARS position=Position::Top />
                    })}
                </div>
                {inside}
                <div style="position: absolute; top: 0; bottom: 0; right: 0; display: flex; flex-direction: column; justify-content: flex-end;">
                    <div style="position: sticky; bottom: 0.5rem; padding-right: 1rem;">
                        {(!below.is_empty()).then(|| view! {
                            <PresenceStack presence=below max_avatars=DEFAULT_MAX_AVATARS position=Position::Bottom />
                        })}
                    </div>
                </div>
            }
        })
    };

    view! {
        <main class="app-layout" style="display: flex; flex-direction: column; height: 100vh; width: 100vw; background: var(--bg-primary); color: var(--text-primary);">
            <header class="topbar" style="height: var(--topbar-height); border-bottom: 1px solid var(--border-color); display: flex; align-items: center; justify-content: space-between; padding: 0 1.5rem; color: var(--text-muted); font-size: 0.9rem;">
                <span>"Article"</span>
                <div style="display: flex; gap: 0.5rem; align-items: center;">
                    <ValidationMenu markers=markers fields=fields on_focus=on_focus />
                    <button
                        on:click=move |_| set_can_delete.update(|granted| *granted = !*granted)
                        style="background: transparent; border: 1px solid var(--border-color); border-radius: 4px; padding: 0.25rem 0.5rem; cursor: pointer; color: var(--text-muted);"
                        title="Toggle delete permission"
                    >
                        {move || if can_delete.get() { "Can delete" } else { "Read only" }}
                    </button>
                    <button
                        on:click=move |_| set_config.update(|config| config.debug = !config.debug)
                        style="background: transparent; border: 1px solid var(--border-color); border-radius: 4px; padding: 0.25rem 0.5rem; cursor: pointer; color: var(--text-muted);"
                        title="Toggle overlay debug colours"
                    >
                        {move || if config.get().debug { "Debug on" } else { "Debug off" }}
                    </button>
                </div>
            </header>
            <section class="editor-pane" style="flex: 1; overflow-y: auto; padding: 2rem 3rem;">
                <StickyOverlay items=items render=render config=config tracker_ref=tracker_ref>
                    <DocumentPreview
                        title="Spring issue"
                        subtitle="Article"
                        description="Draft, edited by five people"
                        media=MediaContent::render(cover_art)
                    />
                    {FIELDS.iter().map(|field| {
                        let input = match field.kind {
                            FieldKind::Line => view! {
                                <input type="text" style="padding: 0.5rem; border-radius: 4px; border: 1px solid var(--border-color); background: var(--bg-secondary); color: var(--text-primary); width: 100%; box-sizing: border-box;" />
                            }.into_any(),
                            FieldKind::Text { rows } => view! {
                                <textarea rows=rows style="padding: 0.5rem; border-radius: 4px; border: 1px solid var(--border-color); background: var(--bg-secondary); color: var(--text-primary); width: 100%; box-sizing: border-box; resize: vertical;"></textarea>
                            }.into_any(),
                        };
                        view! {
                            <div data-field-id=field.id style="display: flex; flex-direction: column; gap: 0.5rem; margin-top: 1.5rem; padding-right: 6rem;">
                                <label style="font-weight: 600; font-size: 0.9em;">{field.label}</label>
                                {input}
                            </div>
                        }
                    }).collect::<Vec<_>>()}
                    <div style="margin-top: 2rem; padding-right: 6rem;">
                        <h3 style="font-size: 0.9em;">"Attachments"</h3>
                        <For
                            each=move || assets.get()
                            key=|asset| asset.id.clone()
                            children=move |asset| {
                                let is_selected = asset.id == SELECTED_ASSET;
                                view! {
                                    <AssetRow
                                        asset=asset
                                        permission=permission
                                        is_selected=Signal::derive(move || is_selected)
                                        delete=delete
                                        on_delete_finished=on_delete_finished
                                    />
                                }
                            }
                        />
                    </div>
                </StickyOverlay>
            </section>
        </main>
    }
}
