use leptos::html;
use leptos::prelude::*;

use crate::config::OverlayConfig;
use crate::geometry::OutlineGeometry;
use crate::intersection::{
    classify, ClassifiedEntry, IntersectionAction, IntersectionRecord, IntersectionState,
    TrackKey, TrackedItem,
};
use crate::observer_pool::{ObserverPool, Subscription};

const SPACER_PADDING: u32 = 20;

pub fn overlay_style(debug: bool) -> String {
    format!(
        "position: absolute; top: 0; left: 0; right: 0; bottom: 0; pointer-events: none; z-index: 5;{}",
        if debug {
            " background: rgba(255, 255, 0, 0.25);"
        } else {
            ""
        }
    )
}

pub fn outline_style(outline: OutlineGeometry, debug: bool) -> String {
    format!(
        "position: absolute; overflow: hidden; pointer-events: none; outline: 1px solid #00b; {} visibility: {};{}",
        outline.to_style(),
        if debug { "visible" } else { "hidden" },
        if debug {
            " background: rgba(255, 0, 0, 0.25);"
        } else {
            ""
        }
    )
}

pub fn sentinel_style(key: &TrackKey, debug: bool) -> String {
    let (edge, color) = match key {
        TrackKey::Bottom => ("bottom", "blue"),
        _ => ("top", "red"),
    };
    format!(
        "position: sticky; {edge}: 0; height: 1px; background-color: {};",
        if debug { color } else { "transparent" }
    )
}

/// Action to apply once a tracked element stops reporting. Only a
/// subscription that was still active forgets its key.
pub fn release_action(cancelled: bool, track: TrackKey) -> Option<IntersectionAction> {
    cancelled.then_some(IntersectionAction::Forget { key: track })
}

/// Element that reports its intersection records for `track` while mounted.
///
/// Subscription waits until the node is attached; unmounting cancels it and
/// forgets the key's last record.
#[component]
fn Tracked(
    pool: StoredValue<ObserverPool, LocalStorage>,
    track: TrackKey,
    on_action: Callback<IntersectionAction>,
    #[prop(into)] style: Signal<String>,
) -> impl IntoView {
    let node_ref = NodeRef::<html::Div>::new();
    let subscription = StoredValue::new_local(None::<Subscription>);
    let data_key = track.to_string();

    let effect_key = track.clone();
    Effect::new(move |_| {
        let Some(element) = node_ref.get() else {
            return;
        };
        if subscription.with_value(Option::is_some) {
            return;
        }
        let record_key = effect_key.clone();
        let handler = move |record: IntersectionRecord| {
            on_action.run(IntersectionAction::Record {
                key: record_key.clone(),
                record,
            });
        };
        match pool.with_value(|pool| pool.observe(&element, handler)) {
            Ok(sub) => subscription.set_value(Some(sub)),
            Err(err) => log::warn!("not tracking {effect_key}: {err}"),
        }
    });

    on_cleanup(move || {
        let cancelled = subscription
            .try_update_value(|sub| sub.take().is_some_and(|sub| sub.cancel()))
            .unwrap_or(false);
        if let Some(action) = release_action(cancelled, track) {
            on_action.run(action);
        }
    });

    view! { <div node_ref=node_ref data-track=data_key style=move || style.get()></div> }
}

#[component]
pub fn StickyOverlay<F, IV>(
    #[prop(into)] items: Signal<Vec<TrackedItem>>,
    render: F,
    children: Children,
    #[prop(optional, into)] config: Option<Signal<OverlayConfig>>,
    #[prop(optional)] tracker_ref: Option<NodeRef<html::Div>>,
) -> impl IntoView
where
    F: Fn(Vec<ClassifiedEntry>) -> IV + Send + Sync + 'static,
    IV: IntoView + 'static,
{
    let config = config.unwrap_or_else(|| Signal::derive(OverlayConfig::default));
    let tracker_ref = tracker_ref.unwrap_or_default();

    let pool = StoredValue::new_local(ObserverPool::new(
        &config.with_untracked(|config| config.thresholds.clone()),
    ));
    let state = RwSignal::new(IntersectionState::default());
    let on_action = Callback::new(move |action: IntersectionAction| {
        state.try_update(|state| *state = std::mem::take(state).reduce(action));
    });

    let entries = Memo::new(move |_| {
        let margins = config.with(OverlayConfig::margins);
        items.with(|items| state.with(|state| classify(items, state, margins)))
    });
    let debug = move || config.with(|config| config.debug);

    on_cleanup(move || {
        pool.try_with_value(|pool| pool.disconnect());
        state.try_update(|state| *state = std::mem::take(state).reduce(IntersectionAction::Reset));
    });

    let outline_for = move |id: String| {
        Signal::derive(move || {
            let margin = config.with(|config| config.outline_margin);
            let rect = items.with(|items| {
                items
                    .iter()
                    .find(|item| item.id == id)
                    .map(|item| item.rect)
                    .unwrap_or_default()
            });
            outline_style(OutlineGeometry::for_rect(rect, margin), debug())
        })
    };

    view! {
        <div node_ref=tracker_ref style="position: relative;">
            <Tracked
                pool=pool
                track=TrackKey::Top
                on_action=on_action
                style=Signal::derive(move || sentinel_style(&TrackKey::Top, debug()))
            />
            <div>{children()}</div>
            <div style=move || overlay_style(debug())>{move || render(entries.get())}</div>
            <div style=move || overlay_style(debug())>
                <For
                    each=move || {
                        items
                            .get()
                            .into_iter()
                            .filter(|item| matches!(TrackKey::from_id(&item.id), TrackKey::Item(_)))
                            .collect::<Vec<_>>()
                    }
                    key=|item| item.id.clone()
                    children=move |item| {
                        let id = item.id.clone();
                        view! {
                            <Tracked
                                pool=pool
                                track=TrackKey::Item(item.id)
                                on_action=on_action
                                style=outline_for(id)
                            />
                        }
                    }
                />
            </div>
            <div style=format!("padding: {SPACER_PADDING}px;")></div>
            <Tracked
                pool=pool
                track=TrackKey::Bottom
                on_action=on_action
                style=Signal::derive(move || sentinel_style(&TrackKey::Bottom, debug()))
            />
        </div>
    }
}
