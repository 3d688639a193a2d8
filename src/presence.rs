use std::collections::HashSet;

use leptos::prelude::*;
use serde::{Deserialize, Serialize};

use crate::intersection::Position;

pub const AVATAR_SIZE: f64 = 23.0;
pub const AVATAR_DISTANCE: f64 = -4.0;
pub const DEFAULT_MAX_AVATARS: usize = 3;

/// Round badge shared by avatars and the hidden-count counter.
pub fn badge_style(background: &str) -> String {
    format!(
        "display: inline-flex; align-items: center; justify-content: center; width: {AVATAR_SIZE}px; height: {AVATAR_SIZE}px; border-radius: 50%; background: {background}; font-size: 0.65rem;"
    )
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PresenceUser {
    pub id: String,
    pub display_name: String,
    pub color: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FieldPresence {
    pub user: PresenceUser,
    pub path: String,
    pub last_active_at: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StackItem {
    Avatar(PresenceUser),
    Counter(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct StackSlot {
    pub item: StackItem,
    pub offset_x: f64,
    pub z_index: i32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AvatarStack {
    pub slots: Vec<StackSlot>,
    pub min_width: f64,
}

impl AvatarStack {
    /// Keeps the `max_avatars` most recently active users visible, most
    /// recent first. The rest collapse into a counter once two or more are
    /// hidden.
    pub fn build(presence: &[FieldPresence], max_avatars: usize, stack: bool) -> Self {
        let mut seen = HashSet::new();
        let mut sorted: Vec<&FieldPresence> = presence
            .iter()
            .filter(|p| seen.insert(p.user.id.as_str()))
            .collect();
        sorted.sort_by_key(|p| p.last_active_at);

        let split = if stack {
            sorted.len().saturating_sub(max_avatars)
        } else {
            0
        };
        let (hidden, visible) = sorted.split_at(split);

        let mut items: Vec<StackItem> = visible
            .iter()
            .rev()
            .map(|p| StackItem::Avatar(p.user.clone()))
            .collect();
        if hidden.len() >= 2 {
            items.push(StackItem::Counter(hidden.len()));
        }

        let slots = items
            .into_iter()
            .enumerate()
            .map(|(i, item)| StackSlot {
                item,
                offset_x: -(i as f64) * (AVATAR_SIZE + AVATAR_DISTANCE),
                z_index: 100 - i as i32,
            })
            .collect();

        Self {
            slots,
            min_width: -AVATAR_DISTANCE + (AVATAR_SIZE + AVATAR_DISTANCE) * max_avatars as f64,
        }
    }
}

pub fn initials(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[component]
pub fn PresenceStack(
    presence: Vec<FieldPresence>,
    #[prop(default = DEFAULT_MAX_AVATARS)] max_avatars: usize,
    #[prop(default = Position::Inside)] position: Position,
    #[prop(default = true)] stack: bool,
) -> impl IntoView {
    let layout = AvatarStack::build(&presence, max_avatars, stack);
    let arrow = match position {
        Position::Top => "▲",
        Position::Bottom => "▼",
        Position::Inside => "",
    };

    view! {
        <div
            class="presence-stack"
            data-position=position.as_str()
            style=format!("position: relative; height: {AVATAR_SIZE}px; min-width: {}px;", layout.min_width)
        >
            {layout.slots.into_iter().map(|slot| {
                let style = format!(
                    "position: absolute; right: 0; transform: translate3d({}px, 0px, 0px); transition: transform 200ms cubic-bezier(0.85, 0, 0.15, 1); z-index: {};",
                    slot.offset_x, slot.z_index
                );
                match slot.item {
                    StackItem::Avatar(user) => view! {
                        <div class="presence-avatar" style=style title=user.display_name.clone()>
                            <span
                                style=format!("{} color: white; font-weight: 600; border: 1px solid var(--bg-primary);", badge_style(&user.color))
                            >
                                {initials(&user.display_name)}
                            </span>
                            <span class="presence-arrow" style="font-size: 0.5rem;">{arrow}</span>
                        </div>
                    }.into_any(),
                    StackItem::Counter(count) => view! {
                        <div class="presence-counter" style=style>
                            <span
                                style=format!("{} color: var(--text-secondary);", badge_style("var(--bg-secondary)"))
                            >
                                {count}
                            </span>
                        </div>
                    }.into_any(),
                }
            }).collect::<Vec<_>>()}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(user: &str, last_active_at: u64) -> FieldPresence {
        FieldPresence {
            user: PresenceUser {
                id: user.to_string(),
                display_name: user.to_string(),
                color: "#000".to_string(),
            },
            path: "title".to_string(),
            last_active_at,
        }
    }

    fn avatar_ids(stack: &AvatarStack) -> Vec<String> {
        stack
            .slots
            .iter()
            .filter_map(|slot| match &slot.item {
                StackItem::Avatar(user) => Some(user.id.clone()),
                StackItem::Counter(_) => None,
            })
            .collect()
    }

    #[test]
    fn most_recent_users_are_visible_first() {
        let stack = AvatarStack::build(
            &[presence("a", 1), presence("b", 3), presence("c", 2)],
            3,
            true,
        );
        assert_eq!(avatar_ids(&stack), vec!["b", "c", "a"]);
        assert!(stack
            .slots
            .iter()
            .all(|slot| matches!(slot.item, StackItem::Avatar(_))));
    }

    #[test]
    fn duplicate_users_are_collapsed() {
        let stack = AvatarStack::build(&[presence("a", 1), presence("a", 9)], 3, true);
        assert_eq!(avatar_ids(&stack), vec!["a"]);
    }

    #[test]
    fn counter_needs_at_least_two_hidden() {
        let one_hidden = AvatarStack::build(
            &[presence("a", 1), presence("b", 2), presence("c", 3)],
            2,
            true,
        );
        assert_eq!(avatar_ids(&one_hidden), vec!["c", "b"]);
        assert_eq!(one_hidden.slots.len(), 2);

        let two_hidden = AvatarStack::build(
            &[
                presence("a", 1),
                presence("b", 2),
                presence("c", 3),
                presence("d", 4),
            ],
            2,
            true,
        );
        assert_eq!(avatar_ids(&two_hidden), vec!["d", "c"]);
        assert_eq!(two_hidden.slots[2].item, StackItem::Counter(2));
    }

    #[test]
    fn unstacked_shows_everyone() {
        let stack = AvatarStack::build(
            &[
                presence("a", 1),
                presence("b", 2),
                presence("c", 3),
                presence("d", 4),
            ],
            2,
            false,
        );
        assert_eq!(avatar_ids(&stack), vec!["d", "c", "b", "a"]);
    }

    #[test]
    fn slots_are_offset_and_layered() {
        let stack = AvatarStack::build(&[presence("a", 1), presence("b", 2)], 3, true);
        assert_eq!(stack.slots[0].offset_x, 0.0);
        assert_eq!(stack.slots[1].offset_x, -(AVATAR_SIZE + AVATAR_DISTANCE));
        assert_eq!(stack.slots[0].z_index, 100);
        assert_eq!(stack.slots[1].z_index, 99);
        assert_eq!(
            stack.min_width,
            -AVATAR_DISTANCE + (AVATAR_SIZE + AVATAR_DISTANCE) * 3.0
        );
    }

    #[test]
    fn initials_take_first_two_words() {
        assert_eq!(initials("ada lovelace byron"), "AL");
        assert_eq!(initials("Grace"), "G");
        assert_eq!(initials("  "), "");
    }

    #[test]
    fn badges_are_avatar_sized() {
        let style = badge_style("#059669");
        assert!(style.contains("width: 23px; height: 23px;"));
        assert!(style.contains("background: #059669;"));
    }
}
