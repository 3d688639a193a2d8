use leptos::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DISABLED_DELETE_TITLE: &str = "Cannot delete current file";
pub const DENIED_DELETE_TITLE: &str = "You do not have permission to delete this file";
const DELETE_TITLE: &str = "Delete file";
const TOOLTIP_FILENAME_LENGTH: usize = 37;
const SIZE_UNITS: [&str; 9] = ["B", "kB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct AssetRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "originalFilename", default)]
    pub original_filename: Option<String>,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: u64,
    #[serde(rename = "_createdAt")]
    pub created_at: String,
}

impl AssetRecord {
    pub fn filename(&self) -> &str {
        self.original_filename.as_deref().unwrap_or_default()
    }
}

/// Answer of the permission check for an action on a document.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Permission {
    pub granted: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("not permitted to delete asset {0}")]
    PermissionDenied(String),
    #[error("asset {0} is the current selection")]
    Selected(String),
    #[error("could not delete asset {id}: {reason}")]
    DeleteFailed { id: String, reason: String },
}

/// Delete job handed to the asset client. The client reports back through
/// `done` exactly once.
#[derive(Clone)]
pub struct DeleteRequest {
    pub id: String,
    pub done: Callback<Result<(), String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DeleteStatus {
    #[default]
    Idle,
    Deleting,
    Failed(AssetError),
}

impl DeleteStatus {
    /// Checks the row may start a delete and moves to `Deleting`.
    pub fn begin(
        &mut self,
        asset_id: &str,
        permission: Permission,
        is_selected: bool,
    ) -> Result<(), AssetError> {
        if *self == Self::Deleting {
            return Err(AssetError::DeleteFailed {
                id: asset_id.to_string(),
                reason: "delete already in progress".to_string(),
            });
        }
        if !permission.granted {
            return Err(AssetError::PermissionDenied(asset_id.to_string()));
        }
        if is_selected {
            return Err(AssetError::Selected(asset_id.to_string()));
        }
        *self = Self::Deleting;
        Ok(())
    }

    /// Applies the client's answer. Failures are logged and kept until
    /// dismissed.
    pub fn finish(&mut self, asset_id: &str, result: Result<(), String>) -> bool {
        match result {
            Ok(()) => {
                *self = Self::Idle;
                true
            }
            Err(reason) => {
                let err = AssetError::DeleteFailed {
                    id: asset_id.to_string(),
                    reason,
                };
                log::error!("Could not delete asset: {err}");
                *self = Self::Failed(err);
                false
            }
        }
    }

    pub fn dismiss(&mut self) {
        if matches!(self, Self::Failed(_)) {
            *self = Self::Idle;
        }
    }

    pub fn is_deleting(&self) -> bool {
        *self == Self::Deleting
    }

    pub fn error(&self) -> Option<&AssetError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Byte count in decimal units with three significant digits, like
/// `1.34 kB`.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1000 {
        return format!("{bytes} B");
    }
    let exponent = ((bytes as f64).log10() / 3.0).floor() as usize;
    let exponent = exponent.min(SIZE_UNITS.len() - 1);
    let value = bytes as f64 / 1000_f64.powi(exponent as i32);
    format!("{} {}", to_precision(value, 3), SIZE_UNITS[exponent])
}

fn to_precision(value: f64, digits: i32) -> String {
    let magnitude = value.log10().floor() as i32 + 1;
    let decimals = (digits - magnitude).max(0) as usize;
    let rounded = format!("{value:.decimals$}");
    if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        rounded
    }
}

/// `application/pdf` becomes `PDF`; values without a subtype pass through.
pub fn format_mime_type(mime_type: &str) -> String {
    match mime_type.split_once('/') {
        Some((_, subtype)) if !subtype.is_empty() => subtype.to_uppercase(),
        _ => mime_type.to_string(),
    }
}

pub fn show_tooltip(filename: &str) -> bool {
    filename.chars().count() > TOOLTIP_FILENAME_LENGTH
}

pub fn delete_title(permission: Permission, is_selected: bool) -> &'static str {
    if !permission.granted {
        DENIED_DELETE_TITLE
    } else if is_selected {
        DISABLED_DELETE_TITLE
    } else {
        DELETE_TITLE
    }
}

#[component]
pub fn AssetRow(
    asset: AssetRecord,
    #[prop(into)] permission: Signal<Permission>,
    #[prop(optional, into)] is_selected: Option<Signal<bool>>,
    delete: Callback<DeleteRequest>,
    #[prop(optional)] on_delete_finished: Option<Callback<String>>,
) -> impl IntoView {
    let is_selected = is_selected.unwrap_or_else(|| Signal::derive(|| false));
    let status = RwSignal::new(DeleteStatus::default());
    let filename = asset.filename().to_string();
    let tooltip = show_tooltip(&filename).then(|| filename.clone());
    let size = format_size(asset.size);
    let mime_type = format_mime_type(&asset.mime_type);
    let id = StoredValue::new(asset.id);

    let on_delete = move |_: leptos::ev::MouseEvent| {
        let asset_id = id.get_value();
        let Some(started) = status.try_update(|status| {
            status.begin(&asset_id, permission.get_untracked(), is_selected.get_untracked())
        }) else {
            return;
        };
        if let Err(err) = started {
            log::warn!("{err}");
            return;
        }
        let done = Callback::new(move |result: Result<(), String>| {
            let asset_id = id.get_value();
            let deleted = status
                .try_update(|status| status.finish(&asset_id, result))
                .unwrap_or(false);
            if deleted {
                if let Some(on_delete_finished) = on_delete_finished {
                    on_delete_finished.run(asset_id);
                }
            }
        });
        delete.run(DeleteRequest {
            id: id.get_value(),
            done,
        });
    };

    let delete_disabled = move || {
        !permission.get().granted || is_selected.get() || status.with(DeleteStatus::is_deleting)
    };

    view! {
        <div
            class="asset-row"
            data-id=id.get_value()
            style=move || format!(
                "display: grid; grid-template-columns: 3fr 1fr 1fr 2fr auto; gap: 0.25rem; align-items: center; padding: 0.25rem 0; border-bottom: 1px solid var(--border-color); opacity: {};",
                if status.with(DeleteStatus::is_deleting) { 0.5 } else { 1.0 }
            )
        >
            <span title=tooltip style="overflow: hidden; text-overflow: ellipsis; white-space: nowrap;">{filename}</span>
            <span style="color: var(--text-muted); font-size: 0.85rem;">{size}</span>
            <span style="color: var(--text-muted); font-size: 0.85rem;">{mime_type}</span>
            <span style="color: var(--text-muted); font-size: 0.85rem;">{asset.created_at}</span>
            <button
                on:click=on_delete
                disabled=delete_disabled
                title=move || delete_title(permission.get(), is_selected.get())
                style="background: transparent; border: 1px solid var(--border-color); border-radius: 4px; padding: 0.25rem 0.5rem; cursor: pointer; color: var(--text-muted);"
            >
                "Delete"
            </button>
            {move || status.with(|status| status.error().cloned()).map(|err| view! {
                <div role="alertdialog" style="grid-column: 1 / -1; display: flex; justify-content: space-between; align-items: center; padding: 0.5rem; border-radius: 4px; background: var(--bg-secondary); color: var(--text-primary);">
                    <span>{err.to_string()}</span>
                    <button
                        on:click=move |_| status.update(DeleteStatus::dismiss)
                        style="background: transparent; border: none; cursor: pointer; color: var(--text-muted);"
                    >
                        "Close"
                    </button>
                </div>
            })}
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRANTED: Permission = Permission { granted: true };

    #[test]
    fn sizes_use_three_significant_digits() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(999), "999 B");
        assert_eq!(format_size(1000), "1 kB");
        assert_eq!(format_size(1337), "1.34 kB");
        assert_eq!(format_size(100_000), "100 kB");
        assert_eq!(format_size(2_500_000), "2.5 MB");
        assert_eq!(format_size(7_340_000_000), "7.34 GB");
    }

    #[test]
    fn mime_type_shows_subtype() {
        assert_eq!(format_mime_type("application/pdf"), "PDF");
        assert_eq!(format_mime_type("image/svg+xml"), "SVG+XML");
        assert_eq!(format_mime_type("binary"), "binary");
    }

    #[test]
    fn long_filenames_get_a_tooltip() {
        assert!(!show_tooltip(&"a".repeat(37)));
        assert!(show_tooltip(&"a".repeat(38)));
    }

    #[test]
    fn delete_needs_permission_and_no_selection() {
        let mut status = DeleteStatus::default();
        assert_eq!(
            status.begin("a", Permission { granted: false }, false),
            Err(AssetError::PermissionDenied("a".into()))
        );
        assert_eq!(
            status.begin("a", GRANTED, true),
            Err(AssetError::Selected("a".into()))
        );
        assert_eq!(status, DeleteStatus::Idle);
        assert_eq!(delete_title(Permission { granted: false }, true), DENIED_DELETE_TITLE);
        assert_eq!(delete_title(GRANTED, true), DISABLED_DELETE_TITLE);
        assert_eq!(delete_title(GRANTED, false), "Delete file");
    }

    #[test]
    fn failed_delete_is_dismissible() {
        let mut status = DeleteStatus::default();
        status.begin("a", GRANTED, false).unwrap();
        assert!(status.is_deleting());
        assert!(status.begin("a", GRANTED, false).is_err());

        assert!(!status.finish("a", Err("referenced by 2 documents".into())));
        assert_eq!(
            status.error().map(ToString::to_string).as_deref(),
            Some("could not delete asset a: referenced by 2 documents")
        );

        status.dismiss();
        assert_eq!(status, DeleteStatus::Idle);
        status.begin("a", GRANTED, false).unwrap();
        assert!(status.finish("a", Ok(())));
        assert_eq!(status, DeleteStatus::Idle);
    }

    #[test]
    fn asset_records_use_collaborator_field_names() {
        let asset: AssetRecord = serde_json::from_str(
            r#"{"_id": "file-1", "originalFilename": "brief.pdf", "mimeType": "application/pdf", "size": 1337, "_createdAt": "2021-03-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(asset.id, "file-1");
        assert_eq!(asset.filename(), "brief.pdf");
        assert_eq!(asset.size, 1337);

        let unnamed: AssetRecord = serde_json::from_str(
            r#"{"_id": "file-2", "mimeType": "text/plain", "size": 1, "_createdAt": "2021-03-01"}"#,
        )
        .unwrap();
        assert_eq!(unnamed.filename(), "");
    }
}
