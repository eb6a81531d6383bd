//! Serializable session state
//!
//! Every field that may be absent in older snapshots carries a serde default
//! so malformed or truncated state degrades instead of failing to parse.
//! Absent optional components keep their in-memory defaults when applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{BlockBufferState, CoordinateTransformState, Point, Rect};

/// Canvas background fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundKind {
    Check,
    Monochrome,
}

impl Default for BackgroundKind {
    fn default() -> Self {
        BackgroundKind::Monochrome
    }
}

/// Which rendition of the reference picture is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayVariant {
    /// The untouched source bitmap
    Src,
    /// The perspective-warped bitmap
    Dst,
}

impl Default for DisplayVariant {
    fn default() -> Self {
        DisplayVariant::Src
    }
}

/// Serialized reference-picture component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePictureState {
    pub show_picture: bool,
    #[serde(default = "default_true")]
    pub show_frame: bool,
    #[serde(default)]
    pub show_only_in_frame: bool,
    #[serde(default)]
    pub displayed_variant: DisplayVariant,
    /// Corner quad in source-image space, ordered top-left, bottom-left,
    /// bottom-right, top-right
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quadrilateral: Option<[Point; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warped_rect: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_view_transform: Option<CoordinateTransformState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_view_transform: Option<CoordinateTransformState>,
}

fn default_true() -> bool {
    true
}

/// Full persisted editor session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub background_type: BackgroundKind,
    #[serde(default = "default_background_color")]
    pub background_color: String,
    pub block: BlockBufferState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_picture: Option<ReferencePictureState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_transform: Option<CoordinateTransformState>,
    /// Per-type matching toggles keyed by block id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_type_enabled: Option<BTreeMap<String, bool>>,
}

fn default_background_color() -> String {
    "#808080".to_string()
}

/// Exported document: the session plus the optional picture payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveFile {
    pub state: SessionState,
    /// Reference picture as a base64 data URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BlockBuffer;

    #[test]
    fn test_minimal_state_parses_with_defaults() {
        let bb = BlockBuffer::new(2, 2);
        let json = format!(
            "{{\"block\":{}}}",
            serde_json::to_string(&bb.save()).unwrap()
        );
        let s: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(s.background_type, BackgroundKind::Monochrome);
        assert_eq!(s.background_color, "#808080");
        assert!(s.template_picture.is_none());
        assert!(s.view_transform.is_none());
    }

    #[test]
    fn test_save_file_round_trip() {
        let bb = BlockBuffer::new(2, 2);
        let f = SaveFile {
            state: SessionState {
                background_type: BackgroundKind::Check,
                background_color: "#123456".into(),
                block: bb.save(),
                template_picture: None,
                view_transform: None,
                block_type_enabled: None,
            },
            picture_data: Some("data:image/png;base64,AAAA".into()),
        };
        let json = serde_json::to_string(&f).unwrap();
        let back: SaveFile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state.background_color, "#123456");
        assert_eq!(back.picture_data.as_deref(), Some("data:image/png;base64,AAAA"));
    }

    #[test]
    fn test_reference_state_defaults() {
        let json = "{\"show_picture\":true}";
        let s: ReferencePictureState = serde_json::from_str(json).unwrap();
        assert!(s.show_frame);
        assert!(!s.show_only_in_frame);
        assert_eq!(s.displayed_variant, DisplayVariant::Src);
        assert!(s.quadrilateral.is_none());
    }
}
