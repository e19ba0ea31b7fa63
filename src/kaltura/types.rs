use serde::{Deserialize, Serialize};

/// Paged list envelope shared by every `*.list` action.
#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default, rename = "totalCount")]
    pub total_count: i64,
    #[serde(default = "Vec::new")]
    pub objects: Vec<T>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPager {
    pub page_size: i32,
    pub page_index: i32,
}

impl FilterPager {
    pub fn new(page_size: i32) -> Self {
        FilterPager { page_size, page_index: 1 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub duration: i64,
    #[serde(default)]
    pub plays: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub last_played_at: i64,
    #[serde(default)]
    pub media_type: i32,
    #[serde(default)]
    pub parent_entry_id: Option<String>,
    #[serde(default)]
    pub root_entry_id: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub conversion_profile_id: Option<i64>,
    #[serde(default)]
    pub ms_duration: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl MediaEntry {
    /// Multi-stream children carry a parent pointer distinct from their own id.
    pub fn is_child(&self) -> bool {
        let points_elsewhere = |v: &Option<String>| {
            v.as_deref().map(|p| !p.is_empty() && p != self.id).unwrap_or(false)
        };
        points_elsewhere(&self.parent_entry_id) || points_elsewhere(&self.root_entry_id)
    }
}

pub const MEDIA_TYPE_VIDEO: i32 = 1;
pub const MEDIA_TYPE_IMAGE: i32 = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub parent_id: i64,
    #[serde(default)]
    pub owner: String,
}

/// Category creation payload (channels create).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub owner: String,
    pub privacy: i32,
    pub parent_id: i64,
    pub privacy_context: String,
    pub user_join_policy: i32,
    pub appear_in_list: i32,
    pub inheritance_type: i32,
    pub default_permission_level: i32,
    pub contribution_policy: i32,
    pub moderation: i32,
}

pub const CATEGORY_USER_PERMISSION_MEMBER: i32 = 3;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntry {
    pub entry_id: String,
    #[serde(default)]
    pub category_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorAsset {
    pub id: String,
    #[serde(default)]
    pub entry_id: String,
    #[serde(default)]
    pub flavor_params_id: i64,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub is_original: bool,
    #[serde(default)]
    pub file_ext: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionAsset {
    pub id: String,
    #[serde(default)]
    pub entry_id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub display_on_player: bool,
    #[serde(default)]
    pub accuracy: i32,
    #[serde(default)]
    pub file_ext: Option<String>,
}

pub const CAPTION_STATUS_READY: i32 = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CuePoint {
    pub id: String,
    #[serde(default)]
    pub entry_id: String,
    #[serde(default)]
    pub cue_point_type: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub user_id: Option<String>,
    // thumb cue point (chapter) fields
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sub_type: Option<i32>,
    // code/annotation fields
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

pub const THUMB_CUE_SUBTYPE_CHAPTER: i32 = 2;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    pub id: i64,
    #[serde(default)]
    pub entry_id: String,
    #[serde(default)]
    pub entry_point: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub id: i64,
    #[serde(default)]
    pub object_id: String,
    #[serde(default)]
    pub xml: String,
}

pub const METADATA_OBJECT_TYPE_CATEGORY: &str = "2";
