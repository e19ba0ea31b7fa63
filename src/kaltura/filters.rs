use serde::Serialize;

// Filter payloads carry the vendor objectType discriminator explicitly;
// unset fields are omitted from the request body.

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_like: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags_multi_like_or: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories_ids_match_or: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ancestor_id_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id_equal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_entry_id_equal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type_equal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_greater_than_or_equal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_less_than_or_equal: Option<i64>,
}

impl MediaEntryFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaMediaEntryFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name_starts_with: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ancestor_id_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ids_in: Option<String>,
}

impl CategoryFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaCategoryFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryEntryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id_equal: Option<i64>,
}

impl CategoryEntryFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaCategoryEntryFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlavorAssetFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id_equal: Option<String>,
}

impl FlavorAssetFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaFlavorAssetFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionAssetFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id_equal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_equal: Option<i32>,
}

impl CaptionAssetFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaCaptionAssetFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CuePointFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id_equal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cue_point_type_equal: Option<String>,
}

impl CuePointFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaCuePointFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrailFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id_equal: Option<String>,
}

impl AuditTrailFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaAuditTrailFilter";
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_profile_id_equal: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_id_equal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_object_type_equal: Option<String>,
}

impl MetadataFilter {
    pub const OBJECT_TYPE: &'static str = "KalturaMetadataFilter";
}
