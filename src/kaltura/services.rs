use serde_json::{json, Value};

use super::filters::*;
use super::types::*;
use super::{with_object_type, KalturaClient, KalturaError};

// Typed wrappers over the handful of vendor services the commands touch.
// Page sizes mirror what each original workflow used.

impl KalturaClient {
    // --- baseEntry -----------------------------------------------------------

    pub async fn base_entry_get(&self, entry_id: &str) -> Result<MediaEntry, KalturaError> {
        self.call("baseentry", "get", json!({ "entryId": entry_id })).await
    }

    pub async fn base_entry_list(
        &self,
        filter: &MediaEntryFilter,
        page_size: i32,
    ) -> Result<Vec<MediaEntry>, KalturaError> {
        self.list_all("baseentry", "KalturaBaseEntryFilter", filter, page_size).await
    }

    pub async fn base_entry_rename(
        &self,
        entry_id: &str,
        new_name: &str,
    ) -> Result<MediaEntry, KalturaError> {
        self.call(
            "baseentry",
            "update",
            json!({
                "entryId": entry_id,
                "baseEntry": { "objectType": "KalturaBaseEntry", "name": new_name },
            }),
        )
        .await
    }

    pub async fn base_entry_update(
        &self,
        entry_id: &str,
        entry: Value,
    ) -> Result<MediaEntry, KalturaError> {
        self.call("baseentry", "update", json!({ "entryId": entry_id, "baseEntry": entry })).await
    }

    pub async fn base_entry_delete(&self, entry_id: &str) -> Result<Value, KalturaError> {
        self.call("baseentry", "delete", json!({ "entryId": entry_id })).await
    }

    pub async fn base_entry_recycle(&self, entry_id: &str) -> Result<Value, KalturaError> {
        self.call("baseentry", "recycle", json!({ "entryId": entry_id })).await
    }

    // --- media ---------------------------------------------------------------

    pub async fn media_get(&self, entry_id: &str) -> Result<MediaEntry, KalturaError> {
        self.call("media", "get", json!({ "entryId": entry_id })).await
    }

    pub async fn media_list(
        &self,
        filter: &MediaEntryFilter,
        page_size: i32,
    ) -> Result<Vec<MediaEntry>, KalturaError> {
        self.list_all("media", MediaEntryFilter::OBJECT_TYPE, filter, page_size).await
    }

    /// Multi-stream children of a parent entry (one level, no grandchildren).
    pub async fn media_children(&self, parent_id: &str) -> Result<Vec<MediaEntry>, KalturaError> {
        let filter = MediaEntryFilter {
            parent_entry_id_equal: Some(parent_id.to_string()),
            ..Default::default()
        };
        self.media_list(&filter, 500).await
    }

    pub async fn media_add(&self, entry: Value) -> Result<MediaEntry, KalturaError> {
        self.call("media", "add", json!({ "entry": entry })).await
    }

    pub async fn media_add_content_from_url(
        &self,
        entry_id: &str,
        url: &str,
    ) -> Result<MediaEntry, KalturaError> {
        self.call(
            "media",
            "addContent",
            json!({
                "entryId": entry_id,
                "resource": { "objectType": "KalturaUrlResource", "url": url },
            }),
        )
        .await
    }

    // --- category / categoryUser / categoryEntry ------------------------------

    pub async fn category_get(&self, category_id: i64) -> Result<Category, KalturaError> {
        self.call("category", "get", json!({ "id": category_id })).await
    }

    pub async fn category_list(
        &self,
        filter: &CategoryFilter,
        page_size: i32,
    ) -> Result<Vec<Category>, KalturaError> {
        self.list_all("category", CategoryFilter::OBJECT_TYPE, filter, page_size).await
    }

    pub async fn category_add(&self, category: &NewCategory) -> Result<Category, KalturaError> {
        let mut body = serde_json::to_value(category).map_err(KalturaError::Decode)?;
        if let Value::Object(map) = &mut body {
            map.insert("objectType".into(), json!("KalturaCategory"));
        }
        self.call("category", "add", json!({ "category": body })).await
    }

    pub async fn category_user_add(
        &self,
        category_id: i64,
        user_id: &str,
        permission_level: i32,
    ) -> Result<Value, KalturaError> {
        self.call(
            "categoryuser",
            "add",
            json!({
                "categoryUser": {
                    "objectType": "KalturaCategoryUser",
                    "categoryId": category_id,
                    "userId": user_id,
                    "permissionLevel": permission_level,
                },
            }),
        )
        .await
    }

    pub async fn category_entry_list(
        &self,
        filter: &CategoryEntryFilter,
        page_size: i32,
    ) -> Result<Vec<CategoryEntry>, KalturaError> {
        self.list_all("categoryentry", CategoryEntryFilter::OBJECT_TYPE, filter, page_size).await
    }

    // --- flavorAsset -----------------------------------------------------------

    pub async fn flavor_list(&self, entry_id: &str) -> Result<Vec<FlavorAsset>, KalturaError> {
        let filter =
            FlavorAssetFilter { entry_id_equal: Some(entry_id.to_string()) };
        self.list_all("flavorasset", FlavorAssetFilter::OBJECT_TYPE, &filter, 500).await
    }

    pub async fn flavor_get_url(&self, flavor_id: &str) -> Result<String, KalturaError> {
        self.call("flavorasset", "getUrl", json!({ "id": flavor_id })).await
    }

    pub async fn flavor_delete(&self, flavor_id: &str) -> Result<Value, KalturaError> {
        self.call("flavorasset", "delete", json!({ "id": flavor_id })).await
    }

    // --- caption_captionAsset (caption plugin) ---------------------------------

    pub async fn caption_list(
        &self,
        filter: &CaptionAssetFilter,
    ) -> Result<Vec<CaptionAsset>, KalturaError> {
        self.list_all("caption_captionasset", CaptionAssetFilter::OBJECT_TYPE, filter, 500).await
    }

    pub async fn caption_get_url(&self, caption_id: &str) -> Result<String, KalturaError> {
        self.call("caption_captionasset", "getUrl", json!({ "id": caption_id, "storageId": 0 }))
            .await
    }

    pub async fn caption_set_visibility(
        &self,
        caption_id: &str,
        display_on_player: bool,
    ) -> Result<CaptionAsset, KalturaError> {
        self.call(
            "caption_captionasset",
            "update",
            json!({
                "id": caption_id,
                "captionAsset": {
                    "objectType": "KalturaCaptionAsset",
                    "displayOnPlayer": display_on_player,
                },
            }),
        )
        .await
    }

    pub async fn caption_add(
        &self,
        entry_id: &str,
        caption: Value,
    ) -> Result<CaptionAsset, KalturaError> {
        self.call(
            "caption_captionasset",
            "add",
            json!({ "entryId": entry_id, "captionAsset": caption }),
        )
        .await
    }

    pub async fn caption_set_content_from_url(
        &self,
        caption_id: &str,
        url: &str,
    ) -> Result<CaptionAsset, KalturaError> {
        self.call(
            "caption_captionasset",
            "setContent",
            json!({
                "id": caption_id,
                "contentResource": { "objectType": "KalturaUrlResource", "url": url },
            }),
        )
        .await
    }

    // --- cuePoint (cuepoint plugin) --------------------------------------------

    pub async fn cue_point_list(
        &self,
        filter: &CuePointFilter,
    ) -> Result<Vec<CuePoint>, KalturaError> {
        self.list_all("cuepoint_cuepoint", CuePointFilter::OBJECT_TYPE, filter, 500).await
    }

    pub async fn cue_point_add(&self, cue_point: Value) -> Result<CuePoint, KalturaError> {
        self.call("cuepoint_cuepoint", "add", json!({ "cuePoint": cue_point })).await
    }

    pub async fn cue_point_delete(&self, cue_point_id: &str) -> Result<Value, KalturaError> {
        self.call("cuepoint_cuepoint", "delete", json!({ "id": cue_point_id })).await
    }

    // --- audit trail (audit plugin) --------------------------------------------

    pub async fn audit_trail_list(
        &self,
        filter: &AuditTrailFilter,
    ) -> Result<Vec<AuditTrail>, KalturaError> {
        self.list_all("audit_audittrail", AuditTrailFilter::OBJECT_TYPE, filter, 500).await
    }

    // --- playlist ----------------------------------------------------------------

    pub async fn playlist_get(&self, playlist_id: &str) -> Result<Playlist, KalturaError> {
        self.call("playlist", "get", json!({ "id": playlist_id })).await
    }

    pub async fn playlist_clone(&self, playlist_id: &str) -> Result<Playlist, KalturaError> {
        self.call("playlist", "clone", json!({ "id": playlist_id })).await
    }

    // --- metadata (metadata plugin) -----------------------------------------------

    pub async fn metadata_list(
        &self,
        filter: &MetadataFilter,
    ) -> Result<Vec<Metadata>, KalturaError> {
        let value = with_object_type(filter, MetadataFilter::OBJECT_TYPE);
        let page: ListResponse<Metadata> = self
            .call("metadata_metadata", "list", json!({ "filter": value }))
            .await?;
        Ok(page.objects)
    }

    pub async fn metadata_update(&self, metadata_id: i64, xml: &str) -> Result<Metadata, KalturaError> {
        self.call("metadata_metadata", "update", json!({ "id": metadata_id, "xmlData": xml }))
            .await
    }
}
