//! Video Context - 视频槽位与合成约定

mod slot;

pub use slot::{
    clip_file_name, concat_manifest, is_listed_material, is_managed_file, parse_clip_file_name,
    VideoError, VideoSlot, BGM_FILE, BGM_VOLUME, COMBINED_FILE, CONCAT_LIST_FILE,
    MANAGED_EXTENSIONS, MAX_CLIP_SLOT, OUTPUT_FILE, TEMP_PREFIX, TRIM_OFFSET_SECS,
};
