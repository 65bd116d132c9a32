//! Opaque handles to backend-owned GPU objects.
//!
//! Handles are generational keys: a handle whose object was destroyed is
//! detected as stale instead of aliasing a newer object.

use slotmap::new_key_type;

new_key_type! {
    pub struct BufferId;
    pub struct TextureId;
    pub struct SamplerId;
    pub struct ShaderModuleId;
    pub struct BindGroupLayoutId;
    pub struct PipelineLayoutId;
    pub struct BindGroupId;
    pub struct PipelineId;
}
