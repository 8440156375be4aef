pub mod frame_cursor;
pub mod frame_targets;
pub mod mesh;
pub mod object_data;
pub mod orchestrator;
pub mod pipeline;
pub mod recorder;
pub mod texture;
