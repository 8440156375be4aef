use ash::vk;
use glam::{Mat4, vec3, vec4};
use quadra_render::{
    app::{AppSettings, QuadApp},
    renderer::object_data::ObjectRecord,
};
use rand::Rng;
use rayon::prelude::*;

/// 并行录制的 command recorder 数量
const BODY_RECORDER_NUM: usize = 4;
/// object 数量
const OBJECT_NUM: u32 = 24000;

/// 相机参数
const EYE: glam::Vec3 = vec3(0.0, 0.0, -300.0);
const DIR: glam::Vec3 = vec3(0.0, 0.0, 1.0);
const UP: glam::Vec3 = vec3(0.0, 1.0, 0.0);

/// 生成所有 object 的数据：随机平移的世界矩阵、随机颜色
///
/// view/proj 对所有 object 相同，预先乘好写入每条 record
fn build_object_records(aspect: f32) -> Vec<ObjectRecord> {
    let view = Mat4::look_to_lh(EYE, DIR, UP);
    let proj = Mat4::perspective_lh(std::f32::consts::PI / 4.0, aspect, 0.1, 1000.0);
    let view_proj = proj * view;

    (0..OBJECT_NUM)
        .into_par_iter()
        .map_init(rand::thread_rng, |rng, _| {
            let x = rng.gen_range(0.0..255.0) - 127.0;
            let y = rng.gen_range(0.0..255.0) * 0.5 - 63.0;

            ObjectRecord {
                world: Mat4::from_translation(vec3(x, y, 0.0)),
                view_proj,
                color: vec4(
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                    rng.gen_range(0.0..1.0),
                    1.0,
                ),
            }
        })
        .collect()
}

fn main() {
    let settings = AppSettings {
        window_title: "quadra".to_string(),
        window_extent: vk::Extent2D {
            width: 1280,
            height: 720,
        },
        object_num: OBJECT_NUM,
        body_recorder_num: BODY_RECORDER_NUM,
    };

    QuadApp::run(settings, |arena, aspect| {
        let records = build_object_records(aspect);
        arena.populate(&records);
    });
}
