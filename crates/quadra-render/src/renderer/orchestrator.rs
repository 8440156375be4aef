use ash::vk;
use itertools::Itertools;
use quadra_rhi::{
    core::{command_queue::RhiSubmitInfo, synchronize::RhiTimelineSemaphore},
    rhi::Rhi,
};

use crate::renderer::{
    frame_targets::FrameTargets,
    mesh::QuadMesh,
    object_data::ObjectArena,
    pipeline::QuadPipeline,
    recorder::FrameRecorder,
    texture::QuadTexture,
};

/// fence 等待的超时时间：30s 之后认为 GPU 已经 hang 了
const FRAME_WAIT_TIMEOUT_NS: u64 = 30 * 1000 * 1000 * 1000;

/// 将 [0, object_num) 划分成 recorder_num 个连续、等长、互不重叠的区间
///
/// object_num 必须能被 recorder_num 整除
pub(crate) fn partition_ranges(object_num: u32, recorder_num: usize) -> Vec<std::ops::Range<u32>> {
    assert!(recorder_num > 0, "at least one body recorder is required");
    assert_eq!(
        object_num as usize % recorder_num,
        0,
        "object num {} must be divisible by recorder num {}",
        object_num,
        recorder_num
    );

    let span = object_num / recorder_num as u32;
    (0..recorder_num as u32).map(|i| (i * span)..((i + 1) * span)).collect()
}

/// 将录制结果按固定顺序排成提交数组：[begin, body 0..k, end]
///
/// 并行录制的完成顺序不影响这里的顺序，数组在 join 之后从 recorder 数组重建
pub(crate) fn assemble_submission<T: Copy>(begin: T, bodies: &[T], end: T) -> Vec<T> {
    let mut ordered = Vec::with_capacity(bodies.len() + 2);
    ordered.push(begin);
    ordered.extend_from_slice(bodies);
    ordered.push(end);
    ordered
}

/// 帧编排器：驱动每一帧的录制、提交、呈现、同步
///
/// 持有 1 个 begin recorder、K 个 body recorder、1 个 end recorder；
/// body 录制通过 rayon 并行展开，join 之后才进入提交阶段。
/// 每帧结束时在整帧粒度上做一次 CPU/GPU 屏障（timeline 信号量等待），
/// 因此下一帧对所有 recorder 的 reset 都是安全的
pub struct FrameOrchestrator {
    begin_recorder: FrameRecorder,
    body_recorders: Vec<FrameRecorder>,
    end_recorder: FrameRecorder,

    /// 帧结束的 timeline，值等于已完成的 frame_id
    frame_timeline: RhiTimelineSemaphore,
    /// 当前帧的序号，从 1 开始单调递增
    frame_id: u64,

    object_num: u32,
}

impl FrameOrchestrator {
    pub fn new(rhi: &Rhi, object_num: u32, body_recorder_num: usize) -> Self {
        // 提前校验划分的合法性，避免在第一帧才失败
        let _ = partition_ranges(object_num, body_recorder_num);

        let begin_recorder = FrameRecorder::new(rhi, "frame-begin");
        let body_recorders =
            (0..body_recorder_num).map(|i| FrameRecorder::new(rhi, &format!("frame-body-{}", i))).collect_vec();
        let end_recorder = FrameRecorder::new(rhi, "frame-end");

        let frame_timeline = RhiTimelineSemaphore::new(rhi.device_arc(), 0, "frame-timeline");

        Self {
            begin_recorder,
            body_recorders,
            end_recorder,
            frame_timeline,
            frame_id: 0,
            object_num,
        }
    }

    /// 执行一帧的完整协议，返回时 GPU 已经消费完这一帧的全部命令
    ///
    /// 五个阶段要么全部完成，要么进程终止，不存在提交半帧的情况
    pub fn draw_frame(
        &mut self,
        rhi: &Rhi,
        targets: &mut FrameTargets,
        pipeline: &QuadPipeline,
        mesh: &QuadMesh,
        texture: &QuadTexture,
        arena: &ObjectArena,
    ) {
        // 1. begin：当前 surface 转为 render target 并清屏
        {
            self.begin_recorder.reset();
            targets.start_rendering(&self.begin_recorder);
            self.begin_recorder.close();
        }

        // 2. 并行 body：每个 recorder 一个 task，各自录制自己区间内的 draw；
        //    scope 结束即 join，所有 recorder 都已 close
        {
            let ranges = partition_ranges(self.object_num, self.body_recorders.len());
            let extent = targets.extent();
            let targets = &*targets;

            rayon::scope(|s| {
                for (recorder, range) in self.body_recorders.iter_mut().zip(ranges) {
                    s.spawn(move |_| {
                        recorder.reset();

                        targets.set_to_render_target(recorder);
                        pipeline.bind(recorder, extent);
                        texture.bind(recorder, pipeline.layout());
                        mesh.bind(recorder);

                        for i in range {
                            arena.bind(recorder, pipeline.layout(), i);
                            recorder.cmd().draw_indexed(mesh.index_cnt(), 0, 1, 0, 0);
                        }

                        recorder.cmd().end_rendering();
                        recorder.close();
                    });
                }
            });
        }

        // 3. end：当前 surface 转回可呈现状态
        {
            self.end_recorder.reset();
            targets.finish_rendering(&self.end_recorder);
            self.end_recorder.close();
        }

        // 4. 按固定顺序提交，然后 present
        {
            let ordered = assemble_submission(
                self.begin_recorder.closed_handle(),
                &self.body_recorders.iter().map(|r| r.closed_handle()).collect_vec(),
                self.end_recorder.closed_handle(),
            );

            let submit_info = RhiSubmitInfo::new_raw(&ordered)
                .wait(targets.image_acquired_semaphore(), vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT)
                .signal(targets.render_finished_semaphore(), vk::PipelineStageFlags2::ALL_COMMANDS);
            rhi.graphics_queue().submit(vec![submit_info]);

            targets.present(rhi);
        }

        // 5. fence 屏障：在 queue 上推进 timeline 到本帧的序号，阻塞到 GPU 到达。
        //    返回之后，下一帧对任何 recorder 的 reset 都是安全的
        {
            self.frame_id += 1;
            let signal_info = RhiSubmitInfo::new_raw(&[]).signal_timeline(&self.frame_timeline, self.frame_id);
            rhi.graphics_queue().submit(vec![signal_info]);

            self.frame_timeline.wait_timeline(self.frame_id, FRAME_WAIT_TIMEOUT_NS);
        }

        // 整帧屏障之后，acquire 下一个 surface 并推进游标；
        // 游标只用 presentation engine 报告的下标，从不预测
        {
            let next_index = targets.acquire_next_image();
            targets.update_buffer_index(next_index);
        }
    }

    /// 已经完成的帧数
    #[inline]
    pub fn finished_frame_id(&self) -> u64 {
        self.frame_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_covers_whole_range() {
        let ranges = partition_ranges(24000, 4);
        assert_eq!(ranges.len(), 4);

        // 连续且互不重叠
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, 24000);

        // 每个 body recorder 恰好 6000 个 draw，一个 object 一个 draw call
        for range in &ranges {
            assert_eq!(range.len(), 6000);
        }
    }

    #[test]
    fn test_partition_single_recorder() {
        let ranges = partition_ranges(24000, 1);
        assert_eq!(ranges, vec![0..24000]);
    }

    #[test]
    fn test_partition_various_k() {
        for k in [1usize, 2, 3, 4, 6, 8, 12] {
            let ranges = partition_ranges(24000, k);
            assert_eq!(ranges.len(), k);
            let total: usize = ranges.iter().map(|r| r.len()).sum();
            assert_eq!(total, 24000);
        }
    }

    #[test]
    #[should_panic(expected = "divisible")]
    fn test_partition_uneven_panics() {
        partition_ranges(24000, 7);
    }

    #[test]
    fn test_submission_order_is_fixed() {
        // begin 永远在 0 号位，end 永远在 K+1 号位，body 按下标排列
        let ordered = assemble_submission(100u32, &[0, 1, 2, 3], 200);
        assert_eq!(ordered.len(), 4 + 2);
        assert_eq!(ordered, vec![100, 0, 1, 2, 3, 200]);
    }

    #[test]
    fn test_submission_order_no_bodies() {
        let ordered = assemble_submission('b', &[], 'e');
        assert_eq!(ordered, vec!['b', 'e']);
    }
}
