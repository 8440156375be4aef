use ash::vk;
use quadra_rhi::{
    core::{command_buffer::RhiCommandBuffer, command_pool::RhiCommandPool},
    rhi::Rhi,
};

/// recorder 的生命周期状态
///
/// 状态的非法迁移属于程序错误，直接断言失败，不做运行时恢复
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    /// 创建之后、首次 reset 之前
    Idle,
    /// reset 之后、close 之前，可以录制命令
    Recording,
    /// close 之后，录制内容不可变，可以提交
    Closed,
}

impl RecorderState {
    /// reset 引发的状态迁移
    ///
    /// 只能从 Idle/Closed 进入 Recording：录制中的 recorder 不允许被重置
    pub(crate) fn on_reset(self) -> Self {
        assert_ne!(self, RecorderState::Recording, "recorder is still recording, close it before reset");
        RecorderState::Recording
    }

    /// close 引发的状态迁移
    pub(crate) fn on_close(self) -> Self {
        assert_eq!(self, RecorderState::Recording, "recorder is not recording, nothing to close");
        RecorderState::Closed
    }
}

/// 可复用的命令录制器：一个 command pool + 一个 primary command buffer
///
/// recorder 自身不包含任何领域知识，它只是一份命令的转录，
/// 具体录什么由调用方（frame targets、pipeline、mesh、object arena）决定。
/// 并行录制时每个 recorder 都被唯一的 task 独占
pub struct FrameRecorder {
    command_pool: RhiCommandPool,
    command_buffer: RhiCommandBuffer,
    state: RecorderState,
    debug_name: String,
}

impl FrameRecorder {
    pub fn new(rhi: &Rhi, debug_name: &str) -> Self {
        // 每个 recorder 独立一个 pool，这样各个 recorder 可以在不同线程上并发 reset/录制
        let command_pool = RhiCommandPool::new(
            rhi.device_arc(),
            rhi.physical_device().graphics_queue_family.clone(),
            vk::CommandPoolCreateFlags::empty(),
            debug_name,
        );
        let command_buffer = RhiCommandBuffer::new(rhi.device_arc(), &command_pool, debug_name);

        Self {
            command_pool,
            command_buffer,
            state: RecorderState::Idle,
            debug_name: debug_name.to_string(),
        }
    }

    /// 丢弃上一次的录制内容（复用底层存储），重新进入 Recording 状态
    ///
    /// 调用方必须已经通过上一帧的 fence 等待确认 GPU 不再读取这份录制
    pub fn reset(&mut self) {
        self.state = self.state.on_reset();
        self.command_pool.reset_all_buffers();
        self.command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, &self.debug_name);
    }

    /// 结束录制，recorder 进入 Closed 状态，可以提交
    pub fn close(&mut self) {
        self.state = self.state.on_close();
        self.command_buffer.end();
    }

    /// 录制用的 command buffer，只在 Recording 状态下可用
    #[inline]
    pub fn cmd(&self) -> &RhiCommandBuffer {
        assert_eq!(self.state, RecorderState::Recording, "recorder is not in recording state");
        &self.command_buffer
    }

    /// 已关闭的录制的 handle，用于构建提交数组
    #[inline]
    pub fn closed_handle(&self) -> vk::CommandBuffer {
        assert_eq!(self.state, RecorderState::Closed, "only a closed recorder can be submitted");
        self.command_buffer.handle()
    }

    #[inline]
    pub fn state(&self) -> RecorderState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_from_idle_and_closed() {
        assert_eq!(RecorderState::Idle.on_reset(), RecorderState::Recording);
        assert_eq!(RecorderState::Closed.on_reset(), RecorderState::Recording);
    }

    #[test]
    fn test_close_after_reset() {
        let state = RecorderState::Idle.on_reset();
        assert_eq!(state.on_close(), RecorderState::Closed);
    }

    #[test]
    #[should_panic(expected = "still recording")]
    fn test_reset_while_recording_panics() {
        RecorderState::Recording.on_reset();
    }

    #[test]
    #[should_panic(expected = "not recording")]
    fn test_close_without_reset_panics() {
        RecorderState::Idle.on_close();
    }

    #[test]
    #[should_panic(expected = "not recording")]
    fn test_double_close_panics() {
        RecorderState::Closed.on_close();
    }

    // 连续两帧的状态迁移：帧 N close 之后，帧 N+1 的 reset 总是合法的
    #[test]
    fn test_two_consecutive_frames() {
        let mut state = RecorderState::Idle;
        for _ in 0..2 {
            state = state.on_reset();
            state = state.on_close();
        }
        assert_eq!(state, RecorderState::Closed);
    }
}
