use std::sync::Arc;

use ash::vk;
use vk_mem::Alloc;

use crate::{core::device::RhiDevice, rhi::Rhi};

/// vk buffer 以及其内存分配
pub struct RhiBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    map_ptr: Option<*mut u8>,
    size: vk::DeviceSize,

    allocator: Arc<vk_mem::Allocator>,
    device: Arc<RhiDevice>,

    debug_name: String,
}

// mapped 指针只会在初始化阶段由单个写入者使用，录制阶段对 buffer 的访问全部是只读 handle
unsafe impl Send for RhiBuffer {}
unsafe impl Sync for RhiBuffer {}

impl Drop for RhiBuffer {
    fn drop(&mut self) {
        unsafe {
            if self.map_ptr.is_some() {
                self.allocator.unmap_memory(&mut self.allocation);
            }
            self.allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
    }
}

// init & destroy
impl RhiBuffer {
    /// # param
    /// * align - buffer 起始地址的对齐要求；None 表示无额外要求
    /// * mem_map - 是否需要持久映射到 host 地址空间
    pub fn new(
        rhi: &Rhi,
        buffer_size: vk::DeviceSize,
        buffer_usage: vk::BufferUsageFlags,
        align: Option<vk::DeviceSize>,
        mem_map: bool,
        debug_name: impl AsRef<str>,
    ) -> Self {
        let buffer_ci = vk::BufferCreateInfo::default().size(buffer_size).usage(buffer_usage);
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            flags: if mem_map {
                vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM
            } else {
                vk_mem::AllocationCreateFlags::empty()
            },
            ..Default::default()
        };

        let allocator = rhi.allocator_arc();
        let (buffer, mut allocation) = unsafe {
            match align {
                Some(align) => allocator.create_buffer_with_alignment(&buffer_ci, &alloc_ci, align).unwrap(),
                None => allocator.create_buffer(&buffer_ci, &alloc_ci).unwrap(),
            }
        };

        let mut map_ptr = None;
        if mem_map {
            map_ptr = Some(unsafe { allocator.map_memory(&mut allocation).unwrap() });
        }

        rhi.device().debug_utils.set_object_debug_name(buffer, format!("Buffer::{}", debug_name.as_ref()));
        Self {
            handle: buffer,
            allocation,
            map_ptr,
            size: buffer_size,
            allocator,
            device: rhi.device_arc(),
            debug_name: debug_name.as_ref().to_string(),
        }
    }

    /// device local 的 buffer，数据通过 stage buffer 传输
    #[inline]
    pub fn new_device_buffer(
        rhi: &Rhi,
        size: vk::DeviceSize,
        usage: vk::BufferUsageFlags,
        debug_name: impl AsRef<str>,
    ) -> Self {
        Self::new(rhi, size, usage | vk::BufferUsageFlags::TRANSFER_DST, None, false, debug_name)
    }

    #[inline]
    pub fn new_stage_buffer(rhi: &Rhi, size: vk::DeviceSize, debug_name: impl AsRef<str>) -> Self {
        Self::new(rhi, size, vk::BufferUsageFlags::TRANSFER_SRC, None, true, debug_name)
    }
}

// getter
impl RhiBuffer {
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn mapped_ptr(&self) -> *mut u8 {
        self.map_ptr.expect("buffer is not host mapped")
    }
}

// tools
impl RhiBuffer {
    #[inline]
    pub fn flush(&self, offset: vk::DeviceSize, size: vk::DeviceSize) {
        self.allocator.flush_allocation(&self.allocation, offset, size).unwrap();
    }

    /// 通过 mem map 的方式将 data 写入 buffer
    pub fn transfer_data_by_mmap<T: bytemuck::Pod>(&mut self, data: &[T]) {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        assert!(bytes.len() as vk::DeviceSize <= self.size);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped_ptr(), bytes.len());
        }
        self.flush(0, bytes.len() as vk::DeviceSize);
    }

    /// 创建一个临时的 stage buffer，先将数据放入 stage buffer，再 transfer 到 self
    ///
    /// 同步等待传输完成，会阻塞运行
    pub fn transfer_data_sync<T: bytemuck::Pod>(&mut self, rhi: &Rhi, data: &[T]) {
        let bytes_len = std::mem::size_of_val(data) as vk::DeviceSize;
        let mut stage_buffer =
            Self::new_stage_buffer(rhi, bytes_len, format!("stage-for-{}", self.debug_name));
        stage_buffer.transfer_data_by_mmap(data);

        rhi.one_time_exec(
            |cmd| {
                cmd.cmd_copy_buffer(
                    stage_buffer.handle(),
                    self.handle(),
                    &[vk::BufferCopy::default().size(bytes_len)],
                );
            },
            &format!("transfer-to-{}", self.debug_name),
        );
    }
}

/// 顶点 buffer，顶点类型是 V
pub struct RhiVertexBuffer<V: bytemuck::Pod> {
    inner: RhiBuffer,

    /// 顶点数量
    vertex_cnt: usize,

    _phantom: std::marker::PhantomData<V>,
}

impl<V: bytemuck::Pod> RhiVertexBuffer<V> {
    pub fn new(rhi: &Rhi, vertex_cnt: usize, debug_name: impl AsRef<str>) -> Self {
        let size = (vertex_cnt * size_of::<V>()) as vk::DeviceSize;
        let buffer = RhiBuffer::new_device_buffer(rhi, size, vk::BufferUsageFlags::VERTEX_BUFFER, debug_name);

        Self {
            inner: buffer,
            vertex_cnt,
            _phantom: std::marker::PhantomData,
        }
    }

    /// 创建 vertex buffer，并向其内写入数据
    #[inline]
    pub fn new_with_data(rhi: &Rhi, data: &[V], debug_name: impl AsRef<str>) -> Self {
        let mut vertex_buffer = Self::new(rhi, data.len(), debug_name);
        vertex_buffer.inner.transfer_data_sync(rhi, data);
        vertex_buffer
    }

    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.inner.handle()
    }

    #[inline]
    pub fn vertex_cnt(&self) -> usize {
        self.vertex_cnt
    }
}

/// 索引 buffer，索引类型是 u16
pub struct RhiIndexBuffer {
    inner: RhiBuffer,

    /// 索引数量
    index_cnt: usize,
}

impl RhiIndexBuffer {
    pub fn new(rhi: &Rhi, index_cnt: usize, debug_name: impl AsRef<str>) -> Self {
        let size = (index_cnt * size_of::<u16>()) as vk::DeviceSize;
        let buffer = RhiBuffer::new_device_buffer(rhi, size, vk::BufferUsageFlags::INDEX_BUFFER, debug_name);

        Self {
            inner: buffer,
            index_cnt,
        }
    }

    /// 创建 index buffer，并向其内写入数据
    #[inline]
    pub fn new_with_data(rhi: &Rhi, data: &[u16], debug_name: impl AsRef<str>) -> Self {
        let mut index_buffer = Self::new(rhi, data.len(), debug_name);
        index_buffer.inner.transfer_data_sync(rhi, data);
        index_buffer
    }

    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.inner.handle()
    }

    #[inline]
    pub fn index_type() -> vk::IndexType {
        vk::IndexType::UINT16
    }

    #[inline]
    pub fn index_cnt(&self) -> usize {
        self.index_cnt
    }
}
