use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导），
/// 避免硬编码相对路径，确保在不同构建环境下路径一致
pub struct QuadraPath {}

impl QuadraPath {
    /// 获取 `shader/.build/` 目录下的着色器路径（编译后的 SPIR-V）
    pub fn shader_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("shader").join(".build").join(filename)
    }

    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 从当前包的位置推导 workspace 目录
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .parent() // 从 crates/quadra-crate-tools 到 crates
            .unwrap()
            .parent() // 从 crates 到 workspace root
            .unwrap()
            .to_path_buf()
    }
}
