//! 桥接程序定位

use crate::error::{AppResult, ResourceError};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 标准位置（相对于搜索根目录），按顺序检查
const STANDARD_LOCATIONS: &[&str] = &[
    "EZCADIntegration/bin/Release/EZCADBridge.exe",
    "EZCADIntegration/bin/Debug/EZCADBridge.exe",
    "EZCADBridge.exe",
];

/// 桥接程序运行所需的 DLL，缺失时只警告
const MARKING_DLL: &str = "MarkEzd.dll";

/// 定位桥接程序
///
/// 指定了路径时该路径必须存在；否则依次在工作目录和当前程序所在目录下搜索标准位置
pub fn locate_bridge(configured: Option<&Path>) -> AppResult<PathBuf> {
    let found = match configured {
        Some(path) => {
            if !path.exists() {
                return Err(ResourceError::BridgeNotFound {
                    searched: vec![path.to_path_buf()],
                }
                .into());
            }
            path.to_path_buf()
        }
        None => search_standard_locations(&search_roots())?,
    };

    info!("使用桥接程序: {}", found.display());
    check_marking_dll(&found);
    Ok(found)
}

/// 在给定根目录下按顺序搜索标准位置
pub fn search_standard_locations(roots: &[PathBuf]) -> AppResult<PathBuf> {
    let candidates: Vec<PathBuf> = roots
        .iter()
        .flat_map(|root| STANDARD_LOCATIONS.iter().map(move |rel| root.join(rel)))
        .collect();

    match candidates.iter().find(|p| p.exists()) {
        Some(path) => Ok(path.clone()),
        None => Err(ResourceError::BridgeNotFound {
            searched: candidates,
        }
        .into()),
    }
}

fn search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        if !roots.contains(&exe_dir) {
            roots.push(exe_dir);
        }
    }
    roots
}

fn check_marking_dll(bridge: &Path) {
    let dll = bridge
        .parent()
        .map(|dir| dir.join(MARKING_DLL))
        .unwrap_or_else(|| PathBuf::from(MARKING_DLL));
    if !dll.exists() {
        warn!("⚠️ 未找到 {}: {}", MARKING_DLL, dll.display());
        warn!("⚠️ 缺少该 DLL 时桥接程序可能无法正常工作");
    }
}
