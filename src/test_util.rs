/**********************************************
  > File Name		: test_util.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Wed 14 Oct 2026 10:02:17 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

use std::sync::Arc;
use tempfile::TempDir;

use crate::page_management::buffer_manager::BufferPoolManager;
use crate::page_management::disk_manager::DiskManager;

// RUST_LOG=debug cargo test shows the page traffic.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn setup(pool_size: usize) -> (TempDir, Arc<DiskManager>, BufferPoolManager) {
    init_logger();
    let dir = tempfile::tempdir().expect("create temp dir failed");
    let disk = Arc::new(DiskManager::new(dir.path()));
    let pool = BufferPoolManager::new(pool_size, Arc::clone(&disk));
    (dir, disk, pool)
}
