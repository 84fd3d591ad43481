/**********************************************
  > File Name		: config.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 13 Oct 2026 09:20:03 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

//! Storage wide constants.
//! Changing PAGE_SIZE makes every existing data file unreadable.

pub const PAGE_SIZE: usize = 4096;

// the log file lives in the disk manager's root directory.
pub const LOG_FILE_NAME: &str = "db.log";

pub const DEFAULT_BUFFER_POOL_SIZE: usize = 64;
