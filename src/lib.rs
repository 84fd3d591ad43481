/**********************************************
  > File Name		: lib.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 13 Oct 2026 09:12:40 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Fixed-size record storage.
 *
 * page_management turns a file into numbered pages: the DiskManager does
 * the raw page and log I/O, the BufferPoolManager caches pinned pages.
 * record_management stores fixed length records in those pages and keeps
 * track of the pages that still have a free slot.
 */

pub mod config;
pub mod errors;
pub mod page_management;
pub mod record_management;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_util;
