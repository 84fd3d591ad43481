/**********************************************
  > File Name		: mod.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Tue 02 Mar 2021 10:31:37 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Introduction:
 *
 * The page_management component provides facilities for higher-level
 * components to perform file I/O in terms of pages.
 *
 * The DiskManager creates, destroys, opens and closes files, reads and
 * writes single pages and hands out page numbers. It also owns the raw
 * log stream.
 *
 * Accessing data on a page requires first reading the page into the
 * buffer pool, then manipulating it there through a PageGuard. When
 * there is no space left in the pool, the least recently used unpinned
 * page is removed, and copied back to its file if and only if it is
 * dirty.
 */

pub mod buffer_manager;
pub mod disk_manager;

#[cfg(test)]
mod tests;
