/**********************************************
  > File Name		: utils.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Thu 11 Mar 2021 03:54:41 PM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Utils functions for global usage.
 */

use std::sync::{Mutex, MutexGuard};

/*
 * Lock a mutex, ignoring poison.
 * All data behind our mutexes stays consistent between statements,
 * so a panic in another thread does not leave it half updated.
 */
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

//read a little endian u32 at offset.
pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&buf[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

pub(crate) fn write_u32(buf: &mut [u8], offset: usize, val: u32) {
    buf[offset..offset + 4].copy_from_slice(&val.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u32_codec_is_little_endian() {
        let mut buf = [0u8; 8];
        write_u32(&mut buf, 2, 0x0102_0304);
        assert_eq!(buf, [0, 0, 4, 3, 2, 1, 0, 0]);
        assert_eq!(read_u32(&buf, 2), 0x0102_0304);
    }
}
