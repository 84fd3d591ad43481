/**********************************************
  > File Name		: bitmap.rs
  > Author		    : lunar
  > Email			: lunar_ubuntu@qq.com
  > Created Time	: Wed 14 Oct 2026 11:03:48 AM CST
  > Location        : Shanghai
  > Copyright@ https://github.com/xiaoqixian
 **********************************************/

/*
 * Occupancy bitmap of a record page, one bit per slot.
 * Slot 0 is the highest bit of the first byte.
 */

fn mask(pos: usize) -> u8 {
    0x80 >> (pos % 8)
}

pub fn init(bitmap: &mut [u8]) {
    bitmap.iter_mut().for_each(|b| *b = 0);
}

pub fn set(bitmap: &mut [u8], pos: usize) {
    bitmap[pos / 8] |= mask(pos);
}

pub fn reset(bitmap: &mut [u8], pos: usize) {
    bitmap[pos / 8] &= !mask(pos);
}

pub fn is_set(bitmap: &[u8], pos: usize) -> bool {
    bitmap[pos / 8] & mask(pos) != 0
}

/*
 * Find the first position after curr (or from 0 when curr is None)
 * whose bit equals bit, looking at the first max_n bits only.
 */
pub fn next_bit(bit: bool, bitmap: &[u8], max_n: usize, curr: Option<usize>) -> Option<usize> {
    let start = curr.map_or(0, |c| c + 1);
    let mut pos = start;
    while pos < max_n {
        //skip whole bytes that can't contain the bit.
        let byte = bitmap[pos / 8];
        if pos % 8 == 0 && ((bit && byte == 0) || (!bit && byte == 0xff)) {
            pos += 8;
            continue;
        }
        if is_set(bitmap, pos) == bit {
            return Some(pos);
        }
        pos += 1;
    }
    None
}

//lowest position holding bit.
pub fn first_bit(bit: bool, bitmap: &[u8], max_n: usize) -> Option<usize> {
    next_bit(bit, bitmap, max_n, None)
}

pub fn count_ones(bitmap: &[u8], max_n: usize) -> usize {
    (0..max_n).filter(|pos| is_set(bitmap, *pos)).count()
}
