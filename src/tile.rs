// Copyright (c) 2019-2022, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

use crate::mv::MotionVector;
use crate::partition::{BlockSize, MI_SIZE};

/// Mode-info range of the tile the current block belongs to.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileInfo {
  pub mi_row_start: usize,
  pub mi_row_end: usize,
  pub mi_col_start: usize,
  pub mi_col_end: usize,
}

impl TileInfo {
  /// A single tile spanning the whole frame.
  pub fn frame_tile(mi_cols: usize, mi_rows: usize) -> Self {
    TileInfo {
      mi_row_start: 0,
      mi_row_end: mi_rows,
      mi_col_start: 0,
      mi_col_end: mi_cols,
    }
  }

  #[inline]
  pub const fn left_px(&self) -> isize {
    (self.mi_col_start * MI_SIZE) as isize
  }

  #[inline]
  pub const fn right_px(&self) -> isize {
    (self.mi_col_end * MI_SIZE) as isize
  }

  #[inline]
  pub const fn top_px(&self) -> isize {
    (self.mi_row_start * MI_SIZE) as isize
  }

  #[inline]
  pub const fn bottom_px(&self) -> isize {
    (self.mi_row_end * MI_SIZE) as isize
  }

  /// Whether the block displaced by `mv`, taken to integer-pel, still lies
  /// inside the tile.
  pub fn inside_tile_mv(
    &self, mv: MotionVector, mi_col: usize, mi_row: usize, bsize: BlockSize,
  ) -> bool {
    let txmv = (mv.col >> 3) as isize;
    let tymv = (mv.row >> 3) as isize;
    let left = (mi_col * MI_SIZE) as isize + txmv;
    let top = (mi_row * MI_SIZE) as isize + tymv;
    let right = left + bsize.width() as isize;
    let bottom = top + bsize.height() as isize;

    left >= self.left_px()
      && right <= self.right_px()
      && top >= self.top_px()
      && bottom <= self.bottom_px()
  }
}

/// Full-pel search bounds handed to the external search primitives.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MvLimits {
  pub col_min: i32,
  pub col_max: i32,
  pub row_min: i32,
  pub row_max: i32,
}

impl MvLimits {
  #[inline]
  pub fn contains_fullpel(&self, mv: MotionVector) -> bool {
    let col = i32::from(mv.col >> 3);
    let row = i32::from(mv.row >> 3);
    col >= self.col_min
      && col <= self.col_max
      && row >= self.row_min
      && row <= self.row_max
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.col_min > self.col_max || self.row_min > self.row_max
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::partition::BlockSize::*;

  #[test]
  fn zero_mv_inside_when_block_in_tile() {
    let tile = TileInfo::frame_tile(16, 16); // 64x64 pixels
    let mv = MotionVector::default();
    assert!(tile.inside_tile_mv(mv, 0, 0, BLOCK_16X16));
    assert!(tile.inside_tile_mv(mv, 12, 12, BLOCK_16X16));
  }

  #[test]
  fn mv_crossing_tile_edge_rejected() {
    let tile = TileInfo::frame_tile(16, 16);
    // -2 pels at the left edge leaves the tile
    let mv = MotionVector::new(-16, 0);
    assert!(!tile.inside_tile_mv(mv, 0, 0, BLOCK_16X16));
    // same MV deeper inside is fine
    assert!(tile.inside_tile_mv(mv, 4, 0, BLOCK_16X16));
    // +2 pels at the right edge leaves the tile
    let mv = MotionVector::new(16, 0);
    assert!(!tile.inside_tile_mv(mv, 12, 0, BLOCK_16X16));
  }

  #[test]
  fn subpel_bits_floor_to_integer_pel() {
    let tile = TileInfo::frame_tile(16, 16);
    // +7/8 pel floors to zero integer pels and stays inside
    assert!(tile.inside_tile_mv(MotionVector::new(7, 0), 12, 0, BLOCK_16X16));
    // -1/8 pel floors to a whole pel leftward and leaves the tile
    assert!(!tile.inside_tile_mv(MotionVector::new(-1, 0), 0, 0, BLOCK_16X16));
  }

  #[test]
  fn limits_contain_fullpel() {
    let lim = MvLimits { col_min: -4, col_max: 4, row_min: -2, row_max: 2 };
    assert!(lim.contains_fullpel(MotionVector::new(-32, 16)));
    assert!(!lim.contains_fullpel(MotionVector::new(-40, 0)));
    assert!(!lim.is_empty());
  }
}
